use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Dense embedding vector.
pub type Vector = Vec<f64>;

/// One embedded text chunk of a section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    #[serde(default)]
    pub chunk_text: Option<String>,
    #[serde(default)]
    pub chunk_embedding: Option<Vector>,
}

impl Chunk {
    pub fn new(text: impl Into<String>, embedding: Vector) -> Self {
        Self {
            chunk_text: Some(text.into()),
            chunk_embedding: Some(embedding),
        }
    }

    #[must_use]
    pub fn rank_input(&self) -> RankInput<'_> {
        RankInput {
            text: self.chunk_text.as_deref(),
            embedding: self.chunk_embedding.as_deref(),
        }
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.chunk_text.is_some() && self.chunk_embedding.is_some()
    }
}

/// A titled region of the source document with its chunks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Section {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_embedding: Option<Vector>,
    #[serde(default)]
    pub chunks: Vec<Chunk>,
}

impl Section {
    pub fn new(title: impl Into<String>, title_embedding: Vector, chunks: Vec<Chunk>) -> Self {
        Self {
            title: Some(title.into()),
            title_embedding: Some(title_embedding),
            chunks,
        }
    }

    #[must_use]
    pub fn title_input(&self) -> RankInput<'_> {
        RankInput {
            text: self.title.as_deref(),
            embedding: self.title_embedding.as_deref(),
        }
    }
}

/// An embedded user question.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Question {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub question_embedding: Option<Vector>,
}

impl Question {
    pub fn new(text: impl Into<String>, embedding: Vector) -> Self {
        Self {
            question: Some(text.into()),
            question_embedding: Some(embedding),
        }
    }
}

/// Borrowed `(text, embedding)` view handed to ranking. Either side may be
/// missing on partially populated records.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankInput<'a> {
    pub text: Option<&'a str>,
    pub embedding: Option<&'a [f64]>,
}

impl<'a> RankInput<'a> {
    #[must_use]
    pub const fn new(text: &'a str, embedding: &'a [f64]) -> Self {
        Self {
            text: Some(text),
            embedding: Some(embedding),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Title,
    Chunk,
}

impl ItemKind {
    #[must_use]
    pub const fn text_key(self) -> &'static str {
        match self {
            Self::Title => "title_text",
            Self::Chunk => "chunk_text",
        }
    }
}

/// A ranked text with its similarity to the query.
///
/// Serialized as `{"chunk_text": .., "similarity": ..}` for chunks and
/// `{"title_text": .., "similarity": ..}` for titles.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItem {
    pub kind: ItemKind,
    pub text: String,
    pub similarity: f64,
}

impl ScoredItem {
    pub fn chunk(text: impl Into<String>, similarity: f64) -> Self {
        Self {
            kind: ItemKind::Chunk,
            text: text.into(),
            similarity,
        }
    }

    pub fn title(text: impl Into<String>, similarity: f64) -> Self {
        Self {
            kind: ItemKind::Title,
            text: text.into(),
            similarity,
        }
    }
}

impl Serialize for ScoredItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.kind.text_key(), &self.text)?;
        map.serialize_entry("similarity", &self.similarity)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for ScoredItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ScoredItemVisitor;

        impl<'de> Visitor<'de> for ScoredItemVisitor {
            type Value = ScoredItem;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object with chunk_text or title_text and similarity")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<ScoredItem, A::Error> {
                let mut text: Option<(ItemKind, String)> = None;
                let mut similarity: Option<f64> = None;
                while let Some(key) = map.next_key::<String>()? {
                    let kind = match key.as_str() {
                        "chunk_text" => ItemKind::Chunk,
                        "title_text" => ItemKind::Title,
                        "similarity" => {
                            if similarity.is_some() {
                                return Err(de::Error::duplicate_field("similarity"));
                            }
                            similarity = Some(map.next_value()?);
                            continue;
                        }
                        _ => {
                            map.next_value::<de::IgnoredAny>()?;
                            continue;
                        }
                    };
                    if text.is_some() {
                        return Err(de::Error::custom("expected exactly one of chunk_text/title_text"));
                    }
                    text = Some((kind, map.next_value()?));
                }
                let (kind, text) = text.ok_or_else(|| de::Error::missing_field("chunk_text"))?;
                let similarity = similarity.ok_or_else(|| de::Error::missing_field("similarity"))?;
                Ok(ScoredItem {
                    kind,
                    text,
                    similarity,
                })
            }
        }

        deserializer.deserialize_map(ScoredItemVisitor)
    }
}

/// Per-question ranked results, kept in question input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    entries: Vec<(String, Vec<ScoredItem>)>,
    index: HashMap<String, usize>,
}

impl QueryResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert results for `question`. A repeated question replaces the earlier
    /// value in place.
    pub fn insert(&mut self, question: impl Into<String>, items: Vec<ScoredItem>) {
        let question = question.into();
        match self.index.get(&question) {
            Some(&pos) => self.entries[pos].1 = items,
            None => {
                self.index.insert(question.clone(), self.entries.len());
                self.entries.push((question, items));
            }
        }
    }

    #[must_use]
    pub fn get(&self, question: &str) -> Option<&[ScoredItem]> {
        self.index
            .get(question)
            .map(|&pos| self.entries[pos].1.as_slice())
    }

    #[must_use]
    pub fn contains(&self, question: &str) -> bool {
        self.index.contains_key(question)
    }

    pub fn questions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(q, _)| q.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ScoredItem])> {
        self.entries
            .iter()
            .map(|(q, items)| (q.as_str(), items.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for QueryResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (question, items) in &self.entries {
            map.serialize_entry(question, items)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for QueryResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct QueryResultVisitor;

        impl<'de> Visitor<'de> for QueryResultVisitor {
            type Value = QueryResult;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of question text to ranked items")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<QueryResult, A::Error> {
                let mut result = QueryResult::new();
                while let Some((question, items)) = map.next_entry::<String, Vec<ScoredItem>>()? {
                    result.insert(question, items);
                }
                Ok(result)
            }
        }

        deserializer.deserialize_map(QueryResultVisitor)
    }
}
