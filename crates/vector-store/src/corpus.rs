use crate::error::Result;
use crate::types::{Chunk, QueryResult, Question, Section};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// The embedded knowledge base: sections in document order.
///
/// Read-only once loaded; retrieval only ever borrows it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    sections: Vec<Section>,
}

/// Shape summary produced by [`Corpus::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusStats {
    pub sections: usize,
    pub chunks: usize,
    pub untitled_sections: usize,
    pub incomplete_chunks: usize,
    /// Length of the first embedding found, titles before chunks.
    pub dimension: Option<usize>,
    /// Embeddings whose length differs from `dimension`.
    pub inconsistent_embeddings: usize,
}

impl CorpusStats {
    fn observe(&mut self, embedding: Option<&[f64]>) {
        let Some(embedding) = embedding else {
            return;
        };
        match self.dimension {
            None => self.dimension = Some(embedding.len()),
            Some(dim) if dim != embedding.len() => self.inconsistent_embeddings += 1,
            Some(_) => {}
        }
    }

    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.untitled_sections == 0 && self.incomplete_chunks == 0 && self.inconsistent_embeddings == 0
    }
}

impl Corpus {
    #[must_use]
    pub const fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading corpus from {:?}", path);
        let sections: Vec<Section> = read_json(path).await?;
        let corpus = Self::new(sections);
        let stats = corpus.validate();
        if stats.untitled_sections > 0 {
            log::warn!(
                "{} sections are missing a title or title embedding",
                stats.untitled_sections
            );
        }
        if stats.incomplete_chunks > 0 {
            log::warn!(
                "{} chunks are missing text or embedding and will be skipped",
                stats.incomplete_chunks
            );
        }
        if stats.inconsistent_embeddings > 0 {
            log::warn!(
                "{} embeddings do not match corpus dimension {:?}",
                stats.inconsistent_embeddings,
                stats.dimension
            );
        }
        log::info!(
            "Loaded {} sections / {} chunks (dimension {:?})",
            stats.sections,
            stats.chunks,
            stats.dimension
        );
        Ok(corpus)
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json(path.as_ref(), &self.sections).await
    }

    /// Count incomplete records and embedding length disagreements.
    #[must_use]
    pub fn validate(&self) -> CorpusStats {
        let mut stats = CorpusStats {
            sections: self.sections.len(),
            ..CorpusStats::default()
        };

        for section in &self.sections {
            if section.title.is_none() || section.title_embedding.is_none() {
                stats.untitled_sections += 1;
            }
            stats.observe(section.title_embedding.as_deref());
            for chunk in &section.chunks {
                stats.chunks += 1;
                if !chunk.is_complete() {
                    stats.incomplete_chunks += 1;
                }
                stats.observe(chunk.chunk_embedding.as_deref());
            }
        }

        stats
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.sections.iter().flat_map(|section| section.chunks.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    #[must_use]
    pub fn into_sections(self) -> Vec<Section> {
        self.sections
    }
}

impl From<Vec<Section>> for Corpus {
    fn from(sections: Vec<Section>) -> Self {
        Self::new(sections)
    }
}

pub async fn load_questions(path: impl AsRef<Path>) -> Result<Vec<Question>> {
    let path = path.as_ref();
    log::info!("Loading questions from {:?}", path);
    let questions: Vec<Question> = read_json(path).await?;
    log::info!("Loaded {} questions", questions.len());
    Ok(questions)
}

pub async fn save_questions(path: impl AsRef<Path>, questions: &[Question]) -> Result<()> {
    write_json(path.as_ref(), questions).await
}

pub async fn save_query_result(path: impl AsRef<Path>, result: &QueryResult) -> Result<()> {
    write_json(path.as_ref(), result).await
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    log::info!("Saved {:?}", path);
    Ok(())
}
