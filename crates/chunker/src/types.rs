use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One scraped knowledge-base page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceDocument {
    /// Page title from the table of contents
    pub title: String,

    /// Plain-text page body, one paragraph per line
    pub content: String,

    /// Page the content was fetched from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Image URLs found on the page
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl SourceDocument {
    /// Create a document without url or images
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            url: None,
            images: Vec::new(),
        }
    }

    /// Decode the scraper's JSON array output
    pub fn parse_list(json: &str) -> Result<Vec<Self>> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A titled section split into chunk texts, not yet embedded
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentSection {
    pub title: String,
    pub chunks: Vec<String>,
}

impl DocumentSection {
    /// Number of texts this section contributes to an embedding run
    #[must_use]
    pub fn text_count(&self) -> usize {
        usize::from(!self.title.is_empty()) + self.chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scraper_records_with_optional_fields() {
        let json = r#"[
            {"title": "Pairing", "content": "line", "url": "https://example.com/pair"},
            {"title": "Reset", "content": "other", "images": ["a.png"]}
        ]"#;
        let docs = SourceDocument::parse_list(json).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].url.as_deref(), Some("https://example.com/pair"));
        assert!(docs[0].images.is_empty());
        assert_eq!(docs[1].images, vec!["a.png".to_string()]);
    }

    #[test]
    fn malformed_records_are_errors() {
        assert!(SourceDocument::parse_list(r#"[{"title": 3}]"#).is_err());
    }

    #[test]
    fn text_count_skips_empty_title() {
        let section = DocumentSection {
            title: String::new(),
            chunks: vec!["a".into(), "b".into()],
        };
        assert_eq!(section.text_count(), 2);
    }
}
