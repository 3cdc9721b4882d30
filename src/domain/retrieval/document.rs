//! Passages handed between the retriever, the graders and the generator

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a passage came from
///
/// The loop never inspects the locator; it is carried through so the
/// presentation layer can cite sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocator {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl SourceLocator {
    pub fn page(page: u32) -> Self {
        Self {
            source: None,
            page: Some(page),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Short citation label, `P<page>` when a page is known
    pub fn label(&self) -> String {
        match (&self.page, &self.source) {
            (Some(page), _) => format!("P{}", page),
            (None, Some(source)) => source.clone(),
            (None, None) => "unknown".to_string(),
        }
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.source, &self.page) {
            (Some(source), Some(page)) => write!(f, "{} (page {})", source, page),
            _ => f.write_str(&self.label()),
        }
    }
}

/// A retrieved passage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub source: SourceLocator,
}

impl Document {
    pub fn new(text: impl Into<String>, source: SourceLocator) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }

    pub fn on_page(text: impl Into<String>, page: u32) -> Self {
        Self::new(text, SourceLocator::page(page))
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.source, self.text)
    }
}
