//! Loads a PDF or text file into page-located passages

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::pdf;
use super::RecursiveChunker;
use crate::domain::ingestion::{ChunkingConfig, ChunkingStrategy};
use crate::domain::retrieval::{Document, SourceLocator};
use crate::domain::DomainError;

/// Page separator emitted by PDF-to-text converters
pub const PAGE_BREAK: char = '\u{000C}';

/// Reads a PDF or UTF-8 text, splits it into pages and chunks every page
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    chunker: Arc<dyn ChunkingStrategy>,
    config: ChunkingConfig,
}

impl DocumentLoader {
    pub fn new(config: ChunkingConfig) -> Self {
        Self::with_chunker(Arc::new(RecursiveChunker::new()), config)
    }

    pub fn with_chunker(chunker: Arc<dyn ChunkingStrategy>, config: ChunkingConfig) -> Self {
        Self { chunker, config }
    }

    /// Load a file; PDFs are recognised by extension or magic bytes
    pub async fn load_file(&self, path: &Path) -> Result<Vec<Document>, DomainError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            DomainError::ingestion(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let has_pdf_extension = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if has_pdf_extension || pdf::is_pdf(&bytes) {
            let pages = tokio::task::spawn_blocking(move || pdf::extract_pages(&bytes))
                .await
                .map_err(|e| DomainError::internal(format!("PDF extraction task failed: {}", e)))?
                .map_err(|e| DomainError::ingestion(format!("{}: {}", source, e)))?;

            return self.load_pages(&source, pages);
        }

        let text = String::from_utf8(bytes).map_err(|_| {
            DomainError::ingestion(format!("{} is not valid UTF-8 text", path.display()))
        })?;

        self.load_text(&source, &text)
    }

    /// Chunk `text`, split into pages on form feeds; pages are numbered from 1
    pub fn load_text(&self, source: &str, text: &str) -> Result<Vec<Document>, DomainError> {
        let pages = text
            .split(PAGE_BREAK)
            .zip(1u32..)
            .map(|(page, number)| (number, page.to_string()))
            .collect();

        self.load_pages(source, pages)
    }

    /// Chunk already extracted `(page number, text)` pairs
    pub fn load_pages(
        &self,
        source: &str,
        pages: Vec<(u32, String)>,
    ) -> Result<Vec<Document>, DomainError> {
        if pages.iter().all(|(_, text)| text.trim().is_empty()) {
            return Err(DomainError::ingestion(format!("{} contains no text", source)));
        }

        let mut documents = Vec::new();

        for (number, page) in &pages {
            for chunk in self.chunker.chunk(page, &self.config)? {
                let locator = SourceLocator::page(*number).with_source(source);
                documents.push(Document::new(chunk.content, locator));
            }
        }

        info!(
            source,
            pages = pages.len(),
            chunks = documents.len(),
            chunker = self.chunker.name(),
            "Loaded document"
        );

        Ok(documents)
    }
}
