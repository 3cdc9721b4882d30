//! PDF page text extraction using lopdf

use lopdf::content::Content;
use lopdf::Object;
use tracing::{debug, warn};

use crate::domain::DomainError;

/// Magic bytes at the start of every PDF file
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// TJ kerning (thousandths of an em) wide enough to read as a word gap
const WORD_GAP: f32 = -200.0;

pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// Text of every page as `(page number, text)`, numbered from 1
///
/// A page whose content cannot be decoded yields empty text so later pages
/// keep their numbers.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<(u32, String)>, DomainError> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| DomainError::ingestion(format!("Failed to load PDF: {}", e)))?;

    let pages = doc.get_pages();
    debug!(page_count = pages.len(), "Extracting text from PDF");

    let mut extracted = Vec::with_capacity(pages.len());

    for (page_number, page_id) in pages {
        let text = match doc
            .get_page_content(page_id)
            .and_then(|content| Content::decode(&content))
        {
            Ok(content) => page_text(&content),
            Err(e) => {
                warn!(page = page_number, error = %e, "Failed to extract text from page, skipping");
                String::new()
            }
        };

        extracted.push((page_number, text));
    }

    Ok(extracted)
}

fn page_text(content: &Content) -> String {
    let mut text = String::new();

    for operation in &content.operations {
        match operation.operator.as_str() {
            "Tj" | "'" | "\"" => {
                if matches!(operation.operator.as_str(), "'" | "\"") {
                    new_line(&mut text);
                }
                if let Some(Object::String(bytes, _)) = operation.operands.last() {
                    text.push_str(&decode_pdf_string(bytes));
                }
            }
            "TJ" => {
                let Some(Object::Array(items)) = operation.operands.first() else {
                    continue;
                };
                for item in items {
                    match item {
                        Object::String(bytes, _) => text.push_str(&decode_pdf_string(bytes)),
                        other => {
                            if other.as_float().is_ok_and(|gap| gap <= WORD_GAP) {
                                text.push(' ');
                            }
                        }
                    }
                }
            }
            "Td" | "TD" | "T*" | "ET" => new_line(&mut text),
            _ => {}
        }
    }

    text.trim().to_string()
}

fn new_line(text: &mut String) {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
}

/// UTF-16BE when the string carries a byte order mark, single-byte otherwise
fn decode_pdf_string(bytes: &[u8]) -> String {
    match bytes {
        [0xfe, 0xff, rest @ ..] => {
            let units = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
            char::decode_utf16(units)
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
        }
        _ => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}
