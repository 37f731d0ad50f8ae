//! PDF text extraction.
//!
//! Pages are read with `lopdf` so every line keeps its page number. When lopdf cannot parse
//! a file, or returns no text at all, the whole document is re-read with `pdf-extract` and
//! split on form-feed page breaks.

use crate::processing::Line;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while extracting text from a document.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The file does not exist or is not a regular file.
    #[error("File not found or not a file: {0}")]
    InvalidFile(String),
    /// Both extraction backends failed to read the document.
    #[error("Failed to extract text from PDF: {0}")]
    ExtractionFailed(String),
    /// The document parsed but contained no extractable text.
    #[error("No extractable text in {0}")]
    Empty(String),
}

/// Text of a single page, numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-based page number.
    pub number: u32,
    /// Raw page text with embedded newlines.
    pub text: String,
}

impl PageText {
    /// Create a page from its number and text.
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// Any component that can turn a document on disk into per-page text.
pub trait TextExtractor {
    /// Extract the pages of the document at `path`, in reading order.
    fn extract(&self, path: &Path) -> Result<Vec<PageText>, ExtractionError>;
}

/// Production extractor for PDF files.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub const fn new() -> Self {
        Self
    }
}

impl TextExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<Vec<PageText>, ExtractionError> {
        if !path.is_file() {
            return Err(ExtractionError::InvalidFile(path.display().to_string()));
        }

        let pages = match extract_with_lopdf(path) {
            Ok(pages) if has_text(&pages) => pages,
            Ok(_) => {
                tracing::debug!(
                    path = %path.display(),
                    "lopdf produced no text; trying pdf-extract"
                );
                extract_with_pdf_extract(path)?
            }
            Err(error) => {
                tracing::debug!(
                    path = %path.display(),
                    error = %error,
                    "lopdf failed; trying pdf-extract"
                );
                extract_with_pdf_extract(path)?
            }
        };

        if !has_text(&pages) {
            return Err(ExtractionError::Empty(path.display().to_string()));
        }

        tracing::debug!(path = %path.display(), pages = pages.len(), "Extracted PDF text");
        Ok(pages)
    }
}

fn has_text(pages: &[PageText]) -> bool {
    pages.iter().any(|page| !page.text.trim().is_empty())
}

fn extract_with_lopdf(path: &Path) -> Result<Vec<PageText>, ExtractionError> {
    let document = lopdf::Document::load(path)
        .map_err(|error| ExtractionError::ExtractionFailed(error.to_string()))?;

    let mut pages = Vec::new();
    for (number, _object_id) in document.get_pages() {
        // A single unreadable page should not lose the rest of the document.
        let text = match document.extract_text(&[number]) {
            Ok(text) => text,
            Err(error) => {
                tracing::debug!(page = number, error = %error, "Skipping unreadable page");
                String::new()
            }
        };
        pages.push(PageText::new(number, text));
    }

    Ok(pages)
}

fn extract_with_pdf_extract(path: &Path) -> Result<Vec<PageText>, ExtractionError> {
    let text = pdf_extract::extract_text(path)
        .map_err(|error| ExtractionError::ExtractionFailed(error.to_string()))?;
    Ok(split_form_feed_pages(&text))
}

/// Split whole-document text on form-feed page breaks.
///
/// Text without page breaks becomes a single page.
pub fn split_form_feed_pages(text: &str) -> Vec<PageText> {
    text.split('\x0C')
        .enumerate()
        .map(|(index, page)| PageText::new(index as u32 + 1, page))
        .collect()
}

/// Flatten pages into ordered lines.
///
/// Trailing whitespace is trimmed; blank lines are kept because they separate paragraphs.
pub fn lines_from_pages(pages: &[PageText]) -> Vec<Line> {
    pages
        .iter()
        .flat_map(|page| {
            page.text
                .lines()
                .map(move |text| Line::new(page.number, text.trim_end()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_file_is_invalid() {
        let result = PdfExtractor::new().extract(Path::new("/nonexistent/file.pdf"));
        assert!(matches!(result, Err(ExtractionError::InvalidFile(_))));
    }

    #[test]
    fn garbage_file_fails_extraction() {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(b"This is not a valid PDF").expect("write");
        file.flush().expect("flush");

        let result = PdfExtractor::new().extract(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn form_feed_splits_pages() {
        let pages = split_form_feed_pages("first page\x0Csecond page");
        assert_eq!(
            pages,
            vec![PageText::new(1, "first page"), PageText::new(2, "second page")]
        );
        assert_eq!(split_form_feed_pages("only").len(), 1);
    }

    #[test]
    fn lines_keep_page_numbers_and_blank_separators() {
        let pages = vec![
            PageText::new(1, "1. Introduction  \nBody\n\nMore"),
            PageText::new(2, "BACKGROUND"),
        ];
        let lines = lines_from_pages(&pages);
        let rendered: Vec<(u32, &str)> = lines
            .iter()
            .map(|line| (line.page, line.text.as_str()))
            .collect();
        assert_eq!(
            rendered,
            vec![
                (1, "1. Introduction"),
                (1, "Body"),
                (1, ""),
                (1, "More"),
                (2, "BACKGROUND"),
            ]
        );
    }
}
