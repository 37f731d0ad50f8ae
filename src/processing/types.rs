//! Core data types and error definitions for the ranking pipeline.

use crate::extraction::PageText;
use std::path::PathBuf;
use thiserror::Error;

/// Errors emitted by the ranking pipeline.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Embedding provider failed to produce vectors for the input text.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] crate::embedding::EmbeddingClientError),
    /// Provider returned a different number of vectors than texts submitted.
    #[error("Embedding provider returned {actual} vectors for {expected} texts")]
    EmbeddingCountMismatch {
        /// Number of texts submitted.
        expected: usize,
        /// Number of vectors received.
        actual: usize,
    },
}

/// A single extracted line and the page it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based page number.
    pub page: u32,
    /// Raw line text.
    pub text: String,
}

impl Line {
    /// Create a line on `page`.
    pub fn new(page: u32, text: impl Into<String>) -> Self {
        Self {
            page,
            text: text.into(),
        }
    }
}

/// A loaded document: its file name and page texts.
#[derive(Debug, Clone)]
pub struct Document {
    /// File name used to reference the document in the output.
    pub name: String,
    /// Pages in reading order.
    pub pages: Vec<PageText>,
}

impl Document {
    /// Create a document from its name and pages.
    pub fn new(name: impl Into<String>, pages: Vec<PageText>) -> Self {
        Self {
            name: name.into(),
            pages,
        }
    }

    /// Flatten the pages into ordered lines.
    pub fn lines(&self) -> Vec<Line> {
        crate::extraction::lines_from_pages(&self.pages)
    }
}

/// A heading plus the body lines that follow it within one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Heading text as it appeared in the document.
    pub title: String,
    /// Name of the owning document.
    pub document: String,
    /// Page on which the heading appears.
    pub page: u32,
    /// Body lines in order; empty strings mark paragraph breaks.
    pub body: Vec<String>,
}

impl Section {
    /// Body lines joined with newlines, without leading or trailing blank lines.
    pub fn body_text(&self) -> String {
        self.body.join("\n").trim().to_string()
    }

    /// Heading followed by at most `max_chars` characters of body text.
    pub fn embedding_text(&self, max_chars: usize) -> String {
        let body = self.body_text();
        let excerpt: String = body
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .take(max_chars)
            .collect();
        if excerpt.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.title, excerpt)
        }
    }
}

/// A section with its similarity to the query and its position in the ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSection {
    /// The ranked section.
    pub section: Section,
    /// Cosine similarity to the query, in `[-1, 1]`.
    pub score: f32,
    /// 1-based importance rank; unique within one run.
    pub rank: usize,
}

/// The most query-relevant paragraph of a top-ranked section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinedSubsection {
    /// Name of the owning document.
    pub document: String,
    /// Page of the section the paragraph belongs to.
    pub page: u32,
    /// Selected paragraph, possibly truncated.
    pub text: String,
}

/// Persona and task text used as the semantic comparison target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Role of the person asking.
    pub persona: String,
    /// Task the persona needs to accomplish.
    pub task: String,
}

impl Query {
    /// Create a query from persona and task text.
    pub fn new(persona: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            task: task.into(),
        }
    }

    /// Text embedded to represent the query.
    pub fn text(&self) -> String {
        format!("{}. {}", self.persona.trim(), self.task.trim())
    }
}

/// A document referenced by the input configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    /// File name echoed in the output.
    pub name: String,
    /// Resolved location on disk.
    pub path: PathBuf,
}

/// Everything the pipeline needs for one run.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Documents to analyze, in input order.
    pub documents: Vec<DocumentRef>,
    /// Persona and task driving relevance.
    pub query: Query,
}
