//! Input configuration loading.
//!
//! The input file names the PDFs to analyze and the persona/task that drives relevance:
//!
//! ```json
//! {
//!   "documents": [{ "filename": "guide.pdf" }],
//!   "persona": { "role": "Travel Planner" },
//!   "job_to_be_done": { "task": "Plan a four-day trip" }
//! }
//! ```
//!
//! PDFs are resolved relative to the input file's directory, inside the configured PDF folder.

use crate::processing::{AnalysisRequest, DocumentRef, Query};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading the input configuration.
#[derive(Debug, Error)]
pub enum InputError {
    /// Input file could not be read.
    #[error("Failed to read input file {path}: {source}")]
    Read {
        /// Input path.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Input file was not valid JSON or did not match the expected shape.
    #[error("Malformed input file {path}: {source}")]
    Malformed {
        /// Input path.
        path: String,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },
    /// Input listed no documents.
    #[error("Input file lists no documents")]
    NoDocuments,
    /// A document entry had an empty file name.
    #[error("Document entry {0} has an empty filename")]
    EmptyFilename(usize),
    /// A referenced PDF does not exist.
    #[error("Referenced document not found: {0}")]
    MissingDocument(String),
}

/// Raw input file shape.
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Optional descriptive block, logged when present.
    #[serde(default)]
    pub challenge_info: Option<ChallengeInfo>,
    /// Documents to analyze.
    pub documents: Vec<DocumentEntry>,
    /// Who is asking.
    pub persona: Persona,
    /// What they need.
    pub job_to_be_done: JobToBeDone,
}

/// Optional descriptive metadata about the run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChallengeInfo {
    /// Identifier of the collection.
    #[serde(default)]
    pub challenge_id: Option<String>,
    /// Name of the test case.
    #[serde(default)]
    pub test_case_name: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
}

/// One referenced document. Other keys, such as `title`, are accepted and ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentEntry {
    /// File name inside the PDF folder.
    pub filename: String,
}

/// Persona block.
#[derive(Debug, Clone, Deserialize)]
pub struct Persona {
    /// Role description.
    pub role: String,
}

/// Task block.
#[derive(Debug, Clone, Deserialize)]
pub struct JobToBeDone {
    /// Task description.
    pub task: String,
}

/// A validated request plus the default location of its result.
#[derive(Debug, Clone)]
pub struct LoadedInput {
    /// Pipeline request.
    pub request: AnalysisRequest,
    /// Descriptive metadata from the input, if any.
    pub challenge_info: Option<ChallengeInfo>,
    /// Where the result is written unless overridden.
    pub default_output_path: PathBuf,
}

/// Read and validate an input file.
///
/// Every referenced PDF must exist under `<input dir>/<pdf_dir>`.
pub fn load_request(
    path: &Path,
    pdf_dir: &str,
    output_file: &str,
) -> Result<LoadedInput, InputError> {
    let raw = std::fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config: InputConfig =
        serde_json::from_str(&raw).map_err(|source| InputError::Malformed {
            path: path.display().to_string(),
            source,
        })?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    let request = build_request(config.clone(), &base_dir.join(pdf_dir))?;

    Ok(LoadedInput {
        request,
        challenge_info: config.challenge_info,
        default_output_path: base_dir.join(output_file),
    })
}

/// Resolve document entries against `pdf_root` and build the pipeline request.
pub fn build_request(config: InputConfig, pdf_root: &Path) -> Result<AnalysisRequest, InputError> {
    if config.documents.is_empty() {
        return Err(InputError::NoDocuments);
    }

    let mut documents = Vec::with_capacity(config.documents.len());
    for (index, entry) in config.documents.into_iter().enumerate() {
        let name = entry.filename.trim();
        if name.is_empty() {
            return Err(InputError::EmptyFilename(index));
        }
        let path = pdf_root.join(name);
        if !path.is_file() {
            return Err(InputError::MissingDocument(path.display().to_string()));
        }
        documents.push(DocumentRef {
            name: name.to_string(),
            path,
        });
    }

    Ok(AnalysisRequest {
        documents,
        query: Query::new(config.persona.role.trim(), config.job_to_be_done.task.trim()),
    })
}
