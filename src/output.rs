//! Result assembly and serialization.

use crate::processing::{Query, RefinedSubsection, ScoredSection};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Errors raised while writing the result file.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Result could not be encoded as JSON.
    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Result could not be written or moved into place.
    #[error("Failed to write output to {path}: {source}")]
    Io {
        /// Destination path.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// Complete result of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutput {
    /// Run metadata echoed from the input.
    pub metadata: OutputMetadata,
    /// Top sections in rank order.
    pub extracted_sections: Vec<ExtractedSection>,
    /// Refined paragraphs in rank order.
    pub sub_section_analysis: Vec<SubSectionAnalysis>,
}

/// Input echo and processing timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputMetadata {
    /// Every document named in the input, including skipped ones.
    pub input_documents: Vec<String>,
    /// Persona role.
    pub persona: String,
    /// Task description.
    pub job_to_be_done: String,
    /// RFC 3339 time at which the result was assembled.
    pub processing_timestamp: String,
}

/// A ranked section as exposed in the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedSection {
    /// Owning document.
    pub document: String,
    /// Page of the heading.
    pub page_number: u32,
    /// Heading text.
    pub section_title: String,
    /// 1-based rank.
    pub importance_rank: usize,
}

/// A refined paragraph as exposed in the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubSectionAnalysis {
    /// Owning document.
    pub document: String,
    /// Page of the section.
    pub page_number: u32,
    /// Selected paragraph text.
    pub refined_text: String,
}

/// Merge metadata, ranked sections, and refined subsections into one result.
pub fn assemble_output(
    input_documents: Vec<String>,
    query: &Query,
    ranked: &[ScoredSection],
    refined: &[RefinedSubsection],
    timestamp: OffsetDateTime,
) -> AnalysisOutput {
    let processing_timestamp = timestamp
        .format(&Rfc3339)
        .unwrap_or_else(|_| timestamp.unix_timestamp().to_string());

    AnalysisOutput {
        metadata: OutputMetadata {
            input_documents,
            persona: query.persona.clone(),
            job_to_be_done: query.task.clone(),
            processing_timestamp,
        },
        extracted_sections: ranked
            .iter()
            .map(|scored| ExtractedSection {
                document: scored.section.document.clone(),
                page_number: scored.section.page,
                section_title: scored.section.title.clone(),
                importance_rank: scored.rank,
            })
            .collect(),
        sub_section_analysis: refined
            .iter()
            .map(|subsection| SubSectionAnalysis {
                document: subsection.document.clone(),
                page_number: subsection.page,
                refined_text: subsection.text.clone(),
            })
            .collect(),
    }
}

/// Write the result as pretty-printed JSON, replacing `path` atomically.
pub fn write_output(path: &Path, output: &AnalysisOutput) -> Result<(), OutputError> {
    let io_error = |source: std::io::Error| OutputError::Io {
        path: path.display().to_string(),
        source,
    };
    let json = serde_json::to_vec_pretty(output)?;

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(directory).map_err(io_error)?;
    staged.write_all(&json).map_err(io_error)?;
    staged.write_all(b"\n").map_err(io_error)?;
    staged.flush().map_err(io_error)?;
    staged.persist(path).map_err(|error| io_error(error.error))?;

    tracing::debug!(path = %path.display(), bytes = json.len(), "Wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::Section;
    use serde_json::Value;

    fn ranked() -> Vec<ScoredSection> {
        vec![ScoredSection {
            section: Section {
                title: "1. Introduction".into(),
                document: "a.pdf".into(),
                page: 2,
                body: vec!["Body".into()],
            },
            score: 0.8,
            rank: 1,
        }]
    }

    #[test]
    fn assemble_output_maps_fields_in_rank_order() {
        let refined = vec![RefinedSubsection {
            document: "a.pdf".into(),
            page: 2,
            text: "Body".into(),
        }];
        let output = assemble_output(
            vec!["a.pdf".into(), "b.pdf".into()],
            &Query::new("Analyst", "Summarize"),
            &ranked(),
            &refined,
            OffsetDateTime::UNIX_EPOCH,
        );

        assert_eq!(output.metadata.processing_timestamp, "1970-01-01T00:00:00Z");
        assert_eq!(output.metadata.input_documents.len(), 2);
        assert_eq!(output.extracted_sections[0].importance_rank, 1);
        assert_eq!(output.extracted_sections[0].page_number, 2);
        assert_eq!(output.sub_section_analysis[0].refined_text, "Body");
    }

    #[test]
    fn write_output_produces_expected_json_shape() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("result.json");
        let output = assemble_output(
            vec!["a.pdf".into()],
            &Query::new("Analyst", "Summarize"),
            &ranked(),
            &[],
            OffsetDateTime::UNIX_EPOCH,
        );

        write_output(&path, &output).expect("write");
        let value: Value =
            serde_json::from_slice(&std::fs::read(&path).expect("read")).expect("json");

        assert_eq!(value["metadata"]["persona"], "Analyst");
        assert_eq!(value["metadata"]["job_to_be_done"], "Summarize");
        assert_eq!(value["extracted_sections"][0]["section_title"], "1. Introduction");
        assert_eq!(value["extracted_sections"][0]["importance_rank"], 1);
        assert!(value["sub_section_analysis"].as_array().expect("array").is_empty());
    }
}
