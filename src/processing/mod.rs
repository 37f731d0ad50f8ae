//! Document analysis pipeline: heading detection, relevance ranking, and refinement.

pub mod headings;
pub mod ranking;
mod service;
pub mod similarity;
pub mod summarize;
pub mod types;

pub use service::{AnalysisRun, AnalysisService};
pub use types::{
    AnalysisRequest, Document, DocumentRef, Line, ProcessingError, Query, RefinedSubsection,
    ScoredSection, Section,
};
