//! Analysis service coordinating extraction, heading detection, ranking, and refinement.

use crate::{
    config::PipelineSettings,
    embedding::EmbeddingClient,
    extraction::TextExtractor,
    metrics::{MetricsSnapshot, RunMetrics},
    output::{AnalysisOutput, assemble_output},
    processing::{
        headings::detect_sections,
        ranking::{embed_texts, rank_sections},
        summarize::refine_sections,
        types::{AnalysisRequest, Document, DocumentRef, ProcessingError, Section},
    },
};
use time::OffsetDateTime;

/// Result of one analysis run together with the counters gathered while producing it.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    /// Assembled result, ready to be written.
    pub output: AnalysisOutput,
    /// Counters for this run only.
    pub metrics: MetricsSnapshot,
}

/// Runs the full pipeline over one request.
///
/// The service owns the embedding client and text extractor, both constructed once at process
/// start and injected here. Documents are processed sequentially and entirely in memory.
pub struct AnalysisService {
    embedding_client: Box<dyn EmbeddingClient + Send + Sync>,
    extractor: Box<dyn TextExtractor + Send + Sync>,
    settings: PipelineSettings,
}

impl AnalysisService {
    /// Build a service from its collaborators and pipeline thresholds.
    pub fn new(
        embedding_client: Box<dyn EmbeddingClient + Send + Sync>,
        extractor: Box<dyn TextExtractor + Send + Sync>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            embedding_client,
            extractor,
            settings,
        }
    }

    /// Analyze every document in the request and assemble the result, stamped with the
    /// current time.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisRun, ProcessingError> {
        self.analyze_at(request, OffsetDateTime::now_utc()).await
    }

    /// Same as [`AnalysisService::analyze`] with an explicit timestamp.
    pub async fn analyze_at(
        &self,
        request: &AnalysisRequest,
        timestamp: OffsetDateTime,
    ) -> Result<AnalysisRun, ProcessingError> {
        tracing::info!(
            documents = request.documents.len(),
            persona = %request.query.persona,
            "Starting analysis"
        );

        let metrics = RunMetrics::new();
        let documents = self.load_documents(&request.documents, &metrics);
        let sections = self.detect_all(&documents, &metrics);

        let (ranked, refined) = if sections.is_empty() {
            tracing::warn!("No sections detected in any document");
            (Vec::new(), Vec::new())
        } else {
            let client = self.embedding_client.as_ref();
            let query_embedding = embed_texts(client, vec![request.query.text()])
                .await?
                .swap_remove(0);
            let ranked = rank_sections(client, sections, &query_embedding, &self.settings).await?;
            let refined =
                refine_sections(client, &ranked, &query_embedding, &self.settings).await?;
            (ranked, refined)
        };

        let input_documents = request
            .documents
            .iter()
            .map(|document| document.name.clone())
            .collect();
        let output = assemble_output(input_documents, &request.query, &ranked, &refined, timestamp);
        let metrics = metrics.snapshot();

        tracing::info!(
            ranked = output.extracted_sections.len(),
            refined = output.sub_section_analysis.len(),
            documents_processed = metrics.documents_processed,
            documents_skipped = metrics.documents_skipped,
            sections_detected = metrics.sections_detected,
            "Analysis complete"
        );
        Ok(AnalysisRun { output, metrics })
    }

    /// Extract every referenced document, skipping those that fail with a warning.
    pub fn load_documents(
        &self,
        references: &[DocumentRef],
        metrics: &RunMetrics,
    ) -> Vec<Document> {
        let mut documents = Vec::with_capacity(references.len());
        for reference in references {
            match self.extractor.extract(&reference.path) {
                Ok(pages) => {
                    tracing::debug!(
                        document = %reference.name,
                        pages = pages.len(),
                        "Loaded document"
                    );
                    documents.push(Document::new(reference.name.clone(), pages));
                }
                Err(error) => {
                    tracing::warn!(
                        document = %reference.name,
                        error = %error,
                        "Skipping document that failed extraction"
                    );
                    metrics.record_skipped();
                }
            }
        }
        documents
    }

    /// Detect sections across documents, preserving document and detection order.
    pub fn detect_all(&self, documents: &[Document], metrics: &RunMetrics) -> Vec<Section> {
        let mut sections = Vec::new();
        for document in documents {
            let detected = detect_sections(&document.name, &document.lines(), &self.settings);
            metrics.record_document(detected.len() as u64);
            if detected.is_empty() {
                tracing::info!(document = %document.name, "No headings detected");
            }
            sections.extend(detected);
        }
        sections
    }
}
