use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing one analysis run. A fresh instance is created for every run.
#[derive(Default)]
pub struct RunMetrics {
    documents_processed: AtomicU64,
    documents_skipped: AtomicU64,
    sections_detected: AtomicU64,
}

impl RunMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an extracted document and the number of sections detected in it.
    pub fn record_document(&self, section_count: u64) {
        self.documents_processed.fetch_add(1, Ordering::Relaxed);
        self.sections_detected
            .fetch_add(section_count, Ordering::Relaxed);
    }

    /// Record a document that failed extraction.
    pub fn record_skipped(&self) {
        self.documents_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_processed: self.documents_processed.load(Ordering::Relaxed),
            documents_skipped: self.documents_skipped.load(Ordering::Relaxed),
            sections_detected: self.sections_detected.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of run counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents whose text was extracted.
    pub documents_processed: u64,
    /// Documents skipped because extraction failed.
    pub documents_skipped: u64,
    /// Sections detected across all processed documents.
    pub sections_detected: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_documents_sections_and_skips() {
        let metrics = RunMetrics::new();
        metrics.record_document(2);
        metrics.record_document(3);
        metrics.record_skipped();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_processed, 2);
        assert_eq!(snapshot.documents_skipped, 1);
        assert_eq!(snapshot.sections_detected, 5);
    }

    #[test]
    fn snapshot_starts_empty() {
        let snapshot = RunMetrics::new().snapshot();
        assert_eq!(snapshot.documents_processed, 0);
        assert_eq!(snapshot.documents_skipped, 0);
        assert_eq!(snapshot.sections_detected, 0);
    }
}
