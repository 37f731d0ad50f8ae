//! Relevance ranking of detected sections against the persona/task query.

use crate::config::PipelineSettings;
use crate::embedding::EmbeddingClient;
use std::collections::HashMap;

use super::similarity::cosine_similarity;
use super::types::{ProcessingError, ScoredSection, Section};

/// Embed a batch of texts, checking that the provider returned one vector per text.
pub(crate) async fn embed_texts(
    client: &(dyn EmbeddingClient + Send + Sync),
    texts: Vec<String>,
) -> Result<Vec<Vec<f32>>, ProcessingError> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }
    let expected = texts.len();
    let embeddings = client.generate_embeddings(texts).await?;
    if embeddings.len() != expected {
        return Err(ProcessingError::EmbeddingCountMismatch {
            expected,
            actual: embeddings.len(),
        });
    }
    Ok(embeddings)
}

/// Score every section against the query embedding and keep the best `top_sections`.
///
/// Each section is embedded as its heading plus a bounded body excerpt, all in one batch.
pub async fn rank_sections(
    client: &(dyn EmbeddingClient + Send + Sync),
    sections: Vec<Section>,
    query_embedding: &[f32],
    settings: &PipelineSettings,
) -> Result<Vec<ScoredSection>, ProcessingError> {
    if sections.is_empty() {
        return Ok(Vec::new());
    }

    let texts = sections
        .iter()
        .map(|section| section.embedding_text(settings.excerpt_chars))
        .collect();
    let embeddings = embed_texts(client, texts).await?;

    let scored = sections
        .into_iter()
        .zip(embeddings.iter())
        .map(|(section, embedding)| {
            let score = cosine_similarity(query_embedding, embedding);
            (section, if score.is_finite() { score } else { 0.0 })
        })
        .collect();

    let ranked = assign_ranks(
        scored,
        settings.top_sections,
        settings.max_sections_per_document,
    );
    tracing::debug!(ranked = ranked.len(), "Ranked sections");
    Ok(ranked)
}

/// Sort scored sections by descending score and number the first `limit` of them.
///
/// The sort is stable, so equal scores keep their detection order (document, page, position).
/// When `per_document_cap` is set, sections beyond the cap for their document are skipped.
pub fn assign_ranks(
    mut scored: Vec<(Section, f32)>,
    limit: usize,
    per_document_cap: Option<usize>,
) -> Vec<ScoredSection> {
    scored.sort_by(|left, right| right.1.total_cmp(&left.1));

    let mut per_document: HashMap<String, usize> = HashMap::new();
    let mut ranked = Vec::with_capacity(limit.min(scored.len()));

    for (section, score) in scored {
        if ranked.len() >= limit {
            break;
        }
        if let Some(cap) = per_document_cap {
            let taken = per_document.entry(section.document.clone()).or_insert(0);
            if *taken >= cap {
                continue;
            }
            *taken += 1;
        }
        let rank = ranked.len() + 1;
        ranked.push(ScoredSection {
            section,
            score,
            rank,
        });
    }

    ranked
}
