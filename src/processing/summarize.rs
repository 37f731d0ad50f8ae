//! Refined-text selection for the top-ranked sections.

use crate::config::PipelineSettings;
use crate::embedding::EmbeddingClient;
use semchunk_rs::Chunker;

use super::ranking::embed_texts;
use super::similarity::cosine_similarity;
use super::types::{ProcessingError, RefinedSubsection, ScoredSection};

/// Pick the most query-relevant paragraph from each of the first `summary_sections` ranked
/// sections.
///
/// A section with a single candidate paragraph uses it without scoring. The chosen text is
/// truncated to `max_refined_chars`.
pub async fn refine_sections(
    client: &(dyn EmbeddingClient + Send + Sync),
    ranked: &[ScoredSection],
    query_embedding: &[f32],
    settings: &PipelineSettings,
) -> Result<Vec<RefinedSubsection>, ProcessingError> {
    let mut refined = Vec::new();

    for scored in ranked.iter().take(settings.summary_sections) {
        let section = &scored.section;
        let paragraphs = split_paragraphs(&section.body, settings.paragraph_max_words);
        let mut candidates: Vec<String> = paragraphs
            .iter()
            .filter(|paragraph| paragraph.chars().count() >= settings.min_paragraph_chars)
            .cloned()
            .collect();
        if candidates.is_empty() {
            candidates = paragraphs;
        }

        let best = match candidates.len() {
            0 => continue,
            1 => candidates.swap_remove(0),
            count => {
                let embeddings = embed_texts(client, candidates.clone()).await?;
                let index = best_match(query_embedding, &embeddings);
                tracing::trace!(
                    title = %section.title,
                    candidates = count,
                    chosen = index,
                    "Selected refined paragraph"
                );
                candidates.swap_remove(index)
            }
        };

        refined.push(RefinedSubsection {
            document: section.document.clone(),
            page: section.page,
            text: truncate_text(&best, settings.max_refined_chars),
        });
    }

    tracing::debug!(refined = refined.len(), "Refined top sections");
    Ok(refined)
}

/// Index of the embedding most similar to the query; the earliest wins ties.
fn best_match(query_embedding: &[f32], embeddings: &[Vec<f32>]) -> usize {
    let mut best_index = 0;
    let mut best_score = f32::NEG_INFINITY;
    for (index, embedding) in embeddings.iter().enumerate() {
        let score = cosine_similarity(query_embedding, embedding);
        if score > best_score {
            best_score = score;
            best_index = index;
        }
    }
    best_index
}

/// Split body lines into paragraphs.
///
/// Blank lines separate paragraphs and wrapped lines are joined with spaces. Paragraphs
/// longer than `max_words` words are further segmented at semantic boundaries.
pub fn split_paragraphs(body: &[String], max_words: usize) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in body {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(trimmed);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    let chunker = Chunker::new(max_words.max(1), Box::new(count_words));
    paragraphs
        .into_iter()
        .flat_map(|paragraph| {
            if count_words(&paragraph) <= max_words {
                vec![paragraph]
            } else {
                chunker
                    .chunk(&paragraph)
                    .into_iter()
                    .map(|chunk| chunk.trim().to_string())
                    .filter(|chunk| !chunk.is_empty())
                    .collect()
            }
        })
        .collect()
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated = text
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>()
        .trim_end()
        .to_string();
    truncated.push('…');
    truncated
}

fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashedEmbeddingClient;
    use crate::processing::types::Section;

    fn scored(title: &str, rank: usize, body: &[&str]) -> ScoredSection {
        ScoredSection {
            section: Section {
                title: title.into(),
                document: "guide.pdf".into(),
                page: rank as u32,
                body: body.iter().map(|line| line.to_string()).collect(),
            },
            score: 1.0 - rank as f32 / 10.0,
            rank,
        }
    }

    #[test]
    fn split_paragraphs_uses_blank_lines_and_joins_wraps() {
        let body = vec![
            "first line".to_string(),
            "wrapped".to_string(),
            String::new(),
            "second paragraph".to_string(),
        ];
        assert_eq!(
            split_paragraphs(&body, 50),
            vec!["first line wrapped".to_string(), "second paragraph".to_string()]
        );
    }

    #[test]
    fn split_paragraphs_segments_long_paragraphs() {
        let body = vec!["one two three four five six seven".to_string()];
        let paragraphs = split_paragraphs(&body, 3);
        assert!(paragraphs.len() >= 3);
        assert!(paragraphs.iter().all(|p| count_words(p) <= 3));
        assert_eq!(paragraphs.join(" "), "one two three four five six seven");
    }

    #[test]
    fn truncate_text_respects_char_budget() {
        assert_eq!(truncate_text("short", 10), "short");
        let truncated = truncate_text("abcdefghij", 5);
        assert_eq!(truncated.chars().count(), 5);
        assert!(truncated.ends_with('…'));
    }

    #[tokio::test]
    async fn single_paragraph_is_used_directly() {
        let client = HashedEmbeddingClient::new(64);
        let ranked = vec![scored("Only", 1, &["The one and only paragraph."])];
        let settings = PipelineSettings::default();
        let refined = refine_sections(&client, &ranked, &[1.0_f32; 64], &settings)
            .await
            .expect("refine");
        assert_eq!(refined.len(), 1);
        assert_eq!(refined[0].text, "The one and only paragraph.");
        assert_eq!(refined[0].document, "guide.pdf");
    }

    #[tokio::test]
    async fn picks_most_relevant_paragraph_for_top_sections_only() {
        let client = HashedEmbeddingClient::new(256);
        let query = client
            .generate_embeddings(vec!["coastal hiking trails".into()])
            .await
            .expect("query");
        let settings = PipelineSettings {
            min_paragraph_chars: 10,
            ..PipelineSettings::default()
        };
        let ranked = vec![
            scored(
                "Outdoors",
                1,
                &[
                    "Museums open late on Fridays downtown.",
                    "",
                    "Coastal hiking trails wind along the cliffs.",
                ],
            ),
            scored("Second", 2, &["Second body paragraph."]),
            scored("Third", 3, &["Third body paragraph."]),
            scored("Fourth", 4, &["Fourth body paragraph."]),
        ];

        let refined = refine_sections(&client, &ranked, &query[0], &settings)
            .await
            .expect("refine");
        assert_eq!(refined.len(), 3);
        assert_eq!(refined[0].text, "Coastal hiking trails wind along the cliffs.");
        assert_eq!(refined[0].page, 1);
        assert_eq!(refined[2].text, "Third body paragraph.");
    }
}
