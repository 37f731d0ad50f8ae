use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";
const DEFAULT_EMBEDDING_DIMENSION: usize = 384;
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_PDF_DIR: &str = "PDFs";
const DEFAULT_OUTPUT_FILE: &str = "challenge1b_output.json";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for a docsift run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Embedding provider used to generate vector representations.
    pub embedding_provider: EmbeddingProvider,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality of the vectors produced by the hashed provider.
    pub embedding_dimension: usize,
    /// Base URL of the Ollama runtime.
    pub ollama_url: String,
    /// Folder, relative to the input file, that holds the referenced PDFs.
    pub pdf_dir: String,
    /// File name of the result written next to the input file.
    pub output_file: String,
    /// Heuristic thresholds handed to the pipeline.
    pub pipeline: PipelineSettings,
}

/// Supported embedding backends for the ranking pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// Deterministic feature-hashing embedder that needs no model assets.
    Hashed,
    /// Local Ollama runtime.
    Ollama,
}

/// Thresholds and limits for heading detection, ranking, and summarization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Number of sections kept in `extracted_sections`.
    pub top_sections: usize,
    /// Number of top-ranked sections refined into `sub_section_analysis`.
    pub summary_sections: usize,
    /// Optional cap on how many ranked sections one document may contribute.
    pub max_sections_per_document: Option<usize>,
    /// Upper bound on words in a heading line.
    pub max_heading_words: usize,
    /// Body lines with fewer non-whitespace characters are treated as noise.
    pub min_line_chars: usize,
    /// Sections whose body is shorter than this are discarded.
    pub min_section_chars: usize,
    /// Characters of body text embedded together with the heading.
    pub excerpt_chars: usize,
    /// Word budget for a single paragraph during length-based segmentation.
    pub paragraph_max_words: usize,
    /// Paragraphs shorter than this are ignored when longer candidates exist.
    pub min_paragraph_chars: usize,
    /// Maximum length of a refined paragraph.
    pub max_refined_chars: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            top_sections: 5,
            summary_sections: 3,
            max_sections_per_document: None,
            max_heading_words: 10,
            min_line_chars: 2,
            min_section_chars: 10,
            excerpt_chars: 1000,
            paragraph_max_words: 120,
            min_paragraph_chars: 50,
            max_refined_chars: 1200,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// Blank values count as unset. Counts that must be positive reject `0`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        let defaults = PipelineSettings::default();
        let embedding_provider = match vars.get("EMBEDDING_PROVIDER") {
            Some(value) => value
                .parse()
                .map_err(|()| ConfigError::InvalidValue("EMBEDDING_PROVIDER".to_string()))?,
            None => EmbeddingProvider::Hashed,
        };

        Ok(Self {
            embedding_provider,
            embedding_model: vars.string("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            embedding_dimension: vars.positive("EMBEDDING_DIMENSION", DEFAULT_EMBEDDING_DIMENSION)?,
            ollama_url: vars.string("OLLAMA_URL", DEFAULT_OLLAMA_URL),
            pdf_dir: vars.string("DOCSIFT_PDF_DIR", DEFAULT_PDF_DIR),
            output_file: vars.string("DOCSIFT_OUTPUT_FILE", DEFAULT_OUTPUT_FILE),
            pipeline: PipelineSettings {
                top_sections: vars.positive("DOCSIFT_TOP_SECTIONS", defaults.top_sections)?,
                summary_sections: vars
                    .count("DOCSIFT_SUMMARY_SECTIONS", defaults.summary_sections)?,
                max_sections_per_document: vars
                    .get("DOCSIFT_MAX_SECTIONS_PER_DOCUMENT")
                    .map(|value| parse_positive("DOCSIFT_MAX_SECTIONS_PER_DOCUMENT", &value))
                    .transpose()?,
                max_heading_words: vars
                    .positive("DOCSIFT_MAX_HEADING_WORDS", defaults.max_heading_words)?,
                min_line_chars: vars.count("DOCSIFT_MIN_LINE_CHARS", defaults.min_line_chars)?,
                min_section_chars: vars
                    .count("DOCSIFT_MIN_SECTION_CHARS", defaults.min_section_chars)?,
                excerpt_chars: vars.positive("DOCSIFT_EXCERPT_CHARS", defaults.excerpt_chars)?,
                paragraph_max_words: vars
                    .positive("DOCSIFT_PARAGRAPH_MAX_WORDS", defaults.paragraph_max_words)?,
                min_paragraph_chars: vars
                    .count("DOCSIFT_MIN_PARAGRAPH_CHARS", defaults.min_paragraph_chars)?,
                max_refined_chars: vars
                    .positive("DOCSIFT_MAX_REFINED_CHARS", defaults.max_refined_chars)?,
            },
        })
    }
}

/// Typed accessors over a variable lookup.
struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Non-negative count; `0` is allowed.
    fn count(&self, key: &str, default: usize) -> Result<usize, ConfigError> {
        match self.get(key) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string())),
            None => Ok(default),
        }
    }

    fn positive(&self, key: &str, default: usize) -> Result<usize, ConfigError> {
        match self.get(key) {
            Some(value) => parse_positive(key, &value),
            None => Ok(default),
        }
    }
}

fn parse_positive(key: &str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::InvalidValue(key.to_string())),
    }
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hashed" => Ok(Self::Hashed),
            "ollama" => Ok(Self::Ollama),
            _ => Err(()),
        }
    }
}

/// Merge a `.env` file from the working directory (or a parent) into the process environment.
///
/// Variables already set in the environment take precedence. Call this before
/// [`crate::logging::init_tracing`] so `RUST_LOG` and `DOCSIFT_LOG_FILE` from the file apply.
/// Returns the path of the file that was loaded, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load configuration from the environment and install it in the global cache.
///
/// Subsequent calls return the configuration installed by the first successful call.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    if let Some(existing) = CONFIG.get() {
        return Ok(existing);
    }
    let config = Config::from_env()?;
    tracing::debug!(
        embedding_provider = ?config.embedding_provider,
        embedding_model = %config.embedding_model,
        pdf_dir = %config.pdf_dir,
        top_sections = config.pipeline.top_sections,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_vars(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn embedding_provider_parses_case_insensitively() {
        assert_eq!("Hashed".parse::<EmbeddingProvider>(), Ok(EmbeddingProvider::Hashed));
        assert_eq!(" OLLAMA ".parse::<EmbeddingProvider>(), Ok(EmbeddingProvider::Ollama));
        assert!("openai".parse::<EmbeddingProvider>().is_err());
    }

    #[test]
    fn parse_positive_rejects_zero_and_garbage() {
        assert_eq!(parse_positive("KEY", "7").unwrap(), 7);
        assert!(matches!(
            parse_positive("KEY", "0"),
            Err(ConfigError::InvalidValue(key)) if key == "KEY"
        ));
        assert!(parse_positive("KEY", "five").is_err());
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = from_vars(&[]).expect("defaults");
        assert_eq!(config.embedding_provider, EmbeddingProvider::Hashed);
        assert_eq!(config.embedding_model, "all-minilm");
        assert_eq!(config.embedding_dimension, 384);
        assert_eq!(config.pdf_dir, "PDFs");
        assert_eq!(config.output_file, "challenge1b_output.json");
        assert_eq!(config.pipeline, PipelineSettings::default());
        assert_eq!(config.pipeline.top_sections, 5);
        assert_eq!(config.pipeline.summary_sections, 3);
        assert!(config.pipeline.max_sections_per_document.is_none());
    }

    #[test]
    fn overrides_apply_and_blank_values_fall_back() {
        let config = from_vars(&[
            ("EMBEDDING_PROVIDER", "ollama"),
            ("OLLAMA_URL", "http://models:11434"),
            ("DOCSIFT_TOP_SECTIONS", "8"),
            ("DOCSIFT_SUMMARY_SECTIONS", "0"),
            ("DOCSIFT_MAX_SECTIONS_PER_DOCUMENT", " 2 "),
            ("DOCSIFT_PDF_DIR", "   "),
        ])
        .expect("config");

        assert_eq!(config.embedding_provider, EmbeddingProvider::Ollama);
        assert_eq!(config.ollama_url, "http://models:11434");
        assert_eq!(config.pipeline.top_sections, 8);
        assert_eq!(config.pipeline.summary_sections, 0);
        assert_eq!(config.pipeline.max_sections_per_document, Some(2));
        assert_eq!(config.pdf_dir, "PDFs");
    }

    #[test]
    fn zero_or_garbage_counts_are_rejected() {
        for (key, value) in [
            ("DOCSIFT_TOP_SECTIONS", "0"),
            ("DOCSIFT_MAX_SECTIONS_PER_DOCUMENT", "0"),
            ("DOCSIFT_SUMMARY_SECTIONS", "-1"),
            ("EMBEDDING_DIMENSION", "many"),
        ] {
            let error = from_vars(&[(key, value)]).unwrap_err();
            assert!(
                matches!(&error, ConfigError::InvalidValue(name) if name == key),
                "{key}={value} gave {error:?}"
            );
        }
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let error = from_vars(&[("EMBEDDING_PROVIDER", "openai")]).unwrap_err();
        assert!(matches!(error, ConfigError::InvalidValue(key) if key == "EMBEDDING_PROVIDER"));
    }
}
