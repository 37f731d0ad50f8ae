use anyhow::{Context, Result};
use clap::Parser;
use docsift::{config, embedding, extraction::PdfExtractor, input, logging, output, processing};
use std::path::PathBuf;

/// Rank the sections of a PDF collection against a persona and task.
#[derive(Debug, Parser)]
#[command(name = "docsift", version, about)]
struct Cli {
    /// Path to the input JSON file.
    input: PathBuf,
    /// Write the result here instead of next to the input file.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let dotenv_path = config::load_dotenv();
    let _logging = logging::init_tracing();
    if let Some(path) = dotenv_path {
        tracing::debug!(path = %path.display(), "Merged .env file");
    }
    let config = config::init_config().context("failed to load configuration")?;

    let loaded = input::load_request(&cli.input, &config.pdf_dir, &config.output_file)
        .with_context(|| format!("failed to load input {}", cli.input.display()))?;
    if let Some(description) = loaded
        .challenge_info
        .as_ref()
        .and_then(|info| info.description.as_deref())
    {
        tracing::info!(description, "Processing collection");
    }

    let service = processing::AnalysisService::new(
        embedding::build_embedding_client(config),
        Box::new(PdfExtractor::new()),
        config.pipeline.clone(),
    );
    let run = service
        .analyze(&loaded.request)
        .await
        .context("analysis failed")?;

    let output_path = cli.output.unwrap_or(loaded.default_output_path);
    output::write_output(&output_path, &run.output)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    tracing::info!(output = %output_path.display(), "Wrote result");
    println!("{}", output_path.display());
    Ok(())
}
