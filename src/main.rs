use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context};
use clap::Parser;
use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing_subscriber::{fmt, EnvFilter};

use belongings_lens::{
    config::Config, HttpSearchClient, IngestOutcome, SearchController, SearchSurface, SelectedFile, TriggerControl,
    TriggerError, UploadedImage,
};

/// Find lost & found posts that look like a photo.
#[derive(Debug, Parser)]
#[command(name = "belongings_lens", version)]
struct Cli {
    /// Image files to search with. When several are given, the last one wins.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Base URL of the lost & found API (overrides SEARCH_API_BASE).
    #[arg(long)]
    api_base: Option<String>,

    /// Write the rendered results here instead of stdout.
    #[arg(long, short)]
    out: Option<PathBuf>,
}

/// Terminal stand-in for the host page.
#[derive(Default)]
struct ConsoleSurface {
    results: Mutex<String>,
}

impl SearchSurface for ConsoleSurface {
    fn notify(&self, message: &str) {
        tracing::warn!("{}", message);
        eprintln!("{message}");
    }

    fn show_preview(&self, image: &UploadedImage) {
        tracing::info!("🖼️ Preview: {} ({} bytes)", image.mime_type(), image.byte_len());
    }

    fn set_trigger(&self, control: TriggerControl) {
        tracing::debug!(?control, "Trigger control updated");
    }

    fn show_results(&self, html: &str) {
        *self.results.lock() = html.to_string();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = Config::load();
    let api_base = cli.api_base.unwrap_or(config.api_base);
    tracing::info!(%api_base, "Using visual search API");

    let surface = Arc::new(ConsoleSurface::default());
    let controller = SearchController::new(Arc::new(HttpSearchClient::new(api_base)), surface.clone());

    // Selections are started in order and encoded concurrently; only the newest may land.
    let mut encodings = JoinSet::new();
    for path in &cli.images {
        let file = SelectedFile::from_path(path).await.with_context(|| format!("reading {}", path.display()))?;
        if let Ok(ticket) = controller.begin_ingest(file) {
            encodings.spawn(ticket.encode());
        }
    }
    while let Some(joined) = encodings.join_next().await {
        match joined.context("encoding task panicked")? {
            Ok(encoded) => {
                if controller.complete_ingest(encoded) == IngestOutcome::Stale {
                    tracing::debug!("Superseded image discarded");
                }
            }
            Err(e) => surface.notify(&e.to_string()),
        }
    }

    match controller.trigger().await {
        Ok(state) => tracing::info!(?state, "Search finished"),
        Err(TriggerError::NoImage) => bail!("no usable image to search with"),
        Err(e) => bail!(e),
    }

    let html = surface.results.lock().clone();
    match cli.out {
        Some(path) => {
            tokio::fs::write(&path, html).await.with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("📄 Results written to {}", path.display());
        }
        None => println!("{html}"),
    }
    Ok(())
}
