//! Folio command-line entrypoint.
//!
//! Reads a JSON document (`{"pages": [{"text": "...", "embedding": [...]}]}`), orders its
//! pages and prints the report.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mimalloc::MiMalloc;
use serde::Deserialize;

use folio::config::Config;
use folio::pipeline::Pipeline;
use folio::providers::{
    EmbeddingProvider, InMemoryTextProvider, PrecomputedEmbeddings, StubEmbedder,
};
use folio::reasoning::{GenaiReasoner, ReasoningClient};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Debug, Parser)]
#[command(name = "folio", version, about = "Restore the page order of a shuffled document")]
struct Args {
    /// JSON file holding the document's pages in their current order.
    input: PathBuf,

    /// Embed pages that carry no embedding with the built-in hashed bag-of-words embedder.
    #[arg(long)]
    stub_embeddings: bool,

    /// Print the text explanation instead of the JSON report.
    #[arg(long)]
    explain: bool,
}

#[derive(Debug, Deserialize)]
struct InputDocument {
    pages: Vec<InputPage>,
}

#[derive(Debug, Deserialize)]
struct InputPage {
    text: String,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    let raw = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("reading {}", args.input.display()))?;
    let document: InputDocument = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", args.input.display()))?;

    let mut embeddings = PrecomputedEmbeddings::new();
    for page in &document.pages {
        if let Some(vector) = &page.embedding {
            embeddings.insert(&page.text, vector.clone());
        }
    }
    if args.stub_embeddings {
        embeddings = embeddings.with_fallback(StubEmbedder::default());
    }
    let use_embeddings = args.stub_embeddings || !embeddings.is_empty();

    let reasoner: Option<Arc<dyn ReasoningClient>> = match &config.ai_model {
        Some(model) => {
            tracing::info!(model = %model, "reasoning collaborator enabled");
            Some(Arc::new(GenaiReasoner::new(model.clone())))
        }
        None => {
            tracing::info!("no FOLIO_AI_MODEL set, escalations will be recorded as unavailable");
            None
        }
    };

    let page_count = document.pages.len();
    let text = InMemoryTextProvider::from_texts(document.pages.into_iter().map(|p| p.text));
    let embedder: Option<&dyn EmbeddingProvider> = use_embeddings.then_some(&embeddings as &dyn EmbeddingProvider);

    tracing::info!(
        input = %args.input.display(),
        pages = page_count,
        embeddings = use_embeddings,
        "ordering document"
    );

    let pipeline = Pipeline::new(config, reasoner)?;
    let processed = pipeline.process(&text, embedder, page_count).await?;

    if args.explain {
        print!("{}", processed.report.explain());
    } else {
        println!("{}", serde_json::to_string_pretty(&processed.report)?);
    }

    Ok(())
}
