use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use docqa_ai::embeddings::ollama_embed::OllamaEmbedder;
use docqa_ai::llm::ollama_llm::OllamaGenerator;
use docqa_ai::ollama::OllamaClient;
use docqa_ai::pipeline::{QueryResponse, RagPipeline};
use docqa_core::ingest::load_documents;
use docqa_core::settings::Settings;

/// Ask questions over a local documentation corpus, grounded in the chunks
/// retrieved from a persistent embedding index.
#[derive(Parser, Debug)]
#[command(name = "docqa", version, about)]
struct Cli {
    /// Single question to answer (skips interactive mode)
    #[arg(long, short = 'q')]
    query: Option<String>,

    /// Force a full rebuild of the index before answering
    #[arg(long, short = 's', default_value_t = false)]
    setup: bool,

    /// Run the interactive question loop
    #[arg(long, short = 'i', default_value_t = false)]
    interactive: bool,

    /// Optional TOML settings file
    #[arg(long, env = "DOCQA_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory holding docs/ and index/
    #[arg(long, env = "DOCQA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Ollama base URL (must be 127.0.0.1)
    #[arg(long, env = "DOCQA_OLLAMA_URL")]
    ollama_url: Option<String>,

    /// Embedding model identifier
    #[arg(long, env = "DOCQA_EMBEDDING_MODEL")]
    embedding_model: Option<String>,

    /// Generative model identifier
    #[arg(long, env = "DOCQA_GENERATIVE_MODEL")]
    generative_model: Option<String>,

    /// Number of chunks retrieved per question
    #[arg(long)]
    top_k: Option<usize>,
}

fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match cli.config.as_deref() {
        Some(path) => Settings::load_from_toml(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(dir) = cli.data_dir.clone() {
        settings.data_dir = dir;
    }
    if let Some(url) = cli.ollama_url.clone() {
        settings.ollama_url = url;
    }
    if let Some(model) = cli.embedding_model.clone() {
        settings.embedding_model = model;
    }
    if let Some(model) = cli.generative_model.clone() {
        settings.generative_model = model;
    }
    if let Some(k) = cli.top_k {
        settings.top_k = k;
    }
    Ok(settings)
}

fn run_setup(pipeline: &RagPipeline) -> Result<bool> {
    let docs_dir = pipeline.settings().docs_dir();
    fs::create_dir_all(&docs_dir)
        .with_context(|| format!("creating {}", docs_dir.display()))?;

    println!("Loading documents from {} ...", docs_dir.display());
    let report = load_documents(&docs_dir)?;
    for skipped in &report.skipped {
        println!("  skipped {}: {}", skipped.path.display(), skipped.reason);
    }
    if report.documents.is_empty() {
        println!(
            "No documents found. Add .txt or .md files to {} and re-run with --setup.",
            docs_dir.display()
        );
        return Ok(false);
    }

    println!("Indexing {} documents ...", report.documents.len());
    let state = pipeline.build_index(&report.documents)?;
    println!(
        "Index ready: {} chunks, embedding model {}.",
        state.chunk_count, state.embedding_model
    );
    Ok(true)
}

fn print_response(resp: &QueryResponse) {
    println!("\nAnswer:\n  {}", resp.answer);
    if !resp.sources.is_empty() {
        println!("\nSources:");
        for (i, source) in resp.sources.iter().take(3).enumerate() {
            println!("  {}. {}", i + 1, source.source);
            if let Some(page) = source.page {
                println!("     page: {page}");
            }
            if let Some(score) = source.relevance_score {
                println!("     relevance: {score:.2}");
            }
        }
    }
}

fn interactive_loop(pipeline: &RagPipeline) -> Result<()> {
    println!("Ask questions about the indexed documentation.");
    println!("Type 'help' for examples, 'quit' to stop.");

    let stdin = io::stdin();
    loop {
        print!("\nYour question: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let question = line.trim();

        match question {
            "" => continue,
            "quit" | "exit" | "q" => break,
            "help" => {
                println!("Example questions:");
                println!("  - How do I configure a pressure transmitter?");
                println!("  - What are the steps for instrument calibration?");
                println!("  - What are the system requirements?");
                continue;
            }
            _ => {}
        }

        match pipeline.query(question) {
            Ok(resp) => print_response(&resp),
            Err(e) => println!("Query failed: {e}"),
        }
    }
    println!("Goodbye.");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;

    let client = OllamaClient::new(&settings.ollama_url)?;
    client
        .health_check()
        .context("Ollama is not reachable; is it running on 127.0.0.1?")?;

    let embedder = OllamaEmbedder::new(client.clone());
    let generator = OllamaGenerator::new(client);
    let pipeline = RagPipeline::new(settings, Box::new(embedder), Box::new(generator));

    // Rebuild when asked, when no successful build exists, or when the index
    // was built with a different embedding model than the one configured now.
    let state = pipeline.state()?;
    let stale_model = state
        .as_ref()
        .map(|st| st.embedding_model != pipeline.settings().embedding_model)
        .unwrap_or(false);
    if cli.setup || state.is_none() || stale_model {
        if stale_model {
            println!("Embedding model changed; rebuilding the index.");
        }
        if !run_setup(&pipeline)? {
            return Ok(());
        }
    } else if let Some(st) = state {
        println!(
            "Loaded existing index: {} chunks, built {} with {}.",
            st.chunk_count, st.indexed_at, st.embedding_model
        );
    }

    match cli.query.as_deref() {
        Some(question) => {
            let resp = pipeline.query(question)?;
            print_response(&resp);
        }
        None => interactive_loop(&pipeline)?,
    }
    Ok(())
}
