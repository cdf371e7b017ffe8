use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use axum::Router;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use medbot_backend::client::{run_chat, ChatClient, DEFAULT_BACKEND_URL};
use medbot_backend::core::config::settings::{load_dotenv, BACKEND_URL};
use medbot_backend::core::config::Settings;
use medbot_backend::core::logging;
use medbot_backend::embeddings::{Embedder, LocalEmbedder};
use medbot_backend::rag::{run_ingest, PineconeIndex};
use medbot_backend::server;
use medbot_backend::state::AppState;

#[derive(Parser)]
#[command(name = "medbot", version, about = "Medical question answering over your PDF library")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Index every PDF in a directory
    Ingest {
        /// Directory of PDFs; defaults to `ingest.data_dir`
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Interactive chat against a running API
    Chat {
        #[arg(long, env = BACKEND_URL, default_value = DEFAULT_BACKEND_URL)]
        backend_url: String,
    },
    /// Ask one question and print the answer
    Ask {
        question: String,
        #[arg(long, env = BACKEND_URL, default_value = DEFAULT_BACKEND_URL)]
        backend_url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before clap, so BACKEND_URL from .env is visible to `env =` args.
    load_dotenv();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Ingest { data_dir } => ingest(data_dir).await,
        Command::Chat { backend_url } => {
            logging::init_stderr();
            run_chat(&ChatClient::new(&backend_url)).await
        }
        Command::Ask {
            question,
            backend_url,
        } => {
            logging::init_stderr();
            let answer = ChatClient::new(&backend_url).ask(&question).await?;
            println!("{}", answer);
            Ok(())
        }
    }
}

async fn serve() -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load configuration")?;
    logging::init(&settings.logging);

    let bind_addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}", settings.server.host))?;

    let state = AppState::initialize(settings).await?;

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn ingest(data_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load configuration")?;
    logging::init(&settings.logging);

    let data_dir = data_dir.unwrap_or_else(|| settings.ingest.data_dir.clone());
    let embedding = settings.embedding.clone();
    let embedder = tokio::task::spawn_blocking(move || LocalEmbedder::new(&embedding))
        .await
        .context("embedding model loader panicked")??;
    tracing::info!(
        "Embedding model {} loaded on {}",
        embedder.model_name(),
        embedder.device()
    );
    let index = PineconeIndex::new(&settings);

    let report = run_ingest(&settings, &data_dir, &embedder, &index).await?;
    tracing::info!(
        "Ingestion finished with {}: {} page(s), {} chunk(s), {} upserted, index created: {}",
        report.model,
        report.documents,
        report.chunks,
        report.upserted,
        report.index_created
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
