use anyhow::Result;
use clap::Parser;
use posidx_core::tokenizer::Tokenizer;
use posidx_core::Index;
use posidx_server::{build_app, load_index, IndexSource};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Index directory path
    #[arg(long, default_value = "./index", conflicts_with = "live")]
    index: String,
    /// Build an in-memory index from this file or directory instead
    #[arg(long)]
    live: Option<String>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Query terms are not stemmed (match an index built with --no-stem)
    #[arg(long, default_value_t = false)]
    no_stem: bool,
    /// Query stopwords are kept (match an index built with --keep-stopwords)
    #[arg(long, default_value_t = false)]
    keep_stopwords: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let tokenizer = Tokenizer { stem: !args.no_stem, remove_stopwords: !args.keep_stopwords };
    let (source, backend) = match args.live {
        Some(input) => (IndexSource::Live(input), "live"),
        None => (IndexSource::Disk(args.index), "disk"),
    };
    let index = load_index(&source, tokenizer)?;
    let num_docs = index.num_docs();
    let app = build_app(index, tokenizer);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, backend, num_docs, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
