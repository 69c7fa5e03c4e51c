use anyhow::Result;
use clap::{Parser, Subcommand};
use posidx_core::ingest::build_from_path;
use posidx_core::persist::write_index;
use posidx_core::tokenizer::Tokenizer;
use posidx_core::{search_at, DiskIndex, Index, IndexPaths, QueryMode};
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "posidx-indexer")]
#[command(about = "Build and query a positional inverted index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone, Copy)]
struct TokenizerArgs {
    /// Index surface forms instead of English stems
    #[arg(long, default_value_t = false)]
    no_stem: bool,
    /// Keep stopwords such as "the" and "of"
    #[arg(long, default_value_t = false)]
    keep_stopwords: bool,
}

impl From<TokenizerArgs> for Tokenizer {
    fn from(a: TokenizerArgs) -> Self {
        Tokenizer { stem: !a.no_stem, remove_stopwords: !a.keep_stopwords }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from JSON/JSONL/text files or a directory of them
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory (existing index files are overwritten)
        #[arg(long)]
        output: String,
        #[command(flatten)]
        tokenizer: TokenizerArgs,
    },
    /// Run one query against a persisted index
    Query {
        /// Index directory
        #[arg(long, default_value = "./index")]
        index: String,
        /// intersection, phrase or ranked
        #[arg(long, default_value_t = QueryMode::Intersection)]
        mode: QueryMode,
        /// Maximum number of hits to print
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Must match the options the index was built with
        #[command(flatten)]
        tokenizer: TokenizerArgs,
        /// Query text
        #[arg(required = true)]
        terms: Vec<String>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, tokenizer } => build_index(&input, &output, tokenizer.into()),
        Commands::Query { index, mode, limit, tokenizer, terms } => {
            run_query(&index, mode, limit, tokenizer.into(), &terms.join(" "))
        }
    }
}

fn build_index(input: &str, output: &str, tokenizer: Tokenizer) -> Result<()> {
    let (index, stats) = build_from_path(Path::new(input), tokenizer)?;
    tracing::info!(num_docs = stats.documents, num_terms = index.term_count(), "ingested documents");
    let meta = write_index(&index, &IndexPaths::new(output))?;
    tracing::info!(output, created_at = %meta.created_at, "index build complete");
    Ok(())
}

fn run_query(dir: &str, mode: QueryMode, limit: usize, tokenizer: Tokenizer, text: &str) -> Result<()> {
    let index = DiskIndex::open(IndexPaths::new(dir))?;
    tracing::debug!(created_at = %index.meta().created_at, "index loaded");
    let tokens = tokenizer.tokenize(text);
    let terms: Vec<&str> = tokens.iter().map(|(t, _)| t.as_str()).collect();
    let hits = search_at(&index, &tokens, mode)?;
    println!("{} matching document(s) for {mode} query {terms:?}", hits.len());
    for hit in hits.iter().take(limit) {
        let name = index.doc_name(hit.doc_id)?;
        if mode == QueryMode::Ranked {
            println!("{:>8} {:.6} {name}", hit.doc_id, hit.score);
        } else {
            println!("{:>8} {name}", hit.doc_id);
        }
    }
    Ok(())
}
