use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sieve::{
    build_index, JsonLinesSource, LoadedIndex, ResultFormat, SearchRequest, Searcher,
    SieveConfig, Tokenizer,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "sieve")]
#[command(about = "Build and query compact keyword search indexes", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long, env = "SIEVE_CONFIG", global = true, default_value = "sieve.toml")]
    config: PathBuf,

    /// Override the index directory from the configuration
    #[arg(long, env = "SIEVE_INDEX_PATH", global = true)]
    index_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build an index from newline-delimited JSON rows
    Index {
        /// Rows to index, one JSON object per line
        #[arg(long)]
        source: PathBuf,
    },
    /// Query a built index and print the formatted reply
    Search {
        /// Free-text query
        #[arg(long)]
        query: String,

        /// Attribute filter, e.g. `category:fiction,drama;year:2021`
        #[arg(long)]
        filter: Vec<String>,

        #[arg(long)]
        limit: Option<usize>,

        #[arg(long, default_value = "0")]
        offset: usize,

        /// basic, json or xml
        #[arg(long)]
        format: Option<String>,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    info!("Starting Sieve v{}", sieve::VERSION);

    let mut config = SieveConfig::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(path) = args.index_path {
        config.index.index_path = path;
    }

    info!("Index settings:");
    info!("  Name: {}", config.index.name);
    info!("  Path: {:?}", config.index.index_path);

    let tokenizer = Tokenizer::new(&config.tokenizer);

    match args.command {
        Command::Index { source } => {
            let mut rows = JsonLinesSource::open(&source)?;
            let built = build_index(config.source.clone(), &tokenizer, &mut rows)
                .context("building index")?;
            built
                .write(&config.index, config.search.sort_terms_on_write)
                .context("writing index")?;
            info!("Indexed {} documents", built.doc_count());
        }
        Command::Search {
            query,
            filter,
            limit,
            offset,
            format,
        } => {
            let index = LoadedIndex::open(&config.index).context("loading index")?;
            let searcher = Searcher::new(Arc::new(index), Box::new(tokenizer));

            let mut request = SearchRequest::with_settings(query, &config.search);
            for f in &filter {
                request = request.with_filter(f);
            }
            let limit = limit.unwrap_or(request.limit);
            request = request.with_page(offset, limit);
            if let Some(format) = format {
                request = request.with_format(&format);
            }

            let response = searcher.search(&request);
            let reply = ResultFormat::from_name(&request.dataformat)
                .render(&response, searcher.index().attributes())?;
            print!("{}", reply);
        }
    }

    Ok(())
}
