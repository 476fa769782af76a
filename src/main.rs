use std::path::PathBuf;

use clap::{Parser, Subcommand};

use docsearch::api;
use docsearch::config::CONFIG;
use docsearch::elastic::ElasticBackend;
use docsearch::indexer::Indexer;
use docsearch::render::{DropdownItem, decorate_result};
use docsearch::widget::SearchAdapter;

#[derive(Parser)]
#[command(name = "docsearch", about = "Documentation search service and tooling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the search proxy in front of Elasticsearch
    Serve {
        /// Address to listen on, defaults to BIND_ADDR
        #[arg(long)]
        bind: Option<String>,
    },
    /// Load a documentation build into the search index
    Index {
        /// Docs version tag the pages belong to
        #[arg(long)]
        version: String,
        /// Directory holding the Sphinx .fjson build output
        #[arg(long)]
        build_dir: PathBuf,
        /// Drop and recreate the index first
        #[arg(long)]
        recreate: bool,
    },
    /// One-shot query through the client adapter
    Search {
        #[arg(long)]
        version: String,
        term: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber (handles both tracing and log crate)
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| CONFIG.bind_addr.clone());
            api::serve(ElasticBackend::from_config(), &bind).await?;
        }
        Command::Index {
            version,
            build_dir,
            recreate,
        } => {
            let indexer = Indexer::new(ElasticBackend::from_config());
            if recreate {
                indexer.recreate_index().await?;
            }
            let count = indexer.index(&version, &build_dir).await?;
            println!("indexed {count} documents");
        }
        Command::Search { version, term } => {
            let endpoint = reqwest::Url::parse(&CONFIG.search_endpoint)?;
            let adapter = SearchAdapter::new(version, endpoint);
            let outcome = adapter.search(&term.join(" ")).await;
            if let Some(message) = &outcome.message {
                println!("{message}");
            } else if outcome.results.is_empty() {
                println!("no results");
            }
            for result in &outcome.results {
                println!("{}", decorate_result(&DropdownItem::from(result), false));
            }
        }
    }
    Ok(())
}
