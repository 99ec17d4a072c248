//! Command-line front end for the loft webhook drive.

mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use loft_core::ContainerId;
use loft_remote::HttpWebhook;
use loft_store::{ByteStream, PathStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};

#[derive(Parser)]
#[command(name = "loft")]
#[command(about = "Chunked blob storage over webhook attachments")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(long, env = "LOFT_CONFIG", default_value = "loft.toml")]
    config: String,

    /// Root message id (overrides config)
    #[arg(long)]
    root: Option<ContainerId>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a file (or stdin) under a path
    Put {
        /// Destination path in the store
        path: String,
        /// Local file to read; stdin when omitted
        file: Option<PathBuf>,
    },
    /// Fetch a path into a file (or stdout)
    Get {
        /// Path to fetch
        path: String,
        /// Local file to write; stdout when omitted
        file: Option<PathBuf>,
    },
    /// Remove a path and delete its chunks
    Rm {
        /// Path to remove
        path: String,
    },
    /// List stored paths
    Ls,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let settings = settings::load(&cli.config)?;

    let mut store_config = settings.store.clone();
    if let Some(root) = cli.root {
        store_config.root = root;
    }

    let remote = Arc::new(HttpWebhook::new(&settings.remote).context("failed to build client")?);
    let store = PathStore::open(remote, &store_config)
        .await
        .context("failed to open store")?;

    match cli.command {
        Commands::Put { path, file } => {
            match file {
                Some(file) => {
                    let source = tokio::fs::File::open(&file)
                        .await
                        .with_context(|| format!("failed to open {}", file.display()))?;
                    store.put(&path, source).await?;
                }
                None => {
                    store.put(&path, tokio::io::stdin()).await?;
                }
            }
            flush_index(&store, store_config.root).await?;
            println!("stored {path}");
        }
        Commands::Get { path, file } => {
            let stream = store
                .get(&path)
                .await
                .with_context(|| format!("path not found: {path}"))?;
            match file {
                Some(file) => {
                    let out = tokio::fs::File::create(&file)
                        .await
                        .with_context(|| format!("failed to create {}", file.display()))?;
                    write_stream(stream, out).await?;
                }
                None => {
                    write_stream(stream, tokio::io::stdout()).await?;
                }
            }
        }
        Commands::Rm { path } => {
            if store.delete(&path).await? {
                flush_index(&store, store_config.root).await?;
                println!("removed {path}");
            } else {
                println!("not found: {path}");
            }
        }
        Commands::Ls => {
            for path in store.paths() {
                println!("{path}");
            }
        }
    }

    Ok(())
}

/// Persist the index and surface a root id that differs from the
/// configured one (first flush against a root that did not exist yet).
async fn flush_index(store: &PathStore, configured_root: ContainerId) -> Result<()> {
    let root = store.close().await.context("failed to persist index")?;
    if root != configured_root {
        println!("index stored in new root message; set store.root = {root}");
    }
    Ok(())
}

async fn write_stream(mut stream: ByteStream, mut out: impl AsyncWrite + Unpin) -> Result<()> {
    while let Some(chunk) = stream.next().await {
        out.write_all(&chunk?).await?;
    }
    out.flush().await?;
    Ok(())
}
