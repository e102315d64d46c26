//! filepool-cli - Command-line interface for filepool
//!
//! One-shot file transfer commands against a running filepool server.

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use filepool_client::{Client, ConnectionConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "filepool-cli")]
#[command(about = "Command-line interface for the filepool file server")]
#[command(version)]
struct Cli {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6667", env = "FILEPOOL_SERVER")]
    server: SocketAddr,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List files stored on the server
    List,

    /// Download a file
    Get {
        /// Name of the file on the server
        name: String,

        /// Write to this path instead of the file's own name
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Upload a file
    Put {
        /// Local path to upload
        path: PathBuf,

        /// Store under this name instead of the file's own name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Delete a file from the server
    Delete {
        /// Name of the file on the server
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let client = Client::new(ConnectionConfig::new(cli.server));
    client.connect().await.map_err(|e| {
        eprintln!("{}: {}", "Connection failed".red(), e);
        e
    })?;

    match commands::execute(&client, cli.command).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            client.close().await;
            std::process::exit(1);
        }
    }

    client.close().await;
    Ok(())
}
