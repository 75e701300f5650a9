//! Shaloc CLI - Share files locally over HTTP
//!
//! Shaloc serves a single file (or a zipped folder) on the local network,
//! optionally encrypted with a passphrase and optionally limited to a number
//! of downloads.
//!
//! ## Quick Start
//!
//! ```bash
//! # Share a file once, encrypted
//! shaloc share -f ./document.pdf -m 1 --aes -i 0.0.0.0
//!
//! # Download and decrypt it (on another device)
//! shaloc get -u http://192.168.1.36:8080/document.pdf --aes
//! ```

#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

use anyhow::Result;
use clap::Parser;

mod commands;
mod prompt;
mod ui;

use commands::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Command::Share(args) => commands::share::run(args).await,
        Command::Serve(args) => commands::serve::run(args).await,
        Command::Get(args) => commands::get::run(args).await,
        Command::Decrypt(args) => commands::decrypt::run(args).await,
        Command::Clean => commands::clean::run(),
        Command::Version => {
            println!("shaloc {}", shaloc_core::VERSION);
            Ok(())
        }
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,shaloc=info,shaloc_core=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
