//! CLI command definitions and handlers.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Load configuration with graceful fallback to defaults.
///
/// If the config file doesn't exist or can't be parsed, it falls back to
/// defaults.
pub fn load_config() -> shaloc_core::config::Config {
    match shaloc_core::config::Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring configuration: {}", e);
            shaloc_core::config::Config::default()
        }
    }
}

pub mod clean;
pub mod decrypt;
pub mod get;
pub mod serve;
pub mod share;

/// Shaloc - Share files locally over HTTP
#[derive(Parser)]
#[command(name = "shaloc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand)]
pub enum Command {
    /// Share a file or folder, optionally encrypted and download-capped
    Share(ShareArgs),

    /// Serve a file or folder without encryption or download limit
    Serve(ServeArgs),

    /// Download a shared file
    Get(GetArgs),

    /// Decrypt a file downloaded from an encrypted share
    Decrypt(DecryptArgs),

    /// Remove temporary files left by shaloc
    Clean,

    /// Print the version
    Version,
}

/// What to share: exactly one of a file or a folder
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// File to share
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Folder to share (zipped before sharing)
    #[arg(short = 'F', long)]
    pub folder: Option<PathBuf>,
}

/// Where and under which route to listen
#[derive(Args, Debug)]
pub struct BindArgs {
    /// IP address to listen on
    #[arg(short, long)]
    pub ip: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<String>,

    /// Serve under a random route of this many letters (0 keeps the file name)
    #[arg(short, long)]
    pub random: Option<usize>,
}

/// Arguments for the share command
#[derive(Parser, Debug)]
pub struct ShareArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub bind: BindArgs,

    /// Maximum number of downloads before shutting down (negative = unlimited)
    #[arg(short, long, allow_negative_numbers = true)]
    pub max: Option<i64>,

    /// Encrypt the file with a passphrase before sharing
    #[arg(long)]
    pub aes: bool,
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub bind: BindArgs,
}

/// Arguments for the get command
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// URL to download
    #[arg(short, long)]
    pub url: String,

    /// Output file (defaults to the last segment of the URL)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Decrypt the downloaded file
    #[arg(long)]
    pub aes: bool,
}

/// Arguments for the decrypt command
#[derive(Parser, Debug)]
pub struct DecryptArgs {
    /// Encrypted file
    pub file: PathBuf,
}
