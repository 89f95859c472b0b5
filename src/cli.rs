//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use transfer_core::transfer::constants::{DEFAULT_FILE_KEY, DEFAULT_FILE_NAME, DEFAULT_MIME_TYPE};

/// Upload files as multipart forms and download remote resources to disk.
#[derive(Parser, Debug)]
#[command(name = "transfer")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Netscape cookie file consulted for uploads ('-' reads stdin)
    #[arg(long, value_name = "FILE", global = true)]
    pub cookies: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a local file to a server as a multipart form
    Upload(UploadArgs),

    /// Download a remote resource to a local path
    Download(DownloadArgs),

    /// Run a raw host command with a JSON positional argument array
    Invoke(InvokeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct UploadArgs {
    /// Local file path or file:// URI
    pub source: String,

    /// Server URL receiving the form
    pub server: String,

    /// Form key of the file part
    #[arg(long, default_value = DEFAULT_FILE_KEY)]
    pub file_key: String,

    /// File name reported to the server
    #[arg(long, default_value = DEFAULT_FILE_NAME)]
    pub file_name: String,

    /// MIME type of the file part
    #[arg(long, default_value = DEFAULT_MIME_TYPE)]
    pub mime_type: String,

    /// Extra form field (repeatable, sent in order)
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// Disable TLS certificate and hostname verification (insecure)
    #[arg(long)]
    pub trust_all_certificates: bool,

    /// Accepted for compatibility; has no effect
    #[arg(long)]
    pub chunked: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// URL to fetch
    pub source: String,

    /// Local path or file:// URI to write
    pub target: String,
}

#[derive(Args, Debug, Clone)]
pub struct InvokeArgs {
    /// Command name (upload or download)
    pub action: String,

    /// JSON array of positional arguments
    #[arg(default_value = "[]")]
    pub args: String,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}
