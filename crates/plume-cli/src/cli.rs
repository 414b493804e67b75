use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "plume",
    about = "Plume: signed short posts on a shared ledger",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Node to talk to
    #[arg(long, global = true, default_value = "127.0.0.1:7878")]
    pub node: String,

    /// Key file holding the hex-encoded signing secret
    #[arg(long, global = true, default_value = "plume.key")]
    pub key: PathBuf,

    /// Per-request timeout in milliseconds
    #[arg(long, global = true, default_value = "5000")]
    pub timeout_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a new signing key
    Keygen(KeygenArgs),
    /// Publish a post
    Post(PostArgs),
    /// List every post, newest first
    Feed(FeedArgs),
    /// Show one post by key
    Show(ShowArgs),
    /// Run a node
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct KeygenArgs {
    /// Where to write the key (defaults to --key)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct PostArgs {
    pub topic: String,
    pub content: String,
}

#[derive(Args)]
pub struct FeedArgs {
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    /// Only show posts with this topic
    #[arg(long)]
    pub topic: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Storage key in hex, or a unique prefix of one
    #[arg(id = "post_key", value_name = "KEY")]
    pub key: String,
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML node configuration
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub bind: Option<String>,
    /// Keep posts in this directory instead of in memory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}
