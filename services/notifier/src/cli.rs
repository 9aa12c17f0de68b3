use crate::runner;
use clap::{Args, Parser, Subcommand};
use postwatch::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Posting Watch Notifier",
    about = "Watch job-posting boards and announce new openings to a chat channel",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll continuously and serve status endpoints (default command)
    Run(RunArgs),
    /// Run a single poll cycle and exit
    Once(OnceArgs),
    /// Extract postings from a local document and print them as JSON
    Extract(ExtractArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// Override the configured poll interval in seconds
    #[arg(long)]
    pub(crate) interval: Option<u64>,
    /// Override the configured snapshot file
    #[arg(long)]
    pub(crate) state_file: Option<PathBuf>,
    /// Override the configured host for the status server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the status server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct OnceArgs {
    /// Override the configured snapshot file
    #[arg(long)]
    pub(crate) state_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ExtractArgs {
    /// Path to the markdown document to parse
    #[arg(long)]
    pub(crate) path: PathBuf,
    /// Source identifier recorded on the extracted postings
    #[arg(long, default_value = "local")]
    pub(crate) source: String,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Run(RunArgs::default()));

    match command {
        Command::Run(args) => runner::run(args).await,
        Command::Once(args) => runner::run_once(args).await,
        Command::Extract(args) => runner::run_extract(args),
    }
}
