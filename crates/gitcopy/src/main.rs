use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::Commands;

#[derive(Parser)]
#[command(
    name = "gitcopy",
    version,
    about = "Copy a directory inside a GitHub repository in one commit"
)]
struct Cli {
    /// Base URL of the GitHub REST API
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    cli.command.run(cli.api_url).await
}
