pub mod copy;

use clap::Subcommand;

use crate::config::Config;

#[derive(Subcommand)]
pub enum Commands {
    /// Copy <SRC> to <DEST> on the main branch of <OWNER>/<REPO>
    Copy(copy::CopyArgs),
}

impl Commands {
    pub async fn run(self, api_url: Option<String>) -> anyhow::Result<()> {
        let config = Config::load(api_url)?;
        match self {
            Commands::Copy(args) => copy::run(args, &config).await,
        }
    }
}
