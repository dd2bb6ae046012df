use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use meetbot::cli::{self, Cli};
use meetbot::{env_manager, init_logger, Config};

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();
    env_manager::load_env_file();

    if !env_manager::check_env_vars() {
        warn!("Some required environment variables are missing; intent extraction will fail until they are set");
    }

    let args = Cli::parse();
    let config = Config::load(args.config.as_deref())?;
    info!("Contacts: {}, token: {}", config.contacts.csv_file.display(), config.google.token_path.display());

    cli::run(args, config).await
}
