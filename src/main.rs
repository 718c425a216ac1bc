mod activity;
mod auth;
mod cli;
mod config;
mod error;
mod feed;
mod output;
mod providers;
mod status;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting glactivity");
    cli.execute().await?;

    Ok(())
}
