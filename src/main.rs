use anyhow::Context;
use clap::Parser;

mod cli;
mod config;
mod server;
mod utils;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    utils::log::init();
    cli.run().await.context("qtupload failed")
}
