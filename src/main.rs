mod cli;

use crate::cli::app::App;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    App::parse().run().await
}
