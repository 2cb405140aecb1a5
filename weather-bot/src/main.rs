//! Binary crate for the `weather-bot` Telegram bot.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and interactive configuration
//! - The city lookup / selection conversation
//! - Rendering forecasts as chat messages

use clap::Parser;

mod bot;
mod cli;
mod conversation;
mod format;
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cmd.run().await
}
