use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use log::info;
use std::{path::PathBuf, sync::Arc};
use weather_core::{Config, provider_from_config};

use crate::{
    bot,
    conversation::{Conversation, Settings},
    logging,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-bot", version, about = "Telegram weather bot")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the bot (long polling).
    Run {
        /// Config file to use instead of the platform default.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Append diagnostics to this file instead of the configured one.
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Log to stderr, ignoring any configured log file.
        #[arg(long, conflicts_with = "log_file")]
        stderr: bool,
    },

    /// Interactively store the bot token and OpenWeather API key.
    Configure,

    /// Print the config file location.
    ConfigPath,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Run { config, log_file, stderr } => {
                let mut cfg = match &config {
                    Some(path) => Config::load_from(path)?,
                    None => Config::load()?,
                };
                cfg.apply_env();
                if log_file.is_some() {
                    cfg.log_file = log_file;
                }
                if stderr {
                    cfg.log_file = None;
                }

                start(cfg).await?;
            }
            Command::Configure => configure()?,
            Command::ConfigPath => println!("{}", Config::config_file_path()?.display()),
        }

        Ok(())
    }
}

async fn start(cfg: Config) -> anyhow::Result<()> {
    logging::init(cfg.log_file.as_deref())?;
    cfg.validate()?;

    let provider = provider_from_config(&cfg)?;
    let settings = Settings {
        forecast_days: cfg.openweather.forecast_days,
        fail_fast: cfg.fail_fast,
    };
    let conversation = Conversation::new(Arc::from(provider), settings);

    info!(
        "weather bot starting (lang={}, units={}, fail_fast={})",
        cfg.openweather.lang, cfg.openweather.units, cfg.fail_fast
    );
    bot::run(cfg.telegram.token, conversation).await;

    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let token = Password::new("Telegram bot token:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read bot token")?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    cfg.telegram.token = token.trim().to_string();
    cfg.openweather.api_key = api_key.trim().to_string();
    cfg.validate()?;
    cfg.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
