use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use std::{
    fmt::Display,
    fs::{File, OpenOptions},
    io::{self, Write},
    path::Path,
};

const DEFAULT_FILTER: &str = "info,weather_bot=debug,weather_core=debug";

/// Initialize `env_logger`, appending to `log_file` when given, stderr otherwise.
///
/// `RUST_LOG` overrides the default filter.
pub fn init(log_file: Option<&Path>) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_FILTER));

    builder.format(|buf, record| format_record(buf, &chrono::Local::now(), record));

    match log_file {
        Some(path) => {
            let file = open_log_file(path)?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        None => {
            builder.target(env_logger::Target::Stderr);
        }
    }

    builder.try_init().context("Logger already initialized")?;
    Ok(())
}

/// `2026-10-17 09:30:05,123 INFO:message`
fn format_record<Tz>(buf: &mut impl Write, now: &DateTime<Tz>, record: &log::Record) -> io::Result<()>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    writeln!(
        buf,
        "{} {}:{}",
        now.format("%Y-%m-%d %H:%M:%S,%3f"),
        record.level(),
        record.args()
    )
}

/// Open for appending, creating the file if missing.
fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))
}
