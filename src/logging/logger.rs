use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global subscriber: console output plus an optional daily log file
///
/// `RUST_LOG` overrides the configured level.
pub fn init_logger(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(false);

    if !config.file_enabled {
        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .try_init()
            .context("Failed to install logger")?;
        tracing::info!("Logger initialized, console only");
        return Ok(());
    }

    let log_dir = get_log_dir(config);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, &config.file_name);

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .context("Failed to install logger")?;

    tracing::info!("Logger initialized, writing to {:?}", log_dir.join(&config.file_name));
    Ok(())
}

fn get_log_dir(config: &LoggingConfig) -> PathBuf {
    if let Some(directory) = &config.directory {
        return PathBuf::from(directory);
    }

    match std::env::current_exe() {
        Ok(exe_path) => exe_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| {
                eprintln!("Warning: Could not get parent directory of executable, using current directory");
                PathBuf::from(".")
            }),
        Err(e) => {
            eprintln!("Warning: Could not get executable path ({}), using current directory", e);
            PathBuf::from(".")
        }
    }
}
