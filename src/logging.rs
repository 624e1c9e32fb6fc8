//! Logging configuration and initialization for Folio.
//!
//! Application events go to stdout and the application log file. HTTP access
//! lines are emitted under the [`ACCESS_TARGET`] target and routed to a
//! separate access log in combined log format.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::{FolioError, Result};

/// Target used for HTTP access log lines.
pub const ACCESS_TARGET: &str = "access";

/// Parse log level string to tracing Level.
fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn open_append(path: &str) -> Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

fn app_filter(level: Level) -> Result<EnvFilter> {
    let access_off = format!("{ACCESS_TARGET}=off")
        .parse()
        .map_err(|e| FolioError::Config(format!("invalid log directive: {e}")))?;
    Ok(EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive(access_off))
}

/// Initialize the logging system with the given configuration.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let level = parse_level(&config.level);

    let log_file = Arc::new(open_append(&config.file)?);
    let access_file = Arc::new(open_append(&config.access_file)?);

    // Application events go to both stdout and the log file
    let writer = std::io::stdout.and(log_file);

    let app_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_filter(app_filter(level)?);

    let access_layer = tracing_subscriber::fmt::layer()
        .with_writer(access_file)
        .with_ansi(false)
        .with_target(false)
        .with_level(false)
        .without_time()
        .with_filter(Targets::new().with_target(ACCESS_TARGET, Level::INFO));

    tracing_subscriber::registry()
        .with(app_layer)
        .with(access_layer)
        .try_init()
        .map_err(|e| FolioError::Config(format!("logging already initialized: {e}")))?;

    Ok(())
}

/// Initialize console-only logging (for development and CLI helpers).
///
/// Access lines are printed to the console alongside everything else.
pub fn init_console_only(level: &str) {
    let level = parse_level(level);
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_ansi(true)
                .with_target(true),
        )
        .with(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("info"), Level::INFO);
        assert_eq!(parse_level("warning"), Level::WARN);
        assert_eq!(parse_level("ERROR"), Level::ERROR);
    }

    #[test]
    fn test_parse_level_default() {
        assert_eq!(parse_level("invalid"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_open_append_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/logs/access.log");
        let path = path.to_str().unwrap();

        open_append(path).unwrap();
        assert!(Path::new(path).exists());
    }

    #[test]
    fn test_app_filter_builds() {
        assert!(app_filter(Level::DEBUG).is_ok());
    }
}
