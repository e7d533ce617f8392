// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Logging setup for sisyphus binaries
//!
//! Every binary initialises `tracing` through this crate so that filter
//! syntax, output format and log file locations are the same everywhere.
//! `RUST_LOG` always wins over the level passed on the command line.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use tracing::Level;

/// Output format for log lines
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Plaintext,
    /// One JSON object per line
    Json,
}

/// Verbosity accepted by `--log-level`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CliLogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for Level {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

/// Logging flags, meant to be flattened into a binary's clap arguments.
///
/// Logs go to stdout unless `--log-file` or `--log-dir` is given.
#[derive(Clone, Debug, Default, clap::Args, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CliLoggingArgs {
    /// Log verbosity level (default: info)
    #[arg(long, value_enum)]
    pub log_level: Option<CliLogLevel>,

    /// Log output format (default: plaintext)
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Directory for log files
    #[arg(long)]
    pub log_dir: Option<String>,

    /// Log filename; a bare name lands in `--log-dir` or the platform data directory
    #[arg(long)]
    pub log_file: Option<String>,
}

impl CliLoggingArgs {
    pub fn init(self, component: &str) -> anyhow::Result<()> {
        let level = self.log_level.unwrap_or_default().into();
        let format = self.log_format.unwrap_or_default();

        match self.resolve_log_path(component) {
            Some(path) => init_to_file(component, level, format, &path),
            None => init(component, level, format),
        }
    }

    /// Log file to write to, or `None` for console output.
    fn resolve_log_path(&self, component: &str) -> Option<PathBuf> {
        match (&self.log_dir, &self.log_file) {
            (None, None) => None,
            (Some(dir), None) => Some(Path::new(dir).join(format!("{component}.log"))),
            (None, Some(file)) => {
                let file = Path::new(file);
                let bare = file.parent().map_or(true, |p| p.as_os_str().is_empty());
                if bare {
                    Some(standard_log_path(component).with_file_name(file))
                } else {
                    Some(file.to_path_buf())
                }
            }
            (Some(dir), Some(file)) => {
                let file = Path::new(file);
                if file.is_absolute() {
                    Some(file.to_path_buf())
                } else {
                    Some(Path::new(dir).join(file))
                }
            }
        }
    }
}

/// Platform data directory location for a component's log file.
pub fn standard_log_path(component: &str) -> PathBuf {
    let mut path = dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"));
    path.push("sisyphus");
    path.push(format!("{component}.log"));
    path
}

/// Console logging.
pub fn init(component: &str, default_level: Level, format: LogFormat) -> anyhow::Result<()> {
    init_with_writer(component, default_level, format, io::stdout)
}

/// Append logs to `log_path`, creating parent directories as needed.
pub fn init_to_file(
    component: &str,
    default_level: Level,
    format: LogFormat,
    log_path: &Path,
) -> anyhow::Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new().create(true).append(true).open(log_path)?;
    init_with_writer(component, default_level, format, file)
}

pub fn init_with_writer<W>(
    component: &str,
    default_level: Level,
    format: LogFormat,
    writer: W,
) -> anyhow::Result<()>
where
    W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(component, default_level)));

    match format {
        LogFormat::Json => {
            let layer = tracing_subscriber::fmt::layer().with_writer(writer).json();
            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
        LogFormat::Plaintext => {
            let layer = tracing_subscriber::fmt::layer().with_writer(writer);
            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
    }

    Ok(())
}

/// Filter directive used when `RUST_LOG` is unset. Crate targets use
/// underscores, so the component name is normalised.
fn default_filter(component: &str, level: Level) -> String {
    format!("{},{}={}", level, component.replace('-', "_"), level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_when_no_file_flags() {
        let args = CliLoggingArgs::default();
        assert_eq!(args.resolve_log_path("sisyphus-server"), None);
    }

    #[test]
    fn log_dir_uses_component_name() {
        let args = CliLoggingArgs {
            log_dir: Some("/var/log".into()),
            ..Default::default()
        };
        assert_eq!(
            args.resolve_log_path("sisyphus-server"),
            Some(PathBuf::from("/var/log/sisyphus-server.log"))
        );
    }

    #[test]
    fn relative_log_file_joins_dir() {
        let args = CliLoggingArgs {
            log_dir: Some("/var/log".into()),
            log_file: Some("custom.log".into()),
            ..Default::default()
        };
        assert_eq!(
            args.resolve_log_path("x"),
            Some(PathBuf::from("/var/log/custom.log"))
        );

        let absolute = CliLoggingArgs {
            log_dir: Some("/var/log".into()),
            log_file: Some("/tmp/abs.log".into()),
            ..Default::default()
        };
        assert_eq!(
            absolute.resolve_log_path("x"),
            Some(PathBuf::from("/tmp/abs.log"))
        );
    }

    #[test]
    fn bare_log_file_uses_standard_dir() {
        let args = CliLoggingArgs {
            log_file: Some("custom.log".into()),
            ..Default::default()
        };
        let path = args.resolve_log_path("x").unwrap();
        assert!(path.ends_with("sisyphus/custom.log"));

        let nested = CliLoggingArgs {
            log_file: Some("logs/custom.log".into()),
            ..Default::default()
        };
        assert_eq!(
            nested.resolve_log_path("x"),
            Some(PathBuf::from("logs/custom.log"))
        );
    }

    #[test]
    fn level_conversion() {
        assert_eq!(Level::from(CliLogLevel::Warn), Level::WARN);
        assert_eq!(Level::from(CliLogLevel::default()), Level::INFO);
    }

    #[test]
    fn default_filter_targets_component_crate() {
        assert_eq!(
            default_filter("sisyphus-server", Level::DEBUG),
            "DEBUG,sisyphus_server=DEBUG"
        );
    }

    #[test]
    fn standard_path_ends_with_component() {
        let path = standard_log_path("sisyphus-server");
        assert!(path.ends_with("sisyphus/sisyphus-server.log"));
    }

    #[test]
    fn file_logging_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("server.log");
        // A global subscriber may already be installed by another test; only
        // the file side effect is asserted.
        let _ = init_to_file("sisyphus-test", Level::INFO, LogFormat::Plaintext, &path);
        assert!(path.exists());
    }
}
