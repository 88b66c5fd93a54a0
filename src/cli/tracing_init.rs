//! Tracing/logging initialization for the CLI.

use crate::constants;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Logging choices taken from `-v` flags and the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
}

impl LogSettings {
    /// `-v` selects `debug` and `-vv` selects `trace` for restwire's targets;
    /// without flags the filter comes from `RESTWIRE_LOG` and defaults to
    /// `error`. An unknown `RESTWIRE_LOG_FORMAT` falls back to text.
    #[must_use]
    pub fn from_env(verbosity: u8) -> Self {
        let filter = match verbosity {
            0 => std::env::var(constants::ENV_RESTWIRE_LOG).unwrap_or_else(|_| "error".to_string()),
            1 => "restwire=debug".to_string(),
            _ => "restwire=trace".to_string(),
        };

        let format = match std::env::var(constants::ENV_RESTWIRE_LOG_FORMAT) {
            Ok(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            Ok(value) if value.eq_ignore_ascii_case("text") => LogFormat::Text,
            Ok(value) => {
                // Tracing is not initialized yet
                eprintln!(
                    "Warning: Unrecognized {} '{value}'. Valid values: 'json', 'text'. Using 'text'.",
                    constants::ENV_RESTWIRE_LOG_FORMAT
                );
                LogFormat::Text
            }
            Err(_) => LogFormat::Text,
        };

        let file = std::env::var_os(constants::ENV_RESTWIRE_LOG_FILE)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Self {
            filter,
            format,
            file,
        }
    }
}

/// Writer for log lines: the file at `path` opened for appending, or stderr
/// when there is no path or it cannot be opened.
#[must_use]
pub fn log_writer(path: Option<&Path>) -> BoxMakeWriter {
    let Some(path) = path else {
        return BoxMakeWriter::new(std::io::stderr);
    };
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
        Err(e) => {
            eprintln!(
                "Warning: Could not open log file '{}': {e}. Using stderr.",
                path.display()
            );
            BoxMakeWriter::new(std::io::stderr)
        }
    }
}

/// Installs the global subscriber for request/response logging.
pub fn init_tracing(verbosity: u8) {
    let settings = LogSettings::from_env(verbosity);

    let env_filter = EnvFilter::try_new(&settings.filter)
        .unwrap_or_else(|_| EnvFilter::new("error"));
    let writer = log_writer(settings.file.as_deref());

    match settings.format {
        LogFormat::Json => {
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_span_list(false)
                .with_target(true)
                .with_line_number(true)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(json_layer)
                .init();
        }
        LogFormat::Text => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .init();
        }
    }
}
