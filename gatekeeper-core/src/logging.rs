//! Unified logging system
//!
//! Provides structured logging with configurable output

use serde::{Deserialize, Serialize};
use std::io;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Whether to include file and line information
    pub include_location: bool,
    /// Whether to include thread information
    pub include_thread: bool,
    /// Whether to log span close events with their timings
    pub log_span_timings: bool,
    /// Log file path, stdout when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file_path: Option<String>,
    /// Custom filter directives
    pub filter_directives: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            include_location: false,
            include_thread: false,
            log_span_timings: false,
            log_file_path: None,
            filter_directives: vec![
                "gatekeeper_core=info".to_string(),
                "gatekeeper_applications=info".to_string(),
                "gatekeeper_web=info".to_string(),
            ],
        }
    }
}

impl LoggingConfig {
    fn env_filter(&self) -> Result<EnvFilter, Box<dyn std::error::Error + Send + Sync>> {
        let mut filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        for directive in &self.filter_directives {
            filter = filter.add_directive(directive.parse()?);
        }

        Ok(filter)
    }

    fn span_events(&self) -> FmtSpan {
        if self.log_span_timings {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }
}

/// Initialize the logging system
pub fn init_logging(
    config: &LoggingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let registry = tracing_subscriber::registry().with(config.env_filter()?);

    let file = match &config.log_file_path {
        Some(log_path) => Some(
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)?,
        ),
        None => None,
    };

    // Each format yields a distinct layer type, so every arm finishes its own init.
    match (config.format, file) {
        (LogFormat::Json, Some(file)) => registry
            .with(base_layer(config).json().with_writer(file))
            .try_init()?,
        (LogFormat::Json, None) => registry
            .with(base_layer(config).json().with_writer(io::stdout))
            .try_init()?,
        (LogFormat::Pretty, Some(file)) => registry
            .with(base_layer(config).pretty().with_writer(file))
            .try_init()?,
        (LogFormat::Pretty, None) => registry
            .with(base_layer(config).pretty().with_writer(io::stdout))
            .try_init()?,
        (LogFormat::Compact, Some(file)) => registry
            .with(base_layer(config).compact().with_writer(file))
            .try_init()?,
        (LogFormat::Compact, None) => registry
            .with(base_layer(config).compact().with_writer(io::stdout))
            .try_init()?,
    }

    Ok(())
}

fn base_layer<S>(config: &LoggingConfig) -> fmt::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_span_events(config.span_events())
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_thread_ids(config.include_thread)
        .with_thread_names(config.include_thread)
}
