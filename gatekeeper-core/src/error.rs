//! Error types shared by every gatekeeper crate
//!
//! Storage and configuration failures carry an [`ErrorContext`] so a log line
//! can be matched to the request that produced it.

use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, warn};

pub type GatekeeperResult<T> = Result<T, GatekeeperError>;

/// Where an error came from and what might fix it
#[derive(Debug, Clone, Serialize)]
pub struct ErrorContext {
    /// Random id echoed in logs
    pub error_id: String,
    pub component: String,
    pub operation: Option<String>,
    pub details: HashMap<String, String>,
    pub suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            component: component.to_string(),
            operation: None,
            details: HashMap::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_detail(mut self, key: &str, value: &str) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestions.push(suggestion.to_string());
        self
    }
}

#[derive(Error, Debug)]
pub enum GatekeeperError {
    /// A session store could not complete a read or write
    #[error("Session storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Invalid value for {}: {message}", .field.as_deref().unwrap_or("input"))]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatekeeperError {
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            GatekeeperError::Storage { context, .. }
            | GatekeeperError::Config { context, .. }
            | GatekeeperError::Validation { context, .. } => Some(context),
            GatekeeperError::Io(_) => None,
        }
    }

    /// Storage failures at error level, bad input at warn
    pub fn log(&self) {
        let error_id = self.context().map(|c| c.error_id.as_str());
        match self {
            GatekeeperError::Config { .. } | GatekeeperError::Validation { .. } => {
                warn!(error_id = ?error_id, error = %self, "Rejected configuration");
            }
            GatekeeperError::Storage { .. } => {
                error!(error_id = ?error_id, error = %self, "Session storage failure");
            }
            GatekeeperError::Io(_) => {
                error!(error = %self, "I/O failure");
            }
        }
    }
}

#[macro_export]
macro_rules! storage_error {
    ($msg:expr, $component:expr) => {
        $crate::GatekeeperError::Storage {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::GatekeeperError::Storage {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::GatekeeperError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your gatekeeper configuration file"),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::GatekeeperError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component),
        }
    };
}
