//! Observability hooks for executed requests and swallowed failures.

use crate::config::{Config, LoggingConfig};
use crate::error::QuarryError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// A request that reached the search service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestExecuted {
    /// Client operation (`search`, `get`, `explain`, ...)
    pub operation: String,
    pub request: Value,
    pub response: Value,
    pub executed_at: DateTime<Utc>,
}

impl RequestExecuted {
    pub fn new(operation: impl Into<String>, request: Value, response: Value) -> Self {
        Self {
            operation: operation.into(),
            request,
            response,
            executed_at: Utc::now(),
        }
    }
}

/// Receives request and failure notifications.
pub trait QueryLogger: Send + Sync {
    fn request_executed(&self, event: &RequestExecuted);

    /// A failure that was not propagated to the caller.
    fn error_suppressed(&self, context: &str, error: &QuarryError);
}

/// Logger writing through `tracing`
#[derive(Debug, Clone, Default)]
pub struct TracingQueryLogger {
    enabled: bool,
    channel: Option<String>,
}

impl TracingQueryLogger {
    pub fn new(logging: &LoggingConfig) -> Self {
        Self {
            enabled: logging.enabled,
            channel: logging.channel.clone(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.logging)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl QueryLogger for TracingQueryLogger {
    fn request_executed(&self, event: &RequestExecuted) {
        if !self.enabled {
            return;
        }

        tracing::debug!(
            channel = self.channel.as_deref().unwrap_or("default"),
            operation = %event.operation,
            executed_at = %event.executed_at,
            "Executed request {}",
            event.request
        );
    }

    fn error_suppressed(&self, context: &str, error: &QuarryError) {
        // Suppressed failures are reported whether or not request logging is on.
        tracing::warn!(
            channel = self.channel.as_deref().unwrap_or("default"),
            "Suppressed error while {}: {}",
            context,
            error
        );
    }
}
