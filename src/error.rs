//! Custom error types for the panel.
//!
//! This module defines the primary error type, `PanelError`, for the whole crate.
//! Using the `thiserror` crate, it gives a single place for everything that can go
//! wrong between reading the configuration and talking to the parameter server.
//!
//! ## Error Hierarchy
//!
//! - **`UnsupportedEnvironment`**: the build carries no live-connection backend.
//! - **`UnexpectedScheme`**: the page address is not served over `http:`. The
//!   connection is still attempted with the substituted scheme.
//! - **`InvalidAddress`**: the WebSocket address could not be parsed.
//! - **`ConnectionClosed`**: the live connection ended. This is terminal.
//! - **`Connect`** / **`Send`**: failures reported by the link backend.
//! - **`Protocol`**: a frame that is not valid JSON for the expected message.
//! - **`Config`** / **`Validation`**: configuration loading and semantic checks.
//! - **`Logging`**: the tracing subscriber could not be installed.
//!
//! The user-facing side of these errors is [`Alert`]: a blocking notice the front
//! end shows until it is dismissed.

use std::fmt;

use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type AppResult<T> = std::result::Result<T, PanelError>;

/// Errors raised by the panel.
#[derive(Error, Debug)]
pub enum PanelError {
    /// No live-connection backend was compiled in.
    #[error("Live connections are not available in this build")]
    UnsupportedEnvironment,

    /// Page address is not `http:`.
    #[error("Expected the page address to be of type 'http:' instead of '{0}:'")]
    UnexpectedScheme(String),

    /// Page address does not parse as a URL.
    #[error("Invalid connection address: {0}")]
    InvalidAddress(#[from] url::ParseError),

    /// The link closed, with the reason when one was given.
    #[error("Connection is closed{}", reason_suffix(.0))]
    ConnectionClosed(Option<String>),

    /// The link could not be established.
    #[error("Failed to connect: {0}")]
    Connect(String),

    /// A frame could not be handed to the link.
    #[error("Failed to send message: {0}")]
    Send(String),

    /// A frame is not valid protocol JSON.
    #[error("Malformed message: {0}")]
    Protocol(#[from] serde_json::Error),

    /// Figment failed to extract the configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// A configuration value is out of range.
    #[error("Configuration validation error: {0}")]
    Validation(String),

    /// Bad log settings or subscriber install failure.
    #[error("Logging setup error: {0}")]
    Logging(String),
}

fn reason_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(reason) if !reason.is_empty() => format!(": {reason}"),
        _ => String::new(),
    }
}

impl From<figment::Error> for PanelError {
    fn from(value: figment::Error) -> Self {
        PanelError::Config(Box::new(value))
    }
}

/// Severity of a user-facing alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    /// Informational; the session keeps working.
    Warning,
    /// The connection is gone.
    Fatal,
}

/// A blocking user-facing notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Severity
    pub level: AlertLevel,
    /// Text shown to the user
    pub message: String,
}

impl Alert {
    /// Builds the alert shown for `error`.
    ///
    /// A wrong page scheme is only a warning since the connection still goes ahead;
    /// every other error ends the session.
    pub fn from_error(error: &PanelError) -> Self {
        let level = match error {
            PanelError::UnexpectedScheme(_) => AlertLevel::Warning,
            _ => AlertLevel::Fatal,
        };
        Self {
            level,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Receiver of user-facing alerts.
pub trait AlertSink {
    fn alert(&mut self, alert: Alert);
}

impl AlertSink for Vec<Alert> {
    fn alert(&mut self, alert: Alert) {
        self.push(alert);
    }
}
