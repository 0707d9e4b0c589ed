//! Panel configuration using Figment
//!
//! Configuration is layered, later sources winning:
//! 1. built-in defaults
//! 2. `config/param_panel.toml` (optional)
//! 3. environment variables prefixed with `PARAM_PANEL_`, nested keys split on `__`
//!
//! # Example
//! ```no_run
//! use param_panel::config::PanelConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PanelConfig::load()?;
//! config.validate()?;
//! println!("Server page: {}", config.connection.page_address);
//! # Ok(())
//! # }
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AppResult, PanelError};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/param_panel.toml";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "PARAM_PANEL_";

/// Accepted `logging.level` values.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
/// Accepted `logging.format` values.
pub const LOG_FORMATS: [&str; 3] = ["pretty", "compact", "json"];

/// Top-level panel configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Parameter server connection
    pub connection: ConnectionConfig,
    /// Native window
    pub window: WindowConfig,
    /// Log output
    pub logging: LoggingConfig,
}

/// `[connection]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Address of the page the server publishes; the live link is derived from it.
    pub page_address: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            page_address: "http://localhost:9000/".to_string(),
        }
    }
}

/// `[window]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Title bar text
    pub title: String,
    /// Initial inner width in points
    pub width: f32,
    /// Initial inner height in points
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Parameter Panel".to_string(),
            width: 480.0,
            height: 640.0,
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    /// pretty, compact or json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl PanelConfig {
    /// Load configuration from the default file and the environment
    ///
    /// Example: `PARAM_PANEL_CONNECTION__PAGE_ADDRESS=http://10.0.0.2:9000/`
    pub fn load() -> AppResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path
    ///
    /// A missing file is not an error; defaults and the environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        Ok(Self::figment(path.as_ref()).extract()?)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(PanelConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> AppResult<()> {
        if self.connection.page_address.trim().is_empty() {
            return Err(PanelError::Validation(
                "connection.page_address must not be empty".to_string(),
            ));
        }

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(PanelError::Validation(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }

        let format = self.logging.format.to_lowercase();
        if !LOG_FORMATS.contains(&format.as_str()) {
            return Err(PanelError::Validation(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                LOG_FORMATS.join(", ")
            )));
        }

        if !(self.window.width > 0.0 && self.window.height > 0.0) {
            return Err(PanelError::Validation(format!(
                "Invalid window size {}x{}. Both sides must be positive",
                self.window.width, self.window.height
            )));
        }

        Ok(())
    }
}
