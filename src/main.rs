//! Desktop entry point for the parameter panel
//!
//! Loads the configuration, applies command-line overrides, sets up logging and
//! opens the native window.
//!
//! # Usage
//!
//! ```bash
//! param-panel http://10.0.0.2:9000/
//! param-panel --config lab.toml --log-level debug --log-format compact
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;
use param_panel::config::{PanelConfig, DEFAULT_CONFIG_PATH, LOG_FORMATS};
use param_panel::gui::PanelApp;
use param_panel::logging::{self, TracingConfig};

#[derive(Parser, Debug)]
#[command(name = "param-panel")]
#[command(about = "Live editor for a parameter server's typed parameter tree", long_about = None)]
struct Cli {
    /// Address of the page published by the parameter server (http://host:port/)
    page_address: Option<String>,

    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_parser = LOG_FORMATS)]
    log_format: Option<String>,
}

impl Cli {
    /// Command-line values win over the configuration.
    fn apply(&self, config: &mut PanelConfig) {
        if let Some(address) = &self.page_address {
            config.connection.page_address = address.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = PanelConfig::load_from(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    cli.apply(&mut config);
    config.validate().context("invalid configuration")?;

    logging::init(TracingConfig::from_logging_config(&config.logging)?)?;
    tracing::info!(
        page_address = %config.connection.page_address,
        "Starting parameter panel"
    );

    #[cfg(feature = "websocket")]
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_title(config.window.title.clone()),
        ..Default::default()
    };

    let page_address = config.connection.page_address.clone();
    eframe::run_native(
        &config.window.title,
        options,
        Box::new(move |_cc| {
            #[cfg(feature = "websocket")]
            let app = PanelApp::connect(&page_address, runtime);
            #[cfg(not(feature = "websocket"))]
            let app = PanelApp::connect(&page_address);
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("window closed with error: {e}"))
}
