//! # Parameter Panel
//!
//! Client side of a live parameter-editing interface. A parameter server
//! publishes a tree of typed, optionally bounded parameters over a WebSocket;
//! this crate renders that tree as interactive controls, sends the user's edits
//! back, and applies the server's value pushes to the matching controls.
//!
//! ## Crate Structure
//!
//! - **`format`**: precision-aware formatting of bounded floating point values.
//! - **`schema`**: the interface description (parameters, groups, value types).
//! - **`protocol`**: the text messages exchanged with the server.
//! - **`widgets`**: controls built from schema nodes and their egui drawing code.
//! - **`registry`**: routes inbound value updates to the control bound to each id.
//! - **`transport`**: the connection state machine and the `Link`/`Connector`
//!   seams it drives.
//! - **`ws`**: `tokio-tungstenite` implementation of those seams (`websocket` feature).
//! - **`session`**: transport, registry, widget tree and alerts composed for a front end.
//! - **`gui`**: the desktop front end.
//! - **`config`**, **`logging`**, **`error`**: configuration loading, tracing
//!   setup and the crate error type.

pub mod config;
pub mod error;
pub mod format;
pub mod gui;
pub mod logging;
pub mod protocol;
pub mod registry;
pub mod schema;
pub mod session;
pub mod transport;
pub mod widgets;

#[cfg(feature = "websocket")]
pub mod ws;

pub use error::{Alert, AlertLevel, AppResult, PanelError};
pub use session::Session;
