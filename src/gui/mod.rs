//! Desktop front end.
//!
//! [`PanelApp`] wraps a [`Session`](crate::session::Session) and draws it with
//! egui: a top bar with the connection state and a refresh button, the widget
//! tree in a scrolling central panel, and a modal for the oldest pending alert.
//! The drawing code needs only `egui`; the `eframe::App` glue is compiled with
//! the `standalone` feature.

mod app;

pub use app::{PanelApp, POLL_INTERVAL};
