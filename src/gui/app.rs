//! Main application state and UI logic.

use std::time::Duration;

use egui::{Button, Color32, Context, Id, Modal, RichText};

use crate::error::AlertLevel;
use crate::session::Session;
use crate::transport::TransportState;

/// How often the UI wakes up to drain the connection while idle.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Main application state
pub struct PanelApp {
    session: Session,

    /// Runtime driving the WebSocket task; dropped after the session.
    #[cfg(feature = "websocket")]
    _runtime: Option<tokio::runtime::Runtime>,
}

impl PanelApp {
    /// Wraps an existing session.
    pub fn from_session(session: Session) -> Self {
        Self {
            session,
            #[cfg(feature = "websocket")]
            _runtime: None,
        }
    }

    /// Connects to the server behind `page_address` over WebSocket.
    #[cfg(feature = "websocket")]
    pub fn connect(page_address: &str, runtime: tokio::runtime::Runtime) -> Self {
        let connector = crate::ws::WsConnector::new(runtime.handle().clone());
        let session = Session::connect(page_address, Some(&connector));
        Self {
            session,
            _runtime: Some(runtime),
        }
    }

    /// Build without a live-connection backend: the session starts closed
    /// with an alert.
    #[cfg(not(feature = "websocket"))]
    pub fn connect(page_address: &str) -> Self {
        Self::from_session(Session::connect(page_address, None))
    }

    /// Session driven by this app.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Applies pending server messages and draws one frame.
    pub fn show(&mut self, ctx: &Context) {
        self.session.pump();

        self.render_top_bar(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| self.session.ui(ui));
        });
        self.render_alert(ctx);
    }

    fn render_top_bar(&mut self, ctx: &Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Parameters");
                ui.separator();

                let state = self.session.state();
                let color = match state {
                    TransportState::Connecting => Color32::YELLOW,
                    TransportState::Open => Color32::GREEN,
                    TransportState::Closed => Color32::RED,
                };
                ui.label(RichText::new(state.to_string()).color(color));

                let open = state == TransportState::Open;
                if ui
                    .add_enabled(open, Button::new("REFRESH"))
                    .on_hover_text("Ask the server to resend every value")
                    .clicked()
                {
                    self.session.refresh();
                }
            });
        });
    }

    /// Shows the oldest alert until it is acknowledged.
    fn render_alert(&mut self, ctx: &Context) {
        let Some(alert) = self.session.alerts().first() else {
            return;
        };
        let title = match alert.level {
            AlertLevel::Warning => "Warning",
            AlertLevel::Fatal => "Error",
        };
        let message = alert.message.clone();

        let mut acknowledged = false;
        Modal::new(Id::new("panel_alert")).show(ctx, |ui| {
            ui.heading(title);
            ui.label(message);
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                acknowledged = true;
            }
        });
        if acknowledged {
            self.session.dismiss_alert();
        }
    }
}

#[cfg(feature = "standalone")]
impl eframe::App for PanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.show(ctx);
        ctx.request_repaint_after(POLL_INTERVAL);
    }
}

impl std::fmt::Debug for PanelApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelApp")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
