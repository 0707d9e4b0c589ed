//! Transport adapter: the single live connection to the parameter server.
//!
//! The adapter is a small state machine:
//!
//! ```text
//! Connecting --opened--> Open --closed--> Closed (terminal)
//!      \________________closed__________/^
//! ```
//!
//! It derives the WebSocket address from the page address, asks a [`Connector`]
//! for a [`Link`], requests the interface as soon as the link opens, and turns
//! incoming text frames into [`ServerMessage`]s. A closed connection raises an
//! alert and is never retried.
//!
//! Links are polled, never awaited: the UI thread drains pending events between
//! frames, so everything on this side stays single-threaded.

use std::fmt;

use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Alert, AlertSink, AppResult, PanelError};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::widgets::Outbox;

/// Scheme the page address is expected to use.
pub const PAGE_SCHEME: &str = "http:";

/// Scheme substituted to reach the live connection.
pub const LIVE_SCHEME: &str = "ws:";

/// Event reported by a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The connection is established.
    Opened,
    /// One text frame from the server.
    Message(String),
    /// The connection ended or could not be established.
    Closed(Option<String>),
}

/// One live bidirectional text channel.
pub trait Link {
    /// Queues a text frame for sending.
    fn send(&mut self, text: String) -> AppResult<()>;

    /// Next pending event, without blocking.
    fn try_next(&mut self) -> Option<LinkEvent>;
}

/// Opens links. Absent when the build has no live-connection backend.
pub trait Connector {
    /// Starts connecting to `url`; completion is reported as [`LinkEvent::Opened`].
    fn connect(&self, url: &Url) -> AppResult<Box<dyn Link>>;
}

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Waiting for the link to open.
    Connecting,
    /// Frames flow both ways.
    Open,
    /// Terminal; nothing is sent or applied.
    Closed,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TransportState::Connecting => "connecting",
            TransportState::Open => "connected",
            TransportState::Closed => "disconnected",
        };
        f.write_str(text)
    }
}

/// Derives the live-connection address from the page address.
///
/// The leading scheme segment is replaced by `ws:` and everything after it is
/// kept. A page not served over `http:` raises an [`PanelError::UnexpectedScheme`]
/// alert, but the substituted address is still returned.
pub fn websocket_url(page_address: &str, alerts: &mut dyn AlertSink) -> AppResult<Url> {
    let (scheme, rest) = match page_address.split_once('/') {
        Some((scheme, rest)) => (scheme, Some(rest)),
        None => (page_address, None),
    };

    if scheme != PAGE_SCHEME {
        let err = PanelError::UnexpectedScheme(scheme.trim_end_matches(':').to_string());
        warn!(page_address, "{err}");
        alerts.alert(Alert::from_error(&err));
    }

    let address = match rest {
        Some(rest) => format!("{LIVE_SCHEME}/{rest}"),
        None => LIVE_SCHEME.to_string(),
    };
    Ok(Url::parse(&address)?)
}

/// Owner of the live link.
pub struct Transport {
    state: TransportState,
    url: Option<Url>,
    link: Option<Box<dyn Link>>,
}

impl Transport {
    /// Starts connecting to the server behind `page_address`.
    ///
    /// Every failure is reported through `alerts` and leaves the transport
    /// `Closed`; there is no retry.
    pub fn connect(
        page_address: &str,
        connector: Option<&dyn Connector>,
        alerts: &mut dyn AlertSink,
    ) -> Self {
        let url = match websocket_url(page_address, alerts) {
            Ok(url) => url,
            Err(err) => {
                warn!(page_address, error = %err, "cannot derive connection address");
                alerts.alert(Alert::from_error(&err));
                return Self::closed(None);
            }
        };

        let Some(connector) = connector else {
            let err = PanelError::UnsupportedEnvironment;
            warn!("{err}");
            alerts.alert(Alert::from_error(&err));
            return Self::closed(Some(url));
        };

        info!(url = %url, "connecting");
        match connector.connect(&url) {
            Ok(link) => Self {
                state: TransportState::Connecting,
                url: Some(url),
                link: Some(link),
            },
            Err(err) => {
                warn!(url = %url, error = %err, "connection failed");
                alerts.alert(Alert::from_error(&PanelError::ConnectionClosed(Some(
                    err.to_string(),
                ))));
                Self::closed(Some(url))
            }
        }
    }

    fn closed(url: Option<Url>) -> Self {
        Self {
            state: TransportState::Closed,
            url,
            link: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Live-connection address, once derived.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Drains link events up to the next server message.
    ///
    /// Open and close events are handled here: opening requests the interface,
    /// closing raises an alert and drops the link. Frames that do not parse are
    /// logged and skipped.
    pub fn next_message(&mut self, alerts: &mut dyn AlertSink) -> Option<ServerMessage> {
        loop {
            let event = self.link.as_mut()?.try_next()?;
            match event {
                LinkEvent::Opened => self.on_open(),
                LinkEvent::Message(text) => {
                    if self.state != TransportState::Open {
                        warn!(state = %self.state, "frame before open ignored");
                        continue;
                    }
                    match ServerMessage::decode(&text) {
                        Ok(message) => return Some(message),
                        Err(err) => warn!(error = %err, frame = %text, "unreadable frame ignored"),
                    }
                }
                LinkEvent::Closed(reason) => {
                    self.on_close(reason, alerts);
                    return None;
                }
            }
        }
    }

    fn on_open(&mut self) {
        if self.state != TransportState::Connecting {
            debug!(state = %self.state, "duplicate open event ignored");
            return;
        }
        info!(url = ?self.url.as_ref().map(Url::as_str), "connection open");
        self.state = TransportState::Open;
        self.send(ClientMessage::SendInterface);
    }

    fn on_close(&mut self, reason: Option<String>, alerts: &mut dyn AlertSink) {
        info!(reason = ?reason, "connection closed");
        self.state = TransportState::Closed;
        self.link = None;
        alerts.alert(Alert::from_error(&PanelError::ConnectionClosed(reason)));
    }

    /// Asks the server to resend every current value.
    pub fn refresh(&mut self) {
        self.send(ClientMessage::Refresh);
    }
}

impl Outbox for Transport {
    fn send(&mut self, message: ClientMessage) {
        if self.state != TransportState::Open {
            warn!(state = %self.state, ?message, "not connected, message dropped");
            return;
        }
        let Some(link) = self.link.as_mut() else {
            return;
        };
        let result = message.encode().and_then(|text| {
            debug!(frame = %text, "sending");
            link.send(text)
        });
        if let Err(err) = result {
            warn!(error = %err, "failed to send message");
        }
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("state", &self.state)
            .field("url", &self.url.as_ref().map(Url::as_str))
            .finish()
    }
}
