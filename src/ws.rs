//! WebSocket link backed by `tokio-tungstenite`.
//!
//! Each connection runs as one task on a tokio runtime owned by the caller.
//! The UI side only ever touches the two channel ends held by [`WsLink`]:
//! events are polled with `try_recv`, outgoing frames are pushed into an
//! unbounded queue.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use futures_util::{SinkExt, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::error::{AppResult, PanelError};
use crate::transport::{Connector, Link, LinkEvent};

/// Opens WebSocket links on a tokio runtime.
#[derive(Debug, Clone)]
pub struct WsConnector {
    handle: Handle,
}

impl WsConnector {
    /// Connector spawning link tasks on `handle`.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }
}

impl Connector for WsConnector {
    fn connect(&self, url: &Url) -> AppResult<Box<dyn Link>> {
        let (event_tx, event_rx) = mpsc::channel();
        let (outbound_tx, outbound_rx) = unbounded_channel();
        self.handle
            .spawn(run_connection(url.to_string(), event_tx, outbound_rx));
        Ok(Box::new(WsLink {
            events: event_rx,
            outbound: outbound_tx,
            finished: false,
        }))
    }
}

/// UI-side end of one WebSocket connection.
#[derive(Debug)]
pub struct WsLink {
    events: Receiver<LinkEvent>,
    outbound: UnboundedSender<String>,
    finished: bool,
}

impl Link for WsLink {
    fn send(&mut self, text: String) -> AppResult<()> {
        self.outbound
            .send(text)
            .map_err(|_| PanelError::Send("connection task has stopped".into()))
    }

    fn try_next(&mut self) -> Option<LinkEvent> {
        if self.finished {
            return None;
        }
        match self.events.try_recv() {
            Ok(event) => {
                self.finished = matches!(event, LinkEvent::Closed(_));
                Some(event)
            }
            Err(TryRecvError::Empty) => None,
            // task ended without saying why
            Err(TryRecvError::Disconnected) => {
                self.finished = true;
                Some(LinkEvent::Closed(None))
            }
        }
    }
}

async fn run_connection(
    url: String,
    events: Sender<LinkEvent>,
    mut outbound: UnboundedReceiver<String>,
) {
    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            tracing::warn!(url = %url, "WebSocket connect failed: {}", e);
            let _ = events.send(LinkEvent::Closed(Some(e.to_string())));
            return;
        }
    };
    tracing::debug!(url = %url, "WebSocket handshake complete");
    if events.send(LinkEvent::Opened).is_err() {
        return;
    }

    let (mut sink, mut source) = stream.split();
    let reason = loop {
        tokio::select! {
            frame = outbound.recv() => {
                match frame {
                    Some(text) => {
                        if let Err(e) = sink.send(Message::Text(text)).await {
                            break Some(e.to_string());
                        }
                    }
                    // link dropped by the UI
                    None => {
                        let _ = sink.close().await;
                        break None;
                    }
                }
            }
            msg = source.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if events.send(LinkEvent::Message(text)).is_err() {
                            break None;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        break frame
                            .map(|frame| frame.reason.into_owned())
                            .filter(|reason| !reason.is_empty());
                    }
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket error: {}", e);
                        break Some(e.to_string());
                    }
                    None => break None,
                    _ => {}
                }
            }
        }
    };

    tracing::info!(url = %url, reason = ?reason, "WebSocket connection ended");
    let _ = events.send(LinkEvent::Closed(reason));
}
