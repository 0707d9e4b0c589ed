//! Wire protocol between the panel and the parameter server.
//!
//! Every frame is a text frame. The client sends two bare commands
//! (`send_interface`, `update`) and JSON update messages; the server sends JSON
//! envelopes `{"type": ..., "content": ...}`.
//!
//! | Direction | Frame | Meaning |
//! |-----------|-------|---------|
//! | client → server | `send_interface` | request the schema tree |
//! | client → server | `update` | request every current value |
//! | client → server | `{"type":"update","content":[{"id","value"}]}` | one edited value |
//! | server → client | `{"type":"interface","content":[...]}` | schema tree |
//! | server → client | `{"type":"update","content":[...]}` | one or more new values |

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tracing::debug;

use crate::error::AppResult;
use crate::schema::{decode_tree, SchemaTree};

/// Command asking the server for the schema tree.
pub const SEND_INTERFACE_COMMAND: &str = "send_interface";

/// Command asking the server to resend every current value.
pub const REFRESH_COMMAND: &str = "update";

const INTERFACE_TYPE: &str = "interface";
const UPDATE_TYPE: &str = "update";

/// One `(id, value)` pair of an update message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueUpdate {
    /// Parameter id.
    pub id: String,
    /// New value; `null` for actions.
    #[serde(default)]
    pub value: Value,
}

impl ValueUpdate {
    /// Entry for parameter `id`.
    pub fn new(id: impl Into<String>, value: Value) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

/// Frames the client sends.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Bare `send_interface` command.
    SendInterface,
    /// Bare `update` command.
    Refresh,
    /// A single edited value.
    Update(ValueUpdate),
}

#[derive(Serialize)]
struct UpdateEnvelope<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    content: [&'a ValueUpdate; 1],
}

impl ClientMessage {
    /// Update message for parameter `id`.
    pub fn update(id: impl Into<String>, value: Value) -> Self {
        ClientMessage::Update(ValueUpdate::new(id, value))
    }

    /// Text of the frame to put on the wire.
    pub fn encode(&self) -> AppResult<String> {
        match self {
            ClientMessage::SendInterface => Ok(SEND_INTERFACE_COMMAND.to_string()),
            ClientMessage::Refresh => Ok(REFRESH_COMMAND.to_string()),
            ClientMessage::Update(entry) => Ok(serde_json::to_string(&UpdateEnvelope {
                kind: UPDATE_TYPE,
                content: [entry],
            })?),
        }
    }
}

/// Frames the server sends.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Full schema tree; replaces the mounted interface.
    Interface(SchemaTree),
    /// New values for one or more parameters.
    Update(Vec<ValueUpdate>),
    /// Envelope with a `type` the panel does not handle.
    Unknown(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    content: Value,
}

impl ServerMessage {
    /// Parses one text frame.
    pub fn decode(text: &str) -> AppResult<Self> {
        let envelope: Envelope = serde_json::from_str(text)?;
        match envelope.kind.as_str() {
            INTERFACE_TYPE => Ok(ServerMessage::Interface(decode_tree(entries(
                envelope.content,
            )?))),
            UPDATE_TYPE => Ok(ServerMessage::Update(
                entries(envelope.content)?
                    .into_iter()
                    .filter_map(decode_update)
                    .collect(),
            )),
            _ => Ok(ServerMessage::Unknown(envelope.kind)),
        }
    }
}

/// Content as a list of raw entries; `null` or absent is an empty list.
fn entries(content: Value) -> AppResult<Vec<Value>> {
    if content.is_null() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_value(content)?)
}

fn decode_update(entry: Value) -> Option<ValueUpdate> {
    serde_json::from_value(entry)
        .map_err(|error| debug!(%error, "skipping malformed update entry"))
        .ok()
}
