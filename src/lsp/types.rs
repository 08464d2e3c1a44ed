use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lsp::error::CaptureError;

/// JSON-RPC correlation id. LSP allows either an integer or a string.
pub type RequestId = lsp_types::NumberOrString;

/// Which side of the conversation sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSource {
    Client,
    Server,
}

impl MessageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageSource::Client => "client",
            MessageSource::Server => "server",
        }
    }
}

impl fmt::Display for MessageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageSource {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(MessageSource::Client),
            "server" => Ok(MessageSource::Server),
            other => Err(CaptureError::UnknownSource(other.to_string())),
        }
    }
}

/// A `params`/`result`/`error` value.
///
/// Loggers frequently stringify payloads, so a string field is decoded as JSON
/// when it can be. Strings that are not JSON are kept verbatim as `Raw`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Structured(Value),
    Raw(String),
}

impl Payload {
    /// Lenient decode of a raw field value. Never fails; `None` means absent.
    pub fn decode(value: Value) -> Option<Payload> {
        match value {
            Value::Null => None,
            Value::String(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Null) => None,
                Ok(decoded) => Some(Payload::Structured(decoded)),
                Err(_) => Some(Payload::Raw(text)),
            },
            other => Some(Payload::Structured(other)),
        }
    }

    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            Payload::Structured(value) => Some(value),
            Payload::Raw(_) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&str> {
        match self {
            Payload::Structured(_) => None,
            Payload::Raw(text) => Some(text),
        }
    }

    /// The value as it appears on the wire. `decode(p.to_value())` gives `p` back.
    pub fn to_value(&self) -> Value {
        match self {
            // A bare string would decode as `Raw`, so keep it JSON-encoded.
            Payload::Structured(value @ Value::String(_)) => Value::String(value.to_string()),
            Payload::Structured(value) => value.clone(),
            Payload::Raw(text) => Value::String(text.clone()),
        }
    }
}

/// Protocol role of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Request,
    Response,
    Notification,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageKind::Request => "request",
            MessageKind::Response => "response",
            MessageKind::Notification => "notification",
        };
        f.write_str(s)
    }
}
