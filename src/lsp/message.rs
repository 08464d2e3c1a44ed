use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::lsp::error::CaptureError;
use crate::lsp::types::{MessageKind, MessageSource, Payload, RequestId};

// Tried in order after RFC 3339, on text already run through
// `normalize_iso8601`. `%#z` takes `Z`, `+05`, `+0530` and `+05:30`.
// Naive forms are read as UTC.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M%#z",
    "%Y%m%dT%H%M%S%.f%#z",
    "%Y%m%dT%H%M%#z",
];
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S%.f",
    "%Y%m%dT%H%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

/// A single captured JSON-RPC message plus the metadata recorded with it.
///
/// Built once by [`LspMessage::from_rpc`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LspMessage {
    session: String,
    timestamp: DateTime<FixedOffset>,
    source: MessageSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<RequestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Payload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Payload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Payload>,
}

impl LspMessage {
    /// Create a message from the fields of a JSON-RPC object.
    ///
    /// Unknown keys (`jsonrpc` and friends) are ignored. `params`, `result` and
    /// `error` are decoded leniently, see [`Payload::decode`].
    pub fn from_rpc(
        session: impl Into<String>,
        timestamp: &str,
        source: MessageSource,
        mut message: Map<String, Value>,
    ) -> Result<Self, CaptureError> {
        let session = session.into();
        if session.is_empty() {
            return Err(CaptureError::EmptySession);
        }
        let timestamp = parse_timestamp(timestamp)?;
        let id = parse_id(message.remove("id"))?;
        let method = parse_method(message.remove("method"))?;

        Ok(LspMessage {
            session,
            timestamp,
            source,
            id,
            method,
            params: message.remove("params").and_then(Payload::decode),
            result: message.remove("result").and_then(Payload::decode),
            error: message.remove("error").and_then(Payload::decode),
        })
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    pub fn source(&self) -> MessageSource {
        self.source
    }

    pub fn id(&self) -> Option<&RequestId> {
        self.id.as_ref()
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn params(&self) -> Option<&Payload> {
        self.params.as_ref()
    }

    pub fn result(&self) -> Option<&Payload> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&Payload> {
        self.error.as_ref()
    }

    pub fn is_request(&self) -> bool {
        self.id.is_some() && self.params.is_some()
    }

    pub fn is_response(&self) -> bool {
        self.id.is_some() && (self.result.is_some() || self.error.is_some())
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none() && self.params.is_some()
    }

    /// Single role for display. A message carrying both `params` and a
    /// `result` counts as a response.
    pub fn kind(&self) -> Option<MessageKind> {
        if self.is_response() {
            Some(MessageKind::Response)
        } else if self.is_request() {
            Some(MessageKind::Request)
        } else if self.is_notification() {
            Some(MessageKind::Notification)
        } else {
            None
        }
    }

    /// Re-encode the JSON-RPC fields. Feeding the result back into
    /// [`LspMessage::from_rpc`] gives an equal message.
    pub fn to_rpc(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("jsonrpc".to_string(), Value::from("2.0"));
        if let Some(id) = &self.id {
            let id = match id {
                RequestId::Number(n) => Value::from(*n),
                RequestId::String(s) => Value::from(s.as_str()),
            };
            fields.insert("id".to_string(), id);
        }
        if let Some(method) = &self.method {
            fields.insert("method".to_string(), Value::from(method.as_str()));
        }
        for (key, payload) in [
            ("params", &self.params),
            ("result", &self.result),
            ("error", &self.error),
        ] {
            if let Some(payload) = payload {
                fields.insert(key.to_string(), payload.to_value());
            }
        }
        fields
    }
}

/// Parse an ISO-8601 timestamp as written by common loggers.
///
/// Accepts extended and basic forms, `T` or space separators, hour-only
/// times, `.` or `,` fractions and `Z`/`±hh`/`±hhmm`/`±hh:mm` offsets.
pub fn parse_timestamp(text: &str) -> Result<DateTime<FixedOffset>, CaptureError> {
    let text = text.trim();
    let rfc3339_err = match DateTime::parse_from_rfc3339(text) {
        Ok(ts) => return Ok(ts),
        Err(e) => e,
    };

    let normalized = normalize_iso8601(text);
    for format in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(&normalized, format) {
            return Ok(ts);
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Ok(Utc.from_utc_datetime(&naive).into());
        }
    }
    for format in DATE_FORMATS {
        if let Some(naive) = NaiveDate::parse_from_str(&normalized, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            return Ok(Utc.from_utc_datetime(&naive).into());
        }
    }

    Err(CaptureError::Timestamp {
        value: text.to_string(),
        source: rfc3339_err,
    })
}

/// Rewrite the ISO-8601 variants chrono has no directive for: comma
/// fractions become `.` and an hour-only time gets `00` minutes.
fn normalize_iso8601(text: &str) -> String {
    let text = text.replace(',', ".");
    let Some(split) = text.find(|c: char| c == 'T' || c == ' ') else {
        return text;
    };
    let (date, rest) = text.split_at(split + 1);
    let clock_end = rest
        .find(|c: char| matches!(c, '+' | '-' | 'Z' | 'z'))
        .unwrap_or(rest.len());
    let (clock, offset) = rest.split_at(clock_end);

    if clock.len() == 2 && clock.bytes().all(|b| b.is_ascii_digit()) {
        let separator = if date.contains('-') { ":" } else { "" };
        return format!("{}{}{}00{}", date, clock, separator, offset);
    }
    text
}

fn parse_id(value: Option<Value>) -> Result<Option<RequestId>, CaptureError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(RequestId::String(s))),
        Some(Value::Number(n)) => match n.as_i64().and_then(|n| i32::try_from(n).ok()) {
            Some(n) => Ok(Some(RequestId::Number(n))),
            None => Err(CaptureError::InvalidField {
                field: "id",
                value: Value::Number(n),
            }),
        },
        Some(other) => Err(CaptureError::InvalidField {
            field: "id",
            value: other,
        }),
    }
}

fn parse_method(value: Option<Value>) -> Result<Option<String>, CaptureError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(CaptureError::InvalidField {
            field: "method",
            value: other,
        }),
    }
}
