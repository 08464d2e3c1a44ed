use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::lsp::error::CaptureError;
use crate::lsp::message::LspMessage;
use crate::lsp::types::MessageSource;

/// Consumer of parsed messages. Called once per message, in delivery order.
pub trait MessageSink {
    fn handle_message(&mut self, message: LspMessage) -> anyhow::Result<()>;
}

impl<F> MessageSink for F
where
    F: FnMut(LspMessage) -> anyhow::Result<()>,
{
    fn handle_message(&mut self, message: LspMessage) -> anyhow::Result<()> {
        self(message)
    }
}

/// A raw record as delivered by the logging side.
///
/// Both plain keys and the `Message-*` names used by LSP tooling loggers
/// are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct LogRecord {
    #[serde(alias = "Message-Source")]
    pub source: String,
    #[serde(alias = "Message-Session")]
    pub session: String,
    #[serde(alias = "Message-Timestamp")]
    pub timestamp: String,
    #[serde(default, alias = "args")]
    pub message: Value,
}

/// Bridges log records to a [`MessageSink`].
pub struct CaptureHandler<S> {
    sink: S,
}

impl<S: MessageSink> CaptureHandler<S> {
    pub fn new(sink: S) -> Self {
        CaptureHandler { sink }
    }

    /// Parse `record` and hand it to the sink.
    ///
    /// Returns `Ok(false)` when the record carries no JSON-RPC object; such
    /// records are not messages and are dropped silently.
    pub fn emit(&mut self, record: LogRecord) -> Result<bool, CaptureError> {
        let fields = match record.message {
            Value::Object(fields) => fields,
            other => {
                trace!(session = %record.session, "skipping non-object record: {}", other);
                return Ok(false);
            }
        };

        let source: MessageSource = record.source.parse()?;
        let message = LspMessage::from_rpc(record.session, &record.timestamp, source, fields)?;
        debug!(
            session = message.session(),
            source = %message.source(),
            method = message.method().unwrap_or("-"),
            kind = ?message.kind(),
            "captured message"
        );

        self.sink.handle_message(message)?;
        Ok(true)
    }
}
