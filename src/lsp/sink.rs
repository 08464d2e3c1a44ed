// Output sinks used by the command line tool.
use std::io::Write;

use anyhow::Context;
use serde::Serialize;

use crate::lsp::handler::MessageSink;
use crate::lsp::message::LspMessage;
use crate::lsp::types::{MessageKind, MessageSource, RequestId};

/// Writes one human readable summary line per message.
pub struct TextSink<W: Write> {
    writer: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(writer: W) -> Self {
        TextSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MessageSink for TextSink<W> {
    fn handle_message(&mut self, message: LspMessage) -> anyhow::Result<()> {
        writeln!(self.writer, "{}", summary_line(&message)).context("failed to write message")?;
        Ok(())
    }
}

/// Writes one JSON document per line, with the derived `kind` alongside the fields.
///
/// Payloads are written as plain JSON, so `raw_fields` names the ones that were
/// kept as undecodable text.
pub struct JsonSink<W: Write> {
    writer: W,
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    kind: Option<MessageKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    raw_fields: Vec<&'static str>,
    #[serde(flatten)]
    message: &'a LspMessage,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        JsonSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MessageSink for JsonSink<W> {
    fn handle_message(&mut self, message: LspMessage) -> anyhow::Result<()> {
        let raw_fields = [
            ("params", message.params()),
            ("result", message.result()),
            ("error", message.error()),
        ]
        .into_iter()
        .filter(|(_, payload)| payload.map_or(false, |p| p.as_raw().is_some()))
        .map(|(key, _)| key)
        .collect();
        let entry = JsonEntry {
            kind: message.kind(),
            raw_fields,
            message: &message,
        };
        serde_json::to_writer(&mut self.writer, &entry)?;
        self.writer
            .write_all(b"\n")
            .context("failed to write message")?;
        Ok(())
    }
}

fn summary_line(message: &LspMessage) -> String {
    let arrow = match message.source() {
        MessageSource::Client => "->",
        MessageSource::Server => "<-",
    };
    let kind = message
        .kind()
        .map(|kind| kind.to_string())
        .unwrap_or_else(|| String::from("unknown"));

    let mut line = format!(
        "{} [{}] {} {} {}",
        message.timestamp().to_rfc3339(),
        message.session(),
        message.source(),
        arrow,
        kind
    );
    if let Some(id) = message.id() {
        match id {
            RequestId::Number(n) => line.push_str(&format!(" #{}", n)),
            RequestId::String(s) => line.push_str(&format!(" #{}", s)),
        }
    }
    if let Some(method) = message.method() {
        line.push(' ');
        line.push_str(method);
    }
    line
}
