use thiserror::Error;

/// Errors raised while turning a captured record into an `LspMessage`.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("invalid timestamp {value:?}: expected an ISO-8601 date/time")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("unknown message source {0:?} (expected \"client\" or \"server\")")]
    UnknownSource(String),

    #[error("session id must not be empty")]
    EmptySession,

    #[error("invalid `{field}` field: {value}")]
    InvalidField {
        field: &'static str,
        value: serde_json::Value,
    },

    #[error(transparent)]
    Sink(#[from] anyhow::Error),
}
