pub mod error;
pub mod handler;
pub mod message;
pub mod record_reader;
pub mod sink;
pub mod types;

pub use error::CaptureError;
pub use handler::{CaptureHandler, LogRecord, MessageSink};
pub use message::LspMessage;
pub use types::{MessageKind, MessageSource, Payload, RequestId};
