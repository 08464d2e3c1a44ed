use anyhow::Context;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{info, warn};

use crate::cli::{Config, OutputFormat};
use crate::lsp::record_reader::{LineReader, RecordReader};
use crate::lsp::sink::{JsonSink, TextSink};
use crate::lsp::{CaptureError, CaptureHandler, LogRecord, MessageSink};

/// Counts of what happened to the records of one capture.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub delivered: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub async fn run(config: Config) -> anyhow::Result<Summary> {
    let input: Box<dyn AsyncBufRead + Unpin + Send> = match &config.input {
        Some(path) => {
            let file = File::open(path)
                .await
                .with_context(|| format!("failed to open capture file {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };
    let mut records = LineReader::new(input);

    let summary = match config.format {
        OutputFormat::Text => {
            let mut handler = CaptureHandler::new(TextSink::new(std::io::stdout()));
            process(&mut records, &mut handler, config.strict).await?
        }
        OutputFormat::Json => {
            let mut handler = CaptureHandler::new(JsonSink::new(std::io::stdout()));
            process(&mut records, &mut handler, config.strict).await?
        }
    };

    info!(
        delivered = summary.delivered,
        skipped = summary.skipped,
        failed = summary.failed,
        "capture processed"
    );
    Ok(summary)
}

/// Feed every record from `records` through `handler`.
///
/// Bad records are logged and counted unless `strict` is set. Sink failures
/// always abort.
pub async fn process<R, S>(
    records: &mut R,
    handler: &mut CaptureHandler<S>,
    strict: bool,
) -> anyhow::Result<Summary>
where
    R: RecordReader,
    S: MessageSink,
{
    let mut summary = Summary::default();

    while let Some(line) = records.read().await? {
        let position = records.position();
        let record: LogRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(e) => {
                let err = anyhow::Error::new(e)
                    .context(format!("line {}: malformed log record", position));
                reject(err, strict, &mut summary)?;
                continue;
            }
        };

        match handler.emit(record) {
            Ok(true) => summary.delivered += 1,
            Ok(false) => summary.skipped += 1,
            Err(CaptureError::Sink(e)) => {
                return Err(e.context(format!("line {}: failed to deliver message", position)))
            }
            Err(e) => {
                let err = anyhow::Error::new(e).context(format!("line {}", position));
                reject(err, strict, &mut summary)?;
            }
        }
    }

    Ok(summary)
}

fn reject(err: anyhow::Error, strict: bool, summary: &mut Summary) -> anyhow::Result<()> {
    if strict {
        return Err(err);
    }
    warn!("{:#}", err);
    summary.failed += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsp::{LspMessage, MessageKind};

    const CAPTURE: &str = r#"{"source":"client","session":"s1","timestamp":"2024-03-01T12:00:00","message":{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}}
{"source":"server","session":"s1","timestamp":"2024-03-01T12:00:01","message":{"jsonrpc":"2.0","id":1,"result":"{\"capabilities\":{}}"}}
not json
{"source":"server","session":"s1","timestamp":"2024-03-01T12:00:02","message":"Content-Length: 120"}
{"source":"client","session":"s1","timestamp":"soon","message":{"method":"exit"}}

{"source":"client","session":"s1","timestamp":"2024-03-01T12:00:03","message":{"jsonrpc":"2.0","method":"initialized","params":{}}}
"#;

    #[tokio::test]
    async fn test_process_counts_and_delivers() {
        let mut kinds = Vec::new();
        let mut records = LineReader::new(CAPTURE.as_bytes());
        let summary = {
            let mut handler = CaptureHandler::new(|message: LspMessage| -> anyhow::Result<()> {
                kinds.push(message.kind());
                Ok(())
            });
            process(&mut records, &mut handler, false).await.unwrap()
        };

        assert_eq!(
            summary,
            Summary {
                delivered: 3,
                skipped: 1,
                failed: 2,
            }
        );
        assert_eq!(
            kinds,
            vec![
                Some(MessageKind::Request),
                Some(MessageKind::Response),
                Some(MessageKind::Notification),
            ]
        );
    }

    #[tokio::test]
    async fn test_process_strict_stops_at_first_failure() {
        let mut records = LineReader::new(CAPTURE.as_bytes());
        let mut handler = CaptureHandler::new(|_: LspMessage| -> anyhow::Result<()> { Ok(()) });
        let err = process(&mut records, &mut handler, true).await.unwrap_err();
        assert!(err.to_string().starts_with("line 3"));
    }

    #[tokio::test]
    async fn test_process_aborts_on_sink_error() {
        let mut records = LineReader::new(CAPTURE.as_bytes());
        let mut handler = CaptureHandler::new(|_: LspMessage| -> anyhow::Result<()> {
            anyhow::bail!("broken pipe")
        });
        let err = process(&mut records, &mut handler, false).await.unwrap_err();
        assert_eq!(err.to_string(), "line 1: failed to deliver message");
        assert_eq!(err.root_cause().to_string(), "broken pipe");
    }

    #[tokio::test]
    async fn test_run_reads_capture_file() {
        let path = std::env::temp_dir().join(format!("lsp-capture-{}.jsonl", std::process::id()));
        tokio::fs::write(&path, CAPTURE).await.unwrap();

        let summary = run(Config {
            input: Some(path.clone()),
            format: OutputFormat::Json,
            strict: false,
            log_level: String::from("info"),
        })
        .await
        .unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(summary.delivered, 3);
        assert_eq!(summary.failed, 2);
    }

    #[tokio::test]
    async fn test_run_missing_file() {
        let err = run(Config {
            input: Some(std::path::PathBuf::from("/nonexistent/capture.jsonl")),
            format: OutputFormat::Text,
            strict: false,
            log_level: String::from("info"),
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("failed to open capture file"));
    }
}
