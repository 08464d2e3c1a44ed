//! Capture input: one JSON log record per line.
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Minimal async trait for reading captured records.
/// - `read` returns the next record body, or `None` once the input is exhausted.
#[async_trait]
pub trait RecordReader: Send {
    async fn read(&mut self) -> anyhow::Result<Option<String>>;

    /// Line number of the record most recently returned by `read`.
    fn position(&self) -> u64;
}

/// Reads newline delimited records, skipping blank lines.
pub struct LineReader<R> {
    reader: R,
    line: u64,
}

impl<R> LineReader<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        LineReader { reader, line: 0 }
    }
}

#[async_trait]
impl<R> RecordReader for LineReader<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn read(&mut self) -> anyhow::Result<Option<String>> {
        let mut buffer = String::new();
        loop {
            buffer.clear();
            if self.reader.read_line(&mut buffer).await? == 0 {
                return Ok(None);
            }
            self.line += 1;
            let record = buffer.trim();
            if !record.is_empty() {
                return Ok(Some(record.to_string()));
            }
        }
    }

    fn position(&self) -> u64 {
        self.line
    }
}

#[cfg(test)]
mod tests {
    use super::{LineReader, RecordReader};
    use tokio::io::{duplex, AsyncWriteExt, BufReader};

    #[tokio::test]
    async fn test_read_records_from_duplex() {
        let (mut a, b) = duplex(1024);

        let writer = tokio::spawn(async move {
            a.write_all(b"{\"source\":\"client\"}\n\n  \n{\"source\":\"server\"}")
                .await
                .unwrap();
            a.flush().await.unwrap();
        });

        let mut reader = LineReader::new(BufReader::new(b));
        let first = reader.read().await.expect("read failed");
        assert_eq!(first.as_deref(), Some("{\"source\":\"client\"}"));
        assert_eq!(reader.position(), 1);

        let second = reader.read().await.expect("read failed");
        assert_eq!(second.as_deref(), Some("{\"source\":\"server\"}"));
        assert_eq!(reader.position(), 4);

        writer.await.unwrap();
        assert_eq!(reader.read().await.expect("read failed"), None);
    }

    #[tokio::test]
    async fn test_read_empty_input() {
        let mut reader = LineReader::new(&b""[..]);
        assert_eq!(reader.read().await.unwrap(), None);
        assert_eq!(reader.position(), 0);
    }

    #[tokio::test]
    async fn test_read_handles_crlf() {
        let mut reader = LineReader::new(&b"{}\r\n{\"a\":1}\r\n"[..]);
        assert_eq!(reader.read().await.unwrap().as_deref(), Some("{}"));
        assert_eq!(reader.read().await.unwrap().as_deref(), Some("{\"a\":1}"));
        assert_eq!(reader.read().await.unwrap(), None);
    }
}
