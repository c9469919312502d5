use crate::collector::Collector;
use crate::line_buffer::{CapturedStream, LineBuffer};
use std::fmt::{Display, Formatter};
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

/// Represents the type of the stream (stdout or stderr)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    StdOut,
    StdErr,
}

impl Display for StreamType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamType::StdOut => f.write_str("stdout"),
            StreamType::StdErr => f.write_str("stderr"),
        }
    }
}

/// Options for reading a child's output stream.
///
/// These only affect how much is read per syscall. Captured lines are never limited in count
/// or length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    /// The size of the buffer used when reading from the stream in bytes.
    ///
    /// default: 32 * 1024 // 32 kb
    pub read_buffer_size: usize,

    /// The initial size of an individual chunk read from the read buffer in bytes.
    ///
    /// default: 16 * 1024 // 16 kb
    pub chunk_size: usize,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            read_buffer_size: 32 * 1024, // 32 kb
            chunk_size: 16 * 1024,       // 16 kb
        }
    }
}

/// Drains `stream` in a dedicated tokio task, splitting it into lines as data arrives.
///
/// The task runs independently of every other stream of the same child, so a child blocked on
/// writing one pipe is never waiting for us to finish reading the other one.
/// It terminates on EOF, on a read error, or when the returned collector is cancelled; in each
/// case the collector yields everything captured up to that point.
#[must_use = "If not at least assigned to a variable, the return value will be dropped immediately, which in turn aborts the reading task and the captured output is lost."]
pub fn capture_stream<S: AsyncRead + Unpin + Send + 'static>(
    stream: S,
    ty: StreamType,
    options: CaptureOptions,
) -> Collector<CapturedStream> {
    let (term_sig_tx, mut term_sig_rx) = tokio::sync::oneshot::channel::<()>();

    let mut reader = BufReader::with_capacity(options.read_buffer_size, stream);
    let task = tokio::spawn(async move {
        let mut buf = bytes::BytesMut::with_capacity(options.chunk_size);
        let mut lines = LineBuffer::new();
        loop {
            tokio::select! {
                read = reader.read_buf(&mut buf) => {
                    match read {
                        Ok(0) => {
                            // EOF reached.
                            break;
                        }
                        Ok(_bytes_read) => {
                            lines.extend(&buf.split());
                            buf.reserve(options.chunk_size);
                        }
                        Err(err) => {
                            tracing::warn!(
                                stream = %ty,
                                error = %err,
                                "Could not read from stream, keeping what was captured so far"
                            );
                            break;
                        }
                    }
                }
                _msg = &mut term_sig_rx => {
                    tracing::trace!(stream = %ty, "Capture cancelled before EOF");
                    break;
                }
            }
        }
        let captured = lines.finish();
        tracing::trace!(
            stream = %ty,
            lines = captured.lines.len(),
            bytes = captured.byte_len,
            "Stream captured"
        );
        captured
    });

    Collector {
        task: Some(task),
        task_termination_sender: Some(term_sig_tx),
    }
}

#[cfg(test)]
mod tests {
    use super::{CaptureOptions, StreamType, capture_stream};
    use assertr::prelude::*;
    use std::time::Duration;
    use tokio::io::{AsyncWrite, AsyncWriteExt};

    async fn write_test_data(mut write: impl AsyncWrite + Unpin) {
        write.write_all("Inst base-files\n".as_bytes()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        write.write_all("Inst libc6 ".as_bytes()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        write.write_all("[2.36-9]\n".as_bytes()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        write.write_all("Conf base-files\n".as_bytes()).await.unwrap();
    }

    #[tokio::test]
    async fn collects_all_lines_until_eof() {
        let (read_half, write_half) = tokio::io::duplex(64);
        let collector = capture_stream(read_half, StreamType::StdOut, CaptureOptions::default());

        tokio::spawn(write_test_data(write_half)).await.unwrap();

        let captured = collector.wait().await.unwrap();
        assert_that(captured.lines).is_equal_to(vec![
            "Inst base-files".to_string(),
            "Inst libc6 [2.36-9]".to_string(),
            "Conf base-files".to_string(),
        ]);
        assert_that(captured.byte_len).is_equal_to(52);
    }

    #[tokio::test]
    async fn small_chunks_do_not_split_lines() {
        let (read_half, write_half) = tokio::io::duplex(4);
        let collector = capture_stream(
            read_half,
            StreamType::StdErr,
            CaptureOptions {
                read_buffer_size: 3,
                chunk_size: 2,
            },
        );

        tokio::spawn(write_test_data(write_half)).await.unwrap();

        let captured = collector.wait().await.unwrap();
        assert_that(captured.lines.len()).is_equal_to(3);
        assert_that(captured.lines[1].as_str()).is_equal_to("Inst libc6 [2.36-9]");
    }

    #[tokio::test]
    async fn cancel_returns_partial_capture_of_an_open_stream() {
        let (read_half, mut write_half) = tokio::io::duplex(64);
        let collector = capture_stream(read_half, StreamType::StdOut, CaptureOptions::default());

        write_half.write_all(b"Inst a\nInst b").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let captured = collector.cancel().await.unwrap();
        assert_that(captured.lines)
            .is_equal_to(vec!["Inst a".to_string(), "Inst b".to_string()]);
        assert_that(captured.byte_len).is_equal_to(13);

        drop(write_half);
    }
}
