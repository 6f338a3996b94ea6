//! Output stream drainer
//!
//! Each [`StreamDrainer`] owns a tokio task that reads one child stream line
//! by line and forwards the lines to an [`ILogSink`]. Two drainers run per
//! upload, one per stream, so a chatty child never blocks on a full pipe.
//!
//! A drainer ends on end-of-stream or on the first read error. Neither case
//! is reported upward: losing log output never fails an upload.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::debug;

use putqueue_core::domain::StreamKind;
use putqueue_core::ports::{ChildStream, ILogSink};

/// Background task forwarding one child stream to a log sink
///
/// Dropping a drainer aborts its task.
#[derive(Debug)]
pub struct StreamDrainer {
    kind: StreamKind,
    handle: Option<JoinHandle<u64>>,
}

impl StreamDrainer {
    /// Starts draining `stream` into `sink`
    ///
    /// Must be called from within a tokio runtime.
    pub fn attach(stream: ChildStream, kind: StreamKind, sink: Arc<dyn ILogSink>) -> Self {
        let handle = tokio::spawn(drain_lines(stream, kind, sink));
        Self {
            kind,
            handle: Some(handle),
        }
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Waits up to `grace` for the drainer to reach end-of-stream
    ///
    /// Returns the number of lines forwarded, or `None` if the task had to be
    /// aborted (the stream stayed open past the grace period).
    pub async fn finish(mut self, grace: Duration) -> Option<u64> {
        let mut handle = self.handle.take()?;
        match tokio::time::timeout(grace, &mut handle).await {
            Ok(Ok(lines)) => Some(lines),
            Ok(Err(e)) => {
                debug!(stream = %self.kind, error = %e, "Drainer task ended abnormally");
                None
            }
            Err(_) => {
                debug!(stream = %self.kind, "Drainer still running after grace period, aborting");
                handle.abort();
                None
            }
        }
    }
}

impl Drop for StreamDrainer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn drain_lines(stream: ChildStream, kind: StreamKind, sink: Arc<dyn ILogSink>) -> u64 {
    let mut lines = BufReader::new(stream).lines();
    let mut forwarded = 0u64;
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                sink.log_line(kind, &line);
                forwarded += 1;
            }
            Ok(None) => {
                debug!(stream = %kind, lines = forwarded, "End of child stream");
                break;
            }
            Err(e) => {
                debug!(stream = %kind, error = %e, "Read error on child stream");
                break;
            }
        }
    }
    forwarded
}
