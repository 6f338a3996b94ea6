//! Log sink port for upload program output

use crate::domain::StreamKind;

/// Port trait receiving each line the upload program writes
///
/// Lines are forwarded verbatim and never interpreted. Implementations must
/// not block: a slow sink stalls draining of the child's pipes, and a full
/// pipe stalls the child itself.
pub trait ILogSink: Send + Sync {
    /// Records one line read from `stream`
    fn log_line(&self, stream: StreamKind, line: &str);
}
