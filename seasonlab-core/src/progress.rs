//! Coarse-grained progress reporting for long recomputations.
//!
//! Reporting must never block or reorder computation: implementations are
//! expected to be cheap and non-blocking (print, push to a channel, update
//! an atomic). The pipeline reports 0–100 per symbol.

/// Sink for coarse progress updates.
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: u8, message: &str);
}

/// Discards all updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _percent: u8, _message: &str) {}
}

/// Prints updates to stdout. Used by the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutProgress;

impl ProgressSink for StdoutProgress {
    fn report(&self, percent: u8, message: &str) {
        println!("[{percent:>3}%] {message}");
    }
}
