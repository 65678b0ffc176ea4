//! Progress reporting for ingest.
//!
//! Long ingests emit one event per pipeline phase so a host can render
//! feedback. Every event is also mirrored to `tracing` at debug level.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Ingest pipeline phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Segment,
    Embed,
    Index,
    Commit,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Segment => "segment",
            Self::Embed => "embed",
            Self::Index => "index",
            Self::Commit => "commit",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress event emitted during ingest.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub doc_id: String,
    pub phase: Phase,

    /// Units done so far (chunks segmented, texts embedded, ...)
    pub current: u64,

    /// Total expected units, if known
    pub total: Option<u64>,

    pub message: String,

    /// Seconds since the reporter was created
    pub elapsed_secs: Option<f64>,
}

impl ProgressEvent {
    pub fn new(
        doc_id: impl Into<String>,
        phase: Phase,
        current: u64,
        total: Option<u64>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            doc_id: doc_id.into(),
            phase,
            current,
            total,
            message: message.into(),
            elapsed_secs: None,
        }
    }

    /// Percentage complete, when the total is known.
    pub fn percentage(&self) -> Option<f64> {
        self.total.map(|t| {
            if t > 0 {
                (self.current as f64 / t as f64) * 100.0
            } else {
                0.0
            }
        })
    }

    /// Format as a simple user-facing line.
    pub fn format_simple(&self) -> String {
        let progress = match self.total {
            Some(total) => format!("{}/{}", self.current, total),
            None => self.current.to_string(),
        };
        let pct = self
            .percentage()
            .map(|p| format!(" ({:.0}%)", p))
            .unwrap_or_default();

        format!(
            "[{}] {} {}{} - {}",
            self.phase, self.doc_id, progress, pct, self.message
        )
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Emits progress events through an optional callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Instant,
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("enabled", &self.callback.is_some())
            .finish()
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::noop()
    }
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Instant::now(),
        }
    }

    /// A reporter that only logs.
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Instant::now(),
        }
    }

    pub fn emit(&self, mut event: ProgressEvent) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        event.elapsed_secs = Some(elapsed);

        tracing::debug!(
            doc_id = %event.doc_id,
            phase = %event.phase,
            current = event.current,
            total = ?event.total,
            elapsed_secs = elapsed,
            "{}",
            event.message
        );

        if let Some(callback) = &self.callback {
            callback(event);
        }
    }

    pub fn segmented(&self, doc_id: &str, chunks: usize, words: usize) {
        self.emit(ProgressEvent::new(
            doc_id,
            Phase::Segment,
            chunks as u64,
            Some(chunks as u64),
            format!("{} chunks from {} words", chunks, words),
        ));
    }

    pub fn embedded(&self, doc_id: &str, done: usize, total: usize, model: &str) {
        self.emit(ProgressEvent::new(
            doc_id,
            Phase::Embed,
            done as u64,
            Some(total as u64),
            format!("model={}", model),
        ));
    }

    pub fn indexed(&self, doc_id: &str, vectors: usize, dimensions: usize) {
        self.emit(ProgressEvent::new(
            doc_id,
            Phase::Index,
            vectors as u64,
            Some(vectors as u64),
            format!("{} vectors of dimension {}", vectors, dimensions),
        ));
    }

    pub fn committed(&self, doc_id: &str, generation: &str) {
        self.emit(ProgressEvent::new(
            doc_id,
            Phase::Commit,
            1,
            Some(1),
            format!("generation {}", generation),
        ));
    }
}
