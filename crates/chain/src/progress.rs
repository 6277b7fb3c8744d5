//! Progress reporting for answering.
//!
//! Strategies announce how many passages they stuffed or which refinement
//! step they are on. Reporting is observational only; nothing downstream
//! depends on it.

use std::sync::Arc;

/// Progress event emitted while answering.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Phase of the operation: "fetch", "stuff", "refine"
    pub phase: String,

    /// Current progress (passages included, refinement step, ...)
    pub current: u64,

    /// Total expected work (if known)
    pub total: Option<u64>,

    /// Human-readable message
    pub message: String,
}

impl ProgressEvent {
    /// Create a new progress event.
    pub fn new(
        phase: impl Into<String>,
        current: u64,
        total: Option<u64>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            phase: phase.into(),
            current,
            total,
            message: message.into(),
        }
    }

    /// Format as a simple user-facing line.
    pub fn format_simple(&self) -> String {
        let progress = match self.total {
            Some(total) => format!("{}/{}", self.current, total),
            None => format!("{}", self.current),
        };

        format!("[{}] {} - {}", self.phase, progress, self.message)
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Emits progress events through an optional callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::noop()
    }
}

impl ProgressReporter {
    /// Create a new reporter with a callback.
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    /// Create a reporter that only logs.
    pub fn noop() -> Self {
        Self { callback: None }
    }

    /// Emit a progress event.
    pub fn emit(&self, event: ProgressEvent) {
        tracing::debug!(
            phase = %event.phase,
            current = event.current,
            total = ?event.total,
            message = %event.message,
            "Progress event"
        );

        if let Some(callback) = &self.callback {
            callback(event);
        }
    }

    /// Passages returned by the retriever.
    pub fn fetched(&self, count: usize) {
        self.emit(ProgressEvent::new(
            "fetch",
            count as u64,
            None,
            format!("retrieved {} passages", count),
        ));
    }

    /// Passages that fit into the stuffed prompt.
    pub fn stuffed(&self, included: usize, fetched: usize) {
        self.emit(ProgressEvent::new(
            "stuff",
            included as u64,
            Some(fetched as u64),
            format!("stuffed {} documents in the context", included),
        ));
    }

    /// Refinement step `step` (1-based) of `total`.
    pub fn refining(&self, step: usize, total: usize) {
        self.emit(ProgressEvent::new(
            "refine",
            step as u64,
            Some(total as u64),
            format!("refining from document {}/{}", step, total),
        ));
    }
}
