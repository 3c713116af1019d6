//! Incremental batch processing
//!
//! [`BatchWalker`] processes exactly one file per [`step`](BatchWalker::step)
//! so the driver can publish each row as soon as it exists and stop early
//! when the batch is superseded.

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::apk::PackageParser;
use crate::metadata::{extract_record, Record};

/// Counts reported when a batch completes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub parsed: usize,
    pub failed: usize,
}

/// Outcome of one step
#[derive(Debug)]
pub enum BatchStep {
    /// File `index` (0-based) produced a record
    Parsed {
        index: usize,
        total: usize,
        path: PathBuf,
        record: Record,
    },
    /// File `index` could not be parsed or hashed
    Skipped {
        index: usize,
        total: usize,
        path: PathBuf,
        error: String,
    },
    /// No files remain; repeated calls keep returning the same summary
    Finished(BatchSummary),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkState {
    Idle,
    Walking { next: usize },
    Finished,
}

/// State machine over a discovered file list: Idle -> Walking -> Finished
pub struct BatchWalker {
    files: Vec<PathBuf>,
    parser: Arc<dyn PackageParser>,
    state: WalkState,
    summary: BatchSummary,
}

impl BatchWalker {
    pub fn new(files: Vec<PathBuf>, parser: Arc<dyn PackageParser>) -> Self {
        let total = files.len();
        Self {
            files,
            parser,
            state: WalkState::Idle,
            summary: BatchSummary { total, ..Default::default() },
        }
    }

    pub fn total(&self) -> usize {
        self.files.len()
    }

    pub fn is_finished(&self) -> bool {
        self.state == WalkState::Finished
    }

    pub fn summary(&self) -> BatchSummary {
        self.summary
    }

    /// Process the next file, or report completion
    pub fn step(&mut self) -> BatchStep {
        let index = match self.state {
            WalkState::Idle => {
                info!(total = self.files.len(), "Batch started");
                0
            }
            WalkState::Walking { next } => next,
            WalkState::Finished => return BatchStep::Finished(self.summary),
        };

        let total = self.files.len();
        let Some(path) = self.files.get(index).cloned() else {
            self.state = WalkState::Finished;
            info!(
                total,
                parsed = self.summary.parsed,
                failed = self.summary.failed,
                "Batch finished"
            );
            return BatchStep::Finished(self.summary);
        };
        self.state = WalkState::Walking { next: index + 1 };

        match extract_record(&path, self.parser.as_ref()) {
            Ok(record) => {
                self.summary.parsed += 1;
                debug!(index, total, path = %path.display(), "Parsed package");
                BatchStep::Parsed { index, total, path, record }
            }
            Err(e) => {
                self.summary.failed += 1;
                warn!(path = %path.display(), error = %e, "Skipping package");
                BatchStep::Skipped { index, total, path, error: e.to_string() }
            }
        }
    }
}

/// Drive `walker` to completion, handing every step to `sink`
///
/// Returning `ControlFlow::Break` from the sink drops the rest of the queue.
/// The final `Finished` step is passed to the sink as well.
pub fn run_batch<F>(mut walker: BatchWalker, mut sink: F) -> BatchSummary
where
    F: FnMut(&BatchStep) -> ControlFlow<()>,
{
    loop {
        let step = walker.step();
        let finished = matches!(step, BatchStep::Finished(_));
        if sink(&step).is_break() {
            debug!(summary = ?walker.summary(), "Batch abandoned");
            return walker.summary();
        }
        if finished {
            return walker.summary();
        }
    }
}
