//! Folder batches
//!
//! - `discovery` - Recursive `*.apk` enumeration
//! - `walker`    - One-file-per-step state machine and its driver

pub mod discovery;
pub mod walker;

pub use discovery::discover_packages;
pub use walker::{run_batch, BatchStep, BatchSummary, BatchWalker};
