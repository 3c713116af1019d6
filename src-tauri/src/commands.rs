//! Tauri commands for the APK table
//!
//! Dialogs are shown from Rust so the frontend stays a plain table view.
//! Commands that open a dialog are `async` because the blocking dialog calls
//! must not run on the main thread.
//!
//! Folder batches run on a dedicated worker thread. Each new batch bumps the
//! shared generation counter; a worker whose generation is stale stops before
//! touching the table.
//!
//! Anything that adds rows reports the row index and table revision it
//! produced, so the frontend can place rows exactly or reload on a gap.

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use serde::Serialize;
use tauri::{AppHandle, Emitter, State};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};
use tracing::{debug, error, info, warn};

use crate::apk::{ApkParser, PackageParser};
use crate::batch::{discover_packages, run_batch, BatchStep, BatchWalker};
use crate::export;
use crate::metadata::{extract_record, Record, COLUMNS};
use crate::table::ResultsTable;

pub const EVENT_BATCH_STARTED: &str = "batch-started";
pub const EVENT_BATCH_RECORD: &str = "batch-record";
pub const EVENT_BATCH_SKIPPED: &str = "batch-skipped";
pub const EVENT_BATCH_FINISHED: &str = "batch-finished";

const WORKER_THREAD_NAME: &str = "apk-batch";

// =============================================================================
// Shared state
// =============================================================================

/// Table contents plus the generation of the batch allowed to append
#[derive(Debug, Default)]
pub struct TableState {
    pub table: ResultsTable,
    pub generation: u64,
}

/// Managed Tauri state
pub struct AppState {
    shared: Arc<Mutex<TableState>>,
    parser: Arc<dyn PackageParser>,
}

impl AppState {
    pub fn new(parser: Arc<dyn PackageParser>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(TableState::default())),
            parser,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, TableState>, String> {
        self.shared.lock().map_err(|e| format!("Lock error: {}", e))
    }

    /// Clear the table and claim a new generation for a batch
    pub fn begin_batch(&self) -> Result<BatchHandle, String> {
        let mut state = self.lock()?;
        state.table.clear();
        state.generation += 1;
        Ok(BatchHandle {
            shared: Arc::clone(&self.shared),
            generation: state.generation,
            cleared_revision: state.table.revision(),
        })
    }

    /// Append one row outside any batch
    pub fn add_row(&self, record: Record) -> Result<AddedRow, String> {
        let mut state = self.lock()?;
        let row = state.table.push(record.clone());
        Ok(AddedRow {
            row,
            revision: state.table.revision(),
            record,
        })
    }

    pub fn snapshot(&self) -> Result<TableSnapshot, String> {
        Ok(TableSnapshot::of(&self.lock()?.table))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(ApkParser::new()))
    }
}

/// A worker's view of the shared table for one batch generation
#[derive(Clone)]
pub struct BatchHandle {
    shared: Arc<Mutex<TableState>>,
    generation: u64,
    cleared_revision: u64,
}

impl BatchHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Table revision right after this batch cleared it
    pub fn cleared_revision(&self) -> u64 {
        self.cleared_revision
    }

    /// Apply one step to the table if this batch is still current
    ///
    /// The generation check and the append happen under one lock, so a
    /// superseded batch can never add a row to its successor's table.
    /// Parsed steps continue with the position the row landed at.
    pub fn accept(&self, step: &BatchStep) -> ControlFlow<(), Option<RowPosition>> {
        let Ok(mut state) = self.shared.lock() else {
            error!("Table lock poisoned, stopping batch");
            return ControlFlow::Break(());
        };
        if state.generation != self.generation {
            debug!(
                stale = self.generation,
                current = state.generation,
                "Batch superseded"
            );
            return ControlFlow::Break(());
        }
        let position = match step {
            BatchStep::Parsed { record, .. } => {
                let row = state.table.push(record.clone());
                Some(RowPosition { row, revision: state.table.revision() })
            }
            _ => None,
        };
        ControlFlow::Continue(position)
    }
}

/// Where an appended row landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPosition {
    pub row: usize,
    pub revision: u64,
}

// =============================================================================
// Event payloads
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct BatchStartedEvent {
    pub generation: u64,
    pub total: usize,
    /// Revision of the freshly cleared table
    pub revision: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchRecordEvent {
    pub generation: u64,
    pub index: usize,
    pub total: usize,
    pub path: String,
    /// Table position of the new row
    pub row: usize,
    pub revision: u64,
    pub record: Record,
}

/// A row appended by `open_single_apk`
#[derive(Debug, Clone, Serialize)]
pub struct AddedRow {
    pub row: usize,
    pub revision: u64,
    pub record: Record,
}

/// All rows in display order, as of `revision`
#[derive(Debug, Clone, Serialize)]
pub struct TableSnapshot {
    pub revision: u64,
    pub rows: Vec<Record>,
}

impl TableSnapshot {
    fn of(table: &ResultsTable) -> Self {
        Self {
            revision: table.revision(),
            rows: table.rows().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSkippedEvent {
    pub generation: u64,
    pub index: usize,
    pub total: usize,
    pub path: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFinishedEvent {
    pub generation: u64,
    pub total: usize,
    pub parsed: usize,
    pub failed: usize,
}

fn emit_step(app: &AppHandle, generation: u64, step: &BatchStep, position: Option<RowPosition>) {
    let result = match (step, position) {
        (BatchStep::Parsed { index, total, path, record }, Some(position)) => app.emit(
            EVENT_BATCH_RECORD,
            BatchRecordEvent {
                generation,
                index: *index,
                total: *total,
                path: path.display().to_string(),
                row: position.row,
                revision: position.revision,
                record: record.clone(),
            },
        ),
        (BatchStep::Parsed { .. }, None) => return,
        (BatchStep::Skipped { index, total, path, error }, _) => app.emit(
            EVENT_BATCH_SKIPPED,
            BatchSkippedEvent {
                generation,
                index: *index,
                total: *total,
                path: path.display().to_string(),
                error: error.clone(),
            },
        ),
        (BatchStep::Finished(summary), _) => app.emit(
            EVENT_BATCH_FINISHED,
            BatchFinishedEvent {
                generation,
                total: summary.total,
                parsed: summary.parsed,
                failed: summary.failed,
            },
        ),
    };
    if let Err(e) = result {
        warn!("Failed to emit batch event: {}", e);
    }
}

// =============================================================================
// Dialog helpers
// =============================================================================

fn show_info(app: &AppHandle, title: &str, message: impl Into<String>) {
    app.dialog()
        .message(message)
        .kind(MessageDialogKind::Info)
        .title(title)
        .blocking_show();
}

fn show_error(app: &AppHandle, message: impl Into<String>) {
    app.dialog()
        .message(message)
        .kind(MessageDialogKind::Error)
        .title("Error")
        .blocking_show();
}

// =============================================================================
// Commands
// =============================================================================

/// Column headers in display order
#[tauri::command]
pub fn get_columns() -> Vec<&'static str> {
    COLUMNS.to_vec()
}

/// Current rows in display order
#[tauri::command]
pub fn get_rows(state: State<'_, AppState>) -> Result<TableSnapshot, String> {
    state.snapshot()
}

/// Pick one APK and append its row (the table is not cleared)
///
/// Returns `None` when the dialog is cancelled.
#[tauri::command]
pub async fn open_single_apk(
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<Option<AddedRow>, String> {
    let Some(picked) = app
        .dialog()
        .file()
        .set_title("Select APK file")
        .add_filter("APK files", &["apk"])
        .add_filter("All files", &["*"])
        .blocking_pick_file()
    else {
        return Ok(None);
    };
    let path = picked.into_path().map_err(|e| e.to_string())?;

    let parser = Arc::clone(&state.parser);
    let worker_path = path.clone();
    let result = tauri::async_runtime::spawn_blocking(move || {
        extract_record(&worker_path, parser.as_ref())
    })
    .await
    .map_err(|e| e.to_string())?;

    match result {
        Ok(record) => {
            let added = state.add_row(record)?;
            info!(path = %path.display(), row = added.row, "Parsed single package");
            Ok(Some(added))
        }
        Err(e) => {
            let message = format!("Failed to parse APK:\n{}\n\n{}", path.display(), e);
            warn!(path = %path.display(), error = %e, "Single package parse failed");
            show_error(&app, message.clone());
            Err(message)
        }
    }
}

/// Pick a folder and start a batch over every APK inside it
///
/// Returns the batch that was started, or `None` when the dialog was
/// cancelled or no APK files were found (the table is left untouched then).
#[tauri::command]
pub async fn open_apk_folder(
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<Option<BatchStartedEvent>, String> {
    let Some(picked) = app
        .dialog()
        .file()
        .set_title("Select folder containing APK files")
        .blocking_pick_folder()
    else {
        return Ok(None);
    };
    let root = picked.into_path().map_err(|e| e.to_string())?;

    let files = match discover_packages(&root) {
        Ok(files) => files,
        Err(e) => {
            show_error(&app, e.to_string());
            return Err(e.to_string());
        }
    };
    if files.is_empty() {
        show_info(&app, "Notice", "No APK files found in this folder");
        return Ok(None);
    }

    start_batch(&app, &state, root, files).map(Some)
}

fn start_batch(
    app: &AppHandle,
    state: &AppState,
    root: PathBuf,
    files: Vec<PathBuf>,
) -> Result<BatchStartedEvent, String> {
    let handle = state.begin_batch()?;
    let started = BatchStartedEvent {
        generation: handle.generation(),
        total: files.len(),
        revision: handle.cleared_revision(),
    };
    info!(root = %root.display(), total = started.total, generation = started.generation, "Starting batch");

    if let Err(e) = app.emit(EVENT_BATCH_STARTED, started.clone()) {
        warn!("Failed to emit batch event: {}", e);
    }

    let walker = BatchWalker::new(files, Arc::clone(&state.parser));
    let app = app.clone();
    thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || {
            let generation = handle.generation();
            let summary = run_batch(walker, |step| {
                let ControlFlow::Continue(position) = handle.accept(step) else {
                    return ControlFlow::Break(());
                };
                emit_step(&app, generation, step, position);
                ControlFlow::Continue(())
            });
            debug!(generation, ?summary, "Batch worker exiting");
        })
        .map_err(|e| format!("Failed to start batch worker: {}", e))?;

    Ok(started)
}

/// Text of one cell, for the clipboard
#[tauri::command]
pub fn copy_cell(row: usize, column: usize, state: State<'_, AppState>) -> Result<String, String> {
    state
        .lock()?
        .table
        .cell(row, column)
        .map(str::to_string)
        .ok_or_else(|| format!("No cell at row {}, column {}", row, column))
}

/// Tab-joined row text, for the clipboard
#[tauri::command]
pub fn copy_row(row: usize, state: State<'_, AppState>) -> Result<String, String> {
    state
        .lock()?
        .table
        .row_text(row)
        .ok_or_else(|| format!("No row {}", row))
}

/// Sort by a column and return the reordered rows
#[tauri::command]
pub fn sort_rows(
    column: usize,
    descending: bool,
    state: State<'_, AppState>,
) -> Result<TableSnapshot, String> {
    let mut guard = state.lock()?;
    if !guard.table.sort_by_column(column, descending) {
        return Err(format!("Unknown column {}", column));
    }
    Ok(TableSnapshot::of(&guard.table))
}

/// Ask for a destination and write the table as CSV
///
/// Returns the written path, or `None` if there was nothing to export or the
/// dialog was cancelled.
#[tauri::command]
pub async fn export_csv(
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<Option<String>, String> {
    let rows = state.lock()?.table.rows().to_vec();
    if rows.is_empty() {
        show_info(&app, "Notice", "No data to export");
        return Ok(None);
    }

    let default_name = export::default_export_name(&chrono::Local::now());
    let Some(picked) = app
        .dialog()
        .file()
        .set_title("Save as CSV")
        .set_file_name(&default_name)
        .add_filter("CSV files", &["csv"])
        .blocking_save_file()
    else {
        return Ok(None);
    };
    let path = export::ensure_csv_extension(&picked.into_path().map_err(|e| e.to_string())?);

    match export::export_csv(&rows, &path) {
        Ok(()) => {
            show_info(&app, "Success", format!("Exported successfully:\n{}", path.display()));
            Ok(Some(path.display().to_string()))
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "CSV export failed");
            let message = format!("Export failed: {}", e);
            show_error(&app, message.clone());
            Err(message)
        }
    }
}
