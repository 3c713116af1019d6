//! ApkMeta - APK metadata and hash viewer
//!
//! Module layout:
//! - `common`   - Streaming hashes and bounds-checked binary readers
//! - `apk`      - APK (ZIP + binary XML + resource table) parsing
//! - `metadata` - One table row per package
//! - `batch`    - Folder discovery and the incremental batch walker
//! - `table`    - Results table model (sort, copy)
//! - `export`   - CSV export
//! - `commands` - Tauri commands, dialogs and batch events

pub mod apk;
pub mod batch;
pub mod commands;
pub mod common;
pub mod error;
pub mod export;
pub mod logging;
pub mod metadata;
pub mod table;

pub use error::{ApkMetaError, ApkMetaResult};

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .manage(commands::AppState::default())
        .invoke_handler(tauri::generate_handler![
            commands::get_columns,
            commands::get_rows,
            commands::open_single_apk,
            commands::open_apk_folder,
            commands::copy_cell,
            commands::copy_row,
            commands::sort_rows,
            commands::export_csv
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
