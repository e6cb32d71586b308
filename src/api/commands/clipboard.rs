//! Clipboard history command module

use std::sync::Arc;

use tauri::{AppHandle, State};

use crate::core::clipboard::{ClipboardMonitor, HistoryStore};
use crate::shared::error::{AppError, AppResult};
use crate::shared::types::ClipboardEntry;
use crate::system::automation::PasteInjector;
use crate::system::tray::toggle_monitoring;

fn find_entry(history: &HistoryStore, id: &str) -> AppResult<ClipboardEntry> {
    history
        .get(id)
        .ok_or_else(|| AppError::Validation(format!("Unknown clipboard entry: {}", id)))
}

/// Full history, newest first
#[tauri::command]
pub fn get_clipboard_history(history: State<'_, Arc<HistoryStore>>) -> AppResult<Vec<ClipboardEntry>> {
    Ok(history.entries())
}

#[tauri::command]
pub fn clear_clipboard_history(history: State<'_, Arc<HistoryStore>>) -> AppResult<()> {
    history.clear();
    Ok(())
}

#[tauri::command]
pub fn remove_clipboard_entry(history: State<'_, Arc<HistoryStore>>, id: String) -> AppResult<bool> {
    Ok(history.remove(&id))
}

/// Put an entry back on the system clipboard without pasting it
#[tauri::command]
pub fn copy_clipboard_entry(history: State<'_, Arc<HistoryStore>>, id: String) -> AppResult<()> {
    let entry = find_entry(&history, &id)?;
    history.copy_to_system_clipboard(&entry)
}

/// Paste an entry into the application that was focused before ours
#[tauri::command]
pub async fn paste_clipboard_entry(
    history: State<'_, Arc<HistoryStore>>,
    injector: State<'_, Arc<PasteInjector>>,
    id: String,
) -> AppResult<()> {
    let entry = find_entry(&history, &id)?;
    history.paste_into_front_app(&entry, &injector).await
}

/// Pause or resume capturing; returns the new state
#[tauri::command]
pub fn toggle_clipboard_monitor(app: AppHandle) -> AppResult<bool> {
    Ok(toggle_monitoring(&app))
}

#[tauri::command]
pub fn get_clipboard_monitor_status(monitor: State<'_, Arc<ClipboardMonitor>>) -> AppResult<bool> {
    Ok(monitor.is_enabled())
}
