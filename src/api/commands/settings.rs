//! Settings command module

use std::sync::{Arc, Mutex};

use tauri::{AppHandle, State};
use tauri_plugin_global_shortcut::Shortcut;

use crate::core::clipboard::ClipboardMonitor;
use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::ClipboardSettings;
use crate::system::tray::apply_monitoring;

fn current(settings: &Mutex<ClipboardSettings>) -> ClipboardSettings {
    match settings.lock() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

#[tauri::command]
pub fn get_settings(settings: State<'_, Mutex<ClipboardSettings>>) -> AppResult<ClipboardSettings> {
    Ok(current(&settings))
}

/// Persist settings. The monitoring and filter switches apply immediately;
/// hotkey and timings are picked up on the next launch.
#[tauri::command]
pub async fn save_settings(
    app: AppHandle,
    state: State<'_, Mutex<ClipboardSettings>>,
    monitor: State<'_, Arc<ClipboardMonitor>>,
    settings: ClipboardSettings,
) -> AppResult<()> {
    settings.validate()?;
    settings
        .hotkey
        .parse::<Shortcut>()
        .map_err(|e| AppError::Validation(format!("Invalid hotkey '{}': {}", settings.hotkey, e)))?;

    settings.save(&app).await?;

    monitor.set_sensitive_filter(settings.skip_sensitive);
    let enabled = settings.monitoring_enabled;
    match state.lock() {
        Ok(mut guard) => *guard = settings,
        Err(poisoned) => *poisoned.into_inner() = settings,
    }
    apply_monitoring(&app, enabled);

    log::info!("[Settings] Saved settings");
    Ok(())
}
