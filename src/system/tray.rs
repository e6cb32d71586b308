//! Tray menu state shared with the IPC commands

use std::sync::{Arc, Mutex};

use tauri::menu::MenuItem;
use tauri::{AppHandle, Manager, Wry};

use crate::core::clipboard::ClipboardMonitor;
use crate::shared::settings::ClipboardSettings;

/// The "Pause/Resume Monitoring" tray item
pub struct MonitorMenuItem(pub MenuItem<Wry>);

pub fn monitor_menu_label(enabled: bool) -> &'static str {
    if enabled {
        "Pause Monitoring"
    } else {
        "Resume Monitoring"
    }
}

/// Store the switch in the managed settings, returning the updated copy
fn record_monitoring(settings: &Mutex<ClipboardSettings>, enabled: bool) -> ClipboardSettings {
    let mut guard = match settings.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    guard.monitoring_enabled = enabled;
    guard.clone()
}

/// Apply a pause/resume to the poller, the tray label and the managed settings.
/// Returns the settings as they now stand; nothing is written to disk.
pub fn apply_monitoring(app: &AppHandle, enabled: bool) -> Option<ClipboardSettings> {
    if let Some(monitor) = app.try_state::<Arc<ClipboardMonitor>>() {
        if enabled {
            monitor.enable();
        } else {
            monitor.disable();
        }
    }

    if let Some(item) = app.try_state::<MonitorMenuItem>() {
        if let Err(e) = item.0.set_text(monitor_menu_label(enabled)) {
            log::warn!("[Tray] Failed to update menu label: {}", e);
        }
    }

    app.try_state::<Mutex<ClipboardSettings>>()
        .map(|settings| record_monitoring(&settings, enabled))
}

/// Pause or resume from the tray or IPC and persist the choice
pub fn set_monitoring(app: &AppHandle, enabled: bool) {
    let Some(settings) = apply_monitoring(app, enabled) else {
        return;
    };

    let handle = app.clone();
    tauri::async_runtime::spawn(async move {
        if let Err(e) = settings.save(&handle).await {
            log::error!("[Tray] Failed to persist monitoring state: {}", e);
        }
    });
}

/// Flip the current state; returns the new one
pub fn toggle_monitoring(app: &AppHandle) -> bool {
    let Some(monitor) = app.try_state::<Arc<ClipboardMonitor>>() else {
        return false;
    };
    let enabled = monitor.toggle();
    set_monitoring(app, enabled);
    enabled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitor_label_reflects_state() {
        assert_eq!(monitor_menu_label(true), "Pause Monitoring");
        assert_eq!(monitor_menu_label(false), "Resume Monitoring");
    }

    #[test]
    fn switch_is_recorded_without_touching_other_settings() {
        let settings = Mutex::new(ClipboardSettings {
            paste_settle_ms: 450,
            ..Default::default()
        });

        let updated = record_monitoring(&settings, false);

        assert!(!updated.monitoring_enabled);
        assert_eq!(updated.paste_settle_ms, 450);
        assert_eq!(*settings.lock().unwrap(), updated);
    }
}
