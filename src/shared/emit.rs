use tauri::{AppHandle, Emitter};
use super::events::AppEvent;

/// Emit an application event to all windows
pub fn emit_event(app: &AppHandle, event: AppEvent) {
    let name = event.name();
    let result = match &event {
        AppEvent::ClipboardUpdated(entries) => app.emit(name, entries),
        AppEvent::SelectorUpdated(view) => app.emit(name, view),
        AppEvent::SettingsUpdated(settings) => app.emit(name, settings),
    };

    if let Err(e) = result {
        log::error!("[Events] Failed to emit {}: {}", name, e);
    }
}
