// Module declarations
mod api;
mod config;
mod core;
mod shared;
mod system;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tauri::{
    menu::{Menu, MenuItem, PredefinedMenuItem},
    tray::TrayIconBuilder,
    AppHandle, Manager,
};

use crate::api::commands;
use crate::core::clipboard::storage::{InMemoryPreferences, PreferenceStore, RedbPreferences};
use crate::core::clipboard::{ClipboardMonitor, ClipboardSelector, HistoryStore};
use crate::shared::emit::emit_event;
use crate::shared::events::AppEvent;
use crate::shared::settings::ClipboardSettings;
use crate::shared::types::ClipboardEntry;
use crate::system::automation::{HostAppFocus, PasteInjector, SystemAppInspector, SystemKeySynthesizer};
use crate::system::hotkey::{ForegroundChannel, GlobalShortcutChannel, HotkeyCallback, HotkeyChannel, HotkeyListener};
use crate::system::pasteboard::system_pasteboard;
use crate::system::tray::{monitor_menu_label, toggle_monitoring, MonitorMenuItem};
use crate::system::window::selector::SelectorWindow;

fn open_preferences() -> Arc<dyn PreferenceStore> {
    match RedbPreferences::open_default() {
        Ok(prefs) => Arc::new(prefs),
        Err(e) => {
            log::error!("[Startup] Failed to open preferences database, history will not persist: {}", e);
            Arc::new(InMemoryPreferences::new())
        }
    }
}

/// Toggle the selector on the main thread
fn selector_toggle_callback(handle: AppHandle, selector_window: Arc<SelectorWindow>) -> HotkeyCallback {
    Arc::new(move || {
        let selector_window = Arc::clone(&selector_window);
        let result = handle.run_on_main_thread(move || {
            if let Err(e) = selector_window.toggle() {
                log::error!("[Hotkey] Failed to toggle selector: {}", e);
            }
        });
        if let Err(e) = result {
            log::error!("[Hotkey] Failed to dispatch to main thread: {}", e);
        }
    })
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(shared::logging::get_builder().build())
        .plugin(tauri_plugin_global_shortcut::Builder::new().build())
        .plugin(tauri_plugin_clipboard_manager::init())
        .setup(|app| {
            let settings = tauri::async_runtime::block_on(ClipboardSettings::load()).unwrap_or_else(|e| {
                log::error!("[Startup] Failed to load settings: {}", e);
                ClipboardSettings::default()
            });

            // Menu-bar agent: no Dock icon, activating does not switch spaces
            #[cfg(target_os = "macos")]
            app.set_activation_policy(tauri::ActivationPolicy::Accessory);

            let handle = app.handle().clone();
            let pasteboard = system_pasteboard(&handle);

            let history = Arc::new(HistoryStore::open(open_preferences(), Arc::clone(&pasteboard)));

            let monitor = Arc::new(
                ClipboardMonitor::new(Arc::clone(&pasteboard), Arc::new(SystemAppInspector), Arc::clone(&history))
                    .with_interval(Duration::from_millis(settings.poll_interval_ms))
                    .with_sensitive_filter(settings.skip_sensitive),
            );

            let injector = Arc::new(
                PasteInjector::new(
                    Arc::clone(&pasteboard),
                    Arc::new(HostAppFocus::new(handle.clone())),
                    Arc::new(SystemKeySynthesizer),
                )
                .with_settle_delay(Duration::from_millis(settings.paste_settle_ms)),
            );

            let selector_window = Arc::new(SelectorWindow::new(
                handle.clone(),
                Arc::new(ClipboardSelector::new(Arc::clone(&history))),
                Arc::clone(&history),
                Arc::clone(&injector),
            ));

            {
                let handle = handle.clone();
                let selector_window = Arc::clone(&selector_window);
                history.set_listener(Arc::new(move |entries: &[ClipboardEntry]| {
                    emit_event(&handle, AppEvent::ClipboardUpdated(entries.to_vec()));
                    selector_window.refresh(entries.to_vec());
                }));
            }

            monitor.start();
            if !settings.monitoring_enabled {
                monitor.disable();
            }

            let foreground = Arc::new(ForegroundChannel::new());
            let listener = Arc::new(HotkeyListener::new(
                selector_toggle_callback(handle.clone(), Arc::clone(&selector_window)),
                vec![
                    Arc::new(GlobalShortcutChannel::new(handle.clone(), settings.hotkey.clone())) as Arc<dyn HotkeyChannel>,
                    Arc::clone(&foreground) as Arc<dyn HotkeyChannel>,
                ],
            ));
            listener.start_monitoring();

            // Tray menu
            let show_item = MenuItem::with_id(app, "show_history", "Show Clipboard History", true, None::<&str>)?;
            let toggle_monitor_item = MenuItem::with_id(
                app,
                "toggle_monitor",
                monitor_menu_label(monitor.is_enabled()),
                true,
                None::<&str>,
            )?;
            let clear_history_item = MenuItem::with_id(app, "clear_history", "Clear History", true, None::<&str>)?;
            let separator = PredefinedMenuItem::separator(app)?;
            let quit_item = MenuItem::with_id(app, "quit", "Quit", true, None::<&str>)?;

            let menu = Menu::with_items(
                app,
                &[
                    &show_item,
                    &separator,
                    &toggle_monitor_item,
                    &clear_history_item,
                    &separator,
                    &quit_item,
                ],
            )?;

            let default_icon = app.default_window_icon()
                .ok_or("Failed to get default window icon")?;

            TrayIconBuilder::new()
                .icon(default_icon.clone())
                .tooltip("Clipboard Shelf")
                .menu(&menu)
                .on_menu_event(move |app, event| match event.id().as_ref() {
                    "show_history" => {
                        if let Some(selector_window) = app.try_state::<Arc<SelectorWindow>>() {
                            if let Err(e) = selector_window.show() {
                                log::error!("[Tray] Failed to show clipboard history: {}", e);
                            }
                        }
                    }
                    "toggle_monitor" => {
                        toggle_monitoring(app);
                    }
                    "clear_history" => {
                        if let Some(history) = app.try_state::<Arc<HistoryStore>>() {
                            history.clear();
                        }
                    }
                    "quit" => {
                        if let Some(listener) = app.try_state::<Arc<HotkeyListener>>() {
                            listener.stop_monitoring();
                        }
                        if let Some(monitor) = app.try_state::<Arc<ClipboardMonitor>>() {
                            monitor.stop();
                        }
                        app.exit(0);
                    }
                    _ => {}
                })
                .build(app)?;

            app.manage(history);
            app.manage(monitor);
            app.manage(injector);
            app.manage(selector_window);
            app.manage(foreground);
            app.manage(listener);
            app.manage(MonitorMenuItem(toggle_monitor_item));
            app.manage(Mutex::new(settings.clone()));

            log::info!("[Startup] Clipboard Shelf initialized, selector hotkey: {}", settings.hotkey);

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::clipboard::get_clipboard_history,
            commands::clipboard::clear_clipboard_history,
            commands::clipboard::remove_clipboard_entry,
            commands::clipboard::copy_clipboard_entry,
            commands::clipboard::paste_clipboard_entry,
            commands::clipboard::toggle_clipboard_monitor,
            commands::clipboard::get_clipboard_monitor_status,
            commands::selector::selector_state,
            commands::selector::selector_set_query,
            commands::selector::selector_key,
            commands::selector::selector_click,
            commands::selector::selector_hotkey,
            commands::selector::hide_selector,
            commands::system::check_accessibility_permissions,
            commands::settings::get_settings,
            commands::settings::save_settings,
        ])
        .run(tauri::generate_context!())
        .unwrap_or_else(|e| {
            log::error!("FATAL: Failed to start Tauri application: {}", e);
            std::process::exit(1);
        });
}
