//! Floating selector window
//!
//! A borderless always-on-top webview listing the clipboard history. The page
//! only renders [`SelectorView`] snapshots and forwards keys and clicks; all
//! selection logic lives in [`ClipboardSelector`].

use std::sync::Arc;

use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindow, WebviewWindowBuilder};

use crate::config::selector_window_config;
use crate::core::clipboard::{ClipboardSelector, HistoryStore, SelectorOutcome};
use crate::shared::emit::emit_event;
use crate::shared::error::AppResult;
use crate::shared::events::AppEvent;
use crate::shared::types::{ClipboardEntry, SelectorKey, SelectorView};
use crate::system::automation::PasteInjector;

pub const SELECTOR_LABEL: &str = "selector-window";

pub struct SelectorWindow {
    app: AppHandle,
    selector: Arc<ClipboardSelector>,
    history: Arc<HistoryStore>,
    injector: Arc<PasteInjector>,
}

impl SelectorWindow {
    pub fn new(
        app: AppHandle,
        selector: Arc<ClipboardSelector>,
        history: Arc<HistoryStore>,
        injector: Arc<PasteInjector>,
    ) -> Self {
        Self {
            app,
            selector,
            history,
            injector,
        }
    }

    fn existing_window(&self) -> Option<WebviewWindow> {
        self.app.get_webview_window(SELECTOR_LABEL)
    }

    fn build_window(&self) -> AppResult<WebviewWindow> {
        let config = selector_window_config();

        let window = WebviewWindowBuilder::new(&self.app, SELECTOR_LABEL, WebviewUrl::App("index.html".into()))
            .title(config.title.as_str())
            .inner_size(config.width, config.height)
            .resizable(config.resizable)
            .transparent(config.transparent)
            .decorations(false)
            .always_on_top(true)
            .visible_on_all_workspaces(true)
            .skip_taskbar(true)
            .visible(false)
            .focused(true)
            .center()
            .build()?;

        // Click outside: the window loses focus and goes away
        let window_clone = window.clone();
        window.on_window_event(move |event| match event {
            tauri::WindowEvent::Focused(false) => {
                let _ = window_clone.hide();
            }
            tauri::WindowEvent::CloseRequested { api, .. } => {
                api.prevent_close();
                let _ = window_clone.hide();
            }
            _ => {}
        });

        log::info!("[SelectorWindow] Created selector window");
        Ok(window)
    }

    fn window(&self) -> AppResult<WebviewWindow> {
        match self.existing_window() {
            Some(window) => Ok(window),
            None => self.build_window(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.existing_window()
            .and_then(|window| window.is_visible().ok())
            .unwrap_or(false)
    }

    /// Reset the selection, then bring the panel up over whatever is on screen
    pub fn show(&self) -> AppResult<()> {
        let view = self.selector.reset();
        let window = self.window()?;

        window.center()?;
        window.show()?;

        #[cfg(target_os = "macos")]
        if let Err(e) = super::nswindow::present_overlay(&window) {
            log::warn!("[SelectorWindow] Overlay configuration failed: {}", e);
        }

        window.set_focus()?;
        self.publish(view);
        Ok(())
    }

    /// Hide the panel and the host app so focus returns to the previous app
    pub fn hide(&self) -> AppResult<()> {
        if let Some(window) = self.existing_window() {
            window.hide()?;
        }

        #[cfg(target_os = "macos")]
        self.app.hide()?;

        Ok(())
    }

    pub fn toggle(&self) -> AppResult<()> {
        if self.is_visible() {
            self.hide()
        } else {
            self.show()
        }
    }

    pub fn view(&self) -> SelectorView {
        self.selector.view()
    }

    pub fn set_query(&self, query: &str) -> SelectorView {
        let view = self.selector.set_query(query);
        self.publish(view.clone());
        view
    }

    pub fn handle_key(&self, key: SelectorKey) -> AppResult<SelectorView> {
        let (outcome, view) = self.selector.handle_key(key);
        self.apply(outcome, view.clone())?;
        Ok(view)
    }

    pub fn click(&self, index: usize) -> AppResult<SelectorView> {
        let (outcome, view) = self.selector.click(index);
        self.apply(outcome, view.clone())?;
        Ok(view)
    }

    /// Follow a history change while the panel is open
    pub fn refresh(&self, entries: Vec<ClipboardEntry>) {
        let view = self.selector.refresh(entries);
        if self.is_visible() {
            self.publish(view);
        }
    }

    fn publish(&self, view: SelectorView) {
        emit_event(&self.app, AppEvent::SelectorUpdated(view));
    }

    fn apply(&self, outcome: SelectorOutcome, view: SelectorView) -> AppResult<()> {
        match outcome {
            SelectorOutcome::Moved => self.publish(view),
            SelectorOutcome::Unchanged | SelectorOutcome::Ignored => {}
            SelectorOutcome::Dismissed => self.hide()?,
            SelectorOutcome::Confirmed(entry) => {
                if let Some(window) = self.existing_window() {
                    window.hide()?;
                }
                self.paste(entry);
            }
        }
        Ok(())
    }

    fn paste(&self, entry: ClipboardEntry) {
        let history = Arc::clone(&self.history);
        let injector = Arc::clone(&self.injector);
        tauri::async_runtime::spawn(async move {
            if let Err(e) = history.paste_into_front_app(&entry, &injector).await {
                log::error!("[SelectorWindow] Failed to paste entry {}: {}", entry.id, e);
            }
        });
    }
}
