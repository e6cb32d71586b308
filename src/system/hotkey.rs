//! Global hotkey listener
//!
//! Two independent channels watch for the selector chord:
//! - background: an OS-wide shortcut registration, which depends on the
//!   accessibility grant and may silently never fire without it
//! - foreground: the selector page itself reporting the chord while it has focus
//!
//! Both feed one debounced callback, so a press seen by both channels
//! toggles the selector once.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tauri::AppHandle;
use tauri_plugin_global_shortcut::{GlobalShortcutExt, Shortcut, ShortcutState};

use crate::shared::error::{AppError, AppResult};

pub type HotkeyCallback = Arc<dyn Fn() + Send + Sync>;

/// Presses closer together than this are treated as one
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(250);

/// One source of hotkey presses
pub trait HotkeyChannel: Send + Sync {
    fn name(&self) -> &'static str;
    fn attach(&self, callback: HotkeyCallback) -> AppResult<()>;
    fn detach(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Unregistered,
    Active,
}

/// Wrap `callback` so that bursts within `window` invoke it once
fn debounced(callback: HotkeyCallback, window: Duration) -> HotkeyCallback {
    let last_fired: Mutex<Option<Instant>> = Mutex::new(None);
    Arc::new(move || {
        let now = Instant::now();
        {
            let mut last = match last_fired.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(previous) = *last {
                if now.duration_since(previous) < window {
                    log::debug!("[Hotkey] Ignoring duplicate press");
                    return;
                }
            }
            *last = Some(now);
        }
        callback();
    })
}

pub struct HotkeyListener {
    channels: Vec<Arc<dyn HotkeyChannel>>,
    callback: HotkeyCallback,
    state: Mutex<ListenerState>,
}

impl HotkeyListener {
    pub fn new(callback: HotkeyCallback, channels: Vec<Arc<dyn HotkeyChannel>>) -> Self {
        Self::with_debounce(callback, channels, DEBOUNCE_WINDOW)
    }

    pub fn with_debounce(
        callback: HotkeyCallback,
        channels: Vec<Arc<dyn HotkeyChannel>>,
        window: Duration,
    ) -> Self {
        Self {
            channels,
            callback: debounced(callback, window),
            state: Mutex::new(ListenerState::Unregistered),
        }
    }

    pub fn state(&self) -> ListenerState {
        match self.state.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Attach every channel. A channel that fails is logged and skipped;
    /// the listener is active as long as it was started.
    pub fn start_monitoring(&self) {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *state == ListenerState::Active {
            return;
        }

        for channel in &self.channels {
            match channel.attach(Arc::clone(&self.callback)) {
                Ok(()) => log::info!("[Hotkey] {} channel attached", channel.name()),
                Err(e) => log::warn!("[Hotkey] {} channel unavailable: {}", channel.name(), e),
            }
        }

        *state = ListenerState::Active;
    }

    pub fn stop_monitoring(&self) {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *state == ListenerState::Unregistered {
            return;
        }

        for channel in &self.channels {
            channel.detach();
        }

        *state = ListenerState::Unregistered;
        log::info!("[Hotkey] Stopped monitoring");
    }
}

/// Presses reported by the app's own window; needs no permission
#[derive(Default)]
pub struct ForegroundChannel {
    callback: Mutex<Option<HotkeyCallback>>,
}

impl ForegroundChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a press. False when the listener is not running.
    pub fn fire(&self) -> bool {
        let callback = match self.callback.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }
}

impl HotkeyChannel for ForegroundChannel {
    fn name(&self) -> &'static str {
        "foreground"
    }

    fn attach(&self, callback: HotkeyCallback) -> AppResult<()> {
        let mut slot = match self.callback.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(callback);
        Ok(())
    }

    fn detach(&self) {
        let mut slot = match self.callback.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = None;
    }
}

/// OS-wide shortcut through the global-shortcut plugin
pub struct GlobalShortcutChannel {
    app: AppHandle,
    accelerator: String,
}

impl GlobalShortcutChannel {
    const MAX_RETRIES: u32 = 3;

    pub fn new(app: AppHandle, accelerator: impl Into<String>) -> Self {
        Self {
            app,
            accelerator: accelerator.into(),
        }
    }

    fn shortcut(&self) -> AppResult<Shortcut> {
        self.accelerator
            .parse::<Shortcut>()
            .map_err(|e| AppError::Validation(format!("Invalid shortcut '{}': {}", self.accelerator, e)))
    }
}

impl HotkeyChannel for GlobalShortcutChannel {
    fn name(&self) -> &'static str {
        "background"
    }

    fn attach(&self, callback: HotkeyCallback) -> AppResult<()> {
        let shortcut = self.shortcut()?;

        // Advisory only: may show the consent dialog once, never blocks
        if !crate::system::automation::ensure_accessibility_permissions() {
            log::warn!(
                "[Hotkey] Accessibility permission missing; {} may not fire while other apps are focused",
                self.accelerator
            );
        }

        // Clean slate; failing here just means it was not registered yet
        let _ = self.app.global_shortcut().unregister(shortcut);

        let mut attempt = 0;
        loop {
            let callback = Arc::clone(&callback);
            let result = self.app.global_shortcut().on_shortcut(shortcut, move |_app, _shortcut, event| {
                if event.state() == ShortcutState::Pressed {
                    callback();
                }
            });

            match result {
                Ok(()) => {
                    log::info!("[Hotkey] Registered global shortcut {} (attempt {})", self.accelerator, attempt + 1);
                    return Ok(());
                }
                Err(e) if attempt + 1 < Self::MAX_RETRIES => {
                    // Exponential backoff: 100ms, 200ms
                    let delay = Duration::from_millis(100 * 2_u64.pow(attempt));
                    log::warn!(
                        "[Hotkey] Registration attempt {} failed: {}. Retrying in {:?}",
                        attempt + 1,
                        e,
                        delay
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => {
                    return Err(AppError::System(format!(
                        "Failed to register {} after {} attempts: {}",
                        self.accelerator,
                        Self::MAX_RETRIES,
                        e
                    )));
                }
            }
        }
    }

    fn detach(&self) {
        if let Ok(shortcut) = self.shortcut() {
            if let Err(e) = self.app.global_shortcut().unregister(shortcut) {
                log::debug!("[Hotkey] Unregister {} failed: {}", self.accelerator, e);
            }
        }
    }
}
