//! Automation module for macOS system integration
//!
//! Frontmost-app lookup, accessibility permission checks and synthetic
//! keystrokes, plus the paste injector built on top of them.

#[cfg(target_os = "macos")]
pub mod macos;
pub mod paste;

use tauri::{AppHandle, Manager};

use crate::shared::error::AppResult;
use crate::shared::types::SourceApp;

pub use paste::{FocusHandoff, KeySynthesizer, PasteInjector};

/// Resolves provenance for newly captured clipboard content
pub trait AppInspector: Send + Sync {
    fn frontmost(&self) -> SourceApp;
}

/// NSWorkspace-backed inspector; empty provenance where unsupported
pub struct SystemAppInspector;

impl AppInspector for SystemAppInspector {
    fn frontmost(&self) -> SourceApp {
        #[cfg(target_os = "macos")]
        {
            macos::frontmost_app().unwrap_or_else(|e| {
                log::debug!("[Automation] Frontmost app unavailable: {}", e);
                SourceApp::unknown()
            })
        }
        #[cfg(not(target_os = "macos"))]
        {
            SourceApp::unknown()
        }
    }
}

/// Posts Cmd+V through CoreGraphics
pub struct SystemKeySynthesizer;

impl KeySynthesizer for SystemKeySynthesizer {
    fn post_paste_chord(&self) -> AppResult<()> {
        #[cfg(target_os = "macos")]
        {
            macos::simulate_cmd_v()
        }
        #[cfg(not(target_os = "macos"))]
        {
            log::warn!("[Automation] Synthetic paste is not supported on this platform");
            Ok(())
        }
    }
}

/// Gives focus back to whichever app was active before the selector opened
pub struct HostAppFocus {
    app: AppHandle,
}

impl HostAppFocus {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl FocusHandoff for HostAppFocus {
    fn release_focus(&self) -> AppResult<()> {
        if let Some(window) = self.app.get_webview_window(crate::system::window::selector::SELECTOR_LABEL) {
            window.hide()?;
        }

        // Hiding the whole app makes the OS reactivate the previous one
        #[cfg(target_os = "macos")]
        self.app.hide()?;

        Ok(())
    }
}

/// Check if accessibility permissions are granted
pub fn check_accessibility_permissions() -> bool {
    #[cfg(target_os = "macos")]
    {
        macos::check_accessibility_permissions()
    }
    #[cfg(not(target_os = "macos"))]
    {
        true
    }
}

/// Check permissions, letting the OS prompt the user once if needed
pub fn ensure_accessibility_permissions() -> bool {
    #[cfg(target_os = "macos")]
    {
        macos::ensure_accessibility_permissions()
    }
    #[cfg(not(target_os = "macos"))]
    {
        true
    }
}
