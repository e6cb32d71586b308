//! macOS NSWindow configuration for the floating selector
//!
//! Tauri has no API for spaces or full-screen overlays, so the raw NSWindow
//! is configured directly. All AppKit calls MUST run on the main thread.

use cocoa::appkit::NSWindowCollectionBehavior;
use cocoa::base::{id, nil, YES};
use objc::{class, msg_send, sel, sel_impl};
use tauri::WebviewWindow;

use crate::shared::error::{AppError, AppResult};

// NSStatusWindowLevel: above normal windows and full-screen apps
const NS_STATUS_WINDOW_LEVEL: i64 = 25;

#[allow(non_upper_case_globals)]
const NSWindowCollectionBehaviorCanJoinAllSpaces: u64 = 1 << 0;
#[allow(non_upper_case_globals)]
const NSWindowCollectionBehaviorFullScreenAuxiliary: u64 = 1 << 7;

/// Collection behaviour for an overlay visible on every space (0x81)
pub const OVERLAY_COLLECTION_BEHAVIOR: u64 =
    NSWindowCollectionBehaviorCanJoinAllSpaces | NSWindowCollectionBehaviorFullScreenAuxiliary;

/// # Safety
/// Main thread only; `ns_window` must be a live NSWindow.
unsafe fn present_overlay_main_thread(ns_window: id) {
    if ns_window == nil {
        log::error!("[NSWindow] Received nil window pointer");
        return;
    }

    let _: () = msg_send![ns_window, setLevel: NS_STATUS_WINDOW_LEVEL];

    let behavior = NSWindowCollectionBehavior::from_bits_truncate(OVERLAY_COLLECTION_BEHAVIOR);
    let _: () = msg_send![ns_window, setCollectionBehavior: behavior];

    // Accessory policy keeps activation from switching spaces
    let ns_app: id = msg_send![class!(NSApplication), sharedApplication];
    let _: () = msg_send![ns_app, activateIgnoringOtherApps: YES];

    let _: () = msg_send![ns_window, makeKeyAndOrderFront: nil];

    let is_key: bool = msg_send![ns_window, isKeyWindow];
    log::debug!("[NSWindow] Overlay presented (key window: {})", is_key);
}

/// Join all spaces (including full-screen ones), activate the app and make
/// the window key so it receives keyboard input.
pub fn present_overlay(window: &WebviewWindow) -> AppResult<()> {
    let ns_window_ptr = window
        .ns_window()
        .map_err(|e| AppError::System(format!("Failed to get NSWindow: {}", e)))?;

    // Raw pointers are not Send; the window outlives the dispatched closure
    let ns_window_usize = ns_window_ptr as usize;

    window.run_on_main_thread(move || unsafe {
        present_overlay_main_thread(ns_window_usize as id);
    })?;

    Ok(())
}
