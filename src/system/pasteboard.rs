//! System pasteboard access
//!
//! The poller only needs three things from the OS clipboard: a change counter
//! that increases on every write, the current string payload, and a way to
//! overwrite it. macOS exposes `NSPasteboard.changeCount` directly; elsewhere
//! the counter is synthesised from an md5 digest of the current text.

use std::sync::Mutex;

use tauri::AppHandle;
use tauri_plugin_clipboard_manager::ClipboardExt;

use crate::shared::error::{AppError, AppResult};

pub trait Pasteboard: Send + Sync {
    /// Monotonically increasing counter, bumped on every pasteboard write
    fn change_count(&self) -> i64;

    /// Current string payload; `None` when empty or not text
    fn read_text(&self) -> Option<String>;

    fn write_text(&self, text: &str) -> AppResult<()>;
}

/// `NSPasteboard.generalPasteboard` backend
#[cfg(target_os = "macos")]
pub struct NativePasteboard;

#[cfg(target_os = "macos")]
impl Pasteboard for NativePasteboard {
    fn change_count(&self) -> i64 {
        use cocoa::appkit::NSPasteboard;
        use cocoa::base::nil;

        unsafe {
            objc::rc::autoreleasepool(|| {
                let pasteboard = NSPasteboard::generalPasteboard(nil);
                NSPasteboard::changeCount(pasteboard) as i64
            })
        }
    }

    fn read_text(&self) -> Option<String> {
        use cocoa::appkit::{NSPasteboard, NSPasteboardTypeString};
        use cocoa::base::{id, nil};
        use cocoa::foundation::NSString;

        unsafe {
            objc::rc::autoreleasepool(|| {
                let pasteboard = NSPasteboard::generalPasteboard(nil);
                let value: id = NSPasteboard::stringForType(pasteboard, NSPasteboardTypeString);
                if value == nil {
                    return None;
                }
                let cstr = std::ffi::CStr::from_ptr(NSString::UTF8String(value));
                Some(cstr.to_string_lossy().into_owned())
            })
        }
    }

    fn write_text(&self, text: &str) -> AppResult<()> {
        use cocoa::appkit::{NSPasteboard, NSPasteboardTypeString};
        use cocoa::base::{id, nil, NO};
        use cocoa::foundation::NSString;
        use objc::{msg_send, sel, sel_impl};

        unsafe {
            objc::rc::autoreleasepool(|| {
                let pasteboard = NSPasteboard::generalPasteboard(nil);
                let _: i64 = msg_send![pasteboard, clearContents];
                let value: id = NSString::alloc(nil).init_str(text);
                let value: id = msg_send![value, autorelease];
                if NSPasteboard::setString_forType(pasteboard, value, NSPasteboardTypeString) == NO {
                    return Err(AppError::Clipboard("NSPasteboard rejected the string".to_string()));
                }
                Ok(())
            })
        }
    }
}

/// Turns successive text reads into a change counter
#[derive(Debug, Default)]
pub struct DigestCounter {
    last: Option<[u8; 16]>,
    count: i64,
}

impl DigestCounter {
    /// Record the current payload and return the counter value for it
    pub fn observe(&mut self, text: Option<&str>) -> i64 {
        let digest = text.map(|t| md5::compute(t.as_bytes()).0);
        if digest != self.last {
            self.last = digest;
            self.count += 1;
        }
        self.count
    }
}

/// Clipboard-manager plugin backend with a synthesised change counter
pub struct PluginPasteboard {
    app: AppHandle,
    counter: Mutex<DigestCounter>,
}

impl PluginPasteboard {
    pub fn new(app: AppHandle) -> Self {
        Self {
            app,
            counter: Mutex::new(DigestCounter::default()),
        }
    }
}

impl Pasteboard for PluginPasteboard {
    fn change_count(&self) -> i64 {
        let text = self.read_text();
        let mut counter = match self.counter.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        counter.observe(text.as_deref())
    }

    fn read_text(&self) -> Option<String> {
        self.app.clipboard().read_text().ok().filter(|t| !t.is_empty())
    }

    fn write_text(&self, text: &str) -> AppResult<()> {
        self.app
            .clipboard()
            .write_text(text.to_string())
            .map_err(|e| AppError::Clipboard(format!("Failed to write to clipboard: {}", e)))
    }
}

/// Best pasteboard backend for the current platform
pub fn system_pasteboard(app: &AppHandle) -> std::sync::Arc<dyn Pasteboard> {
    #[cfg(target_os = "macos")]
    {
        let _ = app;
        std::sync::Arc::new(NativePasteboard)
    }
    #[cfg(not(target_os = "macos"))]
    {
        std::sync::Arc::new(PluginPasteboard::new(app.clone()))
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Scriptable pasteboard: every write bumps the counter like the real one
    #[derive(Default)]
    pub struct FakePasteboard {
        state: Mutex<(i64, Option<String>)>,
    }

    impl FakePasteboard {
        pub fn new() -> Self {
            Self::default()
        }

        /// Simulate another application copying `text`
        pub fn copy(&self, text: Option<&str>) {
            let mut state = self.state.lock().unwrap();
            state.0 += 1;
            state.1 = text.map(str::to_string);
        }

        pub fn contents(&self) -> Option<String> {
            self.state.lock().unwrap().1.clone()
        }
    }

    impl Pasteboard for FakePasteboard {
        fn change_count(&self) -> i64 {
            self.state.lock().unwrap().0
        }

        fn read_text(&self) -> Option<String> {
            self.contents()
        }

        fn write_text(&self, text: &str) -> AppResult<()> {
            self.copy(Some(text));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_counter_bumps_only_on_change() {
        let mut counter = DigestCounter::default();

        let first = counter.observe(Some("alpha"));
        assert_eq!(counter.observe(Some("alpha")), first);

        let second = counter.observe(Some("beta"));
        assert!(second > first);

        let cleared = counter.observe(None);
        assert!(cleared > second);
        assert_eq!(counter.observe(None), cleared);
    }

    #[test]
    fn fake_pasteboard_write_counts_as_change() {
        let pasteboard = testing::FakePasteboard::new();
        let before = pasteboard.change_count();
        pasteboard.write_text("copied").unwrap();
        assert!(pasteboard.change_count() > before);
        assert_eq!(pasteboard.read_text().as_deref(), Some("copied"));
    }

    #[test]
    #[cfg(target_os = "macos")]
    #[ignore] // Touches the real system clipboard
    fn native_pasteboard_round_trip() {
        let pasteboard = NativePasteboard;
        let before = pasteboard.change_count();
        pasteboard.write_text("clipboard-shelf probe").unwrap();
        assert!(pasteboard.change_count() > before);
        assert_eq!(pasteboard.read_text().as_deref(), Some("clipboard-shelf probe"));
    }
}
