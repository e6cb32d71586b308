use cocoa::base::{id, nil};
use cocoa::foundation::NSString;
use objc::{msg_send, sel, sel_impl, class};
use objc::rc::autoreleasepool;
use core_graphics::event::{CGEvent, CGEventTapLocation, CGEventFlags, CGKeyCode};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use crate::shared::error::{AppError, AppResult};
use crate::shared::types::SourceApp;

// Key code for macOS (ANSI standard)
const K_VK_ANSI_V: CGKeyCode = 0x09;

/// Check if the app has accessibility permissions
/// Uses native Accessibility API (AXIsProcessTrusted)
pub fn check_accessibility_permissions() -> bool {
    #[link(name = "ApplicationServices", kind = "framework")]
    extern "C" {
        fn AXIsProcessTrusted() -> bool;
    }
    unsafe { AXIsProcessTrusted() }
}

/// Same check, but lets the OS show its consent dialog when not yet trusted.
///
/// A newly granted permission only applies after the app restarts.
pub fn ensure_accessibility_permissions() -> bool {
    use core_foundation::base::TCFType;
    use core_foundation::boolean::CFBoolean;
    use core_foundation::dictionary::CFDictionary;
    use core_foundation::string::CFString;

    #[link(name = "ApplicationServices", kind = "framework")]
    extern "C" {
        fn AXIsProcessTrustedWithOptions(options: core_foundation::dictionary::CFDictionaryRef) -> bool;
    }

    let key = CFString::from_static_string("AXTrustedCheckOptionPrompt");
    let value = CFBoolean::true_value();
    let options = CFDictionary::from_CFType_pairs(&[(key.as_CFType(), value.as_CFType())]);

    let is_trusted = unsafe { AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef()) };

    if is_trusted {
        log::info!("[Accessibility] Permissions granted");
    } else {
        log::warn!("[Accessibility] Permissions not granted, system prompt shown");
    }

    is_trusted
}

unsafe fn ns_string_to_owned(value: id) -> Option<String> {
    if value == nil {
        return None;
    }
    let cstr = std::ffi::CStr::from_ptr(NSString::UTF8String(value));
    Some(cstr.to_string_lossy().into_owned())
}

/// Name and bundle identifier of the frontmost application.
/// Uses NSWorkspace; needs no special permission.
pub fn frontmost_app() -> AppResult<SourceApp> {
    unsafe {
        autoreleasepool(|| {
            let workspace: id = msg_send![class!(NSWorkspace), sharedWorkspace];
            let front_app: id = msg_send![workspace, frontmostApplication];

            if front_app == nil {
                return Err(AppError::System("No frontmost application found".to_string()));
            }

            let name: id = msg_send![front_app, localizedName];
            let bundle_id: id = msg_send![front_app, bundleIdentifier];

            Ok(SourceApp {
                name: ns_string_to_owned(name),
                identifier: ns_string_to_owned(bundle_id),
            })
        })
    }
}

/// Post a key-down/key-up pair with modifiers at the HID level
fn simulate_keypress(key_code: CGKeyCode, flags: CGEventFlags) -> AppResult<()> {
    let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState)
        .map_err(|_| AppError::System("Failed to create CGEventSource".to_string()))?;

    let key_down = CGEvent::new_keyboard_event(source.clone(), key_code, true)
        .map_err(|_| AppError::System("Failed to create key down event".to_string()))?;
    key_down.set_flags(flags);
    key_down.post(CGEventTapLocation::HID);

    let key_up = CGEvent::new_keyboard_event(source, key_code, false)
        .map_err(|_| AppError::System("Failed to create key up event".to_string()))?;
    key_up.set_flags(flags);
    key_up.post(CGEventTapLocation::HID);

    Ok(())
}

/// Simulate Cmd+V (paste) using Core Graphics
pub fn simulate_cmd_v() -> AppResult<()> {
    if !check_accessibility_permissions() {
        return Err(AppError::Permission);
    }

    simulate_keypress(K_VK_ANSI_V, CGEventFlags::CGEventFlagCommand)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Depends on the desktop session
    fn test_frontmost_app() {
        let app = frontmost_app().expect("frontmost app");
        assert!(app.name.is_some());
    }
}
