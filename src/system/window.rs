#[cfg(target_os = "macos")]
pub mod nswindow;
pub mod selector;
