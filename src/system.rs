pub mod automation;
pub mod hotkey;
pub mod pasteboard;
pub mod tray;
pub mod window;
