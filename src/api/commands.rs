//! Command modules for Tauri application
//!
//! Commands are grouped by the part of the app they drive:
//!
//! - `clipboard`: history access, copy/paste of entries, monitor switch
//! - `selector`: the floating selector page (query, keys, clicks)
//! - `system`: accessibility permission status
//! - `settings`: settings persistence

pub mod clipboard;
pub mod selector;
pub mod settings;
pub mod system;
