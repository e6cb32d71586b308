//! Clipboard module
//!
//! Captures pasteboard text into a bounded history and drives the selector.
//!
//! - `monitor`: background poller watching the pasteboard change counter
//! - `history`: de-duplicated, newest-first store with capacity limits
//! - `storage`: preference-key persistence of the history blob
//! - `filter`: keeps secrets and password-manager copies out of the history
//! - `selector`: filtering and keyboard cursor for the floating selector

pub mod filter;
pub mod history;
pub mod monitor;
pub mod selector;
pub mod storage;

pub use history::HistoryStore;
pub use monitor::ClipboardMonitor;
pub use selector::{ClipboardSelector, SelectorOutcome};
