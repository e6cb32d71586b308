use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Frontmost application at the moment something was copied.
///
/// Used for display only; an entry is not owned by the app it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings.ts")]
pub struct SourceApp {
    pub name: Option<String>,
    pub identifier: Option<String>,
}

impl SourceApp {
    pub fn new(name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            identifier: Some(identifier.into()),
        }
    }

    pub fn unknown() -> Self {
        Self::default()
    }
}

/// A single captured clipboard text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings.ts")]
pub struct ClipboardEntry {
    pub id: String,
    pub text: String,
    #[ts(type = "string")]
    pub captured_at: DateTime<Utc>,
    pub source_app_name: Option<String>,
    pub source_app_identifier: Option<String>,
}

impl ClipboardEntry {
    /// Create an entry stamped with a fresh id and the current time.
    /// `text` is expected to be normalised already.
    pub fn capture(text: String, source: &SourceApp) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text,
            captured_at: Utc::now(),
            source_app_name: source.name.clone(),
            source_app_identifier: source.identifier.clone(),
        }
    }

    pub fn source_app(&self) -> SourceApp {
        SourceApp {
            name: self.source_app_name.clone(),
            identifier: self.source_app_identifier.clone(),
        }
    }

    /// Case-insensitive substring match. `query_lower` must already be lowercased.
    pub fn matches(&self, query_lower: &str) -> bool {
        query_lower.is_empty() || self.text.to_lowercase().contains(query_lower)
    }
}

/// Keys the floating selector reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings.ts")]
pub enum SelectorKey {
    Up,
    Down,
    Enter,
    Escape,
}

/// Snapshot of the floating selector pushed to the page after every change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings.ts")]
pub struct SelectorView {
    pub query: String,
    pub entries: Vec<ClipboardEntry>,
    /// Index into `entries`; meaningless when `entries` is empty.
    pub selected_index: u32,
    /// True when the whole history is empty (not just the filtered list).
    pub placeholder: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_copies_provenance() {
        let source = SourceApp::new("Safari", "com.apple.Safari");
        let entry = ClipboardEntry::capture("hello world".to_string(), &source);

        assert_eq!(entry.text, "hello world");
        assert_eq!(entry.source_app_name.as_deref(), Some("Safari"));
        assert_eq!(entry.source_app_identifier.as_deref(), Some("com.apple.Safari"));
        assert_eq!(entry.source_app(), source);
    }

    #[test]
    fn captures_get_distinct_ids() {
        let a = ClipboardEntry::capture("same text".to_string(), &SourceApp::unknown());
        let b = ClipboardEntry::capture("same text".to_string(), &SourceApp::unknown());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn matches_is_case_insensitive() {
        let entry = ClipboardEntry::capture("FooBar".to_string(), &SourceApp::unknown());
        assert!(entry.matches("foo"));
        assert!(entry.matches("obar"));
        assert!(entry.matches(""));
        assert!(!entry.matches("baz"));
    }

    #[test]
    fn selector_key_deserializes_from_plain_names() {
        let key: SelectorKey = serde_json::from_str(r#""Enter""#).unwrap();
        assert_eq!(key, SelectorKey::Enter);
    }
}
