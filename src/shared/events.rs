use serde::{Serialize, Deserialize};
use ts_rs::TS;
use super::types::{ClipboardEntry, SelectorView};
use super::settings::ClipboardSettings;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "payload")] // Tagged enum for easier frontend parsing
#[ts(export, export_to = "events.ts")]
pub enum AppEvent {
    #[serde(rename = "clipboard://updated")]
    ClipboardUpdated(Vec<ClipboardEntry>),

    #[serde(rename = "selector://state")]
    SelectorUpdated(SelectorView),

    #[serde(rename = "settings://updated")]
    SettingsUpdated(ClipboardSettings),
}

impl AppEvent {
    /// Channel name the page listens on
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::ClipboardUpdated(_) => "clipboard://updated",
            AppEvent::SelectorUpdated(_) => "selector://state",
            AppEvent::SettingsUpdated(_) => "settings://updated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_match_serde_tags() {
        let event = AppEvent::ClipboardUpdated(Vec::new());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.name());

        let event = AppEvent::SettingsUpdated(ClipboardSettings::default());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.name());
    }
}
