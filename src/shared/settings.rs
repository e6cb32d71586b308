use serde::{Deserialize, Serialize};
use ts_rs::TS;
use tokio::fs;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;
use tauri::AppHandle;
use crate::shared::error::{AppError, AppResult};
use crate::shared::events::AppEvent;
use crate::shared::emit::emit_event;

pub const APP_QUALIFIER: &str = "com";
pub const APP_ORGANIZATION: &str = "antigravity";
pub const APP_NAME: &str = "clipboard-shelf";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "settings.ts")]
#[serde(default)]
pub struct ClipboardSettings {
    /// Chord that toggles the floating selector
    pub hotkey: String,
    pub poll_interval_ms: u64,
    /// Time given to the OS to hand focus back before Cmd+V is posted
    pub paste_settle_ms: u64,
    pub monitoring_enabled: bool,
    /// Skip secret-looking text and copies made in password managers
    pub skip_sensitive: bool,
}

impl Default for ClipboardSettings {
    fn default() -> Self {
        Self {
            hotkey: "Alt+Space".to_string(),
            poll_interval_ms: 1000,
            paste_settle_ms: 300,
            monitoring_enabled: true,
            skip_sensitive: false,
        }
    }
}

pub fn project_dirs() -> AppResult<ProjectDirs> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
        .ok_or_else(|| AppError::System("Failed to determine project directories".to_string()))
}

impl ClipboardSettings {
    /// Reject values the poller or injector cannot run with
    pub fn validate(&self) -> AppResult<()> {
        if self.hotkey.trim().is_empty() {
            return Err(AppError::Validation("Hotkey must not be empty".to_string()));
        }
        if !(100..=60_000).contains(&self.poll_interval_ms) {
            return Err(AppError::Validation(format!(
                "Poll interval must be between 100 and 60000 ms, got {}",
                self.poll_interval_ms
            )));
        }
        if self.paste_settle_ms > 5_000 {
            return Err(AppError::Validation(format!(
                "Paste delay must be at most 5000 ms, got {}",
                self.paste_settle_ms
            )));
        }
        Ok(())
    }

    pub fn get_settings_path() -> AppResult<PathBuf> {
        Ok(project_dirs()?.config_dir().join("settings.json"))
    }

    pub async fn load() -> AppResult<Self> {
        let path = Self::get_settings_path()?;
        Self::load_from(&path).await
    }

    /// Missing file writes and returns defaults; an unparsable or out-of-range
    /// file yields defaults without overwriting it.
    pub async fn load_from(path: &Path) -> AppResult<Self> {
        if !fs::try_exists(path).await? {
            let settings = Self::default();
            settings.save_to(path).await?;
            return Ok(settings);
        }

        let content = fs::read_to_string(path).await
            .map_err(|e| AppError::Io(format!("Failed to read settings file: {}", e)))?;

        let settings: Self = match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("[Settings] Failed to parse {}: {}, using defaults", path.display(), e);
                return Ok(Self::default());
            }
        };

        if let Err(e) = settings.validate() {
            log::warn!("[Settings] Rejected {}: {}, using defaults", path.display(), e);
            return Ok(Self::default());
        }

        Ok(settings)
    }

    pub async fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await
                .map_err(|e| AppError::Io(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(self)?;

        fs::write(path, content).await
            .map_err(|e| AppError::Io(format!("Failed to write settings file: {}", e)))
    }

    /// Save settings to disk and emit update event
    pub async fn save(&self, app: &AppHandle) -> AppResult<()> {
        let path = Self::get_settings_path()?;
        self.save_to(&path).await?;

        emit_event(app, AppEvent::SettingsUpdated(self.clone()));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = ClipboardSettings::load_from(&path).await.unwrap();

        assert_eq!(settings, ClipboardSettings::default());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = ClipboardSettings {
            hotkey: "Control+Shift+V".to_string(),
            poll_interval_ms: 500,
            paste_settle_ms: 450,
            monitoring_enabled: false,
            skip_sensitive: true,
        };

        settings.save_to(&path).await.unwrap();
        let loaded = ClipboardSettings::load_from(&path).await.unwrap();

        assert_eq!(loaded, settings);
    }

    #[tokio::test]
    async fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "paste_settle_ms": 500 }"#).unwrap();

        let loaded = ClipboardSettings::load_from(&path).await.unwrap();

        assert_eq!(loaded.paste_settle_ms, 500);
        assert_eq!(loaded.hotkey, "Alt+Space");
        assert_eq!(loaded.poll_interval_ms, 1000);
        assert!(!loaded.skip_sensitive);
    }

    #[tokio::test]
    async fn out_of_range_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        std::fs::write(&path, r#"{ "paste_settle_ms": 999999 }"#).unwrap();
        assert_eq!(ClipboardSettings::load_from(&path).await.unwrap(), ClipboardSettings::default());

        std::fs::write(&path, r#"{ "poll_interval_ms": 0 }"#).unwrap();
        assert_eq!(ClipboardSettings::load_from(&path).await.unwrap(), ClipboardSettings::default());

        // Rejected file is left for the user to fix
        assert!(std::fs::read_to_string(&path).unwrap().contains("poll_interval_ms"));
    }

    #[test]
    fn validate_bounds() {
        assert!(ClipboardSettings::default().validate().is_ok());

        let too_fast = ClipboardSettings { poll_interval_ms: 10, ..Default::default() };
        assert!(matches!(too_fast.validate(), Err(AppError::Validation(_))));

        let too_slow_paste = ClipboardSettings { paste_settle_ms: 10_000, ..Default::default() };
        assert!(too_slow_paste.validate().is_err());

        let no_hotkey = ClipboardSettings { hotkey: "  ".to_string(), ..Default::default() };
        assert!(no_hotkey.validate().is_err());
    }

    #[tokio::test]
    async fn garbage_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();

        let loaded = ClipboardSettings::load_from(&path).await.unwrap();

        assert_eq!(loaded, ClipboardSettings::default());
    }
}
