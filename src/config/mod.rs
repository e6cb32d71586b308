//! Window configuration
//!
//! Dimensions and chrome of the floating selector in one place.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub width: f64,
    pub height: f64,
    pub title: String,
    pub transparent: bool,
    pub resizable: bool,
}

impl WindowConfig {
    pub fn new(width: f64, height: f64, title: impl Into<String>) -> Self {
        Self {
            width,
            height,
            title: title.into(),
            transparent: true,
            resizable: false,
        }
    }
}

/// Borderless panel showing the filter field and the history list
pub fn selector_window_config() -> WindowConfig {
    WindowConfig::new(560.0, 380.0, "Clipboard History")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_is_fixed_size_panel() {
        let config = selector_window_config();
        assert!(!config.resizable);
        assert!(config.transparent);
        assert!(config.width > config.height);
    }
}
