//! System integration command module

use crate::shared::error::AppResult;
use crate::system::automation;

/// Check if accessibility permissions are granted (always true off macOS)
#[tauri::command]
pub async fn check_accessibility_permissions() -> AppResult<bool> {
    Ok(automation::check_accessibility_permissions())
}
