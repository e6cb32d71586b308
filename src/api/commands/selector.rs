//! Selector window command module
//!
//! The page forwards raw input here and renders whatever view comes back.

use std::sync::Arc;

use tauri::State;

use crate::shared::error::AppResult;
use crate::shared::types::{SelectorKey, SelectorView};
use crate::system::hotkey::ForegroundChannel;
use crate::system::window::selector::SelectorWindow;

#[tauri::command]
pub fn selector_state(selector: State<'_, Arc<SelectorWindow>>) -> AppResult<SelectorView> {
    Ok(selector.view())
}

#[tauri::command]
pub fn selector_set_query(selector: State<'_, Arc<SelectorWindow>>, query: String) -> AppResult<SelectorView> {
    Ok(selector.set_query(&query))
}

#[tauri::command]
pub fn selector_key(selector: State<'_, Arc<SelectorWindow>>, key: SelectorKey) -> AppResult<SelectorView> {
    selector.handle_key(key)
}

#[tauri::command]
pub fn selector_click(selector: State<'_, Arc<SelectorWindow>>, index: usize) -> AppResult<SelectorView> {
    selector.click(index)
}

/// The selection hotkey pressed while the selector page has focus
#[tauri::command]
pub fn selector_hotkey(foreground: State<'_, Arc<ForegroundChannel>>) -> AppResult<bool> {
    Ok(foreground.fire())
}

#[tauri::command]
pub fn hide_selector(selector: State<'_, Arc<SelectorWindow>>) -> AppResult<()> {
    selector.hide()
}
