use thiserror::Error;
use serde::Serialize;

#[derive(Error, Debug, Serialize)]
pub enum AppError {
    #[error("I/O Error: {0}")]
    Io(String),

    #[error("Storage Error: {0}")]
    Storage(String),

    #[error("Serialization Error: {0}")]
    Serialization(String),

    #[error("Clipboard Error: {0}")]
    Clipboard(String),

    #[error("System Error: {0}")]
    System(String),

    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("Accessibility permissions denied. Please enable in System Settings > Privacy & Security > Accessibility.")]
    Permission,
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<tauri::Error> for AppError {
    fn from(err: tauri::Error) -> Self {
        AppError::System(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::System(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::System(err.to_string())
    }
}

// Helper for Tauri Result
pub type AppResult<T> = Result<T, AppError>;
