//! Error types for the companion avatar

use thiserror::Error;

/// Main error type for the companion avatar
#[derive(Error, Debug)]
pub enum CompanionError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Model resolution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Invalid model format: {0}")]
    InvalidFormat(String),

    #[error("Failed to load texture: {0}")]
    TextureLoadFailed(String),

    #[error("Failed to load motion: {0}")]
    MotionLoadFailed(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Result type alias for companion avatar operations
pub type Result<T> = std::result::Result<T, CompanionError>;
