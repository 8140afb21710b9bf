//! Error types for report rendering and artifact delivery

use thiserror::Error;

/// Errors raised while turning a report into artifact content
#[derive(Debug, Error, Clone)]
pub enum RenderError {
    #[error("Serialization failed for format {format}: {error}")]
    Serialization { format: String, error: String },

    #[error("Template rendering failed: {template} - {error}")]
    TemplateRender { template: String, error: String },

    #[error("Template registration failed: {name} - {error}")]
    TemplateRegistration { name: String, error: String },
}

/// Errors that can occur while delivering an artifact
#[derive(Debug, Error, Clone)]
pub enum DeliveryError {
    #[error("Filesystem operation failed at {path} ({operation}): {error}")]
    Filesystem {
        path: String,
        operation: String,
        error: String,
    },

    #[error("File already exists: {path}")]
    FileExists { path: String },

    #[error("Invalid artifact name '{name}': {reason}")]
    InvalidArtifactName { name: String, reason: String },

    #[error("Failed to write to {stream}: {error}")]
    Stdio { stream: String, error: String },
}

pub type RenderResult<T> = Result<T, RenderError>;
