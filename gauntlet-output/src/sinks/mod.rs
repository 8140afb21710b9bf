//! Artifact sinks

pub mod filesystem;
pub mod stdio;

use crate::artifact::{Artifact, DeliveryResult};
use crate::errors::DeliveryError;
use async_trait::async_trait;

pub use filesystem::{FilesystemConfig, FilesystemSink};
pub use stdio::{StdStream, StdioSink};

/// Accepts named artifacts with string content
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn deliver(&self, artifact: &Artifact) -> Result<DeliveryResult, DeliveryError>;

    /// Sink type for logging
    fn sink_type(&self) -> &'static str;
}
