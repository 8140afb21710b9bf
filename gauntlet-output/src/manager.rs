//! Artifact delivery manager routing artifacts to their sinks

use std::sync::Arc;

use gauntlet_config::OutputConfig;
use tracing::{debug, error, info};

use crate::{
    artifact::{Artifact, DeliveryResult},
    errors::DeliveryError,
    sinks::{ArtifactSink, FilesystemConfig, FilesystemSink, StdStream, StdioSink},
};

/// Routes the `stdout` artifact to the console and everything else to the
/// results directory
pub struct ArtifactDeliveryManager {
    filesystem: Arc<dyn ArtifactSink>,
    console: Arc<dyn ArtifactSink>,
}

impl ArtifactDeliveryManager {
    pub fn new(filesystem: Arc<dyn ArtifactSink>, console: Arc<dyn ArtifactSink>) -> Self {
        Self { filesystem, console }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(
            Arc::new(FilesystemSink::new(FilesystemConfig::from(config))),
            Arc::new(StdioSink::new(StdStream::Stdout)),
        )
    }

    fn sink_for(&self, artifact: &Artifact) -> &Arc<dyn ArtifactSink> {
        if artifact.is_stdout() {
            &self.console
        } else {
            &self.filesystem
        }
    }

    /// Deliver a single artifact
    pub async fn deliver(&self, artifact: &Artifact) -> Result<DeliveryResult, DeliveryError> {
        let sink = self.sink_for(artifact);
        debug!("Delivering {} via {} sink", artifact.name, sink.sink_type());

        let result = sink.deliver(artifact).await;
        match &result {
            Ok(delivered) => info!(
                "Delivered {} to {} ({} bytes in {:?})",
                delivered.artifact,
                delivered.location,
                delivered.size_bytes,
                delivered.delivery_time
            ),
            Err(e) => error!("Failed to deliver {}: {}", artifact.name, e),
        }
        result
    }

    /// Deliver every artifact in order. A failed artifact does not stop the rest.
    pub async fn deliver_all(
        &self,
        artifacts: &[Artifact],
    ) -> Vec<(String, Result<DeliveryResult, DeliveryError>)> {
        let mut results = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            let result = self.deliver(artifact).await;
            results.push((artifact.name.clone(), result));
        }
        results
    }
}
