//! Filesystem sink writing artifacts under the results directory

use async_trait::async_trait;
use gauntlet_config::OutputConfig;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;

use crate::{
    artifact::{Artifact, DeliveryResult},
    errors::DeliveryError,
    sinks::ArtifactSink,
};

#[derive(Debug, Clone)]
pub struct FilesystemConfig {
    pub root: PathBuf,
    pub create_dirs: bool,
    pub overwrite: bool,
}

impl From<&OutputConfig> for FilesystemConfig {
    fn from(config: &OutputConfig) -> Self {
        Self {
            root: PathBuf::from(&config.results_dir),
            create_dirs: config.create_dirs,
            overwrite: config.overwrite,
        }
    }
}

#[derive(Debug)]
pub struct FilesystemSink {
    config: FilesystemConfig,
}

impl FilesystemSink {
    pub fn new(config: FilesystemConfig) -> Self {
        Self { config }
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Artifact names are plain file names, never paths
    fn validate_name(name: &str) -> Result<(), DeliveryError> {
        let reason = if name.is_empty() {
            Some("name is empty")
        } else if name.contains('\0') {
            Some("name contains null bytes")
        } else if name.contains('/') || name.contains('\\') {
            Some("name contains a path separator")
        } else if name == "." || name == ".." {
            Some("name is a relative directory")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(DeliveryError::InvalidArtifactName {
                name: name.to_string(),
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ArtifactSink for FilesystemSink {
    async fn deliver(&self, artifact: &Artifact) -> Result<DeliveryResult, DeliveryError> {
        let start_time = Instant::now();

        Self::validate_name(&artifact.name)?;
        let path = self.config.root.join(&artifact.name);
        let display_path = path.to_string_lossy().to_string();

        let exists = fs::try_exists(&path).await.map_err(|e| DeliveryError::Filesystem {
            path: display_path.clone(),
            operation: "stat".to_string(),
            error: e.to_string(),
        })?;
        if exists && !self.config.overwrite {
            return Err(DeliveryError::FileExists { path: display_path });
        }

        if self.config.create_dirs {
            fs::create_dir_all(&self.config.root)
                .await
                .map_err(|e| DeliveryError::Filesystem {
                    path: self.config.root.to_string_lossy().to_string(),
                    operation: "create_dirs".to_string(),
                    error: e.to_string(),
                })?;
        }

        fs::write(&path, artifact.content.as_bytes())
            .await
            .map_err(|e| DeliveryError::Filesystem {
                path: display_path.clone(),
                operation: "write".to_string(),
                error: e.to_string(),
            })?;

        Ok(DeliveryResult {
            artifact: artifact.name.clone(),
            sink: self.sink_type(),
            location: display_path,
            size_bytes: artifact.size_bytes(),
            delivery_time: start_time.elapsed(),
        })
    }

    fn sink_type(&self) -> &'static str {
        "filesystem"
    }
}
