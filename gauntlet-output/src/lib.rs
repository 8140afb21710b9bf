//! # Gauntlet Output
//!
//! Turns an [`AggregatedReport`](gauntlet_engine::AggregatedReport) into named
//! artifacts and delivers them.
//!
//! - **Renderers**: pretty JSON, Markdown tables, an HTML page with comparison
//!   bars (handlebars), and a console summary (optionally colored)
//! - **Sinks**: the results directory on the filesystem and the standard streams
//! - **Routing**: the artifact named `stdout` goes to the console, everything
//!   else to the results directory
//!
//! ## Example
//!
//! ```rust,no_run
//! use gauntlet_config::OutputConfig;
//! use gauntlet_engine::AggregatedReport;
//! use gauntlet_output::{ArtifactDeliveryManager, ReportRenderer};
//!
//! # async fn example(report: AggregatedReport) -> Result<(), Box<dyn std::error::Error>> {
//! let config = OutputConfig::default();
//! let artifacts = ReportRenderer::new()?.artifacts(&report, &config)?;
//!
//! let manager = ArtifactDeliveryManager::from_config(&config);
//! for (name, result) in manager.deliver_all(&artifacts).await {
//!     result.map_err(|e| format!("{}: {}", name, e))?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod errors;
pub mod manager;
pub mod render;
pub mod sinks;
pub mod template;

pub use artifact::{artifact_name, Artifact, DeliveryResult, STDOUT_ARTIFACT};
pub use errors::{DeliveryError, RenderError};
pub use manager::ArtifactDeliveryManager;
pub use render::ReportRenderer;
pub use sinks::{ArtifactSink, FilesystemConfig, FilesystemSink, StdStream, StdioSink};
pub use template::TemplateEngine;
