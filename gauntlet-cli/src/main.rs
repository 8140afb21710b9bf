use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use gauntlet_config::{ConfigLoader, GauntletConfig, LogLevel};
use gauntlet_engine::{LoadTestEngine, TestPlan};
use gauntlet_http::{HttpConfig, HttpManager};
use gauntlet_logging::{init_logging_from_config, init_simple_tracing};
use gauntlet_output::{ArtifactDeliveryManager, ReportRenderer};

mod cli;

use cli::{Cli, Commands};

/// Exit status when the run completed but a threshold failed
const THRESHOLDS_FAILED: u8 = 99;

/// Load configuration from file or from defaults plus environment
fn load_config(config_path: Option<&Path>) -> Result<GauntletConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) => loader
            .from_file(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path)),
        None => loader
            .from_env()
            .context("Failed to load configuration from environment"),
    }
}

fn apply_overrides(
    config: &mut GauntletConfig,
    results_dir: Option<PathBuf>,
    seed: Option<u64>,
    log_level: Option<&str>,
) -> Result<()> {
    if let Some(dir) = results_dir {
        config.output.results_dir = dir.to_string_lossy().to_string();
    }
    if seed.is_some() {
        config.probe.seed = seed;
    }
    if let Some(level) = log_level {
        config.logging.level = level
            .parse::<LogLevel>()
            .map_err(|e| anyhow::anyhow!(e))
            .context("Invalid --log-level")?;
    }
    config
        .validate_all()
        .context("Configuration invalid after command line overrides")
}

async fn run_command(
    config_path: Option<PathBuf>,
    results_dir: Option<PathBuf>,
    seed: Option<u64>,
    log_level: Option<String>,
) -> Result<ExitCode> {
    let mut config = load_config(config_path.as_deref())?;
    apply_overrides(&mut config, results_dir, seed, log_level.as_deref())?;
    init_logging_from_config(&config.logging)?;

    info!(
        "Comparing {} ({}) with {} ({})",
        config.targets.backend_a.label,
        config.targets.backend_a.base_url,
        config.targets.backend_b.label,
        config.targets.backend_b.base_url
    );

    let client = HttpManager::with_config(HttpConfig::from(config.http.clone()))
        .context("Failed to build HTTP client")?;
    let plan = TestPlan::from_config(&config).context("Failed to build test plan")?;
    let mut engine =
        LoadTestEngine::new(plan, Arc::new(client)).context("Failed to set up load test")?;

    let shutdown = CancellationToken::new();
    let ctrl_c = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    warn!("Interrupted, stopping virtual users");
                    shutdown.cancel();
                }
                Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
            }
        })
    };

    let outcome = engine.run_until(shutdown).await.context("Load test run failed")?;
    ctrl_c.abort();

    let renderer = ReportRenderer::new().context("Failed to prepare report templates")?;
    let artifacts = renderer
        .artifacts(&outcome.report, &config.output)
        .context("Failed to render report")?;

    let manager = ArtifactDeliveryManager::from_config(&config.output);
    let failures = manager
        .deliver_all(&artifacts)
        .await
        .into_iter()
        .filter(|(_, result)| result.is_err())
        .count();
    if failures > 0 {
        anyhow::bail!(
            "{} of {} report artifacts could not be delivered",
            failures,
            artifacts.len()
        );
    }

    if outcome.passed() {
        info!("All thresholds passed");
        Ok(ExitCode::SUCCESS)
    } else {
        let failed: Vec<&str> = outcome.verdicts.failed().map(|v| v.metric.as_str()).collect();
        warn!("Thresholds failed: {}", failed.join(", "));
        Ok(ExitCode::from(THRESHOLDS_FAILED))
    }
}

/// Load the file and set up an engine without sending any request, so
/// threshold predicates and metric names are checked as well.
fn validate_command(config_path: &Path) -> Result<()> {
    init_simple_tracing("info")?;
    let config = load_config(Some(config_path))?;

    let mut client = HttpManager::new().context("Failed to build HTTP client")?;
    client.set_offline();

    let plan = TestPlan::from_config(&config).context("Failed to build test plan")?;
    let scenarios = plan.scenarios.len();
    LoadTestEngine::new(plan, Arc::new(client)).context("Configuration rejected")?;

    println!(
        "Configuration {:?} is valid ({} scenarios, {} thresholds)",
        config_path,
        scenarios,
        config.effective_thresholds().len()
    );
    Ok(())
}

fn sample_config_command(output: Option<&Path>) -> Result<()> {
    let sample = GauntletConfig::generate_sample();

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).context("Failed to create output directory")?;
            }
            std::fs::write(path, sample).context("Failed to write configuration file")?;
            debug!("Sample configuration written to {:?}", path);
        }
        None => print!("{}", sample),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            results_dir,
            seed,
            log_level,
        } => run_command(config, results_dir, seed, log_level).await,
        Commands::Validate { config } => validate_command(&config).map(|()| ExitCode::SUCCESS),
        Commands::SampleConfig { output } => {
            sample_config_command(output.as_deref()).map(|()| ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_overrides_apply() {
        let mut config = GauntletConfig::default();
        apply_overrides(
            &mut config,
            Some(PathBuf::from("out/run1")),
            Some(9),
            Some("debug"),
        )
        .unwrap();

        assert_eq!(config.output.results_dir, "out/run1");
        assert_eq!(config.probe.seed, Some(9));
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = GauntletConfig::default();
        assert!(apply_overrides(&mut config, None, None, Some("loud")).is_err());
    }

    #[test]
    fn test_sample_config_round_trips_through_validate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("gauntlet.yaml");

        sample_config_command(Some(&path)).unwrap();
        validate_command(&path).unwrap();
    }

    #[test]
    fn test_validate_rejects_unknown_threshold_metric() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "thresholds:\n  ruby_login_duration:\n    - p(95)<500\n").unwrap();

        assert!(validate_command(&path).is_err());
    }
}
