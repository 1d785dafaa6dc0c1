//! # Windturbine: scheduled sensor pipeline
//!
//! Watches for a turbine sensor file on a cron cadence, stores each reading
//! and sends an alert or advisory depending on the temperature.
//!
//! Usage:
//!   windturbine                          # Start the scheduler (same as `run`)
//!   windturbine once                     # Execute a single run now
//!   windturbine init                     # Write a default config file
//!   windturbine check                    # Validate and print the effective config
//!   windturbine --config ./wt.toml run   # Use a specific config file

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use windturbine_core::WindTurbineConfig;
use windturbine_core::config::{ENV_DATABASE_URL, ENV_PATH_FILE};
use windturbine_pipeline::Pipeline;
use windturbine_scheduler::{CronSchedule, SchedulerEngine, spawn_scheduler};

#[derive(Parser)]
#[command(
    name = "windturbine",
    version,
    about = "🌬️ Windturbine: sensor file pipeline with temperature alerts"
)]
struct Cli {
    /// Config file (default: ~/.windturbine/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the scheduler loop
    Run,
    /// Execute one run immediately and print its summary
    Once,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Load, validate and print the effective config
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "windturbine=debug,windturbine_core=debug,windturbine_db=debug,windturbine_channels=debug,windturbine_scheduler=debug,windturbine_pipeline=debug"
    } else {
        "windturbine=info,windturbine_core=info,windturbine_db=info,windturbine_channels=info,windturbine_scheduler=info,windturbine_pipeline=info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config_path = cli.config.clone().unwrap_or_else(WindTurbineConfig::default_path);

    match cli.command.unwrap_or(Command::Run) {
        Command::Init { force } => init(&config_path, force),
        Command::Check => {
            let config = load_config(&config_path)?;
            println!("# {}", config_path.display());
            println!("{}", toml::to_string_pretty(&config)?);
            println!("✅ Config is valid");
            Ok(())
        }
        Command::Once => {
            let config = load_config(&config_path)?;
            let pipeline = build_pipeline(&config).await?;
            let outcome = pipeline.execute(Utc::now()).await;
            println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
            if outcome.summary.is_success() {
                Ok(())
            } else {
                anyhow::bail!("run {} did not succeed", outcome.summary.run_id)
            }
        }
        Command::Run => {
            let config = load_config(&config_path)?;
            run(config).await
        }
    }
}

fn init(path: &std::path::Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("⚠️  {} already exists (use --force to overwrite)", path.display());
        return Ok(());
    }
    WindTurbineConfig::default().save_to(path)?;
    println!("✅ Default config written to {}", path.display());
    Ok(())
}

/// File values, then environment overrides, then validation.
fn load_config(path: &std::path::Path) -> Result<WindTurbineConfig> {
    resolve_config(
        path,
        std::env::var(ENV_PATH_FILE).ok(),
        std::env::var(ENV_DATABASE_URL).ok(),
    )
}

fn resolve_config(
    path: &std::path::Path,
    path_file: Option<String>,
    database_url: Option<String>,
) -> Result<WindTurbineConfig> {
    let mut config = if path.exists() {
        WindTurbineConfig::load_from(path)?
    } else {
        tracing::info!("📄 No config at {}, using defaults", path.display());
        WindTurbineConfig::default()
    };
    config.apply_overrides(path_file, database_url);
    config.validate()?;
    CronSchedule::parse(&config.schedule.cron)?;
    Ok(config)
}

async fn build_pipeline(config: &WindTurbineConfig) -> Result<Pipeline> {
    let store = windturbine_db::connect(&config.database)
        .await
        .context("connecting to the sensors database")?;
    let notifier = windturbine_channels::build_notifier(&config.notify)?;
    tracing::info!(
        "🔧 Pipeline '{}': store={}, notifier={}, watching {}",
        config.pipeline.name,
        store.name(),
        notifier.name(),
        config.pipeline.resolved_path().display()
    );
    Ok(Pipeline::new(config, store, notifier))
}

async fn run(config: WindTurbineConfig) -> Result<()> {
    let pipeline = Arc::new(build_pipeline(&config).await?);
    let engine = SchedulerEngine::new(&config.schedule, Utc::now())?;

    println!("🌬️ Windturbine v{}", env!("CARGO_PKG_VERSION"));
    println!("   Pipeline: {}", config.pipeline.name);
    println!("   Schedule: {}", engine.cron());
    if let Some(next) = engine.next_run() {
        println!("   Next run: {}", next.to_rfc3339());
    }

    let engine = Arc::new(tokio::sync::Mutex::new(engine));
    let scheduler = spawn_scheduler(engine.clone(), pipeline, config.schedule.check_interval_secs);

    tokio::select! {
        _ = scheduler => {}
        _ = tokio::signal::ctrl_c() => {
            let eng = engine.lock().await;
            let stats = eng.stats();
            tracing::info!(
                "🛑 Shutting down: {} started, {} succeeded, {} failed, {} skipped while busy",
                stats.started,
                stats.succeeded,
                stats.failed,
                stats.skipped_busy
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(name: &str, content: Option<&str>) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("windturbine-test-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        if let Some(content) = content {
            std::fs::write(&path, content).unwrap();
        }
        (dir, path)
    }

    #[test]
    fn test_overrides_beat_file_values() {
        let (dir, path) = temp_config(
            "cli-override",
            Some("[pipeline]\npath_file = \"/srv/in/data.json\"\n[database]\nurl = \"sqlite::memory:\"\n"),
        );

        let config = resolve_config(&path, None, Some("sqlite:///tmp/sensors.db".into())).unwrap();
        assert_eq!(config.pipeline.path_file, "/srv/in/data.json");
        assert_eq!(config.database.url, "sqlite:///tmp/sensors.db");

        let config = resolve_config(&path, Some("/srv/other.json".into()), Some(String::new())).unwrap();
        assert_eq!(config.pipeline.path_file, "/srv/other.json");
        assert_eq!(config.database.url, "sqlite::memory:");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let (dir, path) = temp_config("cli-defaults", None);
        let config = resolve_config(&path, None, None).unwrap();
        assert_eq!(config.schedule.cron, "* * * * *");
        assert_eq!(config.pipeline.temperature_threshold, 30.0);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let (dir, path) = temp_config("cli-bad-cron", Some("[schedule]\ncron = \"every minute\"\n"));
        assert!(resolve_config(&path, None, None).is_err());

        std::fs::write(&path, "[pipeline]\npoke_interval_secs = 0\n").unwrap();
        assert!(resolve_config(&path, None, None).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_init_writes_loadable_config() {
        let (dir, path) = temp_config("cli-init", None);
        init(&path, false).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();

        // A second init without --force leaves the file alone.
        std::fs::write(&path, "[pipeline]\nname = \"kept\"\n").unwrap();
        init(&path, false).unwrap();
        assert_eq!(resolve_config(&path, None, None).unwrap().pipeline.name, "kept");

        init(&path, true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), written);
        assert_eq!(resolve_config(&path, None, None).unwrap().pipeline.name, "windturbine");
        std::fs::remove_dir_all(&dir).ok();
    }
}
