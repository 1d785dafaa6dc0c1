//! File sensor: waits until the watched file exists.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

use windturbine_core::config::PipelineConfig;
use windturbine_core::error::{Result, WindTurbineError};

pub struct FileWatcher {
    path: PathBuf,
    poke_interval: Duration,
    timeout: Duration,
}

impl FileWatcher {
    pub fn new(path: impl Into<PathBuf>, poke_interval: Duration, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            poke_interval,
            timeout,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.resolved_path(),
            Duration::from_secs(config.poke_interval_secs),
            Duration::from_secs(config.sensor_timeout_secs),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// One existence check.
    pub fn poke(&self) -> bool {
        self.path.is_file()
    }

    /// Re-check every poke interval until the file exists or the timeout elapses.
    pub async fn wait(&self) -> Result<()> {
        let started = Instant::now();
        let mut pokes: u64 = 0;

        loop {
            pokes += 1;
            if self.poke() {
                tracing::info!("📂 Found {} after {pokes} poke(s)", self.path.display());
                return Ok(());
            }

            let waited = started.elapsed();
            if waited >= self.timeout {
                return Err(WindTurbineError::Timeout {
                    path: self.path.display().to_string(),
                    waited_secs: waited.as_secs(),
                });
            }

            tracing::debug!("👀 {} not there yet (poke {pokes})", self.path.display());
            tokio::time::sleep(self.poke_interval.min(self.timeout - waited)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("windturbine-test-{name}-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_existing_file_returns_immediately() {
        let dir = temp_dir("watch-present");
        let path = dir.join("data.json");
        std::fs::write(&path, "{}").unwrap();

        let watcher = FileWatcher::new(&path, Duration::from_secs(10), Duration::from_secs(60));
        watcher.wait().await.unwrap();
        assert!(path.exists(), "watching must not consume the file");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_until_file_appears() {
        let dir = temp_dir("watch-late");
        let path = dir.join("data.json");

        let writer = {
            let path = path.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(25)).await;
                std::fs::write(&path, "{}").unwrap();
            })
        };

        let started = Instant::now();
        let watcher = FileWatcher::new(&path, Duration::from_secs(10), Duration::from_secs(120));
        watcher.wait().await.unwrap();
        writer.await.unwrap();

        // Found on the poke at t = 30s.
        assert_eq!(started.elapsed(), Duration::from_secs(30));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out() {
        let dir = temp_dir("watch-timeout");
        let watcher = FileWatcher::new(dir.join("never.json"), Duration::from_secs(10), Duration::from_secs(35));

        let err = watcher.wait().await.unwrap_err();
        match err {
            WindTurbineError::Timeout { waited_secs, .. } => assert_eq!(waited_secs, 35),
            other => panic!("expected timeout, got {other:?}"),
        }
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_directory_does_not_count_as_file() {
        let dir = temp_dir("watch-dir");
        let watcher = FileWatcher::new(&dir, Duration::from_millis(5), Duration::from_millis(20));
        assert!(!watcher.poke());
        assert!(watcher.wait().await.is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}
