//! Settings file reload.
//!
//! Polls the config file's modification time and hands a freshly loaded
//! [`SnapshotConfig`] to the scheduler whenever it changes. A file that
//! fails to read, parse, or validate is reported and the running
//! configuration stays in place until the next good edit.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use pulse_core::{ConfigError, Scheduler, SnapshotConfig};
use tracing::{info, warn};

/// Result of one look at the config file.
#[derive(Debug)]
pub enum ReloadCheck {
    /// Modification time unchanged (or the file is still missing).
    Unchanged,
    /// The file changed and produced a valid configuration.
    Reloaded(SnapshotConfig),
    /// The file changed but could not be used.
    Rejected(ConfigError),
}

/// Tracks one config file between polls.
#[derive(Debug)]
pub struct ConfigWatcher {
    path: PathBuf,
    last_modified: Option<SystemTime>,
}

impl ConfigWatcher {
    /// Start watching `path`. The current modification time is the
    /// baseline, so the file as loaded at startup is not reloaded.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            last_modified: modified_time(path),
        }
    }

    /// Compare the modification time with the last poll and reload on
    /// change.
    pub fn check(&mut self) -> ReloadCheck {
        let modified = modified_time(&self.path);
        if modified.is_none() || modified == self.last_modified {
            return ReloadCheck::Unchanged;
        }
        self.last_modified = modified;

        match load_validated(&self.path) {
            Ok(config) => ReloadCheck::Reloaded(config),
            Err(error) => ReloadCheck::Rejected(error),
        }
    }

    /// Poll every `period` until the task is dropped, forwarding each valid
    /// reload to `scheduler`.
    pub async fn run(mut self, scheduler: Arc<Scheduler>, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(path = %self.path.display(), "Watching settings file for changes");

        loop {
            ticker.tick().await;
            match self.check() {
                ReloadCheck::Unchanged => {}
                ReloadCheck::Reloaded(config) => scheduler.on_config_changed(config),
                ReloadCheck::Rejected(error) => {
                    warn!(
                        path = %self.path.display(),
                        %error,
                        "Ignoring settings change, keeping current configuration"
                    );
                }
            }
        }
    }
}

/// Read and validate a config file.
pub fn load_validated(path: &Path) -> Result<SnapshotConfig, ConfigError> {
    let config = SnapshotConfig::from_file(path)?;
    config.validate()?;
    Ok(config)
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::arithmetic_side_effects)]
mod tests {
    use std::fs::{self, File};

    use super::*;

    fn touch(path: &Path, contents: &str, secs_after_epoch: u64) {
        fs::write(path, contents).unwrap();
        let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(secs_after_epoch);
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(stamp)
            .unwrap();
    }

    #[test]
    fn unchanged_file_is_not_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pulse-config.json");
        touch(&path, "{}", 1_000);

        let mut watcher = ConfigWatcher::new(&path);
        assert!(matches!(watcher.check(), ReloadCheck::Unchanged));
    }

    #[test]
    fn edit_produces_new_config_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pulse-config.json");
        touch(&path, "{}", 1_000);
        let mut watcher = ConfigWatcher::new(&path);

        touch(&path, r#"{"playerIntervalSeconds": 30}"#, 2_000);
        match watcher.check() {
            ReloadCheck::Reloaded(config) => assert_eq!(config.player_interval_seconds, 30),
            other => panic!("expected reload, got {other:?}"),
        }
        assert!(matches!(watcher.check(), ReloadCheck::Unchanged));
    }

    #[test]
    fn invalid_edit_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pulse-config.json");
        touch(&path, "{}", 1_000);
        let mut watcher = ConfigWatcher::new(&path);

        touch(&path, r#"{"regionIntervalSeconds": 0}"#, 2_000);
        assert!(matches!(
            watcher.check(),
            ReloadCheck::Rejected(ConfigError::Invalid { .. })
        ));

        touch(&path, "{ not json", 3_000);
        assert!(matches!(
            watcher.check(),
            ReloadCheck::Rejected(ConfigError::Json { .. })
        ));
    }

    #[test]
    fn file_created_after_start_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pulse-config.yaml");
        let mut watcher = ConfigWatcher::new(&path);
        assert!(matches!(watcher.check(), ReloadCheck::Unchanged));

        touch(&path, "enableLogging: true\n", 1_000);
        assert!(matches!(
            watcher.check(),
            ReloadCheck::Reloaded(SnapshotConfig { enable_logging: true, .. })
        ));
    }
}
