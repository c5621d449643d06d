//! Timer lifecycle for the snapshot jobs.
//!
//! Every enabled job runs as its own tokio task driven by
//! [`tokio::time::interval`]: the first poll fires immediately, then one
//! per interval. Missed ticks are skipped rather than bursted, so a poll
//! that overruns only delays the next poll of the same job.
//!
//! A poll enumerates host registries and writes files synchronously, so it
//! runs on the blocking pool via [`tokio::task::spawn_blocking`]. The timer
//! task only awaits it; a slow poll never holds a runtime worker and the
//! other job keeps firing on time.
//!
//! # Configuration
//!
//! The active [`SnapshotConfig`] sits in an [`ArcSwap`]. Each poll loads
//! the current `Arc` once at its start and uses it for the whole cycle, so
//! a reload is seen entirely or not at all and the poll path takes no
//! locks. The snapshot is loaded before the stop signal is checked: a
//! reload signals stop before it publishes, so a task that sees the new
//! configuration always sees its own stop and never polls with it. The
//! mutex in [`Scheduler`] only guards the set of running task handles
//! during start and stop.
//!
//! # Stopping
//!
//! Stopping signals each task through a watch channel. A task checks the
//! signal before every poll, so no new poll begins once [`Scheduler::stop`]
//! returns. A poll already running is never aborted; it finishes and the
//! task exits afterwards.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::config::SnapshotConfig;
use crate::host::{PlayerRegistry, RegionRegistry};
use crate::job::{JobKind, PlayerJob, RegionJob, SnapshotJob};

/// Errors that can occur while constructing the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// Constructed outside a tokio runtime.
    #[error("scheduler requires a tokio runtime: {source}")]
    NoRuntime {
        /// The underlying runtime lookup error.
        #[from]
        source: tokio::runtime::TryCurrentError,
    },
}

/// A job task that has been armed.
struct RunningJob {
    kind: JobKind,
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Owns the job timers and the live configuration.
pub struct Scheduler {
    config: Arc<ArcSwap<SnapshotConfig>>,
    jobs: Vec<Arc<dyn SnapshotJob>>,
    running: Mutex<Vec<RunningJob>>,
    runtime: Handle,
}

impl Scheduler {
    /// Create a scheduler for the player and region jobs. Nothing is
    /// scheduled until [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NoRuntime`] if called outside a tokio
    /// runtime.
    pub fn new(
        config: SnapshotConfig,
        players: Arc<dyn PlayerRegistry>,
        regions: Arc<dyn RegionRegistry>,
    ) -> Result<Self, SchedulerError> {
        let jobs: Vec<Arc<dyn SnapshotJob>> = vec![
            Arc::new(PlayerJob::new(players)),
            Arc::new(RegionJob::new(regions)),
        ];
        Self::with_jobs(config, jobs)
    }

    /// Create a scheduler over arbitrary jobs.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NoRuntime`] if called outside a tokio
    /// runtime.
    pub fn with_jobs(
        config: SnapshotConfig,
        jobs: Vec<Arc<dyn SnapshotJob>>,
    ) -> Result<Self, SchedulerError> {
        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            jobs,
            running: Mutex::new(Vec::new()),
            runtime: Handle::try_current()?,
        })
    }

    /// Stop any running jobs, publish `config`, and arm every enabled job.
    ///
    /// A job whose settings fail validation is logged and left unscheduled;
    /// the other job is unaffected. Safe to call repeatedly.
    pub fn start(&self, config: SnapshotConfig) {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        stop_all(&mut running);

        let config = Arc::new(config);
        self.config.store(Arc::clone(&config));

        for job in &self.jobs {
            let kind = job.kind();
            let settings = config.job(kind);

            if !settings.enabled {
                info!(job = %kind, "Job disabled, not scheduling");
                continue;
            }
            if let Err(error) = settings.validate() {
                error!(job = %kind, %error, "Error during job initialization, not scheduling");
                continue;
            }

            info!(job = %kind, "Initializing {} tracking", kind.noun());
            let (stop, stop_rx) = watch::channel(false);
            let handle = self.runtime.spawn(run_job(
                Arc::clone(job),
                Arc::clone(&self.config),
                settings.interval(),
                stop_rx,
            ));
            info!(
                job = %kind,
                interval_seconds = settings.interval_seconds,
                max_records = %settings.max_records,
                "{} activity tracking online",
                kind.noun()
            );
            running.push(RunningJob { kind, stop, handle });
        }
    }

    /// Signal every job to stop. No poll begins after this returns; a poll
    /// already running is allowed to finish.
    pub fn stop(&self) {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        stop_all(&mut running);
    }

    /// Swap in a new configuration and re-derive the schedules.
    ///
    /// Polls already running keep the configuration they loaded.
    pub fn on_config_changed(&self, config: SnapshotConfig) {
        info!("Settings changed, restarting snapshot jobs");
        self.start(config);
    }

    /// The currently published configuration.
    pub fn current_config(&self) -> Arc<SnapshotConfig> {
        self.config.load_full()
    }

    /// Whether `kind` has an armed, live task.
    pub fn is_running(&self, kind: JobKind) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|job| job.kind == kind && !job.handle.is_finished())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn stop_all(running: &mut Vec<RunningJob>) {
    if running.is_empty() {
        return;
    }
    for job in running.drain(..) {
        // A send error means the task already exited.
        let _ = job.stop.send(true);
        info!(job = %job.kind, "Snapshot job stopped");
    }
}

async fn run_job(
    job: Arc<dyn SnapshotJob>,
    config: Arc<ArcSwap<SnapshotConfig>>,
    period: Duration,
    mut stop: watch::Receiver<bool>,
) {
    let kind = job.kind();
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = stop.changed() => break,
            _ = ticker.tick() => {}
        }
        let Some(snapshot) = next_snapshot(&config, &stop) else {
            break;
        };

        let poll = Arc::clone(&job);
        if let Err(error) = tokio::task::spawn_blocking(move || poll.run_cycle(&snapshot)).await {
            error!(job = %kind, %error, "Snapshot poll panicked; will retry next interval");
        }
    }
}

/// Configuration for the next poll, or `None` once stop has been signalled.
fn next_snapshot(
    config: &ArcSwap<SnapshotConfig>,
    stop: &watch::Receiver<bool>,
) -> Option<Arc<SnapshotConfig>> {
    let snapshot = config.load_full();
    (!*stop.borrow()).then_some(snapshot)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::host::HostError;
    use crate::job::CycleOutcome;

    /// Counts polls and records the interval each poll saw.
    struct CountingJob {
        kind: JobKind,
        polls: AtomicUsize,
        seen_intervals: Mutex<Vec<u64>>,
        panic_on_poll: bool,
        block_for: Duration,
    }

    impl CountingJob {
        fn build(kind: JobKind, panic_on_poll: bool, block_for: Duration) -> Arc<Self> {
            Arc::new(Self {
                kind,
                polls: AtomicUsize::new(0),
                seen_intervals: Mutex::new(Vec::new()),
                panic_on_poll,
                block_for,
            })
        }

        fn new(kind: JobKind) -> Arc<Self> {
            Self::build(kind, false, Duration::ZERO)
        }

        fn panicking(kind: JobKind) -> Arc<Self> {
            Self::build(kind, true, Duration::ZERO)
        }

        /// A job whose every poll holds its thread for `block_for`.
        fn slow(kind: JobKind, block_for: Duration) -> Arc<Self> {
            Self::build(kind, false, block_for)
        }

        fn polls(&self) -> usize {
            self.polls.load(Ordering::Acquire)
        }
    }

    impl SnapshotJob for CountingJob {
        fn kind(&self) -> JobKind {
            self.kind
        }

        fn run_cycle(&self, config: &SnapshotConfig) -> CycleOutcome {
            self.polls.fetch_add(1, Ordering::AcqRel);
            self.seen_intervals
                .lock()
                .unwrap()
                .push(config.job(self.kind).interval_seconds);
            if self.panic_on_poll {
                panic!("host blew up");
            }
            if !self.block_for.is_zero() {
                std::thread::sleep(self.block_for);
            }
            CycleOutcome::EnumerationFailed {
                error: HostError::Internal {
                    message: "counting only".to_owned(),
                },
            }
        }
    }

    fn player_only(interval_seconds: u64) -> SnapshotConfig {
        SnapshotConfig {
            player_interval_seconds: interval_seconds,
            enable_region_output: false,
            ..SnapshotConfig::default()
        }
    }

    fn scheduler_for(job: &Arc<CountingJob>) -> Scheduler {
        let jobs: Vec<Arc<dyn SnapshotJob>> = vec![Arc::clone(job) as Arc<dyn SnapshotJob>];
        Scheduler::with_jobs(SnapshotConfig::default(), jobs).unwrap()
    }

    async fn advance(seconds: u64) {
        tokio::time::sleep(Duration::from_secs(seconds)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn fires_immediately_then_every_interval() {
        let job = CountingJob::new(JobKind::Player);
        let scheduler = scheduler_for(&job);

        scheduler.start(player_only(10));
        advance(25).await;

        // t = 0, 10, 20
        assert_eq!(job.polls(), 3);
        assert!(scheduler.is_running(JobKind::Player));
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_job_never_fires() {
        let job = CountingJob::new(JobKind::Player);
        let scheduler = scheduler_for(&job);

        let config = SnapshotConfig {
            enable_player_output: false,
            ..player_only(10)
        };
        scheduler.start(config);
        advance(60).await;

        assert_eq!(job.polls(), 0);
        assert!(!scheduler.is_running(JobKind::Player));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_further_polls() {
        let job = CountingJob::new(JobKind::Player);
        let scheduler = scheduler_for(&job);

        scheduler.start(player_only(10));
        advance(15).await;
        assert_eq!(job.polls(), 2);

        scheduler.stop();
        advance(60).await;
        assert_eq!(job.polls(), 2);
        assert!(!scheduler.is_running(JobKind::Player));
    }

    #[tokio::test(start_paused = true)]
    async fn reload_rearms_without_duplicate_timers() {
        let job = CountingJob::new(JobKind::Player);
        let scheduler = scheduler_for(&job);

        scheduler.start(player_only(10));
        advance(5).await;
        assert_eq!(job.polls(), 1);

        scheduler.on_config_changed(player_only(30));
        // New schedule fires at t = 5 and t = 35. A leftover 10s timer
        // would have added t = 10, 20, 30.
        advance(34).await;

        assert_eq!(job.polls(), 3);
        assert_eq!(*job.seen_intervals.lock().unwrap(), [10, 30, 30]);
        assert_eq!(scheduler.current_config().player_interval_seconds, 30);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_start_keeps_a_single_task() {
        let job = CountingJob::new(JobKind::Player);
        let scheduler = scheduler_for(&job);

        scheduler.start(player_only(10));
        scheduler.start(player_only(10));
        scheduler.start(player_only(10));
        advance(15).await;

        // One task: t = 0, 10.
        assert_eq!(job.polls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_interval_leaves_job_unscheduled() {
        let job = CountingJob::new(JobKind::Player);
        let scheduler = scheduler_for(&job);

        scheduler.start(player_only(0));
        advance(30).await;

        assert_eq!(job.polls(), 0);
        assert!(!scheduler.is_running(JobKind::Player));
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_poll_keeps_the_schedule_alive() {
        let job = CountingJob::panicking(JobKind::Player);
        let scheduler = scheduler_for(&job);

        scheduler.start(player_only(10));
        advance(25).await;

        assert_eq!(job.polls(), 3);
        assert!(scheduler.is_running(JobKind::Player));
    }

    #[tokio::test(start_paused = true)]
    async fn jobs_run_on_independent_schedules() {
        let players = CountingJob::new(JobKind::Player);
        let regions = CountingJob::new(JobKind::Region);
        let jobs: Vec<Arc<dyn SnapshotJob>> = vec![
            Arc::clone(&players) as Arc<dyn SnapshotJob>,
            Arc::clone(&regions) as Arc<dyn SnapshotJob>,
        ];
        let scheduler = Scheduler::with_jobs(SnapshotConfig::default(), jobs).unwrap();

        let config = SnapshotConfig {
            player_interval_seconds: 10,
            region_interval_seconds: 60,
            ..SnapshotConfig::default()
        };
        scheduler.start(config);
        advance(65).await;

        // Players: 0..=60 step 10. Regions: 0, 60.
        assert_eq!(players.polls(), 7);
        assert_eq!(regions.polls(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn slow_poll_does_not_stall_the_other_job() {
        let players = CountingJob::slow(JobKind::Player, Duration::from_secs(3));
        let regions = CountingJob::new(JobKind::Region);
        let jobs: Vec<Arc<dyn SnapshotJob>> = vec![
            Arc::clone(&players) as Arc<dyn SnapshotJob>,
            Arc::clone(&regions) as Arc<dyn SnapshotJob>,
        ];
        let scheduler = Scheduler::with_jobs(SnapshotConfig::default(), jobs).unwrap();

        let config = SnapshotConfig {
            player_interval_seconds: 10,
            region_interval_seconds: 1,
            ..SnapshotConfig::default()
        };
        scheduler.start(config);
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        // The player poll is still blocked; regions fired at t = 0, 1, 2.
        assert_eq!(players.polls(), 1);
        assert!(regions.polls() >= 3, "region polls: {}", regions.polls());
        scheduler.stop();
    }

    #[test]
    fn stop_signalled_before_publish_suppresses_the_new_config() {
        let config = ArcSwap::from_pointee(player_only(10));
        let (stop, stop_rx) = watch::channel(false);

        let current = next_snapshot(&config, &stop_rx).unwrap();
        assert_eq!(current.player_interval_seconds, 10);

        // Same order as `start`: signal the old task, then publish.
        stop.send(true).unwrap();
        config.store(Arc::new(player_only(30)));

        assert!(next_snapshot(&config, &stop_rx).is_none());
    }

    #[test]
    fn construction_outside_runtime_fails() {
        let job = CountingJob::new(JobKind::Player);
        let jobs: Vec<Arc<dyn SnapshotJob>> = vec![job as Arc<dyn SnapshotJob>];
        let result = Scheduler::with_jobs(SnapshotConfig::default(), jobs);
        assert!(matches!(result, Err(SchedulerError::NoRuntime { .. })));
    }
}
