//! Snapshot jobs: one poll cycle from registry to output file.
//!
//! A cycle never returns an error. Every failure degrades to "skip this
//! entity" or "skip this cycle" and is described by the returned
//! [`CycleOutcome`] so the scheduler can keep firing.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::batch::{self, Batch, BatchReport};
use crate::config::{JobSettings, SnapshotConfig};
use crate::export::{self, ExportError, ExportReport};
use crate::extract;
use crate::host::{HostError, PlayerRegistry, RegionRegistry};

/// The two independently scheduled jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Online player positions.
    Player,
    /// Loaded region activity.
    Region,
}

impl JobKind {
    /// Both jobs, in scheduling order.
    pub const ALL: [Self; 2] = [Self::Player, Self::Region];

    /// Noun used in log lines.
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Region => "landblock",
        }
    }
}

impl core::fmt::Display for JobKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Player => "player",
            Self::Region => "region",
        };
        f.write_str(name)
    }
}

/// What a single poll cycle did.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The batch was written.
    Exported {
        /// Entity accounting.
        batch: BatchReport,
        /// Where and how much was written.
        export: ExportReport,
    },
    /// The batch was assembled but could not be written. The previous
    /// file, if any, is unchanged.
    ExportFailed {
        /// Entity accounting.
        batch: BatchReport,
        /// Why the write was skipped.
        error: ExportError,
    },
    /// The registry could not be enumerated; nothing was written.
    EnumerationFailed {
        /// The host error.
        error: HostError,
    },
}

/// A pollable snapshot job.
///
/// Implementations must not panic on host failures; the scheduler catches
/// panics anyway but treats them as bugs.
pub trait SnapshotJob: Send + Sync {
    /// Which job this is; selects its settings.
    fn kind(&self) -> JobKind;

    /// Run one poll against `config`.
    fn run_cycle(&self, config: &SnapshotConfig) -> CycleOutcome;
}

/// Exports online players.
pub struct PlayerJob {
    registry: Arc<dyn PlayerRegistry>,
}

impl PlayerJob {
    /// Create a player job over `registry`.
    pub const fn new(registry: Arc<dyn PlayerRegistry>) -> Self {
        Self { registry }
    }
}

impl SnapshotJob for PlayerJob {
    fn kind(&self) -> JobKind {
        JobKind::Player
    }

    fn run_cycle(&self, config: &SnapshotConfig) -> CycleOutcome {
        let settings = config.job(JobKind::Player);
        let verbose = config.enable_logging;

        let players = match self.registry.online_players() {
            Ok(players) => players,
            Err(error) => return enumeration_failed(settings, verbose, error),
        };
        if verbose {
            info!(count = players.len(), "Player scan detected online players");
        }

        let batch = batch::assemble(
            JobKind::Player,
            players.as_slice(),
            settings.max_records,
            verbose,
            |player| extract::extract_player(player.as_ref()),
        );
        if verbose {
            info!(
                skipped = batch.report.filtered,
                "Player scan skipped players indoors or in dungeons"
            );
        }

        publish(settings, verbose, &batch)
    }
}

/// Exports loaded regions.
pub struct RegionJob {
    registry: Arc<dyn RegionRegistry>,
}

impl RegionJob {
    /// Create a region job over `registry`.
    pub const fn new(registry: Arc<dyn RegionRegistry>) -> Self {
        Self { registry }
    }
}

impl SnapshotJob for RegionJob {
    fn kind(&self) -> JobKind {
        JobKind::Region
    }

    fn run_cycle(&self, config: &SnapshotConfig) -> CycleOutcome {
        let settings = config.job(JobKind::Region);
        let verbose = config.enable_logging;

        let regions = match self.registry.loaded_regions() {
            Ok(regions) => regions,
            Err(error) => return enumeration_failed(settings, verbose, error),
        };
        if verbose {
            info!(count = regions.len(), "Landblock scan detected loaded landblocks");
        }

        let batch = batch::assemble(
            JobKind::Region,
            regions.as_slice(),
            settings.max_records,
            verbose,
            |region| extract::extract_region(region.as_ref()).map(Some),
        );

        publish(settings, verbose, &batch)
    }
}

fn enumeration_failed(settings: JobSettings<'_>, verbose: bool, error: HostError) -> CycleOutcome {
    if verbose {
        warn!(job = %settings.kind, %error, "Error during scan, skipping cycle");
    }
    CycleOutcome::EnumerationFailed { error }
}

/// Resolve the output path and write the batch, logging per the taxonomy:
/// a missing directory is always reported, other failures only when
/// verbose logging is on.
fn publish<R: Serialize>(settings: JobSettings<'_>, verbose: bool, batch: &Batch<R>) -> CycleOutcome {
    let report = batch.report;
    if verbose {
        info!(
            job = %settings.kind,
            seen = report.seen,
            produced = report.produced,
            filtered = report.filtered,
            failed = report.failed,
            truncated = report.truncated,
            "Batch assembled"
        );
    }

    let result = export::resolve_output_path(settings.output_path, settings.output_file)
        .and_then(|path| export::write_records(&path, &batch.records));

    match result {
        Ok(export) => {
            if verbose {
                info!(
                    job = %settings.kind,
                    records = export.records,
                    path = %export.path.display(),
                    "Exported activity data for {} {}s",
                    export.records,
                    settings.kind.noun()
                );
            }
            CycleOutcome::Exported {
                batch: report,
                export,
            }
        }
        Err(error) => {
            if matches!(error, ExportError::MissingDirectory { .. }) {
                error!(
                    job = %settings.kind,
                    %error,
                    "Cannot export data; update the configured output path to an existing directory"
                );
            } else if verbose {
                error!(job = %settings.kind, %error, "Error exporting {} data", settings.kind.noun());
            }
            CycleOutcome::ExportFailed {
                batch: report,
                error,
            }
        }
    }
}
