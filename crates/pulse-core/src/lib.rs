//! Snapshot scheduling and export pipeline for the Pulse exporter.
//!
//! Two independent polling jobs sample the host simulation and publish
//! JSON arrays for an external map viewer:
//!
//! - the **player job** writes one record per online player standing on
//!   the overworld,
//! - the **region job** writes one record per loaded landblock.
//!
//! Each poll enumerates its registry, extracts a record per entity
//! (skipping entities that fail or have no overworld position), caps the
//! batch at the configured size, and replaces the output file in full.
//!
//! # Modules
//!
//! - [`config`] -- Hot-reloadable settings loaded from JSON or YAML.
//! - [`host`] -- Collaborator traits the host simulation implements, plus
//!   static stubs for tests.
//! - [`extract`] -- Per-entity extraction into exported records.
//! - [`batch`] -- Ordered batch assembly with capacity truncation.
//! - [`export`] -- Output path resolution and atomic JSON file writes.
//! - [`job`] -- [`SnapshotJob`] trait and the player/region jobs.
//! - [`scheduler`] -- Timer lifecycle: start, stop, and reload.
//!
//! [`SnapshotJob`]: job::SnapshotJob

pub mod batch;
pub mod config;
pub mod export;
pub mod extract;
pub mod host;
pub mod job;
pub mod scheduler;

pub use config::{ConfigError, JobSettings, RecordLimit, SnapshotConfig};
pub use job::{CycleOutcome, JobKind, PlayerJob, RegionJob, SnapshotJob};
pub use scheduler::{Scheduler, SchedulerError};
