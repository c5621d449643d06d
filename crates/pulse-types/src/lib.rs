//! Shared type definitions for the Pulse snapshot exporter.
//!
//! This crate is the single source of truth for the JSON documents that the
//! exporter publishes. The field names and casing of every record here are a
//! compatibility contract with the downstream map viewer and must not change.
//!
//! # Modules
//!
//! - [`ids`] -- Region identifier wrapper and its hex projections
//! - [`enums`] -- Region status and the closed heritage label table
//! - [`coords`] -- Map coordinates and compass-suffixed axis formatting
//! - [`records`] -- `PlayerRecord` and `RegionRecord`, one per exported entity

pub mod coords;
pub mod enums;
pub mod ids;
pub mod records;

// Re-export all public types at crate root for convenience.
pub use coords::{MapCoord, format_lat, format_lon};
pub use enums::{Heritage, RegionStatus, UNKNOWN_LABEL};
pub use ids::RegionId;
pub use records::{PlayerRecord, RegionRecord};
