//! Per-entity extraction into exported records.
//!
//! Extractors return `Ok(Some(record))` for an exportable entity,
//! `Ok(None)` for an entity the selection rule filters out, and `Err` when
//! the host could not supply required data. The batch assembler turns
//! errors into skips so a single bad entity never aborts a poll.

use pulse_types::{
    Heritage, PlayerRecord, RegionRecord, RegionStatus, UNKNOWN_LABEL, format_lat, format_lon,
};

use crate::host::{HostError, PlayerHandle, RegionHandle};

/// Level reported when the host does not know one.
const DEFAULT_LEVEL: &str = "1";

/// Errors that can occur while extracting a single entity.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// A host accessor failed.
    #[error("{entity}: {source}")]
    Host {
        /// Label of the entity being extracted.
        entity: String,
        /// The underlying host error.
        source: HostError,
    },

    /// The host returned coordinates that cannot be formatted.
    #[error("{entity}: non-finite map coordinates ({x}, {y})")]
    NonFiniteCoordinate {
        /// Label of the entity being extracted.
        entity: String,
        /// East-west value as returned.
        x: f64,
        /// North-south value as returned.
        y: f64,
    },
}

/// Extract a player record.
///
/// Returns `Ok(None)` when the player has no overworld coordinates.
///
/// # Errors
///
/// Returns [`ExtractError`] if any host accessor fails or the
/// coordinates are not finite.
pub fn extract_player(player: &dyn PlayerHandle) -> Result<Option<PlayerRecord>, ExtractError> {
    let name = player
        .name()
        .map_err(|source| host_error("player", source))?
        .unwrap_or_else(|| UNKNOWN_LABEL.to_owned());
    let wrap = |source| ExtractError::Host {
        entity: format!("player {name}"),
        source,
    };

    let race = Heritage::label_for_id(player.heritage_id().map_err(wrap)?);
    let level = player
        .level()
        .map_err(wrap)?
        .map_or_else(|| DEFAULT_LEVEL.to_owned(), |level| level.to_string());

    let Some(coords) = player.map_coords().map_err(wrap)? else {
        return Ok(None);
    };
    if !coords.is_finite() {
        return Err(ExtractError::NonFiniteCoordinate {
            entity: format!("player {name}"),
            x: coords.x,
            y: coords.y,
        });
    }

    let loc = player.location_string().map_err(wrap)?;

    Ok(Some(PlayerRecord {
        race: race.to_owned(),
        level,
        x: format_lon(coords.x),
        y: format_lat(coords.y),
        loc,
        location_name: name,
    }))
}

/// Extract a region record. Every loaded region is exportable.
///
/// # Errors
///
/// Returns [`ExtractError::Host`] if any host accessor fails.
pub fn extract_region(region: &dyn RegionHandle) -> Result<RegionRecord, ExtractError> {
    let id = region
        .region_id()
        .map_err(|source| host_error("landblock", source))?;
    let wrap = |source| ExtractError::Host {
        entity: format!("landblock {id}"),
        source,
    };

    // Dormant is read first; it wins when both flags are set.
    let dormant = region.is_dormant().map_err(wrap)?;
    let permaload = region.is_permaload().map_err(wrap)?;

    Ok(RegionRecord {
        id: id.short_hex(),
        status: RegionStatus::from_flags(dormant, permaload),
        x: id.grid_x_hex(),
        y: id.grid_y_hex(),
        is_dungeon: region.is_dungeon().map_err(wrap)?,
        has_dungeon: region.has_dungeon().map_err(wrap)?,
        player_count: region.player_count().map_err(wrap)?,
        creature_count: region.creature_count().map_err(wrap)?,
    })
}

fn host_error(entity: &str, source: HostError) -> ExtractError {
    ExtractError::Host {
        entity: entity.to_owned(),
        source,
    }
}
