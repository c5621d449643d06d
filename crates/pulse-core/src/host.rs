//! Collaborator traits implemented by the host simulation.
//!
//! The exporter never owns world state. Each poll asks a registry for a
//! snapshot list of handles and reads them through the accessors below.
//! Every accessor is fallible: a handle may point at an entity that logged
//! out or unloaded between enumeration and extraction.
//!
//! [`StaticPlayer`], [`StaticRegion`], and [`StaticRegistry`] are fixed
//! in-memory implementations for tests and offline runs.

use std::sync::atomic::{AtomicU64, Ordering};

use pulse_types::{MapCoord, RegionId};

/// Errors reported by host collaborators.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HostError {
    /// Host data the accessor needs is not present.
    #[error("host data unavailable: {what}")]
    Unavailable {
        /// Which piece of data was missing.
        what: String,
    },

    /// The host failed internally.
    #[error("host error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

/// A live player as seen through the host.
pub trait PlayerHandle: Send + Sync {
    /// Display name, if the host has one.
    fn name(&self) -> Result<Option<String>, HostError>;

    /// Character level, if known.
    fn level(&self) -> Result<Option<u32>, HostError>;

    /// Raw heritage-group id.
    fn heritage_id(&self) -> Result<u8, HostError>;

    /// Planar map coordinates, or `None` when the player is indoors or in
    /// an instanced dungeon.
    fn map_coords(&self) -> Result<Option<MapCoord>, HostError>;

    /// Precise host location string, if available.
    fn location_string(&self) -> Result<Option<String>, HostError>;
}

/// A loaded region as seen through the host.
pub trait RegionHandle: Send + Sync {
    /// Raw landblock id.
    fn region_id(&self) -> Result<RegionId, HostError>;

    /// Host has marked the region dormant.
    fn is_dormant(&self) -> Result<bool, HostError>;

    /// Host keeps the region permanently loaded.
    fn is_permaload(&self) -> Result<bool, HostError>;

    /// The region is itself a dungeon.
    fn is_dungeon(&self) -> Result<bool, HostError>;

    /// The region contains a dungeon.
    fn has_dungeon(&self) -> Result<bool, HostError>;

    /// Players currently inside.
    fn player_count(&self) -> Result<u32, HostError>;

    /// Creatures currently inside.
    fn creature_count(&self) -> Result<u32, HostError>;
}

/// Enumerates online players.
pub trait PlayerRegistry: Send + Sync {
    /// Snapshot of all online players, in host order.
    fn online_players(&self) -> Result<Vec<Box<dyn PlayerHandle>>, HostError>;
}

/// Enumerates loaded regions.
pub trait RegionRegistry: Send + Sync {
    /// Snapshot of all loaded regions, in host order.
    fn loaded_regions(&self) -> Result<Vec<Box<dyn RegionHandle>>, HostError>;
}

// ---------------------------------------------------------------------------
// Static stubs
// ---------------------------------------------------------------------------

/// Fixed player data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticPlayer {
    /// Display name.
    pub name: Option<String>,
    /// Level.
    pub level: Option<u32>,
    /// Raw heritage id.
    pub heritage_id: u8,
    /// Overworld coordinates, `None` for indoors.
    pub coords: Option<MapCoord>,
    /// Precise location string.
    pub loc: Option<String>,
}

impl StaticPlayer {
    /// A named overworld player with default level and heritage.
    pub fn outdoors(name: &str, x: f64, y: f64) -> Self {
        Self {
            name: Some(name.to_owned()),
            level: Some(1),
            heritage_id: 1,
            coords: Some(MapCoord::new(x, y)),
            loc: None,
        }
    }

    /// A named player with no overworld position.
    pub fn indoors(name: &str) -> Self {
        Self {
            name: Some(name.to_owned()),
            level: Some(1),
            heritage_id: 1,
            coords: None,
            loc: None,
        }
    }
}

impl PlayerHandle for StaticPlayer {
    fn name(&self) -> Result<Option<String>, HostError> {
        Ok(self.name.clone())
    }

    fn level(&self) -> Result<Option<u32>, HostError> {
        Ok(self.level)
    }

    fn heritage_id(&self) -> Result<u8, HostError> {
        Ok(self.heritage_id)
    }

    fn map_coords(&self) -> Result<Option<MapCoord>, HostError> {
        Ok(self.coords)
    }

    fn location_string(&self) -> Result<Option<String>, HostError> {
        Ok(self.loc.clone())
    }
}

/// Fixed region data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticRegion {
    /// Raw landblock id.
    pub id: u32,
    /// Dormant flag.
    pub dormant: bool,
    /// Permaload flag.
    pub permaload: bool,
    /// Is a dungeon.
    pub is_dungeon: bool,
    /// Has a dungeon.
    pub has_dungeon: bool,
    /// Players inside.
    pub players: u32,
    /// Creatures inside.
    pub creatures: u32,
}

impl RegionHandle for StaticRegion {
    fn region_id(&self) -> Result<RegionId, HostError> {
        Ok(RegionId(self.id))
    }

    fn is_dormant(&self) -> Result<bool, HostError> {
        Ok(self.dormant)
    }

    fn is_permaload(&self) -> Result<bool, HostError> {
        Ok(self.permaload)
    }

    fn is_dungeon(&self) -> Result<bool, HostError> {
        Ok(self.is_dungeon)
    }

    fn has_dungeon(&self) -> Result<bool, HostError> {
        Ok(self.has_dungeon)
    }

    fn player_count(&self) -> Result<u32, HostError> {
        Ok(self.players)
    }

    fn creature_count(&self) -> Result<u32, HostError> {
        Ok(self.creatures)
    }
}

/// Registry over a fixed list of entities. Counts how often it has been
/// enumerated so tests can observe scheduling.
#[derive(Debug, Default)]
pub struct StaticRegistry<T> {
    entities: Vec<T>,
    enumerations: AtomicU64,
}

impl<T> StaticRegistry<T> {
    /// Create a registry over `entities`, enumerated in the given order.
    pub const fn new(entities: Vec<T>) -> Self {
        Self {
            entities,
            enumerations: AtomicU64::new(0),
        }
    }

    /// Number of times the registry has been enumerated.
    pub fn enumerations(&self) -> u64 {
        self.enumerations.load(Ordering::Acquire)
    }

    fn snapshot<H: ?Sized>(&self, boxed: impl Fn(&T) -> Box<H>) -> Vec<Box<H>> {
        self.enumerations.fetch_add(1, Ordering::AcqRel);
        self.entities.iter().map(boxed).collect()
    }
}

impl<T> PlayerRegistry for StaticRegistry<T>
where
    T: PlayerHandle + Clone + 'static,
{
    fn online_players(&self) -> Result<Vec<Box<dyn PlayerHandle>>, HostError> {
        Ok(self.snapshot(|player| Box::new(player.clone()) as Box<dyn PlayerHandle>))
    }
}

impl<T> RegionRegistry for StaticRegistry<T>
where
    T: RegionHandle + Clone + 'static,
{
    fn loaded_regions(&self) -> Result<Vec<Box<dyn RegionHandle>>, HostError> {
        Ok(self.snapshot(|region| Box::new(region.clone()) as Box<dyn RegionHandle>))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn static_registry_preserves_order_and_counts_enumerations() {
        let registry = StaticRegistry::new(vec![
            StaticPlayer::outdoors("First", 1.0, 1.0),
            StaticPlayer::indoors("Second"),
        ]);
        assert_eq!(registry.enumerations(), 0);

        let players = registry.online_players().unwrap();
        let names: Vec<_> = players
            .iter()
            .map(|p| p.name().unwrap().unwrap_or_default())
            .collect();
        assert_eq!(names, ["First", "Second"]);
        assert_eq!(registry.enumerations(), 1);
    }

    #[test]
    fn static_region_reports_raw_id() {
        let region = StaticRegion {
            id: 0x1234_0000,
            ..StaticRegion::default()
        };
        assert_eq!(region.region_id().unwrap(), RegionId(0x1234_0000));
    }
}
