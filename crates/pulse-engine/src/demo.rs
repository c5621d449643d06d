//! In-memory demo world standing in for a live host.
//!
//! Players wander across the overworld and occasionally step indoors,
//! where they have no map position. Landblocks keep their ids but their
//! occupancy and dormancy drift between polls. Both lists sit behind
//! `RwLock`s so the wander task can mutate them while a snapshot job
//! enumerates. A poisoned lock still holds usable data and is recovered.

use std::sync::{PoisonError, RwLock};

use pulse_core::host::{
    HostError, PlayerHandle, PlayerRegistry, RegionHandle, RegionRegistry, StaticPlayer,
    StaticRegion,
};
use pulse_types::MapCoord;
use rand::Rng;
use tracing::debug;

/// Westmost / southmost overworld coordinate.
const MAP_MIN: f64 = -101.9;
/// Eastmost / northmost overworld coordinate.
const MAP_MAX: f64 = 102.0;
/// Largest step a player takes per wander on either axis.
const STEP: f64 = 0.8;
/// Chance per wander that a player crosses an indoor threshold.
const DOOR_CHANCE: f64 = 0.08;
/// Chance per wander that a landblock flips its dormant flag.
const DORMANCY_CHANCE: f64 = 0.05;

const NAME_POOL: &[&str] = &[
    "Asheron", "Bael'Zharon", "Elysa", "Gaerlan", "Martine", "Ilservian", "Thorsten", "Varicci",
    "Borelean", "Leikotha", "Tirethas", "Ulgrim", "Yanshi", "Kemeroi", "Aerfalle", "Nuhmudira",
];

/// Demo host world.
#[derive(Debug)]
pub struct DemoWorld {
    players: RwLock<Vec<StaticPlayer>>,
    regions: RwLock<Vec<StaticRegion>>,
}

impl DemoWorld {
    /// Populate a world with `players` characters and `regions` loaded
    /// landblocks.
    pub fn generate(rng: &mut impl Rng, players: usize, regions: usize) -> Self {
        let players = NAME_POOL
            .iter()
            .cycle()
            .take(players)
            .enumerate()
            .map(|(index, name)| random_player(rng, &format!("{name} {index}")))
            .collect();
        let regions = (0..regions).map(|_| random_region(rng)).collect();

        Self {
            players: RwLock::new(players),
            regions: RwLock::new(regions),
        }
    }

    /// Advance the world one step: move players, open and close doors,
    /// shuffle landblock occupancy.
    pub fn wander(&self, rng: &mut impl Rng) {
        let mut players = self.players.write().unwrap_or_else(PoisonError::into_inner);
        let mut indoors = 0_usize;
        for player in players.iter_mut() {
            step_player(rng, player);
            if player.coords.is_none() {
                indoors = indoors.saturating_add(1);
            }
        }
        drop(players);

        let mut regions = self.regions.write().unwrap_or_else(PoisonError::into_inner);
        for region in regions.iter_mut() {
            if rng.random_bool(DORMANCY_CHANCE) {
                region.dormant = !region.dormant;
            }
            region.players = if region.dormant { 0 } else { rng.random_range(0..=6) };
            region.creatures = rng.random_range(0..=40);
        }
        debug!(indoors, regions = regions.len(), "Demo world advanced");
    }
}

impl PlayerRegistry for DemoWorld {
    fn online_players(&self) -> Result<Vec<Box<dyn PlayerHandle>>, HostError> {
        let players = self.players.read().unwrap_or_else(PoisonError::into_inner);
        Ok(players
            .iter()
            .map(|player| Box::new(player.clone()) as Box<dyn PlayerHandle>)
            .collect())
    }
}

impl RegionRegistry for DemoWorld {
    fn loaded_regions(&self) -> Result<Vec<Box<dyn RegionHandle>>, HostError> {
        let regions = self.regions.read().unwrap_or_else(PoisonError::into_inner);
        Ok(regions
            .iter()
            .map(|region| Box::new(region.clone()) as Box<dyn RegionHandle>)
            .collect())
    }
}

fn random_coord(rng: &mut impl Rng) -> MapCoord {
    MapCoord::new(rng.random_range(MAP_MIN..=MAP_MAX), rng.random_range(MAP_MIN..=MAP_MAX))
}

fn random_player(rng: &mut impl Rng, name: &str) -> StaticPlayer {
    let coords = (!rng.random_bool(DOOR_CHANCE)).then(|| random_coord(rng));
    StaticPlayer {
        name: Some(name.to_owned()),
        level: Some(rng.random_range(1..=275)),
        heritage_id: rng.random_range(1..=13),
        coords,
        loc: coords.map(|c| format!("{:.1} {:.1}", c.x, c.y)),
    }
}

fn random_region(rng: &mut impl Rng) -> StaticRegion {
    let [x, y] = [rng.random::<u8>(), rng.random::<u8>()];
    StaticRegion {
        id: u32::from_be_bytes([x, y, 0xFF, 0xFF]),
        dormant: rng.random_bool(0.2),
        permaload: rng.random_bool(0.1),
        is_dungeon: rng.random_bool(0.1),
        has_dungeon: rng.random_bool(0.25),
        players: 0,
        creatures: rng.random_range(0..=40),
    }
}

fn step_player(rng: &mut impl Rng, player: &mut StaticPlayer) {
    if rng.random_bool(DOOR_CHANCE) {
        player.coords = match player.coords {
            Some(_) => None,
            None => Some(random_coord(rng)),
        };
    } else if let Some(coords) = player.coords {
        let x = (coords.x + rng.random_range(-STEP..=STEP)).clamp(MAP_MIN, MAP_MAX);
        let y = (coords.y + rng.random_range(-STEP..=STEP)).clamp(MAP_MIN, MAP_MAX);
        player.coords = Some(MapCoord::new(x, y));
    }
    player.loc = player.coords.map(|c| format!("{:.1} {:.1}", c.x, c.y));
}
