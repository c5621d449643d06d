//! Enumeration types for exported records.
//!
//! [`Heritage`] mirrors the host's closed heritage-group enumeration and
//! carries the static label table used by the player extractor.
//! [`RegionStatus`] is the mutually exclusive activity state of a loaded
//! region.

use serde::{Deserialize, Serialize};

/// Label emitted for any value the closed tables do not map.
pub const UNKNOWN_LABEL: &str = "Unknown";

// ---------------------------------------------------------------------------
// Heritage
// ---------------------------------------------------------------------------

/// Heritage group of a player character, keyed by the host's numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Heritage {
    /// Id 1.
    Aluvian,
    /// Id 2.
    Gharundim,
    /// Id 3.
    Sho,
    /// Id 4.
    Viamontian,
    /// Id 5.
    Shadowbound,
    /// Id 6.
    Gearknight,
    /// Id 7.
    Tumerok,
    /// Id 8.
    Lugian,
    /// Id 9.
    Empyrean,
    /// Id 10.
    Penumbraen,
    /// Id 11.
    Undead,
    /// Id 12.
    Olthoi,
    /// Id 13. Shares the "Olthoi" label.
    OlthoiAcid,
}

/// Host heritage id to variant. Ids absent from this table are unmapped.
const HERITAGE_TABLE: [(u8, Heritage); 13] = [
    (1, Heritage::Aluvian),
    (2, Heritage::Gharundim),
    (3, Heritage::Sho),
    (4, Heritage::Viamontian),
    (5, Heritage::Shadowbound),
    (6, Heritage::Gearknight),
    (7, Heritage::Tumerok),
    (8, Heritage::Lugian),
    (9, Heritage::Empyrean),
    (10, Heritage::Penumbraen),
    (11, Heritage::Undead),
    (12, Heritage::Olthoi),
    (13, Heritage::OlthoiAcid),
];

impl Heritage {
    /// Look up a heritage by the host's numeric id.
    ///
    /// Returns `None` for 0 (the host's "invalid" group) and for any id the
    /// table does not list.
    pub fn from_id(id: u8) -> Option<Self> {
        HERITAGE_TABLE
            .iter()
            .find(|(raw, _)| *raw == id)
            .map(|(_, heritage)| *heritage)
    }

    /// Display label written to the `Race` field.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Aluvian => "Aluvian",
            Self::Gharundim => "Gharu'ndim",
            Self::Sho => "Sho",
            Self::Viamontian => "Viamontian",
            Self::Shadowbound => "Shadowbound",
            Self::Gearknight => "Gearknight",
            Self::Tumerok => "Tumerok",
            Self::Lugian => "Lugian",
            Self::Empyrean => "Empyrean",
            Self::Penumbraen => "Penumbraen",
            Self::Undead => "Undead",
            Self::Olthoi | Self::OlthoiAcid => "Olthoi",
        }
    }

    /// Label for a raw host id, falling back to [`UNKNOWN_LABEL`].
    pub fn label_for_id(id: u8) -> &'static str {
        Self::from_id(id).map_or(UNKNOWN_LABEL, Self::label)
    }
}

// ---------------------------------------------------------------------------
// Region status
// ---------------------------------------------------------------------------

/// Activity state of a loaded region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionStatus {
    /// Loaded and ticking.
    Active,
    /// Loaded but idle; the host has stopped ticking it.
    Dormant,
    /// Pinned in memory by the host regardless of activity.
    Permaload,
}

impl RegionStatus {
    /// Derive the status from the host's flags.
    ///
    /// Dormant wins over permaload when both are set.
    pub const fn from_flags(dormant: bool, permaload: bool) -> Self {
        if dormant {
            Self::Dormant
        } else if permaload {
            Self::Permaload
        } else {
            Self::Active
        }
    }
}

impl core::fmt::Display for RegionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Active => "Active",
            Self::Dormant => "Dormant",
            Self::Permaload => "Permaload",
        };
        f.write_str(name)
    }
}
