//! Region identifier wrapper.
//!
//! The host addresses every loaded region (landblock) by a raw 32-bit id.
//! The high byte is the grid X coordinate and the next byte the grid Y
//! coordinate; the low half selects a cell inside the block and is not part
//! of the exported identity.

use serde::{Deserialize, Serialize};

/// Raw 32-bit landblock identifier as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionId(pub u32);

impl RegionId {
    /// Return the raw id.
    pub const fn into_inner(self) -> u32 {
        self.0
    }

    /// Grid X coordinate (high byte).
    pub const fn grid_x(self) -> u8 {
        self.0.to_be_bytes()[0]
    }

    /// Grid Y coordinate (second byte).
    pub const fn grid_y(self) -> u8 {
        self.0.to_be_bytes()[1]
    }

    /// Exported identifier: `0x` followed by the first four hex digits of
    /// the uppercase display form, e.g. `0xA9B40021` becomes `"0xA9B4"`.
    pub fn short_hex(self) -> String {
        format!("0x{:02X}{:02X}", self.grid_x(), self.grid_y())
    }

    /// Grid X as two lowercase hex digits.
    pub fn grid_x_hex(self) -> String {
        format!("{:02x}", self.grid_x())
    }

    /// Grid Y as two lowercase hex digits.
    pub fn grid_y_hex(self) -> String {
        format!("{:02x}", self.grid_y())
    }
}

impl core::fmt::Display for RegionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

impl From<u32> for RegionId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}
