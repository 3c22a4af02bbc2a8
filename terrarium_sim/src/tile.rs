// Per-cell terrain sample.
//
// A `Tile` is written only during terrain generation (`terrain.rs`) and read
// by lifecycle checks at runtime (plant growth gates, placement criteria).
// `needs_redraw` is the renderer-facing dirty flag; the simulation only sets
// it, consumers clear it through `Planet::take_dirty_tiles`.

use serde::{Deserialize, Serialize};

/// Terrain at one integer grid position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub altitude: i32,
    pub temperature: i32,
    /// Moisture proxy in [0, 1]. Water tiles are exactly 1.
    pub saturation: f64,
    /// `altitude < water_threshold_altitude`, refreshed after every
    /// altitude change.
    pub is_water: bool,
    pub needs_redraw: bool,
}

impl Default for Tile {
    fn default() -> Self {
        Self {
            altitude: 0,
            temperature: 15,
            saturation: 0.0,
            is_water: false,
            needs_redraw: true,
        }
    }
}

impl Tile {
    /// Set the altitude and reclassify against the water threshold.
    pub fn set_altitude(&mut self, altitude: i32, water_threshold: i32) {
        self.altitude = altitude;
        self.is_water = altitude < water_threshold;
    }
}
