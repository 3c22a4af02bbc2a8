// Core types shared across the simulation.
//
// Defines entity handles (`EntityId`), the kind-id enum (`Kind`) that keys
// the species table, placement constraints (`PositionCriteria`), cosmetic
// draw layers (`ZLayer`), and the continuous `Point` used for positions.
//
// Every organism and object on the planet is identified by its `Kind`; all
// per-kind behavior lives in data (`species.rs`), never in per-kind code
// paths. Renderers use `Kind` as the asset key.
//
// See also: `species.rs` for the descriptor looked up by `Kind`,
// `collection.rs` for the arena that hands out `EntityId`s.
//
// **Critical constraint: determinism.** `EntityId`s are allocated from a
// monotonic counter in the collection, never from the clock or OS entropy.
// Everything here is `Ord` so it can key `BTreeMap`s.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Stable arena handle for an entity. Never reused within one simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Spatial
// ---------------------------------------------------------------------------

/// A continuous position on the planet surface, in tile units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// Kind-id of an entity. Keys the species table in `GameConfig`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Kind {
    // Minerals.
    LargeStone,
    MediumStone,
    SmallStone,
    // Fruit tree growth stages.
    SeedFruitTree,
    SmallFruitTree,
    MediumFruitTree,
    LargeFruitTree,
    // Pine tree growth stages.
    SeedPineTree,
    SmallPineTree,
    MediumPineTree,
    LargePineTree,
    // Coconut tree growth stages.
    SeedCocoTree,
    SmallCocoTree,
    MediumCocoTree,
    LargeCocoTree,
    // Water plants.
    SeedLily,
    Lily,
    // Remains and ground cover.
    Trunk,
    Corpse,
    Soil,
    // Animals.
    Beaver,
    Rat,
    SmallCritter,
    Tiger,
}

impl Kind {
    /// Every kind, in declaration order.
    pub const ALL: [Kind; 24] = [
        Kind::LargeStone,
        Kind::MediumStone,
        Kind::SmallStone,
        Kind::SeedFruitTree,
        Kind::SmallFruitTree,
        Kind::MediumFruitTree,
        Kind::LargeFruitTree,
        Kind::SeedPineTree,
        Kind::SmallPineTree,
        Kind::MediumPineTree,
        Kind::LargePineTree,
        Kind::SeedCocoTree,
        Kind::SmallCocoTree,
        Kind::MediumCocoTree,
        Kind::LargeCocoTree,
        Kind::SeedLily,
        Kind::Lily,
        Kind::Trunk,
        Kind::Corpse,
        Kind::Soil,
        Kind::Beaver,
        Kind::Rat,
        Kind::SmallCritter,
        Kind::Tiger,
    ];
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ---------------------------------------------------------------------------
// Placement and drawing
// ---------------------------------------------------------------------------

/// Terrain an entity may be placed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionCriteria {
    /// Dry tiles only.
    Ground,
    /// Water tiles only.
    Water,
    /// Any tile.
    Anywhere,
}

impl PositionCriteria {
    /// Whether a tile with the given water state satisfies this criterion.
    pub fn accepts(self, is_water: bool) -> bool {
        match self {
            PositionCriteria::Ground => !is_water,
            PositionCriteria::Water => is_water,
            PositionCriteria::Anywhere => true,
        }
    }
}

/// Cosmetic draw layer. The simulation never reads it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ZLayer {
    /// Flat ground cover drawn under everything else.
    Floor,
    OnFloor,
    Air,
}
