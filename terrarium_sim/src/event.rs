// Narrative events emitted by the simulation.
//
// `SimState::step()` returns every structural change it made during the
// step as a `SimEvent`: spawns, decays, phase transitions, births, growth,
// predation bites and view pans. Renderers and the headless runner read
// them; the simulation itself never does.
//
// Events are emitted in the order the changes happened, which within a tick
// is regulators first, then the bucket sweep, then the animal pass.
//
// See also: `sim.rs` for the tick loop, `lifecycle.rs` and `regulator.rs`
// for the emitters.

use crate::types::{EntityId, Kind};
use serde::{Deserialize, Serialize};

/// A narrative event stamped with the tick it happened on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub tick: u64,
    pub kind: SimEventKind,
}

/// Why an entity appeared without a parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnCause {
    /// A population regulator topped up its pool.
    Regulator,
    /// Left behind by a decaying entity.
    Byproduct,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimEventKind {
    Spawned {
        entity_id: EntityId,
        kind: Kind,
        cause: SpawnCause,
    },
    /// An entity was removed for good.
    Decayed { entity_id: EntityId, kind: Kind },
    /// A plant was replaced in place by its next growth stage.
    Transitioned {
        from_id: EntityId,
        from: Kind,
        to_id: EntityId,
        to: Kind,
    },
    /// A plant dropped a spore or an animal had offspring.
    Born {
        parent_id: EntityId,
        child_id: EntityId,
        kind: Kind,
    },
    Grew { entity_id: EntityId, size: f64 },
    /// One bite: prey integrity after the bite.
    Ate {
        predator_id: EntityId,
        prey_id: EntityId,
        prey_integrity: f64,
    },
    ViewPanned { x: u32, y: u32 },
}
