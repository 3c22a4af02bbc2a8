// Population regulators: density floors for natural kinds.
//
// Each `PopulationRegulator` watches one kind, optionally pooled with the
// other growth stages of the same organism (a seed regulator counts the
// small, medium and large trees too). When its throttle interval has
// passed and the pooled count is below `round(min_fraction × world_area)`,
// it spawns one default instance of its kind at a random spot that matches
// the kind's position criteria and overlaps nothing.
//
// The throttle only restarts after a successful spawn, so a starved pool is
// topped up by one entity per interval, and a pool at or above its floor is
// re-checked every tick. Regulators never remove anything; the floor is not
// a cap.
//
// The regulator set is the ordered list from `GameConfig::regulators`,
// run once per tick before any lifecycle update.
//
// See also: `config.rs` for `RegulatorConfig` and `default_regulators()`,
// `placement.rs` for the retry loop, `sim.rs` for the call site.

use crate::config::{GameConfig, RegulatorConfig};
use crate::entity::NewEntity;
use crate::event::{SimEvent, SimEventKind, SpawnCause};
use crate::lifecycle::Ecosystem;
use crate::placement::find_placement;
use crate::spatial::Body;
use crate::types::{EntityId, Kind, Point};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationRegulator {
    /// Kind spawned when the pool runs low.
    pub kind: Kind,
    /// Other kinds counted toward the same pool.
    pub pooled_with: Vec<Kind>,
    pub min_fraction: f64,
    /// Seconds between spawns, scaled by the speed multiplier.
    pub interval: f64,
    /// Simulated seconds at the last successful spawn.
    pub last_refresh: f64,
}

impl PopulationRegulator {
    pub fn from_config(config: &RegulatorConfig, now: f64) -> Self {
        Self {
            kind: config.kind,
            pooled_with: config.pooled_with.clone(),
            min_fraction: config.min_fraction,
            interval: config.interval,
            last_refresh: now,
        }
    }

    /// Every kind counted by this regulator, its own first.
    pub fn pool(&self) -> impl Iterator<Item = Kind> + '_ {
        std::iter::once(self.kind).chain(self.pooled_with.iter().copied())
    }

    /// Minimum pooled population for a world of `world_area` tiles.
    pub fn floor(&self, world_area: f64) -> usize {
        (self.min_fraction * world_area).round_ties_even() as usize
    }

    pub fn pooled_count(&self, eco: &Ecosystem<'_>) -> usize {
        self.pool().map(|k| eco.entities.count_of(k)).sum()
    }

    /// Run one throttled check. Returns the id of the spawned entity, if
    /// any.
    pub fn regulate(&mut self, eco: &mut Ecosystem<'_>) -> Option<EntityId> {
        if (eco.now - self.last_refresh) * eco.config.speed_multiplier < self.interval {
            return None;
        }
        let floor = self.floor(eco.config.world_area());
        if self.pooled_count(eco) >= floor {
            return None;
        }
        let species = eco.config.species_of(self.kind)?;

        let torus = *eco.entities.spatial().torus();
        let planet = eco.planet;
        let entities = &*eco.entities;
        let size = species.initial_size();
        let kind = self.kind;
        let found = find_placement(
            eco.rng,
            eco.config.max_placement_attempts,
            |rng| {
                Point::new(
                    rng.range_f64(0.0, torus.width),
                    rng.range_f64(0.0, torus.height),
                )
            },
            |p| {
                let probe = Body {
                    x: p.x,
                    y: p.y,
                    size,
                    kind,
                    collides: species.collides,
                };
                species
                    .position_criteria
                    .accepts(planet.tile_at(p).is_water)
                    && !entities.would_collide(&probe, None)
            },
        );
        let position = match found {
            Ok(p) => p,
            Err(err) => {
                debug!(%kind, %err, "regulator spawn abandoned");
                return None;
            }
        };

        let id = eco
            .entities
            .insert(NewEntity::of(kind, species, position), species, eco.now);
        eco.events.push(SimEvent {
            tick: eco.tick,
            kind: SimEventKind::Spawned {
                entity_id: id,
                kind,
                cause: SpawnCause::Regulator,
            },
        });
        self.last_refresh = eco.now;
        trace!(%kind, %id, floor, "regulator spawn");
        Some(id)
    }
}

/// Build the ordered regulator set from `config`.
pub fn regulators_from_config(config: &GameConfig, now: f64) -> Vec<PopulationRegulator> {
    config
        .regulators
        .iter()
        .map(|r| PopulationRegulator::from_config(r, now))
        .collect()
}

/// Run every regulator once, in order.
pub fn run_regulators(regulators: &mut [PopulationRegulator], eco: &mut Ecosystem<'_>) {
    for regulator in regulators {
        regulator.regulate(eco);
    }
}
