// Entity lifecycle: decay, phase transition, reproduction, growth,
// foraging, predation and metabolism.
//
// One generic state machine serves every kind. Kind-specific numbers come
// from the species table; the only branching is on `Behavior` (mineral,
// plant, animal).
//
//   Alive ──age ≥ decay_time or integrity ≤ 0──► Decaying ──► Removed
//     │                                             ▲
//     └──(plant, age ≥ decay_time)──► PhaseTransition ──gate unmet──┘
//                                         │
//                                         └──gate met──► replaced by next stage
//
// All operations run on an `Ecosystem`, a borrowed per-tick view of the
// simulation: config and terrain are read-only, the entity collection and
// RNG are mutable, and every structural change is pushed onto `events`.
// `SimState` builds one for each tick phase (see `sim.rs`).
//
// Every operation takes an `EntityId` and first re-fetches the entity. An
// id may have been removed earlier in the same tick (eaten, decayed as a
// byproduct neighbor), in which case the operation is a no-op.
//
// Placement for byproducts and offspring goes through
// `placement::find_placement`. Exhaustion abandons only that sub-operation;
// a parent still resets its reproduction timer.
//
// See also: `collection.rs` for the only mutation entry points,
// `species.rs` for the parameters read here, `physics.rs` for steering and
// movement, `sim.rs` for the tick phases that call into this module.
//
// **Critical constraint: determinism.** The RNG is consumed in a fixed
// order per operation. Callers must visit entities in a deterministic order
// (bucket order, then id order).

use crate::collection::EntityCollection;
use crate::config::GameConfig;
use crate::entity::NewEntity;
use crate::event::{SimEvent, SimEventKind, SpawnCause};
use crate::physics::{Torus, advance, bearing};
use crate::placement::find_placement;
use crate::planet::Planet;
use crate::prng::GameRng;
use crate::spatial::Body;
use crate::species::{AnimalData, Behavior, SpeciesData};
use crate::types::{EntityId, Kind, Point, PositionCriteria};
use std::f64::consts::PI;
use tracing::{debug, trace};

/// Borrowed view of the simulation for one tick phase.
pub struct Ecosystem<'a> {
    pub config: &'a GameConfig,
    pub planet: &'a Planet,
    pub entities: &'a mut EntityCollection,
    pub rng: &'a mut GameRng,
    pub tick: u64,
    /// Simulated seconds.
    pub now: f64,
    pub events: &'a mut Vec<SimEvent>,
}

/// Uniform point in the square `center ± half`, wrapped onto the torus.
fn sample_around(torus: &Torus, rng: &mut GameRng, center: Point, half: f64) -> Point {
    let x = center.x + rng.range_f64(-half, half);
    let y = center.y + rng.range_f64(-half, half);
    torus.wrap(Point::new(x, y))
}

impl<'a> Ecosystem<'a> {
    fn species(&self, kind: Kind) -> Option<&'a SpeciesData> {
        self.config.species.get(&kind)
    }

    fn animal_data(&self, kind: Kind) -> Option<&'a AnimalData> {
        self.species(kind).and_then(|s| s.animal())
    }

    fn emit(&mut self, kind: SimEventKind) {
        self.events.push(SimEvent {
            tick: self.tick,
            kind,
        });
    }

    fn torus(&self) -> Torus {
        *self.entities.spatial().torus()
    }

    /// Whether the tile under `p` satisfies `criteria`.
    pub fn terrain_accepts(&self, criteria: PositionCriteria, p: Point) -> bool {
        criteria.accepts(self.planet.tile_at(p).is_water)
    }

    /// Search for a spot near `center` where a body of `kind`/`size` fits
    /// without overlap (and on matching terrain when `criteria` is set).
    fn place_near(
        &mut self,
        center: Point,
        half: f64,
        kind: Kind,
        size: f64,
        collides: bool,
        criteria: Option<PositionCriteria>,
    ) -> Option<Point> {
        let torus = self.torus();
        let planet = self.planet;
        let entities = &*self.entities;
        let result = find_placement(
            self.rng,
            self.config.max_placement_attempts,
            |rng| sample_around(&torus, rng, center, half),
            |p| {
                let probe = Body {
                    x: p.x,
                    y: p.y,
                    size,
                    kind,
                    collides,
                };
                criteria.is_none_or(|c| c.accepts(planet.tile_at(p).is_water))
                    && !entities.would_collide(&probe, None)
            },
        );
        match result {
            Ok(p) => Some(p),
            Err(err) => {
                debug!(%kind, %err, "placement abandoned");
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Decay and phase transition
    // -----------------------------------------------------------------------

    /// Whether `id` has reached the end of its life: integrity exhausted, or
    /// scaled age at least its species' decay time (never for immortals).
    pub fn is_decay_eligible(&self, id: EntityId) -> bool {
        let Some(entity) = self.entities.get(id) else {
            return false;
        };
        if entity.integrity <= 0.0 {
            return true;
        }
        let Some(species) = self.species(entity.kind()) else {
            return false;
        };
        !species.is_immortal()
            && entity.age(self.now, self.config.speed_multiplier) >= species.decay_time
    }

    /// Remove `id` and scatter its byproducts within its footprint.
    /// Returns false if the entity was already gone.
    pub fn decay(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.entities.remove(id) else {
            return false;
        };
        debug!(%id, kind = %entity.kind(), "decayed");
        self.emit(SimEventKind::Decayed {
            entity_id: id,
            kind: entity.kind(),
        });

        let Some(species) = self.species(entity.kind()) else {
            return true;
        };
        for &product in &species.decay_products {
            let Some(product_data) = self.species(product) else {
                continue;
            };
            let size = if product_data.keep_previous_size {
                entity.size()
            } else {
                product_data.initial_size()
            };
            let Some(p) = self.place_near(
                entity.position(),
                entity.radius(),
                product,
                size,
                product_data.collides,
                None,
            ) else {
                continue;
            };
            let mut new = NewEntity::of(product, product_data, p).with_size(size);
            if product_data.keep_previous_sprite {
                new = new.with_sprite_variant(entity.sprite_variant());
            }
            let child = self.entities.insert(new, product_data, self.now);
            self.emit(SimEventKind::Spawned {
                entity_id: child,
                kind: product,
                cause: SpawnCause::Byproduct,
            });
        }
        true
    }

    /// Replace a plant in place by its next growth stage, or decay it when
    /// there is no next stage, the tile under it fails the moisture or
    /// temperature gate, or the next stage cannot live on that terrain.
    /// Returns true only for a transition.
    pub fn phase_transition_or_decay(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.entities.get(id) else {
            return false;
        };
        let (kind, position) = (entity.kind(), entity.position());

        let next = self
            .species(kind)
            .and_then(|s| s.plant())
            .and_then(|plant| {
                let tile = self.planet.tile_at(position);
                let gate = tile.saturation >= plant.min_saturation
                    && plant.min_temperature.is_none_or(|t| tile.temperature >= t);
                if !gate {
                    return None;
                }
                let next_kind = plant.next_stage?;
                let next = self.species(next_kind)?;
                next.position_criteria
                    .accepts(tile.is_water)
                    .then_some((next_kind, next))
            });

        let Some((next_kind, next)) = next else {
            self.decay(id);
            return false;
        };
        let Some(old) = self.entities.remove(id) else {
            return false;
        };
        let size = if next.keep_previous_size {
            old.size()
        } else {
            next.initial_size()
        };
        let mut new = NewEntity::of(next_kind, next, position)
            .with_size(size)
            .with_angle(old.angle());
        if next.keep_previous_sprite {
            new = new.with_sprite_variant(old.sprite_variant());
        }
        let new_id = self.entities.insert(new, next, self.now);
        debug!(from = %kind, to = %next_kind, %new_id, "phase transition");
        self.emit(SimEventKind::Transitioned {
            from_id: id,
            from: kind,
            to_id: new_id,
            to: next_kind,
        });
        true
    }

    // -----------------------------------------------------------------------
    // Reproduction and growth
    // -----------------------------------------------------------------------

    /// Drop one spore (plants) or offspring (animals) near the parent once
    /// the reproduction interval has elapsed. The timer restarts whether or
    /// not a spot was found. Returns true if a child was placed.
    pub fn try_reproduce(&mut self, id: EntityId) -> bool {
        let Some(parent) = self.entities.get(id) else {
            return false;
        };
        let Some(species) = self.species(parent.kind()) else {
            return false;
        };
        let (child_kind, interval) = match &species.behavior {
            Behavior::Mineral => return false,
            Behavior::Plant(plant) => match plant.spore {
                Some(spore) => (spore, plant.spore_interval),
                None => return false,
            },
            Behavior::Animal(animal) => {
                if parent.size() < animal.min_size_for_reproduction
                    || parent.food < animal.min_food_for_reproduction
                {
                    return false;
                }
                (parent.kind(), animal.reproduction_interval)
            }
        };
        if interval <= 0.0
            || (self.now - parent.last_reproduction) * self.config.speed_multiplier < interval
        {
            return false;
        }
        let Some(child) = self.species(child_kind) else {
            return false;
        };
        let (center, parent_size) = (parent.position(), parent.size());

        if let Some(parent) = self.entities.get_mut(id) {
            parent.last_reproduction = self.now;
        }

        // Offspring must fit at the parent's size before shrinking to birth size.
        let probe_size = if child.is_animal() {
            parent_size
        } else {
            child.initial_size()
        };
        let Some(p) = self.place_near(
            center,
            parent_size,
            child_kind,
            probe_size,
            child.collides,
            Some(child.position_criteria),
        ) else {
            return false;
        };

        let mut new = NewEntity::of(child_kind, child, p);
        if child.is_animal() {
            new = new.with_food(child.initial_size() * self.config.offspring_food_fraction);
        }
        let child_id = self.entities.insert(new, child, self.now);
        trace!(parent = %id, child = %child_id, kind = %child_kind, "born");
        self.emit(SimEventKind::Born {
            parent_id: id,
            child_id,
            kind: child_kind,
        });
        true
    }

    /// Grow an animal by its growth rate (capped at max size) if it has the
    /// food for it. Rolls back if the larger body would overlap anything.
    pub fn try_grow(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.entities.get(id) else {
            return false;
        };
        let Some(animal) = self.animal_data(entity.kind()) else {
            return false;
        };
        let old_size = entity.size();
        if old_size >= animal.max_size || entity.food < animal.min_food_for_growth {
            return false;
        }
        let new_size = (old_size * animal.growth_rate).min(animal.max_size);
        self.entities.resize(id, new_size);
        if self.entities.is_colliding(id) {
            self.entities.resize(id, old_size);
            return false;
        }
        if let Some(entity) = self.entities.get_mut(id) {
            entity.food /= animal.growth_rate;
        }
        self.emit(SimEventKind::Grew {
            entity_id: id,
            size: new_size,
        });
        true
    }

    // -----------------------------------------------------------------------
    // Movement, predation, metabolism
    // -----------------------------------------------------------------------

    /// Walk, fight or flight. With `reorient_chance`, look around: steer
    /// toward prey if it is strictly closer than any predator, else away
    /// from the nearest predator. Then walk one step along the heading; on
    /// collision step back a little further and pick a random heading.
    ///
    /// Returns the nearest prey seen this time, if any, for `try_eat`.
    pub fn forage(&mut self, id: EntityId) -> Option<EntityId> {
        let entity = self.entities.get(id)?;
        let animal = self.animal_data(entity.kind())?;
        let here = entity.position();
        let mut heading = entity.angle();
        let mut sighted_prey = None;

        if self.rng.random_bool(self.config.reorient_chance) {
            let sighting =
                self.entities
                    .sighting(id, animal.view_radius, &animal.prey, &animal.predators);
            let target = if sighting.prey_is_closer() {
                sighting.prey.map(|(prey, _)| (prey, 0.0))
            } else {
                sighting.predator.map(|(predator, _)| (predator, PI))
            };
            let aim = target.and_then(|(other, offset)| {
                self.entities.get(other).map(|e| (e.position(), offset))
            });
            if let Some((there, offset)) = aim {
                heading = bearing(here, there) + offset;
            }
            sighted_prey = sighting.prey.map(|(prey, _)| prey);
        }

        let config = self.config;
        let elapsed = config.tick_seconds
            * config.movement_units_per_second
            * config.walk_multiplier
            * config.speed_multiplier;
        let torus = self.torus();
        let dest = advance(
            &torus,
            here,
            heading,
            0.0,
            animal.speed,
            elapsed,
            config.advance_scale,
        );
        self.entities.move_entity(id, dest);

        if self.entities.is_colliding(id) {
            let back = advance(
                &torus,
                dest,
                heading,
                PI,
                animal.speed * 1.01,
                elapsed,
                config.advance_scale,
            );
            self.entities.move_entity(id, back);
            heading = self.rng.angle();
            trace!(%id, "bumped, new heading {heading:.3}");
        }
        if let Some(entity) = self.entities.get_mut(id) {
            entity.set_angle(heading);
        }
        sighted_prey
    }

    /// One bite of `prey_id` if it is within reach and `id` still has room
    /// for food. Prey already at integrity ≤ 0 is decayed instead.
    pub fn try_eat(&mut self, id: EntityId, prey_id: EntityId) -> bool {
        let Some(prey) = self.entities.get(prey_id) else {
            return false;
        };
        if prey.integrity <= 0.0 {
            self.decay(prey_id);
            return false;
        }
        let (prey_position, prey_size) = (prey.position(), prey.size());
        let Some(entity) = self.entities.get(id) else {
            return false;
        };
        let Some(animal) = self.animal_data(entity.kind()) else {
            return false;
        };
        let here = entity.position();
        let distance = self.torus().distance(here, prey_position);
        if distance >= entity.size() + prey_size || entity.food >= animal.max_food {
            return false;
        }

        let mut prey_integrity = 0.0;
        if let Some(prey) = self.entities.get_mut(prey_id) {
            prey.integrity -= animal.eating_rate;
            prey_integrity = prey.integrity;
        }
        if let Some(entity) = self.entities.get_mut(id) {
            entity.food += animal.eating_rate;
            entity.set_angle(bearing(here, prey_position));
        }
        self.emit(SimEventKind::Ate {
            predator_id: id,
            prey_id,
            prey_integrity,
        });
        true
    }

    /// Burn food in proportion to body size, then decay the animal if it is
    /// starved, broken or old. Returns true if it died.
    pub fn metabolize(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.entities.get(id) else {
            return false;
        };
        let Some(animal) = self.animal_data(entity.kind()) else {
            return false;
        };
        let drain = animal.metabolic_rate
            * entity.size()
            * self.config.tick_seconds
            * self.config.speed_multiplier;
        let mut starved = false;
        if let Some(entity) = self.entities.get_mut(id) {
            entity.food -= drain;
            starved = entity.food <= 0.0;
        }
        if starved || self.is_decay_eligible(id) {
            self.decay(id);
            return true;
        }
        false
    }

    // -----------------------------------------------------------------------
    // Per-entity updates
    // -----------------------------------------------------------------------

    /// Static update for one non-animal: reproduce if it is a seeding
    /// plant, then decay or transition once eligible. Animals are skipped;
    /// they get their own pass.
    pub fn update_static(&mut self, id: EntityId) {
        let Some(entity) = self.entities.get(id) else {
            return;
        };
        let Some(species) = self.species(entity.kind()) else {
            return;
        };
        if species.is_animal() {
            return;
        }
        if entity.integrity <= 0.0 {
            self.decay(id);
            return;
        }
        let is_plant = species.plant().is_some();
        if is_plant {
            self.try_reproduce(id);
        }
        if self.is_decay_eligible(id) {
            if is_plant {
                self.phase_transition_or_decay(id);
            } else {
                self.decay(id);
            }
        }
    }

    /// One animal opportunity: reproduce, else grow, else forage and try
    /// to eat what was seen; then metabolism and death checks.
    pub fn update_animal(&mut self, id: EntityId) {
        if !self.entities.contains(id) {
            return;
        }
        if !self.rng.random_bool(self.config.animal_action_chance) {
            return;
        }
        let sighted = if self.try_reproduce(id) || self.try_grow(id) {
            None
        } else {
            self.forage(id)
        };
        if let Some(prey) = sighted {
            self.try_eat(id, prey);
        }
        self.metabolize(id);
    }
}
