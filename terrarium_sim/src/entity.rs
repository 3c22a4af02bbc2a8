// Runtime record for one organism or object.
//
// An `Entity` holds only per-instance mutable state. Everything shared by a
// kind (decay time, collision flag, plant or animal parameters) is looked up
// in the species table by `kind`.
//
// Position and size are private: they mirror the entity's `Body` in the
// spatial index, and the only code allowed to change them is
// `EntityCollection::move_entity` / `resize`, which re-index in the same
// call. Everything else (angle, integrity, food, timers) is freely mutable
// through `EntityCollection::get_mut`.
//
// See also: `collection.rs` for the arena that owns entities,
// `species.rs` for `SpeciesData`, `lifecycle.rs` for the state machine.

use crate::physics::normalize_angle;
use crate::spatial::Body;
use crate::species::SpeciesData;
use crate::types::{EntityId, Kind, Point};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// Construction parameters for an entity not yet in the collection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NewEntity {
    pub kind: Kind,
    pub position: Point,
    pub size: f64,
    pub angle: f64,
    pub food: f64,
    /// Inherited sprite variant. `None` lets the entity take its own.
    pub sprite_variant: Option<u32>,
}

impl NewEntity {
    /// Default instance of `kind`: birth size, facing "down" (π/2), and for
    /// animals a food reserve equal to the birth size.
    pub fn of(kind: Kind, species: &SpeciesData, position: Point) -> Self {
        let size = species.initial_size();
        Self {
            kind,
            position,
            size,
            angle: FRAC_PI_2,
            food: if species.is_animal() { size } else { 0.0 },
            sprite_variant: None,
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_food(mut self, food: f64) -> Self {
        self.food = food;
        self
    }

    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_sprite_variant(mut self, variant: u32) -> Self {
        self.sprite_variant = Some(variant);
        self
    }
}

/// A live entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    kind: Kind,
    position: Point,
    size: f64,
    angle: f64,
    /// Health counter. The entity decays once this reaches zero.
    pub integrity: f64,
    /// Simulated seconds at creation.
    pub created_at: f64,
    /// Simulated seconds at the last reproduction attempt that passed its
    /// gates. Starts at `created_at`.
    pub last_reproduction: f64,
    /// Food reserve. Always zero for non-animals.
    pub food: f64,
    /// Renderer key for picking among a kind's sprites. Fresh entities take
    /// the low bits of their id; successors of kinds flagged
    /// `keep_previous_sprite` inherit their predecessor's.
    sprite_variant: u32,
}

impl Entity {
    pub(crate) fn from_new(id: EntityId, new: NewEntity, species: &SpeciesData, now: f64) -> Self {
        Self {
            id,
            kind: new.kind,
            position: new.position,
            size: new.size,
            angle: normalize_angle(new.angle),
            integrity: species.integrity,
            created_at: now,
            last_reproduction: now,
            food: new.food,
            sprite_variant: new.sprite_variant.unwrap_or(id.0 as u32),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn radius(&self) -> f64 {
        self.size / 2.0
    }

    /// Heading in [0, 2π).
    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn sprite_variant(&self) -> u32 {
        self.sprite_variant
    }

    pub fn set_angle(&mut self, angle: f64) {
        self.angle = normalize_angle(angle);
    }

    /// Scaled age in simulated seconds.
    pub fn age(&self, now: f64, speed_multiplier: f64) -> f64 {
        (now - self.created_at) * speed_multiplier
    }

    /// The slice of this entity the spatial index stores.
    pub fn body(&self, collides: bool) -> Body {
        Body {
            x: self.position.x,
            y: self.position.y,
            size: self.size,
            kind: self.kind,
            collides,
        }
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub(crate) fn set_size(&mut self, size: f64) {
        self.size = size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::default_species_table;
    use std::f64::consts::PI;

    #[test]
    fn animals_start_with_food_equal_to_birth_size() {
        let table = default_species_table();
        let rat = &table[&Kind::Rat];
        let new = NewEntity::of(Kind::Rat, rat, Point::new(1.0, 2.0));
        assert_eq!(new.size, 0.5);
        assert_eq!(new.food, 0.5);

        let stone = &table[&Kind::LargeStone];
        let new = NewEntity::of(Kind::LargeStone, stone, Point::new(1.0, 2.0));
        assert_eq!(new.size, 3.0);
        assert_eq!(new.food, 0.0);
    }

    #[test]
    fn angle_writes_are_normalized() {
        let table = default_species_table();
        let tiger = &table[&Kind::Tiger];
        let mut e = Entity::from_new(
            EntityId(1),
            NewEntity::of(Kind::Tiger, tiger, Point::new(0.0, 0.0)).with_angle(-PI),
            tiger,
            3.0,
        );
        assert!((e.angle() - PI).abs() < 1e-12);
        e.set_angle(5.0 * PI);
        assert!((0.0..std::f64::consts::TAU).contains(&e.angle()));
        assert_eq!(e.integrity, tiger.integrity);
        assert_eq!(e.last_reproduction, 3.0);
    }

    #[test]
    fn sprite_variant_defaults_to_id_unless_inherited() {
        let table = default_species_table();
        let trunk = &table[&Kind::Trunk];
        let fresh = Entity::from_new(
            EntityId(12),
            NewEntity::of(Kind::Trunk, trunk, Point::new(0.0, 0.0)),
            trunk,
            0.0,
        );
        assert_eq!(fresh.sprite_variant(), 12);
        let heir = Entity::from_new(
            EntityId(13),
            NewEntity::of(Kind::Trunk, trunk, Point::new(0.0, 0.0)).with_sprite_variant(12),
            trunk,
            0.0,
        );
        assert_eq!(heir.sprite_variant(), 12);
    }

    #[test]
    fn age_scales_with_speed_multiplier() {
        let table = default_species_table();
        let seed = &table[&Kind::SeedFruitTree];
        let e = Entity::from_new(
            EntityId(1),
            NewEntity::of(Kind::SeedFruitTree, seed, Point::new(0.0, 0.0)),
            seed,
            2.0,
        );
        assert_eq!(e.age(7.0, 1.0), 5.0);
        assert_eq!(e.age(7.0, 2.0), 10.0);
    }
}
