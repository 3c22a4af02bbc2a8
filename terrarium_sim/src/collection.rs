// Entity arena.
//
// `EntityCollection` owns every live `Entity` in a `BTreeMap` keyed by a
// monotonic `EntityId`, together with the `SpatialHashTable` that indexes
// them, a per-kind count map (read by the population regulators) and the
// set of animal ids (iterated every tick by the fauna update).
//
// This is the single entry point for structural changes. `insert`,
// `remove`, `move_entity` and `resize` update the arena, the index, the
// counts and the animal set together, so at every tick boundary the four
// views agree. `remove` is idempotent: the second call for an id returns
// `None` and changes nothing, which lets a prey be decayed by one predator
// while another still holds its id.
//
// See also: `spatial.rs` for the index, `entity.rs` for `Entity`,
// `lifecycle.rs` and `regulator.rs` for the callers.
//
// **Critical constraint: determinism.** Ids are allocated sequentially and
// never reused. Iteration is in id order.

use crate::entity::{Entity, NewEntity};
use crate::spatial::{Body, Sighting, SpatialHashTable};
use crate::species::SpeciesData;
use crate::types::{EntityId, Kind, Point};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug)]
pub struct EntityCollection {
    entities: BTreeMap<EntityId, Entity>,
    spatial: SpatialHashTable,
    kind_counts: BTreeMap<Kind, usize>,
    animals: BTreeSet<EntityId>,
    next_id: u64,
}

impl EntityCollection {
    pub fn new(width: f64, height: f64, bucket_size: f64) -> Self {
        Self {
            entities: BTreeMap::new(),
            spatial: SpatialHashTable::new(width, height, bucket_size),
            kind_counts: BTreeMap::new(),
            animals: BTreeSet::new(),
            next_id: 1,
        }
    }

    /// Add a new entity, wrapping its position onto the torus.
    pub fn insert(&mut self, new: NewEntity, species: &SpeciesData, now: f64) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;

        let mut entity = Entity::from_new(id, new, species, now);
        let wrapped = self.spatial.torus().wrap(entity.position());
        entity.set_position(wrapped);

        self.spatial.add(id, entity.body(species.collides));
        *self.kind_counts.entry(entity.kind()).or_insert(0) += 1;
        if species.is_animal() {
            self.animals.insert(id);
        }
        self.entities.insert(id, entity);
        id
    }

    /// Remove an entity from every view. `None` if it was already gone.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        self.spatial.remove(id);
        self.animals.remove(&id);
        if let Some(count) = self.kind_counts.get_mut(&entity.kind()) {
            *count -= 1;
            if *count == 0 {
                self.kind_counts.remove(&entity.kind());
            }
        }
        Some(entity)
    }

    /// Move an entity and re-index it. Returns the wrapped destination.
    pub fn move_entity(&mut self, id: EntityId, to: Point) -> Option<Point> {
        let entity = self.entities.get_mut(&id)?;
        let wrapped = self.spatial.move_to(id, to)?;
        entity.set_position(wrapped);
        Some(wrapped)
    }

    /// Change an entity's size and re-index it.
    pub fn resize(&mut self, id: EntityId, size: f64) -> bool {
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        if !self.spatial.resize(id, size) {
            return false;
        }
        entity.set_size(size);
        true
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All live entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn count_of(&self, kind: Kind) -> usize {
        self.kind_counts.get(&kind).copied().unwrap_or(0)
    }

    /// Sum of counts over `kinds`.
    pub fn count_pooled(&self, kinds: &[Kind]) -> usize {
        kinds.iter().map(|k| self.count_of(*k)).sum()
    }

    /// Live count per kind, kinds with no members omitted.
    pub fn kind_counts(&self) -> &BTreeMap<Kind, usize> {
        &self.kind_counts
    }

    /// Ids of live animals in id order.
    pub fn animals(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.animals.iter().copied()
    }

    pub fn animal_count(&self) -> usize {
        self.animals.len()
    }

    pub fn spatial(&self) -> &SpatialHashTable {
        &self.spatial
    }

    /// Whether a live entity currently overlaps another.
    pub fn is_colliding(&self, id: EntityId) -> bool {
        self.spatial.is_colliding(id)
    }

    /// Whether a hypothetical body would overlap anything other than
    /// `except`.
    pub fn would_collide(&self, probe: &Body, except: Option<EntityId>) -> bool {
        self.spatial.is_colliding_at(probe, except)
    }

    pub fn sighting(
        &self,
        viewer: EntityId,
        view_radius: f64,
        prey: &[Kind],
        predators: &[Kind],
    ) -> Sighting {
        self.spatial
            .nearest_prey_and_predator(viewer, view_radius, prey, predators)
    }

    /// Ids registered in bucket `index`, in id order.
    pub fn bucket_entities(&self, index: usize) -> Vec<EntityId> {
        self.spatial.bucket(index).entities().collect()
    }

    /// Buckets whose membership changed since the last call.
    pub fn take_redraw_buckets(&mut self) -> Vec<usize> {
        self.spatial.take_redraw_buckets()
    }

    /// Cross-check the arena, index, counts and animal set.
    pub fn is_consistent(&self) -> bool {
        if self.spatial.len() != self.entities.len() || !self.spatial.is_consistent() {
            return false;
        }
        let mut counts: BTreeMap<Kind, usize> = BTreeMap::new();
        for (id, entity) in &self.entities {
            *counts.entry(entity.kind()).or_insert(0) += 1;
            let Some(body) = self.spatial.body(*id) else {
                return false;
            };
            if body.x != entity.position().x
                || body.y != entity.position().y
                || body.size != entity.size()
            {
                return false;
            }
        }
        counts == self.kind_counts && self.animals.iter().all(|id| self.entities.contains_key(id))
    }
}
