// Bucketed spatial hash over the toroidal world.
//
// The world is cut into a `cols × rows` grid of square buckets
// (`cols = max(1, floor(width / bucket_size))`, likewise for rows; when the
// width is not a multiple of the bucket size the last column absorbs the
// remainder). Each entity is registered in every bucket its bounding box
// (x ± size/2, y ± size/2) overlaps, with wraparound, so collision and
// visibility queries only scan the buckets a box touches and never need a
// refinement pass to catch entities centred in a neighboring bucket.
//
// The table stores handles, not entities. For each `EntityId` it keeps a
// `Body` (position, size, kind, collision flag) and the footprint (list of
// bucket indices) the id is currently registered in. Removal uses the
// stored footprint, so an entry can always be unregistered even if the
// caller no longer knows where it was. `EntityCollection` is the only
// writer; it mirrors every position or size change here through
// `move_to`/`resize`, which re-register atomically.
//
// Queries:
// - `is_colliding` / `is_colliding_at`: first hit wins. Two bodies collide
//   when both are collision-affected and toroidal centre distance minus the
//   two radii (size / 2) is ≤ 0. A body never collides with itself.
// - `nearest_prey_and_predator`: scans the view-radius box and tracks the
//   closest prey-kind and predator-kind bodies within the radius.
// - `random_bucket`: uniform bucket pick for amortized sweeps.
//
// Every bucket carries a `needs_redraw` flag set whenever an entity enters
// or leaves it, drained by `take_redraw_buckets`.
//
// See also: `collection.rs` which owns the table, `physics.rs` for `Torus`,
// `sim.rs` for the bucket sweep that consumes `random_bucket`.
//
// **Critical constraint: determinism.** Bucket contents are `BTreeSet`s so
// scans visit entities in id order. The `FxHashMap`s are lookup-only and
// never iterated.

use crate::physics::Torus;
use crate::prng::GameRng;
use crate::types::{EntityId, Kind, Point};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::BTreeSet;

/// Bucket indices an entity is registered in. Most entities are smaller
/// than a bucket and touch at most four.
pub type Footprint = SmallVec<[usize; 4]>;

/// The slice of an entity the index needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub kind: Kind,
    pub collides: bool,
}

impl Body {
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn radius(&self) -> f64 {
        self.size / 2.0
    }
}

/// One grid cell.
#[derive(Clone, Debug, Default)]
pub struct Bucket {
    entities: BTreeSet<EntityId>,
    needs_redraw: bool,
}

impl Bucket {
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }
}

/// Result of a prey/predator scan.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sighting {
    /// Nearest prey within view, with its distance.
    pub prey: Option<(EntityId, f64)>,
    /// Nearest predator within view, with its distance.
    pub predator: Option<(EntityId, f64)>,
}

impl Sighting {
    /// True only when prey was seen and it is strictly closer than any
    /// predator. Ties and the no-prey case favor predator avoidance.
    pub fn prey_is_closer(&self) -> bool {
        match (self.prey, self.predator) {
            (Some((_, p)), Some((_, q))) => p < q,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

/// Bucketed index of entity bodies on a torus.
#[derive(Clone, Debug)]
pub struct SpatialHashTable {
    torus: Torus,
    bucket_size: f64,
    cols: usize,
    rows: usize,
    buckets: Vec<Bucket>,
    bodies: FxHashMap<EntityId, Body>,
    footprints: FxHashMap<EntityId, Footprint>,
}

impl SpatialHashTable {
    pub fn new(width: f64, height: f64, bucket_size: f64) -> Self {
        let cols = ((width / bucket_size).floor() as usize).max(1);
        let rows = ((height / bucket_size).floor() as usize).max(1);
        Self {
            torus: Torus::new(width, height),
            bucket_size,
            cols,
            rows,
            buckets: vec![Bucket::default(); cols * rows],
            bodies: FxHashMap::default(),
            footprints: FxHashMap::default(),
        }
    }

    pub fn torus(&self) -> &Torus {
        &self.torus
    }

    pub fn columns(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn bucket(&self, index: usize) -> &Bucket {
        &self.buckets[index]
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.bodies.contains_key(&id)
    }

    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    /// Buckets `id` is currently registered in.
    pub fn buckets_of(&self, id: EntityId) -> Option<&[usize]> {
        self.footprints.get(&id).map(|f| f.as_slice())
    }

    // -----------------------------------------------------------------------
    // Footprint geometry
    // -----------------------------------------------------------------------

    fn cell_of(coord: f64, extent: f64, cell: f64, count: usize) -> usize {
        let c = (Torus::wrap_coord(coord, extent) / cell).floor() as usize;
        c.min(count - 1)
    }

    /// Cells along one axis covered by the interval [lo, hi], with wrap.
    fn span(&self, lo: f64, hi: f64, extent: f64, count: usize) -> SmallVec<[usize; 4]> {
        if hi - lo >= extent {
            return (0..count).collect();
        }
        let first = Self::cell_of(lo, extent, self.bucket_size, count);
        let last = Self::cell_of(hi, extent, self.bucket_size, count);
        let wrapped_within_one_cell = first == last
            && Torus::wrap_coord(lo, extent) > Torus::wrap_coord(hi, extent);
        if wrapped_within_one_cell {
            return (0..count).collect();
        }
        let mut cells = SmallVec::new();
        let mut c = first;
        loop {
            cells.push(c);
            if c == last {
                break;
            }
            c = (c + 1) % count;
        }
        cells
    }

    /// Buckets overlapped by the square of half-extent `half` around `center`.
    pub fn covered_buckets(&self, center: Point, half: f64) -> Footprint {
        let cols = self.span(center.x - half, center.x + half, self.torus.width, self.cols);
        let rows = self.span(center.y - half, center.y + half, self.torus.height, self.rows);
        let mut out = Footprint::new();
        for r in &rows {
            for c in &cols {
                out.push(r * self.cols + c);
            }
        }
        out
    }

    fn footprint_of(&self, body: &Body) -> Footprint {
        self.covered_buckets(body.center(), body.radius())
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    fn register(&mut self, id: EntityId, body: Body) {
        let footprint = self.footprint_of(&body);
        for &b in &footprint {
            let bucket = &mut self.buckets[b];
            bucket.entities.insert(id);
            bucket.needs_redraw = true;
        }
        self.footprints.insert(id, footprint);
        self.bodies.insert(id, body);
    }

    fn unregister(&mut self, id: EntityId) -> Option<Body> {
        let footprint = self.footprints.remove(&id)?;
        for b in footprint {
            let bucket = &mut self.buckets[b];
            bucket.entities.remove(&id);
            bucket.needs_redraw = true;
        }
        self.bodies.remove(&id)
    }

    /// Register a body, wrapping its position. Returns false (and changes
    /// nothing) if `id` is already present.
    pub fn add(&mut self, id: EntityId, mut body: Body) -> bool {
        if self.contains(id) {
            return false;
        }
        let p = self.torus.wrap(body.center());
        body.x = p.x;
        body.y = p.y;
        self.register(id, body);
        true
    }

    /// Unregister `id` from every bucket it occupies.
    pub fn remove(&mut self, id: EntityId) -> Option<Body> {
        self.unregister(id)
    }

    /// Re-register `id` at a new (wrapped) position. Returns the wrapped
    /// position, or `None` if `id` is unknown.
    pub fn move_to(&mut self, id: EntityId, to: Point) -> Option<Point> {
        let mut body = self.unregister(id)?;
        let p = self.torus.wrap(to);
        body.x = p.x;
        body.y = p.y;
        self.register(id, body);
        Some(p)
    }

    /// Re-register `id` with a new size.
    pub fn resize(&mut self, id: EntityId, size: f64) -> bool {
        match self.unregister(id) {
            Some(mut body) => {
                body.size = size;
                self.register(id, body);
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Whether two bodies overlap. Symmetric by construction.
    pub fn bodies_collide(&self, a: &Body, b: &Body) -> bool {
        a.collides
            && b.collides
            && self.torus.distance(a.center(), b.center()) - a.radius() - b.radius() <= 0.0
    }

    /// Whether registered entity `id` overlaps any other registered entity.
    pub fn is_colliding(&self, id: EntityId) -> bool {
        let (Some(body), Some(footprint)) = (self.bodies.get(&id), self.footprints.get(&id)) else {
            return false;
        };
        if !body.collides {
            return false;
        }
        footprint.iter().any(|&b| {
            self.buckets[b].entities.iter().any(|other| {
                *other != id
                    && self
                        .bodies
                        .get(other)
                        .is_some_and(|o| self.bodies_collide(body, o))
            })
        })
    }

    /// Whether a hypothetical body would overlap any registered entity other
    /// than `except`.
    pub fn is_colliding_at(&self, probe: &Body, except: Option<EntityId>) -> bool {
        if !probe.collides {
            return false;
        }
        let probe = Body {
            x: Torus::wrap_coord(probe.x, self.torus.width),
            y: Torus::wrap_coord(probe.y, self.torus.height),
            ..*probe
        };
        self.footprint_of(&probe).iter().any(|&b| {
            self.buckets[b].entities.iter().any(|other| {
                Some(*other) != except
                    && self
                        .bodies
                        .get(other)
                        .is_some_and(|o| self.bodies_collide(&probe, o))
            })
        })
    }

    /// Nearest prey-kind and predator-kind bodies within `view_radius` of
    /// `viewer`, excluding the viewer.
    pub fn nearest_prey_and_predator(
        &self,
        viewer: EntityId,
        view_radius: f64,
        prey: &[Kind],
        predators: &[Kind],
    ) -> Sighting {
        let mut sighting = Sighting::default();
        let Some(me) = self.bodies.get(&viewer) else {
            return sighting;
        };
        if prey.is_empty() && predators.is_empty() {
            return sighting;
        }
        let center = me.center();
        for b in self.covered_buckets(center, view_radius) {
            for other in &self.buckets[b].entities {
                if *other == viewer {
                    continue;
                }
                let Some(body) = self.bodies.get(other) else {
                    continue;
                };
                let d = self.torus.distance(center, body.center());
                if d > view_radius {
                    continue;
                }
                if prey.contains(&body.kind) && sighting.prey.is_none_or(|(_, best)| d < best) {
                    sighting.prey = Some((*other, d));
                }
                if predators.contains(&body.kind)
                    && sighting.predator.is_none_or(|(_, best)| d < best)
                {
                    sighting.predator = Some((*other, d));
                }
            }
        }
        sighting
    }

    /// Uniformly random bucket index.
    pub fn random_bucket(&self, rng: &mut GameRng) -> usize {
        rng.range_usize(0, self.buckets.len())
    }

    /// Indices of buckets whose contents changed since the last call,
    /// clearing their flags.
    pub fn take_redraw_buckets(&mut self) -> Vec<usize> {
        let mut out = Vec::new();
        for (i, bucket) in self.buckets.iter_mut().enumerate() {
            if bucket.needs_redraw {
                bucket.needs_redraw = false;
                out.push(i);
            }
        }
        out
    }

    /// Check that every body is registered in exactly the buckets its box
    /// overlaps and that no bucket holds a stale id.
    pub fn is_consistent(&self) -> bool {
        for (id, body) in &self.bodies {
            let Some(footprint) = self.footprints.get(id) else {
                return false;
            };
            let mut expected = self.footprint_of(body);
            let mut actual = footprint.clone();
            expected.sort_unstable();
            actual.sort_unstable();
            if expected != actual {
                return false;
            }
            if !actual.iter().all(|&b| self.buckets[b].entities.contains(id)) {
                return false;
            }
        }
        self.buckets.iter().enumerate().all(|(i, bucket)| {
            bucket.entities.iter().all(|id| {
                self.footprints
                    .get(id)
                    .is_some_and(|f| f.contains(&i))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(x: f64, y: f64, size: f64) -> Body {
        Body {
            x,
            y,
            size,
            kind: Kind::SmallStone,
            collides: true,
        }
    }

    fn table() -> SpatialHashTable {
        // 4 × 4 buckets of 5 tiles.
        SpatialHashTable::new(20.0, 20.0, 5.0)
    }

    fn sorted(buckets: Option<&[usize]>) -> Vec<usize> {
        let mut v = buckets.unwrap_or_default().to_vec();
        v.sort_unstable();
        v
    }

    #[test]
    fn grid_dimensions_floor_and_clamp() {
        let t = SpatialHashTable::new(22.0, 9.0, 5.0);
        assert_eq!(t.columns(), 4);
        assert_eq!(t.rows(), 1);
        let tiny = SpatialHashTable::new(3.0, 3.0, 5.0);
        assert_eq!(tiny.bucket_count(), 1);
    }

    #[test]
    fn add_registers_in_exactly_the_overlapped_buckets() {
        let mut t = table();
        let inner = EntityId(1);
        assert!(t.add(inner, body(7.0, 7.0, 2.0)));
        assert_eq!(sorted(t.buckets_of(inner)), vec![5], "box [6,8]² sits in bucket (1,1)");

        let straddling = EntityId(2);
        t.add(straddling, body(10.0, 7.0, 2.0));
        assert_eq!(sorted(t.buckets_of(straddling)), vec![5, 6]);
        assert!(t.is_consistent());
    }

    #[test]
    fn footprint_wraps_around_the_corner() {
        let mut t = table();
        let id = EntityId(1);
        t.add(id, body(0.5, 0.5, 2.0));
        // Columns 3 and 0, rows 3 and 0.
        assert_eq!(sorted(t.buckets_of(id)), vec![0, 3, 12, 15]);
        assert!(t.is_consistent());
    }

    #[test]
    fn oversized_body_covers_every_bucket_once() {
        let mut t = table();
        let id = EntityId(1);
        t.add(id, body(10.0, 10.0, 40.0));
        assert_eq!(sorted(t.buckets_of(id)), (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn remove_leaves_no_trace() {
        let mut t = table();
        let id = EntityId(1);
        t.add(id, body(0.5, 0.5, 2.0));
        assert!(t.remove(id).is_some());
        assert!(t.buckets_of(id).is_none());
        assert!((0..t.bucket_count()).all(|b| t.bucket(b).is_empty()));
        assert!(t.remove(id).is_none(), "second removal is a no-op");
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let mut t = table();
        assert!(t.add(EntityId(1), body(1.0, 1.0, 1.0)));
        assert!(!t.add(EntityId(1), body(15.0, 15.0, 1.0)));
        assert_eq!(t.body(EntityId(1)).map(|b| b.x), Some(1.0));
    }

    #[test]
    fn move_equals_remove_then_add() {
        let mut moved = table();
        let mut rebuilt = table();
        let id = EntityId(3);
        moved.add(id, body(2.0, 2.0, 1.5));
        moved.move_to(id, Point::new(-1.0, 12.0));

        rebuilt.add(id, body(19.0, 12.0, 1.5));

        assert_eq!(sorted(moved.buckets_of(id)), sorted(rebuilt.buckets_of(id)));
        assert_eq!(moved.body(id), rebuilt.body(id));
        assert!(moved.is_consistent());
    }

    #[test]
    fn collision_is_symmetric_and_respects_flags() {
        let t = table();
        let a = body(5.0, 5.0, 2.0);
        let b = body(6.5, 5.0, 2.0);
        let far = body(9.0, 5.0, 2.0);
        assert!(t.bodies_collide(&a, &b));
        assert!(t.bodies_collide(&b, &a));
        assert!(!t.bodies_collide(&a, &far));
        assert!(!t.bodies_collide(&far, &a));

        let ghost = Body { collides: false, ..b };
        assert!(!t.bodies_collide(&a, &ghost));
        assert!(!t.bodies_collide(&ghost, &a));
    }

    #[test]
    fn touching_bodies_collide() {
        let t = table();
        assert!(t.bodies_collide(&body(5.0, 5.0, 2.0), &body(7.0, 5.0, 2.0)));
    }

    #[test]
    fn collision_across_the_seam() {
        let mut t = table();
        t.add(EntityId(1), body(0.2, 10.0, 1.0));
        t.add(EntityId(2), body(19.7, 10.0, 1.0));
        assert!(t.is_colliding(EntityId(1)));
        assert!(t.is_colliding(EntityId(2)));
    }

    #[test]
    fn entity_never_collides_with_itself() {
        let mut t = table();
        let id = EntityId(1);
        t.add(id, body(5.0, 5.0, 3.0));
        assert!(!t.is_colliding(id));
        let probe = *t.body(id).unwrap_or(&body(0.0, 0.0, 0.0));
        assert!(!t.is_colliding_at(&probe, Some(id)));
        assert!(t.is_colliding_at(&probe, None));
    }

    #[test]
    fn non_colliding_body_is_never_colliding() {
        let mut t = table();
        t.add(EntityId(1), body(5.0, 5.0, 3.0));
        t.add(
            EntityId(2),
            Body {
                collides: false,
                ..body(5.0, 5.0, 3.0)
            },
        );
        assert!(!t.is_colliding(EntityId(2)));
        assert!(!t.is_colliding(EntityId(1)));
    }

    #[test]
    fn resize_reindexes() {
        let mut t = table();
        let id = EntityId(1);
        t.add(id, body(7.5, 7.5, 1.0));
        assert_eq!(t.buckets_of(id).map(|b| b.len()), Some(1));
        t.resize(id, 6.0);
        assert_eq!(t.buckets_of(id).map(|b| b.len()), Some(9));
        assert!(t.is_consistent());
    }

    #[test]
    fn sighting_finds_nearest_of_each_set() {
        let mut t = table();
        let viewer = EntityId(1);
        t.add(viewer, Body { kind: Kind::Rat, ..body(10.0, 10.0, 1.0) });
        t.add(EntityId(2), Body { kind: Kind::SeedFruitTree, ..body(13.0, 10.0, 0.5) });
        t.add(EntityId(3), Body { kind: Kind::SeedFruitTree, ..body(11.5, 10.0, 0.5) });
        t.add(EntityId(4), Body { kind: Kind::Tiger, ..body(10.0, 14.0, 1.0) });
        t.add(EntityId(5), Body { kind: Kind::Tiger, ..body(10.0, 19.5, 1.0) });

        let s = t.nearest_prey_and_predator(viewer, 5.0, &[Kind::SeedFruitTree], &[Kind::Tiger]);
        assert_eq!(s.prey.map(|p| p.0), Some(EntityId(3)));
        assert_eq!(s.predator.map(|p| p.0), Some(EntityId(4)));
        assert!(s.prey_is_closer());
    }

    #[test]
    fn sighting_ignores_bodies_beyond_view_radius() {
        let mut t = table();
        let viewer = EntityId(1);
        t.add(viewer, Body { kind: Kind::Rat, ..body(10.0, 10.0, 1.0) });
        t.add(EntityId(2), Body { kind: Kind::SeedFruitTree, ..body(14.0, 14.0, 0.5) });
        let s = t.nearest_prey_and_predator(viewer, 5.0, &[Kind::SeedFruitTree], &[]);
        assert!(s.prey.is_none(), "distance √32 > 5");
        assert!(!s.prey_is_closer());
    }

    #[test]
    fn sighting_tie_favors_predator_avoidance() {
        let tie = Sighting {
            prey: Some((EntityId(2), 3.0)),
            predator: Some((EntityId(3), 3.0)),
        };
        assert!(!tie.prey_is_closer());
        let predator_only = Sighting {
            prey: None,
            predator: Some((EntityId(3), 3.0)),
        };
        assert!(!predator_only.prey_is_closer());
        assert!(!Sighting::default().prey_is_closer());
    }

    #[test]
    fn viewer_does_not_see_itself() {
        let mut t = table();
        let viewer = EntityId(1);
        t.add(viewer, Body { kind: Kind::Rat, ..body(10.0, 10.0, 1.0) });
        let s = t.nearest_prey_and_predator(viewer, 5.0, &[Kind::Rat], &[Kind::Rat]);
        assert_eq!(s, Sighting::default());
    }

    #[test]
    fn random_bucket_stays_in_range_and_hits_everything() {
        let t = table();
        let mut rng = GameRng::new(2);
        let mut seen = vec![false; t.bucket_count()];
        for _ in 0..2000 {
            let b = t.random_bucket(&mut rng);
            seen[b] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn redraw_flags_follow_membership_changes() {
        let mut t = table();
        let id = EntityId(1);
        t.add(id, body(7.0, 7.0, 1.0));
        assert_eq!(t.take_redraw_buckets(), vec![5]);
        assert!(t.take_redraw_buckets().is_empty());

        t.move_to(id, Point::new(12.0, 7.0));
        assert_eq!(t.take_redraw_buckets(), vec![5, 6]);
        assert!(!t.bucket(5).needs_redraw());
    }
}
