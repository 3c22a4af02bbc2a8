// Bounded-retry placement search.
//
// Decay byproducts, offspring and regulator spawns all need "a random point
// that satisfies some predicate, or give up after N tries". This module is
// that loop, written once: `find_placement` draws candidates from a
// sampler, tests each against a validity predicate, and returns the first
// valid point or `PlacementError::NoAvailablePlacement` once the budget is
// spent.
//
// Exhaustion is a soft failure. Callers log it and abandon the
// sub-operation; nothing has been mutated by the time the error comes back.

use crate::prng::GameRng;
use crate::types::Point;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    /// Every candidate in the budget was rejected.
    #[error("no available placement after {attempts} attempts")]
    NoAvailablePlacement { attempts: u32 },
}

/// Draw up to `attempts` candidates from `sample` and return the first one
/// `valid` accepts.
pub fn find_placement<S, V>(
    rng: &mut GameRng,
    attempts: u32,
    mut sample: S,
    mut valid: V,
) -> Result<Point, PlacementError>
where
    S: FnMut(&mut GameRng) -> Point,
    V: FnMut(Point) -> bool,
{
    for _ in 0..attempts {
        let candidate = sample(rng);
        if valid(candidate) {
            return Ok(candidate);
        }
    }
    Err(PlacementError::NoAvailablePlacement { attempts })
}
