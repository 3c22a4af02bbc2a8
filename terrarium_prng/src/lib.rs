// Seeded pseudo-random number generator for the terrarium simulation.
//
// xoshiro256++ (Blackman & Vigna, 2019), seeded by expanding a single `u64`
// through SplitMix64. Every random draw in the workspace (terrain noise,
// river walks, spawn positions, animal headings, bucket sampling) comes from
// one `GameRng` owned by `SimState`, so a seed fully determines a run within
// one build.
//
// Beyond the raw generator this crate carries the handful of distributions
// the simulation needs: unit floats, half-open float and integer ranges, a
// Bernoulli draw, and a Fisher-Yates shuffle for bucket sweep permutations.
//
// See also: `terrarium_sim::sim` which owns the generator, `terrarium_sim::
// placement` for the retry loop that consumes most float ranges.
//
// **Critical constraint: determinism.** The integer core must not touch
// floating point. Float helpers are derived from integer output only, and
// no method may read OS entropy or the clock.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ generator with 256 bits of state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRng {
    s: [u64; 4],
}

impl GameRng {
    /// Seed a generator. Equal seeds give equal streams.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Next raw 64-bit output.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Upper half of `next_u64`.
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Uniform `f64` in [0, 1), built from the top 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform `f64` in `[low, high)`. Returns `low` when the range is empty
    /// or inverted, which lets callers pass degenerate footprints (size 0)
    /// without special-casing them.
    pub fn range_f64(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        low + self.next_f64() * (high - low)
    }

    /// Uniform angle in [0, 2π).
    pub fn angle(&mut self) -> f64 {
        self.next_f64() * std::f64::consts::TAU
    }

    /// Uniform integer in `[low, high)` with rejection sampling to avoid
    /// modulo bias.
    ///
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        let threshold = range.wrapping_neg() % range;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Uniform `usize` in `[low, high)`. Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Uniform `i32` in `[low, high)`. Returns `low` for an empty range.
    pub fn range_i32(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return low;
        }
        let span = (high as i64 - low as i64) as u64;
        (low as i64 + self.range_u64(0, span) as i64) as i32
    }

    /// Uniform `i32` in `[low, high]`. Returns `low` if `high < low`.
    pub fn range_i32_inclusive(&mut self, low: i32, high: i32) -> i32 {
        if high < low {
            return low;
        }
        let span = (high as i64 - low as i64 + 1) as u64;
        (low as i64 + self.range_u64(0, span) as i64) as i32
    }

    /// `true` with probability `p`. `p <= 0` never fires, `p >= 1` always does.
    pub fn random_bool(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// In-place Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.range_usize(0, i + 1);
            items.swap(i, j);
        }
    }
}

/// SplitMix64 step, used only to expand the seed.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = GameRng::new(42);
        let mut b = GameRng::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = GameRng::new(42);
        let mut b = GameRng::new(43);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn unit_float_stays_in_range() {
        let mut rng = GameRng::new(12345);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "f64 out of range: {v}");
        }
    }

    #[test]
    fn float_range_respects_bounds_and_degenerate_input() {
        let mut rng = GameRng::new(777);
        for _ in 0..10_000 {
            let v = rng.range_f64(-2.5, 3.5);
            assert!((-2.5..3.5).contains(&v), "range_f64 out of range: {v}");
        }
        assert_eq!(rng.range_f64(4.0, 4.0), 4.0);
        assert_eq!(rng.range_f64(4.0, 1.0), 4.0);
    }

    #[test]
    fn angle_is_within_one_turn() {
        let mut rng = GameRng::new(3);
        for _ in 0..1000 {
            let a = rng.angle();
            assert!((0.0..std::f64::consts::TAU).contains(&a));
        }
    }

    #[test]
    fn integer_ranges_respect_bounds() {
        let mut rng = GameRng::new(999);
        for _ in 0..10_000 {
            let v = rng.range_u64(10, 20);
            assert!((10..20).contains(&v), "range_u64 out of range: {v}");
            let w = rng.range_i32(-70, 0);
            assert!((-70..0).contains(&w), "range_i32 out of range: {w}");
            let z = rng.range_i32_inclusive(-1, 1);
            assert!((-1..=1).contains(&z), "range_i32_inclusive out of range: {z}");
        }
    }

    #[test]
    fn inclusive_range_reaches_both_ends() {
        let mut rng = GameRng::new(1);
        let mut seen = [false; 3];
        for _ in 0..1000 {
            seen[(rng.range_i32_inclusive(-1, 1) + 1) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s), "expected -1, 0 and 1, saw {seen:?}");
    }

    #[test]
    fn empty_integer_range_returns_low() {
        let mut rng = GameRng::new(5);
        assert_eq!(rng.range_i32(-10, -10), -10);
        assert_eq!(rng.range_i32_inclusive(3, 2), 3);
    }

    #[test]
    fn random_bool_is_roughly_fair() {
        let mut rng = GameRng::new(42);
        let n = 10_000;
        let hits = (0..n).filter(|_| rng.random_bool(0.2)).count();
        let pct = hits as f64 / n as f64;
        assert!((0.17..0.23).contains(&pct), "random_bool(0.2) gave {pct}");
        assert!((0..100).all(|_| !rng.random_bool(0.0)));
        assert!((0..100).all(|_| rng.random_bool(1.0)));
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = GameRng::new(9);
        let mut items: Vec<usize> = (0..50).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
        assert_ne!(items, sorted, "50 items should not shuffle to identity");
    }

    #[test]
    fn serde_roundtrip_continues_stream() {
        let mut rng = GameRng::new(42);
        for _ in 0..100 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: GameRng = serde_json::from_str(&json).unwrap();
        for _ in 0..100 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}
