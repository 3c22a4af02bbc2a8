// Procedural terrain generation.
//
// `generate()` runs the whole pipeline over a fresh `Planet`:
//
//   1. Randomize every tile: altitude uniform in [min, max], temperature from
//      latitude (warmest at the equator row, coldest at both poles) plus a
//      jitter in [minT/7, maxT/7).
//   2. Carve rivers: each river is an 8-directional random walk that forces
//      every visited tile below the water threshold. The configured length
//      is for a 512×512 world and scales with area; the count is fixed.
//   3. Soften altitude `softness_pass_count` times. A pass is a checkerboard
//      of four in-place sweeps; each tile becomes the rounded mean of itself
//      and its four edge neighbors. Before averaging, a dry tile squeezed
//      between two water tiles on any opposite pair is lowered to the higher
//      of the pair, so thin land spits erode into coastline instead of
//      surviving as one-tile ridges.
//   4. Reclassify water (done by every altitude write).
//   5. Saturation: water = 1, land = `dry_saturation_seed`, then
//      8 × softness passes of five-point averaging, then water back to 1 and
//      land square-rooted, which lifts coastal values.
//
// The saturation passes are double-buffered, so each pass is a pure
// function of the previous buffer and rows can be computed in parallel with
// rayon without changing the result.
//
// See also: `planet.rs` for the grid and wrap rules, `config.rs` for
// `PlanetConfig`, `lifecycle.rs` which reads saturation and temperature for
// plant growth gates.
//
// **Critical constraint: determinism.** All randomness is drawn from the
// caller's `GameRng` in a fixed order (tiles row by row, then rivers). The
// parallel saturation step draws no randomness.

use crate::config::PlanetConfig;
use crate::planet::{Direction, Planet};
use crate::prng::GameRng;
use rayon::prelude::*;

/// Area the configured river length refers to (512 × 512).
const REFERENCE_AREA: f64 = 262_144.0;

/// Build and fully generate a planet.
pub fn generate(config: &PlanetConfig, rng: &mut GameRng) -> Planet {
    let mut planet = Planet::new(config);

    for y in 0..planet.height() as i64 {
        for x in 0..planet.width() as i64 {
            randomize_tile(&mut planet, x, y, rng);
        }
    }

    let rivers = carve_rivers(&mut planet, config, rng);

    for _ in 0..planet.softness_pass_count {
        soften_pass(&mut planet);
    }

    compute_saturation(
        &mut planet,
        config.dry_saturation_seed,
        config.softness_pass_count * 8,
    );

    tracing::info!(
        width = planet.width(),
        height = planet.height(),
        rivers,
        water_tiles = planet.water_tile_count(),
        threshold = planet.water_threshold_altitude,
        "planet generated"
    );
    planet
}

// ---------------------------------------------------------------------------
// Tile randomization
// ---------------------------------------------------------------------------

/// Latitude component of a row's temperature, before jitter.
///
/// Rows fold about `height / 2`: row 0 and row `height` are poles at
/// `min_temperature`, the middle row reaches `max_temperature`.
pub fn temperature_at_latitude(y: u32, height: u32, min_temp: i32, max_temp: i32) -> i32 {
    let half = (height / 2) as i64;
    if half == 0 {
        return min_temp;
    }
    let mut ly = y as i64;
    if ly > half {
        ly = half - (ly - half);
    }
    (ly * (max_temp as i64 - min_temp as i64) / half + min_temp as i64) as i32
}

/// Re-roll one tile's altitude and temperature and mark it (and its four
/// edge neighbors) for redraw.
pub fn randomize_tile(planet: &mut Planet, x: i64, y: i64, rng: &mut GameRng) {
    let (min_alt, max_alt) = (planet.min_altitude, planet.max_altitude);
    let (min_t, max_t) = (planet.min_temperature, planet.max_temperature);
    let threshold = planet.water_threshold_altitude;
    let (_, wy) = planet.wrap(x, y);
    let height = planet.height();

    let altitude = rng.range_i32_inclusive(min_alt, max_alt);
    let temperature = temperature_at_latitude(wy, height, min_t, max_t)
        + rng.range_i32(min_t / 7, max_t / 7);

    let tile = planet.tile_mut(x, y);
    tile.set_altitude(altitude, threshold);
    tile.temperature = temperature;
    planet.mark_dirty_around(x, y);
}

// ---------------------------------------------------------------------------
// Rivers
// ---------------------------------------------------------------------------

/// River length after scaling the configured length by world area.
pub fn scaled_river_length(config: &PlanetConfig) -> u32 {
    let area = config.width as f64 * config.height as f64;
    (config.river_length as f64 * area / REFERENCE_AREA).round_ties_even() as u32
}

/// Carve `river_count` rivers of the area-scaled length. Returns how many
/// were carved.
pub fn carve_rivers(planet: &mut Planet, config: &PlanetConfig, rng: &mut GameRng) -> u32 {
    let length = scaled_river_length(config);
    for _ in 0..config.river_count {
        let x = rng.range_usize(0, planet.width() as usize) as i64;
        let y = rng.range_usize(0, planet.height() as usize) as i64;
        carve_river(planet, x, y, length, rng);
    }
    config.river_count
}

/// Random walk from (x, y) for `length` steps, sinking every visited tile
/// below the water threshold.
pub fn carve_river(planet: &mut Planet, mut x: i64, mut y: i64, length: u32, rng: &mut GameRng) {
    let min_alt = planet.min_altitude;
    let threshold = planet.water_threshold_altitude;
    for _ in 0..length {
        let altitude = rng.range_i32(min_alt, threshold);
        planet.tile_mut(x, y).set_altitude(altitude, threshold);
        planet.mark_dirty_around(x, y);

        let dx = rng.range_i32_inclusive(-1, 1) as i64;
        let dy = rng.range_i32_inclusive(-1, 1) as i64;
        let (wx, wy) = planet.wrap(x + dx, y + dy);
        x = wx as i64;
        y = wy as i64;
    }
}

// ---------------------------------------------------------------------------
// Altitude softening
// ---------------------------------------------------------------------------

/// Opposite neighbor pairs checked by the shoreline rule, in order.
const OPPOSITE_PAIRS: [(Direction, Direction); 4] = [
    (Direction::Left, Direction::Right),
    (Direction::Top, Direction::Bottom),
    (Direction::TopLeft, Direction::BottomRight),
    (Direction::TopRight, Direction::BottomLeft),
];

/// Soften one tile in place: shoreline rule, then five-point rounded mean.
pub fn soften_tile(planet: &mut Planet, x: i64, y: i64) {
    let threshold = planet.water_threshold_altitude;
    let mut altitude = planet.tile(x, y).altitude;

    if altitude >= threshold {
        for (a, b) in OPPOSITE_PAIRS {
            let alt_a = planet.neighbor_tile(x, y, a).altitude;
            let alt_b = planet.neighbor_tile(x, y, b).altitude;
            if alt_a < threshold && alt_b < threshold && altitude > alt_a && altitude > alt_b {
                altitude = alt_a.max(alt_b);
            }
        }
    }

    let sum: i64 = altitude as i64
        + [Direction::Left, Direction::Right, Direction::Top, Direction::Bottom]
            .iter()
            .map(|d| planet.neighbor_tile(x, y, *d).altitude as i64)
            .sum::<i64>();
    let softened = (sum as f64 / 5.0).round_ties_even() as i32;
    planet.tile_mut(x, y).set_altitude(softened, threshold);
}

/// One softening round: four checkerboard sweeps over the grid.
pub fn soften_pass(planet: &mut Planet) {
    let (w, h) = (planet.width() as i64, planet.height() as i64);
    for (ox, oy) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
        for y in (oy..h).step_by(2) {
            for x in (ox..w).step_by(2) {
                soften_tile(planet, x, y);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Saturation
// ---------------------------------------------------------------------------

/// Derive every tile's saturation from the water layout.
pub fn compute_saturation(planet: &mut Planet, dry_seed: f64, passes: u32) {
    let w = planet.width() as usize;
    let h = planet.height() as usize;

    let mut current: Vec<f64> = planet
        .tiles()
        .iter()
        .map(|t| if t.is_water { 1.0 } else { dry_seed })
        .collect();
    let mut next = vec![0.0; current.len()];

    for _ in 0..passes {
        let src = &current;
        next.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
            let up = (y + h - 1) % h;
            let down = (y + 1) % h;
            for (x, out) in row.iter_mut().enumerate() {
                let left = (x + w - 1) % w;
                let right = (x + 1) % w;
                *out = (src[y * w + x]
                    + src[y * w + left]
                    + src[y * w + right]
                    + src[up * w + x]
                    + src[down * w + x])
                    / 5.0;
            }
        });
        std::mem::swap(&mut current, &mut next);
    }

    for (tile, value) in planet.tiles_mut().iter_mut().zip(current) {
        tile.saturation = if tile.is_water { 1.0 } else { value.sqrt() };
    }
}
