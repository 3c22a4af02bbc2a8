// Toroidal tile grid.
//
// The planet is stored as a flat `Vec<Tile>` indexed by `x + y * width`.
// Every accessor wraps its coordinates modulo the world size, so there is
// no out-of-bounds case: tile (-1, 0) is tile (width - 1, 0). Neighbor
// lookups go through `Direction`, whose `opposite()` makes the eight
// neighbor accessors mutual inverses.
//
// The planet also carries the terrain constants generation and lifecycle
// share: altitude and temperature ranges, the derived water threshold, and
// the softening pass count.
//
// See also: `terrain.rs` which fills the grid, `tile.rs` for `Tile`,
// `physics.rs` for the continuous-coordinate `Torus` sharing the same
// wrap rule.

use crate::config::PlanetConfig;
use crate::tile::Tile;
use crate::types::Point;

/// One of the eight grid neighbors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Top,
    Bottom,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Left,
        Direction::Right,
        Direction::Top,
        Direction::Bottom,
        Direction::TopLeft,
        Direction::TopRight,
        Direction::BottomLeft,
        Direction::BottomRight,
    ];

    /// Grid offset. Top is negative y.
    pub fn offset(self) -> (i64, i64) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Top => (0, -1),
            Direction::Bottom => (0, 1),
            Direction::TopLeft => (-1, -1),
            Direction::TopRight => (1, -1),
            Direction::BottomLeft => (-1, 1),
            Direction::BottomRight => (1, 1),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Top => Direction::Bottom,
            Direction::Bottom => Direction::Top,
            Direction::TopLeft => Direction::BottomRight,
            Direction::TopRight => Direction::BottomLeft,
            Direction::BottomLeft => Direction::TopRight,
            Direction::BottomRight => Direction::TopLeft,
        }
    }
}

/// The world's terrain.
#[derive(Clone, Debug)]
pub struct Planet {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    pub min_temperature: i32,
    pub max_temperature: i32,
    pub min_altitude: i32,
    pub max_altitude: i32,
    pub water_threshold_altitude: i32,
    pub softness_pass_count: u32,
}

impl Planet {
    /// A grid of default tiles sized and ranged from `config`. Terrain is
    /// filled in by `terrain::generate`.
    pub fn new(config: &PlanetConfig) -> Self {
        let total = config.width as usize * config.height as usize;
        Self {
            width: config.width,
            height: config.height,
            tiles: vec![Tile::default(); total],
            min_temperature: config.min_temperature,
            max_temperature: config.max_temperature,
            min_altitude: config.min_altitude,
            max_altitude: config.max_altitude,
            water_threshold_altitude: config.water_threshold_altitude(),
            softness_pass_count: config.softness_pass_count,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Wrap integer coordinates into the grid.
    pub fn wrap(&self, x: i64, y: i64) -> (u32, u32) {
        (
            x.rem_euclid(self.width as i64) as u32,
            y.rem_euclid(self.height as i64) as u32,
        )
    }

    fn index(&self, x: i64, y: i64) -> usize {
        let (x, y) = self.wrap(x, y);
        x as usize + y as usize * self.width as usize
    }

    pub fn tile(&self, x: i64, y: i64) -> &Tile {
        &self.tiles[self.index(x, y)]
    }

    pub fn tile_mut(&mut self, x: i64, y: i64) -> &mut Tile {
        let i = self.index(x, y);
        &mut self.tiles[i]
    }

    /// The tile under a continuous position.
    pub fn tile_at(&self, p: Point) -> &Tile {
        self.tile(p.x.floor() as i64, p.y.floor() as i64)
    }

    /// Coordinates of the neighbor in `dir`, wrapped.
    pub fn neighbor(&self, x: i64, y: i64, dir: Direction) -> (u32, u32) {
        let (dx, dy) = dir.offset();
        self.wrap(x + dx, y + dy)
    }

    pub fn neighbor_tile(&self, x: i64, y: i64, dir: Direction) -> &Tile {
        let (dx, dy) = dir.offset();
        self.tile(x + dx, y + dy)
    }

    /// Flat tile storage in row-major order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub(crate) fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    /// Mark a tile and its four edge neighbors for redraw.
    pub fn mark_dirty_around(&mut self, x: i64, y: i64) {
        self.tile_mut(x, y).needs_redraw = true;
        for dir in [Direction::Left, Direction::Right, Direction::Top, Direction::Bottom] {
            let (dx, dy) = dir.offset();
            self.tile_mut(x + dx, y + dy).needs_redraw = true;
        }
    }

    /// Coordinates of every tile flagged for redraw, clearing the flags.
    pub fn take_dirty_tiles(&mut self) -> Vec<(u32, u32)> {
        let width = self.width as usize;
        let mut dirty = Vec::new();
        for (i, tile) in self.tiles.iter_mut().enumerate() {
            if tile.needs_redraw {
                tile.needs_redraw = false;
                dirty.push(((i % width) as u32, (i / width) as u32));
            }
        }
        dirty
    }

    /// Number of water tiles.
    pub fn water_tile_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_water).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_planet() -> Planet {
        Planet::new(&PlanetConfig {
            width: 10,
            height: 7,
            ..PlanetConfig::default()
        })
    }

    #[test]
    fn coordinates_wrap_in_both_directions() {
        let planet = small_planet();
        assert_eq!(planet.wrap(-1, 0), (9, 0));
        assert_eq!(planet.wrap(10, 7), (0, 0));
        assert_eq!(planet.wrap(-21, -15), (9, 6));
        for x in -30..30 {
            for y in -30..30 {
                let (wx, wy) = planet.wrap(x, y);
                assert!(wx < 10 && wy < 7, "({x},{y}) wrapped to ({wx},{wy})");
            }
        }
    }

    #[test]
    fn neighbor_accessors_are_mutual_inverses() {
        let planet = small_planet();
        for x in 0..10 {
            for y in 0..7 {
                for dir in Direction::ALL {
                    let (nx, ny) = planet.neighbor(x, y, dir);
                    let back = planet.neighbor(nx as i64, ny as i64, dir.opposite());
                    assert_eq!(back, (x as u32, y as u32), "{dir:?} from ({x},{y})");
                }
            }
        }
    }

    #[test]
    fn writes_through_wrapped_coordinates_alias() {
        let mut planet = small_planet();
        planet.tile_mut(-1, -1).altitude = 42;
        assert_eq!(planet.tile(9, 6).altitude, 42);
        assert_eq!(planet.tile_at(Point::new(9.7, 6.2)).altitude, 42);
    }

    #[test]
    fn dirty_tiles_drain_once() {
        let mut planet = small_planet();
        assert_eq!(planet.take_dirty_tiles().len(), 70, "fresh tiles start dirty");
        assert!(planet.take_dirty_tiles().is_empty());

        planet.mark_dirty_around(0, 0);
        let mut dirty = planet.take_dirty_tiles();
        dirty.sort_unstable();
        assert_eq!(dirty, vec![(0, 0), (0, 1), (0, 6), (1, 0), (9, 0)]);
    }
}
