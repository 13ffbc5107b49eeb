//! Board: tile storage, pathfinding and reachability

use crate::error::PersistenceError;
use crate::hex::Hex;
use crate::ids::{BuildingId, UnitId};
use crate::terrain::Terrain;
use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

/// A grid cell. Occupant fields are non-owning handles into the world arena.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    pub hex: Hex,
    pub terrain: Terrain,
    pub unit: Option<UnitId>,
    pub building: Option<BuildingId>,
}

impl Tile {
    pub fn new(hex: Hex, terrain: Terrain) -> Self {
        Self {
            hex,
            terrain,
            unit: None,
            building: None,
        }
    }

    pub fn has_unit(&self) -> bool {
        self.unit.is_some()
    }

    /// No unit and no building
    pub fn is_vacant(&self) -> bool {
        self.unit.is_none() && self.building.is_none()
    }
}

/// Result of a successful path search
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    /// Start first, goal last
    pub tiles: Vec<Hex>,
    /// Sum of terrain costs of every tile after the start
    pub cost: u32,
}

/// Selection overlay read by the renderer
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Highlights {
    pub selected: Option<Hex>,
    pub reachable: FxHashSet<Hex>,
    pub attackable_enemies: FxHashSet<Hex>,
    pub reachable_enemies: FxHashSet<Hex>,
    pub path_preview: Vec<Hex>,
}

impl Highlights {
    pub fn clear(&mut self) {
        *self = Highlights::default();
    }
}

/// Largest row or column count a board may have
pub const MAX_EXTENT: u32 = 1024;

/// Hex board laid out as `rows` offset rows of `cols` tiles
#[derive(Clone, Debug)]
pub struct Board {
    rows: u32,
    cols: u32,
    tiles: FxHashMap<Hex, Tile>,
    highlights: Highlights,
}

impl Board {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Fill every in-extent coordinate with random terrain
    pub fn generate<R: Rng + ?Sized>(rows: u32, cols: u32, rng: &mut R) -> Self {
        Self::build(rows, cols, |_| Terrain::random(rng))
    }

    /// Same extent as `generate`, one terrain everywhere
    pub fn uniform(rows: u32, cols: u32, terrain: Terrain) -> Self {
        Self::build(rows, cols, |_| terrain)
    }

    /// Extents past [`MAX_EXTENT`] are clamped
    fn build(rows: u32, cols: u32, mut terrain_at: impl FnMut(Hex) -> Terrain) -> Self {
        let (rows, cols) = (rows.min(MAX_EXTENT), cols.min(MAX_EXTENT));
        let mut tiles = FxHashMap::default();
        for r in 0..rows as i32 {
            let (min_q, max_q) = row_span(r, cols);
            for q in min_q..max_q {
                let hex = Hex::axial(q, r);
                tiles.insert(hex, Tile::new(hex, terrain_at(hex)));
            }
        }
        Self {
            rows,
            cols,
            tiles,
            highlights: Highlights::default(),
        }
    }

    /// Rebuild from a flat tile list (load path)
    pub fn from_tiles(
        rows: u32,
        cols: u32,
        layout: impl IntoIterator<Item = (Hex, Terrain)>,
    ) -> Result<Self, PersistenceError> {
        if rows > MAX_EXTENT || cols > MAX_EXTENT {
            return Err(PersistenceError::BoardTooLarge { rows, cols });
        }
        let mut tiles = FxHashMap::default();
        for (hex, terrain) in layout {
            if tiles.insert(hex, Tile::new(hex, terrain)).is_some() {
                return Err(PersistenceError::DuplicateTile(hex));
            }
        }
        Ok(Self {
            rows,
            cols,
            tiles,
            highlights: Highlights::default(),
        })
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Whether `hex` falls inside the generated rows x cols extent
    pub fn in_extent(&self, hex: Hex) -> bool {
        if hex.r() < 0 || hex.r() >= self.rows as i32 {
            return false;
        }
        let (min_q, max_q) = row_span(hex.r(), self.cols);
        (min_q..max_q).contains(&hex.q())
    }

    pub fn contains(&self, hex: Hex) -> bool {
        self.tiles.contains_key(&hex)
    }

    pub fn tile_at(&self, hex: Hex) -> Option<&Tile> {
        self.tiles.get(&hex)
    }

    pub fn tile_at_mut(&mut self, hex: Hex) -> Option<&mut Tile> {
        self.tiles.get_mut(&hex)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.values()
    }

    /// Existing tiles adjacent to `hex`
    pub fn neighbor_tiles(&self, hex: Hex) -> impl Iterator<Item = &Tile> + '_ {
        hex.neighbors().filter_map(move |n| self.tiles.get(&n))
    }

    pub fn highlights(&self) -> &Highlights {
        &self.highlights
    }

    pub fn highlights_mut(&mut self) -> &mut Highlights {
        &mut self.highlights
    }

    pub fn clear_highlights(&mut self) {
        self.highlights.clear();
    }

    // ========================================================================
    // SEARCH
    // ========================================================================

    /// A* from `start` to `goal`.
    ///
    /// Entering a tile costs its terrain cost. Tiles holding a unit are never
    /// crossed, but the goal itself may hold one.
    pub fn find_path(&self, start: Hex, goal: Hex) -> Option<Path> {
        if !self.contains(start) || !self.contains(goal) {
            return None;
        }

        let mut open = BinaryHeap::new();
        let mut closed = FxHashSet::default();
        let mut came_from: FxHashMap<Hex, Hex> = FxHashMap::default();
        let mut g_score: FxHashMap<Hex, u32> = FxHashMap::default();
        // Insertion counter breaks f-score ties deterministically
        let mut seq: u64 = 0;

        g_score.insert(start, 0);
        open.push(Reverse((start.distance_to(goal), seq, start)));

        while let Some(Reverse((_, _, current))) = open.pop() {
            if !closed.insert(current) {
                continue;
            }
            let g = g_score[&current];

            if current == goal {
                return Some(Path {
                    tiles: reconstruct_path(&came_from, current),
                    cost: g,
                });
            }

            for neighbor in self.neighbor_tiles(current) {
                if neighbor.has_unit() && neighbor.hex != goal {
                    continue;
                }
                let tentative = g + neighbor.terrain.movement_cost();
                if tentative < g_score.get(&neighbor.hex).copied().unwrap_or(u32::MAX) {
                    came_from.insert(neighbor.hex, current);
                    g_score.insert(neighbor.hex, tentative);
                    seq += 1;
                    let f = tentative + neighbor.hex.distance_to(goal);
                    open.push(Reverse((f, seq, neighbor.hex)));
                }
            }
        }

        None
    }

    /// Breadth-first reachability from `origin`.
    ///
    /// Movement steps spend terrain cost and stop once the budget would go
    /// negative; with `include_occupied` off they never enter a tile holding
    /// a unit. Each of the `extra_steps` enters any neighbor regardless of
    /// cost or occupancy and leaves no movement behind. States are keyed on
    /// (tile, movement left, extra steps left) since the same tile reached
    /// with different budgets unlocks different expansions.
    pub fn reachable_tiles(
        &self,
        origin: Hex,
        movement: u32,
        include_occupied: bool,
        extra_steps: u32,
    ) -> FxHashSet<Hex> {
        let mut reachable = FxHashSet::default();
        if !self.contains(origin) {
            return reachable;
        }

        let start = (origin, movement, extra_steps);
        let mut visited = FxHashSet::default();
        visited.insert(start);
        let mut queue = VecDeque::from([start]);

        while let Some((current, remaining, extra)) = queue.pop_front() {
            reachable.insert(current);

            for neighbor in self.neighbor_tiles(current) {
                let blocked = !include_occupied && neighbor.has_unit();

                if !blocked && remaining > 0 {
                    if let Some(left) = remaining.checked_sub(neighbor.terrain.movement_cost()) {
                        let state = (neighbor.hex, left, extra);
                        if visited.insert(state) {
                            queue.push_back(state);
                        }
                    }
                }

                if extra > 0 {
                    let state = (neighbor.hex, 0, extra - 1);
                    if visited.insert(state) {
                        queue.push_back(state);
                    }
                }
            }
        }

        reachable
    }

    /// Every board tile within `radius` of `center`, center included
    pub fn hexes_in_radius(&self, center: Hex, radius: u32) -> Vec<Hex> {
        let radius = radius as i32;
        let mut results = Vec::new();
        for dq in -radius..=radius {
            for dr in (-radius).max(-dq - radius)..=radius.min(-dq + radius) {
                let hex = center + Hex::axial(dq, dr);
                if self.contains(hex) {
                    results.push(hex);
                }
            }
        }
        results
    }
}

/// Half-open q range of row `r` in the offset layout
fn row_span(r: i32, cols: u32) -> (i32, i32) {
    let min_q = (-r).div_euclid(2);
    (min_q, min_q + cols as i32)
}

fn reconstruct_path(came_from: &FxHashMap<Hex, Hex>, mut current: Hex) -> Vec<Hex> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        current = prev;
        path.push(current);
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn board_from(layout: &[((i32, i32), Terrain)]) -> Board {
        Board::from_tiles(
            1,
            layout.len() as u32,
            layout.iter().map(|&((q, r), t)| (Hex::axial(q, r), t)),
        )
        .unwrap()
    }

    fn put_unit(board: &mut Board, hex: Hex, id: u32) {
        board.tile_at_mut(hex).unwrap().unit = Some(UnitId(id));
    }

    #[test]
    fn test_generate_extent() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let board = Board::generate(6, 5, &mut rng);
        assert_eq!(board.len(), 30);
        assert!(board.tiles().all(|t| board.in_extent(t.hex)));
        // Odd rows shift left by one more column
        assert!(board.contains(Hex::axial(-1, 1)));
        assert!(!board.contains(Hex::axial(4, 1)));
        assert!(board.contains(Hex::axial(-2, 5)));
        assert!(board.tile_at(Hex::axial(0, 6)).is_none());
    }

    #[test]
    fn test_duplicate_tile_rejected() {
        let hex = Hex::axial(0, 0);
        let result = Board::from_tiles(1, 1, [(hex, Terrain::Grass), (hex, Terrain::Sand)]);
        assert!(matches!(result, Err(PersistenceError::DuplicateTile(h)) if h == hex));
    }

    #[test]
    fn test_extent_is_bounded() {
        let board = Board::uniform(MAX_EXTENT + 5, 2, Terrain::Grass);
        assert_eq!((board.rows(), board.cols()), (MAX_EXTENT, 2));
        assert!(!board.in_extent(Hex::axial(0, MAX_EXTENT as i32)));

        let result = Board::from_tiles(u32::MAX, 1, [(Hex::axial(0, 0), Terrain::Grass)]);
        assert!(matches!(
            result,
            Err(PersistenceError::BoardTooLarge { rows: u32::MAX, cols: 1 })
        ));
    }

    #[test]
    fn test_path_on_grass_3x3() {
        let mut board = Board::uniform(3, 3, Terrain::Grass);
        let start = Hex::axial(0, 0);
        let goal = Hex::axial(2, 0);
        put_unit(&mut board, start, 1);
        put_unit(&mut board, goal, 2);

        let path = board.find_path(start, goal).unwrap();
        assert_eq!(path.tiles.len(), 3);
        assert_eq!(path.cost, 2);
        assert_eq!(path.tiles.first(), Some(&start));
        assert_eq!(path.tiles.last(), Some(&goal));
    }

    #[test]
    fn test_path_cost_matches_terrain() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let board = Board::generate(8, 8, &mut rng);
        let start = Hex::axial(0, 0);
        let goal = Hex::axial(3, 7);
        let path = board.find_path(start, goal).unwrap();

        assert_eq!(path.tiles[0], start);
        assert_eq!(*path.tiles.last().unwrap(), goal);
        let summed: u32 = path.tiles[1..]
            .iter()
            .map(|h| board.tile_at(*h).unwrap().terrain.movement_cost())
            .sum();
        assert_eq!(path.cost, summed);
        for pair in path.tiles.windows(2) {
            assert_eq!(pair[0].distance_to(pair[1]), 1);
        }
    }

    #[test]
    fn test_path_avoids_mountain_when_cheaper() {
        let board = board_from(&[
            ((0, 0), Terrain::Grass),
            ((1, 0), Terrain::Mountain),
            ((2, 0), Terrain::Grass),
            ((1, -1), Terrain::Grass),
            ((2, -1), Terrain::Grass),
        ]);
        let path = board.find_path(Hex::axial(0, 0), Hex::axial(2, 0)).unwrap();
        assert_eq!(path.cost, 3);
        assert!(!path.tiles.contains(&Hex::axial(1, 0)));
    }

    #[test]
    fn test_path_through_mountain_when_forced() {
        let board = board_from(&[
            ((0, 0), Terrain::Grass),
            ((1, 0), Terrain::Mountain),
            ((2, 0), Terrain::Grass),
        ]);
        let path = board.find_path(Hex::axial(0, 0), Hex::axial(2, 0)).unwrap();
        assert_eq!(path.cost, 6);
    }

    #[test]
    fn test_path_blocked_by_units() {
        let mut board = board_from(&[
            ((0, 0), Terrain::Grass),
            ((1, 0), Terrain::Grass),
            ((2, 0), Terrain::Grass),
        ]);
        put_unit(&mut board, Hex::axial(1, 0), 7);
        assert!(board.find_path(Hex::axial(0, 0), Hex::axial(2, 0)).is_none());
        // Occupied goal is still a valid destination
        assert!(board.find_path(Hex::axial(0, 0), Hex::axial(1, 0)).is_some());
    }

    #[test]
    fn test_path_off_board() {
        let board = Board::uniform(2, 2, Terrain::Sand);
        assert!(board.find_path(Hex::axial(0, 0), Hex::axial(10, 10)).is_none());
        let trivial = board.find_path(Hex::axial(0, 0), Hex::axial(0, 0)).unwrap();
        assert_eq!(trivial.tiles, vec![Hex::axial(0, 0)]);
        assert_eq!(trivial.cost, 0);
    }

    #[test]
    fn test_reachable_zero_budget() {
        let board = Board::uniform(4, 4, Terrain::Grass);
        let origin = Hex::axial(1, 1);
        let reachable = board.reachable_tiles(origin, 0, false, 0);
        assert_eq!(reachable.len(), 1);
        assert!(reachable.contains(&origin));
    }

    #[test]
    fn test_reachable_respects_cost() {
        let board = board_from(&[
            ((0, 0), Terrain::Grass),
            ((1, 0), Terrain::Mountain),
            ((2, 0), Terrain::Grass),
            ((-1, 0), Terrain::Sand),
            ((-2, 0), Terrain::Grass),
        ]);
        let reachable = board.reachable_tiles(Hex::axial(0, 0), 4, false, 0);
        assert!(reachable.contains(&Hex::axial(-2, 0)));
        assert!(!reachable.contains(&Hex::axial(1, 0)));
        assert!(!reachable.contains(&Hex::axial(2, 0)));

        let reachable = board.reachable_tiles(Hex::axial(0, 0), 6, false, 0);
        assert!(reachable.contains(&Hex::axial(2, 0)));
    }

    #[test]
    fn test_reachable_occupancy_and_extra_steps() {
        let mut board = board_from(&[
            ((0, 0), Terrain::Grass),
            ((1, 0), Terrain::Grass),
            ((2, 0), Terrain::Grass),
            ((3, 0), Terrain::Mountain),
        ]);
        put_unit(&mut board, Hex::axial(1, 0), 3);

        let blocked = board.reachable_tiles(Hex::axial(0, 0), 5, false, 0);
        assert_eq!(blocked.len(), 1);

        let through = board.reachable_tiles(Hex::axial(0, 0), 2, true, 0);
        assert!(through.contains(&Hex::axial(2, 0)));
        assert!(!through.contains(&Hex::axial(3, 0)));

        // The extra step ignores both the unit and the mountain's cost
        let extra = board.reachable_tiles(Hex::axial(0, 0), 0, false, 1);
        assert!(extra.contains(&Hex::axial(1, 0)));
        assert!(!extra.contains(&Hex::axial(2, 0)));

        let widened = board.reachable_tiles(Hex::axial(0, 0), 2, true, 1);
        assert!(widened.contains(&Hex::axial(3, 0)));
    }

    #[test]
    fn test_reachable_extra_step_rings_movement_area() {
        let board = Board::uniform(7, 7, Terrain::Grass);
        let origin = Hex::axial(1, 3);

        let moves = board.reachable_tiles(origin, 2, false, 0);
        assert_eq!(moves.len(), 19);
        assert!(moves.iter().all(|h| h.distance_to(origin) <= 2));

        let targets = board.reachable_tiles(origin, 2, false, 1);
        assert_eq!(targets.len(), 37);
        assert!(targets.is_superset(&moves));
    }

    #[test]
    fn test_hexes_in_radius() {
        let board = Board::uniform(9, 9, Terrain::Grass);
        let center = Hex::axial(2, 4);
        assert_eq!(board.hexes_in_radius(center, 0), vec![center]);
        assert_eq!(board.hexes_in_radius(center, 1).len(), 7);
        assert_eq!(board.hexes_in_radius(center, 2).len(), 19);
        assert!(board
            .hexes_in_radius(center, 3)
            .iter()
            .all(|h| h.distance_to(center) <= 3));

        // Corner tiles lose the off-board part of the disc
        let corner = board.hexes_in_radius(Hex::axial(0, 0), 1);
        assert_eq!(corner.len(), 3);
    }

    #[test]
    fn test_highlights_clear() {
        let mut board = Board::uniform(2, 2, Terrain::Grass);
        board.highlights_mut().selected = Some(Hex::axial(0, 0));
        board.highlights_mut().path_preview = vec![Hex::axial(0, 0)];
        board.clear_highlights();
        assert_eq!(board.highlights(), &Highlights::default());
    }
}
