//! Room-and-corridor level generator.
//!
//! Rooms are placed by rejection sampling, carved to Floor, then chained in
//! creation order with L-shaped corridors. Extra corridors back to earlier
//! rooms add loops so the level is not a single line.

use bevy::math::Vec2;
use bevy::prelude::Resource;
use petgraph::algo::{connected_components, is_cyclic_undirected};
use petgraph::graph::{NodeIndex, UnGraph};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::grid::{Tile, TileGrid};
use super::GenerationConfig;
use crate::constants::ROOM_ATTEMPTS_PER_ROOM;
use crate::error::{CoreError, CoreResult};

/// A room within the level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Room {
    pub fn center(&self) -> (usize, usize) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Strict rectangle overlap; rooms sharing an edge do not intersect
    pub fn intersects(&self, other: &Room) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorridorKind {
    /// room[i] -> room[i - 1]
    Sequential,
    /// room[i] -> room[j], j <= i - 2
    Extra,
}

/// A carved L-shaped connection between two rooms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corridor {
    pub from: usize,
    pub to: usize,
    pub kind: CorridorKind,
    pub horizontal_first: bool,
}

/// Generated level
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dungeon {
    pub seed: u64,
    pub grid: TileGrid,
    pub rooms: Vec<Room>,
    pub corridors: Vec<Corridor>,
    pub start_position: Vec2,
    pub requested_rooms: usize,
}

impl Dungeon {
    pub fn start_room(&self) -> Option<&Room> {
        self.rooms.first()
    }

    /// World position near the center of a random room other than the start room.
    pub fn random_spawn_position<R: Rng + ?Sized>(&self, rng: &mut R) -> CoreResult<Vec2> {
        if self.rooms.len() < 2 {
            return Err(CoreError::NoValidPosition(format!(
                "need at least 2 rooms, level has {}",
                self.rooms.len()
            )));
        }

        let room = &self.rooms[rng.gen_range(1..self.rooms.len())];
        let (cx, cy) = room.center();

        // +/- 1 cell around the center, kept inside the room
        let x_lo = cx.saturating_sub(1).max(room.x);
        let x_hi = (cx + 1).min(room.x + room.width - 1);
        let y_lo = cy.saturating_sub(1).max(room.y);
        let y_hi = (cy + 1).min(room.y + room.height - 1);
        let x = rng.gen_range(x_lo..=x_hi);
        let y = rng.gen_range(y_lo..=y_hi);

        Ok(self.grid.tile_center(x, y))
    }

    /// Rooms as nodes, corridors as edges
    pub fn room_graph(&self) -> UnGraph<usize, CorridorKind> {
        let mut graph = UnGraph::with_capacity(self.rooms.len(), self.corridors.len());
        for idx in 0..self.rooms.len() {
            graph.add_node(idx);
        }
        for corridor in &self.corridors {
            graph.add_edge(
                NodeIndex::new(corridor.from),
                NodeIndex::new(corridor.to),
                corridor.kind,
            );
        }
        graph
    }

    pub fn is_fully_connected(&self) -> bool {
        self.rooms.len() <= 1 || connected_components(&self.room_graph()) == 1
    }

    /// True when at least one corridor closes a loop
    pub fn has_loops(&self) -> bool {
        is_cyclic_undirected(&self.room_graph())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DungeonGenerator {
    config: GenerationConfig,
}

impl DungeonGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn generate(&self, width: usize, height: usize, seed: u64) -> CoreResult<Dungeon> {
        self.config.validate_for(width, height)?;
        let _span = tracing::debug_span!("generate", width, height, seed).entered();

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut grid = TileGrid::filled(width, height, self.config.tile_size, Tile::Wall);

        // Phase 1: place and carve rooms
        let rooms = place_rooms(width, height, &self.config, &mut rng);
        for room in &rooms {
            carve_room(&mut grid, room);
        }
        info!(
            placed = rooms.len(),
            requested = self.config.room_count,
            "rooms placed"
        );

        // Phase 2: corridors
        let half_width = (self.config.corridor_width / 2) as i64;
        let mut corridors = Vec::with_capacity(rooms.len() * 2);

        for i in 1..rooms.len() {
            let horizontal_first = rng.gen_bool(0.5);
            carve_l_corridor(&mut grid, &rooms[i - 1], &rooms[i], horizontal_first, half_width);
            corridors.push(Corridor {
                from: i,
                to: i - 1,
                kind: CorridorKind::Sequential,
                horizontal_first,
            });
        }

        for i in 2..rooms.len() {
            if !rng.gen_bool(self.config.extra_corridor_chance) {
                continue;
            }
            let j = rng.gen_range(0..=i - 2);
            let horizontal_first = rng.gen_bool(0.5);
            carve_l_corridor(&mut grid, &rooms[i], &rooms[j], horizontal_first, half_width);
            corridors.push(Corridor {
                from: i,
                to: j,
                kind: CorridorKind::Extra,
                horizontal_first,
            });
        }
        debug!(corridors = corridors.len(), "corridors carved");

        // Phase 3: start position at the first room's center cell
        let start_position = rooms
            .first()
            .map(|room| {
                let (cx, cy) = room.center();
                grid.tile_center(cx, cy)
            })
            .unwrap_or(Vec2::ZERO);

        Ok(Dungeon {
            seed,
            grid,
            rooms,
            corridors,
            start_position,
            requested_rooms: self.config.room_count,
        })
    }
}

/// Generate a level with the default configuration
pub fn generate(width: usize, height: usize, seed: u64) -> CoreResult<Dungeon> {
    DungeonGenerator::default().generate(width, height, seed)
}

fn place_rooms(
    grid_w: usize,
    grid_h: usize,
    config: &GenerationConfig,
    rng: &mut Xoshiro256PlusPlus,
) -> Vec<Room> {
    let mut rooms: Vec<Room> = Vec::new();
    let max_attempts = config.room_count.saturating_mul(ROOM_ATTEMPTS_PER_ROOM);
    let mut attempts = 0;

    while rooms.len() < config.room_count && attempts < max_attempts {
        attempts += 1;

        let width = rng.gen_range(config.room_min_size..=config.room_max_size);
        let height = rng.gen_range(config.room_min_size..=config.room_max_size);
        let x = rng.gen_range(1..=grid_w - width - 1);
        let y = rng.gen_range(1..=grid_h - height - 1);
        let candidate = Room {
            x,
            y,
            width,
            height,
        };

        if rooms.iter().any(|r| r.intersects(&candidate)) {
            continue;
        }
        rooms.push(candidate);
    }

    rooms
}

fn carve_room(grid: &mut TileGrid, room: &Room) {
    for y in room.y..room.y + room.height {
        for x in room.x..room.x + room.width {
            grid.set(x, y, Tile::Floor);
        }
    }
}

/// Horizontal-first runs along `from`'s row then `to`'s column;
/// vertical-first runs along `from`'s column then `to`'s row.
fn carve_l_corridor(
    grid: &mut TileGrid,
    from: &Room,
    to: &Room,
    horizontal_first: bool,
    half_width: i64,
) {
    let (fx, fy) = from.center();
    let (tx, ty) = to.center();
    if horizontal_first {
        carve_horizontal(grid, fx, tx, fy, half_width);
        carve_vertical(grid, fy, ty, tx, half_width);
    } else {
        carve_vertical(grid, fy, ty, fx, half_width);
        carve_horizontal(grid, fx, tx, ty, half_width);
    }
}

fn carve_horizontal(grid: &mut TileGrid, x1: usize, x2: usize, y: usize, half_width: i64) {
    for x in x1.min(x2)..=x1.max(x2) {
        for w in -half_width..=half_width {
            grid.carve(x as i64, y as i64 + w, Tile::Corridor);
        }
    }
}

fn carve_vertical(grid: &mut TileGrid, y1: usize, y2: usize, x: usize, half_width: i64) {
    for y in y1.min(y2)..=y1.max(y2) {
        for w in -half_width..=half_width {
            grid.carve(x as i64 + w, y as i64, Tile::Corridor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CORRIDOR_WIDTH;

    #[test]
    fn test_generate_deterministic() {
        let a = generate(60, 45, 42).unwrap();
        let b = generate(60, 45, 42).unwrap();
        assert_eq!(a.grid, b.grid, "Same seed must produce same grid");
        assert_eq!(a.rooms, b.rooms);
        assert_eq!(a.corridors, b.corridors);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate(60, 45, 1).unwrap();
        let b = generate(60, 45, 2).unwrap();
        assert_ne!(a.grid, b.grid, "Different seeds should differ");
    }

    #[test]
    fn test_rooms_inside_border_and_disjoint() {
        let dungeon = generate(60, 45, 7).unwrap();
        assert!(!dungeon.rooms.is_empty());
        for (i, a) in dungeon.rooms.iter().enumerate() {
            assert!(a.x >= 1 && a.y >= 1);
            assert!(a.x + a.width < 60 && a.y + a.height < 45);
            for b in &dungeon.rooms[i + 1..] {
                assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn test_start_position_is_first_room_center() {
        let dungeon = generate(60, 45, 99).unwrap();
        let (cx, cy) = dungeon.rooms[0].center();
        assert_eq!(
            dungeon.start_position,
            Vec2::new((cx as f32 + 0.5) * 32.0, (cy as f32 + 0.5) * 32.0)
        );
        assert_eq!(
            dungeon.grid.tile_at_world(dungeon.start_position),
            Ok(Tile::Floor)
        );
    }

    #[test]
    fn test_all_walkable_cells_reachable() {
        for seed in [0u64, 3, 42, 1337, u64::MAX] {
            let dungeon = generate(60, 45, seed).unwrap();
            let (cx, cy) = dungeon.rooms[0].center();
            let unreachable = dungeon.grid.unreachable_from(cx, cy);
            assert!(unreachable.is_empty(), "seed {seed}: {unreachable:?}");
        }
    }

    #[test]
    fn test_room_graph_connected() {
        let dungeon = generate(60, 45, 5).unwrap();
        assert!(dungeon.is_fully_connected());
        let graph = dungeon.room_graph();
        assert_eq!(graph.node_count(), dungeon.rooms.len());
        assert_eq!(graph.edge_count(), dungeon.corridors.len());
        let sequential = dungeon
            .corridors
            .iter()
            .filter(|c| c.kind == CorridorKind::Sequential)
            .count();
        assert_eq!(sequential, dungeon.rooms.len() - 1);
    }

    #[test]
    fn test_extra_corridors_create_loops() {
        let config = GenerationConfig {
            extra_corridor_chance: 1.0,
            ..Default::default()
        };
        let dungeon = DungeonGenerator::new(config).generate(60, 45, 11).unwrap();
        assert!(dungeon.rooms.len() >= 3);
        assert!(dungeon.has_loops());
        for c in dungeon.corridors.iter().filter(|c| c.kind == CorridorKind::Extra) {
            assert!(c.to + 2 <= c.from, "extra corridor must skip a neighbour");
        }

        let no_extra = GenerationConfig {
            extra_corridor_chance: 0.0,
            ..Default::default()
        };
        let linear = DungeonGenerator::new(no_extra).generate(60, 45, 11).unwrap();
        assert!(!linear.has_loops());
    }

    #[test]
    fn test_gives_up_on_crowded_map() {
        let config = GenerationConfig {
            room_count: 50,
            ..Default::default()
        };
        let dungeon = DungeonGenerator::new(config).generate(14, 14, 3).unwrap();
        assert!(dungeon.rooms.len() < 50, "room list must not be padded");
        assert_eq!(dungeon.requested_rooms, 50);
    }

    #[test]
    fn test_spawn_requires_two_rooms() {
        let config = GenerationConfig {
            room_count: 1,
            ..Default::default()
        };
        let dungeon = DungeonGenerator::new(config).generate(30, 30, 8).unwrap();
        assert_eq!(dungeon.rooms.len(), 1);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        assert!(matches!(
            dungeon.random_spawn_position(&mut rng),
            Err(CoreError::NoValidPosition(_))
        ));
    }

    #[test]
    fn test_spawn_outside_start_room() {
        let dungeon = generate(60, 45, 21).unwrap();
        let start = dungeon.rooms[0];
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
        for _ in 0..50 {
            let pos = dungeon.random_spawn_position(&mut rng).unwrap();
            let (x, y) = dungeon.grid.world_to_tile(pos);
            assert!(!start.contains(x as usize, y as usize));
            assert_eq!(dungeon.grid.get(x, y), Ok(Tile::Floor));
        }
    }

    #[test]
    fn test_invalid_dimensions_refused() {
        assert!(matches!(
            generate(5, 5, 1),
            Err(CoreError::InvalidConfiguration(_))
        ));
    }

    fn corridor_grid(horizontal_first: bool) -> TileGrid {
        let from = Room { x: 2, y: 2, width: 5, height: 5 }; // center (4, 4)
        let to = Room { x: 20, y: 18, width: 5, height: 5 }; // center (22, 20)
        let mut grid = TileGrid::filled(30, 30, 32.0, Tile::Wall);
        let half_width = (CORRIDOR_WIDTH / 2) as i64;
        carve_l_corridor(&mut grid, &from, &to, horizontal_first, half_width);
        grid
    }

    #[test]
    fn test_horizontal_first_corridor_turns_at_target_column() {
        let grid = corridor_grid(true);
        assert_eq!(grid.get(22, 4), Ok(Tile::Corridor), "corner at (to.cx, from.cy)");
        assert_eq!(grid.get(4, 20), Ok(Tile::Wall), "other corner untouched");

        // horizontal leg along y = 4, band y in 3..=5
        for x in 4..=22 {
            for y in 3..=5 {
                assert_eq!(grid.get(x, y), Ok(Tile::Corridor), "({x}, {y})");
            }
            assert_eq!(grid.get(x, 2), Ok(Tile::Wall), "band too wide at ({x}, 2)");
        }
        for x in 4..=20 {
            assert_eq!(grid.get(x, 6), Ok(Tile::Wall), "band too wide at ({x}, 6)");
        }
        assert_eq!(grid.get(3, 4), Ok(Tile::Wall), "leg starts at the center");

        // vertical leg along x = 22, band x in 21..=23
        for y in 4..=20 {
            for x in 21..=23 {
                assert_eq!(grid.get(x, y), Ok(Tile::Corridor), "({x}, {y})");
            }
            assert_eq!(grid.get(24, y), Ok(Tile::Wall));
        }
        for y in 6..=20 {
            assert_eq!(grid.get(20, y), Ok(Tile::Wall));
        }
        assert_eq!(grid.get(22, 21), Ok(Tile::Wall), "leg ends at the center");
    }

    #[test]
    fn test_vertical_first_corridor_turns_at_source_column() {
        let grid = corridor_grid(false);
        assert_eq!(grid.get(4, 20), Ok(Tile::Corridor), "corner at (from.cx, to.cy)");
        assert_eq!(grid.get(22, 4), Ok(Tile::Wall), "other corner untouched");

        // vertical leg along x = 4, band x in 3..=5
        for y in 4..=20 {
            for x in 3..=5 {
                assert_eq!(grid.get(x, y), Ok(Tile::Corridor), "({x}, {y})");
            }
            assert_eq!(grid.get(2, y), Ok(Tile::Wall));
        }
        for y in 4..=18 {
            assert_eq!(grid.get(6, y), Ok(Tile::Wall));
        }

        // horizontal leg along y = 20, band y in 19..=21
        for x in 4..=22 {
            for y in 19..=21 {
                assert_eq!(grid.get(x, y), Ok(Tile::Corridor), "({x}, {y})");
            }
            assert_eq!(grid.get(x, 22), Ok(Tile::Wall));
        }
        assert_eq!(grid.get(23, 20), Ok(Tile::Wall));
    }

    #[test]
    fn test_corridors_never_overwrite_room_floor() {
        let config = GenerationConfig {
            extra_corridor_chance: 1.0,
            ..Default::default()
        };
        for seed in [1u64, 42, 777] {
            let dungeon = DungeonGenerator::new(config.clone()).generate(60, 45, seed).unwrap();
            let mut area = 0;
            for room in &dungeon.rooms {
                for y in room.y..room.y + room.height {
                    for x in room.x..room.x + room.width {
                        assert!(room.contains(x, y));
                        assert_eq!(
                            dungeon.grid.get(x as i64, y as i64),
                            Ok(Tile::Floor),
                            "seed {seed}: room cell ({x}, {y})"
                        );
                    }
                }
                area += room.width * room.height;
            }
            assert_eq!(dungeon.grid.count(Tile::Floor), area, "floor only inside rooms");
            assert!(dungeon.grid.count(Tile::Corridor) > 0);
        }
    }

    #[test]
    fn test_room_intersection() {
        let a = Room { x: 1, y: 1, width: 5, height: 5 };
        let adjacent = Room { x: 6, y: 1, width: 5, height: 5 };
        let overlapping = Room { x: 5, y: 5, width: 3, height: 3 };
        assert!(!a.intersects(&adjacent), "edge-adjacent rooms are allowed");
        assert!(a.intersects(&overlapping));
        assert_eq!(a.center(), (3, 3));
    }
}
