//! Tile grid produced by level generation.
//!
//! Cells are stored row-major. Every read goes through a bounds check and
//! reports `OutOfBounds` instead of clamping.

use std::collections::VecDeque;

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Tile types that can appear in a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    Wall,
    Floor,
    Corridor,
}

impl Tile {
    pub fn is_walkable(&self) -> bool {
        !matches!(self, Self::Wall)
    }

    /// Character used by the ASCII dump
    pub fn glyph(&self) -> char {
        match self {
            Self::Wall => '#',
            Self::Floor => '.',
            Self::Corridor => '+',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tile_size: f32,
    cells: Vec<Tile>,
}

impl TileGrid {
    pub(crate) fn filled(width: usize, height: usize, tile_size: f32, tile: Tile) -> Self {
        Self {
            width,
            height,
            tile_size,
            cells: vec![tile; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn get(&self, x: i64, y: i64) -> CoreResult<Tile> {
        if !self.contains(x, y) {
            return Err(CoreError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(self.cells[y as usize * self.width + x as usize])
    }

    /// Tile under a world-space position
    pub fn tile_at_world(&self, pos: Vec2) -> CoreResult<Tile> {
        let (x, y) = self.world_to_tile(pos);
        self.get(x, y)
    }

    /// True when the cell exists and is a wall. Out-of-bounds is not a wall.
    pub fn is_wall(&self, x: i64, y: i64) -> bool {
        matches!(self.get(x, y), Ok(Tile::Wall))
    }

    /// True when the cell exists and can be walked on
    pub fn is_walkable(&self, x: i64, y: i64) -> bool {
        self.get(x, y).map(|t| t.is_walkable()).unwrap_or(false)
    }

    pub fn world_to_tile(&self, pos: Vec2) -> (i64, i64) {
        (
            (pos.x / self.tile_size).floor() as i64,
            (pos.y / self.tile_size).floor() as i64,
        )
    }

    /// World-space center of a cell
    pub fn tile_center(&self, x: usize, y: usize) -> Vec2 {
        Vec2::new(
            (x as f32 + 0.5) * self.tile_size,
            (y as f32 + 0.5) * self.tile_size,
        )
    }

    /// Convert a wall cell; any other cell is left untouched
    pub(crate) fn carve(&mut self, x: i64, y: i64, tile: Tile) {
        if !self.contains(x, y) {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        if self.cells[idx] == Tile::Wall {
            self.cells[idx] = tile;
        }
    }

    /// Overwrite a cell unconditionally (room interiors)
    pub(crate) fn set(&mut self, x: usize, y: usize, tile: Tile) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = tile;
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> {
        self.cells.chunks(self.width.max(1))
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.cells.iter().filter(|t| **t == tile).count()
    }

    /// 4-connected flood fill over walkable cells.
    /// Returns a row-major visited mask; empty if the start is not walkable.
    pub fn reachable_from(&self, x: usize, y: usize) -> Vec<bool> {
        let mut visited = vec![false; self.cells.len()];
        if !self.is_walkable(x as i64, y as i64) {
            return visited;
        }

        let mut queue = VecDeque::new();
        visited[y * self.width + x] = true;
        queue.push_back((x as i64, y as i64));

        while let Some((cx, cy)) = queue.pop_front() {
            for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                let (nx, ny) = (cx + dx, cy + dy);
                if !self.is_walkable(nx, ny) {
                    continue;
                }
                let idx = ny as usize * self.width + nx as usize;
                if !visited[idx] {
                    visited[idx] = true;
                    queue.push_back((nx, ny));
                }
            }
        }
        visited
    }

    /// Walkable cells not reachable from (x, y)
    pub fn unreachable_from(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        let visited = self.reachable_from(x, y);
        self.cells
            .iter()
            .enumerate()
            .filter(|(idx, tile)| tile.is_walkable() && !visited[*idx])
            .map(|(idx, _)| (idx % self.width, idx / self.width))
            .collect()
    }

    /// Debug dump: `#` wall, `.` floor, `+` corridor
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in self.rows() {
            out.extend(row.iter().map(Tile::glyph));
            out.push('\n');
        }
        out
    }
}
