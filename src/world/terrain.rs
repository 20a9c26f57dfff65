//! Fixed-size terrain grid (`spec.md` §3 "TerrainTile").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileType {
    Grass,
    Dirt,
    Ocean,
    Mountain,
    Forest,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TerrainTile {
    pub tile_x: i32,
    pub tile_y: i32,
    pub tile_type: TileType,
    pub is_walkable: bool,
    pub water_volume: f32,
}

impl TerrainTile {
    pub fn new(tile_x: i32, tile_y: i32, tile_type: TileType) -> Self {
        let (is_walkable, water_volume) = match tile_type {
            TileType::Ocean => (false, 100.0),
            TileType::Mountain => (false, 0.0),
            _ => (true, 0.0),
        };
        Self { tile_x, tile_y, tile_type, is_walkable, water_volume }
    }
}

/// Fixed-size terrain grid. Tiles may transition type at runtime (e.g.
/// ocean draining to dirt) but the grid dimensions never change.
#[derive(Debug, Clone)]
pub struct TerrainGrid {
    width: i32,
    height: i32,
    tiles: Vec<TerrainTile>,
}

impl TerrainGrid {
    pub fn new_flat(width: i32, height: i32, default_type: TileType) -> Self {
        let mut tiles = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                tiles.push(TerrainTile::new(x, y, default_type));
            }
        }
        Self { width, height, tiles }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    fn index(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&TerrainTile> {
        if self.in_bounds(x, y) {
            Some(&self.tiles[self.index(x, y)])
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut TerrainTile> {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            Some(&mut self.tiles[idx])
        } else {
            None
        }
    }

    pub fn set_type(&mut self, x: i32, y: i32, tile_type: TileType) {
        if let Some(tile) = self.get_mut(x, y) {
            *tile = TerrainTile::new(x, y, tile_type);
        }
    }

    /// Consumes up to 1 unit of water from an ocean tile, returning the
    /// amount actually consumed. Draining an ocean tile to zero turns it
    /// to dirt (`spec.md` §3 "tiles may transition type").
    pub fn consume_water(&mut self, tile_x: i32, tile_y: i32) -> u32 {
        let Some(tile) = self.get_mut(tile_x, tile_y) else {
            return 0;
        };
        if tile.tile_type != TileType::Ocean || tile.water_volume <= 0.0 {
            return 0;
        }
        let consumed = tile.water_volume.min(1.0);
        tile.water_volume -= consumed;
        if tile.water_volume <= 0.0 {
            self.set_type(tile_x, tile_y, TileType::Dirt);
        }
        consumed as u32
    }
}
