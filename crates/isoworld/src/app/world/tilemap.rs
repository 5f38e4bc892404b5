use std::collections::HashMap;

use thiserror::Error;

use super::{Tile, Vec2, WorldBounds};

/// Row/column address of a map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Error)]
pub enum TileMapError {
    #[error("tile list holds {actual} tiles but a {rows}x{cols} grid needs {expected}")]
    TileCountMismatch {
        rows: usize,
        cols: usize,
        expected: usize,
        actual: usize,
    },
}

/// Projects a grid cell onto the screen plane using the 2:1 isometric
/// transform. `surface_width` centers column zero of row zero horizontally.
pub fn grid_to_screen(
    row: usize,
    col: usize,
    tile_width: u32,
    tile_height: u32,
    surface_width: f32,
) -> Vec2 {
    let step = tile_height as f32;
    Vec2 {
        x: (row as f32 - col as f32) * step + (surface_width - tile_width as f32) * 0.5,
        y: (row + col) as f32 * step * 0.5,
    }
}

/// Rectangular grid of tiles laid out on the isometric plane.
///
/// Tiles are stored row-major. Layout is derived from the surface width
/// captured at load time; resizing the window moves the camera viewport,
/// never the world.
#[derive(Debug, Clone, PartialEq)]
pub struct TileMap {
    rows: usize,
    cols: usize,
    tile_width: u32,
    tile_height: u32,
    surface_width: f32,
    tiles: Vec<Tile>,
}

impl TileMap {
    pub fn new(
        rows: usize,
        cols: usize,
        tile_width: u32,
        tile_height: u32,
        tiles: Vec<Tile>,
    ) -> Result<Self, TileMapError> {
        let expected = rows * cols;
        if tiles.len() != expected {
            return Err(TileMapError::TileCountMismatch {
                rows,
                cols,
                expected,
                actual: tiles.len(),
            });
        }
        Ok(Self {
            rows,
            cols,
            tile_width,
            tile_height,
            surface_width: 0.0,
            tiles,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    pub fn surface_width(&self) -> f32 {
        self.surface_width
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Captures the surface width and positions every tile from its grid
    /// address.
    pub fn assign_layout(&mut self, surface_width: f32) {
        self.surface_width = surface_width;
        self.apply_layout();
    }

    fn apply_layout(&mut self) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let position =
                    grid_to_screen(row, col, self.tile_width, self.tile_height, self.surface_width);
                let index = self.index_of(row, col);
                self.tiles[index].sprite.position = position;
            }
        }
    }

    /// Per-tick work: advance animations with per-sheet synchronization,
    /// then re-derive tile positions.
    pub fn update(&mut self, delta_seconds: f32) {
        self.sync_animations(delta_seconds);
        self.apply_layout();
    }

    /// Advances one clock per sheet key and mirrors it onto every other tile
    /// that shares the sheet. The first tile encountered in row-major order
    /// becomes the master for its key this tick.
    fn sync_animations(&mut self, delta_seconds: f32) {
        let mut masters: HashMap<String, usize> = HashMap::new();
        for index in 0..self.tiles.len() {
            let master_index = masters.get(self.tiles[index].sprite.sheet_key()).copied();
            match master_index {
                Some(master_index) => {
                    let master_clock = self.tiles[master_index].sprite.clock;
                    let sprite = &mut self.tiles[index].sprite;
                    sprite.clock.sync_with(&master_clock);
                    sprite.offset.x = sprite.clock.current_frame() * sprite.width;
                }
                None => {
                    let sprite = &mut self.tiles[index].sprite;
                    sprite.advance_animation(delta_seconds);
                    let key = sprite.sheet_key().to_string();
                    masters.insert(key, index);
                }
            }
        }
    }

    fn index_of(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn tile_at(&self, pos: GridPos) -> Option<&Tile> {
        if pos.row >= self.rows || pos.col >= self.cols {
            return None;
        }
        self.tiles.get(pos.row * self.cols + pos.col)
    }

    pub fn tile_at_mut(&mut self, pos: GridPos) -> Option<&mut Tile> {
        if pos.row >= self.rows || pos.col >= self.cols {
            return None;
        }
        let index = pos.row * self.cols + pos.col;
        self.tiles.get_mut(index)
    }

    /// Finds the tile under a world point. Scans row-major and keeps the
    /// first diamond that claims the point, so shared edges resolve to the
    /// earlier tile.
    pub fn tile_at_point(&self, point: Vec2) -> Option<GridPos> {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let index = row * self.cols + col;
                if self.tiles[index].contains_point(point) {
                    return Some(GridPos { row, col });
                }
            }
        }
        None
    }

    /// Bounding box of every tile diamond, for camera clamping.
    pub fn world_bounds(&self) -> WorldBounds {
        let mut bounds: Option<WorldBounds> = None;
        for tile in &self.tiles {
            let center = tile.sprite.center();
            let half_width = tile.sprite.width as f32 * 0.5;
            let half_height = tile.sprite.height as f32 * 0.5;
            bounds = Some(match bounds {
                Some(current) => WorldBounds {
                    min_x: current.min_x.min(center.x - half_width),
                    min_y: current.min_y.min(center.y - half_height),
                    max_x: current.max_x.max(center.x + half_width),
                    max_y: current.max_y.max(center.y + half_height),
                },
                None => WorldBounds {
                    min_x: center.x - half_width,
                    min_y: center.y - half_height,
                    max_x: center.x + half_width,
                    max_y: center.y + half_height,
                },
            });
        }
        bounds.unwrap_or_default()
    }
}

impl Default for TileMap {
    /// Empty zero-by-zero map. It renders nothing and its collapsed world
    /// bounds pin the camera at the origin.
    fn default() -> Self {
        Self {
            rows: 0,
            cols: 0,
            tile_width: 0,
            tile_height: 0,
            surface_width: 0.0,
            tiles: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::world::{AnimationClock, Sprite};

    fn ocean_tile() -> Tile {
        Tile::new(Sprite::new("ocean", 64, 32, AnimationClock::new(3, 0.45))).navigable(true)
    }

    fn ocean_map() -> TileMap {
        let template = ocean_tile();
        let tiles = vec![template.clone(), template.clone(), template.clone(), template];
        let mut map = TileMap::new(2, 2, 64, 32, tiles).unwrap();
        map.assign_layout(640.0);
        map
    }

    #[test]
    fn new_rejects_wrong_tile_count() {
        let err = TileMap::new(2, 3, 64, 32, vec![ocean_tile()]).unwrap_err();
        match err {
            TileMapError::TileCountMismatch { expected, actual, .. } => {
                assert_eq!(expected, 6);
                assert_eq!(actual, 1);
            }
        }
    }

    #[test]
    fn layout_follows_the_isometric_projection() {
        let map = ocean_map();
        let at = |row, col| map.tile_at(GridPos { row, col }).unwrap().sprite.position;
        assert_eq!(at(0, 0), Vec2 { x: 288.0, y: 0.0 });
        assert_eq!(at(0, 1), Vec2 { x: 256.0, y: 16.0 });
        assert_eq!(at(1, 0), Vec2 { x: 320.0, y: 16.0 });
        assert_eq!(at(1, 1), Vec2 { x: 288.0, y: 32.0 });
    }

    #[test]
    fn update_keeps_shared_sheets_in_lockstep() {
        let mut map = ocean_map();
        map.update(0.1);
        for tile in map.tiles() {
            assert_eq!(tile.sprite.clock.current_frame(), 0);
            assert!((tile.sprite.clock.accumulator() - 0.1).abs() < 0.000_001);
        }
        map.update(0.1);
        for tile in map.tiles() {
            assert_eq!(tile.sprite.clock.current_frame(), 1);
            assert!((tile.sprite.clock.accumulator() - 0.05).abs() < 0.000_001);
            assert_eq!(tile.sprite.offset.x, 64);
        }
        map.update(0.1);
        for tile in map.tiles() {
            assert_eq!(tile.sprite.clock.current_frame(), 2);
            assert!(tile.sprite.clock.accumulator().abs() < 0.000_001);
            assert_eq!(tile.sprite.offset.x, 128);
        }
    }

    #[test]
    fn desynced_follower_snaps_to_master() {
        let mut map = ocean_map();
        map.tile_at_mut(GridPos { row: 1, col: 1 })
            .unwrap()
            .sprite
            .advance_animation(0.3);
        map.update(0.1);
        let master = map.tile_at(GridPos { row: 0, col: 0 }).unwrap().sprite.clock;
        let follower = map.tile_at(GridPos { row: 1, col: 1 }).unwrap().sprite.clock;
        assert_eq!(follower.current_frame(), master.current_frame());
        assert_eq!(follower.accumulator(), master.accumulator());
    }

    #[test]
    fn distinct_sheets_animate_independently() {
        let grass = Tile::new(Sprite::new("grass", 64, 32, AnimationClock::new(1, 0.0))).walkable(true);
        let tiles = vec![ocean_tile(), grass.clone(), grass, ocean_tile()];
        let mut map = TileMap::new(2, 2, 64, 32, tiles).unwrap();
        map.assign_layout(640.0);
        map.update(0.2);
        assert_eq!(
            map.tile_at(GridPos { row: 0, col: 0 }).unwrap().sprite.clock.current_frame(),
            1
        );
        assert_eq!(
            map.tile_at(GridPos { row: 0, col: 1 }).unwrap().sprite.clock.current_frame(),
            0
        );
    }

    #[test]
    fn tile_lookup_rejects_out_of_range_addresses() {
        let map = ocean_map();
        assert!(map.tile_at(GridPos { row: 2, col: 0 }).is_none());
        assert!(map.tile_at(GridPos { row: 0, col: 2 }).is_none());
    }

    #[test]
    fn point_lookup_hits_diamond_centers() {
        let map = ocean_map();
        assert_eq!(
            map.tile_at_point(Vec2 { x: 256.0, y: 0.0 }),
            Some(GridPos { row: 0, col: 0 })
        );
        assert_eq!(
            map.tile_at_point(Vec2 { x: 288.0, y: 16.0 }),
            Some(GridPos { row: 1, col: 0 })
        );
        assert_eq!(map.tile_at_point(Vec2 { x: 0.0, y: 0.0 }), None);
    }

    #[test]
    fn shared_edges_resolve_to_the_first_row_major_tile() {
        let map = ocean_map();
        // Left vertex of (0,0) doubles as the top vertex of (0,1).
        assert_eq!(
            map.tile_at_point(Vec2 { x: 224.0, y: 0.0 }),
            Some(GridPos { row: 0, col: 0 })
        );
    }

    #[test]
    fn world_bounds_cover_every_tile() {
        let map = ocean_map();
        assert_eq!(
            map.world_bounds(),
            WorldBounds {
                min_x: 192.0,
                min_y: -16.0,
                max_x: 320.0,
                max_y: 48.0,
            }
        );
    }

    #[test]
    fn empty_map_has_default_bounds() {
        let map = TileMap::new(0, 0, 64, 32, Vec::new()).unwrap();
        assert_eq!(map.world_bounds(), WorldBounds::default());
    }

    #[test]
    fn default_map_is_empty() {
        let map = TileMap::default();
        assert_eq!(map.rows(), 0);
        assert_eq!(map.cols(), 0);
        assert!(map.tiles().is_empty());
        assert_eq!(map.world_bounds(), WorldBounds::default());
    }
}
