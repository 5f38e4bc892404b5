use super::{Sprite, Vec2};

/// One map cell: a sprite plus the traversal flags units check before
/// accepting a destination.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub sprite: Sprite,
    pub is_walkable: bool,
    pub is_navigable: bool,
    pub elevation: i32,
}

impl Tile {
    pub fn new(sprite: Sprite) -> Self {
        Self {
            sprite,
            is_walkable: false,
            is_navigable: false,
            elevation: 0,
        }
    }

    pub fn walkable(mut self, walkable: bool) -> Self {
        self.is_walkable = walkable;
        self
    }

    pub fn navigable(mut self, navigable: bool) -> Self {
        self.is_navigable = navigable;
        self
    }

    pub fn elevation(mut self, elevation: i32) -> Self {
        self.elevation = elevation;
        self
    }

    /// Diamond hit test: a point is inside when its normalized taxicab
    /// distance from the frame center is at most one. Boundary points count
    /// as inside. Degenerate frames never match.
    pub fn contains_point(&self, point: Vec2) -> bool {
        let half_width = self.sprite.width as f32 * 0.5;
        let half_height = self.sprite.height as f32 * 0.5;
        if half_width <= 0.0 || half_height <= 0.0 {
            return false;
        }
        let center = self.sprite.center();
        let rel_x = point.x - center.x;
        let rel_y = point.y - center.y;
        rel_x.abs() / half_width + rel_y.abs() / half_height <= 1.0
    }
}
