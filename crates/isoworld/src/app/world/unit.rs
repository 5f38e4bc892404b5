use std::fmt;

use super::{GridPos, Sprite, Tile, TileMap, Vec2};

/// Distance to the target below which a moving unit snaps onto it.
pub const ARRIVAL_THRESHOLD_PX: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out unit ids in creation order. Saturates instead of wrapping so a
/// very long session can never recycle an id.
#[derive(Debug, Default)]
pub struct UnitIdAllocator {
    next: u64,
}

impl UnitIdAllocator {
    pub fn allocate(&mut self) -> UnitId {
        let id = UnitId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Which tile flag gates a unit's destinations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mobility {
    /// Never accepts a destination.
    #[default]
    None,
    /// Moves onto walkable tiles.
    Walker,
    /// Moves onto navigable tiles.
    Navigator,
}

/// Compass facing, in spritesheet row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Direction {
    /// Spritesheet row order, top to bottom.
    pub const SHEET_ORDER: [Direction; 8] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    /// Buckets a movement vector into one of the eight facings.
    ///
    /// The angle is rotated by +90 degrees so screen-up maps to north, then
    /// split into 45-degree sectors centered on the principal angles. Zero
    /// or non-finite vectors have no facing.
    pub fn from_vector(dx: f32, dy: f32) -> Option<Self> {
        if !dx.is_finite() || !dy.is_finite() || (dx == 0.0 && dy == 0.0) {
            return None;
        }
        let degrees = dy.atan2(dx).to_degrees().rem_euclid(360.0);
        let rotated = (degrees + 90.0).rem_euclid(360.0);
        let sector = ((rotated + 22.5) / 45.0).floor() as usize % 8;
        Some(Self::SHEET_ORDER[sector])
    }

    /// Row index of this facing inside a unit spritesheet.
    pub fn sheet_row(self) -> u32 {
        match self {
            Direction::N => 0,
            Direction::NE => 1,
            Direction::E => 2,
            Direction::SE => 3,
            Direction::S => 4,
            Direction::SW => 5,
            Direction::W => 6,
            Direction::NW => 7,
        }
    }
}

/// Mobile actor: a sprite that walks or sails in a straight line toward a
/// player-picked tile, facing one of eight directions while it moves.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub id: UnitId,
    pub sprite: Sprite,
    pub speed: f32,
    pub mobility: Mobility,
    direction: Direction,
    target: Option<Vec2>,
    destination: Option<GridPos>,
}

impl Unit {
    pub fn new(id: UnitId, sprite: Sprite, speed: f32, mobility: Mobility) -> Self {
        Self {
            id,
            sprite,
            speed: if speed.is_finite() { speed.max(0.0) } else { 0.0 },
            mobility,
            direction: Direction::S,
            target: None,
            destination: None,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// World point the unit is heading for, if any.
    pub fn target(&self) -> Option<Vec2> {
        self.target
    }

    /// Grid cell the current target was resolved from, if any.
    pub fn destination(&self) -> Option<GridPos> {
        self.destination
    }

    pub fn is_selected(&self) -> bool {
        self.sprite.selected
    }

    /// Ticks the frame clock and refreshes both sheet offsets.
    pub fn advance_animation(&mut self, delta_seconds: f32) {
        self.sprite.advance_animation(delta_seconds);
        self.update_sprite_direction();
    }

    fn update_sprite_direction(&mut self) {
        self.sprite.offset.x = self.sprite.clock.current_frame() * self.sprite.width;
        self.sprite.offset.y = self.direction.sheet_row() * self.sprite.height;
    }

    /// Straight-line movement step. Arrival within `ARRIVAL_THRESHOLD_PX`
    /// snaps exactly onto the target and clears it; otherwise the unit turns
    /// toward the target and advances `speed * delta_seconds`, clamped per
    /// axis so a long step lands on the target instead of overshooting.
    pub fn update_movement(&mut self, delta_seconds: f32) {
        let Some(target) = self.target else {
            return;
        };
        let dx = target.x - self.sprite.position.x;
        let dy = target.y - self.sprite.position.y;
        let distance = (dx * dx + dy * dy).sqrt();
        if distance < ARRIVAL_THRESHOLD_PX {
            self.arrive(target);
            return;
        }
        if !(delta_seconds > 0.0) {
            return;
        }
        if let Some(direction) = Direction::from_vector(dx, dy) {
            self.direction = direction;
            self.update_sprite_direction();
        }
        let step = self.speed * delta_seconds;
        let step_x = dx / distance * step;
        let step_y = dy / distance * step;
        self.sprite.position.x = if step_x.abs() >= dx.abs() {
            target.x
        } else {
            self.sprite.position.x + step_x
        };
        self.sprite.position.y = if step_y.abs() >= dy.abs() {
            target.y
        } else {
            self.sprite.position.y + step_y
        };
        let rem_x = target.x - self.sprite.position.x;
        let rem_y = target.y - self.sprite.position.y;
        if (rem_x * rem_x + rem_y * rem_y).sqrt() < ARRIVAL_THRESHOLD_PX {
            self.arrive(target);
        }
    }

    fn arrive(&mut self, target: Vec2) {
        self.sprite.position = target;
        self.target = None;
        self.destination = None;
    }

    /// Selection and movement toggle. A selected unit treats a click outside
    /// its own bounding box as a move order; any other click re-evaluates
    /// selection from whether it hits the unit.
    pub fn on_click(&mut self, point: Vec2, map: &TileMap) {
        let hits_self = self.sprite.contains(point);
        if self.sprite.selected && !hits_self {
            self.set_destination(point, map);
        } else {
            self.sprite.selected = hits_self;
        }
    }

    /// Resolves the clicked tile and, when the unit's mobility matches the
    /// tile's flags, aims the unit so its center will land on the tile
    /// center. Misses and incompatible tiles leave the unit unchanged.
    pub fn set_destination(&mut self, point: Vec2, map: &TileMap) {
        let Some(cell) = map.tile_at_point(point) else {
            return;
        };
        let Some(tile) = map.tile_at(cell) else {
            return;
        };
        if !self.can_enter(tile) {
            return;
        }
        let tile_center = tile.sprite.center();
        self.target = Some(Vec2 {
            x: tile_center.x + self.sprite.width as f32 * 0.5,
            y: tile_center.y,
        });
        self.destination = Some(cell);
    }

    fn can_enter(&self, tile: &Tile) -> bool {
        match self.mobility {
            Mobility::None => false,
            Mobility::Walker => tile.is_walkable,
            Mobility::Navigator => tile.is_navigable,
        }
    }
}
