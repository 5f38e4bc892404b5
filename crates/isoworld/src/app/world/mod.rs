mod camera;
mod clock;
mod session;
mod sprite;
mod tile;
mod tilemap;
mod unit;

pub use camera::{
    Camera, WorldBounds, CAMERA_ZOOM_DEFAULT, CAMERA_ZOOM_MAX, CAMERA_ZOOM_MIN, CAMERA_ZOOM_STEP,
};
pub use clock::AnimationClock;
pub use session::{GameSession, MouseEvent, MouseEventKind, Scenario};
pub use sprite::{Sprite, TextureOffset};
pub use tile::Tile;
pub use tilemap::{grid_to_screen, GridPos, TileMap, TileMapError};
pub use unit::{Direction, Mobility, Unit, UnitId, UnitIdAllocator, ARRIVAL_THRESHOLD_PX};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}
