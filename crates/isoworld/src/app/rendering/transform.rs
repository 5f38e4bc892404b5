use crate::app::world::{Camera, Vec2};

/// Logical size of the render surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Snaps a subpixel coordinate to the pixel grid. Floors toward negative
/// infinity so a value sliding across zero never reverses its rounding
/// direction between frames.
pub fn snap_px(value: f32) -> i32 {
    value.floor() as i32
}

/// Projects a world point into snapped screen pixels under the camera
/// translation. Camera zoom is tracked elsewhere and not composed here.
pub fn world_to_screen_px(camera: &Camera, world: Vec2) -> (i32, i32) {
    let screen = camera.world_to_screen(world);
    (snap_px(screen.x), snap_px(screen.y))
}
