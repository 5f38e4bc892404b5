use super::Vec2;

pub const CAMERA_ZOOM_DEFAULT: f32 = 1.0;
pub const CAMERA_ZOOM_MIN: f32 = 0.1;
pub const CAMERA_ZOOM_MAX: f32 = 3.0;
pub const CAMERA_ZOOM_STEP: f32 = 0.1;

const CAMERA_SPEED_DEFAULT: f32 = 1.0;

/// World-space rectangle the camera may not leave.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorldBounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

/// Viewport over the world plane.
///
/// The position is clamped against the world bounds on every write. Zoom is
/// tracked and clamped but not folded into `world_to_screen`/`screen_to_world`;
/// those are pure translations by the camera offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    position: Vec2,
    zoom: f32,
    width: f32,
    height: f32,
    bounds: WorldBounds,
    speed: f32,
}

impl Camera {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            position: Vec2::default(),
            zoom: CAMERA_ZOOM_DEFAULT,
            width,
            height,
            bounds: WorldBounds::default(),
            speed: CAMERA_SPEED_DEFAULT,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = if speed.is_finite() { speed.max(0.0) } else { 0.0 };
    }

    pub fn set_world_bounds(&mut self, bounds: WorldBounds) {
        self.bounds = bounds;
        let position = self.position;
        self.set_position(position.x, position.y);
    }

    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        let position = self.position;
        self.set_position(position.x, position.y);
    }

    /// Writes the position through the per-axis clamp
    /// `max(world_min, min(world_max - viewport_size, value))`. A world
    /// smaller than the viewport pins to the world minimum.
    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position = Vec2 {
            x: clamp_axis(x, self.bounds.min_x, self.bounds.max_x, self.width),
            y: clamp_axis(y, self.bounds.min_y, self.bounds.max_y, self.height),
        };
    }

    /// Pans by `(dx, dy)` scaled by the camera speed.
    pub fn move_by(&mut self, dx: f32, dy: f32) {
        let position = self.position;
        self.set_position(position.x + dx * self.speed, position.y + dy * self.speed);
    }

    /// Centers the viewport on a world point.
    pub fn center_on(&mut self, x: f32, y: f32) {
        self.set_position(x - self.width * 0.5, y - self.height * 0.5);
    }

    pub fn screen_to_world(&self, point: Vec2) -> Vec2 {
        Vec2 {
            x: point.x + self.position.x,
            y: point.y + self.position.y,
        }
    }

    pub fn world_to_screen(&self, point: Vec2) -> Vec2 {
        Vec2 {
            x: point.x - self.position.x,
            y: point.y - self.position.y,
        }
    }

    /// AABB overlap test between the viewport rectangle and a world-space
    /// rectangle whose top-left corner is `(x, y)`.
    pub fn is_visible(&self, x: f32, y: f32, width: f32, height: f32) -> bool {
        x + width >= self.position.x
            && x <= self.position.x + self.width
            && y + height >= self.position.y
            && y <= self.position.y + self.height
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom_clamped(&mut self, zoom: f32) {
        self.zoom = clamp_camera_zoom(zoom);
    }

    pub fn apply_zoom_steps(&mut self, steps: i32) {
        if steps == 0 {
            return;
        }
        let target_zoom = self.zoom + steps as f32 * CAMERA_ZOOM_STEP;
        self.set_zoom_clamped(target_zoom);
    }
}

fn clamp_axis(value: f32, world_min: f32, world_max: f32, viewport_size: f32) -> f32 {
    if !value.is_finite() {
        return world_min;
    }
    value.min(world_max - viewport_size).max(world_min)
}

fn clamp_camera_zoom(zoom: f32) -> f32 {
    if !zoom.is_finite() {
        return CAMERA_ZOOM_DEFAULT;
    }
    zoom.clamp(CAMERA_ZOOM_MIN, CAMERA_ZOOM_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounded_camera() -> Camera {
        let mut camera = Camera::new(200.0, 100.0);
        camera.set_world_bounds(WorldBounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 1000.0,
            max_y: 500.0,
        });
        camera
    }

    #[test]
    fn position_clamps_at_far_edge() {
        let mut camera = bounded_camera();
        camera.set_position(5000.0, 5000.0);
        assert_eq!(camera.position(), Vec2 { x: 800.0, y: 400.0 });
    }

    #[test]
    fn position_clamps_at_near_edge() {
        let mut camera = bounded_camera();
        camera.set_position(-50.0, -50.0);
        assert_eq!(camera.position(), Vec2 { x: 0.0, y: 0.0 });
    }

    #[test]
    fn world_smaller_than_viewport_pins_to_world_min() {
        let mut camera = Camera::new(200.0, 100.0);
        camera.set_world_bounds(WorldBounds {
            min_x: 10.0,
            min_y: 20.0,
            max_x: 60.0,
            max_y: 50.0,
        });
        camera.set_position(30.0, 30.0);
        assert_eq!(camera.position(), Vec2 { x: 10.0, y: 20.0 });
    }

    #[test]
    fn non_finite_position_falls_back_to_world_min() {
        let mut camera = bounded_camera();
        camera.set_position(f32::NAN, f32::INFINITY);
        assert_eq!(camera.position().x, 0.0);
        assert_eq!(camera.position().y, 400.0);
    }

    #[test]
    fn move_by_applies_speed_multiplier() {
        let mut camera = bounded_camera();
        camera.set_speed(10.0);
        camera.move_by(3.0, 2.0);
        assert_eq!(camera.position(), Vec2 { x: 30.0, y: 20.0 });
    }

    #[test]
    fn center_on_places_point_mid_viewport() {
        let mut camera = bounded_camera();
        camera.center_on(500.0, 250.0);
        assert_eq!(camera.position(), Vec2 { x: 400.0, y: 200.0 });
    }

    #[test]
    fn screen_and_world_conversions_are_inverse_translations() {
        let mut camera = bounded_camera();
        camera.set_position(100.0, 40.0);
        let world = camera.screen_to_world(Vec2 { x: 25.0, y: 5.0 });
        assert_eq!(world, Vec2 { x: 125.0, y: 45.0 });
        assert_eq!(camera.world_to_screen(world), Vec2 { x: 25.0, y: 5.0 });
    }

    #[test]
    fn visibility_is_an_aabb_overlap_test() {
        let mut camera = bounded_camera();
        camera.set_position(100.0, 100.0);
        assert!(camera.is_visible(150.0, 120.0, 32.0, 32.0));
        assert!(camera.is_visible(80.0, 90.0, 32.0, 32.0));
        assert!(!camera.is_visible(0.0, 0.0, 32.0, 32.0));
        assert!(!camera.is_visible(301.0, 120.0, 32.0, 32.0));
    }

    #[test]
    fn zoom_clamps_to_supported_range() {
        let mut camera = Camera::new(100.0, 100.0);
        camera.set_zoom_clamped(0.01);
        assert_eq!(camera.zoom(), CAMERA_ZOOM_MIN);
        camera.set_zoom_clamped(50.0);
        assert_eq!(camera.zoom(), CAMERA_ZOOM_MAX);
        camera.set_zoom_clamped(f32::NAN);
        assert_eq!(camera.zoom(), CAMERA_ZOOM_DEFAULT);
    }

    #[test]
    fn zoom_steps_accumulate_and_clamp() {
        let mut camera = Camera::new(100.0, 100.0);
        camera.apply_zoom_steps(3);
        assert!((camera.zoom() - 1.3).abs() < 0.000_1);
        camera.apply_zoom_steps(-100);
        assert_eq!(camera.zoom(), CAMERA_ZOOM_MIN);
    }

    #[test]
    fn negative_or_non_finite_speed_is_rejected() {
        let mut camera = Camera::new(100.0, 100.0);
        camera.set_speed(-4.0);
        assert_eq!(camera.speed(), 0.0);
        camera.set_speed(f32::NAN);
        assert_eq!(camera.speed(), 0.0);
    }

    #[test]
    fn shrinking_bounds_reclamps_current_position() {
        let mut camera = bounded_camera();
        camera.set_position(800.0, 400.0);
        camera.set_world_bounds(WorldBounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 400.0,
            max_y: 200.0,
        });
        assert_eq!(camera.position(), Vec2 { x: 200.0, y: 100.0 });
    }
}
