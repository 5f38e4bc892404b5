use super::{AnimationClock, Vec2};

/// Top-left corner of the current frame inside a sprite sheet, in texels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextureOffset {
    pub x: u32,
    pub y: u32,
}

/// One drawable, animatable board piece.
///
/// `position` is the anchor the grid projection hands out: the frame's
/// center sits at `(position.x - width/2, position.y)`. Hit tests and the
/// renderer both resolve geometry through `center()`, so the point a click
/// lands on is the point the frame is drawn around.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub position: Vec2,
    pub width: u32,
    pub height: u32,
    sheet_key: String,
    pub offset: TextureOffset,
    pub zoom: f32,
    pub shown: bool,
    pub selected: bool,
    pub clock: AnimationClock,
}

impl Sprite {
    pub fn new(sheet_key: impl Into<String>, width: u32, height: u32, clock: AnimationClock) -> Self {
        Self {
            position: Vec2::default(),
            width,
            height,
            sheet_key: sheet_key.into(),
            offset: TextureOffset::default(),
            zoom: 1.0,
            shown: true,
            selected: false,
            clock,
        }
    }

    pub fn sheet_key(&self) -> &str {
        &self.sheet_key
    }

    /// World-space center of the frame.
    pub fn center(&self) -> Vec2 {
        Vec2 {
            x: self.position.x - self.width as f32 * 0.5,
            y: self.position.y,
        }
    }

    /// Axis-aligned bounding-box test around `center()`, edges included.
    pub fn contains(&self, point: Vec2) -> bool {
        let center = self.center();
        let half_width = self.width as f32 * 0.5;
        let half_height = self.height as f32 * 0.5;
        point.x >= center.x - half_width
            && point.x <= center.x + half_width
            && point.y >= center.y - half_height
            && point.y <= center.y + half_height
    }

    /// `(x, y, width, height)` of the current frame inside the sheet.
    pub fn source_rect(&self) -> (u32, u32, u32, u32) {
        (self.offset.x, self.offset.y, self.width, self.height)
    }

    /// Ticks the clock and moves the sheet column to the resulting frame.
    pub fn advance_animation(&mut self, delta_seconds: f32) {
        let frame = self.clock.advance(delta_seconds);
        self.offset.x = frame * self.width;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grass_sprite() -> Sprite {
        let mut sprite = Sprite::new("grass", 64, 32, AnimationClock::new(4, 0.4));
        sprite.position = Vec2 { x: 100.0, y: 50.0 };
        sprite
    }

    #[test]
    fn center_trails_the_anchor_by_half_a_width() {
        let sprite = grass_sprite();
        assert_eq!(sprite.center(), Vec2 { x: 68.0, y: 50.0 });
    }

    #[test]
    fn contains_accepts_box_interior_and_edges() {
        let sprite = grass_sprite();
        assert!(sprite.contains(Vec2 { x: 68.0, y: 50.0 }));
        assert!(sprite.contains(Vec2 { x: 36.0, y: 34.0 }));
        assert!(sprite.contains(Vec2 { x: 100.0, y: 66.0 }));
        assert!(!sprite.contains(Vec2 { x: 35.9, y: 50.0 }));
        assert!(!sprite.contains(Vec2 { x: 68.0, y: 66.1 }));
    }

    #[test]
    fn advancing_moves_the_sheet_column() {
        let mut sprite = grass_sprite();
        sprite.advance_animation(0.1);
        assert_eq!(sprite.offset, TextureOffset { x: 64, y: 0 });
        sprite.advance_animation(0.2);
        assert_eq!(sprite.offset, TextureOffset { x: 192, y: 0 });
    }

    #[test]
    fn source_rect_tracks_offset_and_frame_size() {
        let mut sprite = grass_sprite();
        sprite.offset = TextureOffset { x: 128, y: 32 };
        assert_eq!(sprite.source_rect(), (128, 32, 64, 32));
    }
}
