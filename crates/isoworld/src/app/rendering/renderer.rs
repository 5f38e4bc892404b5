use std::collections::{HashMap, HashSet};
use std::f32::consts::TAU;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::tools::{draw_overlay, OverlayData};
use crate::app::world::{Camera, GameSession, GridPos, Sprite, TileMap, Unit};
use crate::sprite_keys::validate_sprite_key;

use super::{world_to_screen_px, Viewport, PLACEHOLDER_HALF_SIZE_PX};

const CLEAR_COLOR: [u8; 4] = [18, 22, 30, 255];
const PLACEHOLDER_COLOR: [u8; 4] = [220, 220, 240, 255];
const OUTLINE_COLOR: [u8; 3] = [255, 255, 255];
const OUTLINE_RADIUS_PX: f32 = 2.0;
const OUTLINE_STAMP_COUNT: u32 = 8;
const SHADOW_COLOR: [u8; 3] = [0, 0, 0];
const SHADOW_OPACITY: u8 = 25;
const TARGET_MARKER_COLOR: [u8; 4] = [255, 120, 120, 255];
const TARGET_MARKER_HALF_SIZE_PX: i32 = 4;

struct LoadedSheet {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

/// Texture identity plus frame origin. Silhouettes are cached per frame, so a
/// sprite whose sheet key changes simply populates new entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SilhouetteKey {
    sheet_key: String,
    src_x: u32,
    src_y: u32,
}

/// Alpha mask of a single frame, used for drop shadows and selection
/// outlines.
struct Silhouette {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    asset_root: PathBuf,
    sheet_cache: HashMap<String, Option<LoadedSheet>>,
    warned_missing_sheets: HashSet<String>,
    silhouette_cache: HashMap<SilhouetteKey, Silhouette>,
}

impl Renderer {
    pub fn new(window: Arc<Window>, asset_root: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            asset_root,
            sheet_cache: HashMap::new(),
            warned_missing_sheets: HashSet::new(),
            silhouette_cache: HashMap::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_session(
        &mut self,
        session: &GameSession,
        overlay_data: Option<&OverlayData>,
    ) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }

        let width = self.viewport.width;
        let height = self.viewport.height;
        let asset_root = self.asset_root.as_path();
        let sheet_cache = &mut self.sheet_cache;
        let warned_missing_sheets = &mut self.warned_missing_sheets;
        let silhouette_cache = &mut self.silhouette_cache;
        let frame = self.pixels.frame_mut();

        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }

        let camera = session.camera();
        let scenario = session.scenario();

        draw_tile_map(
            frame,
            width,
            height,
            camera,
            &scenario.tile_map,
            sheet_cache,
            warned_missing_sheets,
            asset_root,
        );

        for unit in &scenario.units {
            draw_unit(
                frame,
                width,
                height,
                camera,
                unit,
                sheet_cache,
                warned_missing_sheets,
                silhouette_cache,
                asset_root,
            );
        }

        for unit in &scenario.units {
            if !unit.is_selected() {
                continue;
            }
            let Some(target) = unit.target() else {
                continue;
            };
            let (cx, cy) = world_to_screen_px(camera, target);
            draw_cross(
                frame,
                width,
                cx,
                cy,
                TARGET_MARKER_HALF_SIZE_PX,
                TARGET_MARKER_COLOR,
            );
        }

        if let Some(data) = overlay_data {
            draw_overlay(frame, width, height, data);
        }

        self.pixels.render()
    }
}

/// Tiles draw column-outer, row-inner; rows within a column advance down the
/// screen, so later rows paint over the shared diamond vertices of earlier
/// ones.
#[allow(clippy::too_many_arguments)]
fn draw_tile_map(
    frame: &mut [u8],
    width: u32,
    height: u32,
    camera: &Camera,
    map: &TileMap,
    sheet_cache: &mut HashMap<String, Option<LoadedSheet>>,
    warned_missing_sheets: &mut HashSet<String>,
    asset_root: &Path,
) {
    for col in 0..map.cols() {
        for row in 0..map.rows() {
            let Some(tile) = map.tile_at(GridPos { row, col }) else {
                continue;
            };
            let sprite = &tile.sprite;
            if !sprite.shown || !sprite_is_visible(camera, sprite) {
                continue;
            }
            let Some(sheet) = resolve_cached_sheet(
                sheet_cache,
                warned_missing_sheets,
                asset_root,
                sprite.sheet_key(),
            ) else {
                continue;
            };
            let (cx, cy) = world_to_screen_px(camera, sprite.center());
            draw_tile_diamond(frame, width, height, cx, cy, sheet, sprite.source_rect());
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_unit(
    frame: &mut [u8],
    width: u32,
    height: u32,
    camera: &Camera,
    unit: &Unit,
    sheet_cache: &mut HashMap<String, Option<LoadedSheet>>,
    warned_missing_sheets: &mut HashSet<String>,
    silhouette_cache: &mut HashMap<SilhouetteKey, Silhouette>,
    asset_root: &Path,
) {
    let sprite = &unit.sprite;
    if !sprite.shown || !sprite_is_visible(camera, sprite) {
        return;
    }
    let (cx, cy) = world_to_screen_px(camera, sprite.center());
    let Some(sheet) = resolve_cached_sheet(
        sheet_cache,
        warned_missing_sheets,
        asset_root,
        sprite.sheet_key(),
    ) else {
        draw_square(
            frame,
            width,
            height,
            cx,
            cy,
            PLACEHOLDER_HALF_SIZE_PX,
            PLACEHOLDER_COLOR,
        );
        return;
    };

    let src_rect = sprite.source_rect();
    let scale = normalized_scale(sprite.zoom);
    let (_, scaled_h) = scaled_frame_dimensions(src_rect.2, src_rect.3, scale);

    if let Some(silhouette) =
        silhouette_for_frame(silhouette_cache, sprite.sheet_key(), sheet, src_rect)
    {
        let shadow_cy = cy + (scaled_h as i32) / 2;
        draw_silhouette_scaled(
            frame,
            width,
            height,
            cx,
            shadow_cy,
            silhouette,
            scale,
            SHADOW_COLOR,
            SHADOW_OPACITY,
        );
        if sprite.selected {
            for (dx, dy) in outline_stamp_offsets() {
                draw_silhouette_scaled(
                    frame,
                    width,
                    height,
                    cx + dx,
                    cy + dy,
                    silhouette,
                    scale,
                    OUTLINE_COLOR,
                    255,
                );
            }
        }
    }

    draw_sheet_frame(frame, width, height, cx, cy, sheet, src_rect, scale);
}

/// Pads the visibility test downward so a drop shadow never pops out before
/// its owner leaves the view.
fn sprite_is_visible(camera: &Camera, sprite: &Sprite) -> bool {
    let center = sprite.center();
    let half_width = sprite.width as f32 * 0.5;
    let half_height = sprite.height as f32 * 0.5;
    camera.is_visible(
        center.x - half_width,
        center.y - half_height,
        sprite.width as f32,
        sprite.height as f32 + half_height,
    )
}

/// Maps a destination offset from the diamond center back into the source
/// frame. The frame is conceptually rotated 45 degrees and squashed to half
/// height: the frame's top-left corner lands on the diamond's top vertex and
/// the corners proceed clockwise. Returns `None` outside the diamond.
fn diamond_source_texel(
    dx: f32,
    dy: f32,
    half_width: f32,
    half_height: f32,
    frame_width: u32,
    frame_height: u32,
) -> Option<(u32, u32)> {
    if half_width <= 0.0 || half_height <= 0.0 || frame_width == 0 || frame_height == 0 {
        return None;
    }
    let u = dx / half_width;
    let v = dy / half_height;
    if u.abs() + v.abs() > 1.0 {
        return None;
    }
    let a = (u + v + 1.0) * 0.5;
    let b = (v - u + 1.0) * 0.5;
    let sx = ((a * frame_width as f32).floor() as i64).clamp(0, frame_width as i64 - 1) as u32;
    let sy = ((b * frame_height as f32).floor() as i64).clamp(0, frame_height as i64 - 1) as u32;
    Some((sx, sy))
}

fn draw_tile_diamond(
    frame: &mut [u8],
    width: u32,
    height: u32,
    cx: i32,
    cy: i32,
    sheet: &LoadedSheet,
    src_rect: (u32, u32, u32, u32),
) {
    let (src_x, src_y, frame_w, frame_h) = src_rect;
    if !source_rect_fits(sheet, src_rect) || frame_w == 0 || frame_h == 0 {
        return;
    }
    let half_width = frame_w as f32 * 0.5;
    let half_height = frame_h as f32 * 0.5;
    let reach_x = half_width.ceil() as i32;
    let reach_y = half_height.ceil() as i32;
    let sheet_width = sheet.width as usize;

    for py in (cy - reach_y)..=(cy + reach_y) {
        if py < 0 || py >= height as i32 {
            continue;
        }
        for px in (cx - reach_x)..=(cx + reach_x) {
            if px < 0 || px >= width as i32 {
                continue;
            }
            let Some((sx, sy)) = diamond_source_texel(
                (px - cx) as f32,
                (py - cy) as f32,
                half_width,
                half_height,
                frame_w,
                frame_h,
            ) else {
                continue;
            };
            let src_offset = (((src_y + sy) as usize) * sheet_width + (src_x + sx) as usize) * 4;
            let alpha = sheet.rgba[src_offset + 3];
            if alpha == 0 {
                continue;
            }
            let color = [
                sheet.rgba[src_offset],
                sheet.rgba[src_offset + 1],
                sheet.rgba[src_offset + 2],
                alpha,
            ];
            write_pixel_rgba_clipped(frame, width as usize, px, py, color);
        }
    }
}

fn source_rect_fits(sheet: &LoadedSheet, src_rect: (u32, u32, u32, u32)) -> bool {
    let (src_x, src_y, frame_w, frame_h) = src_rect;
    let expected_len = sheet.width as usize * sheet.height as usize * 4;
    src_x.checked_add(frame_w).is_some_and(|end| end <= sheet.width)
        && src_y.checked_add(frame_h).is_some_and(|end| end <= sheet.height)
        && sheet.rgba.len() >= expected_len
}

fn silhouette_for_frame<'a>(
    cache: &'a mut HashMap<SilhouetteKey, Silhouette>,
    sheet_key: &str,
    sheet: &LoadedSheet,
    src_rect: (u32, u32, u32, u32),
) -> Option<&'a Silhouette> {
    let (src_x, src_y, frame_w, frame_h) = src_rect;
    if !source_rect_fits(sheet, src_rect) || frame_w == 0 || frame_h == 0 {
        return None;
    }
    let key = SilhouetteKey {
        sheet_key: sheet_key.to_string(),
        src_x,
        src_y,
    };
    if !cache.contains_key(&key) {
        let mut alpha = Vec::with_capacity(frame_w as usize * frame_h as usize);
        let sheet_width = sheet.width as usize;
        for row in 0..frame_h {
            let row_offset = ((src_y + row) as usize * sheet_width + src_x as usize) * 4;
            for col in 0..frame_w as usize {
                alpha.push(sheet.rgba[row_offset + col * 4 + 3]);
            }
        }
        cache.insert(
            key.clone(),
            Silhouette {
                width: frame_w,
                height: frame_h,
                alpha,
            },
        );
    }
    cache.get(&key)
}

/// Eight stamp offsets evenly spaced on a circle around the sprite.
fn outline_stamp_offsets() -> [(i32, i32); OUTLINE_STAMP_COUNT as usize] {
    let mut offsets = [(0, 0); OUTLINE_STAMP_COUNT as usize];
    for (index, slot) in offsets.iter_mut().enumerate() {
        let theta = TAU * index as f32 / OUTLINE_STAMP_COUNT as f32;
        *slot = (
            (theta.cos() * OUTLINE_RADIUS_PX).round() as i32,
            (theta.sin() * OUTLINE_RADIUS_PX).round() as i32,
        );
    }
    offsets
}

#[allow(clippy::too_many_arguments)]
fn draw_silhouette_scaled(
    frame: &mut [u8],
    width: u32,
    height: u32,
    center_x: i32,
    center_y: i32,
    silhouette: &Silhouette,
    scale: f32,
    color: [u8; 3],
    opacity: u8,
) {
    if silhouette.width == 0 || silhouette.height == 0 || width == 0 || height == 0 {
        return;
    }
    if opacity == 0 {
        return;
    }
    let scale = normalized_scale(scale);
    let inv_scale = scale.recip();
    let (scaled_w, scaled_h) = scaled_frame_dimensions(silhouette.width, silhouette.height, scale);
    let left = center_x - (scaled_w as i32 / 2);
    let top = center_y - (scaled_h as i32 / 2);

    let draw_left = left.max(0);
    let draw_top = top.max(0);
    let draw_right = (left + scaled_w as i32).min(width as i32);
    let draw_bottom = (top + scaled_h as i32).min(height as i32);
    if draw_left >= draw_right || draw_top >= draw_bottom {
        return;
    }

    let mask_width = silhouette.width as usize;
    for out_y in draw_top..draw_bottom {
        let src_y = (((out_y - top) as f32) * inv_scale).floor() as u32;
        let src_y = src_y.min(silhouette.height - 1) as usize;
        for out_x in draw_left..draw_right {
            let src_x = (((out_x - left) as f32) * inv_scale).floor() as u32;
            let src_x = src_x.min(silhouette.width - 1) as usize;
            let mask_alpha = silhouette.alpha[src_y * mask_width + src_x];
            if mask_alpha == 0 {
                continue;
            }
            let effective = (mask_alpha as u32 * opacity as u32 / 255) as u8;
            if effective == 0 {
                continue;
            }
            blend_pixel_rgba_clipped(frame, width as usize, out_x, out_y, color, effective);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_sheet_frame(
    frame: &mut [u8],
    width: u32,
    height: u32,
    center_x: i32,
    center_y: i32,
    sheet: &LoadedSheet,
    src_rect: (u32, u32, u32, u32),
    scale: f32,
) {
    let (src_x, src_y, frame_w, frame_h) = src_rect;
    if frame_w == 0 || frame_h == 0 || width == 0 || height == 0 {
        return;
    }
    if !source_rect_fits(sheet, src_rect) {
        return;
    }

    let scale = normalized_scale(scale);
    let inv_scale = scale.recip();
    let (scaled_w, scaled_h) = scaled_frame_dimensions(frame_w, frame_h, scale);
    let left = center_x - (scaled_w as i32 / 2);
    let top = center_y - (scaled_h as i32 / 2);

    let draw_left = left.max(0);
    let draw_top = top.max(0);
    let draw_right = (left + scaled_w as i32).min(width as i32);
    let draw_bottom = (top + scaled_h as i32).min(height as i32);
    if draw_left >= draw_right || draw_top >= draw_bottom {
        return;
    }

    let frame_width = width as usize;
    let sheet_width = sheet.width as usize;

    for out_y in draw_top..draw_bottom {
        let sample_y = (((out_y - top) as f32) * inv_scale).floor() as u32;
        let sample_y = sample_y.min(frame_h - 1);
        let src_row_offset = ((src_y + sample_y) as usize) * sheet_width * 4;
        let dst_row_offset = out_y as usize * frame_width * 4;

        for out_x in draw_left..draw_right {
            let sample_x = (((out_x - left) as f32) * inv_scale).floor() as u32;
            let sample_x = sample_x.min(frame_w - 1);
            let src_offset = src_row_offset + ((src_x + sample_x) as usize) * 4;
            let alpha = sheet.rgba[src_offset + 3];
            if alpha == 0 {
                continue;
            }
            let dst_offset = dst_row_offset + out_x as usize * 4;
            frame[dst_offset] = sheet.rgba[src_offset];
            frame[dst_offset + 1] = sheet.rgba[src_offset + 1];
            frame[dst_offset + 2] = sheet.rgba[src_offset + 2];
            frame[dst_offset + 3] = alpha;
        }
    }
}

fn normalized_scale(scale: f32) -> f32 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

fn scaled_frame_dimensions(frame_w: u32, frame_h: u32, scale: f32) -> (u32, u32) {
    let scale = normalized_scale(scale);
    let width = (frame_w as f32 * scale).round().max(1.0) as u32;
    let height = (frame_h as f32 * scale).round().max(1.0) as u32;
    (width, height)
}

/// Loads and caches the sheet for `key`. A failed load caches the miss so
/// the disk is probed once per key.
fn resolve_cached_sheet<'a>(
    cache: &'a mut HashMap<String, Option<LoadedSheet>>,
    warned_missing_sheets: &mut HashSet<String>,
    asset_root: &Path,
    key: &str,
) -> Option<&'a LoadedSheet> {
    if !cache.contains_key(key) {
        let sheet = match resolve_sheet_image_path(asset_root, key) {
            Ok(path) => match load_sheet_rgba(&path) {
                Ok(sheet) => Some(sheet),
                Err(reason) => {
                    warn_sheet_load_once(
                        warned_missing_sheets,
                        key,
                        Some(path.as_path()),
                        reason.as_str(),
                    );
                    None
                }
            },
            Err(reason) => {
                warn_sheet_load_once(warned_missing_sheets, key, None, reason.as_str());
                None
            }
        };
        cache.insert(key.to_string(), sheet);
    }
    cache.get(key).and_then(Option::as_ref)
}

fn resolve_sheet_image_path(asset_root: &Path, key: &str) -> Result<PathBuf, String> {
    validate_sprite_key(key).map_err(|error| format!("invalid_key:{error}"))?;
    Ok(asset_root.join("sheets").join(format!("{key}.png")))
}

fn load_sheet_rgba(path: &Path) -> Result<LoadedSheet, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSheet {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_sheet_load_once(
    warned_keys: &mut HashSet<String>,
    key: &str,
    resolved_path: Option<&Path>,
    reason: &str,
) {
    if !warned_keys.insert(key.to_string()) {
        return;
    }
    let path_display = resolved_path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unresolved>".to_string());
    warn!(
        sheet_key = key,
        path = %path_display,
        reason = reason,
        "sheet_load_failed_using_placeholder"
    );
}

fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 {
        return;
    }
    let x = x as usize;
    let y = y as usize;
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}

/// Source-over blend of `color` at `alpha` onto the framebuffer pixel. The
/// output alpha stays opaque.
fn blend_pixel_rgba_clipped(
    frame: &mut [u8],
    width: usize,
    x: i32,
    y: i32,
    color: [u8; 3],
    alpha: u8,
) {
    if x < 0 || y < 0 {
        return;
    }
    let x = x as usize;
    let y = y as usize;
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    let inverse = 255 - alpha as u32;
    for channel in 0..3 {
        let dst = frame[byte_offset + channel] as u32;
        let src = color[channel] as u32;
        frame[byte_offset + channel] = ((src * alpha as u32 + dst * inverse) / 255) as u8;
    }
    frame[byte_offset + 3] = 255;
}

fn draw_square(
    frame: &mut [u8],
    width: u32,
    height: u32,
    cx: i32,
    cy: i32,
    half_size: i32,
    color: [u8; 4],
) {
    for y in (cy - half_size)..=(cy + half_size) {
        for x in (cx - half_size)..=(cx + half_size) {
            if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
                continue;
            }
            write_pixel_rgba_clipped(frame, width as usize, x, y, color);
        }
    }
}

fn draw_cross(frame: &mut [u8], width: u32, cx: i32, cy: i32, half_size: i32, color: [u8; 4]) {
    for x in (cx - half_size)..=(cx + half_size) {
        write_pixel_rgba_clipped(frame, width as usize, x, cy, color);
    }
    for y in (cy - half_size)..=(cy + half_size) {
        write_pixel_rgba_clipped(frame, width as usize, cx, y, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn byte_offset(frame_width: usize, x: usize, y: usize) -> usize {
        (y * frame_width + x) * 4
    }

    fn checker_sheet() -> LoadedSheet {
        // Two 2x2 frames side by side. Frame 0 is fully opaque red; frame 1
        // has an opaque green top-left texel and transparent elsewhere.
        let mut rgba = vec![0u8; 4 * 2 * 4];
        for texel in 0..4usize {
            let (x, y) = (texel % 2, texel / 2);
            let offset = byte_offset(4, x, y);
            rgba[offset..offset + 4].copy_from_slice(&[255, 0, 0, 255]);
        }
        let green_offset = byte_offset(4, 2, 0);
        rgba[green_offset..green_offset + 4].copy_from_slice(&[0, 255, 0, 255]);
        LoadedSheet {
            width: 4,
            height: 2,
            rgba,
        }
    }

    #[test]
    fn pixel_writes_are_safe_for_tiny_or_zero_buffers() {
        let mut zero = vec![];
        write_pixel_rgba_clipped(&mut zero, 0, 0, 0, [1, 2, 3, 4]);
        blend_pixel_rgba_clipped(&mut zero, 0, 0, 0, [1, 2, 3], 255);

        let mut tiny = vec![0u8; 4];
        write_pixel_rgba_clipped(&mut tiny, 1, -1, 0, [1, 2, 3, 4]);
        write_pixel_rgba_clipped(&mut tiny, 1, 99, 99, [1, 2, 3, 4]);
        write_pixel_rgba_clipped(&mut tiny, 1, 0, 0, [9, 9, 9, 9]);
        assert_eq!(tiny, vec![9, 9, 9, 9]);
    }

    #[test]
    fn blend_is_identity_at_the_alpha_extremes() {
        let mut buffer = vec![100u8, 100, 100, 255];
        blend_pixel_rgba_clipped(&mut buffer, 1, 0, 0, [200, 200, 200], 0);
        assert_eq!(&buffer[..3], &[100, 100, 100]);

        blend_pixel_rgba_clipped(&mut buffer, 1, 0, 0, [200, 40, 0], 255);
        assert_eq!(&buffer[..3], &[200, 40, 0]);
    }

    #[test]
    fn blend_interpolates_between_source_and_destination() {
        let mut buffer = vec![100u8, 100, 100, 255];
        blend_pixel_rgba_clipped(&mut buffer, 1, 0, 0, [0, 0, 0], 25);
        // (0 * 25 + 100 * 230) / 255 = 90
        assert_eq!(&buffer[..3], &[90, 90, 90]);
        assert_eq!(buffer[3], 255);
    }

    #[test]
    fn diamond_sampler_rejects_points_outside_the_diamond() {
        assert!(diamond_source_texel(32.0, 1.0, 32.0, 16.0, 64, 32).is_none());
        assert!(diamond_source_texel(17.0, 8.0, 32.0, 16.0, 64, 32).is_none());
        assert!(diamond_source_texel(0.0, 17.0, 32.0, 16.0, 64, 32).is_none());
    }

    #[test]
    fn diamond_sampler_maps_center_and_vertices_to_frame_corners() {
        // Center of the diamond reads the center of the frame.
        assert_eq!(
            diamond_source_texel(0.0, 0.0, 32.0, 16.0, 64, 32),
            Some((32, 16))
        );
        // Top vertex reads the frame's top-left corner, left vertex the
        // bottom-left, clockwise from there.
        assert_eq!(
            diamond_source_texel(0.0, -16.0, 32.0, 16.0, 64, 32),
            Some((0, 0))
        );
        assert_eq!(
            diamond_source_texel(32.0, 0.0, 32.0, 16.0, 64, 32),
            Some((63, 0))
        );
        assert_eq!(
            diamond_source_texel(0.0, 16.0, 32.0, 16.0, 64, 32),
            Some((63, 31))
        );
        assert_eq!(
            diamond_source_texel(-32.0, 0.0, 32.0, 16.0, 64, 32),
            Some((0, 31))
        );
    }

    #[test]
    fn diamond_sampler_guards_degenerate_frames() {
        assert!(diamond_source_texel(0.0, 0.0, 0.0, 16.0, 64, 32).is_none());
        assert!(diamond_source_texel(0.0, 0.0, 32.0, 16.0, 0, 32).is_none());
    }

    #[test]
    fn silhouette_captures_the_requested_frame_alpha() {
        let sheet = checker_sheet();
        let mut cache = HashMap::new();
        let silhouette = silhouette_for_frame(&mut cache, "units/sloop", &sheet, (2, 0, 2, 2))
            .expect("silhouette");
        assert_eq!(silhouette.width, 2);
        assert_eq!(silhouette.height, 2);
        assert_eq!(silhouette.alpha, vec![255, 0, 0, 0]);
    }

    #[test]
    fn silhouettes_cache_per_frame_origin() {
        let sheet = checker_sheet();
        let mut cache = HashMap::new();
        silhouette_for_frame(&mut cache, "units/sloop", &sheet, (0, 0, 2, 2)).expect("frame 0");
        silhouette_for_frame(&mut cache, "units/sloop", &sheet, (0, 0, 2, 2)).expect("frame 0");
        assert_eq!(cache.len(), 1);
        silhouette_for_frame(&mut cache, "units/sloop", &sheet, (2, 0, 2, 2)).expect("frame 1");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn silhouette_rejects_out_of_sheet_frames() {
        let sheet = checker_sheet();
        let mut cache = HashMap::new();
        assert!(silhouette_for_frame(&mut cache, "units/sloop", &sheet, (4, 0, 2, 2)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn outline_stamps_cover_all_four_axes_within_radius() {
        let offsets = outline_stamp_offsets();
        assert_eq!(offsets.len(), 8);
        for (dx, dy) in offsets {
            assert!(dx.abs() <= OUTLINE_RADIUS_PX as i32);
            assert!(dy.abs() <= OUTLINE_RADIUS_PX as i32);
        }
        assert!(offsets.contains(&(2, 0)));
        assert!(offsets.contains(&(-2, 0)));
        assert!(offsets.contains(&(0, 2)));
        assert!(offsets.contains(&(0, -2)));
        let mut unique = offsets.to_vec();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 8);
    }

    #[test]
    fn sheet_frame_draw_copies_opaque_texels_and_skips_transparent_ones() {
        let sheet = checker_sheet();
        let mut frame = vec![0u8; 4 * 4 * 4];
        draw_sheet_frame(&mut frame, 4, 4, 2, 2, &sheet, (2, 0, 2, 2), 1.0);

        // The frame's top-left green texel lands one pixel up-left of center.
        let green_offset = byte_offset(4, 1, 1);
        assert_eq!(&frame[green_offset..green_offset + 4], &[0, 255, 0, 255]);
        // The transparent texel below it leaves the clear value alone.
        let untouched_offset = byte_offset(4, 1, 2);
        assert_eq!(&frame[untouched_offset..untouched_offset + 4], &[0, 0, 0, 0]);
    }

    #[test]
    fn sheet_frame_draw_ignores_rects_outside_the_sheet() {
        let sheet = checker_sheet();
        let mut frame = vec![7u8; 4 * 4 * 4];
        draw_sheet_frame(&mut frame, 4, 4, 2, 2, &sheet, (3, 0, 2, 2), 1.0);
        draw_sheet_frame(&mut frame, 4, 4, 2, 2, &sheet, (0, 1, 2, 2), 1.0);
        assert!(frame.iter().all(|byte| *byte == 7));
    }

    #[test]
    fn sheet_frame_draw_clips_against_the_framebuffer_edges() {
        let sheet = checker_sheet();
        let mut frame = vec![0u8; 2 * 2 * 4];
        draw_sheet_frame(&mut frame, 2, 2, 0, 0, &sheet, (0, 0, 2, 2), 1.0);
        draw_sheet_frame(&mut frame, 2, 2, -5, -5, &sheet, (0, 0, 2, 2), 1.0);
        assert_eq!(&frame[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn shadow_silhouette_blends_at_reduced_opacity() {
        let silhouette = Silhouette {
            width: 1,
            height: 1,
            alpha: vec![255],
        };
        let mut frame = vec![100u8, 100, 100, 255];
        draw_silhouette_scaled(&mut frame, 1, 1, 0, 0, &silhouette, 1.0, SHADOW_COLOR, 25);
        assert_eq!(&frame[..3], &[90, 90, 90]);
    }

    #[test]
    fn silhouette_draw_skips_transparent_mask_texels() {
        let silhouette = Silhouette {
            width: 2,
            height: 1,
            alpha: vec![0, 255],
        };
        let mut frame = vec![50u8; 2 * 1 * 4];
        draw_silhouette_scaled(&mut frame, 2, 1, 1, 0, &silhouette, 1.0, [255, 255, 255], 255);
        assert_eq!(&frame[0..3], &[50, 50, 50]);
        assert_eq!(&frame[4..7], &[255, 255, 255]);
    }

    #[test]
    fn scaled_dimensions_multiply_native_size_and_survive_bad_scales() {
        assert_eq!(scaled_frame_dimensions(4, 6, 1.0), (4, 6));
        assert_eq!(scaled_frame_dimensions(4, 6, 2.0), (8, 12));
        assert_eq!(scaled_frame_dimensions(4, 6, f32::NAN), (4, 6));
        assert_eq!(scaled_frame_dimensions(4, 6, 0.0), (4, 6));
    }

    #[test]
    fn sheet_path_resolution_and_missing_file_behavior() {
        let temp = TempDir::new().expect("temp");
        let asset_root = temp.path();

        assert!(resolve_sheet_image_path(asset_root, r"bad\key").is_err());

        let valid_path = resolve_sheet_image_path(asset_root, "tiles/ocean").expect("path");
        assert_eq!(
            valid_path,
            asset_root.join("sheets").join("tiles/ocean.png")
        );
        assert!(load_sheet_rgba(&valid_path).is_err());
    }

    #[test]
    fn missing_sheets_warn_once_and_cache_the_miss() {
        let temp = TempDir::new().expect("temp");
        let mut cache = HashMap::new();
        let mut warned = HashSet::new();

        assert!(resolve_cached_sheet(&mut cache, &mut warned, temp.path(), "tiles/ocean").is_none());
        assert_eq!(cache.len(), 1);
        assert_eq!(warned.len(), 1);

        assert!(resolve_cached_sheet(&mut cache, &mut warned, temp.path(), "tiles/ocean").is_none());
        assert_eq!(cache.len(), 1);
        assert_eq!(warned.len(), 1);
    }

    #[test]
    fn cross_marker_writes_its_row_and_column() {
        let mut frame = vec![0u8; 5 * 5 * 4];
        draw_cross(&mut frame, 5, 2, 2, 1, [9, 9, 9, 255]);
        let center = byte_offset(5, 2, 2);
        let above = byte_offset(5, 2, 1);
        let left = byte_offset(5, 1, 2);
        assert_eq!(&frame[center..center + 4], &[9, 9, 9, 255]);
        assert_eq!(&frame[above..above + 4], &[9, 9, 9, 255]);
        assert_eq!(&frame[left..left + 4], &[9, 9, 9, 255]);
        let corner = 0;
        assert_eq!(&frame[corner..corner + 4], &[0, 0, 0, 0]);
    }

    #[test]
    fn placeholder_square_fills_its_extent() {
        let mut frame = vec![0u8; 8 * 8 * 4];
        draw_square(&mut frame, 8, 8, 3, 3, 1, PLACEHOLDER_COLOR);
        for y in 2..=4 {
            for x in 2..=4 {
                let offset = byte_offset(8, x, y);
                assert_eq!(&frame[offset..offset + 4], &PLACEHOLDER_COLOR);
            }
        }
        assert_eq!(&frame[0..4], &[0, 0, 0, 0]);
    }
}
