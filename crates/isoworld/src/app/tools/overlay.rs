use crate::app::world::{UnitId, Vec2};
use crate::app::LoopMetricsSnapshot;

use super::{PerfStatsSnapshot, RollingMsStats};

const GLYPH_WIDTH: i32 = 3;
const GLYPH_HEIGHT: i32 = 5;
const TEXT_SCALE: i32 = 3;
const GLYPH_ADVANCE: i32 = (GLYPH_WIDTH + 1) * TEXT_SCALE;
const LINE_ADVANCE: i32 = (GLYPH_HEIGHT + 2) * TEXT_SCALE;
const OVERLAY_PADDING: i32 = 6 * TEXT_SCALE;
const OVERLAY_PANEL_INSET_X: i32 = 4 * TEXT_SCALE;
const OVERLAY_PANEL_INSET_Y: i32 = 3 * TEXT_SCALE;
const OVERLAY_TEXT_PRIMARY_COLOR: [u8; 4] = [244, 248, 252, 255];
const OVERLAY_TEXT_DIM_COLOR: [u8; 4] = [176, 198, 220, 255];
const OVERLAY_PANEL_BG_COLOR: [u8; 4] = [10, 12, 16, 210];
const OVERLAY_PANEL_BORDER_COLOR: [u8; 4] = [92, 106, 126, 255];
const PERF_SECTION_LABEL: &str = "Perf";
const WORLD_SECTION_LABEL: &str = "World";

#[derive(Debug, Clone)]
pub(crate) struct OverlayData {
    pub metrics: LoopMetricsSnapshot,
    pub perf: PerfStatsSnapshot,
    pub render_fps_cap: Option<u32>,
    pub slow_frame_delay_ms: u64,
    pub scenario_name: String,
    pub tile_count: usize,
    pub unit_count: usize,
    pub selected_unit: Option<UnitId>,
    pub selected_target: Option<Vec2>,
    pub camera_position: Vec2,
    pub camera_zoom: f32,
}

pub(crate) fn draw_overlay(frame: &mut [u8], width: u32, height: u32, data: &OverlayData) {
    if width == 0 || height == 0 {
        return;
    }

    let lines = build_overlay_lines(data);
    if lines.is_empty() {
        return;
    }

    let longest_line_chars = lines
        .iter()
        .map(|line| line.chars().count() as i32)
        .max()
        .unwrap_or(0);
    let panel_width = longest_line_chars * GLYPH_ADVANCE + OVERLAY_PANEL_INSET_X * 2;
    let panel_height = lines.len() as i32 * LINE_ADVANCE + OVERLAY_PANEL_INSET_Y * 2;
    let panel_left = OVERLAY_PADDING - OVERLAY_PANEL_INSET_X;
    let panel_top = OVERLAY_PADDING - OVERLAY_PANEL_INSET_Y;
    draw_filled_rect(
        frame,
        width,
        height,
        panel_left,
        panel_top,
        panel_width,
        panel_height,
        OVERLAY_PANEL_BG_COLOR,
    );
    draw_rect_outline(
        frame,
        width,
        height,
        panel_left,
        panel_top,
        panel_width,
        panel_height,
        OVERLAY_PANEL_BORDER_COLOR,
    );

    let mut y = OVERLAY_PADDING;
    for line in lines {
        let color = overlay_line_color(&line);
        draw_text_clipped(frame, width, height, OVERLAY_PADDING, y, &line, color);
        y += LINE_ADVANCE;
    }
}

fn build_overlay_lines(data: &OverlayData) -> Vec<String> {
    vec![
        PERF_SECTION_LABEL.to_string(),
        format_fps_line(
            data.metrics.fps,
            data.render_fps_cap,
            data.slow_frame_delay_ms,
        ),
        format!("TPS: {:.1}", data.metrics.tps),
        format!("Frame: {:.2} ms", data.metrics.frame_time_ms),
        format!("Dropped: {}", data.metrics.dropped_ticks),
        format_perf_line("SIM", data.perf.sim),
        format_perf_line("DRW", data.perf.draw),
        String::new(),
        WORLD_SECTION_LABEL.to_string(),
        format!("Scenario: {}", data.scenario_name),
        format!("Tiles: {}", data.tile_count),
        format!("Units: {}", data.unit_count),
        match data.selected_unit {
            Some(id) => format!("Sel: {id}"),
            None => "Sel: none".to_string(),
        },
        match data.selected_target {
            Some(target) => format!("Target: {:.1},{:.1}", target.x, target.y),
            None => "Target: idle".to_string(),
        },
        format!(
            "Cam: {:.1},{:.1} z{:.1}",
            data.camera_position.x, data.camera_position.y, data.camera_zoom
        ),
    ]
}

fn overlay_line_color(line: &str) -> [u8; 4] {
    if matches!(line, PERF_SECTION_LABEL | WORLD_SECTION_LABEL) {
        OVERLAY_TEXT_DIM_COLOR
    } else {
        OVERLAY_TEXT_PRIMARY_COLOR
    }
}

fn format_fps_line(current_fps: f32, cap: Option<u32>, slow_frame_delay_ms: u64) -> String {
    let cap_text = match cap {
        Some(value) => value.to_string(),
        None => "inf".to_string(),
    };
    format!(
        "[{:.0} / {}] dbg+{}ms",
        current_fps, cap_text, slow_frame_delay_ms
    )
}

fn format_perf_line(label: &str, stats: RollingMsStats) -> String {
    format!(
        "{} l/a/m: {:.2}/{:.2}/{:.2} ms",
        label, stats.last_ms, stats.avg_ms, stats.max_ms
    )
}

fn draw_text_clipped(
    frame: &mut [u8],
    width: u32,
    height: u32,
    mut x: i32,
    y: i32,
    text: &str,
    color: [u8; 4],
) {
    for ch in text.chars() {
        let glyph = glyph_for(ch).unwrap_or(SPACE_GLYPH);
        draw_glyph_clipped(frame, width, height, x, y, glyph, color);
        x += GLYPH_ADVANCE;
    }
}

fn draw_glyph_clipped(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    glyph: Glyph,
    color: [u8; 4],
) {
    if width == 0 || height == 0 {
        return;
    }

    let height_i32 = height as i32;
    let width_i32 = width as i32;

    for (row_index, row_bits) in glyph.rows.iter().enumerate() {
        let glyph_y = y + row_index as i32 * TEXT_SCALE;

        for col in 0..GLYPH_WIDTH {
            if (row_bits & (1 << (GLYPH_WIDTH - 1 - col))) == 0 {
                continue;
            }

            let glyph_x = x + col * TEXT_SCALE;
            for sy in 0..TEXT_SCALE {
                let pixel_y = glyph_y + sy;
                if pixel_y < 0 || pixel_y >= height_i32 {
                    continue;
                }
                for sx in 0..TEXT_SCALE {
                    let pixel_x = glyph_x + sx;
                    if pixel_x < 0 || pixel_x >= width_i32 {
                        continue;
                    }
                    write_pixel_rgba(
                        frame,
                        width as usize,
                        pixel_x as usize,
                        pixel_y as usize,
                        color,
                    );
                }
            }
        }
    }
}

fn write_pixel_rgba(frame: &mut [u8], width: usize, x: usize, y: usize, color: [u8; 4]) {
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

#[allow(clippy::too_many_arguments)]
fn draw_filled_rect(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: [u8; 4],
) {
    let start_x = x.max(0);
    let start_y = y.max(0);
    let end_x = (x + rect_width).min(width as i32);
    let end_y = (y + rect_height).min(height as i32);
    if end_x <= start_x || end_y <= start_y {
        return;
    }

    let width_usize = width as usize;
    for py in start_y..end_y {
        for px in start_x..end_x {
            write_pixel_rgba(frame, width_usize, px as usize, py as usize, color);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_rect_outline(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: [u8; 4],
) {
    if rect_width <= 1 || rect_height <= 1 {
        return;
    }
    draw_filled_rect(frame, width, height, x, y, rect_width, 1, color);
    draw_filled_rect(
        frame,
        width,
        height,
        x,
        y + rect_height - 1,
        rect_width,
        1,
        color,
    );
    draw_filled_rect(frame, width, height, x, y, 1, rect_height, color);
    draw_filled_rect(
        frame,
        width,
        height,
        x + rect_width - 1,
        y,
        1,
        rect_height,
        color,
    );
}

#[derive(Debug, Clone, Copy)]
struct Glyph {
    rows: [u8; GLYPH_HEIGHT as usize],
}

const SPACE_GLYPH: Glyph = Glyph {
    rows: [0, 0, 0, 0, 0],
};

fn glyph_for(ch: char) -> Option<Glyph> {
    match ch {
        ' '..='~' => Some(ascii_glyph(ch)),
        _ => None,
    }
}

fn ascii_glyph(ch: char) -> Glyph {
    match ch {
        ' ' => SPACE_GLYPH,
        '!' => Glyph {
            rows: [0b010, 0b010, 0b010, 0b000, 0b010],
        },
        '"' => Glyph {
            rows: [0b101, 0b101, 0b000, 0b000, 0b000],
        },
        '#' => Glyph {
            rows: [0b101, 0b111, 0b101, 0b111, 0b101],
        },
        '$' => Glyph {
            rows: [0b111, 0b110, 0b111, 0b011, 0b111],
        },
        '%' => Glyph {
            rows: [0b101, 0b001, 0b010, 0b100, 0b101],
        },
        '&' => Glyph {
            rows: [0b010, 0b101, 0b010, 0b101, 0b011],
        },
        '\'' => Glyph {
            rows: [0b010, 0b010, 0b000, 0b000, 0b000],
        },
        '(' => Glyph {
            rows: [0b001, 0b010, 0b010, 0b010, 0b001],
        },
        ')' => Glyph {
            rows: [0b100, 0b010, 0b010, 0b010, 0b100],
        },
        '*' => Glyph {
            rows: [0b000, 0b101, 0b010, 0b101, 0b000],
        },
        '+' => Glyph {
            rows: [0b000, 0b010, 0b111, 0b010, 0b000],
        },
        ',' => Glyph {
            rows: [0b000, 0b000, 0b000, 0b010, 0b100],
        },
        '-' => Glyph {
            rows: [0b000, 0b000, 0b111, 0b000, 0b000],
        },
        '.' => Glyph {
            rows: [0b000, 0b000, 0b000, 0b000, 0b010],
        },
        '/' => Glyph {
            rows: [0b001, 0b001, 0b010, 0b100, 0b100],
        },
        '0' => Glyph {
            rows: [0b111, 0b101, 0b101, 0b101, 0b111],
        },
        '1' => Glyph {
            rows: [0b010, 0b110, 0b010, 0b010, 0b111],
        },
        '2' => Glyph {
            rows: [0b111, 0b001, 0b111, 0b100, 0b111],
        },
        '3' => Glyph {
            rows: [0b111, 0b001, 0b111, 0b001, 0b111],
        },
        '4' => Glyph {
            rows: [0b101, 0b101, 0b111, 0b001, 0b001],
        },
        '5' => Glyph {
            rows: [0b111, 0b100, 0b111, 0b001, 0b111],
        },
        '6' => Glyph {
            rows: [0b111, 0b100, 0b111, 0b101, 0b111],
        },
        '7' => Glyph {
            rows: [0b111, 0b001, 0b010, 0b010, 0b010],
        },
        '8' => Glyph {
            rows: [0b111, 0b101, 0b111, 0b101, 0b111],
        },
        '9' => Glyph {
            rows: [0b111, 0b101, 0b111, 0b001, 0b111],
        },
        ':' => Glyph {
            rows: [0b000, 0b010, 0b000, 0b010, 0b000],
        },
        ';' => Glyph {
            rows: [0b000, 0b010, 0b000, 0b010, 0b100],
        },
        '<' => Glyph {
            rows: [0b001, 0b010, 0b100, 0b010, 0b001],
        },
        '=' => Glyph {
            rows: [0b000, 0b111, 0b000, 0b111, 0b000],
        },
        '>' => Glyph {
            rows: [0b100, 0b010, 0b001, 0b010, 0b100],
        },
        '?' => Glyph {
            rows: [0b111, 0b001, 0b011, 0b000, 0b010],
        },
        '@' => Glyph {
            rows: [0b111, 0b101, 0b111, 0b100, 0b111],
        },
        'A' => Glyph {
            rows: [0b010, 0b101, 0b111, 0b101, 0b101],
        },
        'B' => Glyph {
            rows: [0b110, 0b101, 0b110, 0b101, 0b110],
        },
        'C' => Glyph {
            rows: [0b111, 0b100, 0b100, 0b100, 0b111],
        },
        'D' => Glyph {
            rows: [0b110, 0b101, 0b101, 0b101, 0b110],
        },
        'E' => Glyph {
            rows: [0b111, 0b100, 0b110, 0b100, 0b111],
        },
        'F' => Glyph {
            rows: [0b111, 0b100, 0b110, 0b100, 0b100],
        },
        'G' => Glyph {
            rows: [0b111, 0b100, 0b101, 0b101, 0b111],
        },
        'H' => Glyph {
            rows: [0b101, 0b101, 0b111, 0b101, 0b101],
        },
        'I' => Glyph {
            rows: [0b111, 0b010, 0b010, 0b010, 0b111],
        },
        'J' => Glyph {
            rows: [0b111, 0b001, 0b001, 0b101, 0b111],
        },
        'K' => Glyph {
            rows: [0b101, 0b101, 0b110, 0b101, 0b101],
        },
        'L' => Glyph {
            rows: [0b100, 0b100, 0b100, 0b100, 0b111],
        },
        'M' => Glyph {
            rows: [0b101, 0b111, 0b111, 0b101, 0b101],
        },
        'N' => Glyph {
            rows: [0b101, 0b111, 0b111, 0b111, 0b101],
        },
        'O' => Glyph {
            rows: [0b111, 0b101, 0b101, 0b101, 0b111],
        },
        'P' => Glyph {
            rows: [0b110, 0b101, 0b110, 0b100, 0b100],
        },
        'Q' => Glyph {
            rows: [0b111, 0b101, 0b101, 0b111, 0b001],
        },
        'R' => Glyph {
            rows: [0b110, 0b101, 0b110, 0b101, 0b101],
        },
        'S' => Glyph {
            rows: [0b111, 0b100, 0b111, 0b001, 0b111],
        },
        'T' => Glyph {
            rows: [0b111, 0b010, 0b010, 0b010, 0b010],
        },
        'U' => Glyph {
            rows: [0b101, 0b101, 0b101, 0b101, 0b111],
        },
        'V' => Glyph {
            rows: [0b101, 0b101, 0b101, 0b101, 0b010],
        },
        'W' => Glyph {
            rows: [0b101, 0b101, 0b111, 0b111, 0b101],
        },
        'X' => Glyph {
            rows: [0b101, 0b101, 0b010, 0b101, 0b101],
        },
        'Y' => Glyph {
            rows: [0b101, 0b101, 0b010, 0b010, 0b010],
        },
        'Z' => Glyph {
            rows: [0b111, 0b001, 0b010, 0b100, 0b111],
        },
        '[' => Glyph {
            rows: [0b110, 0b100, 0b100, 0b100, 0b110],
        },
        '\\' => Glyph {
            rows: [0b100, 0b100, 0b010, 0b001, 0b001],
        },
        ']' => Glyph {
            rows: [0b011, 0b001, 0b001, 0b001, 0b011],
        },
        '^' => Glyph {
            rows: [0b010, 0b101, 0b000, 0b000, 0b000],
        },
        '_' => Glyph {
            rows: [0b000, 0b000, 0b000, 0b000, 0b111],
        },
        '`' => Glyph {
            rows: [0b100, 0b010, 0b000, 0b000, 0b000],
        },
        'a' => Glyph {
            rows: [0b000, 0b111, 0b001, 0b111, 0b111],
        },
        'b' => Glyph {
            rows: [0b100, 0b100, 0b110, 0b101, 0b110],
        },
        'c' => Glyph {
            rows: [0b000, 0b111, 0b100, 0b100, 0b111],
        },
        'd' => Glyph {
            rows: [0b001, 0b001, 0b111, 0b101, 0b111],
        },
        'e' => Glyph {
            rows: [0b000, 0b111, 0b110, 0b100, 0b111],
        },
        'f' => Glyph {
            rows: [0b011, 0b100, 0b110, 0b100, 0b100],
        },
        'g' => Glyph {
            rows: [0b000, 0b111, 0b101, 0b111, 0b001],
        },
        'h' => Glyph {
            rows: [0b100, 0b100, 0b110, 0b101, 0b101],
        },
        'i' => Glyph {
            rows: [0b010, 0b000, 0b010, 0b010, 0b010],
        },
        'j' => Glyph {
            rows: [0b001, 0b000, 0b001, 0b101, 0b010],
        },
        'k' => Glyph {
            rows: [0b100, 0b101, 0b110, 0b101, 0b101],
        },
        'l' => Glyph {
            rows: [0b100, 0b100, 0b100, 0b100, 0b111],
        },
        'm' => Glyph {
            rows: [0b000, 0b110, 0b111, 0b101, 0b101],
        },
        'n' => Glyph {
            rows: [0b000, 0b110, 0b101, 0b101, 0b101],
        },
        'o' => Glyph {
            rows: [0b000, 0b111, 0b101, 0b101, 0b111],
        },
        'p' => Glyph {
            rows: [0b000, 0b110, 0b101, 0b110, 0b100],
        },
        'q' => Glyph {
            rows: [0b000, 0b111, 0b101, 0b111, 0b001],
        },
        'r' => Glyph {
            rows: [0b000, 0b110, 0b101, 0b100, 0b100],
        },
        's' => Glyph {
            rows: [0b000, 0b111, 0b110, 0b001, 0b111],
        },
        't' => Glyph {
            rows: [0b010, 0b111, 0b010, 0b010, 0b011],
        },
        'u' => Glyph {
            rows: [0b000, 0b101, 0b101, 0b101, 0b111],
        },
        'v' => Glyph {
            rows: [0b000, 0b101, 0b101, 0b101, 0b010],
        },
        'w' => Glyph {
            rows: [0b000, 0b101, 0b101, 0b111, 0b010],
        },
        'x' => Glyph {
            rows: [0b000, 0b101, 0b010, 0b010, 0b101],
        },
        'y' => Glyph {
            rows: [0b000, 0b101, 0b101, 0b111, 0b001],
        },
        'z' => Glyph {
            rows: [0b000, 0b111, 0b001, 0b010, 0b111],
        },
        '{' => Glyph {
            rows: [0b011, 0b010, 0b110, 0b010, 0b011],
        },
        '|' => Glyph {
            rows: [0b010, 0b010, 0b010, 0b010, 0b010],
        },
        '}' => Glyph {
            rows: [0b110, 0b010, 0b011, 0b010, 0b110],
        },
        '~' => Glyph {
            rows: [0b000, 0b011, 0b110, 0b000, 0b000],
        },
        _ => SPACE_GLYPH,
    }
}
