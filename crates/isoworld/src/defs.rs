//! On-disk scenario definitions.
//!
//! A scenario def is one JSON document describing the map grid, the tile
//! atlas it indexes into, and the units standing on it. Defs are data only;
//! turning them into a live world is the caller's job.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::app::world::Mobility;
use crate::sprite_keys::validate_sprite_key;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioDef {
    pub name: String,
    pub map: MapDef,
    pub tiles: Vec<TileDef>,
    pub units: Vec<UnitDef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapDef {
    pub rows: usize,
    pub cols: usize,
    pub tile_width: u32,
    pub tile_height: u32,
    /// Tile def ids in row-major order, `rows * cols` entries.
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TileDef {
    pub id: String,
    pub sprite: String,
    pub frame_width: u32,
    pub frame_height: u32,
    pub frames: u32,
    pub cycle_seconds: f32,
    #[serde(default)]
    pub frame_delay_seconds: f32,
    pub walkable: bool,
    pub navigable: bool,
    #[serde(default)]
    pub elevation: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitDef {
    pub sprite: String,
    pub frame_width: u32,
    pub frame_height: u32,
    pub frames: u32,
    pub cycle_seconds: f32,
    pub speed: f32,
    pub mobility: MobilityDef,
    pub spawn: (usize, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MobilityDef {
    None,
    Walker,
    Navigator,
}

impl From<MobilityDef> for Mobility {
    fn from(def: MobilityDef) -> Self {
        match def {
            MobilityDef::None => Mobility::None,
            MobilityDef::Walker => Mobility::Walker,
            MobilityDef::Navigator => Mobility::Navigator,
        }
    }
}

#[derive(Debug, Error)]
pub enum DefsError {
    #[error("failed to read scenario def '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario def '{path}' at {json_path}: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("scenario def validation failed at {at}: {message}")]
    Validation { at: String, message: String },
}

pub fn load_scenario_def(path: &Path) -> Result<ScenarioDef, DefsError> {
    let raw = fs::read_to_string(path).map_err(|source| DefsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let def = parse_scenario_def_json(path, &raw)?;
    validate_scenario_def(&def)?;
    Ok(def)
}

fn parse_scenario_def_json(path: &Path, raw: &str) -> Result<ScenarioDef, DefsError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, ScenarioDef>(&mut deserializer).map_err(|error| {
        let json_path = error.path().to_string();
        let json_path = if json_path.is_empty() || json_path == "." {
            "document root".to_string()
        } else {
            json_path
        };
        DefsError::Parse {
            path: path.to_path_buf(),
            json_path,
            source: error.into_inner(),
        }
    })
}

fn validation_err(at: impl Into<String>, message: impl Into<String>) -> DefsError {
    DefsError::Validation {
        at: at.into(),
        message: message.into(),
    }
}

/// Structural checks shared by on-disk and built-in defs.
pub fn validate_scenario_def(def: &ScenarioDef) -> Result<(), DefsError> {
    if def.name.trim().is_empty() {
        return Err(validation_err("name", "must not be empty"));
    }
    if def.map.rows == 0 || def.map.cols == 0 {
        return Err(validation_err(
            "map",
            format!(
                "must have at least one row and one column, got {}x{}",
                def.map.rows, def.map.cols
            ),
        ));
    }
    if def.map.tile_width == 0 || def.map.tile_height == 0 {
        return Err(validation_err(
            "map",
            format!(
                "tile dimensions must be non-zero, got {}x{}",
                def.map.tile_width, def.map.tile_height
            ),
        ));
    }
    let expected_cells = def.map.rows.checked_mul(def.map.cols).ok_or_else(|| {
        validation_err(
            "map",
            format!("{}x{} grid is too large", def.map.rows, def.map.cols),
        )
    })?;
    if def.map.cells.len() != expected_cells {
        return Err(validation_err(
            "map.cells",
            format!(
                "expected {} entries for a {}x{} grid, got {}",
                expected_cells,
                def.map.rows,
                def.map.cols,
                def.map.cells.len()
            ),
        ));
    }

    let mut tile_ids = HashSet::with_capacity(def.tiles.len());
    for (index, tile) in def.tiles.iter().enumerate() {
        let at = format!("tiles[{index}]");
        if tile.id.trim().is_empty() {
            return Err(validation_err(format!("{at}.id"), "must not be empty"));
        }
        if !tile_ids.insert(tile.id.as_str()) {
            return Err(validation_err(
                format!("{at}.id"),
                format!("duplicate tile id '{}'", tile.id),
            ));
        }
        if let Err(error) = validate_sprite_key(&tile.sprite) {
            return Err(validation_err(format!("{at}.sprite"), error.to_string()));
        }
        if tile.frame_width == 0 || tile.frame_height == 0 {
            return Err(validation_err(
                format!("{at}"),
                format!(
                    "frame dimensions must be non-zero, got {}x{}",
                    tile.frame_width, tile.frame_height
                ),
            ));
        }
        if tile.frames == 0 {
            return Err(validation_err(
                format!("{at}.frames"),
                "must be at least 1",
            ));
        }
        if tile.frame_width.checked_mul(tile.frames).is_none() {
            return Err(validation_err(
                format!("{at}"),
                format!(
                    "a sheet row of {} frames x {} texels does not fit in u32",
                    tile.frames, tile.frame_width
                ),
            ));
        }
        if !tile.cycle_seconds.is_finite() || tile.cycle_seconds < 0.0 {
            return Err(validation_err(
                format!("{at}.cycle_seconds"),
                "must be finite and >= 0",
            ));
        }
        if !tile.frame_delay_seconds.is_finite() || tile.frame_delay_seconds < 0.0 {
            return Err(validation_err(
                format!("{at}.frame_delay_seconds"),
                "must be finite and >= 0",
            ));
        }
        if !tile.elevation.is_finite() {
            return Err(validation_err(format!("{at}.elevation"), "must be finite"));
        }
    }

    for (index, cell) in def.map.cells.iter().enumerate() {
        if !tile_ids.contains(cell.as_str()) {
            return Err(validation_err(
                format!("map.cells[{index}]"),
                format!("unknown tile id '{cell}'"),
            ));
        }
    }

    for (index, unit) in def.units.iter().enumerate() {
        let at = format!("units[{index}]");
        if let Err(error) = validate_sprite_key(&unit.sprite) {
            return Err(validation_err(format!("{at}.sprite"), error.to_string()));
        }
        if unit.frame_width == 0 || unit.frame_height == 0 {
            return Err(validation_err(
                format!("{at}"),
                format!(
                    "frame dimensions must be non-zero, got {}x{}",
                    unit.frame_width, unit.frame_height
                ),
            ));
        }
        if unit.frames == 0 {
            return Err(validation_err(
                format!("{at}.frames"),
                "must be at least 1",
            ));
        }
        if unit.frame_width.checked_mul(unit.frames).is_none() {
            return Err(validation_err(
                format!("{at}"),
                format!(
                    "a sheet row of {} frames x {} texels does not fit in u32",
                    unit.frames, unit.frame_width
                ),
            ));
        }
        if !unit.cycle_seconds.is_finite() || unit.cycle_seconds < 0.0 {
            return Err(validation_err(
                format!("{at}.cycle_seconds"),
                "must be finite and >= 0",
            ));
        }
        if !unit.speed.is_finite() || unit.speed < 0.0 {
            return Err(validation_err(
                format!("{at}.speed"),
                "must be finite and >= 0",
            ));
        }
        let (row, col) = unit.spawn;
        if row >= def.map.rows || col >= def.map.cols {
            return Err(validation_err(
                format!("{at}.spawn"),
                format!(
                    "({row}, {col}) is outside the {}x{} grid",
                    def.map.rows, def.map.cols
                ),
            ));
        }
    }

    Ok(())
}
