/// The two built-in demo scenarios. Either can be overridden by a JSON def
/// dropped into the defs directory under `<file_stem>.scenario.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScenarioId {
    CoastalIsland,
    OpenStrait,
}

impl ScenarioId {
    fn file_stem(self) -> &'static str {
        match self {
            ScenarioId::CoastalIsland => "coastal_island",
            ScenarioId::OpenStrait => "open_strait",
        }
    }

    fn next(self) -> Self {
        match self {
            ScenarioId::CoastalIsland => ScenarioId::OpenStrait,
            ScenarioId::OpenStrait => ScenarioId::CoastalIsland,
        }
    }

    fn override_path(self, defs_dir: &Path) -> PathBuf {
        defs_dir.join(format!("{}{}", self.file_stem(), SCENARIO_FILE_SUFFIX))
    }

    fn builtin_def(self) -> ScenarioDef {
        match self {
            ScenarioId::CoastalIsland => coastal_island_def(),
            ScenarioId::OpenStrait => open_strait_def(),
        }
    }
}

fn coastal_island_def() -> ScenarioDef {
    ScenarioDef {
        name: "Coastal Island".to_string(),
        map: MapDef {
            rows: 8,
            cols: 8,
            tile_width: TILE_WIDTH_PX,
            tile_height: TILE_HEIGHT_PX,
            cells: cells_from_rows(&[
                "oooooooo",
                "oosssooo",
                "osgggsoo",
                "osgrgsoo",
                "osgggsoo",
                "oosggsoo",
                "ooossooo",
                "oooooooo",
            ]),
        },
        tiles: shared_tile_defs(),
        units: vec![scout_def((2, 3)), skiff_def((6, 6))],
    }
}

fn open_strait_def() -> ScenarioDef {
    ScenarioDef {
        name: "Open Strait".to_string(),
        map: MapDef {
            rows: 8,
            cols: 8,
            tile_width: TILE_WIDTH_PX,
            tile_height: TILE_HEIGHT_PX,
            cells: cells_from_rows(&[
                "ggsoosgg",
                "ggsoosgg",
                "grsoosgg",
                "ggsoosgg",
                "ggsoosrg",
                "ggsoosgg",
                "ggsoosgg",
                "ggsoosgg",
            ]),
        },
        tiles: shared_tile_defs(),
        units: vec![scout_def((3, 0)), skiff_def((2, 3)), skiff_def((5, 4))],
    }
}

/// Expands single-letter row strings into tile ids. Unknown letters pass
/// through as-is and are rejected by validation.
fn cells_from_rows(rows: &[&str]) -> Vec<String> {
    rows.iter()
        .flat_map(|row| row.chars())
        .map(|code| match code {
            'g' => "grass".to_string(),
            'o' => "ocean".to_string(),
            's' => "sand".to_string(),
            'r' => "rock".to_string(),
            other => other.to_string(),
        })
        .collect()
}

fn shared_tile_defs() -> Vec<TileDef> {
    vec![
        TileDef {
            id: "grass".to_string(),
            sprite: "tiles/grass".to_string(),
            frame_width: TILE_WIDTH_PX,
            frame_height: TILE_HEIGHT_PX,
            frames: 1,
            cycle_seconds: 0.0,
            frame_delay_seconds: 0.0,
            walkable: true,
            navigable: false,
            elevation: 0.0,
        },
        TileDef {
            id: "ocean".to_string(),
            sprite: "tiles/ocean".to_string(),
            frame_width: TILE_WIDTH_PX,
            frame_height: TILE_HEIGHT_PX,
            frames: 4,
            cycle_seconds: 0.8,
            frame_delay_seconds: 0.4,
            walkable: false,
            navigable: true,
            elevation: 0.0,
        },
        TileDef {
            id: "sand".to_string(),
            sprite: "tiles/sand".to_string(),
            frame_width: TILE_WIDTH_PX,
            frame_height: TILE_HEIGHT_PX,
            frames: 1,
            cycle_seconds: 0.0,
            frame_delay_seconds: 0.0,
            walkable: true,
            navigable: false,
            elevation: 0.0,
        },
        TileDef {
            id: "rock".to_string(),
            sprite: "tiles/rock".to_string(),
            frame_width: TILE_WIDTH_PX,
            frame_height: TILE_HEIGHT_PX,
            frames: 1,
            cycle_seconds: 0.0,
            frame_delay_seconds: 0.0,
            walkable: false,
            navigable: false,
            elevation: 1.0,
        },
    ]
}

fn scout_def(spawn: (usize, usize)) -> UnitDef {
    UnitDef {
        sprite: "units/scout".to_string(),
        frame_width: 32,
        frame_height: 48,
        frames: 4,
        cycle_seconds: 0.6,
        speed: 72.0,
        mobility: MobilityDef::Walker,
        spawn,
    }
}

fn skiff_def(spawn: (usize, usize)) -> UnitDef {
    UnitDef {
        sprite: "units/skiff".to_string(),
        frame_width: 32,
        frame_height: 48,
        frames: 2,
        cycle_seconds: 0.9,
        speed: 48.0,
        mobility: MobilityDef::Navigator,
        spawn,
    }
}

/// Loads the scenario's JSON override when one is present in the defs
/// directory. A missing file quietly uses the built-in definition; a file
/// that fails to load or assemble falls back with a warning.
fn load_or_builtin(
    defs_dir: Option<&Path>,
    id: ScenarioId,
    surface_width: f32,
    unit_ids: &mut UnitIdAllocator,
) -> Scenario {
    if let Some(defs_dir) = defs_dir {
        let path = id.override_path(defs_dir);
        if path.is_file() {
            match load_scenario_def(&path)
                .and_then(|def| assemble_scenario(&def, surface_width, unit_ids))
            {
                Ok(scenario) => return scenario,
                Err(error) => warn!(
                    scenario = id.file_stem(),
                    path = %path.display(),
                    error = %error,
                    "scenario_defs_load_failed_using_builtin"
                ),
            }
        }
    }
    assemble_scenario(&id.builtin_def(), surface_width, unit_ids)
        .expect("built-in scenario defs are valid")
}

/// Turns a definition into a live scenario laid out against
/// `surface_width`. Units spawn with their center on their tile's center
/// and draw fresh ids from the allocator.
fn assemble_scenario(
    def: &ScenarioDef,
    surface_width: f32,
    unit_ids: &mut UnitIdAllocator,
) -> Result<Scenario, DefsError> {
    validate_scenario_def(def)?;

    let mut tiles = Vec::with_capacity(def.map.cells.len());
    for cell in &def.map.cells {
        let tile_def = def
            .tiles
            .iter()
            .find(|tile| tile.id == *cell)
            .ok_or_else(|| DefsError::Validation {
                at: "map.cells".to_string(),
                message: format!("unknown tile id '{cell}'"),
            })?;
        tiles.push(build_tile(tile_def));
    }
    let tile_map = TileMap::new(
        def.map.rows,
        def.map.cols,
        def.map.tile_width,
        def.map.tile_height,
        tiles,
    )
    .map_err(|error| DefsError::Validation {
        at: "map".to_string(),
        message: error.to_string(),
    })?;

    let units = def
        .units
        .iter()
        .map(|unit| build_unit(unit, &def.map, surface_width, unit_ids.allocate()))
        .collect();

    Ok(Scenario {
        name: def.name.clone(),
        tile_map,
        units,
    })
}

fn build_tile(def: &TileDef) -> Tile {
    let clock =
        AnimationClock::new(def.frames, def.cycle_seconds).with_frame_delay(def.frame_delay_seconds);
    let sprite = Sprite::new(def.sprite.as_str(), def.frame_width, def.frame_height, clock);
    Tile::new(sprite)
        .walkable(def.walkable)
        .navigable(def.navigable)
        .elevation(def.elevation.round() as i32)
}

fn build_unit(def: &UnitDef, map: &MapDef, surface_width: f32, id: UnitId) -> Unit {
    let (row, col) = def.spawn;
    let tile_position = grid_to_screen(row, col, map.tile_width, map.tile_height, surface_width);
    let clock = AnimationClock::new(def.frames, def.cycle_seconds);
    let mut sprite = Sprite::new(def.sprite.as_str(), def.frame_width, def.frame_height, clock);
    sprite.position = Vec2 {
        x: tile_position.x - map.tile_width as f32 / 2.0 + def.frame_width as f32 / 2.0,
        y: tile_position.y,
    };
    Unit::new(id, sprite, def.speed, def.mobility.into())
}
