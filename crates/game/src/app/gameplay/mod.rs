use std::path::{Path, PathBuf};

use isoworld::{
    grid_to_screen, load_scenario_def, validate_scenario_def, AnimationClock, Camera, DefsError,
    GameSession, InputAction, InputSnapshot, LoopConfig, MapDef, MobilityDef, MouseEvent,
    MouseEventKind, Scenario, ScenarioDef, Scene, Sprite, Tile, TileDef, TileMap, Unit, UnitDef,
    UnitId, UnitIdAllocator, Vec2,
};
use tracing::warn;

const CAMERA_PAN_SPEED_PX_PER_SECOND: f32 = 320.0;
const TILE_WIDTH_PX: u32 = 64;
const TILE_HEIGHT_PX: u32 = 32;
const SCENARIO_FILE_SUFFIX: &str = ".scenario.json";

include!("scenario.rs");
include!("scene_impl.rs");

pub(crate) fn build_gameplay(
    config: &LoopConfig,
    defs_dir: Option<PathBuf>,
) -> (Box<dyn Scene>, GameSession) {
    let surface_width = config.window_width as f32;
    let mut unit_ids = UnitIdAllocator::default();
    let initial = ScenarioId::CoastalIsland;
    let scenario = load_or_builtin(defs_dir.as_deref(), initial, surface_width, &mut unit_ids);

    let mut camera = Camera::new(config.window_width as f32, config.window_height as f32);
    camera.set_speed(CAMERA_PAN_SPEED_PX_PER_SECOND);
    let session = GameSession::new(scenario, camera, surface_width);
    let scene = GameplayScene::new(defs_dir, unit_ids, initial);
    (Box::new(scene), session)
}
