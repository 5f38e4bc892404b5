use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod defs;
mod sprite_keys;

pub use app::world::{
    grid_to_screen, AnimationClock, Camera, Direction, GameSession, GridPos, Mobility, MouseEvent,
    MouseEventKind, Scenario, Sprite, TextureOffset, Tile, TileMap, TileMapError, Unit, UnitId,
    UnitIdAllocator, Vec2, WorldBounds, ARRIVAL_THRESHOLD_PX, CAMERA_ZOOM_DEFAULT, CAMERA_ZOOM_MAX,
    CAMERA_ZOOM_MIN, CAMERA_ZOOM_STEP,
};
pub use app::{
    run_app, run_app_with_metrics, snap_px, world_to_screen_px, AppError, InputAction,
    InputSnapshot, LoopConfig, LoopMetricsSnapshot, MetricsHandle, Renderer, Scene, Viewport,
    PLACEHOLDER_HALF_SIZE_PX, SLOW_FRAME_ENV_VAR,
};
pub use defs::{
    load_scenario_def, validate_scenario_def, DefsError, MapDef, MobilityDef, ScenarioDef, TileDef,
    UnitDef,
};

pub const ROOT_ENV_VAR: &str = "ISOWORLD_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub defs_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("{var} is set but does not point to a directory: {path}")]
    InvalidEnvRoot { var: &'static str, path: PathBuf },
    #[error("failed to resolve current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

/// Resolves the directory the app loads `assets/` and `defs/` from.
///
/// `ISOWORLD_ROOT` wins when set. Otherwise the executable's ancestor
/// directories are searched for one that carries `assets/` or `defs/`,
/// falling back to the current directory for `cargo run` style launches.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    Ok(AppPaths {
        assets_dir: root.join("assets"),
        defs_dir: root.join("defs"),
        root,
    })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if normalized.is_dir() {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot {
                    var: ROOT_ENV_VAR,
                    path: normalized,
                })
            }
        }
        Err(env::VarError::NotPresent) => {
            if let Ok(exe) = env::current_exe() {
                if let Some(exe_dir) = exe.parent() {
                    for candidate in exe_dir.ancestors() {
                        if is_app_root(candidate) {
                            return Ok(normalize_path(candidate));
                        }
                    }
                }
            }
            env::current_dir().map_err(StartupError::CurrentDir)
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_app_root(path: &Path) -> bool {
    path.join("assets").is_dir() || path.join("defs").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_root_marker_requires_assets_or_defs() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(!is_app_root(dir.path()));

        fs::create_dir(dir.path().join("defs")).expect("create defs");
        assert!(is_app_root(dir.path()));
    }

    #[test]
    fn app_root_marker_accepts_assets_only_layouts() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("assets")).expect("create assets");
        assert!(is_app_root(dir.path()));
    }

    #[test]
    fn normalize_path_keeps_nonexistent_paths_verbatim() {
        let ghost = PathBuf::from("definitely/not/a/real/dir");
        assert_eq!(normalize_path(&ghost), ghost);
    }
}
