use isoworld::{resolve_app_paths, GameSession, LoopConfig, Scene};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
    pub(crate) session: GameSession,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Isoworld Startup ===");

    let config = LoopConfig::default();
    // Path resolution failures are re-reported by the loop itself; here a
    // missing defs directory only disables scenario overrides.
    let defs_dir = resolve_app_paths().map(|paths| paths.defs_dir).ok();
    let (scene, session) = gameplay::build_gameplay(&config, defs_dir);

    AppWiring {
        config,
        scene,
        session,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
