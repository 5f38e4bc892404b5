mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;
mod tools;
pub mod world;

pub use input::InputAction;
pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use rendering::{snap_px, world_to_screen_px, Renderer, Viewport, PLACEHOLDER_HALF_SIZE_PX};
pub use scene::{InputSnapshot, Scene};
