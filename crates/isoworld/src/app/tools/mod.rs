mod overlay;
mod perf_stats;

pub(crate) use overlay::{draw_overlay, OverlayData};
pub(crate) use perf_stats::{PerfStats, PerfStatsSnapshot, RollingMsStats};
