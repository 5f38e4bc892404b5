use std::time::Duration;

pub(crate) const PERF_WINDOW_LEN: usize = 120;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct RollingMsStats {
    pub last_ms: f32,
    pub avg_ms: f32,
    pub max_ms: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct PerfStatsSnapshot {
    pub sim: RollingMsStats,
    pub draw: RollingMsStats,
}

/// Rolling per-phase frame timings for the debug overlay.
#[derive(Debug, Default)]
pub(crate) struct PerfStats {
    sim: RollingWindowMs,
    draw: RollingWindowMs,
}

impl PerfStats {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_frame(&mut self, sim_duration: Duration, draw_duration: Duration) {
        self.sim.push_ms(duration_to_ms(sim_duration));
        self.draw.push_ms(duration_to_ms(draw_duration));
    }

    pub(crate) fn snapshot(&self) -> PerfStatsSnapshot {
        PerfStatsSnapshot {
            sim: self.sim.snapshot(),
            draw: self.draw.snapshot(),
        }
    }
}

#[derive(Debug)]
struct RollingWindowMs {
    samples_ms: [f32; PERF_WINDOW_LEN],
    head: usize,
    count: usize,
    sum_ms: f32,
    last_ms: f32,
}

impl Default for RollingWindowMs {
    fn default() -> Self {
        Self {
            samples_ms: [0.0; PERF_WINDOW_LEN],
            head: 0,
            count: 0,
            sum_ms: 0.0,
            last_ms: 0.0,
        }
    }
}

impl RollingWindowMs {
    fn push_ms(&mut self, value_ms: f32) {
        self.last_ms = value_ms;
        if self.count == PERF_WINDOW_LEN {
            self.sum_ms -= self.samples_ms[self.head];
        } else {
            self.count += 1;
        }
        self.samples_ms[self.head] = value_ms;
        self.head = (self.head + 1) % PERF_WINDOW_LEN;
        self.sum_ms += value_ms;
    }

    fn snapshot(&self) -> RollingMsStats {
        if self.count == 0 {
            return RollingMsStats::default();
        }
        let max_ms = self.samples_ms[..self.count]
            .iter()
            .copied()
            .fold(f32::MIN, f32::max);
        RollingMsStats {
            last_ms: self.last_ms,
            avg_ms: self.sum_ms / self.count as f32,
            max_ms,
        }
    }
}

fn duration_to_ms(duration: Duration) -> f32 {
    duration.as_secs_f32() * 1000.0
}
