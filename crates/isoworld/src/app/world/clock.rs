/// Frame-advance timer shared by every animated renderable.
///
/// The clock accumulates caller-supplied delta time and steps its frame index
/// whenever the accumulator crosses `frame_duration + frame_delay`. Crossing
/// subtracts the threshold instead of zeroing the accumulator, so leftover
/// time carries into the next tick and irregular tick lengths do not drift
/// the animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationClock {
    frames: u32,
    current_frame: u32,
    frame_duration: f32,
    frame_delay: f32,
    accumulator: f32,
}

impl AnimationClock {
    /// Builds a clock for `frames` frames spread evenly over one cycle of
    /// `cycle_seconds`. A zero frame count yields a zero frame duration and
    /// the clock never advances.
    pub fn new(frames: u32, cycle_seconds: f32) -> Self {
        let frame_duration = if frames == 0 {
            0.0
        } else {
            cycle_seconds / frames as f32
        };
        Self {
            frames,
            current_frame: 0,
            frame_duration,
            frame_delay: 0.0,
            accumulator: 0.0,
        }
    }

    /// Appends an extra pause to every frame. Negative values are treated as
    /// no delay.
    pub fn with_frame_delay(mut self, delay_seconds: f32) -> Self {
        self.frame_delay = delay_seconds.max(0.0);
        self
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    pub fn frame_duration(&self) -> f32 {
        self.frame_duration
    }

    pub fn frame_delay(&self) -> f32 {
        self.frame_delay
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Accumulates `delta_seconds` and steps the frame index once per full
    /// `frame_duration + frame_delay` crossed, wrapping at `frames`. Static
    /// sprites (`frames <= 1`), degenerate durations, and non-positive or
    /// non-finite deltas are a no-op. Returns the frame index after the
    /// update.
    pub fn advance(&mut self, delta_seconds: f32) -> u32 {
        if self.frames <= 1 || self.frame_duration <= 0.0 {
            return self.current_frame;
        }
        if !delta_seconds.is_finite() || delta_seconds <= 0.0 {
            return self.current_frame;
        }

        self.accumulator += delta_seconds;
        let threshold = self.frame_duration + self.frame_delay;
        if self.accumulator >= threshold {
            let steps = (self.accumulator / threshold).floor();
            self.accumulator = (self.accumulator - steps * threshold).max(0.0);
            let advanced = (self.current_frame as u64).saturating_add(steps as u64);
            self.current_frame = (advanced % self.frames as u64) as u32;
        }
        self.current_frame
    }

    /// Adopts the frame position of `master`, putting this clock in lockstep
    /// with it. Used by the tile map so every tile sharing a texture shows
    /// the same frame regardless of update order.
    pub fn sync_with(&mut self, master: &AnimationClock) {
        self.current_frame = master.current_frame;
        self.accumulator = master.accumulator;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_advances_once_per_full_duration() {
        let mut clock = AnimationClock::new(4, 0.4);
        assert_eq!(clock.advance(0.1), 1);
        assert_eq!(clock.advance(0.1), 2);
        assert_eq!(clock.advance(0.1), 3);
        assert_eq!(clock.advance(0.1), 0);
    }

    #[test]
    fn remainder_is_carried_not_discarded() {
        let mut clock = AnimationClock::new(4, 0.4);
        assert_eq!(clock.advance(0.15), 1);
        assert!((clock.accumulator() - 0.05).abs() < 0.000_01);
        // 0.30s total crosses three 0.1s boundaries; dropping the 0.05s
        // carry after the first advance would leave this at frame 2.
        assert_eq!(clock.advance(0.15), 3);
        assert!(clock.accumulator().abs() < 0.000_01);
    }

    #[test]
    fn irregular_deltas_do_not_drift() {
        let deltas = [0.033, 0.017, 0.042, 0.008, 0.100, 0.019, 0.061, 0.120];
        let mut clock = AnimationClock::new(6, 0.6);
        let mut total = 0.0f32;
        for delta in deltas {
            clock.advance(delta);
            total += delta;
        }
        let expected = (total / clock.frame_duration()) as u32 % clock.frames();
        assert_eq!(clock.current_frame(), expected);
    }

    #[test]
    fn frame_delay_extends_the_period() {
        let mut clock = AnimationClock::new(4, 0.4).with_frame_delay(0.1);
        assert_eq!(clock.advance(0.15), 0);
        assert_eq!(clock.advance(0.05), 1);
    }

    #[test]
    fn single_frame_clock_never_advances() {
        let mut clock = AnimationClock::new(1, 1.0);
        assert_eq!(clock.advance(10.0), 0);
        assert_eq!(clock.accumulator(), 0.0);
    }

    #[test]
    fn zero_frames_has_zero_duration_and_never_advances() {
        let mut clock = AnimationClock::new(0, 1.0);
        assert_eq!(clock.frame_duration(), 0.0);
        assert_eq!(clock.advance(5.0), 0);
    }

    #[test]
    fn non_positive_and_non_finite_deltas_are_ignored() {
        let mut clock = AnimationClock::new(4, 0.4);
        assert_eq!(clock.advance(0.0), 0);
        assert_eq!(clock.advance(-1.0), 0);
        assert_eq!(clock.advance(f32::NAN), 0);
        assert_eq!(clock.advance(f32::INFINITY), 0);
        assert_eq!(clock.accumulator(), 0.0);
    }

    #[test]
    fn negative_frame_delay_is_clamped_to_zero() {
        let clock = AnimationClock::new(4, 0.4).with_frame_delay(-0.5);
        assert_eq!(clock.frame_delay(), 0.0);
    }

    #[test]
    fn sync_with_copies_frame_and_accumulator() {
        let mut master = AnimationClock::new(4, 0.4);
        master.advance(0.25);
        let mut follower = AnimationClock::new(4, 0.4);
        follower.sync_with(&master);

        assert_eq!(follower.current_frame(), master.current_frame());
        assert_eq!(follower.accumulator(), master.accumulator());
    }
}
