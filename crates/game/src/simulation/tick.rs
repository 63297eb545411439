/// Longest frame the accumulator will absorb; anything slower is dropped
/// rather than replayed.
const MAX_FRAME_TIME: f32 = 0.25;

/// Converts wall-clock frame times into whole simulation ticks.
pub struct FixedTimestep {
    tick_rate: u32,
    dt: f32,
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(tick_rate: u32) -> Self {
        let tick_rate = tick_rate.max(1);
        Self {
            tick_rate,
            dt: 1.0 / tick_rate as f32,
            accumulator: 0.0,
        }
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    fn take_tick(&mut self) -> bool {
        if self.accumulator < self.dt {
            return false;
        }
        self.accumulator -= self.dt;
        true
    }

    /// Feeds a frame's elapsed time in and runs `step` once per whole tick.
    pub fn advance(&mut self, delta: f32, mut step: impl FnMut(f32)) -> u32 {
        self.accumulator += delta.clamp(0.0, MAX_FRAME_TIME);
        let mut ticks_run = 0;
        while self.take_tick() {
            step(self.dt);
            ticks_run += 1;
        }
        ticks_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_ticks_per_thirtieth() {
        let mut ts = FixedTimestep::new(60);
        let mut steps = Vec::new();
        let ran = ts.advance(1.0 / 30.0 + 0.001, |dt| steps.push(dt));
        assert_eq!(ran, 2);
        assert_eq!(steps, vec![ts.dt(), ts.dt()]);
    }

    #[test]
    fn partial_ticks_carry_over() {
        let mut ts = FixedTimestep::new(60);
        assert_eq!(ts.advance(0.01, |_| {}), 0);
        assert_eq!(ts.advance(0.01, |_| {}), 1);
    }

    #[test]
    fn long_frames_are_capped() {
        let mut ts = FixedTimestep::new(60);
        let mut steps = 0;
        let ran = ts.advance(5.0, |_| steps += 1);
        assert_eq!(ran, steps);
        assert!((14..=15).contains(&ran));
    }
}
