//! Playback clock and normalized time ratio.

pub const MAX_TIME_FACTOR: f32 = 10.0;

/// Normalized position of `abs_time` within a looping clip, in [0,1).
/// `duration` must be positive.
pub fn time_ratio(abs_time: f64, duration: f32) -> f32 {
    let ratio = (abs_time / f64::from(duration)).rem_euclid(1.0) as f32;
    // f64 -> f32 rounding can land exactly on 1.0
    if ratio < 1.0 { ratio } else { 0.0 }
}

/// Accumulates scaled frame time and derives the clip ratio, with an
/// optional manual override (scrubbing).
#[derive(Clone, Debug)]
pub struct Playback {
    abs_time: f64,
    time_factor: f32,
    paused: bool,
    ratio: f32,
    ratio_override: bool,
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            abs_time: 0.0,
            time_factor: 1.0,
            paused: false,
            ratio: 0.0,
            ratio_override: false,
        }
    }
}

impl Playback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `frame_delta * time_factor` unless paused.
    /// Runs even while the ratio is overridden.
    pub fn advance(&mut self, frame_delta: f64) {
        if !self.paused {
            self.abs_time += frame_delta * f64::from(self.time_factor);
        }
    }

    /// Ratio for a clip of `duration` seconds. Recomputed from the clock
    /// unless overridden, in which case the scrubbed value is kept.
    pub fn ratio(&mut self, duration: f32) -> f32 {
        if !self.ratio_override {
            self.ratio = time_ratio(self.abs_time, duration);
        }
        self.ratio
    }

    /// Last ratio returned by [`Playback::ratio`] or set by an override.
    #[inline]
    pub fn current_ratio(&self) -> f32 {
        self.ratio
    }

    pub fn override_ratio(&mut self, ratio: f32) {
        self.ratio = ratio.clamp(0.0, 1.0);
        self.ratio_override = true;
    }

    pub fn release_override(&mut self) {
        self.ratio_override = false;
    }

    #[inline]
    pub fn is_overridden(&self) -> bool {
        self.ratio_override
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_paused(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_time_factor(&mut self, factor: f32) {
        self.time_factor = factor.clamp(0.0, MAX_TIME_FACTOR);
    }

    #[inline]
    pub fn time_factor(&self) -> f32 {
        self.time_factor
    }

    #[inline]
    pub fn abs_time(&self) -> f64 {
        self.abs_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_wraps_into_unit_interval() {
        assert_eq!(time_ratio(5.0, 2.0), 0.5);
        assert_eq!(time_ratio(0.0, 2.0), 0.0);
        assert_eq!(time_ratio(4.0, 2.0), 0.0);
        for i in 0..10_000 {
            let t = f64::from(i) * 0.0137;
            let r = time_ratio(t, 0.7);
            assert!((0.0..1.0).contains(&r), "t={t} r={r}");
        }
        let r = time_ratio(1.0 - 1e-12, 1.0);
        assert!((0.0..1.0).contains(&r));
    }

    #[test]
    fn pause_and_factor_scale_the_clock() {
        let mut p = Playback::new();
        p.set_time_factor(2.0);
        p.advance(0.5);
        assert_eq!(p.abs_time(), 1.0);
        p.set_paused(true);
        p.advance(0.5);
        assert_eq!(p.abs_time(), 1.0);
        p.set_time_factor(50.0);
        assert_eq!(p.time_factor(), MAX_TIME_FACTOR);
    }

    #[test]
    fn override_freezes_ratio_but_not_clock() {
        let mut p = Playback::new();
        p.advance(0.25);
        assert_eq!(p.ratio(1.0), 0.25);

        p.override_ratio(0.8);
        p.advance(0.25);
        assert_eq!(p.ratio(1.0), 0.8);
        assert_eq!(p.abs_time(), 0.5);

        p.release_override();
        assert_eq!(p.ratio(1.0), 0.5);
    }
}
