//! Frame timing: lap clock, refresh-rate snapping, FPS counter.

use std::time::{Duration, Instant};

/// (frame period, tolerance) in nanoseconds.
const REFRESH_RATES: [(u64, u64); 9] = [
    (16_666_667, 1_000_000), // 60 Hz
    (13_888_889, 250_000),   // 72 Hz
    (13_333_333, 250_000),   // 75 Hz
    (11_764_706, 250_000),   // 85 Hz
    (11_111_111, 250_000),   // 90 Hz
    (10_000_000, 500_000),   // 100 Hz
    (8_333_333, 500_000),    // 120 Hz
    (6_944_445, 500_000),    // 144 Hz
    (4_166_667, 1_000_000),  // 240 Hz
];

/// Snap a measured frame time to the nearest common display period when
/// it is within tolerance, removing vsync jitter from animation steps.
pub fn round_to_common_refresh_rate(dt: Duration) -> Duration {
    let ns = u64::try_from(dt.as_nanos()).unwrap_or(u64::MAX);
    REFRESH_RATES
        .iter()
        .find(|&&(period, tol)| ns.abs_diff(period) < tol)
        .map_or(dt, |&(period, _)| Duration::from_nanos(period))
}

/// Measures the time between consecutive laps.
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time since the previous lap; zero on the first call.
    pub fn lap(&mut self) -> Duration {
        self.lap_at(Instant::now())
    }

    fn lap_at(&mut self, now: Instant) -> Duration {
        let dt = self.last.map_or(Duration::ZERO, |last| now - last);
        self.last = Some(now);
        dt
    }
}

/// Counts frames and reports the rate once per second.
#[derive(Debug)]
pub struct FpsCounter {
    frames: u32,
    window_start: Instant,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        Self {
            frames: 0,
            window_start: now,
        }
    }

    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        self.frames += 1;
        let elapsed = now.duration_since(self.window_start);
        if elapsed < Duration::from_secs(1) {
            return None;
        }
        let fps = f64::from(self.frames) / elapsed.as_secs_f64();
        self.frames = 0;
        self.window_start = now;
        Some(fps)
    }
}
