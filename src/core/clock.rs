//! Converts host frame timestamps into a whole number of fixed sub-steps.

/// Longest wall-clock interval credited to one frame, in seconds.
pub const MAX_FRAME_SECONDS: f64 = 1.0 / 30.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameClock {
    previous_timestamp: Option<f64>,
    /// Simulated time owed but not yet stepped.
    time_left: f64,
    /// Set after a reset or resume; the next frame is credited exactly one sub-step.
    first_frame: bool,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            first_frame: true,
            ..Self::default()
        }
    }

    /// Credit the frame at `timestamp_ms` and return how many sub-steps of `dt` to run.
    /// A non-finite timestamp credits nothing and leaves the clock untouched.
    pub fn advance(&mut self, timestamp_ms: f64, dt: f64, sim_time_per_second: f64) -> usize {
        if !timestamp_ms.is_finite() {
            return 0;
        }
        let credit = match self.previous_timestamp {
            Some(prev) if !self.first_frame => {
                ((timestamp_ms - prev) / 1000.0).clamp(0.0, MAX_FRAME_SECONDS) * sim_time_per_second
            }
            _ => dt,
        };
        self.previous_timestamp = Some(timestamp_ms);
        self.first_frame = false;

        self.time_left += credit;
        let mut steps = 0;
        while self.time_left >= dt {
            self.time_left -= dt;
            steps += 1;
        }
        steps
    }

    /// The next frame follows a pause; do not credit the gap.
    pub fn mark_resumed(&mut self) {
        self.first_frame = true;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    #[inline]
    pub fn time_left(&self) -> f64 {
        self.time_left
    }
}
