//! Day/night clock driving rate gates.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A repeating day. Phase 0 is sunrise, `[0.5, 1)` is night.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DayNightCycle {
    /// Seconds for a full day and night.
    pub day_length_seconds: f32,
    /// Phase in `[0, 1)` at time zero.
    pub start_phase: f32,
}

impl Default for DayNightCycle {
    fn default() -> Self {
        Self {
            day_length_seconds: 120.0,
            start_phase: 0.0,
        }
    }
}

impl DayNightCycle {
    pub fn new(day_length_seconds: f32) -> Self {
        Self {
            day_length_seconds,
            start_phase: 0.0,
        }
    }

    pub fn with_start_phase(mut self, phase: f32) -> Self {
        self.start_phase = phase;
        self
    }

    /// Phase in `[0, 1)` at `time` seconds.
    pub fn phase(&self, time: f32) -> f32 {
        if self.day_length_seconds <= 0.0 || !self.day_length_seconds.is_finite() {
            return self.start_phase.rem_euclid(1.0);
        }
        (self.start_phase + time / self.day_length_seconds).rem_euclid(1.0)
    }

    pub fn is_night(&self, time: f32) -> bool {
        self.phase(time) >= 0.5
    }

    /// Sun rotation about the X axis in degrees; one full turn per day.
    pub fn sun_angle_degrees(&self, time: f32) -> f32 {
        self.phase(time) * 360.0
    }
}
