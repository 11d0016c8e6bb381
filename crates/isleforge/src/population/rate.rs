//! Probabilistic rate gates for cluster spawn and despawn attempts.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Time of day during which an attempt is allowed.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TimeFilter {
    DayOnly,
    NightOnly,
    #[default]
    Both,
}

/// Chance per check plus day/night and player-distance gating.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateSettings {
    pub time_filter: TimeFilter,
    pub chance_day: f32,
    pub chance_night: f32,
    /// Attempts are skipped while the player is closer than this.
    pub min_player_distance: f32,
    /// Attempts are skipped while the player is farther than this. Zero disables the cap.
    pub max_player_distance: f32,
}

impl Default for RateSettings {
    fn default() -> Self {
        Self {
            time_filter: TimeFilter::Both,
            chance_day: 0.5,
            chance_night: 0.5,
            min_player_distance: 0.0,
            max_player_distance: 0.0,
        }
    }
}

impl RateSettings {
    /// Same chance day and night, no distance gating.
    pub fn always(chance: f32) -> Self {
        Self {
            chance_day: chance,
            chance_night: chance,
            ..Default::default()
        }
    }

    pub fn with_time_filter(mut self, filter: TimeFilter) -> Self {
        self.time_filter = filter;
        self
    }

    pub fn with_chances(mut self, day: f32, night: f32) -> Self {
        self.chance_day = day;
        self.chance_night = night;
        self
    }

    pub fn with_player_distance(mut self, min: f32, max: f32) -> Self {
        self.min_player_distance = min;
        self.max_player_distance = max;
        self
    }

    pub fn chance(&self, is_night: bool) -> f32 {
        if is_night {
            self.chance_night
        } else {
            self.chance_day
        }
    }

    /// Whether an attempt may be rolled at all.
    pub fn can_attempt(&self, is_night: bool, player_distance: f32) -> bool {
        match self.time_filter {
            TimeFilter::DayOnly if is_night => return false,
            TimeFilter::NightOnly if !is_night => return false,
            _ => {}
        }
        if player_distance < self.min_player_distance {
            return false;
        }
        if self.max_player_distance > 0.0 && player_distance > self.max_player_distance {
            return false;
        }
        true
    }
}
