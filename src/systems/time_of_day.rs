//! Time-of-day and weather (`spec.md` §2 "Supporting systems", §6
//! `TIME_COMMAND{SET_WEATHER{type}}`). Interface-level: a cycling day
//! clock plus an externally-set weather flag; no gameplay system reacts
//! to weather in the core (visual/sound reaction is a Non-goal), but the
//! snapshot builder reports both for observers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeOfDay {
    Dawn,
    Day,
    Dusk,
    Night,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weather {
    Clear,
    Rain,
    Storm,
    Fog,
}

impl Default for Weather {
    fn default() -> Self {
        Weather::Clear
    }
}

/// One full day lasts this many ticks at the default 20Hz tick rate
/// (24 simulated minutes).
const DAY_LENGTH_TICKS: u64 = 20 * 60 * 24;

#[derive(Debug, Clone, Copy)]
pub struct TimeOfDaySystem {
    pub weather: Weather,
}

impl Default for TimeOfDaySystem {
    fn default() -> Self {
        Self { weather: Weather::default() }
    }
}

impl TimeOfDaySystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_weather(&mut self, weather: Weather) {
        self.weather = weather;
    }

    /// Derives the time-of-day phase from the absolute tick counter; pure
    /// function of `tick`, so it needs no mutable state of its own.
    pub fn phase_at(tick: u64) -> TimeOfDay {
        let fraction = (tick % DAY_LENGTH_TICKS) as f64 / DAY_LENGTH_TICKS as f64;
        match fraction {
            f if f < 0.2 => TimeOfDay::Dawn,
            f if f < 0.6 => TimeOfDay::Day,
            f if f < 0.75 => TimeOfDay::Dusk,
            _ => TimeOfDay::Night,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_cycles_through_a_full_day() {
        assert_eq!(TimeOfDaySystem::phase_at(0), TimeOfDay::Dawn);
        assert_eq!(TimeOfDaySystem::phase_at(DAY_LENGTH_TICKS / 2), TimeOfDay::Day);
        assert_eq!(TimeOfDaySystem::phase_at(DAY_LENGTH_TICKS - 1), TimeOfDay::Night);
    }

    #[test]
    fn set_weather_overrides_default() {
        let mut system = TimeOfDaySystem::new();
        system.set_weather(Weather::Storm);
        assert_eq!(system.weather, Weather::Storm);
    }
}
