//! Loiter trim compensator
//!
//! Adds an elevator trim which follows the cruise throttle chosen by the
//! auto-throttle: towards the negated loiter trim when flying slower than
//! nominal and towards the dash trim when flying faster. The trim is rate limited so a
//! sudden throttle change never steps the elevator.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::{LoiterTrimParams, LOITER_TRIM_RATE_DIVISOR};
use util::maths::{clamp, lin_map};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The loiter trim compensator.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct LoiterTrim {
    min_cruise_throttle: f64,
    nominal_cruise_throttle: f64,
    max_cruise_throttle: f64,

    /// Trim magnitude at the minimum cruise throttle, applied negated
    loiter_trim: f64,

    /// Trim reached at the maximum cruise throttle
    dash_trim: f64,

    /// Trim returned by the previous call
    last_trim: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LoiterTrim {
    pub fn new(params: &LoiterTrimParams) -> Self {
        Self {
            min_cruise_throttle: params.min_cruise_throttle,
            nominal_cruise_throttle: params.nominal_cruise_throttle,
            max_cruise_throttle: params.max_cruise_throttle,
            loiter_trim: params.loiter_trim.unwrap_or(params.min_cruise_throttle),
            dash_trim: params.dash_trim.unwrap_or(params.max_cruise_throttle),
            last_trim: 0f64
        }
    }

    /// Largest change in trim allowed between two calls.
    pub fn max_change(&self) -> f64 {
        (self.loiter_trim - self.dash_trim).abs() / LOITER_TRIM_RATE_DIVISOR
    }

    /// Get the elevator trim for the given cruise throttle.
    pub fn get(&mut self, cruise_throttle: f64) -> f64 {
        let throttle = clamp(
            cruise_throttle,
            self.min_cruise_throttle,
            self.max_cruise_throttle
        );

        let target = if throttle - self.nominal_cruise_throttle > 0.0 {
            lin_map(
                (self.nominal_cruise_throttle, self.max_cruise_throttle),
                (0.0, self.dash_trim),
                throttle
            )
        }
        else {
            // Reaches -loiter_trim at the minimum cruise throttle
            lin_map(
                (self.nominal_cruise_throttle, self.min_cruise_throttle),
                (0.0, -self.loiter_trim),
                throttle
            )
        };

        let max_change = self.max_change();
        let trim = clamp(
            target,
            self.last_trim - max_change,
            self.last_trim + max_change
        );

        self.last_trim = trim;
        trim
    }

    /// Trim returned by the previous call.
    pub fn last_trim(&self) -> f64 {
        self.last_trim
    }

    pub fn reset(&mut self) {
        self.last_trim = 0f64;
    }
}
