//! Horizontal control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

// Internal
use super::{HCtlError, DEFAULT_MAX_PPRZ};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for horizontal control.
///
/// The optional sections enable the optional stages of the controller. If a
/// section is missing from the parameter file that stage is not used.
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct Params {

    // ---- COURSE LOOP ----

    /// Course error to roll setpoint gain.
    ///
    /// Units: radians/radian
    pub course_pgain: f64,

    /// Multiplier applied to the pre-bank demanded by navigation.
    #[serde(default = "default_course_pre_bank_correction")]
    pub course_pre_bank_correction: f64,

    /// Maximum absolute roll setpoint.
    ///
    /// Units: radians
    pub roll_max_setpoint_rad: f64,

    /// Airspeed at which the course loop gain is used unscaled.
    ///
    /// Units: meters/second
    pub nominal_airspeed_ms: f64,

    // ---- ROLL LOOP ----

    /// Roll error to aileron gain.
    ///
    /// Units: actuator units/radian
    pub roll_pgain: f64,

    /// Throttle setpoint to aileron feed-forward, compensating for propeller
    /// torque.
    #[serde(default)]
    pub aileron_of_throttle: f64,

    // ---- PITCH LOOP ----

    /// Pitch error to elevator gain.
    ///
    /// Units: actuator units/radian
    pub pitch_pgain: f64,

    /// Absolute roll angle to elevator feed-forward. Negative values are
    /// treated as zero.
    ///
    /// Units: actuator units/radian
    #[serde(default)]
    pub elevator_of_roll: f64,

    // ---- ACTUATORS ----

    /// Maximum absolute actuator command.
    #[serde(default = "default_max_pprz")]
    pub max_pprz: i16,

    // ---- OPTIONAL STAGES ----

    /// Roll rate loop parameters.
    #[serde(default)]
    pub rate_loop: Option<RateLoopParams>,

    /// Aggressive climb parameters.
    #[serde(default)]
    pub agr_climb: Option<AgrClimbParams>,

    /// Loiter trim parameters.
    #[serde(default)]
    pub loiter_trim: Option<LoiterTrimParams>
}

/// Parameters of the roll rate loop.
#[derive(Deserialize, Serialize, Debug, Clone, Copy)]
pub struct RateLoopParams {
    /// Blend between the angle loop (0) and the rate loop (1).
    pub mode: f64,

    /// Roll error to roll rate setpoint gain.
    ///
    /// Units: 1/second
    pub setpoint_pgain: f64,

    /// Maximum absolute roll rate setpoint.
    ///
    /// Units: radians/second
    pub max_setpoint_rads: f64,

    /// Roll rate error to aileron gain.
    pub pgain: f64,

    /// Integral gain, relative to `pgain`.
    pub igain: f64,

    /// Derivative gain, relative to `pgain`.
    pub dgain: f64,

    /// Number of samples in the integral window, zero is rejected on load.
    pub sum_nb_samples: NonZeroUsize
}

/// Parameters for aggressive climbs and descents.
#[derive(Deserialize, Serialize, Debug, Clone, Copy)]
pub struct AgrClimbParams {
    /// Course command multiplier while below the altitude setpoint.
    pub climb_nav_ratio: f64,

    /// Course command multiplier while at or above the altitude setpoint.
    pub descent_nav_ratio: f64
}

/// Parameters of the loiter trim compensator.
#[derive(Deserialize, Serialize, Debug, Clone, Copy)]
pub struct LoiterTrimParams {
    /// Cruise throttle when loitering (slowest cruise).
    pub min_cruise_throttle: f64,

    /// Nominal cruise throttle, at which no trim is applied.
    pub nominal_cruise_throttle: f64,

    /// Cruise throttle when dashing (fastest cruise).
    pub max_cruise_throttle: f64,

    /// Elevator trim reached at the minimum cruise throttle. Defaults to
    /// `min_cruise_throttle`.
    #[serde(default)]
    pub loiter_trim: Option<f64>,

    /// Elevator trim reached at the maximum cruise throttle. Defaults to
    /// `max_cruise_throttle`.
    #[serde(default)]
    pub dash_trim: Option<f64>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the parameters are consistent.
    pub fn validate(&self) -> Result<(), HCtlError> {
        if !(self.nominal_airspeed_ms > 0.0) {
            return Err(HCtlError::InvalidParam(
                "nominal_airspeed_ms",
                format!("must be positive, found {}", self.nominal_airspeed_ms)
            ))
        }

        if !(self.roll_max_setpoint_rad >= 0.0) {
            return Err(HCtlError::InvalidParam(
                "roll_max_setpoint_rad",
                format!("must not be negative, found {}", self.roll_max_setpoint_rad)
            ))
        }

        if self.max_pprz <= 0 {
            return Err(HCtlError::InvalidParam(
                "max_pprz",
                format!("must be positive, found {}", self.max_pprz)
            ))
        }

        if let Some(ref r) = self.rate_loop {
            if !(r.max_setpoint_rads >= 0.0) {
                return Err(HCtlError::InvalidParam(
                    "rate_loop.max_setpoint_rads",
                    format!("must not be negative, found {}", r.max_setpoint_rads)
                ))
            }
        }

        if let Some(ref l) = self.loiter_trim {
            if !(l.min_cruise_throttle < l.nominal_cruise_throttle
                && l.nominal_cruise_throttle < l.max_cruise_throttle)
            {
                return Err(HCtlError::InvalidParam(
                    "loiter_trim",
                    format!(
                        "cruise throttles must satisfy min < nominal < max, found {} {} {}",
                        l.min_cruise_throttle,
                        l.nominal_cruise_throttle,
                        l.max_cruise_throttle
                    )
                ))
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn default_course_pre_bank_correction() -> f64 {
    1.0
}

fn default_max_pprz() -> i16 {
    DEFAULT_MAX_PPRZ
}

/// A plain parameter set used throughout the unit tests, with no optional
/// stages enabled.
#[cfg(test)]
pub(crate) fn test_params() -> Params {
    Params {
        course_pgain: -1.0,
        course_pre_bank_correction: 1.0,
        roll_max_setpoint_rad: 0.7,
        nominal_airspeed_ms: 12.0,
        roll_pgain: -6000.0,
        aileron_of_throttle: 0.0,
        pitch_pgain: -5000.0,
        elevator_of_roll: 1000.0,
        max_pprz: DEFAULT_MAX_PPRZ,
        rate_loop: None,
        agr_climb: None,
        loiter_trim: None
    }
}
