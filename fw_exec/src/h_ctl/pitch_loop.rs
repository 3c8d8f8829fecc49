//! Pitch loop
//!
//! Turns the pitch error into an elevator command. Up elevator proportional
//! to the bank angle is added to make up for the loss of vertical lift in a
//! turn.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use serde::Serialize;

// Internal
use super::{exceeds_pprz, trim_pprz, Estimate, LoiterTrim, Params, StatusReport};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The pitch loop.
#[derive(Debug, Default, Clone, Serialize)]
pub struct PitchLoop {
    /// Pitch error to elevator gain
    pgain: f64,

    /// Absolute roll to elevator feed-forward, floored at zero on use
    elevator_of_roll: f64,

    /// Maximum absolute actuator command
    max_pprz: i16,

    /// Loiter trim compensator, if enabled
    loiter_trim: Option<LoiterTrim>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PitchLoop {
    pub fn new(params: &Params) -> Self {
        Self {
            pgain: params.pitch_pgain,
            elevator_of_roll: params.elevator_of_roll,
            max_pprz: params.max_pprz,
            loiter_trim: params.loiter_trim.as_ref().map(LoiterTrim::new)
        }
    }

    /// Get the elevator command for this cycle.
    pub fn get_elevator(
        &mut self,
        estimate: &Estimate,
        pitch_setpoint_rad: f64,
        cruise_throttle: f64,
        report: &mut StatusReport
    ) -> i16 {
        // The floor sticks, the stored value is overwritten.
        if !(self.elevator_of_roll >= 0.0) {
            warn!(
                "HCtl elevator_of_roll was {}, using 0",
                self.elevator_of_roll
            );
            self.elevator_of_roll = 0.0;
            report.elevator_of_roll_clamped = true;
        }

        let err_rad = estimate.theta_rad - pitch_setpoint_rad;
        let mut cmd = err_rad * self.pgain
            + self.elevator_of_roll * estimate.phi_rad.abs();

        if let Some(ref mut loiter_trim) = self.loiter_trim {
            let trim = loiter_trim.get(cruise_throttle);
            report.loiter_trim = trim;
            cmd += trim;
        }

        if exceeds_pprz(cmd, self.max_pprz) {
            report.elevator_limited = true;
        }

        trim_pprz(cmd, self.max_pprz)
    }

    /// Set the roll to elevator feed-forward.
    pub fn set_elevator_of_roll(&mut self, elevator_of_roll: f64) {
        self.elevator_of_roll = elevator_of_roll;
    }

    /// The roll to elevator feed-forward currently in use.
    pub fn elevator_of_roll(&self) -> f64 {
        self.elevator_of_roll
    }

    /// Get the loiter trim compensator.
    pub fn loiter_trim(&self) -> Option<&LoiterTrim> {
        self.loiter_trim.as_ref()
    }

    pub fn reset(&mut self) {
        if let Some(ref mut loiter_trim) = self.loiter_trim {
            loiter_trim.reset();
        }
    }
}
