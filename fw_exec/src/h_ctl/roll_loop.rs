//! Roll loop
//!
//! Turns the roll error into an aileron command. The plain variant is a
//! proportional loop with a throttle feed-forward. The rate augmented variant
//! additionally drives the roll rate loop from the roll error and blends the
//! two aileron commands.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::{
    exceeds_pprz, trim_pprz, Estimate, Params, RateLoopParams, RollRateLoop,
    StatusReport};
use util::maths::{blend, bound_abs};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Proportional roll angle loop.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct SimpleRollLoop {
    /// Roll error to aileron gain
    pgain: f64,

    /// Throttle setpoint to aileron feed-forward
    aileron_of_throttle: f64,

    /// Maximum absolute actuator command
    max_pprz: i16
}

/// Roll angle loop cascaded into the roll rate loop.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RateAugmentedRollLoop {
    /// The angle-only loop
    angle_loop: SimpleRollLoop,

    /// The rate loop
    rate_loop: RollRateLoop,

    /// Blend between the angle loop (0) and the rate loop (1)
    mode: f64,

    /// Roll error to roll rate setpoint gain
    setpoint_pgain: f64,

    /// Maximum absolute roll rate setpoint
    max_setpoint_rads: f64,

    /// Roll rate setpoint from the last cycle
    roll_rate_setpoint_rads: f64,

    /// Maximum absolute actuator command
    max_pprz: i16
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The roll loop variant selected by the parameters.
#[derive(Debug, Clone, Serialize)]
pub enum RollLoop {
    Simple(SimpleRollLoop),
    RateAugmented(RateAugmentedRollLoop)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for RollLoop {
    fn default() -> Self {
        RollLoop::Simple(SimpleRollLoop::default())
    }
}

impl RollLoop {
    /// Create the roll loop, rate augmented if the parameters contain a rate
    /// loop section.
    pub fn new(params: &Params) -> Self {
        let angle_loop = SimpleRollLoop::new(params);

        match params.rate_loop {
            Some(ref r) => RollLoop::RateAugmented(
                RateAugmentedRollLoop::new(angle_loop, r, params.max_pprz)
            ),
            None => RollLoop::Simple(angle_loop)
        }
    }

    /// Get the aileron command for this cycle.
    pub fn get_aileron(
        &mut self,
        estimate: &Estimate,
        roll_setpoint_rad: f64,
        throttle_setpoint: f64,
        report: &mut StatusReport
    ) -> i16 {
        match self {
            RollLoop::Simple(l) => l.get_aileron(
                estimate.phi_rad, roll_setpoint_rad, throttle_setpoint, report),
            RollLoop::RateAugmented(l) => l.get_aileron(
                estimate, roll_setpoint_rad, throttle_setpoint, report)
        }
    }

    /// The current roll rate setpoint, or `None` without a rate loop.
    pub fn roll_rate_setpoint_rads(&self) -> Option<f64> {
        match self {
            RollLoop::Simple(_) => None,
            RollLoop::RateAugmented(l) => Some(l.roll_rate_setpoint_rads)
        }
    }

    /// Clear all loop memories.
    pub fn reset(&mut self) {
        if let RollLoop::RateAugmented(l) = self {
            l.reset();
        }
    }
}

impl SimpleRollLoop {
    pub fn new(params: &Params) -> Self {
        Self {
            pgain: params.roll_pgain,
            aileron_of_throttle: params.aileron_of_throttle,
            max_pprz: params.max_pprz
        }
    }

    /// Untrimmed aileron command for the roll error.
    fn cmd(&self, err_rad: f64, throttle_setpoint: f64) -> f64 {
        self.pgain * err_rad + throttle_setpoint * self.aileron_of_throttle
    }

    /// Get the aileron command for the roll angle and setpoint.
    pub fn get_aileron(
        &self,
        phi_rad: f64,
        roll_setpoint_rad: f64,
        throttle_setpoint: f64,
        report: &mut StatusReport
    ) -> i16 {
        let cmd = self.cmd(phi_rad - roll_setpoint_rad, throttle_setpoint);

        if exceeds_pprz(cmd, self.max_pprz) {
            report.aileron_limited = true;
        }

        trim_pprz(cmd, self.max_pprz)
    }
}

impl RateAugmentedRollLoop {
    pub fn new(angle_loop: SimpleRollLoop, params: &RateLoopParams, max_pprz: i16) -> Self {
        Self {
            angle_loop,
            rate_loop: RollRateLoop::new(params, max_pprz),
            mode: params.mode,
            setpoint_pgain: params.setpoint_pgain,
            max_setpoint_rads: params.max_setpoint_rads,
            roll_rate_setpoint_rads: 0f64,
            max_pprz
        }
    }

    /// Get the blended aileron command.
    pub fn get_aileron(
        &mut self,
        estimate: &Estimate,
        roll_setpoint_rad: f64,
        throttle_setpoint: f64,
        report: &mut StatusReport
    ) -> i16 {
        let err_rad = estimate.phi_rad - roll_setpoint_rad;

        let angle_ail = self.angle_loop.get_aileron(
            estimate.phi_rad, roll_setpoint_rad, throttle_setpoint, report);

        let rate_sp = self.setpoint_pgain * err_rad;
        self.roll_rate_setpoint_rads = bound_abs(rate_sp, self.max_setpoint_rads);
        if self.roll_rate_setpoint_rads != rate_sp {
            report.roll_rate_setpoint_limited = true;
        }

        let rate_ail = self.rate_loop.get_aileron(
            estimate.p_rads, self.roll_rate_setpoint_rads, report);

        // Blending two in-range commands stays in range for a mode in [0, 1],
        // the trim only matters for a mode outside that.
        trim_pprz(
            blend(rate_ail as f64, angle_ail as f64, self.mode),
            self.max_pprz
        )
    }

    /// Get the rate loop.
    pub fn rate_loop(&self) -> &RollRateLoop {
        &self.rate_loop
    }

    pub fn reset(&mut self) {
        self.rate_loop.reset();
        self.roll_rate_setpoint_rads = 0f64;
    }
}
