//! Course loop
//!
//! The outer loop of horizontal control, turning the course error into a roll
//! setpoint.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::{
    AgrClimbParams, AutoThrottleSubmode, Estimate, Params, StatusReport,
    VerticalCtl, SPEED_FACTOR_MAX, SPEED_FACTOR_MIN};
use util::maths::{bound_abs, clamp, norm_rad_angle};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The course loop.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CourseLoop {
    /// Course error to roll setpoint gain
    pgain: f64,

    /// Multiplier applied to the pre-bank
    pre_bank_correction: f64,

    /// Maximum absolute roll setpoint
    roll_max_setpoint_rad: f64,

    /// Airspeed at which `pgain` is used unscaled
    nominal_airspeed_ms: f64,

    /// Aggressive climb ratios, if enabled
    agr_climb: Option<AgrClimb>
}

/// Course command scaling used while the auto-throttle is in its aggressive
/// submode, so that the aircraft flies a steeper path during large altitude
/// changes.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AgrClimb {
    /// Multiplier while below the altitude setpoint
    pub climb_nav_ratio: f64,

    /// Multiplier while at or above the altitude setpoint
    pub descent_nav_ratio: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AgrClimb {
    pub fn new(params: &AgrClimbParams) -> Self {
        Self {
            climb_nav_ratio: params.climb_nav_ratio,
            descent_nav_ratio: params.descent_nav_ratio
        }
    }

    /// Get the course command multiplier for the given vertical state, or
    /// `None` if the auto-throttle is not in its aggressive submode.
    pub fn ratio(&self, estimate: &Estimate, vert: &VerticalCtl) -> Option<f64> {
        if vert.auto_throttle_submode != AutoThrottleSubmode::Aggressive {
            return None
        }

        let altitude_error_m = estimate.z_m - vert.altitude_setpoint_m;

        if altitude_error_m < 0.0 {
            Some(self.climb_nav_ratio)
        }
        else {
            Some(self.descent_nav_ratio)
        }
    }
}

impl CourseLoop {

    /// Create the course loop from the parameters.
    pub fn new(params: &Params) -> Self {
        Self {
            pgain: params.course_pgain,
            pre_bank_correction: params.course_pre_bank_correction,
            roll_max_setpoint_rad: params.roll_max_setpoint_rad,
            nominal_airspeed_ms: params.nominal_airspeed_ms,
            agr_climb: params.agr_climb.as_ref().map(AgrClimb::new)
        }
    }

    /// Ground speed correction factor.
    ///
    /// Scaling the gain by ground speed gives a constant bank angle response,
    /// rather than a constant turn rate response, across the speed range.
    pub fn speed_factor(&self, hspeed_mod_ms: f64) -> f64 {
        clamp(
            hspeed_mod_ms / self.nominal_airspeed_ms,
            SPEED_FACTOR_MIN,
            SPEED_FACTOR_MAX
        )
    }

    /// Get the roll setpoint for the current course and demands.
    ///
    /// The result is saturated to the roll limit.
    pub fn get_roll_setpoint(
        &self,
        estimate: &Estimate,
        vert: &VerticalCtl,
        course_setpoint_rad: f64,
        course_pre_bank_rad: f64,
        report: &mut StatusReport
    ) -> f64 {
        let err_rad = norm_rad_angle(estimate.hspeed_dir_rad - course_setpoint_rad);
        let speed_factor = self.speed_factor(estimate.hspeed_mod_ms);

        report.course_error_rad = err_rad;
        report.speed_factor = speed_factor;

        let mut cmd = self.pgain * err_rad * speed_factor;

        if let Some(ratio) = self.agr_climb.and_then(|a| a.ratio(estimate, vert)) {
            cmd *= ratio;
        }

        let roll_sp_rad = cmd + self.pre_bank_correction * course_pre_bank_rad;
        let bounded_rad = bound_abs(roll_sp_rad, self.roll_max_setpoint_rad);

        if bounded_rad != roll_sp_rad {
            report.roll_setpoint_limited = true;
        }

        bounded_rad
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::h_ctl::params::test_params;
    use std::f64::consts::PI;

    fn estimate(heading_rad: f64, speed_ms: f64) -> Estimate {
        Estimate {
            hspeed_dir_rad: heading_rad,
            hspeed_mod_ms: speed_ms,
            ..Default::default()
        }
    }

    fn roll_sp(course_loop: &CourseLoop, est: &Estimate, vert: &VerticalCtl, pre_bank: f64) -> f64 {
        let mut report = StatusReport::default();
        course_loop.get_roll_setpoint(est, vert, 0.0, pre_bank, &mut report)
    }

    #[test]
    fn test_speed_factor() {
        let course_loop = CourseLoop::new(&test_params());

        assert_eq!(course_loop.speed_factor(12.0), 1.0);
        assert_eq!(course_loop.speed_factor(0.0), SPEED_FACTOR_MIN);
        assert_eq!(course_loop.speed_factor(100.0), SPEED_FACTOR_MAX);
        assert_eq!(course_loop.speed_factor(15.0), 1.25);
    }

    #[test]
    fn test_command_scales_with_speed() {
        let mut params = test_params();
        params.roll_max_setpoint_rad = 10.0;
        let course_loop = CourseLoop::new(&params);
        let vert = VerticalCtl::default();

        for &err in &[0.1, -0.4, 1.0, 2.5] {
            let mut last = 0.0;
            for i in 0..40 {
                let speed = i as f64;
                let mag = roll_sp(&course_loop, &estimate(err, speed), &vert, 0.0).abs();
                assert!(mag >= last, "not monotonic at {} m/s", speed);

                let expected = err.abs() * course_loop.speed_factor(speed);
                assert!((mag - expected).abs() < 1e-12);
                last = mag;
            }
        }
    }

    #[test]
    fn test_roll_setpoint_saturates() {
        let course_loop = CourseLoop::new(&test_params());
        let vert = VerticalCtl::default();

        for i in -50..50 {
            let heading = i as f64 * 0.9;
            for &pre_bank in &[-100.0, 0.0, 0.3, 1e6] {
                let sp = roll_sp(&course_loop, &estimate(heading, 30.0), &vert, pre_bank);
                assert!(sp.abs() <= 0.7, "{} exceeds the roll limit", sp);
            }
        }

        let mut report = StatusReport::default();
        course_loop.get_roll_setpoint(&estimate(PI / 2.0, 12.0), &vert, 0.0, 0.0, &mut report);
        assert!(report.roll_setpoint_limited);
    }

    #[test]
    fn test_course_error_wraps() {
        let mut params = test_params();
        params.roll_max_setpoint_rad = 10.0;
        let course_loop = CourseLoop::new(&params);
        let vert = VerticalCtl::default();

        // Heading 350 deg, setpoint 10 deg: a 20 deg error to the left, not
        // 340 deg to the right.
        let mut report = StatusReport::default();
        let sp = course_loop.get_roll_setpoint(
            &estimate(350f64.to_radians(), 12.0),
            &vert,
            10f64.to_radians(),
            0.0,
            &mut report
        );
        assert!((report.course_error_rad + 20f64.to_radians()).abs() < 1e-9);
        assert!((sp - 20f64.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn test_pre_bank() {
        let mut params = test_params();
        params.course_pre_bank_correction = 0.5;
        let course_loop = CourseLoop::new(&params);

        let sp = roll_sp(&course_loop, &estimate(0.0, 12.0), &VerticalCtl::default(), 0.5);
        assert_eq!(sp, 0.25);
    }

    #[test]
    fn test_agr_climb() {
        let mut params = test_params();
        params.roll_max_setpoint_rad = 10.0;
        params.agr_climb = Some(AgrClimbParams {
            climb_nav_ratio: 0.5,
            descent_nav_ratio: 2.0
        });
        let course_loop = CourseLoop::new(&params);

        let mut est = estimate(0.5, 12.0);
        est.z_m = 100.0;

        let mut vert = VerticalCtl {
            altitude_setpoint_m: 150.0,
            ..Default::default()
        };

        // Standard submode leaves the command unscaled
        assert_eq!(roll_sp(&course_loop, &est, &vert, 0.0), -0.5);

        // Below the setpoint: climbing
        vert.auto_throttle_submode = AutoThrottleSubmode::Aggressive;
        assert_eq!(roll_sp(&course_loop, &est, &vert, 0.0), -0.25);

        // Above the setpoint: descending
        vert.altitude_setpoint_m = 50.0;
        assert_eq!(roll_sp(&course_loop, &est, &vert, 0.0), -1.0);

        // Pre-bank is not scaled
        assert_eq!(roll_sp(&course_loop, &est, &vert, 0.125), -0.875);
    }
}
