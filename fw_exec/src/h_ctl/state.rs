//! Implementations for the horizontal control state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::path::PathBuf;

// Internal
use super::{CourseLoop, HCtlError, Params, PitchLoop, RollLoop};
use util::{
    params,
    maths::bound_abs,
    module::State,
    archive::{Archived, Archiver, ArchiveError},
    session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Horizontal control module state
#[derive(Default)]
pub struct HCtl {
    pub(crate) params: Params,

    pub(crate) ctl_state: CtlState,

    pub(crate) course_loop: CourseLoop,
    pub(crate) roll_loop: RollLoop,
    pub(crate) pitch_loop: PitchLoop,

    pub(crate) report: StatusReport,
    arch_report: Archiver,

    pub(crate) output: OutputData,
    arch_output: Archiver
}

/// The setpoints and actuator commands shared between the control stages.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct CtlState {
    /// Source of the roll setpoint
    pub lateral_mode: LateralMode,

    /// Desired ground track course, clockwise from north.
    ///
    /// Units: radians
    pub course_setpoint_rad: f64,

    /// Feed-forward bank angle for turns of known radius.
    ///
    /// Units: radians
    pub course_pre_bank_rad: f64,

    /// Commanded roll angle, always within the configured roll limit.
    ///
    /// Units: radians
    pub roll_setpoint_rad: f64,

    /// Commanded pitch angle.
    ///
    /// Units: radians
    pub pitch_setpoint_rad: f64,

    /// Aileron command in actuator units
    pub aileron_setpoint: i16,

    /// Elevator command in actuator units
    pub elevator_setpoint: i16
}

/// Input data to horizontal control.
#[derive(Clone, Copy, Default, Debug)]
pub struct InputData {
    /// Current state estimate
    pub estimate: Estimate,

    /// Current state of the vertical (altitude and throttle) controller
    pub vert: VerticalCtl,

    /// New demands from navigation, or `None` if the previous demands still
    /// apply.
    pub nav: Option<NavDemands>
}

/// State estimate consumed by horizontal control.
#[derive(Clone, Copy, Default, Serialize, Deserialize, Debug)]
pub struct Estimate {
    /// Ground track course, clockwise from north.
    ///
    /// Units: radians
    pub hspeed_dir_rad: f64,

    /// Horizontal ground speed.
    ///
    /// Units: meters/second
    pub hspeed_mod_ms: f64,

    /// Roll angle (phi), positive right wing down.
    ///
    /// Units: radians
    pub phi_rad: f64,

    /// Pitch angle (theta), positive nose up.
    ///
    /// Units: radians
    pub theta_rad: f64,

    /// Roll rate (p).
    ///
    /// Units: radians/second
    pub p_rads: f64,

    /// Altitude.
    ///
    /// Units: meters
    pub z_m: f64
}

/// State of the vertical controller consumed by horizontal control.
#[derive(Clone, Copy, Default, Serialize, Deserialize, Debug)]
pub struct VerticalCtl {
    /// Current submode of the auto-throttle
    pub auto_throttle_submode: AutoThrottleSubmode,

    /// Altitude setpoint.
    ///
    /// Units: meters
    pub altitude_setpoint_m: f64,

    /// Throttle setpoint in actuator units
    pub throttle_setpoint: f64,

    /// Cruise throttle computed by the auto-throttle
    pub cruise_throttle: f64
}

/// Demands written by navigation.
#[derive(Clone, Copy, Default, Serialize, Deserialize, Debug)]
pub struct NavDemands {
    /// Source of the roll setpoint
    pub lateral_mode: LateralMode,

    /// Desired course, used in `LateralMode::Course`.
    ///
    /// Units: radians
    pub course_setpoint_rad: f64,

    /// Feed-forward bank angle, used in `LateralMode::Course`.
    ///
    /// Units: radians
    pub course_pre_bank_rad: f64,

    /// Roll setpoint, used in `LateralMode::Roll`.
    ///
    /// Units: radians
    pub roll_setpoint_rad: f64,

    /// Pitch setpoint.
    ///
    /// Units: radians
    pub pitch_setpoint_rad: f64
}

/// Output commands from horizontal control that the actuator layer must
/// execute.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct OutputData {
    /// Aileron command in actuator units
    pub aileron_setpoint: i16,

    /// Elevator command in actuator units
    pub elevator_setpoint: i16,

    /// Roll setpoint used this cycle.
    ///
    /// Units: radians
    pub roll_setpoint_rad: f64
}

/// Status report for horizontal control processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Normalised course error, zero if the course loop did not run.
    ///
    /// Units: radians
    pub course_error_rad: f64,

    /// Ground speed correction factor, zero if the course loop did not run.
    pub speed_factor: f64,

    /// The roll setpoint was saturated to the roll limit
    pub roll_setpoint_limited: bool,

    /// The roll rate setpoint was saturated to the rate limit
    pub roll_rate_setpoint_limited: bool,

    /// The aileron command was saturated to the actuator range
    pub aileron_limited: bool,

    /// The elevator command was saturated to the actuator range
    pub elevator_limited: bool,

    /// A negative `elevator_of_roll` was floored to zero this cycle
    pub elevator_of_roll_clamped: bool,

    /// Loiter trim added to the elevator command
    pub loiter_trim: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Source of the roll setpoint.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum LateralMode {
    /// Navigation commands the roll angle directly.
    Roll,

    /// Navigation commands a course and the course loop computes the roll
    /// setpoint.
    Course
}

/// Submodes of the vertical controller's auto-throttle.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum AutoThrottleSubmode {
    Standard,
    Aggressive,
    Blended
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LateralMode {
    fn default() -> Self {
        LateralMode::Roll
    }
}

impl Default for AutoThrottleSubmode {
    fn default() -> Self {
        AutoThrottleSubmode::Standard
    }
}

impl State for HCtl {
    type InitData = PathBuf;
    type InitError = HCtlError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = Infallible;

    /// Initialise the horizontal control module.
    ///
    /// Expected init data is the path to the parameter file.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the parameters
        let params: Params = params::load(&init_data)
            .map_err(HCtlError::ParamLoadError)?;

        *self = Self::from_params(params)?;

        // Initialise the archivers
        self.arch_report = Archiver::from_path(
            session, "h_ctl/status_report.csv"
        ).map_err(HCtlError::ArchiveInitError)?;
        self.arch_output = Archiver::from_path(
            session, "h_ctl/output.csv"
        ).map_err(HCtlError::ArchiveInitError)?;

        Ok(())
    }

    /// Perform one control cycle.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport::default();

        if let Some(nav) = input_data.nav {
            self.set_nav_demands(nav);
        }

        if self.ctl_state.lateral_mode == LateralMode::Course {
            self.course_loop(input_data);
        }

        self.attitude_loop(input_data);

        self.output = OutputData {
            aileron_setpoint: self.ctl_state.aileron_setpoint,
            elevator_setpoint: self.ctl_state.elevator_setpoint,
            roll_setpoint_rad: self.ctl_state.roll_setpoint_rad
        };

        trace!(
            "HCtl output:\n    roll_sp: {:.4}\n    ail: {}\n    elev: {}",
            self.output.roll_setpoint_rad,
            self.output.aileron_setpoint,
            self.output.elevator_setpoint
        );

        Ok((self.output, self.report))
    }
}

impl Archived for HCtl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_report.serialise(self.report)?;
        self.arch_output.serialise(self.output)?;

        Ok(())
    }
}

impl HCtl {

    /// Build the module from already loaded parameters.
    ///
    /// The returned module has no archives, use `State::init` to load the
    /// parameters from file and archive each cycle.
    pub fn from_params(params: Params) -> Result<Self, HCtlError> {
        params.validate()?;

        let course_loop = CourseLoop::new(&params);
        let roll_loop = RollLoop::new(&params);
        let pitch_loop = PitchLoop::new(&params);

        info!(
            "HCtl initialised (rate loop: {}, aggressive climb: {}, loiter trim: {})",
            params.rate_loop.is_some(),
            params.agr_climb.is_some(),
            params.loiter_trim.is_some()
        );

        Ok(Self {
            params,
            course_loop,
            roll_loop,
            pitch_loop,
            ..Default::default()
        })
    }

    /// Apply new demands from navigation.
    ///
    /// In `LateralMode::Roll` the roll setpoint is taken from the demands and
    /// saturated to the roll limit. In `LateralMode::Course` it is left for
    /// the course loop to compute.
    pub fn set_nav_demands(&mut self, nav: NavDemands) {
        if nav.lateral_mode != self.ctl_state.lateral_mode {
            debug!(
                "HCtl lateral mode {:?} -> {:?}",
                self.ctl_state.lateral_mode,
                nav.lateral_mode
            );
        }

        self.ctl_state.lateral_mode = nav.lateral_mode;
        self.ctl_state.course_setpoint_rad = nav.course_setpoint_rad;
        self.ctl_state.course_pre_bank_rad = nav.course_pre_bank_rad;
        self.ctl_state.pitch_setpoint_rad = nav.pitch_setpoint_rad;

        if nav.lateral_mode == LateralMode::Roll {
            let roll_sp = bound_abs(
                nav.roll_setpoint_rad, self.params.roll_max_setpoint_rad);
            if roll_sp != nav.roll_setpoint_rad {
                self.report.roll_setpoint_limited = true;
            }
            self.ctl_state.roll_setpoint_rad = roll_sp;
        }
    }

    /// Run the course loop, updating the roll setpoint.
    pub fn course_loop(&mut self, input_data: &InputData) {
        self.ctl_state.roll_setpoint_rad = self.course_loop.get_roll_setpoint(
            &input_data.estimate,
            &input_data.vert,
            self.ctl_state.course_setpoint_rad,
            self.ctl_state.course_pre_bank_rad,
            &mut self.report
        );
    }

    /// Run the attitude loops, roll first and then pitch, updating the
    /// aileron and elevator commands.
    pub fn attitude_loop(&mut self, input_data: &InputData) {
        self.ctl_state.aileron_setpoint = self.roll_loop.get_aileron(
            &input_data.estimate,
            self.ctl_state.roll_setpoint_rad,
            input_data.vert.throttle_setpoint,
            &mut self.report
        );

        self.ctl_state.elevator_setpoint = self.pitch_loop.get_elevator(
            &input_data.estimate,
            self.ctl_state.pitch_setpoint_rad,
            input_data.vert.cruise_throttle,
            &mut self.report
        );
    }

    /// Clear all setpoints, commands and loop memories, keeping the
    /// parameters.
    pub fn reset(&mut self) {
        self.ctl_state = CtlState::default();
        self.roll_loop.reset();
        self.pitch_loop.reset();
        self.report = StatusReport::default();
        self.output = OutputData::default();

        debug!("HCtl reset");
    }

    /// Set the roll to elevator feed-forward. A negative value is floored to
    /// zero on the next pitch loop cycle.
    pub fn set_elevator_of_roll(&mut self, elevator_of_roll: f64) {
        self.pitch_loop.set_elevator_of_roll(elevator_of_roll);
    }

    /// Get the current control state.
    pub fn ctl_state(&self) -> &CtlState {
        &self.ctl_state
    }

    /// Get the parameters in use.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Get the roll loop.
    pub fn roll_loop(&self) -> &RollLoop {
        &self.roll_loop
    }

    /// Get the pitch loop.
    pub fn pitch_loop(&self) -> &PitchLoop {
        &self.pitch_loop
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::h_ctl::{params::test_params, RateLoopParams, DEFAULT_MAX_PPRZ};
    use std::f64::consts::PI;
    use std::num::NonZeroUsize;

    fn run_cycle(h_ctl: &mut HCtl, input: &InputData) -> (OutputData, StatusReport) {
        match h_ctl.proc(input) {
            Ok(r) => r,
            Err(e) => match e {}
        }
    }

    fn course_input(heading_rad: f64, speed_ms: f64) -> InputData {
        InputData {
            estimate: Estimate {
                hspeed_dir_rad: heading_rad,
                hspeed_mod_ms: speed_ms,
                ..Default::default()
            },
            vert: VerticalCtl::default(),
            nav: Some(NavDemands {
                lateral_mode: LateralMode::Course,
                ..Default::default()
            })
        }
    }

    #[test]
    fn test_course_scenario() {
        let mut params = test_params();
        params.course_pgain = -1.0;
        params.roll_max_setpoint_rad = 2.0;
        let mut h_ctl = HCtl::from_params(params.clone()).unwrap();

        let (output, report) = run_cycle(&mut h_ctl, &course_input(PI / 2.0, 12.0));
        assert!((output.roll_setpoint_rad + PI / 2.0).abs() < 1e-12);
        assert!(!report.roll_setpoint_limited);
        assert_eq!(report.speed_factor, 1.0);

        // A positive gain gives the opposite bank
        params.course_pgain = 1.0;
        let mut h_ctl = HCtl::from_params(params.clone()).unwrap();
        let (output, _) = run_cycle(&mut h_ctl, &course_input(PI / 2.0, 12.0));
        assert!((output.roll_setpoint_rad - PI / 2.0).abs() < 1e-12);

        // A tighter roll limit saturates the setpoint
        params.roll_max_setpoint_rad = 0.7;
        let mut h_ctl = HCtl::from_params(params).unwrap();
        let (output, report) = run_cycle(&mut h_ctl, &course_input(PI / 2.0, 12.0));
        assert_eq!(output.roll_setpoint_rad, 0.7);
        assert!(report.roll_setpoint_limited);
    }

    #[test]
    fn test_roll_mode_bypasses_course_loop() {
        let mut h_ctl = HCtl::from_params(test_params()).unwrap();

        let mut input = course_input(PI / 2.0, 12.0);
        input.nav = Some(NavDemands {
            lateral_mode: LateralMode::Roll,
            roll_setpoint_rad: 0.2,
            course_setpoint_rad: 1.0,
            ..Default::default()
        });

        let (output, report) = run_cycle(&mut h_ctl, &input);
        assert_eq!(output.roll_setpoint_rad, 0.2);
        assert_eq!(report.speed_factor, 0.0);

        // Demands persist when navigation sends nothing new, and an excessive
        // roll demand is saturated.
        input.nav = None;
        let (output, _) = run_cycle(&mut h_ctl, &input);
        assert_eq!(output.roll_setpoint_rad, 0.2);

        input.nav = Some(NavDemands {
            lateral_mode: LateralMode::Roll,
            roll_setpoint_rad: -3.0,
            ..Default::default()
        });
        let (output, report) = run_cycle(&mut h_ctl, &input);
        assert_eq!(output.roll_setpoint_rad, -0.7);
        assert!(report.roll_setpoint_limited);
    }

    #[test]
    fn test_attitude_outputs() {
        let mut h_ctl = HCtl::from_params(test_params()).unwrap();

        let input = InputData {
            estimate: Estimate {
                phi_rad: 0.25,
                theta_rad: -0.125,
                ..Default::default()
            },
            vert: VerticalCtl::default(),
            nav: Some(NavDemands {
                lateral_mode: LateralMode::Roll,
                roll_setpoint_rad: 0.0,
                pitch_setpoint_rad: 0.0,
                ..Default::default()
            })
        };

        let (output, report) = run_cycle(&mut h_ctl, &input);

        // -6000 * 0.25
        assert_eq!(output.aileron_setpoint, -1500);
        // -5000 * -0.125 + 1000 * 0.25
        assert_eq!(output.elevator_setpoint, 875);
        assert!(!report.aileron_limited);
        assert!(!report.elevator_limited);
        assert_eq!(h_ctl.ctl_state().aileron_setpoint, -1500);
    }

    #[test]
    fn test_outputs_saturate() {
        let mut h_ctl = HCtl::from_params(test_params()).unwrap();

        let input = InputData {
            estimate: Estimate {
                phi_rad: 3.0,
                theta_rad: -3.0,
                ..Default::default()
            },
            ..Default::default()
        };

        let (output, report) = run_cycle(&mut h_ctl, &input);
        assert_eq!(output.aileron_setpoint, -DEFAULT_MAX_PPRZ);
        assert_eq!(output.elevator_setpoint, DEFAULT_MAX_PPRZ);
        assert!(report.aileron_limited);
        assert!(report.elevator_limited);
    }

    #[test]
    fn test_elevator_of_roll_is_floored() {
        let mut h_ctl = HCtl::from_params(test_params()).unwrap();
        h_ctl.set_elevator_of_roll(-0.5);

        let input = InputData {
            estimate: Estimate {
                phi_rad: 0.5,
                ..Default::default()
            },
            ..Default::default()
        };

        let (output, report) = run_cycle(&mut h_ctl, &input);
        assert_eq!(output.elevator_setpoint, 0);
        assert!(report.elevator_of_roll_clamped);
        assert_eq!(h_ctl.pitch_loop().elevator_of_roll(), 0.0);

        let (output, report) = run_cycle(&mut h_ctl, &input);
        assert_eq!(output.elevator_setpoint, 0);
        assert!(!report.elevator_of_roll_clamped);
        assert_eq!(h_ctl.pitch_loop().elevator_of_roll(), 0.0);
    }

    #[test]
    fn test_reset() {
        let mut params = test_params();
        params.rate_loop = Some(RateLoopParams {
            mode: 1.0,
            setpoint_pgain: -4.0,
            max_setpoint_rads: 2.0,
            pgain: -1000.0,
            igain: 1.0,
            dgain: 0.0,
            sum_nb_samples: NonZeroUsize::new(4).unwrap()
        });
        let mut h_ctl = HCtl::from_params(params).unwrap();

        let input = InputData {
            estimate: Estimate {
                phi_rad: 0.5,
                p_rads: 0.25,
                ..Default::default()
            },
            ..Default::default()
        };

        let (first, _) = run_cycle(&mut h_ctl, &input);
        run_cycle(&mut h_ctl, &input);
        let (third, _) = run_cycle(&mut h_ctl, &input);
        assert_ne!(first, third);

        h_ctl.reset();
        assert_eq!(h_ctl.ctl_state().aileron_setpoint, 0);

        let (after_reset, _) = run_cycle(&mut h_ctl, &input);
        assert_eq!(first, after_reset);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mut params = test_params();
        params.max_pprz = 0;

        assert!(matches!(
            HCtl::from_params(params),
            Err(HCtlError::InvalidParam("max_pprz", _))
        ));
    }
}
