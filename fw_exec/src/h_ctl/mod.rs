//! # Horizontal control module
//!
//! Horizontal control converts the course demanded by navigation into aileron
//! and elevator commands. It is a cascade of small feedback loops:
//!
//! - The course loop turns the ground-track course error into a roll (bank)
//!   setpoint, scaled by ground speed so the bank response stays constant
//!   across the speed range.
//! - The roll loop turns the roll error into an aileron command. When a
//!   `[rate_loop]` parameter section is present the roll error also drives a
//!   roll rate setpoint, regulated by a PID loop with a moving window
//!   integral, and the two aileron commands are blended.
//! - The pitch loop turns the pitch error into an elevator command, adding up
//!   elevator proportional to bank angle and, when a `[loiter_trim]` section
//!   is present, a rate limited trim derived from the cruise throttle.
//!
//! Each cycle the course loop runs first (only in `LateralMode::Course`),
//! followed by the roll loop and then the pitch loop.
//!
//! All actuator commands are saturated to `±max_pprz` and truncated to whole
//! actuator units. Nothing in the cyclic path can fail.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod course_loop;
mod loiter_trim;
mod params;
mod pitch_loop;
mod rate_loop;
mod roll_loop;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use course_loop::*;
pub use loiter_trim::*;
pub use params::*;
pub use pitch_loop::*;
pub use rate_loop::*;
pub use roll_loop::*;
pub use state::*;

use util::maths::clamp;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Lower bound on the ground speed correction factor of the course loop.
pub const SPEED_FACTOR_MIN: f64 = 0.66;

/// Upper bound on the ground speed correction factor of the course loop.
pub const SPEED_FACTOR_MAX: f64 = 1.5;

/// Number of cycles the loiter trim takes to travel the full distance between
/// the loiter and dash trims.
///
/// This is a fixed empirical value and is not rescaled if the cycle frequency
/// changes.
pub const LOITER_TRIM_RATE_DIVISOR: f64 = 80.0;

/// Default actuator command range, in actuator units.
pub const DEFAULT_MAX_PPRZ: i16 = 9600;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors that can occur while initialising horizontal control.
#[derive(Debug, thiserror::Error)]
pub enum HCtlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid parameter `{0}`: {1}")]
    InvalidParam(&'static str, String),

    #[error("Could not initialise the archives: {0}")]
    ArchiveInitError(util::archive::ArchiveError),
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Saturate a command to `±max_pprz` and truncate it to whole actuator units.
///
/// A NaN command produces a neutral (zero) output.
pub fn trim_pprz(cmd: f64, max_pprz: i16) -> i16 {
    let max = max_pprz as f64;
    clamp(cmd, -max, max) as i16
}

/// True if the command lies outside the actuator range.
pub(crate) fn exceeds_pprz(cmd: f64, max_pprz: i16) -> bool {
    cmd.abs() > max_pprz as f64
}
