//! # Replay source
//!
//! A replay is a CSV file in which each record holds the inputs to one
//! horizontal control cycle: the state estimate, the state of the vertical
//! controller, and optionally new demands from navigation. The navigation
//! columns of a record are either all filled, in which case the demands are
//! applied that cycle, or all empty, in which case the previous demands still
//! apply.
//!
//! The `time_s` column is informational. Records must be in time order, but
//! the executable runs one record per control cycle at its own fixed cycle
//! frequency, so the spacing of `time_s` does not pace the replay.
//!
//! The expected header is:
//!
//! ```text
//! time_s,hspeed_dir_rad,hspeed_mod_ms,phi_rad,theta_rad,p_rads,z_m,
//! auto_throttle_submode,altitude_setpoint_m,throttle_setpoint,cruise_throttle,
//! lateral_mode,course_setpoint_rad,course_pre_bank_rad,roll_setpoint_rad,
//! pitch_setpoint_rad
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

// Internal
use crate::h_ctl::{
    AutoThrottleSubmode, Estimate, InputData, LateralMode, NavDemands, VerticalCtl
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A loaded replay.
#[derive(Debug, Default, Clone)]
pub struct Replay {
    records: Vec<ReplayRecord>
}

/// One record (row) of a replay file.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayRecord {
    /// Time of the record relative to the start of the replay.
    ///
    /// Units: seconds
    pub time_s: f64,

    pub hspeed_dir_rad: f64,
    pub hspeed_mod_ms: f64,
    pub phi_rad: f64,
    pub theta_rad: f64,
    pub p_rads: f64,
    pub z_m: f64,

    pub auto_throttle_submode: AutoThrottleSubmode,
    pub altitude_setpoint_m: f64,
    pub throttle_setpoint: f64,
    pub cruise_throttle: f64,

    pub lateral_mode: Option<LateralMode>,
    pub course_setpoint_rad: Option<f64>,
    pub course_pre_bank_rad: Option<f64>,
    pub roll_setpoint_rad: Option<f64>,
    pub pitch_setpoint_rad: Option<f64>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors that can occur while loading a replay.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Could not open the replay file: {0}")]
    FileOpenError(std::io::Error),

    #[error("Could not parse record {0} of the replay: {1}")]
    ParseError(usize, csv::Error),

    #[error("Record {0} has a lateral mode but is missing navigation column `{1}`")]
    IncompleteNavDemands(usize, &'static str),

    #[error("Record {0} has navigation columns but no lateral mode")]
    MissingLateralMode(usize),

    #[error("Record {0} at {1} s is earlier than the previous record")]
    NonMonotonicTime(usize, f64)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Replay {
    /// Load a replay from the given path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ReplayError> {
        let file = File::open(path).map_err(ReplayError::FileOpenError)?;

        Self::from_reader(file)
    }

    /// Load a replay from any reader producing CSV text.
    ///
    /// Every record is checked on load so the replay can be run without
    /// further error handling.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReplayError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records: Vec<ReplayRecord> = Vec::new();

        for (i, result) in csv_reader.deserialize().enumerate() {
            let record: ReplayRecord = result
                .map_err(|e| ReplayError::ParseError(i, e))?;

            // Check the navigation columns are consistent
            record.nav_demands(i)?;

            if let Some(prev) = records.last() {
                if record.time_s < prev.time_s {
                    return Err(ReplayError::NonMonotonicTime(i, record.time_s))
                }
            }

            records.push(record);
        }

        debug!("Loaded {} replay records", records.len());

        Ok(Self { records })
    }

    /// Number of records in the replay.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Time of the last record, or zero for an empty replay.
    pub fn duration_s(&self) -> f64 {
        self.records.last().map(|r| r.time_s).unwrap_or(0.0)
    }

    /// Iterate over the control inputs built from each record.
    pub fn inputs(&self) -> impl Iterator<Item = InputData> + '_ {
        // Records were checked on load
        self.records.iter().map(|r| InputData {
            estimate: r.estimate(),
            vert: r.vert(),
            nav: r.nav_demands(0).unwrap_or(None)
        })
    }
}

impl ReplayRecord {
    /// The state estimate held by this record.
    pub fn estimate(&self) -> Estimate {
        Estimate {
            hspeed_dir_rad: self.hspeed_dir_rad,
            hspeed_mod_ms: self.hspeed_mod_ms,
            phi_rad: self.phi_rad,
            theta_rad: self.theta_rad,
            p_rads: self.p_rads,
            z_m: self.z_m
        }
    }

    /// The vertical controller state held by this record.
    pub fn vert(&self) -> VerticalCtl {
        VerticalCtl {
            auto_throttle_submode: self.auto_throttle_submode,
            altitude_setpoint_m: self.altitude_setpoint_m,
            throttle_setpoint: self.throttle_setpoint,
            cruise_throttle: self.cruise_throttle
        }
    }

    /// The navigation demands held by this record, if any.
    ///
    /// `index` is only used to identify the record in any error.
    pub fn nav_demands(&self, index: usize) -> Result<Option<NavDemands>, ReplayError> {
        let lateral_mode = match self.lateral_mode {
            Some(m) => m,
            None => {
                if self.course_setpoint_rad.is_some()
                    || self.course_pre_bank_rad.is_some()
                    || self.roll_setpoint_rad.is_some()
                    || self.pitch_setpoint_rad.is_some()
                {
                    return Err(ReplayError::MissingLateralMode(index))
                }
                return Ok(None)
            }
        };

        let get = |v: Option<f64>, name: &'static str| {
            v.ok_or(ReplayError::IncompleteNavDemands(index, name))
        };

        Ok(Some(NavDemands {
            lateral_mode,
            course_setpoint_rad: get(self.course_setpoint_rad, "course_setpoint_rad")?,
            course_pre_bank_rad: get(self.course_pre_bank_rad, "course_pre_bank_rad")?,
            roll_setpoint_rad: get(self.roll_setpoint_rad, "roll_setpoint_rad")?,
            pitch_setpoint_rad: get(self.pitch_setpoint_rad, "pitch_setpoint_rad")?
        }))
    }
}
