//! Checks the shipped parameter file and sample replay can drive horizontal
//! control.

use std::path::PathBuf;

use fw_lib::{
    h_ctl::{HCtl, Params},
    replay::Replay,
};
use util::module::State;

fn workspace_path(rel: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join(rel)
}

fn shipped_params() -> Params {
    let params_str = std::fs::read_to_string(workspace_path("params/h_ctl.toml"))
        .expect("Cannot read params/h_ctl.toml");

    toml::from_str(&params_str).expect("Cannot parse params/h_ctl.toml")
}

#[test]
fn test_shipped_params_are_valid() {
    let params = shipped_params();

    assert!(params.validate().is_ok());
    assert!(params.rate_loop.is_some());
    assert!(params.agr_climb.is_some());
    assert!(params.loiter_trim.is_some());
}

#[test]
fn test_sample_replay() {
    let params = shipped_params();
    let max_pprz = params.max_pprz;
    let roll_max = params.roll_max_setpoint_rad;

    let replay = Replay::from_path(workspace_path("replays/course_change.csv"))
        .expect("Cannot load the sample replay");
    assert!(!replay.is_empty());

    let mut h_ctl = HCtl::from_params(params.clone()).unwrap();
    let mut first_run = Vec::new();

    for input in replay.inputs() {
        let (output, _) = match h_ctl.proc(&input) {
            Ok(r) => r,
            Err(e) => match e {},
        };

        assert!(output.aileron_setpoint.abs() <= max_pprz);
        assert!(output.elevator_setpoint.abs() <= max_pprz);
        assert!(output.roll_setpoint_rad.abs() <= roll_max);

        first_run.push(output);
    }

    // A reset controller reproduces the same outputs
    h_ctl.reset();
    for (input, expected) in replay.inputs().zip(first_run.iter()) {
        let (output, _) = match h_ctl.proc(&input) {
            Ok(r) => r,
            Err(e) => match e {},
        };
        assert_eq!(&output, expected);
    }
}
