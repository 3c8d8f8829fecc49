//! Roll rate loop
//!
//! A PID loop on the roll rate error. The integral term is the mean of the
//! last `N` errors rather than an unbounded accumulation, which bounds the
//! integral wind-up without any explicit clamping.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;
use std::num::NonZeroUsize;

// Internal
use super::{exceeds_pprz, trim_pprz, RateLoopParams, StatusReport};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Running sum over a fixed size window of the most recent samples.
#[derive(Debug, Default, Clone, Serialize)]
pub struct WindowedIntegrator {
    /// Circular buffer of the last samples, zero before they are written
    window: Vec<f64>,

    /// Sum of all samples in the window
    sum: f64,

    /// Index of the next sample to overwrite
    idx: usize
}

/// The roll rate loop.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RollRateLoop {
    /// Proportional gain
    pgain: f64,

    /// Integral gain, relative to `pgain`
    igain: f64,

    /// Derivative gain, relative to `pgain`
    dgain: f64,

    /// Maximum absolute actuator command
    max_pprz: i16,

    /// The integral memory
    integrator: WindowedIntegrator,

    /// Error from the previous cycle
    last_err: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WindowedIntegrator {
    /// Create a new integrator over `num_samples` samples.
    pub fn new(num_samples: NonZeroUsize) -> Self {
        Self {
            window: vec![0f64; num_samples.get()],
            sum: 0f64,
            idx: 0
        }
    }

    /// Add a new sample, evicting the oldest one, and return the new sum.
    pub fn push(&mut self, sample: f64) -> f64 {
        self.sum -= self.window[self.idx];
        self.window[self.idx] = sample;
        self.sum += sample;

        self.idx += 1;
        if self.idx >= self.window.len() {
            self.idx = 0;
        }

        self.sum
    }

    /// Sum of the samples in the window.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Sum of the window divided by its length.
    pub fn mean(&self) -> f64 {
        self.sum / self.window.len() as f64
    }

    /// Number of samples in the window.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Zero the window and the sum.
    pub fn reset(&mut self) {
        for v in self.window.iter_mut() {
            *v = 0f64;
        }
        self.sum = 0f64;
        self.idx = 0;
    }
}

impl RollRateLoop {

    /// Create a new rate loop from the parameters.
    pub fn new(params: &RateLoopParams, max_pprz: i16) -> Self {
        Self {
            pgain: params.pgain,
            igain: params.igain,
            dgain: params.dgain,
            max_pprz,
            integrator: WindowedIntegrator::new(params.sum_nb_samples),
            last_err: 0f64
        }
    }

    /// Get the aileron command for the given roll rate and rate setpoint.
    pub fn get_aileron(
        &mut self,
        p_rads: f64,
        roll_rate_setpoint_rads: f64,
        report: &mut StatusReport
    ) -> i16 {
        let err = p_rads - roll_rate_setpoint_rads;

        self.integrator.push(err);

        let d_err = err - self.last_err;
        self.last_err = err;

        let cmd = self.pgain * (
            err
            + self.igain * self.integrator.mean()
            + self.dgain * d_err
        );

        if exceeds_pprz(cmd, self.max_pprz) {
            report.aileron_limited = true;
        }

        trim_pprz(cmd, self.max_pprz)
    }

    /// Get the integral memory.
    pub fn integrator(&self) -> &WindowedIntegrator {
        &self.integrator
    }

    /// Clear the integral and derivative memories.
    pub fn reset(&mut self) {
        self.integrator.reset();
        self.last_err = 0f64;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn rate_params(igain: f64, dgain: f64, n: usize) -> RateLoopParams {
        RateLoopParams {
            mode: 1.0,
            setpoint_pgain: -5.0,
            max_setpoint_rads: 3.0,
            pgain: -1000.0,
            igain,
            dgain,
            sum_nb_samples: window(n)
        }
    }

    fn window(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_window_steady_state() {
        let mut integ = WindowedIntegrator::new(window(8));

        for _ in 0..8 {
            integ.push(0.75);
        }
        assert_eq!(integ.sum(), 8.0 * 0.75);

        // One more sample replaces the oldest one
        integ.push(0.75);
        assert_eq!(integ.sum(), 8.0 * 0.75);
        assert_eq!(integ.mean(), 0.75);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut integ = WindowedIntegrator::new(window(3));

        assert_eq!(integ.push(1.0), 1.0);
        assert_eq!(integ.push(2.0), 3.0);
        assert_eq!(integ.push(4.0), 7.0);
        // 1 leaves
        assert_eq!(integ.push(8.0), 14.0);
        // 2 leaves
        assert_eq!(integ.push(0.0), 12.0);
        assert_eq!(integ.len(), 3);

        integ.reset();
        assert_eq!(integ.sum(), 0.0);
        assert_eq!(integ.push(0.5), 0.5);
    }

    #[test]
    fn test_proportional_only() {
        let mut rate_loop = RollRateLoop::new(&rate_params(0.0, 0.0, 4), 9600);
        let mut report = StatusReport::default();

        assert_eq!(rate_loop.get_aileron(0.5, 0.25, &mut report), -250);
        assert_eq!(rate_loop.get_aileron(-20.0, 0.0, &mut report), 9600);
        assert!(report.aileron_limited);
    }

    #[test]
    fn test_integral_and_derivative() {
        let mut rate_loop = RollRateLoop::new(&rate_params(2.0, 0.5, 4), 9600);
        let mut report = StatusReport::default();

        // err 0.5, sum 0.5, d 0.5: -1000 * (0.5 + 2 * 0.125 + 0.5 * 0.5)
        assert_eq!(rate_loop.get_aileron(0.5, 0.0, &mut report), -1000);

        // err 0.5, sum 1.0, d 0: -1000 * (0.5 + 2 * 0.25)
        assert_eq!(rate_loop.get_aileron(0.5, 0.0, &mut report), -1000);

        // err 0.5, sum 1.5, d 0: -1000 * (0.5 + 2 * 0.375)
        assert_eq!(rate_loop.get_aileron(0.5, 0.0, &mut report), -1250);

        // err -0.5, sum 1.0, d -1: -1000 * (-0.5 + 2 * 0.25 - 0.5)
        assert_eq!(rate_loop.get_aileron(-0.5, 0.0, &mut report), 500);
        assert_eq!(rate_loop.integrator().sum(), 1.0);

        rate_loop.reset();
        assert_eq!(rate_loop.integrator().sum(), 0.0);
        assert_eq!(rate_loop.get_aileron(0.5, 0.0, &mut report), -1000);
    }
}
