//! PID controller for the bath heater.
//!
//! Discrete PID with three refinements over the textbook form:
//!
//! - **Derivative-on-measurement**: the D term differentiates the process
//!   value, not the error, so setpoint changes don't spike the output.
//! - **Cascaded derivative smoothing**: the raw derivative passes through
//!   two first-order exponential smoothers sharing one coefficient, which
//!   suppresses ADC noise that plain differentiation would amplify.
//! - **Dynamic anti-windup**: the integrator is clamped each step to the
//!   headroom left after the P and D contributions, scaled by `i_clamp`.
//!   During saturation the integral cannot accumulate past what the
//!   actuator could ever act on, and `i_clamp` de-rates integral
//!   aggressiveness independently of the gains.
//!
//! The control period `dt` is fixed at construction to the control-loop
//! interval; `step()` must be called exactly once per loop tick.

use crate::config::PidSettings;

/// Floor for the integral time constant. One hardware timer tick, small
/// enough to be irrelevant for any sane tuning, large enough that the
/// `kp / ti` division never blows up when an operator dials Ti to zero.
const TI_FLOOR: f32 = 1e-4;

/// PID controller state.
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f32,
    ti: f32,
    td: f32,
    i_clamp: f32,
    offset: f32,
    smoothing: f32,
    control_min: f32,
    control_max: f32,
    dt: f32,

    old_process_value: f32,
    integrator: f32,
    /// First-stage smoothed derivative.
    smd1: f32,
    /// Second-stage smoothed derivative; this is what enters the D term.
    smd2: f32,
}

impl PidController {
    /// Construct a controller with the given tuning, output limits, and
    /// fixed control period `dt` (seconds).
    pub fn new(params: &PidSettings, control_min: f32, control_max: f32, dt: f32) -> Self {
        Self {
            kp: params.kp,
            ti: params.ti,
            td: params.td,
            i_clamp: params.i_clamp,
            offset: params.offset,
            smoothing: params.d_smoothing,
            control_min,
            control_max,
            dt,
            old_process_value: 0.0,
            integrator: 0.0,
            smd1: 0.0,
            smd2: 0.0,
        }
    }

    /// Replace the tuning and output limits.
    ///
    /// Also resets the dynamic state: stale integrator or derivative history
    /// under new gains would produce an arbitrary output kick.
    pub fn set_params(&mut self, params: &PidSettings, control_min: f32, control_max: f32) {
        self.kp = params.kp;
        self.ti = params.ti;
        self.td = params.td;
        self.i_clamp = params.i_clamp;
        self.offset = params.offset;
        self.smoothing = params.d_smoothing;
        self.control_min = control_min;
        self.control_max = control_max;
        self.reset();
    }

    /// Zero the dynamic state (last measurement, integrator, derivative
    /// filter). Gains and limits persist. Called when the heater is toggled
    /// off and back on so the loop restarts from a clean slate.
    pub fn reset(&mut self) {
        self.old_process_value = 0.0;
        self.integrator = 0.0;
        self.smd1 = 0.0;
        self.smd2 = 0.0;
    }

    /// Advance the controller by one control period and return the bounded
    /// control output.
    pub fn step(&mut self, process_value: f32, set_value: f32) -> f32 {
        let error = set_value - process_value;

        // P term plus constant bias.
        let mut output = self.offset + self.kp * error;

        // Derivative on measurement, through two cascaded smoothers. The
        // second stage deliberately mixes with (1-a) on both inputs; that
        // is what the shipped controller does and what the plant was tuned
        // against, so it is kept verbatim (see the regression test below).
        let a = self.smoothing;
        let d_raw = (process_value - self.old_process_value) / self.dt;
        self.smd1 = (1.0 - a) * d_raw + a * self.smd1;
        self.smd2 = (1.0 - a) * self.smd1 + (1.0 - a) * self.smd2;
        output -= self.kp * self.td * self.smd2;

        self.old_process_value = process_value;

        // Integral with dynamic anti-windup: the usable integrator range is
        // the output headroom remaining after P+D, scaled by i_clamp.
        let i_max = (self.control_max - output).max(0.0) * self.i_clamp;
        let i_min = (self.control_min - output).min(0.0) * self.i_clamp;
        let ki = self.kp / self.ti.max(TI_FLOOR);
        self.integrator = (self.integrator + ki * error * self.dt).clamp(i_min, i_max);
        output += self.integrator;

        output.clamp(self.control_min, self.control_max)
    }

    /// Current integrator value (diagnostics and tests).
    pub fn integrator(&self) -> f32 {
        self.integrator
    }
}
