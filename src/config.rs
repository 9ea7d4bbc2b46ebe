//! System configuration parameters.
//!
//! [`SystemConfig`] holds the fixed plant parameters: probe table, heater
//! limits, protection thresholds and loop intervals. [`Settings`] holds the
//! operator-editable values (target temperature, PID gains, probe selection)
//! that the menu mutates and the settings store persists.
//!
//! The probe table is a runtime-populated fixed-capacity array; boards with
//! fewer probes leave slots marked absent instead of rebuilding the firmware
//! per configuration.

use serde::{Deserialize, Serialize};

/// Maximum number of thermistor probe slots on the board.
pub const MAX_PROBES: usize = 4;

// --- Operator-settings bounds (enforced by the menu and on load) ---
pub const MIN_TARGET_TEMP_C: f32 = 0.0;
pub const MAX_TARGET_TEMP_C: f32 = 100.0;
pub const MIN_PID_GAIN: f32 = 0.0;
pub const MAX_PID_GAIN: f32 = 999.99;
pub const MIN_PID_I_CLAMP: f32 = 0.0;
pub const MAX_PID_I_CLAMP: f32 = 1.0;
pub const MIN_PID_OFFSET: f32 = -50.0;
pub const MAX_PID_OFFSET: f32 = 50.0;
pub const MIN_PID_SMOOTHING: f32 = 0.0;
pub const MAX_PID_SMOOTHING: f32 = 1.0;

// ---------------------------------------------------------------------------
// Probe configuration
// ---------------------------------------------------------------------------

/// Thermal-runaway protection parameters for one probe.
///
/// While the heater runs at rapid-heating power, the probe must read at
/// least `expected_delta_c` of rise within `window_secs`, otherwise the
/// probe is considered detached.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RunawayParams {
    pub expected_delta_c: f32,
    pub window_secs: f32,
}

/// One slot of the probe table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Whether a thermistor is populated in this slot.
    pub present: bool,
    /// NTC nominal resistance at 25 C (ohms).
    pub r25: f32,
    /// NTC Beta coefficient.
    pub beta: f32,
    /// Fixed divider resistor (ohms).
    pub r_series: f32,
    /// Runaway protection, if this probe participates in the check.
    pub runaway: Option<RunawayParams>,
}

impl ProbeConfig {
    /// An unpopulated slot.
    pub const fn absent() -> Self {
        Self {
            present: false,
            r25: 10_000.0,
            beta: 3950.0,
            r_series: 10_000.0,
            runaway: None,
        }
    }
}

// ---------------------------------------------------------------------------
// System configuration
// ---------------------------------------------------------------------------

/// Fixed plant configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Probes ---
    /// Probe table; absent slots are skipped by the control cycle.
    pub probes: [ProbeConfig; MAX_PROBES],
    /// Probe mounted on the heater mat itself, used to cap the element
    /// temperature independently of the PID.
    pub safety_probe: u8,

    // --- Heater ---
    /// PID output floor (duty-cycle percent).
    pub heater_control_min: f32,
    /// PID output ceiling (duty-cycle percent).
    pub heater_control_max: f32,
    /// Maximum allowed temperature of the heater mat itself (Celsius);
    /// above this the duty cycle is forced to zero.
    pub heater_max_operating_temp_c: f32,
    /// Duty cycle at or above which the rapid-heating latch engages and
    /// runaway monitoring starts counting.
    pub rapid_heating_duty: u8,

    // --- Protection bounds ---
    /// Any probe below this temperature is a fatal fault.
    pub min_temp_c: f32,
    /// Any probe above this temperature is a fatal fault.
    pub max_temp_c: f32,

    // --- Timing ---
    /// PID control loop interval (seconds).
    pub pid_interval_secs: f32,
    /// Menu/UI update interval (seconds).
    pub ui_interval_secs: f32,
    /// Rotary encoder decode interval (seconds).
    pub encoder_interval_secs: f32,
    /// Button debounce interval (seconds).
    pub button_interval_secs: f32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut probes = [ProbeConfig::absent(); MAX_PROBES];
        // Probe 0: heater mat thermistor. Fast thermal path, tight window.
        probes[0] = ProbeConfig {
            present: true,
            runaway: Some(RunawayParams {
                expected_delta_c: 5.0,
                window_secs: 60.0,
            }),
            ..ProbeConfig::absent()
        };
        // Probe 1: bath thermistor. Large thermal mass, generous window.
        probes[1] = ProbeConfig {
            present: true,
            runaway: Some(RunawayParams {
                expected_delta_c: 1.0,
                window_secs: 5.0 * 60.0,
            }),
            ..ProbeConfig::absent()
        };

        Self {
            probes,
            safety_probe: 0,

            heater_control_min: 0.0,
            heater_control_max: 100.0,
            heater_max_operating_temp_c: 140.0,
            rapid_heating_duty: 99,

            min_temp_c: 0.0,
            max_temp_c: 200.0,

            pid_interval_secs: 0.02,   // ~50 Hz
            ui_interval_secs: 0.04,    // ~25 Hz
            encoder_interval_secs: 0.001,
            button_interval_secs: 0.005,
        }
    }
}

impl SystemConfig {
    /// Whether `index` names a populated probe slot.
    pub fn probe_present(&self, index: u8) -> bool {
        (index as usize) < MAX_PROBES && self.probes[index as usize].present
    }
}

// ---------------------------------------------------------------------------
// Operator settings
// ---------------------------------------------------------------------------

/// PID tuning as edited by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidSettings {
    pub kp: f32,
    /// Integral time constant (seconds); larger = slower integral action.
    pub ti: f32,
    /// Derivative time constant (seconds).
    pub td: f32,
    /// Scale factor on the dynamic anti-windup window, 0..=1.
    pub i_clamp: f32,
    /// Constant output bias.
    pub offset: f32,
    /// Derivative filter coefficient, 0 (off) ..= 1.
    pub d_smoothing: f32,
}

/// Operator-editable, persisted settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Bath target temperature (Celsius).
    pub target_temp_c: f32,
    pub pid: PidSettings,
    /// Probe whose reading feeds the PID as process value.
    pub controlling_probe: u8,
    /// Fan duty cycle (0-100%); 0 keeps the fan off.
    pub fan_duty: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_temp_c: 25.0,
            pid: PidSettings {
                kp: 1.0,
                ti: 30.0,
                td: 0.0,
                i_clamp: 1.0,
                offset: 0.0,
                d_smoothing: 0.0,
            },
            controlling_probe: 0,
            fan_duty: 0,
        }
    }
}

impl Settings {
    /// Range-check every field against the documented bounds.
    /// Used by the settings store before persisting and after loading.
    pub fn validate(&self, config: &SystemConfig) -> Result<(), &'static str> {
        if !(MIN_TARGET_TEMP_C..=MAX_TARGET_TEMP_C).contains(&self.target_temp_c) {
            return Err("target temperature out of range");
        }
        for gain in [self.pid.kp, self.pid.ti, self.pid.td] {
            if !(MIN_PID_GAIN..=MAX_PID_GAIN).contains(&gain) {
                return Err("PID gain out of range");
            }
        }
        if !(MIN_PID_I_CLAMP..=MAX_PID_I_CLAMP).contains(&self.pid.i_clamp) {
            return Err("integrator clamp out of range");
        }
        if !(MIN_PID_OFFSET..=MAX_PID_OFFSET).contains(&self.pid.offset) {
            return Err("PID offset out of range");
        }
        if !(MIN_PID_SMOOTHING..=MAX_PID_SMOOTHING).contains(&self.pid.d_smoothing) {
            return Err("derivative smoothing out of range");
        }
        if self.fan_duty > 100 {
            return Err("fan duty above 100%");
        }
        if !config.probe_present(self.controlling_probe) {
            return Err("controlling probe not populated");
        }
        Ok(())
    }
}
