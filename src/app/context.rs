//! Shared mutable context threaded through the scheduler tasks.
//!
//! [`AppContext`] is the single working set the control cycle, menu and
//! input tasks read from and write to. It is constructed once in `main`
//! and passed by reference everywhere; no globals, single-instance
//! semantics preserved explicitly.

use crate::config::{Settings, SystemConfig, MAX_PROBES};
use crate::error::Fault;

// ---------------------------------------------------------------------------
// Per-probe runtime state
// ---------------------------------------------------------------------------

/// Live readings and runaway bookkeeping for one probe slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbeRuntime {
    /// Last measured temperature (Celsius).
    pub temperature_c: f32,
    /// Last measured thermistor resistance (ohms); only refreshed while
    /// the calibration menu for this probe is open.
    pub resistance_ohm: f32,
    /// Temperature at the start of the current runaway check window.
    pub runaway_start_temp_c: f32,
    /// Cycle count at the start of the current runaway check window.
    pub runaway_start_cycles: u64,
}

// ---------------------------------------------------------------------------
// Input frame
// ---------------------------------------------------------------------------

/// Debounced input collected for one UI tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputFrame {
    /// Net rotary-encoder detents since the last UI tick.
    pub encoder_delta: i16,
    /// Rising press edge this tick.
    pub pressed: bool,
    /// Long-press event this tick.
    pub long_pressed: bool,
    /// Release edge this tick.
    pub released: bool,
}

impl InputFrame {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// AppContext
// ---------------------------------------------------------------------------

/// The application's entire mutable working set.
pub struct AppContext {
    /// Fixed plant configuration.
    pub config: SystemConfig,
    /// Operator settings (menu-edited, persisted).
    pub settings: Settings,
    /// Per-probe runtime state, indexed like `config.probes`.
    pub probes: [ProbeRuntime; MAX_PROBES],

    // -- Actuator state --
    pub heater_enabled: bool,
    pub stirrer_enabled: bool,
    pub fan_enabled: bool,
    pub stirrer_duty: u8,
    /// Latched while the commanded heater duty is at or above the
    /// rapid-heating threshold; gates the runaway interlock.
    pub rapid_heating: bool,

    // -- UI interaction --
    /// Latest debounced input, consumed by the menu each UI tick.
    pub input: InputFrame,
    /// Probe whose calibration screen is open, if any; tells the control
    /// cycle to refresh that probe's resistance reading.
    pub calibrating_probe: Option<u8>,
    /// Settings changed since last persist.
    pub settings_dirty: bool,

    // -- Lifecycle --
    /// Fault that ended the run, for the error display.
    pub last_fault: Option<Fault>,
}

impl AppContext {
    pub fn new(config: SystemConfig, settings: Settings) -> Self {
        let fan_duty = settings.fan_duty;
        Self {
            config,
            settings,
            probes: [ProbeRuntime::default(); MAX_PROBES],
            heater_enabled: false,
            stirrer_enabled: false,
            fan_enabled: fan_duty > 0,
            stirrer_duty: 0,
            rapid_heating: false,
            input: InputFrame::default(),
            calibrating_probe: None,
            settings_dirty: false,
            last_fault: None,
        }
    }

    /// Temperature of the configured safety probe (heater mat).
    pub fn safety_probe_temp(&self) -> f32 {
        self.probes[self.config.safety_probe as usize].temperature_c
    }

    /// Whether `index` participates in the runaway check: the controlling
    /// probe and the safety probe are both designated monitors.
    pub fn is_runaway_monitored(&self, index: u8) -> bool {
        index == self.settings.controlling_probe || index == self.config.safety_probe
    }

    /// Restart every probe's runaway window from its current reading.
    pub fn restart_runaway_windows(&mut self, now_cycles: u64) {
        for (i, probe) in self.probes.iter_mut().enumerate() {
            if self.config.probes[i].present {
                probe.runaway_start_temp_c = probe.temperature_c;
                probe.runaway_start_cycles = now_cycles;
            }
        }
    }
}
