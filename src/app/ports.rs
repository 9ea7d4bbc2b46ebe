//! Port traits: the boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ control cycle / menu (domain)
//! ```
//!
//! Driven adapters (thermistor frontend, PWM drivers, display, settings
//! store) implement these traits. The control cycle and menu consume them
//! via generics, so the domain core never touches hardware directly.

use crate::config::Settings;
use crate::error::{Fault, SettingsError};

// ───────────────────────────────────────────────────────────────
// Probe port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the control cycle calls this to sample thermistors.
///
/// Both methods fault on electrical failure: a reading pegged at the ADC
/// ceiling is an open circuit, one at the floor a short circuit. In-range
/// garbage from a detached probe is *not* detectable here; that is what
/// the thermal-runaway interlock is for.
pub trait ProbePort {
    /// Temperature of probe `index` in Celsius.
    fn measure_temperature(&mut self, index: u8) -> Result<f32, Fault>;

    /// Raw thermistor resistance of probe `index` in ohms, for the
    /// calibration menu.
    fn measure_resistance(&mut self, index: u8) -> Result<f32, Fault>;

    /// Power down the sensing frontend (emergency shutdown path).
    fn shutdown(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the control cycle and menu command actuators through
/// this. All calls are fire-and-forget; duty cycles are silently clamped
/// to 0..=100 by the drivers.
pub trait ActuatorPort {
    fn set_heater_duty(&mut self, percent: u8);
    fn heater_on(&mut self);
    fn heater_off(&mut self);

    fn set_stirrer_duty(&mut self, percent: u8);
    fn stirrer_on(&mut self);
    fn stirrer_off(&mut self);

    fn set_fan_duty(&mut self, percent: u8);
    fn fan_on(&mut self);
    fn fan_off(&mut self);

    /// Kill every actuator, heater first. Emergency shutdown path.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → 7-segment display)
// ───────────────────────────────────────────────────────────────

/// Narrow rendering interface for the 7-segment display. The menu decides
/// *what* to show; glyph shapes and multiplexing are the driver's problem.
pub trait DisplayPort {
    /// Show a temperature with the probe index it came from.
    fn show_temperature(&mut self, celsius: f32, probe: u8);

    /// Show a bare numeric value (menu editors).
    fn show_value(&mut self, value: f32);

    /// Show a short label (menu item names, ON/OFF).
    fn show_text(&mut self, text: &str);

    /// Show a fault code. Stays up until the operator power-cycles.
    fn show_fault(&mut self, fault: Fault);
}

// ───────────────────────────────────────────────────────────────
// Settings port (driven adapter: domain ↔ persistent settings)
// ───────────────────────────────────────────────────────────────

/// Loads and persists operator settings.
///
/// Implementations MUST validate before persisting; invalid ranges are
/// rejected with [`SettingsError::ValidationFailed`], not silently
/// clamped. A corrupt or missing blob loads as defaults at the call site.
pub trait SettingsPort {
    fn load(&self) -> Result<Settings, SettingsError>;
    fn store(&mut self, settings: &Settings) -> Result<(), SettingsError>;
}
