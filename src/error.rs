//! Unified error types for the etchbath firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level error handling uniform. [`Fault`] is the safety-critical
//! subset: every fatal condition the
//! control cycle can detect. Faults are `Copy` so they propagate through the
//! scheduler and main loop without allocation, and each carries a stable
//! numeric code that the 7-segment display shows to the operator.

use core::fmt;

// ---------------------------------------------------------------------------
// Control-cycle faults
// ---------------------------------------------------------------------------

/// Fatal faults detected by the control cycle.
///
/// Every one of these aborts the current control tick, propagates through
/// [`CycleScheduler::poll`](crate::timer::CycleScheduler::poll) to the main
/// loop, and triggers emergency shutdown. None of them self-clear: thermal
/// safety faults require a power cycle or explicit operator reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Fault {
    /// Thermistor reads at the ADC ceiling: probe wire broken or unplugged.
    ThermistorOpenCircuit = 1,
    /// Thermistor reads at the ADC floor: probe shorted.
    ThermistorShortCircuit = 2,
    /// Thermal-runaway protection tripped: the heater ran at rapid-heating
    /// power but the designated probe never saw the expected temperature
    /// rise. Classic detached-thermistor failure mode.
    ProbeNotResponding = 3,
    /// The configured controlling probe is absent from the probe table.
    NoControllingProbe = 4,
    /// A probe read above the absolute protection maximum.
    AboveMaxTemp = 5,
    /// A probe read below the absolute protection minimum.
    BelowMinTemp = 6,
}

impl Fault {
    /// Stable numeric code shown on the error display.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThermistorOpenCircuit => write!(f, "thermistor open circuit"),
            Self::ThermistorShortCircuit => write!(f, "thermistor short circuit"),
            Self::ProbeNotResponding => write!(f, "thermistor not responding"),
            Self::NoControllingProbe => write!(f, "no controlling probe selected"),
            Self::AboveMaxTemp => write!(f, "temperature above maximum"),
            Self::BelowMinTemp => write!(f, "temperature below minimum"),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible non-cycle operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A control-cycle safety fault.
    Safety(Fault),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Stored settings are invalid or could not be loaded.
    Settings(SettingsError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safety(e) => write!(f, "safety: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Settings(e) => write!(f, "settings: {e}"),
        }
    }
}

impl From<Fault> for Error {
    fn from(e: Fault) -> Self {
        Self::Safety(e)
    }
}

// ---------------------------------------------------------------------------
// Settings persistence errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsError {
    /// No settings blob found in storage (first boot).
    NotFound,
    /// Stored blob failed the magic/version or deserialization check.
    Corrupted,
    /// A settings field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "settings not found"),
            Self::Corrupted => write!(f, "settings corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<SettingsError> for Error {
    fn from(e: SettingsError) -> Self {
        Self::Settings(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias for non-cycle paths.
pub type Result<T> = core::result::Result<T, Error>;

/// Result of one control-cycle task: `Ok(())` or a fatal fault.
pub type CycleResult = core::result::Result<(), Fault>;
