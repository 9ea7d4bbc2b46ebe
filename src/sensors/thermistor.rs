//! NTC thermistor probe bank.
//!
//! Each probe is an NTC thermistor (low side) in a voltage divider with a
//! fixed series resistor to the rail, read via the ADC. The simplified
//! Beta (Steinhart-Hart) equation converts resistance to temperature.
//!
//! Electrical fault detection rides on the divider topology: a broken
//! probe wire pulls the ADC node to the rail (full-scale reading), a
//! shorted probe pulls it to ground. Readings within a small guard band
//! of either rail are reported as faults instead of temperatures.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the per-probe ADC channels via the oneshot API
//! (initialised by hw_init). On host/test: reads per-probe static
//! AtomicU16 values for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use crate::app::ports::ProbePort;
use crate::config::{ProbeConfig, SystemConfig, MAX_PROBES};
#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;
use crate::error::Fault;

const T25_K: f32 = 298.15;
const ADC_MAX: u16 = 4095;
/// Counts from either rail inside which a reading is an electrical fault.
const RAIL_GUARD: u16 = 8;

#[cfg(not(target_os = "espidf"))]
static SIM_PROBE_ADC: [AtomicU16; MAX_PROBES] = [
    AtomicU16::new(2048),
    AtomicU16::new(2048),
    AtomicU16::new(2048),
    AtomicU16::new(2048),
];

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_probe_adc(index: u8, raw: u16) {
    SIM_PROBE_ADC[index as usize].store(raw, Ordering::Relaxed);
}

/// Inject a temperature by computing the raw ADC count the divider would
/// produce for it (test helper).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_probe_temp(index: u8, celsius: f32, probe: &ProbeConfig) {
    let t_k = celsius + 273.15;
    let r_ntc = probe.r25 * ((probe.beta * (1.0 / t_k - 1.0 / T25_K)).exp());
    let raw = ADC_MAX as f32 * r_ntc / (r_ntc + probe.r_series);
    sim_set_probe_adc(index, raw as u16);
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Classify a raw count: rail readings are wiring faults.
fn classify_raw(raw: u16) -> Result<u16, Fault> {
    if raw >= ADC_MAX - RAIL_GUARD {
        return Err(Fault::ThermistorOpenCircuit);
    }
    if raw <= RAIL_GUARD {
        return Err(Fault::ThermistorShortCircuit);
    }
    Ok(raw)
}

/// Divider equation: the NTC sees `raw / ADC_MAX` of the rail voltage.
fn resistance_from_raw(raw: u16, r_series: f32) -> f32 {
    let ratio = raw as f32 / ADC_MAX as f32;
    r_series * ratio / (1.0 - ratio)
}

/// Beta equation, resistance to Celsius.
fn celsius_from_resistance(r_ntc: f32, r25: f32, beta: f32) -> f32 {
    let inv_t = 1.0 / T25_K + (r_ntc / r25).ln() / beta;
    1.0 / inv_t - 273.15
}

// ---------------------------------------------------------------------------
// Probe bank
// ---------------------------------------------------------------------------

/// The board's thermistor frontend; implements [`ProbePort`].
pub struct ThermistorBank {
    probes: [ProbeConfig; MAX_PROBES],
}

impl ThermistorBank {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            probes: config.probes,
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_raw(&self, index: u8) -> u16 {
        hw_init::adc1_read(pins::PROBE_ADC_CHANNELS[index as usize])
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_raw(&self, index: u8) -> u16 {
        SIM_PROBE_ADC[index as usize].load(Ordering::Relaxed)
    }
}

impl ProbePort for ThermistorBank {
    fn measure_temperature(&mut self, index: u8) -> Result<f32, Fault> {
        let probe = &self.probes[index as usize];
        let raw = classify_raw(self.read_raw(index))?;
        let r_ntc = resistance_from_raw(raw, probe.r_series);
        Ok(celsius_from_resistance(r_ntc, probe.r25, probe.beta))
    }

    fn measure_resistance(&mut self, index: u8) -> Result<f32, Fault> {
        let probe = &self.probes[index as usize];
        let raw = classify_raw(self.read_raw(index))?;
        Ok(resistance_from_raw(raw, probe.r_series))
    }

    fn shutdown(&mut self) {
        #[cfg(target_os = "espidf")]
        hw_init::adc_shutdown();
        log::info!("thermistor bank powered down");
    }
}
