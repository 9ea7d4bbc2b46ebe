//! Mock hardware for integration tests.
//!
//! Records every actuator and display call so tests can assert on the
//! full command history without touching real GPIO/PWM registers.

use etchbath::app::ports::{ActuatorPort, DisplayPort, ProbePort};
use etchbath::config::MAX_PROBES;
use etchbath::error::Fault;
use std::collections::VecDeque;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    HeaterDuty(u8),
    HeaterOn,
    HeaterOff,
    StirrerDuty(u8),
    StirrerOn,
    StirrerOff,
    FanDuty(u8),
    FanOn,
    FanOff,
    AllOff,
}

pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self { calls: Vec::new() }
    }

    /// Most recently commanded heater duty, `AllOff` counting as zero.
    pub fn heater_duty(&self) -> Option<u8> {
        self.calls.iter().rev().find_map(|c| match c {
            ActuatorCall::HeaterDuty(d) => Some(*d),
            ActuatorCall::HeaterOff | ActuatorCall::AllOff => Some(0),
            _ => None,
        })
    }

    pub fn heater_duties(&self) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::HeaterDuty(d) => Some(*d),
                _ => None,
            })
            .collect()
    }

    pub fn saw_all_off(&self) -> bool {
        self.calls.contains(&ActuatorCall::AllOff)
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorPort for MockHardware {
    fn set_heater_duty(&mut self, percent: u8) {
        self.calls.push(ActuatorCall::HeaterDuty(percent));
    }
    fn heater_on(&mut self) {
        self.calls.push(ActuatorCall::HeaterOn);
    }
    fn heater_off(&mut self) {
        self.calls.push(ActuatorCall::HeaterOff);
    }
    fn set_stirrer_duty(&mut self, percent: u8) {
        self.calls.push(ActuatorCall::StirrerDuty(percent));
    }
    fn stirrer_on(&mut self) {
        self.calls.push(ActuatorCall::StirrerOn);
    }
    fn stirrer_off(&mut self) {
        self.calls.push(ActuatorCall::StirrerOff);
    }
    fn set_fan_duty(&mut self, percent: u8) {
        self.calls.push(ActuatorCall::FanDuty(percent));
    }
    fn fan_on(&mut self) {
        self.calls.push(ActuatorCall::FanOn);
    }
    fn fan_off(&mut self) {
        self.calls.push(ActuatorCall::FanOff);
    }
    fn all_off(&mut self) {
        self.calls.push(ActuatorCall::AllOff);
    }
}

// ── Scripted probes ───────────────────────────────────────────

/// Probe frontend replaying per-probe reading scripts; the last reading
/// repeats once a script is exhausted.
pub struct ScriptedProbes {
    scripts: [VecDeque<Result<f32, Fault>>; MAX_PROBES],
    last: [Result<f32, Fault>; MAX_PROBES],
    pub shutdown_calls: u32,
}

#[allow(dead_code)]
impl ScriptedProbes {
    pub fn all_at(temp: f32) -> Self {
        Self {
            scripts: Default::default(),
            last: [Ok(temp); MAX_PROBES],
            shutdown_calls: 0,
        }
    }

    /// Queue a reading for `probe`, consumed in FIFO order.
    pub fn push(&mut self, probe: u8, reading: Result<f32, Fault>) {
        self.scripts[probe as usize].push_back(reading);
    }

    /// Replace the steady-state reading for `probe`.
    pub fn hold(&mut self, probe: u8, temp: f32) {
        self.last[probe as usize] = Ok(temp);
        self.scripts[probe as usize].clear();
    }
}

impl ProbePort for ScriptedProbes {
    fn measure_temperature(&mut self, index: u8) -> Result<f32, Fault> {
        if let Some(reading) = self.scripts[index as usize].pop_front() {
            self.last[index as usize] = reading;
        }
        self.last[index as usize]
    }

    fn measure_resistance(&mut self, _index: u8) -> Result<f32, Fault> {
        Ok(10_000.0)
    }

    fn shutdown(&mut self) {
        self.shutdown_calls += 1;
    }
}

// ── Recording display ─────────────────────────────────────────

#[derive(Default)]
pub struct RecordingDisplay {
    pub faults: Vec<Fault>,
    pub values: Vec<f32>,
    pub temperatures: Vec<(f32, u8)>,
}

impl DisplayPort for RecordingDisplay {
    fn show_temperature(&mut self, celsius: f32, probe: u8) {
        self.temperatures.push((celsius, probe));
    }
    fn show_value(&mut self, value: f32) {
        self.values.push(value);
    }
    fn show_text(&mut self, _text: &str) {}
    fn show_fault(&mut self, fault: Fault) {
        self.faults.push(fault);
    }
}
