//! Hardware drivers. Everything that touches a peripheral lives here;
//! each driver is dual-target (real hardware on ESP-IDF, in-memory state
//! on the host).

pub mod button;
pub mod display;
pub mod heater;
pub mod hw_init;
pub mod hw_timer;
pub mod rotary;
pub mod stirrer_fan;

use crate::app::ports::ActuatorPort;
use heater::HeaterDriver;
use stirrer_fan::{FanDriver, StirrerDriver};

/// The board's actuator set; implements [`ActuatorPort`] over the
/// individual drivers.
pub struct Actuators {
    pub heater: HeaterDriver,
    pub stirrer: StirrerDriver,
    pub fan: FanDriver,
}

impl Actuators {
    pub fn new() -> Self {
        Self {
            heater: HeaterDriver::new(),
            stirrer: StirrerDriver::new(),
            fan: FanDriver::new(),
        }
    }
}

impl Default for Actuators {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorPort for Actuators {
    fn set_heater_duty(&mut self, percent: u8) {
        self.heater.set_duty(percent);
    }

    fn heater_on(&mut self) {
        self.heater.enable();
    }

    fn heater_off(&mut self) {
        self.heater.disable();
    }

    fn set_stirrer_duty(&mut self, percent: u8) {
        self.stirrer.set_duty(percent);
    }

    fn stirrer_on(&mut self) {
        self.stirrer.start();
    }

    fn stirrer_off(&mut self) {
        self.stirrer.stop();
    }

    fn set_fan_duty(&mut self, percent: u8) {
        self.fan.set_duty(percent);
    }

    fn fan_on(&mut self) {
        self.fan.start();
    }

    fn fan_off(&mut self) {
        self.fan.stop();
    }

    /// Emergency shutdown ordering: the heat source dies first, then the
    /// motors.
    fn all_off(&mut self) {
        self.heater.disable();
        self.stirrer.stop();
        self.fan.stop();
    }
}
