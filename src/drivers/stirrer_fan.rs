//! Stirrer and fan drivers (DC motors via LEDC PWM).
//!
//! Both are the same thin PWM actuator on different channels; the duty
//! persists across off/on so the operator's speed setting survives a
//! toggle.

use crate::drivers::hw_init;

struct PwmActuator {
    channel: u32,
    running: bool,
    duty: u8,
}

impl PwmActuator {
    fn new(channel: u32) -> Self {
        Self {
            channel,
            running: false,
            duty: 0,
        }
    }

    fn set_duty(&mut self, duty: u8) {
        self.duty = duty.min(100);
        if self.running {
            self.apply_hw(self.duty);
        }
    }

    fn start(&mut self) {
        self.running = true;
        self.apply_hw(self.duty);
    }

    fn stop(&mut self) {
        self.running = false;
        self.apply_hw(0);
    }

    fn apply_hw(&self, duty: u8) {
        let duty_8bit = ((duty as u16) * 255 / 100) as u8;
        hw_init::ledc_set(self.channel, duty_8bit);
    }
}

pub struct StirrerDriver(PwmActuator);

impl StirrerDriver {
    pub fn new() -> Self {
        Self(PwmActuator::new(hw_init::LEDC_CH_STIRRER))
    }

    pub fn set_duty(&mut self, duty: u8) {
        self.0.set_duty(duty);
    }

    pub fn start(&mut self) {
        self.0.start();
    }

    pub fn stop(&mut self) {
        self.0.stop();
    }

    pub fn is_running(&self) -> bool {
        self.0.running
    }

    pub fn current_duty(&self) -> u8 {
        self.0.duty
    }
}

impl Default for StirrerDriver {
    fn default() -> Self {
        Self::new()
    }
}

pub struct FanDriver(PwmActuator);

impl FanDriver {
    pub fn new() -> Self {
        Self(PwmActuator::new(hw_init::LEDC_CH_FAN))
    }

    pub fn set_duty(&mut self, duty: u8) {
        self.0.set_duty(duty);
    }

    pub fn start(&mut self) {
        self.0.start();
    }

    pub fn stop(&mut self) {
        self.0.stop();
    }

    pub fn is_running(&self) -> bool {
        self.0.running
    }

    pub fn current_duty(&self) -> u8 {
        self.0.duty
    }
}

impl Default for FanDriver {
    fn default() -> Self {
        Self::new()
    }
}
