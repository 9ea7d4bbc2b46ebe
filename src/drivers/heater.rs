//! Heater element driver (SSR via LEDC PWM).
//!
//! ## Safety contract
//!
//! The heater must never be driven while disabled, after a safety fault,
//! or above the mat's operating temperature. All of that is enforced by
//! the control cycle; this driver is a dumb actuator that clamps duty to
//! 0..=100 and keeps the output at zero while off.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives real PWM via hw_init helpers.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;

pub struct HeaterDriver {
    enabled: bool,
    duty: u8,
}

impl HeaterDriver {
    pub fn new() -> Self {
        Self {
            enabled: false,
            duty: 0,
        }
    }

    /// Command a duty cycle in percent. Ignored (output stays zero) while
    /// the heater is disabled.
    pub fn set_duty(&mut self, duty: u8) {
        self.duty = duty.min(100);
        if self.enabled {
            self.apply_hw(self.duty);
        }
    }

    pub fn enable(&mut self) {
        self.enabled = true;
        self.apply_hw(self.duty);
    }

    /// Disable and force the output to zero immediately.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.duty = 0;
        self.apply_hw(0);
    }

    fn apply_hw(&self, duty: u8) {
        let duty_8bit = ((duty as u16) * 255 / 100) as u8;
        hw_init::ledc_set(hw_init::LEDC_CH_HEATER, duty_8bit);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn current_duty(&self) -> u8 {
        self.duty
    }
}

impl Default for HeaterDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duty_is_clamped_to_100() {
        let mut h = HeaterDriver::new();
        h.enable();
        h.set_duty(250);
        assert_eq!(h.current_duty(), 100);
    }

    #[test]
    fn disable_zeroes_duty() {
        let mut h = HeaterDriver::new();
        h.enable();
        h.set_duty(60);
        h.disable();
        assert!(!h.is_enabled());
        assert_eq!(h.current_duty(), 0);
    }
}
