//! Push-button driver, polled debounce with long-press detection.
//!
//! Polled every 5 ms from scheduler slot 3. An up/down integrator absorbs
//! contact bounce: the button is considered pressed only after eight
//! consecutive pressed samples (40 ms) and released only after the
//! integrator drains back to zero.
//!
//! | Gesture    | Condition                     | Event          |
//! |------------|-------------------------------|----------------|
//! | Press      | debounced falling edge        | `pressed`      |
//! | Long press | held >= 1 s                   | `long_pressed` |
//! | Release    | debounced rising edge         | `released`     |

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

const DEBOUNCE_TICKS: u8 = 8; // 40 ms at the 5 ms poll rate
const LONG_PRESS_TICKS: u16 = 200; // 1 s

#[cfg(not(target_os = "espidf"))]
static SIM_BUTTON_PRESSED: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_button(pressed: bool) {
    SIM_BUTTON_PRESSED.store(pressed, Ordering::Relaxed);
}

/// Events produced by one debounce tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonEvents {
    pub pressed: bool,
    pub long_pressed: bool,
    pub released: bool,
}

pub struct ButtonDriver {
    integrator: u8,
    stable_pressed: bool,
    held_ticks: u16,
    long_fired: bool,
}

impl ButtonDriver {
    pub fn new() -> Self {
        Self {
            integrator: 0,
            stable_pressed: false,
            held_ticks: 0,
            long_fired: false,
        }
    }

    /// One debounce tick; call at the button poll rate.
    pub fn poll(&mut self) -> ButtonEvents {
        let raw = self.read_hw();
        self.advance(raw)
    }

    fn advance(&mut self, raw_pressed: bool) -> ButtonEvents {
        if raw_pressed {
            if self.integrator < DEBOUNCE_TICKS {
                self.integrator += 1;
            }
        } else if self.integrator > 0 {
            self.integrator -= 1;
        }

        let mut events = ButtonEvents::default();
        if !self.stable_pressed {
            if self.integrator == DEBOUNCE_TICKS {
                self.stable_pressed = true;
                self.held_ticks = 0;
                self.long_fired = false;
                events.pressed = true;
            }
        } else if self.integrator == 0 {
            self.stable_pressed = false;
            events.released = true;
        } else {
            self.held_ticks = self.held_ticks.saturating_add(1);
            if !self.long_fired && self.held_ticks >= LONG_PRESS_TICKS {
                self.long_fired = true;
                events.long_pressed = true;
            }
        }
        events
    }

    // Active-low switch with pull-up.
    #[cfg(target_os = "espidf")]
    fn read_hw(&self) -> bool {
        !hw_init::gpio_read(pins::BUTTON_GPIO)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_hw(&self) -> bool {
        SIM_BUTTON_PRESSED.load(Ordering::Relaxed)
    }
}

impl Default for ButtonDriver {
    fn default() -> Self {
        Self::new()
    }
}
