//! Rotary encoder driver (quadrature, polled).
//!
//! Polled every millisecond from scheduler slot 2, fast enough to catch
//! every Gray-code transition of a hand-turned detented encoder without
//! edge interrupts. Transitions accumulate as quarter-steps; the UI drains
//! whole detents with [`RotaryDecoder::take_detents`], so partial turns
//! carry over instead of being lost.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the A/B GPIOs. On host/test: reads a static AtomicU8
//! for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU8, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

/// Signed quarter-step per (old_state << 2 | new_state) transition.
/// Invalid (bouncy) transitions contribute zero.
const QUAD_TABLE: [i8; 16] = [
    0, 1, -1, 0, //
    -1, 0, 0, 1, //
    1, 0, 0, -1, //
    0, -1, 1, 0,
];

#[cfg(not(target_os = "espidf"))]
static SIM_ENCODER_AB: AtomicU8 = AtomicU8::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_encoder_ab(ab: u8) {
    SIM_ENCODER_AB.store(ab & 0b11, Ordering::Relaxed);
}

pub struct RotaryDecoder {
    last_ab: u8,
    quarter_steps: i32,
}

impl RotaryDecoder {
    pub fn new() -> Self {
        Self {
            last_ab: 0,
            quarter_steps: 0,
        }
    }

    /// Sample the A/B lines and fold the transition into the accumulator.
    pub fn poll(&mut self) {
        let ab = self.read_ab();
        self.advance(ab);
    }

    fn advance(&mut self, ab: u8) {
        let idx = ((self.last_ab << 2) | ab) as usize;
        self.quarter_steps += QUAD_TABLE[idx] as i32;
        self.last_ab = ab;
    }

    /// Drain accumulated whole detents (4 quarter-steps each), keeping
    /// any partial detent for the next call.
    pub fn take_detents(&mut self) -> i16 {
        let detents = self.quarter_steps / 4;
        self.quarter_steps -= detents * 4;
        detents as i16
    }

    #[cfg(target_os = "espidf")]
    fn read_ab(&self) -> u8 {
        let a = hw_init::gpio_read(pins::ENCODER_A_GPIO) as u8;
        let b = hw_init::gpio_read(pins::ENCODER_B_GPIO) as u8;
        (a << 1) | b
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_ab(&self) -> u8 {
        SIM_ENCODER_AB.load(Ordering::Relaxed)
    }
}

impl Default for RotaryDecoder {
    fn default() -> Self {
        Self::new()
    }
}
