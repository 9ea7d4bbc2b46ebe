//! Board pin map (ESP32-S3 devkit wiring).
//!
//! Single source of truth for GPIO and ADC channel assignments. Change
//! the wiring here, nowhere else.

/// ADC1 channels for the thermistor dividers, indexed by probe slot.
pub const PROBE_ADC_CHANNELS: [u32; 4] = [3, 4, 5, 6];

// --- Actuators (LEDC PWM) ---
pub const HEATER_GPIO: i32 = 10;
pub const STIRRER_GPIO: i32 = 11;
pub const FAN_GPIO: i32 = 12;

// --- Rotary encoder + push button (inputs, external pull-ups) ---
pub const ENCODER_A_GPIO: i32 = 15;
pub const ENCODER_B_GPIO: i32 = 16;
pub const BUTTON_GPIO: i32 = 17;

// --- 7-segment display shift register (74HC595 chain) ---
pub const DISPLAY_DATA_GPIO: i32 = 20;
pub const DISPLAY_CLOCK_GPIO: i32 = 21;
pub const DISPLAY_LATCH_GPIO: i32 = 22;
