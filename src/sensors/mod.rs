//! Sensor frontends.

pub mod thermistor;
