//! Etching-bath heater firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod safety;
pub mod timer;
pub mod ui;

pub mod pins;

// Hardware-facing modules; the actual peripheral access is guarded by
// cfg attributes inside, so these compile on the host for tests.
pub mod adapters;
pub mod drivers;
pub mod sensors;
