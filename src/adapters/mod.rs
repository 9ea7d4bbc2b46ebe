//! Adapters binding the port traits to concrete backends.

pub mod settings;
