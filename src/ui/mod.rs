//! Operator interface.

pub mod menu;
