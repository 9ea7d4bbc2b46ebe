//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file exercising a subsystem against mock
//! adapters. All tests run on the host with no real hardware required.

mod control_cycle_tests;
mod mock_hw;
mod settings_flow_tests;
