//! Application core: pure domain logic, zero I/O.
//!
//! The control cycle, probe bookkeeping and safety interlocks live here.
//! All interaction with hardware happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod context;
pub mod control_loop;
pub mod ports;
