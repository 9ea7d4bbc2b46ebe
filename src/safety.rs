//! Safety interlocks: temperature bounds and thermal-runaway protection.
//!
//! Every interlock here is **fatal and latching**. A tripped fault ends the
//! run; there is no retry path and no self-clearing. The operator has to
//! power-cycle after fixing the plant.
//!
//! The runaway interlock is a rolling window: while the heater is driven at
//! full power, each monitored probe must show at least its expected rise
//! within its window, otherwise the probe is presumed detached from the
//! bath (reading ambient while the mat cooks) and the run is aborted.

use crate::config::RunawayParams;
use crate::error::{CycleResult, Fault};
use crate::timer::seconds_to_cycles;

/// Reject readings outside the protection band.
///
/// Comparisons are strict, so `min_temp_c` itself is in range. With the
/// default band of 0 °C this matters: an icy bath at exactly 0.0 is
/// operating, anything below it is a wiring or sensing problem.
pub fn check_bounds(temp_c: f32, min_temp_c: f32, max_temp_c: f32) -> CycleResult {
    if temp_c > max_temp_c {
        return Err(Fault::AboveMaxTemp);
    }
    if temp_c < min_temp_c {
        return Err(Fault::BelowMinTemp);
    }
    Ok(())
}

/// One probe's rolling runaway window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunawayVerdict {
    /// Nothing to do this cycle.
    Pass,
    /// Expected rise observed inside the window: restart it from the
    /// current point.
    RenewWindow,
}

/// Evaluate the thermal-runaway interlock for one probe.
///
/// Only meaningful while rapid heating is latched; callers skip the check
/// otherwise. `start_temp_c` / `start_cycles` are the window anchor set
/// when the latch was entered or the window last renewed.
///
/// * rise not reached and window expired ⇒ [`Fault::ProbeNotResponding`]
/// * rise reached inside the window ⇒ [`RunawayVerdict::RenewWindow`]
/// * rise reached but window already expired ⇒ pass; the anchor stays put
///   until the next in-window rise or the next rapid-heating entry
pub fn check_runaway(
    params: &RunawayParams,
    temp_c: f32,
    start_temp_c: f32,
    start_cycles: u64,
    now_cycles: u64,
) -> Result<RunawayVerdict, Fault> {
    let elapsed = now_cycles.wrapping_sub(start_cycles);
    let window = seconds_to_cycles(params.window_secs);
    let rise_reached = temp_c - start_temp_c >= params.expected_delta_c;

    if rise_reached {
        if elapsed <= window {
            return Ok(RunawayVerdict::RenewWindow);
        }
    } else if elapsed > window {
        return Err(Fault::ProbeNotResponding);
    }
    Ok(RunawayVerdict::Pass)
}
