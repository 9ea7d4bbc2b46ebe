//! Hardware cycle-tick timer using ESP-IDF's esp_timer API.
//!
//! One periodic 100 µs timer drives the whole scheduler: its callback
//! increments the atomic cycle counter and nothing else. Callbacks run in
//! the ESP timer task context (not a real ISR), which is more than safe
//! for a single `fetch_add`.
//!
//! On the host there is no timer; tests advance the counter directly.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::timer::{self, CYCLE_HZ};

#[cfg(target_os = "espidf")]
static mut CYCLE_TIMER: esp_timer_handle_t = core::ptr::null_mut();

#[cfg(target_os = "espidf")]
unsafe extern "C" fn cycle_tick_cb(_arg: *mut core::ffi::c_void) {
    timer::isr_tick();
}

/// Start the cycle tick. Call once from `main()` before polling the
/// scheduler.
#[cfg(target_os = "espidf")]
pub fn start_cycle_timer() {
    // SAFETY: CYCLE_TIMER is written here once at boot from the single
    // main-task context before any callbacks fire. The callback only
    // touches an AtomicU64.
    unsafe {
        let args = esp_timer_create_args_t {
            callback: Some(cycle_tick_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"cycle\0".as_ptr() as *const _,
            skip_unhandled_events: true,
        };
        let ret = esp_timer_create(&args, &raw mut CYCLE_TIMER);
        if ret != ESP_OK {
            log::error!("hw_timer: cycle timer create failed (rc={ret})");
            return;
        }
        let period_us = 1_000_000 / CYCLE_HZ;
        let ret = esp_timer_start_periodic(CYCLE_TIMER, period_us);
        if ret != ESP_OK {
            log::error!("hw_timer: cycle timer start failed (rc={ret})");
            return;
        }
        info!("hw_timer: cycle tick started ({CYCLE_HZ} Hz)");
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn start_cycle_timer() {
    log::info!("hw_timer(sim): cycle tick driven by test harness");
}

/// Stop the cycle tick (shutdown path).
#[cfg(target_os = "espidf")]
pub fn stop_cycle_timer() {
    // SAFETY: CYCLE_TIMER is a valid handle if start succeeded; the
    // null check prevents stopping a never-created timer.
    unsafe {
        let handle = CYCLE_TIMER;
        if !handle.is_null() {
            esp_timer_stop(handle);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn stop_cycle_timer() {}
