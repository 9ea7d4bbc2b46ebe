//! Cycle counter and cooperative scheduler.
//!
//! One hardware timer interrupt increments a monotonic cycle counter; the
//! foreground loop polls the [`CycleScheduler`], which converts elapsed
//! cycles into task dispatches:
//!
//! ```text
//! ┌────────────┐  isr_tick()   ┌─────────────┐   poll(now, ctx)
//! │ HW timer   │──────────────▶│ CYCLES       │◀──────────────────┐
//! │ (100 µs)   │               │ (AtomicU64)  │                   │
//! └────────────┘               └─────────────┘            ┌───────┴──────┐
//!                                                         │ CycleScheduler│
//!                               slot 0: control loop ◀────│ fixed table   │
//!                               slot 1: menu / UI    ◀────│ of intervals  │
//!                               slot 2: encoder      ◀────│ + accumulators│
//!                               slot 3: buttons      ◀────└──────────────┘
//! ```
//!
//! The counter is the only timer state shared with interrupt context. The
//! foreground reads it with a single atomic load and works exclusively with
//! *differences* of snapshots, which stay correct across wraparound thanks
//! to unsigned wrapping arithmetic. With a 64-bit counter at 10 kHz the
//! counter does not wrap within the lifetime of the hardware, but the code
//! does not rely on that.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::error::{CycleResult, Fault};

/// Hardware tick rate: one cycle every 100 µs.
pub const CYCLE_HZ: u64 = 10_000;

/// Number of scheduler task slots.
pub const MAX_TASKS: usize = 4;

/// Monotonic cycle counter. Single writer (timer ISR), single reader
/// (foreground poll).
static CYCLES: AtomicU64 = AtomicU64::new(0);

/// Advance the counter by one cycle. Call from the periodic timer
/// interrupt only; lock-free and safe in ISR context.
#[inline]
pub fn isr_tick() {
    CYCLES.fetch_add(1, Ordering::Relaxed);
}

/// Atomic snapshot of the cycle counter.
#[inline]
pub fn cycles_now() -> u64 {
    CYCLES.load(Ordering::Acquire)
}

/// Reset the counter to zero. Startup (and test) use only, never while
/// the scheduler is being polled.
pub fn reset_cycles() {
    CYCLES.store(0, Ordering::Release);
}

// ---------------------------------------------------------------------------
// Time conversions
// ---------------------------------------------------------------------------

/// Seconds to cycles, rounded to the nearest cycle.
pub fn seconds_to_cycles(seconds: f32) -> u64 {
    (seconds * CYCLE_HZ as f32 + 0.5) as u64
}

pub fn cycles_to_seconds(cycles: u64) -> f32 {
    cycles as f32 / CYCLE_HZ as f32
}

pub fn cycles_to_millis(cycles: u64) -> f32 {
    cycles_to_seconds(cycles) * 1e3
}

pub fn cycles_to_minutes(cycles: u64) -> f32 {
    cycles_to_seconds(cycles) / 60.0
}

pub fn cycles_to_hours(cycles: u64) -> f32 {
    cycles_to_seconds(cycles) / 3600.0
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// A scheduled task: plain `fn` pointer over the shared context, returning
/// `Ok(())` or the fault that should stop the application.
pub type TaskFn<C> = fn(&mut C) -> CycleResult;

struct TaskSlot<C> {
    interval: u64,
    accumulator: u64,
    task: TaskFn<C>,
}

/// Fixed-capacity cooperative scheduler.
///
/// Generic over the context type `C` threaded into every task, so the
/// whole dispatch path is testable with a plain struct on the host.
///
/// Backlog policy: when a poll finds more than one full interval
/// accumulated, the task fires **once** and the excess beyond one interval
/// is discarded. A stalled foreground loop therefore produces one catch-up
/// dispatch, never a burst. After every poll each occupied slot satisfies
/// `accumulator < 2 * interval`.
pub struct CycleScheduler<C> {
    slots: [Option<TaskSlot<C>>; MAX_TASKS],
    last_cycles: u64,
}

impl<C> CycleScheduler<C> {
    /// Scheduler with all slots empty, synchronised to `now_cycles`.
    pub fn new(now_cycles: u64) -> Self {
        Self {
            slots: [None, None, None, None],
            last_cycles: now_cycles,
        }
    }

    /// Register `task` in `slot`, firing every `interval_secs`.
    /// Replaces any previous occupant and restarts its accumulator.
    pub fn set_task(&mut self, slot: usize, interval_secs: f32, task: TaskFn<C>) {
        debug_assert!(slot < MAX_TASKS, "task slot out of range");
        debug_assert!(interval_secs > 0.0, "zero-interval task");
        self.slots[slot] = Some(TaskSlot {
            interval: seconds_to_cycles(interval_secs).max(1),
            accumulator: 0,
            task,
        });
    }

    /// Empty `slot`; a no-op if it was already empty.
    pub fn clear_task(&mut self, slot: usize) {
        debug_assert!(slot < MAX_TASKS, "task slot out of range");
        self.slots[slot] = None;
    }

    /// Dispatch every task whose interval has elapsed since the last poll.
    ///
    /// `now_cycles` is an atomic snapshot of the counter ([`cycles_now`]);
    /// the elapsed time is the wrapping difference against the previous
    /// snapshot. A task returning a fault propagates immediately and the
    /// remaining slots are skipped for this pass; the main loop is about
    /// to shut the system down anyway.
    pub fn poll(&mut self, now_cycles: u64, ctx: &mut C) -> CycleResult {
        let dt = now_cycles.wrapping_sub(self.last_cycles);
        self.last_cycles = now_cycles;

        for slot in self.slots.iter_mut().flatten() {
            slot.accumulator = slot.accumulator.wrapping_add(dt);
            if slot.accumulator >= slot.interval {
                slot.accumulator -= slot.interval;
                if slot.accumulator >= slot.interval {
                    // More than one period behind: drop the backlog.
                    slot.accumulator = 0;
                }
                (slot.task)(ctx)?;
            }
        }
        Ok(())
    }

    /// Accumulated cycles for `slot`, if occupied (diagnostics and tests).
    pub fn accumulator(&self, slot: usize) -> Option<u64> {
        self.slots[slot].as_ref().map(|s| s.accumulator)
    }
}

/// Log a fault that ended a scheduler run, code first for the operator.
pub fn log_fault(fault: Fault) {
    log::error!("scheduler: task fault {} ({})", fault.code(), fault);
}
