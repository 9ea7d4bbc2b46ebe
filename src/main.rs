//! Etching-bath heater firmware entry point.
//!
//! One hardware timer, one cooperative scheduler, one shared context:
//!
//! ```text
//! ┌──────────────┐ 100 µs ┌──────────────┐   poll    ┌────────────────┐
//! │ esp_timer    │───────▶│ cycle counter │◀─────────│ foreground loop │
//! └──────────────┘        └──────────────┘           └───────┬────────┘
//!                                                            │
//!                          ┌──────────────── CycleScheduler ─┴─┐
//!                          │ slot 0  control cycle   (20 ms)   │
//!                          │ slot 1  menu / display  (40 ms)   │
//!                          │ slot 2  encoder decode  ( 1 ms)   │
//!                          │ slot 3  button debounce ( 5 ms)   │
//!                          └───────────────────────────────────┘
//! ```
//!
//! Any task fault stops the scheduler and enters emergency shutdown:
//! heater first, then motors, then sensing; the display stays alive
//! showing the fault code until the operator power-cycles.

#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use etchbath::adapters::settings::SettingsStore;
use etchbath::app::context::AppContext;
use etchbath::app::control_loop::ControlCycle;
use etchbath::app::ports::{ActuatorPort, DisplayPort, ProbePort, SettingsPort};
use etchbath::config::{Settings, SystemConfig};
use etchbath::drivers::display::{SevenSegDisplay, SysPin};
use etchbath::drivers::button::ButtonDriver;
use etchbath::drivers::rotary::RotaryDecoder;
use etchbath::drivers::{self, Actuators};
use etchbath::error::CycleResult;
use etchbath::pins;
use etchbath::sensors::thermistor::ThermistorBank;
use etchbath::timer::{self, CycleScheduler};
use etchbath::ui::menu::Menu;

// ── Shared task context ───────────────────────────────────────

/// Everything the scheduler tasks touch, owned in one place and passed
/// by reference; no globals beyond the cycle counter itself.
struct TaskContext {
    ctx: AppContext,
    cycle: ControlCycle,
    menu: Menu,
    probes: ThermistorBank,
    actuators: Actuators,
    display: SevenSegDisplay<SysPin>,
    encoder: RotaryDecoder,
    button: ButtonDriver,
    store: SettingsStore,
}

// ── Scheduler tasks ───────────────────────────────────────────

fn control_task(t: &mut TaskContext) -> CycleResult {
    t.cycle.run(
        &mut t.ctx,
        &mut t.probes,
        &mut t.actuators,
        timer::cycles_now(),
    )
}

fn ui_task(t: &mut TaskContext) -> CycleResult {
    t.menu
        .tick(&mut t.ctx, &mut t.cycle, &mut t.actuators, &mut t.display);

    // Persist edits once the operator is back on the resting screen.
    if t.ctx.settings_dirty && t.menu.is_at_main() {
        match t.store.store(&t.ctx.settings) {
            Ok(()) => t.ctx.settings_dirty = false,
            Err(e) => warn!("settings persist failed: {e}"),
        }
    }
    Ok(())
}

fn encoder_task(t: &mut TaskContext) -> CycleResult {
    t.encoder.poll();
    t.ctx.input.encoder_delta = t
        .ctx
        .input
        .encoder_delta
        .saturating_add(t.encoder.take_detents());
    Ok(())
}

fn button_task(t: &mut TaskContext) -> CycleResult {
    let events = t.button.poll();
    t.ctx.input.pressed |= events.pressed;
    t.ctx.input.long_pressed |= events.long_pressed;
    t.ctx.input.released |= events.released;
    Ok(())
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("etchbath v{} starting", env!("CARGO_PKG_VERSION"));

    let config = SystemConfig::default();

    if let Err(e) = drivers::hw_init::init_peripherals() {
        // No peripherals, no safe operation. Halt and let the watchdog
        // reset us.
        log::error!("peripheral init failed: {e}, halting");
        #[allow(clippy::empty_loop)]
        loop {}
    }
    drivers::hw_timer::start_cycle_timer();

    // Settings: stored blob if valid, factory defaults otherwise.
    let mut store = SettingsStore::new(&config).map_err(|e| anyhow::anyhow!("NVS: {e}"))?;
    let settings = match store.load() {
        Ok(s) => {
            info!("settings loaded from NVS");
            s
        }
        Err(e) => {
            warn!("settings load failed ({e}), using defaults");
            Settings::default()
        }
    };

    let mut t = TaskContext {
        cycle: ControlCycle::new(&config, &settings),
        ctx: AppContext::new(config.clone(), settings),
        menu: Menu::new(),
        probes: ThermistorBank::new(&config),
        actuators: Actuators::new(),
        display: SevenSegDisplay::new(
            SysPin::new(pins::DISPLAY_DATA_GPIO),
            SysPin::new(pins::DISPLAY_CLOCK_GPIO),
            SysPin::new(pins::DISPLAY_LATCH_GPIO),
        ),
        encoder: RotaryDecoder::new(),
        button: ButtonDriver::new(),
        store,
    };

    // The fan setting survives reboots; apply it before the loop starts.
    if t.ctx.settings.fan_duty > 0 {
        t.actuators.set_fan_duty(t.ctx.settings.fan_duty);
        t.actuators.fan_on();
        t.ctx.fan_enabled = true;
    }

    let mut sched: CycleScheduler<TaskContext> = CycleScheduler::new(timer::cycles_now());
    sched.set_task(0, config.pid_interval_secs, control_task);
    sched.set_task(1, config.ui_interval_secs, ui_task);
    sched.set_task(2, config.encoder_interval_secs, encoder_task);
    sched.set_task(3, config.button_interval_secs, button_task);

    info!("scheduler armed, entering control loop");

    loop {
        if let Err(fault) = sched.poll(timer::cycles_now(), &mut t) {
            timer::log_fault(fault);
            t.ctx.last_fault = Some(fault);

            // Emergency shutdown: heat source first, then motors, then
            // sensing. The display stays alive with the fault code.
            t.actuators.all_off();
            t.probes.shutdown();
            drivers::hw_timer::stop_cycle_timer();
            t.display.show_fault(fault);

            log::error!("fault {}: halted until power cycle", fault.code());
            loop {
                esp_idf_hal::delay::FreeRtos::delay_ms(1000);
            }
        }
        esp_idf_hal::delay::FreeRtos::delay_ms(1);
    }
}
