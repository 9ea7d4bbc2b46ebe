//! End-to-end control cycle scenarios: scheduler, PID, interlocks and
//! emergency shutdown, wired to mock hardware.

use crate::mock_hw::{ActuatorCall, MockHardware, RecordingDisplay, ScriptedProbes};
use etchbath::app::context::AppContext;
use etchbath::app::control_loop::ControlCycle;
use etchbath::app::ports::{ActuatorPort, DisplayPort, ProbePort};
use etchbath::config::{Settings, SystemConfig};
use etchbath::error::{CycleResult, Fault};
use etchbath::timer::{seconds_to_cycles, CycleScheduler};

/// Simulated firmware: the scheduler's task context, mirroring the
/// shape of the real `main` but over mocks with a fake clock.
struct SimRig {
    now: u64,
    ctx: AppContext,
    cycle: ControlCycle,
    probes: ScriptedProbes,
    hw: MockHardware,
    control_fires: u32,
    ui_fires: u32,
}

fn control_task(r: &mut SimRig) -> CycleResult {
    r.control_fires += 1;
    r.cycle.run(&mut r.ctx, &mut r.probes, &mut r.hw, r.now)
}

fn ui_task(r: &mut SimRig) -> CycleResult {
    r.ui_fires += 1;
    Ok(())
}

struct Sim {
    rig: SimRig,
    sched: CycleScheduler<SimRig>,
}

impl Sim {
    fn new(settings: Settings) -> Self {
        let config = SystemConfig::default();
        let cycle = ControlCycle::new(&config, &settings);
        let mut ctx = AppContext::new(config.clone(), settings);
        ctx.heater_enabled = true;

        let mut sched = CycleScheduler::new(0);
        sched.set_task(0, config.pid_interval_secs, control_task);
        sched.set_task(1, config.ui_interval_secs, ui_task);

        Self {
            rig: SimRig {
                now: 0,
                ctx,
                cycle,
                probes: ScriptedProbes::all_at(20.0),
                hw: MockHardware::new(),
                control_fires: 0,
                ui_fires: 0,
            },
            sched,
        }
    }

    /// Advance the fake clock in 1 ms polls until `target_cycles`.
    fn run_until(&mut self, target_cycles: u64) -> CycleResult {
        while self.rig.now < target_cycles {
            self.rig.now = (self.rig.now + 10).min(target_cycles);
            let now = self.rig.now;
            self.sched.poll(now, &mut self.rig)?;
        }
        Ok(())
    }
}

#[test]
fn first_control_step_commands_hand_computed_duty() {
    // target 25, pv 20, kp 1, ti 30, td 0:
    // clamp(5 + (1/30)*5*0.02, 0, 100) = 5.0033 -> 5% duty.
    let mut sim = Sim::new(Settings::default());
    sim.run_until(seconds_to_cycles(0.02)).unwrap();
    assert_eq!(sim.rig.control_fires, 1);
    assert_eq!(sim.rig.hw.heater_duty(), Some(5));
}

#[test]
fn task_cadence_over_one_second() {
    let mut sim = Sim::new(Settings::default());
    sim.run_until(seconds_to_cycles(1.0)).unwrap();
    assert_eq!(sim.rig.control_fires, 50); // 20 ms period
    assert_eq!(sim.rig.ui_fires, 25); // 40 ms period
}

#[test]
fn steady_state_converges_toward_target() {
    // Hold the bath just below target; integral action must push the
    // duty up over time rather than collapsing to zero.
    let mut sim = Sim::new(Settings::default());
    sim.rig.probes.hold(0, 24.0);
    sim.rig.probes.hold(1, 24.0);
    sim.run_until(seconds_to_cycles(30.0)).unwrap();

    let duties = sim.rig.hw.heater_duties();
    let early = duties[0] as i32;
    let late = *duties.last().unwrap() as i32;
    assert!(late >= early, "integrator should not lose ground: {early} -> {late}");
    assert!(duties.iter().all(|d| *d <= 100));
}

#[test]
fn over_max_probe_temp_stops_the_run() {
    let mut sim = Sim::new(Settings::default());
    sim.run_until(seconds_to_cycles(0.1)).unwrap();

    sim.rig.probes.hold(1, 220.0); // bath probe beyond the 200 C bound
    let err = sim.run_until(seconds_to_cycles(0.2));
    assert_eq!(err, Err(Fault::AboveMaxTemp));
}

#[test]
fn open_circuit_probe_stops_the_run() {
    let mut sim = Sim::new(Settings::default());
    sim.rig.probes.push(0, Err(Fault::ThermistorOpenCircuit));
    let err = sim.run_until(seconds_to_cycles(0.02));
    assert_eq!(err, Err(Fault::ThermistorOpenCircuit));
}

#[test]
fn thermal_runaway_trips_when_bath_never_heats() {
    // High gain forces full duty; the mat probe (60 s window, +5 C
    // expected) stays stone cold, so the interlock must trip shortly
    // after the window expires.
    let mut settings = Settings::default();
    settings.target_temp_c = 90.0;
    settings.pid.kp = 50.0;
    let mut sim = Sim::new(settings);

    assert!(sim.run_until(seconds_to_cycles(59.0)).is_ok());
    assert!(sim.rig.ctx.rapid_heating);

    let err = sim.run_until(seconds_to_cycles(61.0));
    assert_eq!(err, Err(Fault::ProbeNotResponding));
}

#[test]
fn thermal_runaway_spares_a_heating_bath() {
    let mut settings = Settings::default();
    settings.target_temp_c = 90.0;
    settings.pid.kp = 50.0;
    let mut sim = Sim::new(settings);

    // Feed a slow but sufficient rise: +6 C on both probes every 30 s
    // keeps every window renewed.
    let mut temp = 20.0;
    for half_minute in 1..=6u64 {
        sim.run_until(seconds_to_cycles(30.0) * half_minute).unwrap();
        temp += 6.0;
        sim.rig.probes.hold(0, temp);
        sim.rig.probes.hold(1, temp);
    }
    assert!(sim.rig.ctx.rapid_heating);
}

#[test]
fn safety_probe_override_holds_duty_at_zero() {
    let mut settings = Settings::default();
    settings.target_temp_c = 90.0;
    settings.pid.kp = 50.0;
    settings.controlling_probe = 1;
    let mut sim = Sim::new(settings);

    sim.rig.probes.hold(0, 145.0); // mat over its 140 C operating limit
    sim.rig.probes.hold(1, 20.0); // bath cold, PID wants full power
    sim.run_until(seconds_to_cycles(0.5)).unwrap();

    assert!(sim.rig.hw.heater_duties().iter().all(|d| *d == 0));
}

#[test]
fn fault_handler_shuts_down_in_order_and_shows_code() {
    // Mirror the main loop's emergency path: actuators off, sensing
    // off, fault on the display.
    let mut sim = Sim::new(Settings::default());
    sim.rig.probes.hold(0, 220.0);
    let fault = sim.run_until(seconds_to_cycles(0.02)).unwrap_err();

    let mut display = RecordingDisplay::default();
    sim.rig.ctx.last_fault = Some(fault);
    sim.rig.hw.all_off();
    sim.rig.probes.shutdown();
    display.show_fault(fault);

    assert!(sim.rig.hw.saw_all_off());
    assert_eq!(sim.rig.probes.shutdown_calls, 1);
    assert_eq!(display.faults, vec![Fault::AboveMaxTemp]);
    // No heater command may follow the shutdown.
    assert_eq!(*sim.rig.hw.calls.last().unwrap(), ActuatorCall::AllOff);
}

#[test]
fn disabled_heater_never_drives_the_element() {
    let mut sim = Sim::new(Settings::default());
    sim.rig.ctx.heater_enabled = false;
    sim.run_until(seconds_to_cycles(1.0)).unwrap();
    assert!(sim.rig.hw.heater_duties().is_empty());
}
