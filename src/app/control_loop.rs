//! The periodic control cycle: acquisition, interlocks, regulation.
//!
//! Runs once per PID interval from scheduler slot 0. Each pass walks the
//! probe table, refreshes readings, applies the safety interlocks, then
//! computes and applies the heater duty cycle:
//!
//! ```text
//!   for each present probe:
//!       measure ──▶ bounds check ──▶ runaway check
//!   pv = controlling probe
//!   duty = pid.step(pv, target) ──▶ safety-probe override ──▶ heater
//! ```
//!
//! Any fault aborts the pass immediately; the main loop performs the
//! emergency shutdown.

use crate::app::context::AppContext;
use crate::app::ports::{ActuatorPort, ProbePort};
use crate::config::{PidSettings, Settings, SystemConfig, MAX_PROBES};
use crate::control::pid::PidController;
use crate::error::{CycleResult, Fault};
use crate::safety::{self, RunawayVerdict};

/// Owns the PID controller and drives one regulation pass per call.
pub struct ControlCycle {
    pid: PidController,
}

impl ControlCycle {
    pub fn new(config: &SystemConfig, settings: &Settings) -> Self {
        Self {
            pid: PidController::new(
                &settings.pid,
                config.heater_control_min,
                config.heater_control_max,
                config.pid_interval_secs,
            ),
        }
    }

    /// Push menu-edited tuning into the controller. Resets its dynamic
    /// state, so call only when a parameter actually changed.
    pub fn apply_pid_settings(&mut self, config: &SystemConfig, params: &PidSettings) {
        self.pid
            .set_params(params, config.heater_control_min, config.heater_control_max);
    }

    /// Forget accumulated controller state (heater re-enable path).
    pub fn reset_pid(&mut self) {
        self.pid.reset();
    }

    /// One full control pass at `now_cycles`.
    pub fn run<P: ProbePort, A: ActuatorPort>(
        &mut self,
        ctx: &mut AppContext,
        probes: &mut P,
        actuators: &mut A,
        now_cycles: u64,
    ) -> CycleResult {
        // -- Acquisition and per-probe interlocks --
        for index in 0..MAX_PROBES as u8 {
            if !ctx.config.probe_present(index) {
                continue;
            }
            let temp = probes.measure_temperature(index)?;
            ctx.probes[index as usize].temperature_c = temp;

            if ctx.calibrating_probe == Some(index) {
                ctx.probes[index as usize].resistance_ohm = probes.measure_resistance(index)?;
            }

            safety::check_bounds(temp, ctx.config.min_temp_c, ctx.config.max_temp_c)?;

            // Runaway monitoring only counts while the heater is pinned at
            // rapid-heating power; at partial duty the plant may legitimately
            // hold steady.
            if ctx.rapid_heating && ctx.is_runaway_monitored(index) {
                if let Some(params) = ctx.config.probes[index as usize].runaway {
                    let probe = &mut ctx.probes[index as usize];
                    let verdict = safety::check_runaway(
                        &params,
                        temp,
                        probe.runaway_start_temp_c,
                        probe.runaway_start_cycles,
                        now_cycles,
                    )?;
                    if verdict == RunawayVerdict::RenewWindow {
                        probe.runaway_start_temp_c = temp;
                        probe.runaway_start_cycles = now_cycles;
                    }
                }
            }
        }

        // -- Regulation --
        if !ctx.heater_enabled {
            ctx.rapid_heating = false;
            return Ok(());
        }

        let controlling = ctx.settings.controlling_probe;
        if !ctx.config.probe_present(controlling) {
            return Err(Fault::NoControllingProbe);
        }
        let pv = ctx.probes[controlling as usize].temperature_c;

        let mut duty = self.pid.step(pv, ctx.settings.target_temp_c) as u8;

        // Second safety layer, independent of the PID: never drive the
        // heater while the mat itself is over its operating limit.
        if ctx.safety_probe_temp() > ctx.config.heater_max_operating_temp_c {
            duty = 0;
        }

        // Rapid-heating latch. Entering restarts every probe's runaway
        // window from its current reading so the interlock measures rise
        // from this point, not from power-on.
        if duty >= ctx.config.rapid_heating_duty {
            if !ctx.rapid_heating {
                ctx.rapid_heating = true;
                ctx.restart_runaway_windows(now_cycles);
                log::info!("rapid heating engaged (duty {duty}%)");
            }
        } else if ctx.rapid_heating {
            ctx.rapid_heating = false;
            log::info!("rapid heating released (duty {duty}%)");
        }

        actuators.set_heater_duty(duty);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::seconds_to_cycles;

    /// Probe frontend returning canned readings.
    struct FakeProbes {
        temps: [Result<f32, Fault>; MAX_PROBES],
        resistance: f32,
        resistance_reads: u32,
    }

    impl FakeProbes {
        fn all_at(temp: f32) -> Self {
            Self {
                temps: [Ok(temp); MAX_PROBES],
                resistance: 10_000.0,
                resistance_reads: 0,
            }
        }
    }

    impl ProbePort for FakeProbes {
        fn measure_temperature(&mut self, index: u8) -> Result<f32, Fault> {
            self.temps[index as usize]
        }
        fn measure_resistance(&mut self, _index: u8) -> Result<f32, Fault> {
            self.resistance_reads += 1;
            Ok(self.resistance)
        }
        fn shutdown(&mut self) {}
    }

    /// Actuator sink recording the last commanded duties.
    #[derive(Default)]
    struct FakeActuators {
        heater_duty: Option<u8>,
        all_off_calls: u32,
    }

    impl ActuatorPort for FakeActuators {
        fn set_heater_duty(&mut self, percent: u8) {
            self.heater_duty = Some(percent);
        }
        fn heater_on(&mut self) {}
        fn heater_off(&mut self) {}
        fn set_stirrer_duty(&mut self, _percent: u8) {}
        fn stirrer_on(&mut self) {}
        fn stirrer_off(&mut self) {}
        fn set_fan_duty(&mut self, _percent: u8) {}
        fn fan_on(&mut self) {}
        fn fan_off(&mut self) {}
        fn all_off(&mut self) {
            self.all_off_calls += 1;
        }
    }

    fn setup() -> (ControlCycle, AppContext, FakeProbes, FakeActuators) {
        let config = SystemConfig::default();
        let settings = Settings::default();
        let cycle = ControlCycle::new(&config, &settings);
        let mut ctx = AppContext::new(config, settings);
        ctx.heater_enabled = true;
        (cycle, ctx, FakeProbes::all_at(20.0), FakeActuators::default())
    }

    #[test]
    fn first_pass_commands_hand_computed_duty() {
        // target 25, pv 20, kp 1, ti 30, td 0, dt 0.02:
        // 5 + (1/30)*5*0.02 = 5.0033, truncated to 5%.
        let (mut cycle, mut ctx, mut probes, mut act) = setup();
        cycle.run(&mut ctx, &mut probes, &mut act, 0).unwrap();
        assert_eq!(act.heater_duty, Some(5));
    }

    #[test]
    fn min_temperature_boundary_is_in_range() {
        let (mut cycle, mut ctx, _, mut act) = setup();
        let mut probes = FakeProbes::all_at(0.0);
        assert_eq!(cycle.run(&mut ctx, &mut probes, &mut act, 0), Ok(()));

        let mut probes = FakeProbes::all_at(-0.5);
        assert_eq!(
            cycle.run(&mut ctx, &mut probes, &mut act, 0),
            Err(Fault::BelowMinTemp)
        );
    }

    #[test]
    fn over_max_temperature_faults_and_skips_actuation() {
        let (mut cycle, mut ctx, _, mut act) = setup();
        let mut probes = FakeProbes::all_at(201.0);
        assert_eq!(
            cycle.run(&mut ctx, &mut probes, &mut act, 0),
            Err(Fault::AboveMaxTemp)
        );
        assert_eq!(act.heater_duty, None);
    }

    #[test]
    fn sensor_fault_aborts_pass() {
        let (mut cycle, mut ctx, mut probes, mut act) = setup();
        probes.temps[0] = Err(Fault::ThermistorOpenCircuit);
        assert_eq!(
            cycle.run(&mut ctx, &mut probes, &mut act, 0),
            Err(Fault::ThermistorOpenCircuit)
        );
        assert_eq!(act.heater_duty, None);
    }

    #[test]
    fn absent_controlling_probe_faults() {
        let (mut cycle, mut ctx, mut probes, mut act) = setup();
        ctx.settings.controlling_probe = 3; // unpopulated slot
        assert_eq!(
            cycle.run(&mut ctx, &mut probes, &mut act, 0),
            Err(Fault::NoControllingProbe)
        );
    }

    #[test]
    fn disabled_heater_skips_regulation_but_still_checks_probes() {
        let (mut cycle, mut ctx, _, mut act) = setup();
        ctx.heater_enabled = false;
        let mut probes = FakeProbes::all_at(201.0);
        assert_eq!(
            cycle.run(&mut ctx, &mut probes, &mut act, 0),
            Err(Fault::AboveMaxTemp)
        );

        let mut probes = FakeProbes::all_at(20.0);
        cycle.run(&mut ctx, &mut probes, &mut act, 0).unwrap();
        assert_eq!(act.heater_duty, None);
    }

    #[test]
    fn safety_probe_override_forces_zero_duty() {
        let (mut cycle, mut ctx, mut probes, mut act) = setup();
        // Mat probe (0) scorching, bath probe (1) cold: PID wants full
        // power, the override must win.
        ctx.settings.controlling_probe = 1;
        ctx.settings.pid.kp = 50.0;
        cycle.apply_pid_settings(&ctx.config, &ctx.settings.pid);
        probes.temps[0] = Ok(141.0);
        probes.temps[1] = Ok(20.0);

        cycle.run(&mut ctx, &mut probes, &mut act, 0).unwrap();
        assert_eq!(act.heater_duty, Some(0));
        assert!(!ctx.rapid_heating);
    }

    #[test]
    fn rapid_heating_latch_engages_and_anchors_windows() {
        let (mut cycle, mut ctx, mut probes, mut act) = setup();
        ctx.settings.target_temp_c = 90.0;
        ctx.settings.pid.kp = 50.0;
        cycle.apply_pid_settings(&ctx.config, &ctx.settings.pid);

        let now = 777;
        cycle.run(&mut ctx, &mut probes, &mut act, now).unwrap();
        assert_eq!(act.heater_duty, Some(100));
        assert!(ctx.rapid_heating);
        assert_eq!(ctx.probes[0].runaway_start_cycles, now);
        assert_eq!(ctx.probes[0].runaway_start_temp_c, 20.0);
    }

    #[test]
    fn rapid_heating_latch_releases_below_threshold() {
        let (mut cycle, mut ctx, mut probes, mut act) = setup();
        ctx.settings.target_temp_c = 90.0;
        ctx.settings.pid.kp = 50.0;
        cycle.apply_pid_settings(&ctx.config, &ctx.settings.pid);
        cycle.run(&mut ctx, &mut probes, &mut act, 0).unwrap();
        assert!(ctx.rapid_heating);

        // Process value reaches the target: duty collapses, latch opens.
        probes = FakeProbes::all_at(90.0);
        cycle.run(&mut ctx, &mut probes, &mut act, 10).unwrap();
        assert!(!ctx.rapid_heating);
    }

    #[test]
    fn stalled_probe_faults_after_runaway_window() {
        let (mut cycle, mut ctx, mut probes, mut act) = setup();
        ctx.settings.target_temp_c = 90.0;
        ctx.settings.pid.kp = 50.0;
        cycle.apply_pid_settings(&ctx.config, &ctx.settings.pid);

        cycle.run(&mut ctx, &mut probes, &mut act, 0).unwrap();
        assert!(ctx.rapid_heating);

        // Probe 0's window is 60 s. Flat temperature past expiry trips it.
        let past = seconds_to_cycles(60.0) + 1;
        assert_eq!(
            cycle.run(&mut ctx, &mut probes, &mut act, past),
            Err(Fault::ProbeNotResponding)
        );
    }

    #[test]
    fn rising_probe_renews_window_instead_of_faulting() {
        let (mut cycle, mut ctx, mut probes, mut act) = setup();
        ctx.settings.target_temp_c = 90.0;
        ctx.settings.pid.kp = 50.0;
        cycle.apply_pid_settings(&ctx.config, &ctx.settings.pid);
        cycle.run(&mut ctx, &mut probes, &mut act, 0).unwrap();

        // +6 C at 80% of the 60 s window: renewed, no fault.
        let at = seconds_to_cycles(48.0);
        probes = FakeProbes::all_at(26.0);
        cycle.run(&mut ctx, &mut probes, &mut act, at).unwrap();
        assert_eq!(ctx.probes[0].runaway_start_cycles, at);
        assert_eq!(ctx.probes[0].runaway_start_temp_c, 26.0);

        // Well past the original window, inside the renewed one: fine.
        let later = seconds_to_cycles(75.0);
        probes = FakeProbes::all_at(26.5);
        cycle.run(&mut ctx, &mut probes, &mut act, later).unwrap();
    }

    #[test]
    fn calibration_refreshes_resistance_for_that_probe_only() {
        let (mut cycle, mut ctx, mut probes, mut act) = setup();
        ctx.calibrating_probe = Some(1);
        probes.resistance = 8_456.0;

        cycle.run(&mut ctx, &mut probes, &mut act, 0).unwrap();
        assert_eq!(probes.resistance_reads, 1);
        assert_eq!(ctx.probes[1].resistance_ohm, 8_456.0);
        assert_eq!(ctx.probes[0].resistance_ohm, 0.0);
    }
}
