//! Menu state machine for the rotary-encoder / 7-segment interface.
//!
//! A tagged-enum state with one dispatch point:
//!
//! ```text
//!   Main ──press──▶ Root ──press──▶ editor ──press/long──▶ back
//!    ▲                │ encoder cycles items
//!    └───── long ─────┘
//! ```
//!
//! Editors mutate [`Settings`] in place, push PID tuning into the
//! controller, and mark the settings dirty; the main loop persists them
//! once the operator returns to the main display.

use crate::app::context::{AppContext, InputFrame};
use crate::app::control_loop::ControlCycle;
use crate::app::ports::{ActuatorPort, DisplayPort};
use crate::config::{
    MAX_PID_GAIN, MAX_PID_I_CLAMP, MAX_PID_OFFSET, MAX_PID_SMOOTHING, MAX_PROBES,
    MAX_TARGET_TEMP_C, MIN_PID_GAIN, MIN_PID_I_CLAMP, MIN_PID_OFFSET, MIN_PID_SMOOTHING,
    MIN_TARGET_TEMP_C,
};

/// Entries of the root menu, in encoder order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootItem {
    Heater,
    TargetTemp,
    ControllingProbe,
    PidParams,
    StirrerDuty,
    FanDuty,
    ProbeCalib,
}

const ROOT_ITEMS: [RootItem; 7] = [
    RootItem::Heater,
    RootItem::TargetTemp,
    RootItem::ControllingProbe,
    RootItem::PidParams,
    RootItem::StirrerDuty,
    RootItem::FanDuty,
    RootItem::ProbeCalib,
];

/// Editable PID parameters, in encoder order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidField {
    Kp,
    Ti,
    Td,
    IClamp,
    Offset,
    Smoothing,
}

const PID_FIELDS: [PidField; 6] = [
    PidField::Kp,
    PidField::Ti,
    PidField::Td,
    PidField::IClamp,
    PidField::Offset,
    PidField::Smoothing,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    /// Controlling probe's temperature, the resting screen.
    Main,
    Root { index: usize },
    EditHeater,
    EditTargetTemp,
    EditControllingProbe,
    SelectPidField { index: usize },
    EditPidField { field: PidField },
    EditStirrerDuty,
    EditFanDuty,
    ProbeCalib { probe: u8 },
}

pub struct Menu {
    state: MenuState,
}

impl Menu {
    pub fn new() -> Self {
        Self {
            state: MenuState::Main,
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    /// Whether the resting screen is showing (the persist point).
    pub fn is_at_main(&self) -> bool {
        self.state == MenuState::Main
    }

    /// One UI tick: consume the input frame, update state and settings,
    /// render.
    pub fn tick<A: ActuatorPort, D: DisplayPort>(
        &mut self,
        ctx: &mut AppContext,
        cycle: &mut ControlCycle,
        actuators: &mut A,
        display: &mut D,
    ) {
        let input = ctx.input;
        ctx.input.clear();
        self.dispatch(input, ctx, cycle, actuators);
        self.render(ctx, display);
    }

    fn dispatch<A: ActuatorPort>(
        &mut self,
        input: InputFrame,
        ctx: &mut AppContext,
        cycle: &mut ControlCycle,
        actuators: &mut A,
    ) {
        let delta = input.encoder_delta;
        self.state = match self.state {
            MenuState::Main => {
                if input.pressed {
                    MenuState::Root { index: 0 }
                } else {
                    MenuState::Main
                }
            }

            MenuState::Root { index } => {
                if input.long_pressed {
                    MenuState::Main
                } else if input.pressed {
                    self.enter_item(ROOT_ITEMS[index], ctx)
                } else {
                    MenuState::Root {
                        index: cycle_index(index, delta, ROOT_ITEMS.len()),
                    }
                }
            }

            MenuState::EditHeater => {
                if input.pressed {
                    toggle_heater(ctx, cycle, actuators);
                    MenuState::EditHeater
                } else if input.long_pressed {
                    MenuState::Root { index: 0 }
                } else {
                    MenuState::EditHeater
                }
            }

            MenuState::EditTargetTemp => {
                if delta != 0 {
                    ctx.settings.target_temp_c = adjust(
                        ctx.settings.target_temp_c,
                        delta,
                        0.1,
                        MIN_TARGET_TEMP_C,
                        MAX_TARGET_TEMP_C,
                    );
                    ctx.settings_dirty = true;
                }
                if input.pressed || input.long_pressed {
                    MenuState::Root { index: 1 }
                } else {
                    MenuState::EditTargetTemp
                }
            }

            MenuState::EditControllingProbe => {
                if delta != 0 {
                    let next = next_present_probe(ctx, ctx.settings.controlling_probe, delta);
                    if next != ctx.settings.controlling_probe {
                        ctx.settings.controlling_probe = next;
                        ctx.settings_dirty = true;
                    }
                }
                if input.pressed || input.long_pressed {
                    MenuState::Root { index: 2 }
                } else {
                    MenuState::EditControllingProbe
                }
            }

            MenuState::SelectPidField { index } => {
                if input.long_pressed {
                    MenuState::Root { index: 3 }
                } else if input.pressed {
                    MenuState::EditPidField {
                        field: PID_FIELDS[index],
                    }
                } else {
                    MenuState::SelectPidField {
                        index: cycle_index(index, delta, PID_FIELDS.len()),
                    }
                }
            }

            MenuState::EditPidField { field } => {
                if delta != 0 {
                    edit_pid_field(ctx, cycle, field, delta);
                }
                if input.long_pressed {
                    MenuState::Root { index: 3 }
                } else if input.pressed {
                    MenuState::SelectPidField {
                        index: PID_FIELDS.iter().position(|f| *f == field).unwrap_or(0),
                    }
                } else {
                    MenuState::EditPidField { field }
                }
            }

            MenuState::EditStirrerDuty => {
                if delta != 0 {
                    let duty = adjust(ctx.stirrer_duty as f32, delta, 1.0, 0.0, 100.0) as u8;
                    ctx.stirrer_duty = duty;
                    actuators.set_stirrer_duty(duty);
                    if duty > 0 && !ctx.stirrer_enabled {
                        ctx.stirrer_enabled = true;
                        actuators.stirrer_on();
                    } else if duty == 0 && ctx.stirrer_enabled {
                        ctx.stirrer_enabled = false;
                        actuators.stirrer_off();
                    }
                }
                if input.pressed || input.long_pressed {
                    MenuState::Root { index: 4 }
                } else {
                    MenuState::EditStirrerDuty
                }
            }

            MenuState::EditFanDuty => {
                if delta != 0 {
                    let duty = adjust(ctx.settings.fan_duty as f32, delta, 1.0, 0.0, 100.0) as u8;
                    ctx.settings.fan_duty = duty;
                    ctx.settings_dirty = true;
                    actuators.set_fan_duty(duty);
                    if duty > 0 && !ctx.fan_enabled {
                        ctx.fan_enabled = true;
                        actuators.fan_on();
                    } else if duty == 0 && ctx.fan_enabled {
                        ctx.fan_enabled = false;
                        actuators.fan_off();
                    }
                }
                if input.pressed || input.long_pressed {
                    MenuState::Root { index: 5 }
                } else {
                    MenuState::EditFanDuty
                }
            }

            MenuState::ProbeCalib { probe } => {
                let mut probe = probe;
                if delta != 0 {
                    probe = next_present_probe(ctx, probe, delta);
                    ctx.calibrating_probe = Some(probe);
                }
                if input.pressed || input.long_pressed {
                    ctx.calibrating_probe = None;
                    MenuState::Root { index: 6 }
                } else {
                    MenuState::ProbeCalib { probe }
                }
            }
        };
    }

    fn enter_item(&mut self, item: RootItem, ctx: &mut AppContext) -> MenuState {
        match item {
            RootItem::Heater => MenuState::EditHeater,
            RootItem::TargetTemp => MenuState::EditTargetTemp,
            RootItem::ControllingProbe => MenuState::EditControllingProbe,
            RootItem::PidParams => MenuState::SelectPidField { index: 0 },
            RootItem::StirrerDuty => MenuState::EditStirrerDuty,
            RootItem::FanDuty => MenuState::EditFanDuty,
            RootItem::ProbeCalib => {
                let probe = ctx.settings.controlling_probe;
                ctx.calibrating_probe = Some(probe);
                MenuState::ProbeCalib { probe }
            }
        }
    }

    fn render<D: DisplayPort>(&self, ctx: &AppContext, display: &mut D) {
        match self.state {
            MenuState::Main => {
                let probe = ctx.settings.controlling_probe;
                display.show_temperature(ctx.probes[probe as usize].temperature_c, probe);
            }
            MenuState::Root { index } => display.show_text(root_label(ROOT_ITEMS[index])),
            MenuState::EditHeater => {
                display.show_text(if ctx.heater_enabled { "On" } else { "OFF" })
            }
            MenuState::EditTargetTemp => display.show_value(ctx.settings.target_temp_c),
            MenuState::EditControllingProbe => {
                display.show_value(ctx.settings.controlling_probe as f32)
            }
            MenuState::SelectPidField { index } => {
                display.show_text(pid_label(PID_FIELDS[index]))
            }
            MenuState::EditPidField { field } => {
                display.show_value(pid_field_value(ctx, field))
            }
            MenuState::EditStirrerDuty => display.show_value(ctx.stirrer_duty as f32),
            MenuState::EditFanDuty => display.show_value(ctx.settings.fan_duty as f32),
            MenuState::ProbeCalib { probe } => {
                display.show_value(ctx.probes[probe as usize].resistance_ohm)
            }
        }
    }
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn cycle_index(index: usize, delta: i16, len: usize) -> usize {
    (index as i32 + delta as i32).rem_euclid(len as i32) as usize
}

fn adjust(value: f32, delta: i16, step: f32, min: f32, max: f32) -> f32 {
    (value + delta as f32 * step).clamp(min, max)
}

/// Walk the probe table in `direction` until the next populated slot.
fn next_present_probe(ctx: &AppContext, from: u8, direction: i16) -> u8 {
    let step: i32 = if direction >= 0 { 1 } else { -1 };
    let mut candidate = from as i32;
    for _ in 0..MAX_PROBES {
        candidate = (candidate + step).rem_euclid(MAX_PROBES as i32);
        if ctx.config.probe_present(candidate as u8) {
            return candidate as u8;
        }
    }
    from
}

fn toggle_heater<A: ActuatorPort>(
    ctx: &mut AppContext,
    cycle: &mut ControlCycle,
    actuators: &mut A,
) {
    if ctx.heater_enabled {
        ctx.heater_enabled = false;
        actuators.heater_off();
        log::info!("heater switched off");
    } else {
        // Stale integrator/derivative state from the previous run must not
        // leak into the new one.
        cycle.reset_pid();
        ctx.heater_enabled = true;
        actuators.heater_on();
        log::info!("heater switched on (target {:.1} C)", ctx.settings.target_temp_c);
    }
}

fn edit_pid_field(ctx: &mut AppContext, cycle: &mut ControlCycle, field: PidField, delta: i16) {
    let pid = &mut ctx.settings.pid;
    match field {
        PidField::Kp => pid.kp = adjust(pid.kp, delta, 0.1, MIN_PID_GAIN, MAX_PID_GAIN),
        PidField::Ti => pid.ti = adjust(pid.ti, delta, 0.1, MIN_PID_GAIN, MAX_PID_GAIN),
        PidField::Td => pid.td = adjust(pid.td, delta, 0.01, MIN_PID_GAIN, MAX_PID_GAIN),
        PidField::IClamp => {
            pid.i_clamp = adjust(pid.i_clamp, delta, 0.01, MIN_PID_I_CLAMP, MAX_PID_I_CLAMP)
        }
        PidField::Offset => {
            pid.offset = adjust(pid.offset, delta, 0.1, MIN_PID_OFFSET, MAX_PID_OFFSET)
        }
        PidField::Smoothing => {
            pid.d_smoothing = adjust(
                pid.d_smoothing,
                delta,
                0.01,
                MIN_PID_SMOOTHING,
                MAX_PID_SMOOTHING,
            )
        }
    }
    cycle.apply_pid_settings(&ctx.config, &ctx.settings.pid);
    ctx.settings_dirty = true;
}

fn pid_field_value(ctx: &AppContext, field: PidField) -> f32 {
    let pid = &ctx.settings.pid;
    match field {
        PidField::Kp => pid.kp,
        PidField::Ti => pid.ti,
        PidField::Td => pid.td,
        PidField::IClamp => pid.i_clamp,
        PidField::Offset => pid.offset,
        PidField::Smoothing => pid.d_smoothing,
    }
}

fn root_label(item: RootItem) -> &'static str {
    match item {
        RootItem::Heater => "HEAt",
        RootItem::TargetTemp => "SEt",
        RootItem::ControllingProbe => "Prob",
        RootItem::PidParams => "PId",
        RootItem::StirrerDuty => "StIr",
        RootItem::FanDuty => "FAn",
        RootItem::ProbeCalib => "CAL",
    }
}

fn pid_label(field: PidField) -> &'static str {
    match field {
        PidField::Kp => "P",
        PidField::Ti => "I",
        PidField::Td => "d",
        PidField::IClamp => "CLP",
        PidField::Offset => "OFS",
        PidField::Smoothing => "FIL",
    }
}
