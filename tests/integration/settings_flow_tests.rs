//! Operator settings flow: menu edits travelling through the settings
//! store the same way the UI task persists them.

use crate::mock_hw::{MockHardware, RecordingDisplay};
use etchbath::adapters::settings::SettingsStore;
use etchbath::app::context::{AppContext, InputFrame};
use etchbath::app::control_loop::ControlCycle;
use etchbath::app::ports::SettingsPort;
use etchbath::config::{Settings, SystemConfig};
use etchbath::ui::menu::Menu;

struct UiRig {
    menu: Menu,
    ctx: AppContext,
    cycle: ControlCycle,
    hw: MockHardware,
    display: RecordingDisplay,
    store: SettingsStore,
}

impl UiRig {
    fn new() -> Self {
        let config = SystemConfig::default();
        let settings = Settings::default();
        Self {
            menu: Menu::new(),
            cycle: ControlCycle::new(&config, &settings),
            ctx: AppContext::new(config.clone(), settings),
            hw: MockHardware::new(),
            display: RecordingDisplay::default(),
            store: SettingsStore::new(&config).unwrap(),
        }
    }

    fn tick(&mut self, input: InputFrame) {
        self.ctx.input = input;
        self.menu
            .tick(&mut self.ctx, &mut self.cycle, &mut self.hw, &mut self.display);
        // Same persist rule as the firmware's UI task.
        if self.ctx.settings_dirty && self.menu.is_at_main() {
            self.store.store(&self.ctx.settings).unwrap();
            self.ctx.settings_dirty = false;
        }
    }

    fn press(&mut self) {
        self.tick(InputFrame {
            pressed: true,
            ..InputFrame::default()
        });
    }

    fn long_press(&mut self) {
        self.tick(InputFrame {
            long_pressed: true,
            ..InputFrame::default()
        });
    }

    fn turn(&mut self, detents: i16) {
        self.tick(InputFrame {
            encoder_delta: detents,
            ..InputFrame::default()
        });
    }
}

#[test]
fn defaults_round_trip_through_store() {
    let config = SystemConfig::default();
    let mut store = SettingsStore::new(&config).unwrap();
    let settings = Settings::default();
    store.store(&settings).unwrap();
    assert_eq!(store.load().unwrap(), settings);
}

#[test]
fn target_temp_edit_persists_on_return_to_main() {
    let mut rig = UiRig::new();

    rig.press(); // root menu
    rig.turn(1); // target temp entry
    rig.press(); // editor
    rig.turn(50); // 25.0 -> 30.0
    assert!(rig.ctx.settings_dirty);

    rig.press(); // back to root
    // Still in the menu: nothing persisted yet.
    assert_eq!(
        rig.store.load().unwrap_err(),
        etchbath::error::SettingsError::NotFound
    );

    rig.long_press(); // back to main -> persist
    assert!(!rig.ctx.settings_dirty);
    let stored = rig.store.load().unwrap();
    assert!((stored.target_temp_c - 30.0).abs() < 1e-4);
}

#[test]
fn pid_edit_persists_and_survives_reload() {
    let mut rig = UiRig::new();

    rig.press(); // root
    rig.turn(3); // PID entry
    rig.press(); // field selection (Kp)
    rig.press(); // edit Kp
    rig.turn(10); // 1.0 -> 2.0
    rig.long_press(); // straight back to root
    rig.long_press(); // main -> persist

    let stored = rig.store.load().unwrap();
    assert!((stored.pid.kp - 2.0).abs() < 1e-4);
    // Untouched fields keep their defaults.
    assert!((stored.pid.ti - 30.0).abs() < 1e-4);
}

#[test]
fn unedited_session_stores_nothing() {
    let mut rig = UiRig::new();
    rig.press();
    rig.turn(3);
    rig.long_press();
    assert_eq!(
        rig.store.load().unwrap_err(),
        etchbath::error::SettingsError::NotFound
    );
}
