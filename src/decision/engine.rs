use anyhow::{Context, Result};

use super::{
    Action, ControlMode, DecisionConfig, DecisionState, LightEvent, Readings, WindowCheck, step,
};
use crate::io::{Actuator, ConfigStore, EventSink};
use crate::time_source::{Clock, elapsed_ms};

/// Drives the floodlight from sensor readings and manual commands.
///
/// Every collaborator is injected, so the engine itself performs no I/O and
/// none of its operations fail. Configuration is held as a plain value and
/// only touches the store on construction, [`reload`](Self::reload) and
/// [`save`](Self::save).
pub struct DecisionEngine {
    config: DecisionConfig,
    state: DecisionState,
    /// Set by force/fade commands; holds the mode they were issued under.
    manual_override: Option<ControlMode>,
    last_readings: Readings,
    clock_lost: bool,
    clock: Box<dyn Clock>,
    actuator: Box<dyn Actuator>,
    store: Box<dyn ConfigStore>,
    events: Box<dyn EventSink>,
}

impl DecisionEngine {
    /// Build an engine with the configuration currently in `store`.
    ///
    /// A store that cannot be read yields the defaults.
    pub fn new(
        clock: Box<dyn Clock>,
        actuator: Box<dyn Actuator>,
        store: Box<dyn ConfigStore>,
        events: Box<dyn EventSink>,
    ) -> Self {
        let config = match store.load() {
            Ok(config) => config,
            Err(e) => {
                log_warning!("Could not load decision settings, using defaults: {e:#}");
                DecisionConfig::default()
            }
        };
        Self::with_config(config, clock, actuator, store, events)
    }

    /// Build an engine with an explicit configuration.
    pub fn with_config(
        config: DecisionConfig,
        clock: Box<dyn Clock>,
        actuator: Box<dyn Actuator>,
        store: Box<dyn ConfigStore>,
        events: Box<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            state: DecisionState::Off,
            manual_override: None,
            last_readings: Readings::default(),
            clock_lost: false,
            clock,
            actuator,
            store,
            events,
        }
    }

    /// Reset to `OFF` with the light off and any override cleared.
    ///
    /// The configuration, `auto_mode` included, is left as loaded.
    pub fn initialize(&mut self) {
        self.state = DecisionState::Off;
        self.manual_override = None;
        self.actuator.turn_off();

        log_block_start!("Decision engine ready");
        log_indented!("Shutoff delay: {} ms", self.config.shutoff_delay_ms);
        if self.config.time_window_enabled {
            log_indented!(
                "Time window: {:02}:00-{:02}:00{}",
                self.config.time_window_start,
                self.config.time_window_end,
                if self.config.time_window_invert {
                    " (inverted)"
                } else {
                    ""
                }
            );
        }
    }

    /// Run one cycle of automatic control against `readings`.
    ///
    /// Does nothing while a manual override is active or automatic mode is off.
    pub fn cycle(&mut self, readings: &Readings) {
        self.last_readings = *readings;
        if self.manual_override.is_some() || !self.config.auto_mode {
            return;
        }

        let activate = self.should_activate(readings);
        let now = self.clock.now_millis();
        let (next, action) = step(self.state, activate, now, self.config.shutoff_delay_ms);
        if let Some(action) = action {
            log_decorated!("State: {} -> {}", self.state.name(), next.name());
            self.state = next;
            self.apply(action);
        }
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::SwitchOn => {
                let was_on = self.actuator.is_on();
                let brightness = self.store.brightness();
                self.actuator.turn_on(brightness);
                if !was_on {
                    self.emit(true, ControlMode::Auto);
                }
            }
            Action::SwitchOff => {
                let was_on = self.actuator.is_on();
                self.actuator.turn_off();
                if was_on {
                    self.emit(false, ControlMode::Auto);
                }
            }
            Action::StartCountdown => {
                log_indented!("Switching off in {} ms", self.config.shutoff_delay_ms);
            }
        }
    }

    fn emit(&mut self, on: bool, mode: ControlMode) {
        self.events.log_event(LightEvent {
            on,
            lux: self.last_readings.lux,
            moving: self.last_readings.moving,
            mode,
        });
    }

    /// Activation predicate: night, moving and inside the time window, each
    /// sensor term forced true by its bypass.
    pub fn should_activate(&mut self, readings: &Readings) -> bool {
        let night_ok = self.config.light_sensor_bypass || readings.is_night;
        let moving_ok = self.config.movement_bypass || readings.moving;
        night_ok && moving_ok && self.is_within_time_window()
    }

    /// Whether the time window currently permits activation.
    ///
    /// Without wall-clock time the window is treated as open; the loss and
    /// the recovery are each logged once.
    pub fn is_within_time_window(&mut self) -> bool {
        let check = self.time_window_check();
        let lost = check == WindowCheck::ClockUnavailable;
        if lost != self.clock_lost {
            if lost {
                log_warning!("Wall-clock time unavailable, ignoring the time window");
            } else {
                log_info!("Wall-clock time available again");
            }
            self.clock_lost = lost;
        }
        check.permits()
    }

    /// Evaluate the time window without side effects.
    pub fn time_window_check(&self) -> WindowCheck {
        let window = self.config.time_window();
        if !window.enabled {
            return WindowCheck::Disabled;
        }
        window.check(self.clock.current_hour())
    }

    // # Manual overrides

    /// Switch the light on at `brightness` and suspend automatic control.
    ///
    /// Brightness 0 is the same as [`force_off`](Self::force_off).
    pub fn force_on(&mut self, brightness: u8) {
        if brightness == 0 {
            self.force_off();
            return;
        }
        let was_on = self.actuator.is_on();
        self.manual_override = Some(ControlMode::On);
        self.actuator.turn_on(brightness);
        log_block_start!("Manual override: light on at brightness {brightness}");
        if was_on != self.actuator.is_on() {
            self.emit(self.actuator.is_on(), ControlMode::On);
        }
    }

    /// Switch the light off and suspend automatic control.
    pub fn force_off(&mut self) {
        let was_on = self.actuator.is_on();
        self.manual_override = Some(ControlMode::Off);
        self.actuator.turn_off();
        log_block_start!("Manual override: light off");
        if was_on {
            self.emit(false, ControlMode::Off);
        }
    }

    /// Fade to `target` over `duration_ms` and suspend automatic control.
    pub fn manual_fade(&mut self, target: u8, duration_ms: u32) {
        let was_on = self.actuator.is_on();
        self.manual_override = Some(ControlMode::Manual);
        self.actuator.fade_to(target, duration_ms);
        log_block_start!("Manual override: fading to {target} over {duration_ms} ms");
        if was_on != self.actuator.is_on() {
            self.emit(self.actuator.is_on(), ControlMode::Manual);
        }
    }

    /// Resume automatic control from `OFF` with the light off.
    pub fn return_to_auto(&mut self) {
        let was_on = self.actuator.is_on();
        self.manual_override = None;
        self.state = DecisionState::Off;
        self.actuator.turn_off();
        log_block_start!("Returning to automatic control");
        if was_on {
            self.emit(false, ControlMode::Auto);
        }
    }

    // # Settings

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    /// Replace the whole configuration. The current state is kept.
    pub fn set_config(&mut self, config: DecisionConfig) {
        self.config = config;
    }

    pub fn set_auto_mode(&mut self, enabled: bool) {
        if self.config.auto_mode != enabled {
            log_decorated!(
                "Automatic mode {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
        self.config.auto_mode = enabled;
    }

    pub fn set_shutoff_delay_ms(&mut self, delay_ms: u32) {
        self.config.shutoff_delay_ms = delay_ms;
    }

    pub fn set_light_sensor_bypass(&mut self, bypass: bool) {
        self.config.light_sensor_bypass = bypass;
    }

    pub fn set_movement_bypass(&mut self, bypass: bool) {
        self.config.movement_bypass = bypass;
    }

    pub fn set_time_window(&mut self, enabled: bool, start: u8, end: u8, invert: bool) {
        self.config.time_window_enabled = enabled;
        self.config.time_window_start = start;
        self.config.time_window_end = end;
        self.config.time_window_invert = invert;
    }

    /// Re-read the configuration from the store.
    pub fn reload(&mut self) -> Result<()> {
        self.config = self
            .store
            .load()
            .context("Failed to reload decision settings")?;
        log_decorated!("Decision settings reloaded");
        Ok(())
    }

    /// Persist the current configuration to the store.
    pub fn save(&mut self) -> Result<()> {
        self.store
            .save(&self.config)
            .context("Failed to save decision settings")?;
        log_decorated!("Decision settings saved");
        Ok(())
    }

    // # Diagnostics

    pub fn state(&self) -> DecisionState {
        self.state
    }

    pub fn state_name(&self) -> &'static str {
        self.state.name()
    }

    pub fn is_in_countdown(&self) -> bool {
        matches!(self.state, DecisionState::Countdown { .. })
    }

    /// Time left before the light switches off, 0 outside `COUNTDOWN`.
    pub fn countdown_remaining_ms(&self) -> u32 {
        match self.state {
            DecisionState::Countdown { since } => {
                let elapsed = elapsed_ms(self.clock.now_millis(), since);
                self.config.shutoff_delay_ms.saturating_sub(elapsed)
            }
            _ => 0,
        }
    }

    pub fn is_manual_override(&self) -> bool {
        self.manual_override.is_some()
    }

    /// `"auto"` under automatic control, otherwise the override's mode or the
    /// light's on/off state.
    pub fn led_mode(&self) -> &'static str {
        match self.manual_override {
            Some(mode) => mode.as_str(),
            None if self.config.auto_mode => ControlMode::Auto.as_str(),
            None if self.actuator.is_on() => ControlMode::On.as_str(),
            None => ControlMode::Off.as_str(),
        }
    }

    pub fn is_light_on(&self) -> bool {
        self.actuator.is_on()
    }

    /// Readings from the most recent cycle.
    pub fn last_readings(&self) -> Readings {
        self.last_readings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::test_constants::*;
    use crate::io::{EventLog, Lamp, MemoryConfigStore, MockActuator};
    use crate::logger::Log;
    use crate::time_source::SimulatedClock;
    use std::cell::RefCell;
    use std::rc::Rc;

    const ACTIVE: Readings = Readings {
        is_night: true,
        lux: 2.0,
        moving: true,
    };
    const IDLE: Readings = Readings {
        is_night: true,
        lux: 2.0,
        moving: false,
    };

    struct Harness {
        engine: DecisionEngine,
        clock: SimulatedClock,
        lamp: Rc<RefCell<Lamp>>,
        store: Rc<RefCell<MemoryConfigStore>>,
        log: Rc<RefCell<EventLog>>,
    }

    fn harness() -> Harness {
        Log::set_enabled(false);
        let clock = SimulatedClock::with_hour(0, 23);
        let lamp = Rc::new(RefCell::new(Lamp::new()));
        let config = DecisionConfig {
            shutoff_delay_ms: TEST_SHUTOFF_DELAY_MS,
            ..DecisionConfig::default()
        };
        let store = Rc::new(RefCell::new(MemoryConfigStore::new(config, TEST_BRIGHTNESS)));
        let log = Rc::new(RefCell::new(EventLog::new(Box::new(clock.clone()), 0)));
        let mut engine = DecisionEngine::new(
            Box::new(clock.clone()),
            Box::new(lamp.clone()),
            Box::new(store.clone()),
            Box::new(log.clone()),
        );
        engine.initialize();
        Harness {
            engine,
            clock,
            lamp,
            store,
            log,
        }
    }

    #[test]
    fn test_activation_uses_configured_brightness() {
        let mut h = harness();
        h.engine.cycle(&ACTIVE);
        assert_eq!(h.engine.state(), DecisionState::On);
        assert_eq!(h.lamp.borrow().brightness(), TEST_BRIGHTNESS);

        let event = h.log.borrow().get(0).cloned().unwrap();
        assert!(event.on);
        assert_eq!(event.mode, "auto");
        assert_eq!(event.lux, 2.0);
    }

    #[test]
    fn test_brightness_read_fresh_on_each_activation() {
        let mut h = harness();
        h.engine.cycle(&ACTIVE);
        h.engine.force_off();
        h.engine.return_to_auto();
        h.store.borrow_mut().set_brightness(40);
        h.engine.cycle(&ACTIVE);
        assert_eq!(h.lamp.borrow().brightness(), 40);
    }

    #[test]
    fn test_countdown_then_off() {
        let mut h = harness();
        h.engine.cycle(&ACTIVE);
        h.engine.cycle(&IDLE);
        assert!(h.engine.is_in_countdown());
        assert!(h.lamp.borrow().is_on());
        assert_eq!(h.engine.countdown_remaining_ms(), TEST_SHUTOFF_DELAY_MS);

        h.clock.advance(400);
        h.engine.cycle(&IDLE);
        assert_eq!(h.engine.countdown_remaining_ms(), TEST_SHUTOFF_DELAY_MS - 400);

        h.clock.advance(TEST_SHUTOFF_DELAY_MS);
        h.engine.cycle(&IDLE);
        assert_eq!(h.engine.state_name(), "OFF");
        assert!(!h.lamp.borrow().is_on());
        assert_eq!(h.engine.countdown_remaining_ms(), 0);
        assert_eq!(h.log.borrow().len(), 2);
    }

    #[test]
    fn test_countdown_cancel_emits_nothing() {
        let mut h = harness();
        h.engine.cycle(&ACTIVE);
        h.engine.cycle(&IDLE);
        h.clock.advance(500);
        h.engine.cycle(&ACTIVE);
        assert_eq!(h.engine.state(), DecisionState::On);
        assert_eq!(h.log.borrow().len(), 1);
    }

    #[test]
    fn test_bypasses_force_terms_true() {
        let mut h = harness();
        h.engine.set_light_sensor_bypass(true);
        h.engine.set_movement_bypass(true);
        h.engine.cycle(&Readings::default());
        assert_eq!(h.engine.state(), DecisionState::On);
    }

    #[test]
    fn test_time_window_blocks_activation() {
        let mut h = harness();
        h.engine.set_time_window(true, 22, 6, false);
        h.clock.set_hour(10);
        h.engine.cycle(&ACTIVE);
        assert_eq!(h.engine.state(), DecisionState::Off);

        h.clock.set_hour(23);
        h.engine.cycle(&ACTIVE);
        assert_eq!(h.engine.state(), DecisionState::On);
    }

    #[test]
    fn test_missing_clock_fails_open() {
        let mut h = harness();
        h.engine.set_time_window(true, 22, 6, true);
        h.clock.clear_wall_clock();
        assert_eq!(h.engine.time_window_check(), WindowCheck::ClockUnavailable);
        assert!(h.engine.is_within_time_window());
        h.engine.cycle(&ACTIVE);
        assert_eq!(h.engine.state(), DecisionState::On);
    }

    #[test]
    fn test_disabled_auto_mode_skips_cycles() {
        let mut h = harness();
        h.engine.set_auto_mode(false);
        h.engine.cycle(&ACTIVE);
        assert_eq!(h.engine.state(), DecisionState::Off);
        assert_eq!(h.engine.led_mode(), "off");
    }

    #[test]
    fn test_force_on_emits_once() {
        let mut h = harness();
        h.engine.force_on(100);
        h.engine.force_on(120);
        assert!(h.engine.is_manual_override());
        assert_eq!(h.engine.led_mode(), "on");
        assert_eq!(h.lamp.borrow().brightness(), 120);
        assert_eq!(h.log.borrow().len(), 1);
        assert_eq!(h.log.borrow().get(0).unwrap().mode, "on");
    }

    #[test]
    fn test_force_on_zero_acts_as_force_off() {
        let mut h = harness();
        h.engine.force_on(200);
        h.engine.force_on(0);
        assert!(!h.lamp.borrow().is_on());
        assert_eq!(h.engine.led_mode(), "off");

        let event = h.log.borrow().get(0).cloned().unwrap();
        assert!(!event.on);
        assert_eq!(event.mode, "off");
    }

    #[test]
    fn test_initialize_keeps_stored_auto_mode() {
        Log::set_enabled(false);
        let clock = SimulatedClock::with_hour(0, 23);
        let lamp = Rc::new(RefCell::new(Lamp::new()));
        let config = DecisionConfig {
            auto_mode: false,
            light_sensor_bypass: true,
            movement_bypass: true,
            ..DecisionConfig::default()
        };
        let store = Rc::new(RefCell::new(MemoryConfigStore::new(config, TEST_BRIGHTNESS)));
        let mut engine = DecisionEngine::new(
            Box::new(clock.clone()),
            Box::new(lamp.clone()),
            Box::new(store.clone()),
            Box::new(EventLog::new(Box::new(clock), 0)),
        );
        engine.initialize();
        assert!(!engine.config().auto_mode);

        engine.cycle(&ACTIVE);
        assert_eq!(engine.state(), DecisionState::Off);
        assert!(!lamp.borrow().is_on());

        engine.save().unwrap();
        assert!(!store.borrow().config().auto_mode);
    }

    #[test]
    fn test_force_off_when_already_off_is_silent() {
        let mut h = harness();
        h.engine.force_off();
        assert!(h.log.borrow().is_empty());
        assert_eq!(h.engine.led_mode(), "off");
    }

    #[test]
    fn test_return_to_auto_resets_to_off() {
        let mut h = harness();
        h.engine.force_on(255);
        h.engine.return_to_auto();
        assert!(!h.engine.is_manual_override());
        assert_eq!(h.engine.state(), DecisionState::Off);
        assert!(!h.lamp.borrow().is_on());
        assert_eq!(h.engine.led_mode(), "auto");

        let event = h.log.borrow().get(0).cloned().unwrap();
        assert!(!event.on);
        assert_eq!(event.mode, "auto");
    }

    #[test]
    fn test_manual_fade_tagged_manual() {
        let mut h = harness();
        h.engine.manual_fade(180, 0);
        assert_eq!(h.lamp.borrow().brightness(), 180);
        assert_eq!(h.engine.led_mode(), "manual");
        assert_eq!(h.log.borrow().get(0).unwrap().mode, "manual");
    }

    #[test]
    fn test_no_actuator_commands_under_override() {
        Log::set_enabled(false);
        let mut lamp = MockActuator::new();
        lamp.expect_turn_off().times(2).return_const(());
        lamp.expect_is_on().return_const(false);
        lamp.expect_turn_on().never();
        lamp.expect_fade_to().never();

        let clock = SimulatedClock::with_hour(0, 23);
        let mut engine = DecisionEngine::new(
            Box::new(clock.clone()),
            Box::new(lamp),
            Box::new(MemoryConfigStore::default()),
            Box::new(EventLog::new(Box::new(clock.clone()), 0)),
        );
        engine.initialize();
        engine.force_off();
        for _ in 0..10 {
            engine.cycle(&ACTIVE);
            clock.advance(100);
        }
        assert_eq!(engine.state(), DecisionState::Off);
    }

    #[test]
    fn test_reload_and_save_round_through_store() {
        let mut h = harness();
        h.engine.set_shutoff_delay_ms(5_000);
        h.engine.save().unwrap();
        assert_eq!(h.store.borrow().config().shutoff_delay_ms, 5_000);

        let mut changed = h.store.borrow().config().clone();
        changed.movement_bypass = true;
        h.store.borrow_mut().set_config(changed);
        h.engine.reload().unwrap();
        assert!(h.engine.config().movement_bypass);
    }

    struct FailingStore;

    impl ConfigStore for FailingStore {
        fn load(&self) -> Result<DecisionConfig> {
            anyhow::bail!("storage offline")
        }

        fn save(&mut self, _config: &DecisionConfig) -> Result<()> {
            anyhow::bail!("storage offline")
        }

        fn brightness(&self) -> u8 {
            255
        }
    }

    #[test]
    fn test_unreadable_store_falls_back_to_defaults() {
        Log::set_enabled(false);
        let clock = SimulatedClock::new(0);
        let mut engine = DecisionEngine::new(
            Box::new(clock.clone()),
            Box::new(Lamp::new()),
            Box::new(FailingStore),
            Box::new(EventLog::new(Box::new(clock), 0)),
        );
        assert_eq!(engine.config(), &DecisionConfig::default());
        assert!(engine.reload().is_err());
        assert!(engine.save().is_err());
    }
}
