//! Collaborator interfaces and their in-process implementations.
//!
//! The decision core never touches hardware directly. Everything it reads or
//! commands goes through one of the traits below, injected at construction.
//! Hardware-facing methods are infallible: a sensor that fails to read reports
//! its last known value, an actuator that fails to write is its own concern.

pub mod actuator; // PWM floodlight with fading
pub mod ambient; // Lux threshold night detection
pub mod event_log; // Circular on/off event history
pub mod imu; // Scripted inertial sample source
pub mod store; // In-memory configuration store

use anyhow::Result;
use std::cell::RefCell;
use std::rc::Rc;

use crate::decision::{DecisionConfig, LightEvent};
use crate::motion::MotionSample;

pub use actuator::Lamp;
pub use ambient::LuxThreshold;
pub use event_log::{EventLog, LogEntry};
pub use imu::ScriptedImu;
pub use store::MemoryConfigStore;

/// Day/night state derived from a light sensor.
#[cfg_attr(test, mockall::automock)]
pub trait AmbientLight {
    fn is_night(&self) -> bool;

    /// Most recent lux reading; used only to annotate events.
    fn last_lux(&self) -> f32;
}

/// The floodlight output.
#[cfg_attr(test, mockall::automock)]
pub trait Actuator {
    fn turn_on(&mut self, brightness: u8);
    fn turn_off(&mut self);
    fn is_on(&self) -> bool;

    /// Ramp to `target` over `duration_ms`. Not used by automatic control.
    fn fade_to(&mut self, target: u8, duration_ms: u32);
}

/// Pull-based raw inertial sample source.
#[cfg_attr(test, mockall::automock)]
pub trait ImuSource {
    fn read(&mut self) -> MotionSample;
}

/// Persistence of the decision configuration.
pub trait ConfigStore {
    fn load(&self) -> Result<DecisionConfig>;
    fn save(&mut self, config: &DecisionConfig) -> Result<()>;

    /// Brightness to use when the light comes on; read at every activation.
    fn brightness(&self) -> u8;
}

/// Fire-and-forget sink for light on/off events.
#[cfg_attr(test, mockall::automock)]
pub trait EventSink {
    fn log_event(&mut self, event: LightEvent);
}

// Shared handles, so a harness can keep inspecting a collaborator it handed
// to the engine.

impl<T: AmbientLight + ?Sized> AmbientLight for Rc<RefCell<T>> {
    fn is_night(&self) -> bool {
        self.borrow().is_night()
    }

    fn last_lux(&self) -> f32 {
        self.borrow().last_lux()
    }
}

impl<T: Actuator + ?Sized> Actuator for Rc<RefCell<T>> {
    fn turn_on(&mut self, brightness: u8) {
        self.borrow_mut().turn_on(brightness);
    }

    fn turn_off(&mut self) {
        self.borrow_mut().turn_off();
    }

    fn is_on(&self) -> bool {
        self.borrow().is_on()
    }

    fn fade_to(&mut self, target: u8, duration_ms: u32) {
        self.borrow_mut().fade_to(target, duration_ms);
    }
}

impl<T: ImuSource + ?Sized> ImuSource for Rc<RefCell<T>> {
    fn read(&mut self) -> MotionSample {
        self.borrow_mut().read()
    }
}

impl<T: ConfigStore + ?Sized> ConfigStore for Rc<RefCell<T>> {
    fn load(&self) -> Result<DecisionConfig> {
        self.borrow().load()
    }

    fn save(&mut self, config: &DecisionConfig) -> Result<()> {
        self.borrow_mut().save(config)
    }

    fn brightness(&self) -> u8 {
        self.borrow().brightness()
    }
}

impl<T: EventSink + ?Sized> EventSink for Rc<RefCell<T>> {
    fn log_event(&mut self, event: LightEvent) {
        self.borrow_mut().log_event(event);
    }
}
