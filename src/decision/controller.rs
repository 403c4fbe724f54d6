//! One-poll-per-cycle wiring of sensors and the decision engine.

use anyhow::Result;

use super::{DecisionEngine, Readings};
use crate::io::AmbientLight;
use crate::motion::{MotionBaseline, MotionClassifier};

/// Owns the classifier, the ambient light source and the engine.
pub struct Controller {
    classifier: MotionClassifier,
    ambient: Box<dyn AmbientLight>,
    engine: DecisionEngine,
}

impl Controller {
    pub fn new(
        classifier: MotionClassifier,
        ambient: Box<dyn AmbientLight>,
        engine: DecisionEngine,
    ) -> Self {
        Self {
            classifier,
            ambient,
            engine,
        }
    }

    /// Settle, calibrate the motion sensor and initialize the engine.
    pub fn boot(&mut self, calibration_samples: u32) -> Result<MotionBaseline> {
        let baseline = self.classifier.settle_and_calibrate(calibration_samples)?;
        self.engine.initialize();
        Ok(baseline)
    }

    /// Recalibrate the motion sensor.
    pub fn calibrate(&mut self, samples: u32) -> Result<MotionBaseline> {
        self.classifier.calibrate(samples)
    }

    /// Sample motion, snapshot the sensors and run one decision cycle.
    pub fn poll(&mut self) -> Readings {
        let moving = self.classifier.detect_motion();
        let readings = Readings {
            is_night: self.ambient.is_night(),
            lux: self.ambient.last_lux(),
            moving,
        };
        self.engine.cycle(&readings);
        readings
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut DecisionEngine {
        &mut self.engine
    }

    pub fn classifier(&self) -> &MotionClassifier {
        &self.classifier
    }

    pub fn classifier_mut(&mut self) -> &mut MotionClassifier {
        &mut self.classifier
    }
}
