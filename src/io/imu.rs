//! Replayable inertial sample source.

use std::collections::VecDeque;

use super::ImuSource;
use crate::motion::MotionSample;

/// Serves queued samples first, then repeats a held sample indefinitely.
#[derive(Debug, Clone, Default)]
pub struct ScriptedImu {
    queue: VecDeque<MotionSample>,
    hold: MotionSample,
    reads: u64,
}

impl ScriptedImu {
    /// Source that reports `hold` on every read.
    pub fn holding(hold: MotionSample) -> Self {
        Self {
            hold,
            ..Self::default()
        }
    }

    /// Source of a platform at rest.
    pub fn at_rest() -> Self {
        Self::holding(MotionSample::at_rest())
    }

    /// Queue samples to be returned before the held sample.
    pub fn push<I: IntoIterator<Item = MotionSample>>(&mut self, samples: I) {
        self.queue.extend(samples);
    }

    /// Replace the held sample; queued samples are still served first.
    pub fn set_hold(&mut self, sample: MotionSample) {
        self.hold = sample;
    }

    pub fn reads(&self) -> u64 {
        self.reads
    }
}

impl ImuSource for ScriptedImu {
    fn read(&mut self) -> MotionSample {
        self.reads += 1;
        self.queue.pop_front().unwrap_or(self.hold)
    }
}
