//! Simulated vehicle bus: latches frames into the plant and counts traffic.

use crate::SharedPlant;
use crate::error::SimError;
use actuate_core::command::CanCommand;
use actuate_traits::{BoxError, Transport};
use std::collections::BTreeMap;

pub struct SimBus {
    plant: SharedPlant,
    frames: u64,
    by_name: BTreeMap<&'static str, u64>,
    fail_after: Option<u64>,
}

impl SimBus {
    pub fn new(plant: SharedPlant) -> Self {
        Self {
            plant,
            frames: 0,
            by_name: BTreeMap::new(),
            fail_after: None,
        }
    }

    /// Go bus-off once `frames` frames have been accepted.
    pub fn with_fail_after(mut self, frames: u64) -> Self {
        self.fail_after = Some(frames);
        self
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames accepted per message name.
    pub fn counts(&self) -> &BTreeMap<&'static str, u64> {
        &self.by_name
    }
}

impl Transport<CanCommand> for SimBus {
    fn send(&mut self, frames: &[CanCommand]) -> Result<(), BoxError> {
        if let Some(limit) = self.fail_after
            && self.frames + frames.len() as u64 > limit
        {
            tracing::warn!(frames = self.frames, "simulated bus off");
            return Err(Box::new(SimError::BusOff {
                frames: self.frames,
            }));
        }
        let mut plant = self.plant.try_borrow_mut().map_err(|_| SimError::Busy)?;
        for f in frames {
            plant.apply(f);
            *self.by_name.entry(f.message.name()).or_default() += 1;
        }
        self.frames += frames.len() as u64;
        Ok(())
    }
}
