//! In-memory sources and sinks for driving the host loop in tests and
//! benchmarks.

use crate::command::CanCommand;
use crate::config::OnePedalTuning;
use crate::runner::CycleInput;
use actuate_traits::{BoxError, InputSource, Transport, TuningSource};
use std::collections::VecDeque;

/// Replays a fixed list of inputs, then reports exhaustion.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    inputs: VecDeque<CycleInput>,
}

impl ScriptedSource {
    pub fn new(inputs: impl IntoIterator<Item = CycleInput>) -> Self {
        Self {
            inputs: inputs.into_iter().collect(),
        }
    }

    /// The same input `n` times.
    pub fn repeat(input: CycleInput, n: usize) -> Self {
        Self::new(std::iter::repeat_n(input, n))
    }

    pub fn remaining(&self) -> usize {
        self.inputs.len()
    }
}

impl InputSource<CycleInput> for ScriptedSource {
    fn next_input(&mut self, _cycle: u64) -> Result<Option<CycleInput>, BoxError> {
        Ok(self.inputs.pop_front())
    }
}

/// Keeps every batch handed to `send`, one entry per cycle.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    batches: Vec<Vec<CanCommand>>,
}

impl RecordingTransport {
    pub fn batches(&self) -> &[Vec<CanCommand>] {
        &self.batches
    }

    /// All frames in send order.
    pub fn frames(&self) -> impl Iterator<Item = &CanCommand> {
        self.batches.iter().flatten()
    }
}

impl Transport<CanCommand> for RecordingTransport {
    fn send(&mut self, frames: &[CanCommand]) -> Result<(), BoxError> {
        self.batches.push(frames.to_vec());
        Ok(())
    }
}

/// A transport whose bus is always down.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeadTransport;

impl Transport<CanCommand> for DeadTransport {
    fn send(&mut self, _frames: &[CanCommand]) -> Result<(), BoxError> {
        Err(Box::new(std::io::Error::other("bus off")))
    }
}

/// Hands out one queued tuning per poll, then `None`.
#[derive(Debug, Default)]
pub struct QueuedTuning {
    queue: VecDeque<OnePedalTuning>,
}

impl QueuedTuning {
    pub fn new(items: impl IntoIterator<Item = OnePedalTuning>) -> Self {
        Self {
            queue: items.into_iter().collect(),
        }
    }
}

impl TuningSource<OnePedalTuning> for QueuedTuning {
    fn poll(&mut self) -> Result<Option<OnePedalTuning>, BoxError> {
        Ok(self.queue.pop_front())
    }
}
