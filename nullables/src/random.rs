//! Nullable random: deterministic code draws.

use std::sync::Mutex;
use venue_types::CodeSource;

/// A deterministic code source for testing.
///
/// Returns pre-configured values in order, wrapping around at the end.
pub struct NullRandom {
    outputs: Vec<u32>,
    index: Mutex<usize>,
}

impl NullRandom {
    /// Create with a sequence of deterministic draws.
    ///
    /// # Panics
    /// Panics if `outputs` is empty.
    pub fn new(outputs: Vec<u32>) -> Self {
        assert!(!outputs.is_empty(), "NullRandom needs at least one output");
        Self {
            outputs,
            index: Mutex::new(0),
        }
    }

    /// Create with a single value that will be returned for every call.
    pub fn constant(value: u32) -> Self {
        Self::new(vec![value])
    }
}

impl CodeSource for NullRandom {
    fn draw(&self) -> u32 {
        let mut idx = self.index.lock().unwrap();
        let current = self.outputs[*idx % self.outputs.len()];
        *idx += 1;
        current
    }
}
