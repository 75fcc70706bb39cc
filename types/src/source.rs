//! Random source for fallback venue codes.

use rand::Rng;

/// Smallest value drawn for a random code (the lowest 5-digit number).
pub const RANDOM_CODE_MIN: u32 = 10_000;
/// Largest value drawn for a random code (the highest 5-digit number).
pub const RANDOM_CODE_MAX: u32 = 99_999;

/// Draws the numeric value behind a random venue code.
///
/// Implementations return a value in `RANDOM_CODE_MIN..=RANDOM_CODE_MAX`.
pub trait CodeSource: Send + Sync {
    fn draw(&self) -> u32;
}

/// Uniform draws from the thread-local RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRngSource;

impl CodeSource for ThreadRngSource {
    fn draw(&self) -> u32 {
        rand::thread_rng().gen_range(RANDOM_CODE_MIN..=RANDOM_CODE_MAX)
    }
}
