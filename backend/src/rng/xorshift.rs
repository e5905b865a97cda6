//! xorshift64* random number generator
//!
//! This is a fast PRNG that is deterministic and suitable for simulation
//! purposes. Besides raw draws it provides the two distributions the shock
//! model consumes:
//! - uniform index draws (selection of damaged firms)
//! - Poisson draws (per-firm inventory replenishment horizons)
//!
//! # Determinism
//!
//! Same seed → same sequence of random numbers. Trials are compared across
//! runs and machines, so nothing here may depend on platform state.

use serde::{Deserialize, Serialize};

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use disaster_simulator_core_rs::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let value = rng.next();
/// let firm_slot = rng.index(10); // [0, 10)
/// assert!(firm_slot < 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngManager {
    /// Internal state (64-bit)
    state: u64,
}

impl RngManager {
    /// Create a new RNG with given seed
    ///
    /// A zero seed is replaced by 1 (xorshift cannot leave the zero state).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u64 value
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Uniform index in [0, len)
    ///
    /// # Panics
    /// Panics if `len` is zero
    pub fn index(&mut self, len: usize) -> usize {
        assert!(len > 0, "cannot draw an index from an empty set");
        (self.next() % len as u64) as usize
    }

    /// Get current RNG state (for checkpointing/replay)
    ///
    /// `RngManager::new(rng.get_state())` continues the exact same sequence.
    pub fn get_state(&self) -> u64 {
        self.state
    }

    /// Generate random f64 in range [0.0, 1.0)
    pub fn next_f64(&mut self) -> f64 {
        let value = self.next();
        (value >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }

    /// Draw from a Poisson distribution with the given mean
    ///
    /// Knuth's multiplication method. Adequate for the small means used for
    /// replenishment horizons (around 15 days); a mean of zero always yields 0.
    pub fn poisson(&mut self, mean: f64) -> u32 {
        if mean <= 0.0 {
            return 0;
        }
        let limit = (-mean).exp();
        let mut k: u32 = 0;
        let mut p = 1.0;
        loop {
            k += 1;
            p *= self.next_f64();
            if p <= limit {
                return k - 1;
            }
        }
    }
}
