//! Deterministic random number generation
//!
//! Uses xorshift64* algorithm for fast, deterministic random number generation.
//! CRITICAL: All randomness in a trial MUST go through this module, so that a
//! trial is fully reproducible from its seed.

mod xorshift;

pub use xorshift::RngManager;
