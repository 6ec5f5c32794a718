//! AI components

pub mod fsm;
pub mod pattern;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod fsm_tests;
#[cfg(test)]
mod pattern_tests;

// Re-export all components
pub use fsm::*;
pub use pattern::*;
