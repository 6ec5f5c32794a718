//! AI systems (frame tick)

pub mod fsm;
pub mod patterns;
pub mod reactions;

// Re-export all systems
pub use fsm::*;
pub use patterns::*;
pub use reactions::*;
