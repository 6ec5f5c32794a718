//! Combat systems (thin ECS layer над state types)

pub mod damage;
pub mod triggers;


// Re-export all systems
pub use damage::*;
pub use triggers::*;
