//! Steps of one update cycle, in execution order.

pub mod progress;
pub mod extract;
pub mod locate;
pub mod stage;
pub mod script;
pub mod handoff;
