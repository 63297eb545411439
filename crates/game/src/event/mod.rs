mod queue;
mod types;

pub use queue::{EventQueue, TimedEvent};
pub use types::{BattleEvent, Outcome};
