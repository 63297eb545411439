mod battle;
mod config;
mod practice;
mod schedule;
mod tick;

pub use battle::{Battle, MatchSetup, Outbound, PlayError, PlayMode, PlayRequest, tower_id};
pub use config::SimulationConfig;
pub use practice::PracticeOpponent;
pub use schedule::{ActionScheduler, BattleAction, CardPlay, ScheduledAction};
pub use tick::FixedTimestep;
