pub mod cards;
pub mod combat;
pub mod entity;
pub mod event;
pub mod lobby;
pub mod map;
pub mod movement;
pub mod net;
pub mod player;
pub mod simulation;
pub mod snapshot;
pub mod world;

pub use cards::{CardId, CardRegistry, SpellKind, UnitKind};
pub use entity::{Entity, NetworkId, Team};
pub use event::{BattleEvent, EventQueue, Outcome, TimedEvent};
pub use map::{Arena, TowerSlot};
pub use net::{DEFAULT_PORT, Message, MessageType, NetworkClient, NetworkController};
pub use player::Player;
pub use simulation::{
    Battle, FixedTimestep, MatchSetup, PlayError, PlayMode, PlayRequest, SimulationConfig,
};
pub use snapshot::WorldSnapshot;
pub use world::World;
