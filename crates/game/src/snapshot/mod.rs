mod state;

pub use state::{EntityClass, EntitySnapshot, SnapshotError, WorldSnapshot};
