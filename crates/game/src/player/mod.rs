mod state;

pub use state::{HAND_SIZE, Player};
