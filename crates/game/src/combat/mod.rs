mod attack;
mod targeting;

pub use attack::strike;
pub use targeting::{find_unit_target, nearest, plan_tower_target, plan_unit_targeting};
