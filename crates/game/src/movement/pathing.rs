use glam::Vec2;

use crate::entity::{MovementDomain, Team};
use crate::map::Arena;

/// How far short of the river bank units line up before and after a bridge.
const BANK_CLEARANCE: f32 = 10.0;
const BRIDGE_EXIT_RADIUS: f32 = 10.0;

/// Next point to steer at on the way to `goal`. Ground units crossing the
/// river line up with a bridge on their own bank, cross through its center
/// and only head for `destination` once they reach the far exit.
pub fn waypoint(
    position: Vec2,
    team: Team,
    domain: MovementDomain,
    goal: Vec2,
    destination: Vec2,
    arena: &Arena,
) -> Vec2 {
    if domain == MovementDomain::Air || !arena.crosses_river(position.y, goal.y) {
        return goal;
    }

    let river = arena.river();
    let bridge = arena.choose_bridge(position.x, team);
    let bridge_x = arena.bridge_x(bridge);
    let center = Vec2::new(bridge_x, arena.river_center_y());
    let upper_bank = Vec2::new(bridge_x, river.top() - BANK_CLEARANCE);
    let lower_bank = Vec2::new(bridge_x, river.bottom() + BANK_CLEARANCE);

    if position.distance(center) < river.height() / 2.0 + 5.0 {
        let exit = if destination.y < center.y {
            upper_bank
        } else {
            lower_bank
        };
        return if position.distance(exit) < BRIDGE_EXIT_RADIUS {
            destination
        } else {
            exit
        };
    }

    if arena.is_on_bridge_axis(position.x, bridge) {
        center
    } else if position.y > center.y {
        lower_bank
    } else {
        upper_bank
    }
}
