mod collision;
mod pathing;

use glam::Vec2;

pub use collision::{Resolution, resolve};
pub use pathing::waypoint;

use crate::entity::{Body, Hitbox, NetworkId, ThinkContext, Unit};
use crate::map::TowerSlot;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovementPlan {
    pub movement: Vec2,
    pub pushes: Vec<(NetworkId, Vec2)>,
    pub nudges: Vec<NetworkId>,
    pub collided: bool,
}

/// This tick's displacement for a unit chasing `target`, after pathing
/// around the river and resolving contacts.
pub fn plan_movement(unit: &Unit, target: &Body, ctx: &ThinkContext<'_>) -> MovementPlan {
    let position = unit.position();
    let goal = match target.hitbox {
        Hitbox::Rect { .. } => target.hitbox.closest_point(target.position, position),
        Hitbox::Circle { .. } => target.position,
    };
    let next = waypoint(
        position,
        unit.team(),
        unit.domain,
        goal,
        target.position,
        ctx.arena,
    );
    let direction = (next - position).normalize_or_zero();
    let resolution = resolve(unit, direction, ctx.world, ctx.config);

    MovementPlan {
        movement: resolution.direction * unit.speed * ctx.dt,
        pushes: resolution.pushes,
        nudges: resolution.nudges,
        collided: resolution.collided,
    }
}

/// Straight-line advance on the enemy king, used when nothing is targetable.
pub fn march_on_king(unit: &Unit, ctx: &ThinkContext<'_>) -> Vec2 {
    ctx.world
        .tower(unit.team().opponent(), TowerSlot::King)
        .map(|king| (king.body.position - unit.position()).normalize_or_zero() * unit.speed * ctx.dt)
        .unwrap_or(Vec2::ZERO)
}
