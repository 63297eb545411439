use glam::Vec2;

use crate::entity::{MovementDomain, NetworkId, Team, Unit};
use crate::simulation::SimulationConfig;
use crate::world::World;

/// Below this separation two units are treated as sitting on the same spot.
const COINCIDENT: f32 = 0.001;
const STATIONARY_SQ: f32 = 0.01;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub direction: Vec2,
    pub pushes: Vec<(NetworkId, Vec2)>,
    pub nudges: Vec<NetworkId>,
    pub collided: bool,
}

/// Adjusts a unit's desired heading for everything it is touching, in
/// network id order: ground units block or get pushed, flyers repel each
/// other softly, and towers are never entered.
pub fn resolve(unit: &Unit, direction: Vec2, world: &World, config: &SimulationConfig) -> Resolution {
    let mut out = Resolution {
        direction,
        ..Resolution::default()
    };
    let position = unit.position();
    let mut separation = Vec2::ZERO;

    for other in world.units() {
        if other.id() == unit.id() || !other.body.is_alive() {
            continue;
        }
        match (unit.domain, other.domain) {
            (MovementDomain::Ground, MovementDomain::Ground) => {
                ground_contact(unit, other, config, &mut out);
            }
            (MovementDomain::Air, MovementDomain::Air) => {
                let reach = unit.radius() + other.radius();
                let distance = position.distance(other.position());
                if distance < reach {
                    separation += away_from(unit, other) / (distance + 0.1);
                }
            }
            _ => {}
        }
    }

    if separation.length() > 0.0 {
        if separation.length() > config.air_nudge_threshold {
            out.collided = true;
        }
        out.direction = (out.direction + separation * config.air_separation_weight).normalize_or_zero();
    }

    for tower in world.towers() {
        if !tower.body.is_alive() {
            continue;
        }
        let reach = tower.size() / 2.0 + config.tower_collision_margin;
        let offset = position - tower.body.position;
        if offset.length() >= reach {
            continue;
        }
        out.collided = true;
        let normal = offset.normalize_or_zero();
        if normal == Vec2::ZERO {
            continue;
        }
        out.direction = slide(out.direction, normal, config.tower_slide_weight);
    }

    out
}

fn ground_contact(unit: &Unit, other: &Unit, config: &SimulationConfig, out: &mut Resolution) {
    let reach = unit.radius() + other.radius();
    let distance = unit.position().distance(other.position());
    if distance >= reach {
        return;
    }
    out.collided = true;

    let normal = away_from(unit, other);
    let dot = out.direction.dot(normal);

    // A heavier unit always shoves a lighter one it walks straight into.
    // Equal masses only push a partner that is idle or already yielding.
    let head_on = dot < config.push_alignment_threshold;
    let other_yielding = other.last_move_dir.length_squared() <= STATIONARY_SQ
        || out.direction.dot(other.last_move_dir) > config.same_direction_threshold;
    let pushes = unit.mass > other.mass || (unit.mass == other.mass && other_yielding);
    if head_on && pushes {
        let push_dir = if out.direction == Vec2::ZERO {
            -normal
        } else {
            out.direction
        };
        let overlap = reach - distance;
        out.pushes
            .push((other.id().clone(), push_dir * overlap * config.push_intensity));
        return;
    }

    out.direction = slide(out.direction, normal, config.slide_outward_weight);
    out.nudges.push(other.id().clone());
}

/// Strips the component of `direction` heading into the obstacle, then adds
/// an outward kick along `normal`.
fn slide(direction: Vec2, normal: Vec2, outward: f32) -> Vec2 {
    let dot = direction.dot(normal);
    let mut direction = direction;
    if dot < 0.0 {
        direction -= normal * dot;
    }
    (direction + normal * outward).normalize_or_zero()
}

/// Unit normal pointing from `other` to `unit`. Units on the exact same spot
/// split along x by id: the higher id moves towards +x in the lower id's
/// team frame, so a mirrored peer splits them the same physical way.
fn away_from(unit: &Unit, other: &Unit) -> Vec2 {
    let offset = unit.position() - other.position();
    if offset.length() >= COINCIDENT {
        return offset.normalize();
    }
    let (low, high) = if unit.id() < other.id() {
        (unit, other)
    } else {
        (other, unit)
    };
    let axis = match low.team() {
        Team::Player => Vec2::X,
        Team::Enemy => Vec2::NEG_X,
    };
    if unit.id() == high.id() { axis } else { -axis }
}
