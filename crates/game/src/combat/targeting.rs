use crate::cards::TargetPreference;
use crate::entity::{Body, Domains, Entity, NetworkId, ThinkContext, Tower, Unit, UnitIntent};

/// Closest body by edge distance, strictly under `limit`. Candidates are
/// visited in id order and only a strictly closer one (by more than
/// `tie_epsilon`) replaces the current best, so near-ties go to the lower id.
pub fn nearest<'a>(
    origin: &Body,
    candidates: impl Iterator<Item = &'a Body>,
    limit: f32,
    tie_epsilon: f32,
) -> Option<(&'a NetworkId, f32)> {
    let mut best: Option<(&NetworkId, f32)> = None;
    for body in candidates {
        let distance = origin.edge_distance(body);
        if distance >= limit {
            continue;
        }
        let closer = match best {
            None => true,
            Some((_, best_distance)) => distance < best_distance - tie_epsilon,
        };
        if closer {
            best = Some((&body.id, distance));
        }
    }
    best
}

/// Picks the nearest attackable enemy within aggro range, honoring the
/// unit's domain and building preference. With nothing in range the unit
/// falls back to the nearest enemy tower anywhere on the field.
pub fn find_unit_target(unit: &Unit, ctx: &ThinkContext<'_>) -> Option<NetworkId> {
    let eps = ctx.config.tie_epsilon;
    let candidates = ctx
        .world
        .entities()
        .filter(|e| e.team() != unit.team() && e.is_targetable() && unit.can_target(e))
        .filter(|e| unit.preference == TargetPreference::Any || e.as_tower().is_some())
        .filter_map(Entity::body);

    nearest(&unit.body, candidates, ctx.config.aggro_range, eps)
        .or_else(|| {
            if !unit.targets.contains(Domains::GROUND) {
                return None;
            }
            let towers = ctx
                .world
                .towers()
                .filter(|t| t.team() != unit.team() && t.body.is_alive())
                .map(|t| &t.body);
            nearest(&unit.body, towers, f32::INFINITY, eps)
        })
        .map(|(id, _)| id.clone())
}

/// Targeting half of a unit's think. Keeps a valid target unless it wandered
/// past sight range or the unit was nudged; otherwise rescans periodically.
pub fn plan_unit_targeting(unit: &Unit, ctx: &ThinkContext<'_>) -> UnitIntent {
    let config = ctx.config;
    let mut intent = UnitIntent {
        target: unit.target.clone(),
        locked_target: unit.locked_target,
        retarget_timer: unit.retarget_timer,
        ..UnitIntent::default()
    };

    let current = unit
        .target
        .as_ref()
        .and_then(|id| ctx.world.get(id))
        .filter(|e| e.is_targetable())
        .and_then(Entity::body)
        .filter(|t| unit.position().distance(t.position) <= unit.sight_range && !unit.nudged);

    let Some(current) = current else {
        intent.locked_target = false;
        intent.target = find_unit_target(unit, ctx);
        return intent;
    };

    intent.retarget_timer -= ctx.dt;
    if intent.retarget_timer > 0.0 {
        return intent;
    }
    intent.retarget_timer = config.retarget_interval;

    let Some(candidate) = find_unit_target(unit, ctx).filter(|id| *id != current.id) else {
        return intent;
    };
    if !unit.locked_target {
        intent.target = Some(candidate);
        return intent;
    }

    let strictly_closer = ctx
        .world
        .get(&candidate)
        .and_then(Entity::body)
        .is_some_and(|body| {
            unit.body.edge_distance(body) < unit.body.edge_distance(current) - config.tie_epsilon
        });
    if strictly_closer {
        intent.target = Some(candidate);
        intent.locked_target = false;
    }
    intent
}

/// Towers keep their target while it stays in range, then take the nearest
/// enemy unit in range.
pub fn plan_tower_target(tower: &Tower, ctx: &ThinkContext<'_>) -> Option<NetworkId> {
    let reach = tower.attack.range + ctx.config.range_epsilon;
    let current = tower
        .target
        .as_ref()
        .and_then(|id| ctx.world.get(id))
        .filter(|e| e.is_targetable())
        .and_then(Entity::body)
        .filter(|body| tower.body.edge_distance(body) <= reach);
    if let Some(current) = current {
        return Some(current.id.clone());
    }

    let candidates = ctx
        .world
        .units()
        .filter(|u| u.team() != tower.team() && u.body.is_alive())
        .map(|u| &u.body);
    nearest(&tower.body, candidates, reach, ctx.config.tie_epsilon).map(|(id, _)| id.clone())
}
