use std::f32::consts::PI;

use glam::Vec2;

use crate::entity::Team;

use super::{ARENA_WIDTH, GRID_MARGIN_Y, grid_height_px};

/// Mirrors an x coordinate across the vertical center line of the arena.
pub fn flip_x(x: f32) -> f32 {
    ARENA_WIDTH - x
}

/// Mirrors a y coordinate across the river.
pub fn flip_y(y: f32) -> f32 {
    2.0 * GRID_MARGIN_Y + grid_height_px() - y
}

/// Converts a point between the two players' local frames.
pub fn flip_pos(pos: Vec2) -> Vec2 {
    Vec2::new(flip_x(pos.x), flip_y(pos.y))
}

pub fn mirrored_angle(angle: f32) -> f32 {
    angle + PI
}

/// Rotates a swarm slot for the enemy team so both peers lay out the same
/// formation in physical space.
pub fn formation_angle(angle: f32, team: Team) -> f32 {
    match team {
        Team::Player => angle,
        Team::Enemy => mirrored_angle(angle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_is_an_involution() {
        let points = [
            Vec2::new(96.0, 90.0),
            Vec2::new(152.0, 530.0),
            Vec2::new(240.0, 346.0),
            Vec2::new(383.5, 601.25),
        ];
        for p in points {
            let back = flip_pos(flip_pos(p));
            assert!((back - p).length() < 1e-4, "{p:?} -> {back:?}");
        }
    }

    #[test]
    fn river_center_is_fixed() {
        assert_eq!(flip_y(346.0), 346.0);
        assert_eq!(flip_x(240.0), 240.0);
    }

    #[test]
    fn towers_map_onto_each_other() {
        assert_eq!(flip_pos(Vec2::new(240.0, 578.0)), Vec2::new(240.0, 114.0));
        assert_eq!(flip_pos(Vec2::new(152.0, 530.0)), Vec2::new(328.0, 162.0));
    }

    #[test]
    fn enemy_formation_is_rotated_half_turn() {
        let a = formation_angle(0.5, Team::Enemy);
        let offset = Vec2::new(a.cos(), a.sin());
        let own = Vec2::new(0.5f32.cos(), 0.5f32.sin());
        assert!((offset + own).length() < 1e-5);
    }
}
