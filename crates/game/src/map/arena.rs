use glam::Vec2;

use crate::cards::TowerKind;
use crate::entity::Team;

use super::{
    GRID_HEIGHT, GRID_MARGIN_X, GRID_MARGIN_Y, GRID_WIDTH, LANE_LEFT_COL, LANE_RIGHT_COL,
    RIVER_ROW, TILE_SIZE, flip_y, grid_height_px, grid_width_px,
};

/// Units closer than this to a bridge's center line are treated as on it.
const BRIDGE_HALF_WIDTH: f32 = 24.0;
const POCKET_TOP_ROW: u32 = 8;
const KING_TOWER_Y: f32 = 578.0;
const PRINCESS_TOWER_Y: f32 = 530.0;

/// Axis-aligned rectangle with a half-open containment test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + width, y + height),
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x < self.max.x && point.y >= self.min.y && point.y < self.max.y
    }

    pub fn top(&self) -> f32 {
        self.min.y
    }

    pub fn bottom(&self) -> f32 {
        self.max.y
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bridge {
    Left,
    Right,
}

impl Bridge {
    /// The same physical bridge seen from the opposing player's frame.
    pub fn mirrored(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TowerSlot {
    King,
    Left,
    Right,
}

impl TowerSlot {
    pub fn mirrored(self) -> Self {
        match self {
            Self::King => Self::King,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    pub fn kind(self) -> TowerKind {
        match self {
            Self::King => TowerKind::King,
            Self::Left | Self::Right => TowerKind::Princess,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::King => "king",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TowerPlacement {
    pub team: Team,
    pub slot: TowerSlot,
    pub position: Vec2,
}

/// Static battlefield geometry in the local player's frame. The local
/// player always occupies the bottom half.
#[derive(Debug, Clone)]
pub struct Arena {
    grid: Rect,
    river: Rect,
    bridges: [f32; 2],
}

impl Default for Arena {
    fn default() -> Self {
        Self::standard()
    }
}

impl Arena {
    pub fn standard() -> Self {
        let grid = Rect::new(GRID_MARGIN_X, GRID_MARGIN_Y, grid_width_px(), grid_height_px());
        let river = Rect::new(
            GRID_MARGIN_X,
            GRID_MARGIN_Y + RIVER_ROW as f32 * TILE_SIZE,
            grid_width_px(),
            2.0 * TILE_SIZE,
        );
        Self {
            grid,
            river,
            bridges: [column_center(LANE_LEFT_COL), column_center(LANE_RIGHT_COL)],
        }
    }

    pub fn grid(&self) -> Rect {
        self.grid
    }

    pub fn river(&self) -> Rect {
        self.river
    }

    pub fn river_center_y(&self) -> f32 {
        self.river.center().y
    }

    pub fn bridge_x(&self, bridge: Bridge) -> f32 {
        match bridge {
            Bridge::Left => self.bridges[0],
            Bridge::Right => self.bridges[1],
        }
    }

    pub fn is_on_bridge_axis(&self, x: f32, bridge: Bridge) -> bool {
        (x - self.bridge_x(bridge)).abs() < BRIDGE_HALF_WIDTH
    }

    pub fn crosses_river(&self, from_y: f32, to_y: f32) -> bool {
        let center = self.river_center_y();
        (from_y < center && to_y > center) || (from_y > center && to_y < center)
    }

    /// Picks the nearest bridge. An exact tie goes right for the local
    /// player and left for the enemy, which is the same physical bridge.
    pub fn choose_bridge(&self, x: f32, team: Team) -> Bridge {
        let to_left = (x - self.bridges[0]).abs();
        let to_right = (x - self.bridges[1]).abs();
        if (to_left - to_right).abs() < 1.0 {
            match team {
                Team::Player => Bridge::Right,
                Team::Enemy => Bridge::Left,
            }
        } else if to_left < to_right {
            Bridge::Left
        } else {
            Bridge::Right
        }
    }

    /// Snaps a point to the center of the tile it falls in, clamped to the grid.
    pub fn snap_to_grid(&self, pos: Vec2) -> Vec2 {
        let col = ((pos.x - GRID_MARGIN_X) / TILE_SIZE).floor();
        let row = ((pos.y - GRID_MARGIN_Y) / TILE_SIZE).floor();
        let col = col.clamp(0.0, (GRID_WIDTH - 1) as f32);
        let row = row.clamp(0.0, (GRID_HEIGHT - 1) as f32);
        Vec2::new(
            GRID_MARGIN_X + col * TILE_SIZE + TILE_SIZE / 2.0,
            GRID_MARGIN_Y + row * TILE_SIZE + TILE_SIZE / 2.0,
        )
    }

    /// Deploy zones for the local player. A pocket opens on the enemy side
    /// of each lane whose enemy princess tower has fallen.
    pub fn spawn_zones(&self, left_pocket: bool, right_pocket: bool) -> Vec<Rect> {
        let own_top = self.river.bottom();
        let mut zones = vec![Rect::new(
            self.grid.min.x,
            own_top,
            grid_width_px(),
            self.grid.bottom() - own_top,
        )];

        let pocket_top = GRID_MARGIN_Y + POCKET_TOP_ROW as f32 * TILE_SIZE;
        let pocket_height = self.river.top() - pocket_top;
        let pocket_width = grid_width_px() / 2.0;
        if left_pocket {
            zones.push(Rect::new(self.grid.min.x, pocket_top, pocket_width, pocket_height));
        }
        if right_pocket {
            zones.push(Rect::new(
                self.grid.min.x + pocket_width,
                pocket_top,
                pocket_width,
                pocket_height,
            ));
        }
        zones
    }

    pub fn can_deploy(&self, pos: Vec2, left_pocket: bool, right_pocket: bool) -> bool {
        self.spawn_zones(left_pocket, right_pocket)
            .iter()
            .any(|zone| zone.contains(pos))
    }

    /// Starting towers for both teams in the local frame. Slots name the
    /// lane as seen locally, so the enemy tower at x=152 is its `Left`.
    pub fn tower_layout(&self) -> [TowerPlacement; 6] {
        let king = Vec2::new(self.grid.center().x, KING_TOWER_Y);
        let left = Vec2::new(self.bridges[0], PRINCESS_TOWER_Y);
        let right = Vec2::new(self.bridges[1], PRINCESS_TOWER_Y);
        let mirror = |p: Vec2| Vec2::new(p.x, flip_y(p.y));
        [
            TowerPlacement { team: Team::Player, slot: TowerSlot::King, position: king },
            TowerPlacement { team: Team::Player, slot: TowerSlot::Left, position: left },
            TowerPlacement { team: Team::Player, slot: TowerSlot::Right, position: right },
            TowerPlacement { team: Team::Enemy, slot: TowerSlot::King, position: mirror(king) },
            TowerPlacement { team: Team::Enemy, slot: TowerSlot::Left, position: mirror(left) },
            TowerPlacement { team: Team::Enemy, slot: TowerSlot::Right, position: mirror(right) },
        ]
    }
}

fn column_center(col: u32) -> f32 {
    GRID_MARGIN_X + col as f32 * TILE_SIZE + TILE_SIZE / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{flip_pos, flip_x};

    #[test]
    fn standard_geometry() {
        let arena = Arena::standard();
        assert_eq!(arena.river().top(), 330.0);
        assert_eq!(arena.river().bottom(), 362.0);
        assert_eq!(arena.river_center_y(), 346.0);
        assert_eq!(arena.bridge_x(Bridge::Left), 152.0);
        assert_eq!(arena.bridge_x(Bridge::Right), 328.0);
    }

    #[test]
    fn snap_clamps_to_grid() {
        let arena = Arena::standard();
        assert_eq!(arena.snap_to_grid(Vec2::new(150.0, 500.0)), Vec2::new(152.0, 498.0));
        assert_eq!(arena.snap_to_grid(Vec2::new(0.0, 1000.0)), Vec2::new(104.0, 594.0));
    }

    #[test]
    fn pockets_open_per_lane() {
        let arena = Arena::standard();
        let enemy_side_left = Vec2::new(120.0, 300.0);
        let enemy_side_right = Vec2::new(360.0, 300.0);
        assert!(!arena.can_deploy(enemy_side_left, false, false));
        assert!(arena.can_deploy(enemy_side_left, true, false));
        assert!(!arena.can_deploy(enemy_side_right, true, false));
        assert!(arena.can_deploy(Vec2::new(200.0, 400.0), false, false));
        assert!(!arena.can_deploy(Vec2::new(200.0, 340.0), true, true));
    }

    #[test]
    fn tie_breaks_to_the_same_physical_bridge() {
        let arena = Arena::standard();
        let local = arena.choose_bridge(240.0, Team::Player);
        let remote = arena.choose_bridge(flip_x(240.0), Team::Enemy);
        assert_eq!(local, Bridge::Right);
        assert_eq!(local, remote.mirrored());
    }

    #[test]
    fn enemy_towers_mirror_own() {
        let arena = Arena::standard();
        let layout = arena.tower_layout();
        let enemy_left = layout
            .iter()
            .find(|t| t.team == Team::Enemy && t.slot == TowerSlot::Left)
            .map(|t| t.position);
        assert_eq!(enemy_left, Some(Vec2::new(152.0, 162.0)));
        assert_eq!(flip_pos(Vec2::new(152.0, 162.0)), Vec2::new(328.0, 530.0));
    }
}
