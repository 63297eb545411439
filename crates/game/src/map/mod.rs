mod arena;
mod symmetry;

pub use arena::{Arena, Bridge, Rect, TowerPlacement, TowerSlot};
pub use symmetry::{flip_pos, flip_x, flip_y, formation_angle, mirrored_angle};

pub const TILE_SIZE: f32 = 16.0;
pub const GRID_WIDTH: u32 = 18;
pub const GRID_HEIGHT: u32 = 32;
pub const GRID_MARGIN_X: f32 = 96.0;
pub const GRID_MARGIN_Y: f32 = 90.0;
pub const ARENA_WIDTH: f32 = 480.0;

/// Rows 15 and 16 hold the river.
pub const RIVER_ROW: u32 = 15;
pub const LANE_LEFT_COL: u32 = 3;
pub const LANE_RIGHT_COL: u32 = 14;

pub const fn grid_height_px() -> f32 {
    GRID_HEIGHT as f32 * TILE_SIZE
}

pub const fn grid_width_px() -> f32 {
    GRID_WIDTH as f32 * TILE_SIZE
}
