use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::cards::UnitKind;

const ROSTER: [UnitKind; 4] = [
    UnitKind::Knight,
    UnitKind::Archer,
    UnitKind::Goblin,
    UnitKind::Minions,
];
const LANES: [f32; 2] = [80.0, 400.0];
const DROP_Y: f32 = 250.0;

/// Offline sparring partner that drops a random troop into a random lane
/// on a fixed interval. Seeded so a practice match replays identically.
#[derive(Debug, Clone)]
pub struct PracticeOpponent {
    rng: ChaCha8Rng,
    timer: f32,
    interval: f32,
    drops: u64,
}

impl PracticeOpponent {
    pub fn new(seed: u64, interval: f32) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            timer: 0.0,
            interval,
            drops: 0,
        }
    }

    pub fn drops(&self) -> u64 {
        self.drops
    }

    pub fn update(&mut self, dt: f32) -> Option<(UnitKind, Vec2)> {
        self.timer += dt;
        if self.timer < self.interval {
            return None;
        }
        self.timer = 0.0;
        self.drops += 1;
        let x = LANES[self.rng.gen_range(0..LANES.len())];
        let kind = ROSTER[self.rng.gen_range(0..ROSTER.len())];
        Some((kind, Vec2::new(x, DROP_Y)))
    }
}
