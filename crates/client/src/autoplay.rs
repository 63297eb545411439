use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use arena::Battle;
use arena::map::{GRID_MARGIN_X, grid_width_px};

const THINK_INTERVAL: f32 = 1.5;
const DROP_Y: (f32, f32) = (380.0, 590.0);

/// Stand-in for a human at the keyboard: every so often it plays a random
/// affordable card somewhere on its own half.
pub struct AutoPlayer {
    rng: ChaCha8Rng,
    timer: f32,
    plays: u32,
}

impl AutoPlayer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            timer: 0.0,
            plays: 0,
        }
    }

    pub fn plays(&self) -> u32 {
        self.plays
    }

    pub fn update(&mut self, battle: &mut Battle, delta: f32) {
        self.timer += delta;
        if self.timer < THINK_INTERVAL {
            return;
        }
        self.timer = 0.0;

        let player = battle.player();
        let affordable: Vec<usize> = player
            .hand()
            .iter()
            .enumerate()
            .filter(|(index, _)| !player.is_slot_pending(*index))
            .filter(|(_, card)| player.can_afford(battle.registry().cost(**card)))
            .map(|(index, _)| index)
            .collect();
        if affordable.is_empty() {
            return;
        }

        let index = affordable[self.rng.gen_range(0..affordable.len())];
        let position = Vec2::new(
            self.rng
                .gen_range(GRID_MARGIN_X..GRID_MARGIN_X + grid_width_px()),
            self.rng.gen_range(DROP_Y.0..DROP_Y.1),
        );
        match battle.play_card(index, position) {
            Ok(request) => {
                self.plays += 1;
                log::debug!("autoplay: {} at {:?}", request.card, request.position);
            }
            Err(e) => log::debug!("autoplay: {}", e),
        }
    }
}
