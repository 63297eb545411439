use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_rate: u32,
    /// Ticks between a local play and its scheduled execution.
    pub latency_buffer: u64,

    pub starting_elixir: f32,
    pub max_elixir: f32,
    pub elixir_regen_interval: f32,

    pub battle_duration: f32,
    pub overtime_duration: f32,

    pub aggro_range: f32,
    pub min_sight_range: f32,
    pub sight_range_factor: f32,
    pub retarget_interval: f32,
    pub tie_epsilon: f32,
    pub range_epsilon: f32,
    pub melee_range_threshold: f32,

    pub push_intensity: f32,
    pub push_alignment_threshold: f32,
    pub same_direction_threshold: f32,
    pub slide_outward_weight: f32,
    pub tower_slide_weight: f32,
    pub tower_collision_margin: f32,
    pub air_separation_weight: f32,
    pub air_nudge_threshold: f32,

    pub swarm_radius: f32,
    pub deploy_time: f32,
    pub spawn_clearance: f32,
    pub practice_interval: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            latency_buffer: 10,

            starting_elixir: 5.0,
            max_elixir: 10.0,
            elixir_regen_interval: 2.0,

            battle_duration: 180.0,
            overtime_duration: 120.0,

            aggro_range: 200.0,
            min_sight_range: 250.0,
            sight_range_factor: 1.5,
            retarget_interval: 0.2,
            tie_epsilon: 0.1,
            range_epsilon: 0.001,
            melee_range_threshold: 60.0,

            push_intensity: 0.1,
            push_alignment_threshold: -0.95,
            same_direction_threshold: 0.5,
            slide_outward_weight: 0.8,
            tower_slide_weight: 0.5,
            tower_collision_margin: 10.0,
            air_separation_weight: 1.5,
            air_nudge_threshold: 0.5,

            swarm_radius: 30.0,
            deploy_time: 0.0,
            spawn_clearance: 15.0,
            practice_interval: 5.0,
        }
    }
}

impl SimulationConfig {
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    pub fn sight_range(&self, attack_range: f32) -> f32 {
        self.min_sight_range.max(attack_range * self.sight_range_factor)
    }
}
