use std::f32::consts::TAU;

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::cards::{CardId, CardRegistry, SpellKind, UnitKind, default_deck};
use crate::entity::{
    ApplyContext, Effect, Entity, Lifecycle, NetworkId, Spell, Team, ThinkContext, Tower, Unit,
};
use crate::event::{BattleEvent, EventQueue, Outcome, TimedEvent};
use crate::map::{Arena, TowerSlot, formation_angle};
use crate::player::Player;
use crate::snapshot::WorldSnapshot;
use crate::world::World;

use super::{
    ActionScheduler, BattleAction, CardPlay, PracticeOpponent, ScheduledAction, SimulationConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayMode {
    #[default]
    Offline,
    /// Local plays go out through the relay and only run once echoed back.
    Networked,
}

#[derive(Debug, Clone)]
pub struct MatchSetup {
    /// Seat the local player holds in the match. Decides which absolute
    /// ids the towers get; the local player is always `Team::Player`.
    pub perspective: Team,
    pub player_deck: Vec<CardId>,
    pub enemy_deck: Vec<CardId>,
    pub seed: u64,
    pub mode: PlayMode,
    pub practice: bool,
}

impl Default for MatchSetup {
    fn default() -> Self {
        Self {
            perspective: Team::Player,
            player_deck: default_deck(),
            enemy_deck: default_deck(),
            seed: 0,
            mode: PlayMode::Offline,
            practice: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlayError {
    #[error("the match is over")]
    MatchOver,
    #[error("no card in hand slot {0}")]
    EmptySlot(usize),
    #[error("hand slot {0} is still waiting on its last play")]
    SlotPending(usize),
    #[error("cannot deploy at ({x}, {y})")]
    OutsideDeployZone { x: f32, y: f32 },
    #[error("too close to a tower")]
    OnTower,
    #[error("not enough elixir: need {needed}, have {available}")]
    InsufficientElixir { needed: u32, available: f32 },
}

/// A local play accepted by the battle. In networked mode it also waits
/// in the outbox until the transport picks it up.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRequest {
    pub card: CardId,
    pub hand_index: usize,
    pub position: Vec2,
    pub network_ids: Vec<NetworkId>,
    pub target_tick: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Play(PlayRequest),
    Emote { text: String, target_tick: u64 },
}

#[derive(Debug, Clone, Copy)]
struct MatchClock {
    remaining: f32,
    sudden_death: bool,
    /// Tower counts when overtime began; losing any more ends the match.
    towers_at_sudden_death: [usize; 2],
}

pub struct Battle {
    config: SimulationConfig,
    registry: CardRegistry,
    arena: Arena,
    world: World,
    perspective: Team,
    mode: PlayMode,
    players: [Player; 2],
    scheduler: ActionScheduler,
    clock: MatchClock,
    outcome: Option<Outcome>,
    crowns: [u8; 2],
    practice: Option<PracticeOpponent>,
    outbox: Vec<Outbound>,
    events: EventQueue,
}

impl Battle {
    pub fn new(config: SimulationConfig, registry: CardRegistry, setup: MatchSetup) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(setup.seed);
        let player = Player::new(Team::Player, setup.player_deck, &mut rng, config.starting_elixir);
        let enemy = Player::new(Team::Enemy, setup.enemy_deck, &mut rng, config.starting_elixir);
        let arena = Arena::standard();

        let mut world = World::new();
        for placement in arena.tower_layout() {
            let id = tower_id(placement.team, placement.slot, setup.perspective);
            let stats = registry.tower(placement.slot.kind());
            world.spawn(Entity::Tower(Tower::new(
                id,
                placement.team,
                placement.slot,
                placement.position,
                stats,
            )));
        }

        let practice = setup
            .practice
            .then(|| PracticeOpponent::new(setup.seed.wrapping_add(1), config.practice_interval));

        log::info!(
            "battle ready: seat {}, {:?}, practice {}",
            setup.perspective.as_str(),
            setup.mode,
            practice.is_some()
        );

        Self {
            clock: MatchClock {
                remaining: config.battle_duration,
                sudden_death: false,
                towers_at_sudden_death: [0; 2],
            },
            config,
            registry,
            arena,
            world,
            perspective: setup.perspective,
            mode: setup.mode,
            players: [player, enemy],
            scheduler: ActionScheduler::new(),
            outcome: None,
            crowns: [0; 2],
            practice,
            outbox: Vec::new(),
            events: EventQueue::default(),
        }
    }

    pub fn with_standard_rules(setup: MatchSetup) -> Self {
        Self::new(SimulationConfig::default(), CardRegistry::standard(), setup)
    }

    pub fn tick(&self) -> u64 {
        self.world.tick()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn registry(&self) -> &CardRegistry {
        &self.registry
    }

    pub fn perspective(&self) -> Team {
        self.perspective
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    pub fn player(&self) -> &Player {
        &self.players[Team::Player.index()]
    }

    pub fn enemy(&self) -> &Player {
        &self.players[Team::Enemy.index()]
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Crowns taken by each team, indexed by `Team::index`.
    pub fn crowns(&self) -> [u8; 2] {
        self.crowns
    }

    pub fn time_remaining(&self) -> f32 {
        self.clock.remaining.max(0.0)
    }

    pub fn is_sudden_death(&self) -> bool {
        self.clock.sudden_death
    }

    pub fn pending_actions(&self) -> usize {
        self.scheduler.len()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let mut snapshot = self.world.snapshot();
        snapshot.elixir = [self.player().elixir, self.enemy().elixir];
        snapshot
    }

    pub fn drain_events(&mut self) -> Vec<TimedEvent> {
        self.events.drain()
    }

    pub fn drain_outbox(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    /// Drops to local play after the relay goes away. Plays that never made
    /// it back are forgotten along with their reserved elixir.
    pub fn go_offline(&mut self) {
        if self.mode == PlayMode::Offline {
            return;
        }
        log::warn!("switching to offline play at tick {}", self.world.tick());
        self.mode = PlayMode::Offline;
        self.outbox.clear();
        self.players[Team::Player.index()].clear_reservations();
    }

    /// Advances the battle by one tick.
    pub fn update(&mut self, dt: f32) {
        if self.outcome.is_some() {
            return;
        }
        self.world.advance_tick();
        self.run_practice(dt);
        self.run_due_actions();
        for player in &mut self.players {
            player.regenerate(dt, &self.config);
        }
        self.run_phases(dt);
        self.sweep();
        self.wake_kings();
        self.check_towers();
        self.advance_clock(dt);
    }

    /// Validates a play from the local hand and either runs it now
    /// (offline) or queues it for the relay with a future target tick.
    pub fn play_card(&mut self, hand_index: usize, position: Vec2) -> Result<PlayRequest, PlayError> {
        if self.outcome.is_some() {
            return Err(PlayError::MatchOver);
        }
        let card = *self
            .player()
            .hand()
            .get(hand_index)
            .ok_or(PlayError::EmptySlot(hand_index))?;
        if self.player().is_slot_pending(hand_index) {
            return Err(PlayError::SlotPending(hand_index));
        }
        let position = self.arena.snap_to_grid(position);
        if !card.is_spell() {
            self.check_deploy(position)?;
        }

        let cost = self.registry.cost(card);
        let player = self.player();
        if !player.can_afford(cost) {
            return Err(PlayError::InsufficientElixir {
                needed: cost,
                available: player.available_elixir(),
            });
        }

        let network_ids = (0..self.registry.spawn_count(card))
            .map(|_| NetworkId::random())
            .collect();
        let target_tick = match self.mode {
            PlayMode::Offline => self.world.tick(),
            PlayMode::Networked => self.world.tick() + self.config.latency_buffer,
        };
        let request = PlayRequest {
            card,
            hand_index,
            position,
            network_ids,
            target_tick,
        };
        self.players[Team::Player.index()].commit(hand_index, cost);
        log::debug!("{} requested for tick {}", card, target_tick);

        match self.mode {
            PlayMode::Offline => {
                self.schedule(ScheduledAction {
                    target_tick,
                    action: BattleAction::PlayCard(CardPlay {
                        card,
                        team: Team::Player,
                        position,
                        network_ids: request.network_ids.clone(),
                        hand_slot: Some(hand_index),
                    }),
                });
                self.run_due_actions();
            }
            PlayMode::Networked => self.outbox.push(Outbound::Play(request.clone())),
        }
        Ok(request)
    }

    pub fn emote(&mut self, text: impl Into<String>) {
        let text = text.into();
        match self.mode {
            PlayMode::Offline => {
                self.events.push(
                    self.world.tick(),
                    BattleEvent::Emote {
                        team: Team::Player,
                        text,
                    },
                );
            }
            PlayMode::Networked => self.outbox.push(Outbound::Emote {
                text,
                target_tick: self.world.tick() + self.config.latency_buffer,
            }),
        }
    }

    /// Queues an action for its target tick. Actions already overdue run
    /// on the next update.
    pub fn schedule(&mut self, action: ScheduledAction) {
        if action.target_tick < self.world.tick() {
            log::debug!(
                "late action for tick {} at tick {}",
                action.target_tick,
                self.world.tick()
            );
        }
        self.scheduler.push(action);
    }

    fn check_deploy(&self, position: Vec2) -> Result<(), PlayError> {
        let (left, right) = self.open_pockets();
        if !self.arena.can_deploy(position, left, right) {
            return Err(PlayError::OutsideDeployZone {
                x: position.x,
                y: position.y,
            });
        }
        let clearance = self.config.spawn_clearance;
        let blocked = self
            .world
            .towers()
            .filter(|t| t.body.is_alive())
            .any(|t| t.body.position.distance(position) < t.size() / 2.0 + clearance);
        if blocked {
            return Err(PlayError::OnTower);
        }
        Ok(())
    }

    /// Pockets open on the enemy side once the princess tower guarding
    /// that lane falls.
    fn open_pockets(&self) -> (bool, bool) {
        (
            self.world.tower(Team::Enemy, TowerSlot::Left).is_none(),
            self.world.tower(Team::Enemy, TowerSlot::Right).is_none(),
        )
    }

    fn run_due_actions(&mut self) {
        for scheduled in self.scheduler.drain_due(self.world.tick()) {
            self.execute(scheduled.action);
        }
    }

    fn execute(&mut self, action: BattleAction) {
        match action {
            BattleAction::PlayCard(play) => self.execute_play(play),
            BattleAction::Emote { team, text } => {
                self.events
                    .push(self.world.tick(), BattleEvent::Emote { team, text });
            }
        }
    }

    fn execute_play(&mut self, play: CardPlay) {
        let CardPlay {
            card,
            team,
            position,
            network_ids,
            hand_slot,
        } = play;
        match card {
            CardId::Unit(kind) => self.spawn_units(kind, team, position, &network_ids),
            CardId::Spell(kind) => self.cast_spell(kind, team, position, &network_ids),
        }

        // The opponent's elixir and hand are never mirrored locally.
        if let (Team::Player, Some(slot)) = (team, hand_slot) {
            let cost = self.registry.cost(card);
            if !self.players[Team::Player.index()].settle(slot, card, cost) {
                log::warn!("{} played from slot {} which no longer holds it", card, slot);
            }
        }

        self.events.push(
            self.world.tick(),
            BattleEvent::CardPlayed {
                team,
                card,
                position,
            },
        );
    }

    fn spawn_units(&mut self, kind: UnitKind, team: Team, position: Vec2, ids: &[NetworkId]) {
        let stats = self.registry.unit(kind).clone();
        let count = stats.count.max(1) as usize;
        let tick = self.world.tick();
        for i in 0..count {
            let id = ids
                .get(i)
                .cloned()
                .unwrap_or_else(|| NetworkId::new(format!("{}-{tick}-{i}", kind.name())));
            let offset = if count == 1 {
                Vec2::ZERO
            } else {
                let angle = formation_angle(TAU * i as f32 / count as f32, team);
                Vec2::new(angle.cos(), angle.sin()) * self.config.swarm_radius
            };
            let unit = Unit::spawn(id.clone(), team, position + offset, kind, &stats, &self.config);
            if self.world.spawn(Entity::Unit(unit)) {
                self.events
                    .push(tick, BattleEvent::UnitSpawned { id, team, kind });
            }
        }
    }

    fn cast_spell(&mut self, kind: SpellKind, team: Team, target: Vec2, ids: &[NetworkId]) {
        let tick = self.world.tick();
        let id = ids
            .first()
            .cloned()
            .unwrap_or_else(|| NetworkId::new(format!("{}-{tick}", kind.name())));
        let origin = self
            .world
            .tower(team, TowerSlot::King)
            .map(|king| king.body.position);
        let spell = Spell::cast(id.clone(), team, kind, self.registry.spell(kind), target, origin);
        if self.world.spawn(Entity::Spell(spell)) {
            self.events.push(
                tick,
                BattleEvent::SpellCast {
                    id,
                    team,
                    kind,
                    target,
                },
            );
        }
    }

    fn run_practice(&mut self, dt: f32) {
        let Some(practice) = self.practice.as_mut() else {
            return;
        };
        let Some((kind, position)) = practice.update(dt) else {
            return;
        };
        let drop = practice.drops();
        let card = CardId::Unit(kind);
        let network_ids = (0..self.registry.spawn_count(card))
            .map(|i| NetworkId::new(format!("practice-{drop}-{i}")))
            .collect();
        let target_tick = self.world.tick();
        self.schedule(ScheduledAction {
            target_tick,
            action: BattleAction::PlayCard(CardPlay {
                card,
                team: Team::Enemy,
                position,
                network_ids,
                hand_slot: None,
            }),
        });
    }

    fn run_phases(&mut self, dt: f32) {
        for entity in self.world.entities_mut() {
            entity.prepare();
        }

        let intents: Vec<_> = {
            let ctx = ThinkContext {
                world: &self.world,
                arena: &self.arena,
                config: &self.config,
                dt,
            };
            self.world
                .entities()
                .filter(|e| e.is_alive())
                .map(|e| (e.id().clone(), e.think(&ctx)))
                .collect()
        };
        for (id, intent) in intents {
            if let Some(entity) = self.world.get_mut(&id) {
                entity.stage(intent);
            }
        }

        let mut effects = Vec::new();
        for id in self.world.ids() {
            let ctx = ApplyContext {
                config: &self.config,
                dt,
            };
            let Some(entity) = self.world.get_mut(&id) else {
                continue;
            };
            // Killed earlier this tick by someone else's apply.
            if !entity.is_alive() {
                continue;
            }
            entity.apply(&ctx, &mut effects);
            self.resolve_effects(&mut effects);
        }

        for entity in self.world.entities_mut() {
            entity.animate(dt);
        }
    }

    fn resolve_effects(&mut self, effects: &mut Vec<Effect>) {
        let tick = self.world.tick();
        for effect in effects.drain(..) {
            match effect {
                Effect::Damage { target, amount } => {
                    let Some(entity) = self.world.get_mut(&target) else {
                        continue;
                    };
                    let team = entity.team();
                    if entity.take_damage(amount).king_activated {
                        self.events.push(tick, BattleEvent::KingActivated { team });
                    }
                }
                Effect::Push { target, offset } => {
                    if let Some(unit) = self.world.get_mut(&target).and_then(Entity::as_unit_mut) {
                        if unit.body.is_alive() {
                            unit.body.position += offset;
                            unit.nudged = true;
                        }
                    }
                }
                Effect::Nudge { target } => {
                    if let Some(unit) = self.world.get_mut(&target).and_then(Entity::as_unit_mut) {
                        unit.nudged = true;
                    }
                }
                Effect::Spawn(entity) => {
                    self.world.spawn(*entity);
                }
                Effect::Event(event) => {
                    self.events.push(tick, event);
                }
            }
        }
    }

    fn sweep(&mut self) {
        let tick = self.world.tick();
        for entity in self.world.sweep_dead() {
            let event = match &entity {
                Entity::Tower(tower) => BattleEvent::TowerDestroyed {
                    id: tower.id().clone(),
                    team: tower.team(),
                    kind: tower.kind,
                },
                Entity::Unit(unit) => BattleEvent::EntityDestroyed {
                    id: unit.id().clone(),
                    team: unit.team(),
                },
                Entity::Projectile(_) | Entity::Spell(_) => continue,
            };
            if let BattleEvent::TowerDestroyed { id, .. } = &event {
                log::info!("{} destroyed at tick {}", id, tick);
            }
            self.events.push(tick, event);
        }
    }

    fn wake_kings(&mut self) {
        for team in [Team::Player, Team::Enemy] {
            let princess_lost = self.world.tower(team, TowerSlot::Left).is_none()
                || self.world.tower(team, TowerSlot::Right).is_none();
            if !princess_lost {
                continue;
            }
            let woke = self
                .world
                .tower_mut(team, TowerSlot::King)
                .is_some_and(Tower::activate);
            if woke {
                self.events
                    .push(self.world.tick(), BattleEvent::KingActivated { team });
            }
        }
    }

    /// Updates crowns and ends the match when a king falls, or when any
    /// tower falls during sudden death.
    fn check_towers(&mut self) {
        let kings = [Team::Player, Team::Enemy].map(|team| self.world.tower(team, TowerSlot::King).is_some());
        let counts = self.tower_counts();
        for team in [Team::Player, Team::Enemy] {
            let lost = if kings[team.index()] {
                3 - counts[team.index()].min(3) as u8
            } else {
                3
            };
            self.crowns[team.opponent().index()] = lost;
        }

        let outcome = match kings {
            [true, true] if self.clock.sudden_death => {
                let before = self.clock.towers_at_sudden_death;
                let player_lost = counts[0] < before[0];
                let enemy_lost = counts[1] < before[1];
                match (player_lost, enemy_lost) {
                    (false, false) => None,
                    (true, false) => Some(Outcome::Winner(Team::Enemy)),
                    (false, true) => Some(Outcome::Winner(Team::Player)),
                    (true, true) => Some(Outcome::Draw),
                }
            }
            [true, true] => None,
            [false, true] => Some(Outcome::Winner(Team::Enemy)),
            [true, false] => Some(Outcome::Winner(Team::Player)),
            [false, false] => Some(Outcome::Draw),
        };
        if let Some(outcome) = outcome {
            self.finish(outcome);
        }
    }

    fn advance_clock(&mut self, dt: f32) {
        if self.outcome.is_some() {
            return;
        }
        self.clock.remaining -= dt;
        if self.clock.remaining > 0.0 {
            return;
        }

        let counts = self.tower_counts();
        if !self.clock.sudden_death {
            if counts[0] == counts[1] {
                log::info!("time up with {} towers each, sudden death", counts[0]);
                self.clock = MatchClock {
                    remaining: self.config.overtime_duration,
                    sudden_death: true,
                    towers_at_sudden_death: counts,
                };
                self.events.push(self.world.tick(), BattleEvent::SuddenDeath);
            } else if counts[0] > counts[1] {
                self.finish(Outcome::Winner(Team::Player));
            } else {
                self.finish(Outcome::Winner(Team::Enemy));
            }
            return;
        }

        let health = self.tower_health();
        let outcome = if health[0] > health[1] {
            Outcome::Winner(Team::Player)
        } else if health[1] > health[0] {
            Outcome::Winner(Team::Enemy)
        } else {
            Outcome::Draw
        };
        self.finish(outcome);
    }

    fn finish(&mut self, outcome: Outcome) {
        log::info!(
            "battle over at tick {}: {:?}, crowns {:?}",
            self.world.tick(),
            outcome,
            self.crowns
        );
        self.outcome = Some(outcome);
        self.events
            .push(self.world.tick(), BattleEvent::GameOver { outcome });
    }

    fn tower_counts(&self) -> [usize; 2] {
        let mut counts = [0; 2];
        for tower in self.world.towers().filter(|t| t.body.is_alive()) {
            counts[tower.team().index()] += 1;
        }
        counts
    }

    fn tower_health(&self) -> [f32; 2] {
        let mut health = [0.0; 2];
        for tower in self.world.towers().filter(|t| t.body.is_alive()) {
            health[tower.team().index()] += tower.body.health;
        }
        health
    }
}

/// Tower ids are absolute so both peers agree on them: the owner is the
/// seat that owns the tower and the lane is the physical one, as seen
/// from the first seat.
pub fn tower_id(team: Team, slot: TowerSlot, perspective: Team) -> NetworkId {
    let (owner, lane) = match perspective {
        Team::Player => (team, slot),
        Team::Enemy => (team.opponent(), slot.mirrored()),
    };
    NetworkId::new(format!("tower-{}-{}", owner.as_str(), lane.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn offline() -> Battle {
        Battle::with_standard_rules(MatchSetup::default())
    }

    fn drop_point() -> Vec2 {
        Vec2::new(240.0, 500.0)
    }

    #[test]
    fn towers_get_absolute_ids() {
        let first = offline();
        let second = Battle::with_standard_rules(MatchSetup {
            perspective: Team::Enemy,
            ..MatchSetup::default()
        });

        let mut first_ids = first.world().ids();
        let mut second_ids = second.world().ids();
        first_ids.sort();
        second_ids.sort();
        assert_eq!(first_ids, second_ids);
        assert_eq!(first_ids.len(), 6);

        // The second seat's own left tower is the first seat's enemy right.
        let own_left = second.world().tower(Team::Player, TowerSlot::Left).unwrap();
        assert_eq!(own_left.id().as_str(), "tower-enemy-right");
    }

    #[test]
    fn offline_play_spends_and_rotates() {
        let mut battle = offline();
        let card = battle.player().hand()[0];
        let upcoming = battle.player().next_card().unwrap();
        let cost = battle.registry().cost(card);

        let request = battle.play_card(0, drop_point()).unwrap();

        assert_eq!(request.card, card);
        assert_eq!(battle.player().elixir, 5.0 - cost as f32);
        assert_eq!(battle.player().reserved_elixir, 0.0);
        assert_eq!(battle.player().hand()[0], upcoming);
        assert_eq!(battle.player().card_count(), 8);
        assert_eq!(
            battle.world().units().count(),
            battle.registry().spawn_count(card)
        );
    }

    #[test]
    fn rejects_unaffordable_play() {
        let mut battle = offline();
        battle.play_card(0, drop_point()).unwrap();
        let err = battle.play_card(1, drop_point()).unwrap_err();
        assert!(matches!(err, PlayError::InsufficientElixir { needed: 3, .. }));
    }

    #[test]
    fn rejects_bad_drop_points() {
        let mut battle = offline();
        assert!(matches!(
            battle.play_card(0, Vec2::new(240.0, 200.0)),
            Err(PlayError::OutsideDeployZone { .. })
        ));
        assert_eq!(
            battle.play_card(0, Vec2::new(152.0, 530.0)),
            Err(PlayError::OnTower)
        );
        assert_eq!(battle.play_card(9, drop_point()), Err(PlayError::EmptySlot(9)));
    }

    #[test]
    fn networked_play_waits_for_echo() {
        let mut battle = Battle::with_standard_rules(MatchSetup {
            mode: PlayMode::Networked,
            ..MatchSetup::default()
        });
        let request = battle.play_card(0, drop_point()).unwrap();

        assert_eq!(request.target_tick, 10);
        assert_eq!(battle.player().elixir, 5.0);
        assert_eq!(battle.player().available_elixir(), 2.0);
        assert_eq!(battle.world().units().count(), 0);
        assert!(matches!(
            battle.play_card(1, drop_point()),
            Err(PlayError::InsufficientElixir { .. })
        ));
        assert_eq!(battle.drain_outbox(), vec![Outbound::Play(request.clone())]);

        battle.schedule(ScheduledAction {
            target_tick: request.target_tick,
            action: BattleAction::PlayCard(CardPlay {
                card: request.card,
                team: Team::Player,
                position: request.position,
                network_ids: request.network_ids.clone(),
                hand_slot: Some(request.hand_index),
            }),
        });
        for _ in 0..9 {
            battle.update(DT);
        }
        assert_eq!(battle.world().units().count(), 0);
        battle.update(DT);
        assert!(battle.world().units().count() > 0);
        assert_eq!(battle.player().elixir, 2.0);
        assert_eq!(battle.player().reserved_elixir, 0.0);
    }

    fn echo(request: &PlayRequest) -> ScheduledAction {
        ScheduledAction {
            target_tick: request.target_tick,
            action: BattleAction::PlayCard(CardPlay {
                card: request.card,
                team: Team::Player,
                position: request.position,
                network_ids: request.network_ids.clone(),
                hand_slot: Some(request.hand_index),
            }),
        }
    }

    #[test]
    fn pending_slot_cannot_be_played_twice() {
        let config = SimulationConfig {
            starting_elixir: 10.0,
            ..SimulationConfig::default()
        };
        let mut battle = Battle::new(
            config,
            CardRegistry::standard(),
            MatchSetup {
                mode: PlayMode::Networked,
                ..MatchSetup::default()
            },
        );
        let first = battle.play_card(0, drop_point()).unwrap();
        assert_eq!(first.hand_index, 0);
        assert_eq!(
            battle.play_card(0, drop_point()),
            Err(PlayError::SlotPending(0))
        );
        let second = battle.play_card(1, Vec2::new(200.0, 480.0)).unwrap();
        let held = [first.card, second.card];

        battle.schedule(echo(&first));
        battle.schedule(echo(&second));
        for _ in 0..first.target_tick {
            battle.update(DT);
        }

        let player = battle.player();
        assert_eq!(battle.world().units().count(), 2);
        assert_eq!(player.elixir, 4.0);
        assert_eq!(player.reserved_elixir, 0.0);
        assert_eq!(player.card_count(), 8);
        assert!(!player.is_slot_pending(0));
        assert!(!player.is_slot_pending(1));
        let deck: Vec<_> = player.deck().copied().collect();
        let mut cycled = deck[deck.len() - 2..].to_vec();
        let mut expected = held.to_vec();
        cycled.sort();
        expected.sort();
        assert_eq!(cycled, expected);
        assert!(battle.play_card(0, drop_point()).is_ok());
    }

    #[test]
    fn practice_drops_share_the_scheduler_order() {
        let config = SimulationConfig {
            practice_interval: DT,
            ..SimulationConfig::default()
        };
        let mut battle = Battle::new(
            config,
            CardRegistry::standard(),
            MatchSetup {
                practice: true,
                ..MatchSetup::default()
            },
        );
        for id in ["z-knight", "a-knight"] {
            battle.schedule(ScheduledAction {
                target_tick: 1,
                action: BattleAction::PlayCard(CardPlay {
                    card: CardId::Unit(UnitKind::Knight),
                    team: Team::Player,
                    position: drop_point(),
                    network_ids: vec![id.into()],
                    hand_slot: None,
                }),
            });
        }
        battle.update(DT);

        let spawned: Vec<String> = battle
            .drain_events()
            .into_iter()
            .filter_map(|e| match e.event {
                BattleEvent::UnitSpawned { id, .. } => Some(id.as_str().to_owned()),
                _ => None,
            })
            .collect();
        assert!(spawned.len() >= 3);
        assert_eq!(spawned.first().map(String::as_str), Some("a-knight"));
        assert_eq!(spawned.last().map(String::as_str), Some("z-knight"));
        assert!(spawned[1..spawned.len() - 1]
            .iter()
            .all(|id| id.starts_with("practice-1-")));
    }

    #[test]
    fn going_offline_releases_reservations() {
        let mut battle = Battle::with_standard_rules(MatchSetup {
            mode: PlayMode::Networked,
            ..MatchSetup::default()
        });
        battle.play_card(0, drop_point()).unwrap();
        battle.go_offline();
        assert_eq!(battle.mode(), PlayMode::Offline);
        assert_eq!(battle.player().available_elixir(), 5.0);
        assert!(battle.drain_outbox().is_empty());
    }

    #[test]
    fn princess_loss_wakes_king_and_awards_crown() {
        let mut battle = offline();
        battle
            .world_mut()
            .tower_mut(Team::Enemy, TowerSlot::Left)
            .unwrap()
            .body
            .health = 0.0;
        battle.update(DT);

        assert!(battle.world().tower(Team::Enemy, TowerSlot::Left).is_none());
        assert!(battle.world().tower(Team::Enemy, TowerSlot::King).unwrap().active);
        assert_eq!(battle.crowns(), [1, 0]);
        let events: Vec<_> = battle.drain_events().into_iter().map(|e| e.event).collect();
        assert!(events
            .iter()
            .any(|e| matches!(e, BattleEvent::TowerDestroyed { .. })));
        assert!(events
            .iter()
            .any(|e| *e == BattleEvent::KingActivated { team: Team::Enemy }));
        assert!(battle.outcome().is_none());
    }

    #[test]
    fn king_loss_ends_match() {
        let mut battle = offline();
        battle
            .world_mut()
            .tower_mut(Team::Player, TowerSlot::King)
            .unwrap()
            .body
            .health = 0.0;
        battle.update(DT);

        assert_eq!(battle.outcome(), Some(Outcome::Winner(Team::Enemy)));
        assert_eq!(battle.crowns(), [0, 3]);
        let tick = battle.tick();
        battle.update(DT);
        assert_eq!(battle.tick(), tick);
    }

    #[test]
    fn even_towers_go_to_sudden_death_then_health() {
        let config = SimulationConfig {
            battle_duration: 1.0,
            overtime_duration: 1.0,
            ..SimulationConfig::default()
        };
        let mut battle = Battle::new(config, CardRegistry::standard(), MatchSetup::default());

        for _ in 0..70 {
            battle.update(DT);
        }
        assert!(battle.is_sudden_death());
        assert!(battle.outcome().is_none());

        battle
            .world_mut()
            .tower_mut(Team::Enemy, TowerSlot::King)
            .unwrap()
            .body
            .health -= 10.0;
        for _ in 0..70 {
            battle.update(DT);
        }
        assert_eq!(battle.outcome(), Some(Outcome::Winner(Team::Player)));
    }

    #[test]
    fn tower_lead_wins_on_time() {
        let config = SimulationConfig {
            battle_duration: 0.5,
            ..SimulationConfig::default()
        };
        let mut battle = Battle::new(config, CardRegistry::standard(), MatchSetup::default());
        battle
            .world_mut()
            .tower_mut(Team::Player, TowerSlot::Right)
            .unwrap()
            .body
            .health = 0.0;
        for _ in 0..40 {
            battle.update(DT);
        }
        assert_eq!(battle.outcome(), Some(Outcome::Winner(Team::Enemy)));
        assert!(!battle.is_sudden_death());
    }

    #[test]
    fn practice_opponent_drops_enemy_units() {
        let mut battle = Battle::with_standard_rules(MatchSetup {
            practice: true,
            ..MatchSetup::default()
        });
        for _ in 0..(60 * 5 + 1) {
            battle.update(DT);
        }
        assert!(battle
            .world()
            .units()
            .any(|u| u.team() == Team::Enemy && u.id().as_str().starts_with("practice-1-")));
    }
}
