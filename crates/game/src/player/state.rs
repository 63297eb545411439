use std::collections::VecDeque;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::cards::CardId;
use crate::entity::Team;
use crate::simulation::SimulationConfig;

pub const HAND_SIZE: usize = 4;

/// Elixir and card cycle for one side of the battle.
#[derive(Debug, Clone)]
pub struct Player {
    pub team: Team,
    pub elixir: f32,
    /// Elixir promised to plays that are waiting for their scheduled tick.
    pub reserved_elixir: f32,
    /// Hand slots holding a card whose play has not run yet.
    pending_slots: Vec<usize>,
    regen_timer: f32,
    hand: Vec<CardId>,
    next_card: Option<CardId>,
    deck: VecDeque<CardId>,
}

impl Player {
    pub fn new<R: Rng>(team: Team, mut cards: Vec<CardId>, rng: &mut R, elixir: f32) -> Self {
        cards.shuffle(rng);
        let mut deck: VecDeque<CardId> = cards.into();
        let take = HAND_SIZE.min(deck.len());
        let hand = deck.drain(..take).collect();
        let next_card = deck.pop_front();
        Self {
            team,
            elixir,
            reserved_elixir: 0.0,
            pending_slots: Vec::new(),
            regen_timer: 0.0,
            hand,
            next_card,
            deck,
        }
    }

    pub fn hand(&self) -> &[CardId] {
        &self.hand
    }

    pub fn next_card(&self) -> Option<CardId> {
        self.next_card
    }

    pub fn deck(&self) -> impl Iterator<Item = &CardId> {
        self.deck.iter()
    }

    /// Every card this player owns, in hand, on deck and queued.
    pub fn card_count(&self) -> usize {
        self.hand.len() + usize::from(self.next_card.is_some()) + self.deck.len()
    }

    pub fn is_slot_pending(&self, index: usize) -> bool {
        self.pending_slots.contains(&index)
    }

    pub fn available_elixir(&self) -> f32 {
        self.elixir - self.reserved_elixir
    }

    pub fn can_afford(&self, cost: u32) -> bool {
        self.available_elixir() >= cost as f32
    }

    /// Holds the slot and its elixir until the play runs.
    pub fn commit(&mut self, index: usize, cost: u32) {
        self.reserved_elixir += cost as f32;
        self.pending_slots.push(index);
    }

    /// Runs the accounting for a committed play: pays for it and cycles
    /// the card out of `index`. When the slot no longer holds `card` the
    /// hold is dropped and nothing is paid.
    pub fn settle(&mut self, index: usize, card: CardId, cost: u32) -> bool {
        let cost = cost as f32;
        self.pending_slots.retain(|&slot| slot != index);
        self.reserved_elixir = (self.reserved_elixir - cost).max(0.0);
        if self.hand.get(index) != Some(&card) {
            return false;
        }
        self.elixir = (self.elixir - cost).max(0.0);
        self.play_card(index);
        true
    }

    pub fn clear_reservations(&mut self) {
        self.reserved_elixir = 0.0;
        self.pending_slots.clear();
    }

    /// Adds one elixir per full regen interval, up to the cap.
    pub fn regenerate(&mut self, dt: f32, config: &SimulationConfig) {
        self.regen_timer += dt;
        if self.regen_timer >= config.elixir_regen_interval {
            self.regen_timer -= config.elixir_regen_interval;
            if self.elixir < config.max_elixir {
                self.elixir = (self.elixir + 1.0).min(config.max_elixir);
            }
        }
    }

    /// Plays the card in `index`. It goes to the back of the deck and the
    /// queued next card takes its slot.
    pub fn play_card(&mut self, index: usize) -> Option<CardId> {
        let played = *self.hand.get(index)?;
        self.deck.push_back(played);
        let replacement = match self.next_card.take() {
            Some(card) => card,
            None => self.deck.pop_front()?,
        };
        self.hand[index] = replacement;
        self.next_card = self.deck.pop_front();
        Some(played)
    }
}
