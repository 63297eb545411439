use std::collections::VecDeque;

use super::types::BattleEvent;

#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvent {
    pub tick: u64,
    pub sequence: u32,
    pub event: BattleEvent,
}

#[derive(Debug)]
pub struct EventQueue {
    pending: VecDeque<TimedEvent>,
    next_sequence: u32,
    max_pending: usize,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventQueue {
    pub fn new(max_pending: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(max_pending.min(1024)),
            next_sequence: 0,
            max_pending,
        }
    }

    pub fn push(&mut self, tick: u64, event: BattleEvent) -> u32 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);

        if self.pending.len() >= self.max_pending {
            self.evict_oldest();
        }

        self.pending.push_back(TimedEvent {
            tick,
            sequence,
            event,
        });
        sequence
    }

    pub fn drain(&mut self) -> Vec<TimedEvent> {
        self.pending.drain(..).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimedEvent> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    fn evict_oldest(&mut self) {
        let idx = self
            .pending
            .iter()
            .position(|e| e.event.is_cosmetic())
            .unwrap_or(0);
        self.pending.remove(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{NetworkId, Team};
    use glam::Vec2;

    fn hit() -> BattleEvent {
        BattleEvent::MeleeHit {
            attacker: NetworkId::new("a"),
            target: NetworkId::new("b"),
            position: Vec2::ZERO,
        }
    }

    #[test]
    fn drain_preserves_order() {
        let mut queue = EventQueue::new(8);
        queue.push(1, BattleEvent::KingActivated { team: Team::Enemy });
        queue.push(2, BattleEvent::SuddenDeath);

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].sequence, 0);
        assert_eq!(drained[1].event, BattleEvent::SuddenDeath);
        assert!(queue.is_empty());
    }

    #[test]
    fn overflow_drops_cosmetic_first() {
        let mut queue = EventQueue::new(2);
        queue.push(1, BattleEvent::SuddenDeath);
        queue.push(1, hit());
        queue.push(2, BattleEvent::KingActivated { team: Team::Player });

        let events: Vec<_> = queue.drain().into_iter().map(|e| e.event).collect();
        assert_eq!(
            events,
            vec![
                BattleEvent::SuddenDeath,
                BattleEvent::KingActivated { team: Team::Player }
            ]
        );
    }
}
