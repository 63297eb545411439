use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::entity::Team;

pub type ClientId = u64;
pub type SessionId = u64;

#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub client_id: ClientId,
    pub player_id: String,
    pub deck: Vec<String>,
    pub joined_at: Instant,
}

impl QueueEntry {
    pub fn new(client_id: ClientId, player_id: impl Into<String>, deck: Vec<String>) -> Self {
        Self {
            client_id,
            player_id: player_id.into(),
            deck,
            joined_at: Instant::now(),
        }
    }
}

/// Players waiting for an opponent, longest-waiting first.
#[derive(Debug, Default)]
pub struct MatchQueue {
    entries: VecDeque<QueueEntry>,
}

impl MatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, entry: QueueEntry) -> bool {
        if self.entries.iter().any(|e| e.client_id == entry.client_id) {
            return false;
        }
        self.entries.push_back(entry);
        true
    }

    pub fn dequeue(&mut self, client_id: ClientId) -> bool {
        if let Some(pos) = self.entries.iter().position(|e| e.client_id == client_id) {
            self.entries.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn position(&self, client_id: ClientId) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.client_id == client_id)
            .map(|p| p + 1)
    }

    pub fn longest_wait(&self) -> Option<Duration> {
        self.entries.front().map(|e| e.joined_at.elapsed())
    }

    /// Takes the two longest-waiting players, oldest first.
    pub fn pop_pair(&mut self) -> Option<(QueueEntry, QueueEntry)> {
        if self.entries.len() < 2 {
            return None;
        }
        let first = self.entries.pop_front()?;
        let second = self.entries.pop_front()?;
        Some((first, second))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub client_id: ClientId,
    pub player_id: String,
}

#[derive(Debug, Clone)]
pub struct GameSession {
    pub id: SessionId,
    pub player: Seat,
    pub enemy: Seat,
    pub started_at: Instant,
    pub active: bool,
    pub actions_relayed: u64,
}

impl GameSession {
    pub fn participants(&self) -> [ClientId; 2] {
        [self.player.client_id, self.enemy.client_id]
    }

    pub fn side_of(&self, client_id: ClientId) -> Option<Team> {
        if self.player.client_id == client_id {
            Some(Team::Player)
        } else if self.enemy.client_id == client_id {
            Some(Team::Enemy)
        } else {
            None
        }
    }

    pub fn opponent_of(&self, client_id: ClientId) -> Option<&Seat> {
        match self.side_of(client_id)? {
            Team::Player => Some(&self.enemy),
            Team::Enemy => Some(&self.player),
        }
    }
}

/// Live pairings, indexed by session and by participant.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: HashMap<SessionId, GameSession>,
    client_sessions: HashMap<ClientId, SessionId>,
    next_session_id: SessionId,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seats `first` on the player side and `second` on the enemy side.
    pub fn create(&mut self, first: &QueueEntry, second: &QueueEntry) -> &GameSession {
        let id = self.next_session_id;
        self.next_session_id += 1;

        let seat = |entry: &QueueEntry| Seat {
            client_id: entry.client_id,
            player_id: entry.player_id.clone(),
        };
        self.client_sessions.insert(first.client_id, id);
        self.client_sessions.insert(second.client_id, id);
        self.sessions.entry(id).or_insert(GameSession {
            id,
            player: seat(first),
            enemy: seat(second),
            started_at: Instant::now(),
            active: true,
            actions_relayed: 0,
        })
    }

    pub fn get(&self, id: SessionId) -> Option<&GameSession> {
        self.sessions.get(&id)
    }

    pub fn session_of(&self, client_id: ClientId) -> Option<&GameSession> {
        let id = self.client_sessions.get(&client_id)?;
        self.sessions.get(id)
    }

    pub fn session_of_mut(&mut self, client_id: ClientId) -> Option<&mut GameSession> {
        let id = self.client_sessions.get(&client_id)?;
        self.sessions.get_mut(id)
    }

    /// Tears down the session `client_id` belongs to and returns it,
    /// marked inactive, so the caller can notify the other seat.
    pub fn end_for(&mut self, client_id: ClientId) -> Option<GameSession> {
        let id = self.client_sessions.remove(&client_id)?;
        let mut session = self.sessions.remove(&id)?;
        for participant in session.participants() {
            self.client_sessions.remove(&participant);
        }
        session.active = false;
        Some(session)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameSession> {
        self.sessions.values()
    }

    pub fn active_count(&self) -> usize {
        self.sessions.values().filter(|s| s.active).count()
    }
}
