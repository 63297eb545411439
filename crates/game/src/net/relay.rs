use std::collections::{HashMap, VecDeque};
use std::io::{self, BufReader};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::entity::Team;
use crate::lobby::{ClientId, MatchQueue, QueueEntry, SessionId, SessionManager};

use super::frame::{FrameError, read_message, write_message};
use super::protocol::{Disconnect, ErrorData, MatchFound, Message, MessageType, QueueJoin};

const ACCEPT_POLL: Duration = Duration::from_millis(10);
const OPPONENT_DISCONNECTED: &str = "opponent_disconnected";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub pair_interval: Duration,
    pub max_clients: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            pair_interval: Duration::from_millis(500),
            max_clients: 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    Graceful,
    Closed,
    Error,
    Shutdown,
}

impl DisconnectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisconnectReason::Graceful => "disconnected",
            DisconnectReason::Closed => "closed the connection",
            DisconnectReason::Error => "dropped after an error",
            DisconnectReason::Shutdown => "dropped at shutdown",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    ClientConnected {
        client_id: ClientId,
        addr: SocketAddr,
    },
    ClientRejected {
        addr: SocketAddr,
        reason: String,
    },
    Queued {
        client_id: ClientId,
        player_id: String,
    },
    MatchStarted {
        session_id: SessionId,
        player: String,
        enemy: String,
    },
    SessionEnded {
        session_id: SessionId,
        actions_relayed: u64,
    },
    ClientDisconnected {
        client_id: ClientId,
        reason: DisconnectReason,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RelayStats {
    pub uptime_secs: u64,
    pub connected: usize,
    pub max_clients: usize,
    pub queued: usize,
    pub longest_wait_secs: u64,
    pub active_sessions: usize,
    pub messages_received: u64,
    pub messages_relayed: u64,
    pub decode_errors: u64,
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub id: SessionId,
    pub player: String,
    pub enemy: String,
    pub age_secs: u64,
    pub actions_relayed: u64,
}

struct ClientHandle {
    addr: SocketAddr,
    writer: Arc<Mutex<TcpStream>>,
}

struct Shared {
    config: ServerConfig,
    running: AtomicBool,
    started_at: Instant,
    next_client_id: AtomicU64,
    clients: Mutex<HashMap<ClientId, ClientHandle>>,
    queue: Mutex<MatchQueue>,
    sessions: Mutex<SessionManager>,
    events: Mutex<VecDeque<RelayEvent>>,
    messages_received: AtomicU64,
    messages_relayed: AtomicU64,
    decode_errors: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn emit(&self, event: RelayEvent) {
        lock(&self.events).push_back(event);
    }

    /// Writes to one client. The table lock is only held to find the
    /// connection, never across the write itself.
    fn send_to(&self, client_id: ClientId, message: &Message) -> bool {
        let writer = match lock(&self.clients).get(&client_id) {
            Some(handle) => Arc::clone(&handle.writer),
            None => return false,
        };
        let result = write_message(&mut *lock(&writer), message);
        match result {
            Ok(()) => true,
            Err(e) => {
                log::warn!("send to client {} failed: {}", client_id, e);
                false
            }
        }
    }

    fn send_payload<T: Serialize>(&self, client_id: ClientId, kind: MessageType, payload: &T) {
        match Message::new(kind, payload) {
            Ok(message) => {
                self.send_to(client_id, &message);
            }
            Err(e) => log::warn!("could not encode {:?}: {}", kind, e),
        }
    }
}

/// Matchmaking relay. Pairs queued players and echoes every game action
/// from either seat to both; it never looks inside the actions.
pub struct RelayServer {
    local_addr: SocketAddr,
    shared: Arc<Shared>,
    threads: Vec<JoinHandle<()>>,
}

impl RelayServer {
    pub fn bind(addr: impl ToSocketAddrs, config: ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let shared = Arc::new(Shared {
            config,
            running: AtomicBool::new(true),
            started_at: Instant::now(),
            next_client_id: AtomicU64::new(1),
            clients: Mutex::new(HashMap::new()),
            queue: Mutex::new(MatchQueue::new()),
            sessions: Mutex::new(SessionManager::new()),
            events: Mutex::new(VecDeque::new()),
            messages_received: AtomicU64::new(0),
            messages_relayed: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
        });

        let accept_shared = Arc::clone(&shared);
        let accept = thread::Builder::new()
            .name("relay-accept".into())
            .spawn(move || accept_loop(&accept_shared, &listener))?;

        let pair_shared = Arc::clone(&shared);
        let pairing = thread::Builder::new()
            .name("relay-pair".into())
            .spawn(move || pairing_loop(&pair_shared))?;

        log::info!("relay listening on {}", local_addr);
        Ok(Self {
            local_addr,
            shared,
            threads: vec![accept, pairing],
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn drain_events(&self) -> Vec<RelayEvent> {
        lock(&self.shared.events).drain(..).collect()
    }

    pub fn stats(&self) -> RelayStats {
        let shared = &self.shared;
        let connected = lock(&shared.clients).len();
        let (queued, longest_wait_secs) = {
            let queue = lock(&shared.queue);
            (queue.len(), queue.longest_wait().map_or(0, |d| d.as_secs()))
        };
        let active_sessions = lock(&shared.sessions).active_count();
        RelayStats {
            uptime_secs: shared.started_at.elapsed().as_secs(),
            connected,
            max_clients: shared.config.max_clients,
            queued,
            longest_wait_secs,
            active_sessions,
            messages_received: shared.messages_received.load(Ordering::Relaxed),
            messages_relayed: shared.messages_relayed.load(Ordering::Relaxed),
            decode_errors: shared.decode_errors.load(Ordering::Relaxed),
        }
    }

    pub fn sessions(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<_> = lock(&self.shared.sessions)
            .iter()
            .map(|s| SessionSummary {
                id: s.id,
                player: s.player.player_id.clone(),
                enemy: s.enemy.player_id.clone(),
                age_secs: s.started_at.elapsed().as_secs(),
                actions_relayed: s.actions_relayed,
            })
            .collect();
        summaries.sort_by_key(|s| s.id);
        summaries
    }

    pub fn stop(&mut self) {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return;
        }
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
        // Closing the sockets wakes every client thread out of its read.
        for handle in lock(&self.shared.clients).values() {
            let _ = lock(&handle.writer).shutdown(Shutdown::Both);
        }
        log::info!("relay on {} stopped", self.local_addr);
    }
}

impl Drop for RelayServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn accept_loop(shared: &Arc<Shared>, listener: &TcpListener) {
    while shared.running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, addr)) => {
                if let Err(e) = admit(shared, stream, addr) {
                    log::warn!("could not admit {}: {}", addr, e);
                    shared.emit(RelayEvent::Error {
                        message: format!("admit {addr}: {e}"),
                    });
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
            Err(e) => {
                log::warn!("accept failed: {}", e);
                thread::sleep(ACCEPT_POLL);
            }
        }
    }
}

fn admit(shared: &Arc<Shared>, stream: TcpStream, addr: SocketAddr) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_nodelay(true)?;

    if lock(&shared.clients).len() >= shared.config.max_clients {
        let reason = "server full".to_owned();
        let mut stream = stream;
        if let Ok(message) = Message::new(
            MessageType::Error,
            &ErrorData {
                message: reason.clone(),
            },
        ) {
            let _ = write_message(&mut stream, &message);
        }
        log::warn!("rejected {}: {}", addr, reason);
        shared.emit(RelayEvent::ClientRejected { addr, reason });
        return Ok(());
    }

    let client_id = shared.next_client_id.fetch_add(1, Ordering::SeqCst);
    let reader = stream.try_clone()?;
    lock(&shared.clients).insert(
        client_id,
        ClientHandle {
            addr,
            writer: Arc::new(Mutex::new(stream)),
        },
    );
    log::info!("client {} connected from {}", client_id, addr);
    shared.emit(RelayEvent::ClientConnected { client_id, addr });

    let client_shared = Arc::clone(shared);
    let spawned = thread::Builder::new()
        .name(format!("relay-client-{client_id}"))
        .spawn(move || serve_client(&client_shared, client_id, reader));
    if let Err(e) = spawned {
        drop_client(shared, client_id, DisconnectReason::Error);
        return Err(e);
    }
    Ok(())
}

fn serve_client(shared: &Arc<Shared>, client_id: ClientId, stream: TcpStream) {
    let mut reader = BufReader::new(stream);
    let reason = loop {
        if !shared.running.load(Ordering::SeqCst) {
            break DisconnectReason::Shutdown;
        }
        match read_message(&mut reader) {
            Ok(message) => {
                shared.messages_received.fetch_add(1, Ordering::Relaxed);
                if !handle_message(shared, client_id, message) {
                    break DisconnectReason::Graceful;
                }
            }
            Err(e) if e.is_recoverable() => {
                shared.decode_errors.fetch_add(1, Ordering::Relaxed);
                log::warn!("client {} sent an undecodable message: {}", client_id, e);
            }
            Err(FrameError::Closed) => break DisconnectReason::Closed,
            Err(e) => {
                log::warn!("client {} transport error: {}", client_id, e);
                break DisconnectReason::Error;
            }
        }
    };
    drop_client(shared, client_id, reason);
}

/// Returns false when the client asked to leave.
fn handle_message(shared: &Shared, client_id: ClientId, message: Message) -> bool {
    match message.kind {
        MessageType::QueueJoin => match message.payload::<QueueJoin>() {
            Ok(join) => {
                let entry = QueueEntry::new(client_id, join.player_id.clone(), join.deck);
                let in_session = lock(&shared.sessions).session_of(client_id).is_some();
                if !in_session && lock(&shared.queue).enqueue(entry) {
                    log::info!("{} queued", join.player_id);
                    shared.emit(RelayEvent::Queued {
                        client_id,
                        player_id: join.player_id,
                    });
                }
            }
            Err(e) => log::warn!("bad QUEUE_JOIN from client {}: {}", client_id, e),
        },
        MessageType::QueueLeave => {
            if lock(&shared.queue).dequeue(client_id) {
                log::info!("client {} left the queue", client_id);
            }
        }
        MessageType::GameAction => relay_action(shared, client_id, &message),
        MessageType::Disconnect => return false,
        MessageType::Heartbeat => {}
        MessageType::MatchFound | MessageType::Error => {
            log::debug!("ignoring {:?} from client {}", message.kind, client_id);
        }
    }
    true
}

fn relay_action(shared: &Shared, client_id: ClientId, message: &Message) {
    let participants = {
        let mut sessions = lock(&shared.sessions);
        match sessions.session_of_mut(client_id) {
            Some(session) if session.active => {
                session.actions_relayed += 1;
                session.participants()
            }
            _ => {
                log::debug!("client {} sent an action outside a session", client_id);
                return;
            }
        }
    };
    for participant in participants {
        if shared.send_to(participant, message) {
            shared.messages_relayed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

fn drop_client(shared: &Shared, client_id: ClientId, reason: DisconnectReason) {
    let handle = lock(&shared.clients).remove(&client_id);
    let Some(handle) = handle else {
        return;
    };
    let _ = lock(&handle.writer).shutdown(Shutdown::Both);
    lock(&shared.queue).dequeue(client_id);

    let ended = lock(&shared.sessions).end_for(client_id);
    if let Some(session) = ended {
        if let Some(opponent) = session.opponent_of(client_id) {
            shared.send_payload(
                opponent.client_id,
                MessageType::Disconnect,
                &Disconnect {
                    player_id: opponent.player_id.clone(),
                    reason: OPPONENT_DISCONNECTED.to_owned(),
                },
            );
        }
        log::info!(
            "session {} ended after {} actions",
            session.id,
            session.actions_relayed
        );
        shared.emit(RelayEvent::SessionEnded {
            session_id: session.id,
            actions_relayed: session.actions_relayed,
        });
    }

    log::info!("client {} ({}) {}", client_id, handle.addr, reason.as_str());
    shared.emit(RelayEvent::ClientDisconnected { client_id, reason });
}

fn pairing_loop(shared: &Shared) {
    let mut last_pass = Instant::now();
    while shared.running.load(Ordering::SeqCst) {
        thread::sleep(ACCEPT_POLL);
        if last_pass.elapsed() < shared.config.pair_interval {
            continue;
        }
        last_pass = Instant::now();
        pair_waiting(shared);
    }
}

fn pair_waiting(shared: &Shared) {
    loop {
        let Some((first, second)) = lock(&shared.queue).pop_pair() else {
            return;
        };
        let session_id = lock(&shared.sessions).create(&first, &second).id;

        let connected = {
            let clients = lock(&shared.clients);
            [&first, &second].map(|entry| clients.contains_key(&entry.client_id))
        };
        if connected != [true, true] {
            lock(&shared.sessions).end_for(first.client_id);
            let mut queue = lock(&shared.queue);
            for (entry, alive) in [first, second].into_iter().zip(connected) {
                if alive {
                    queue.enqueue(entry);
                }
            }
            continue;
        }

        for (me, them, side) in [
            (&first, &second, Team::Player),
            (&second, &first, Team::Enemy),
        ] {
            shared.send_payload(
                me.client_id,
                MessageType::MatchFound,
                &MatchFound {
                    player_id: me.player_id.clone(),
                    opponent_id: them.player_id.clone(),
                    side,
                },
            );
        }

        log::info!(
            "session {}: {} vs {}",
            session_id,
            first.player_id,
            second.player_id
        );
        shared.emit(RelayEvent::MatchStarted {
            session_id,
            player: first.player_id,
            enemy: second.player_id,
        });
    }
}
