use std::io::{self, BufReader};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;

use crate::cards::CardId;
use crate::entity::Team;

use super::frame::{FrameError, read_message, write_message};
use super::protocol::{
    Disconnect, ErrorData, GameAction, Heartbeat, MatchFound, Message, MessageType, QueueJoin,
    QueueLeave,
};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub connect_timeout: Duration,
    pub heartbeat_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            heartbeat_interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    MatchFound(MatchFound),
    Action(GameAction),
    /// The relay went away or told us the session is over.
    Disconnected { reason: String },
    ServerError(String),
}

/// Connection to the relay. A send thread drains the outgoing queue and a
/// receive thread blocks on the socket; the owner polls for events once
/// per frame and never blocks.
pub struct NetworkClient {
    player_id: String,
    config: ClientConfig,
    stream: TcpStream,
    outgoing: Option<Sender<Message>>,
    incoming: Receiver<ClientEvent>,
    connected: Arc<AtomicBool>,
    side: Option<Team>,
    last_heartbeat: Instant,
    send_thread: Option<JoinHandle<()>>,
    recv_thread: Option<JoinHandle<()>>,
}

impl NetworkClient {
    pub fn connect(
        addr: impl ToSocketAddrs,
        player_id: impl Into<String>,
        config: ClientConfig,
    ) -> io::Result<Self> {
        let stream = connect_any(addr, config.connect_timeout)?;
        stream.set_nodelay(true)?;
        let player_id = player_id.into();
        log::info!("{} connected to relay {}", player_id, stream.peer_addr()?);

        let connected = Arc::new(AtomicBool::new(true));
        let (out_tx, out_rx) = mpsc::channel::<Message>();
        let (in_tx, in_rx) = mpsc::channel::<ClientEvent>();

        let mut writer = stream.try_clone()?;
        let send_connected = Arc::clone(&connected);
        let send_thread = thread::Builder::new()
            .name("relay-send".into())
            .spawn(move || {
                for message in out_rx {
                    if let Err(e) = write_message(&mut writer, &message) {
                        log::warn!("send to relay failed: {}", e);
                        send_connected.store(false, Ordering::SeqCst);
                        break;
                    }
                }
            })?;

        let mut reader = BufReader::new(stream.try_clone()?);
        let recv_connected = Arc::clone(&connected);
        let recv_thread = thread::Builder::new()
            .name("relay-recv".into())
            .spawn(move || receive_loop(&mut reader, &in_tx, &recv_connected))?;

        Ok(Self {
            player_id,
            config,
            stream,
            outgoing: Some(out_tx),
            incoming: in_rx,
            connected,
            side: None,
            last_heartbeat: Instant::now(),
            send_thread: Some(send_thread),
            recv_thread: Some(recv_thread),
        })
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Seat assigned by the last `MATCH_FOUND`.
    pub fn side(&self) -> Option<Team> {
        self.side
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.stream.peer_addr()
    }

    /// Everything received since the last call. Never blocks.
    pub fn poll(&mut self) -> Vec<ClientEvent> {
        let events: Vec<_> = self.incoming.try_iter().collect();
        for event in &events {
            match event {
                ClientEvent::MatchFound(found) => self.side = Some(found.side),
                ClientEvent::Disconnected { .. } => self.side = None,
                _ => {}
            }
        }
        events
    }

    pub fn join_queue(&self, deck: &[CardId]) -> bool {
        self.send(
            MessageType::QueueJoin,
            &QueueJoin {
                player_id: self.player_id.clone(),
                deck: deck.iter().map(|c| c.name().to_owned()).collect(),
            },
        )
    }

    pub fn leave_queue(&self) -> bool {
        self.send(
            MessageType::QueueLeave,
            &QueueLeave {
                player_id: self.player_id.clone(),
            },
        )
    }

    pub fn send_action(&self, action_type: &str, action_data: Value) -> bool {
        self.send(
            MessageType::GameAction,
            &GameAction {
                player_id: self.player_id.clone(),
                action_type: action_type.to_owned(),
                action_data,
            },
        )
    }

    /// Sends a heartbeat if the interval has elapsed.
    pub fn heartbeat(&mut self) {
        if self.last_heartbeat.elapsed() < self.config.heartbeat_interval {
            return;
        }
        self.last_heartbeat = Instant::now();
        self.send(
            MessageType::Heartbeat,
            &Heartbeat {
                player_id: self.player_id.clone(),
            },
        );
    }

    pub fn disconnect(&mut self, reason: &str) {
        if self.outgoing.is_none() {
            return;
        }
        self.send(
            MessageType::Disconnect,
            &Disconnect {
                player_id: self.player_id.clone(),
                reason: reason.to_owned(),
            },
        );
        self.close();
    }

    fn send<T: Serialize>(&self, kind: MessageType, payload: &T) -> bool {
        let Some(outgoing) = &self.outgoing else {
            return false;
        };
        if !self.is_connected() {
            return false;
        }
        match Message::new(kind, payload) {
            Ok(message) => outgoing.send(message).is_ok(),
            Err(e) => {
                log::warn!("could not encode {:?}: {}", kind, e);
                false
            }
        }
    }

    fn close(&mut self) {
        // Dropping the sender lets the send thread flush what is queued.
        self.outgoing.take();
        if let Some(handle) = self.send_thread.take() {
            let _ = handle.join();
        }
        let _ = self.stream.shutdown(Shutdown::Both);
        if let Some(handle) = self.recv_thread.take() {
            let _ = handle.join();
        }
        self.connected.store(false, Ordering::SeqCst);
    }
}

impl Drop for NetworkClient {
    fn drop(&mut self) {
        self.disconnect("client closed");
    }
}

fn connect_any(addr: impl ToSocketAddrs, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_error = None;
    for addr in addr.to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "address resolved to nothing")
    }))
}

fn receive_loop(
    reader: &mut BufReader<TcpStream>,
    events: &Sender<ClientEvent>,
    connected: &AtomicBool,
) {
    let reason = loop {
        let message = match read_message(reader) {
            Ok(message) => message,
            Err(e) if e.is_recoverable() => {
                log::warn!("dropping undecodable message: {}", e);
                continue;
            }
            Err(FrameError::Closed) => break "connection closed".to_owned(),
            Err(e) => break format!("connection error: {}", e),
        };
        if let Some(event) = translate(&message) {
            if events.send(event).is_err() {
                return;
            }
        }
    };
    if connected.swap(false, Ordering::SeqCst) {
        log::warn!("relay connection lost: {}", reason);
        let _ = events.send(ClientEvent::Disconnected { reason });
    }
}

fn translate(message: &Message) -> Option<ClientEvent> {
    let event = match message.kind {
        MessageType::MatchFound => message.payload().map(ClientEvent::MatchFound),
        MessageType::GameAction => message.payload().map(ClientEvent::Action),
        MessageType::Disconnect => message
            .payload::<Disconnect>()
            .map(|d| ClientEvent::Disconnected { reason: d.reason }),
        MessageType::Error => message
            .payload::<ErrorData>()
            .map(|e| ClientEvent::ServerError(e.message)),
        MessageType::Heartbeat | MessageType::QueueJoin | MessageType::QueueLeave => {
            return None;
        }
    };
    event
        .map_err(|e| log::warn!("bad {:?} payload: {}", message.kind, e))
        .ok()
}
