use std::io::BufReader;
use std::net::TcpStream;
use std::thread;
use std::time::{Duration, Instant};

use glam::Vec2;
use serde_json::json;

use arena::cards::default_deck;
use arena::net::{
    ACTION_PLAY_CARD, ClientConfig, ClientEvent, MatchFound, Message, MessageType,
    NetworkClient, NetworkController, QueueJoin, RelayServer, ServerConfig, read_message,
    write_frame, write_message,
};
use arena::{Battle, MatchSetup, PlayMode, Team};

const DT: f32 = 1.0 / 60.0;

fn start_relay() -> RelayServer {
    RelayServer::bind(
        "127.0.0.1:0",
        ServerConfig {
            pair_interval: Duration::from_millis(20),
            ..ServerConfig::default()
        },
    )
    .unwrap()
}

fn connect(relay: &RelayServer, player_id: &str) -> NetworkClient {
    NetworkClient::connect(relay.local_addr(), player_id, ClientConfig::default()).unwrap()
}

fn wait_until(timeout_ms: u64, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(timeout_ms) {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

fn wait_for_event(
    client: &mut NetworkClient,
    timeout_ms: u64,
    mut wanted: impl FnMut(&ClientEvent) -> bool,
) -> Option<ClientEvent> {
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(timeout_ms) {
        if let Some(event) = client.poll().into_iter().find(|e| wanted(e)) {
            return Some(event);
        }
        thread::sleep(Duration::from_millis(2));
    }
    None
}

fn wait_for_match(client: &mut NetworkClient) -> MatchFound {
    match wait_for_event(client, 3000, |e| matches!(e, ClientEvent::MatchFound(_))) {
        Some(ClientEvent::MatchFound(found)) => found,
        other => panic!("no match for {}: {:?}", client.player_id(), other),
    }
}

/// Queues `first` strictly before `second` so the seats are predictable.
fn matched_pair(relay: &RelayServer) -> (NetworkClient, NetworkClient) {
    let mut first = connect(relay, "alice");
    assert!(first.join_queue(&default_deck()));
    assert!(wait_until(2000, || relay.stats().queued == 1));

    let mut second = connect(relay, "bob");
    assert!(second.join_queue(&default_deck()));

    wait_for_match(&mut first);
    wait_for_match(&mut second);
    (first, second)
}

#[test]
fn pairs_waiting_players_on_opposite_seats() {
    let relay = start_relay();
    let mut first = connect(&relay, "alice");
    first.join_queue(&default_deck());
    assert!(wait_until(2000, || relay.stats().queued == 1));

    let mut second = connect(&relay, "bob");
    second.join_queue(&default_deck());

    let first_found = wait_for_match(&mut first);
    let second_found = wait_for_match(&mut second);

    assert_eq!(first_found.side, Team::Player);
    assert_eq!(first_found.opponent_id, "bob");
    assert_eq!(second_found.side, Team::Enemy);
    assert_eq!(second_found.opponent_id, "alice");
    assert_eq!(first.side(), Some(Team::Player));

    let stats = relay.stats();
    assert_eq!(stats.connected, 2);
    assert_eq!(stats.queued, 0);
    assert_eq!(stats.active_sessions, 1);
    let sessions = relay.sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!((sessions[0].player.as_str(), sessions[0].enemy.as_str()), ("alice", "bob"));
}

#[test]
fn leaving_the_queue_prevents_a_match() {
    let relay = start_relay();
    let mut first = connect(&relay, "alice");
    first.join_queue(&default_deck());
    assert!(wait_until(2000, || relay.stats().queued == 1));
    assert!(first.leave_queue());
    assert!(wait_until(2000, || relay.stats().queued == 0));

    let mut second = connect(&relay, "bob");
    second.join_queue(&default_deck());
    assert!(wait_until(2000, || relay.stats().queued == 1));
    thread::sleep(Duration::from_millis(100));
    assert_eq!(relay.stats().active_sessions, 0);
    assert!(first.poll().is_empty());
}

#[test]
fn actions_echo_to_both_seats() {
    let relay = start_relay();
    let (mut first, mut second) = matched_pair(&relay);

    let data = json!({"card_name": "knight", "pos_x": 248.0, "pos_y": 498.0});
    assert!(first.send_action(ACTION_PLAY_CARD, data.clone()));

    for client in [&mut first, &mut second] {
        match wait_for_event(client, 2000, |e| matches!(e, ClientEvent::Action(_))) {
            Some(ClientEvent::Action(action)) => {
                assert_eq!(action.player_id, "alice");
                assert_eq!(action.action_type, ACTION_PLAY_CARD);
                assert_eq!(action.action_data, data);
            }
            other => panic!("no echo for {}: {:?}", client.player_id(), other),
        }
    }
    assert!(wait_until(1000, || relay.stats().messages_relayed == 2));
    assert_eq!(relay.sessions()[0].actions_relayed, 1);
}

#[test]
fn opponent_hears_about_a_disconnect() {
    let relay = start_relay();
    let (mut first, mut second) = matched_pair(&relay);

    first.disconnect("bye");
    assert!(!first.is_connected());

    match wait_for_event(&mut second, 2000, |e| matches!(e, ClientEvent::Disconnected { .. })) {
        Some(ClientEvent::Disconnected { reason }) => assert_eq!(reason, "opponent_disconnected"),
        other => panic!("expected a disconnect, got {:?}", other),
    }
    assert_eq!(second.side(), None);
    assert!(wait_until(2000, || {
        let stats = relay.stats();
        stats.connected == 1 && stats.active_sessions == 0
    }));
}

#[test]
fn undecodable_frames_are_skipped() {
    let relay = start_relay();
    let mut stream = TcpStream::connect(relay.local_addr()).unwrap();
    write_frame(&mut stream, b"{not json").unwrap();
    let join = Message::new(
        MessageType::QueueJoin,
        &QueueJoin {
            player_id: "raw".into(),
            deck: vec!["knight".into()],
        },
    )
    .unwrap();
    write_message(&mut stream, &join).unwrap();

    assert!(wait_until(2000, || relay.stats().queued == 1));
    assert_eq!(relay.stats().decode_errors, 1);
}

#[test]
fn full_relay_turns_clients_away() {
    let relay = RelayServer::bind(
        "127.0.0.1:0",
        ServerConfig {
            max_clients: 1,
            ..ServerConfig::default()
        },
    )
    .unwrap();
    let _first = connect(&relay, "alice");
    assert!(wait_until(2000, || relay.stats().connected == 1));

    let stream = TcpStream::connect(relay.local_addr()).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    let reply = read_message(&mut BufReader::new(stream)).unwrap();
    assert_eq!(reply.kind, MessageType::Error);
    assert_eq!(reply.data["message"], "server full");
}

#[test]
fn networked_battles_spawn_on_the_same_tick() {
    let relay = start_relay();
    let (first, second) = matched_pair(&relay);

    let battle_for = |side| {
        Battle::with_standard_rules(MatchSetup {
            perspective: side,
            mode: PlayMode::Networked,
            ..MatchSetup::default()
        })
    };
    let mut first_battle = battle_for(Team::Player);
    let mut second_battle = battle_for(Team::Enemy);
    let mut first_link = NetworkController::new(first, Team::Player);
    let mut second_link = NetworkController::new(second, Team::Enemy);

    let request = first_battle.play_card(0, Vec2::new(240.0, 500.0)).unwrap();
    let target = request.target_tick;

    // Hold the clocks until both peers have the echo queued.
    assert!(wait_until(3000, || {
        first_link.update(&mut first_battle);
        second_link.update(&mut second_battle);
        first_battle.pending_actions() == 1 && second_battle.pending_actions() == 1
    }));

    let id = &request.network_ids[0];
    for _ in 1..target {
        first_battle.update(DT);
        second_battle.update(DT);
    }
    assert!(!first_battle.world().contains(id));
    assert!(!second_battle.world().contains(id));

    first_battle.update(DT);
    second_battle.update(DT);
    let mine = first_battle.world().get(id).unwrap();
    let theirs = second_battle.world().get(id).unwrap();
    assert_eq!(mine.team(), Team::Player);
    assert_eq!(theirs.team(), Team::Enemy);
    assert_eq!(first_link.actions_received(), 1);
    assert_eq!(second_link.actions_received(), 1);
    assert_eq!(first_battle.player().reserved_elixir, 0.0);
}
