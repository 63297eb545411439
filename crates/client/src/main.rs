mod autoplay;

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;

use arena::cards::{CardId, default_deck, load_deck};
use arena::net::{ClientConfig, ClientEvent, MatchFound, NetworkClient, NetworkController};
use arena::{Battle, FixedTimestep, MatchSetup, NetworkId, Outcome, PlayMode, Team};
use autoplay::AutoPlayer;

#[derive(Parser)]
#[command(name = "arena-client")]
#[command(about = "Headless arena battle client")]
struct Args {
    #[arg(
        short,
        long,
        help = "Relay address to connect to (e.g. 127.0.0.1:5556); plays offline when omitted"
    )]
    server: Option<String>,

    #[arg(long, help = "Name announced to the relay")]
    player_id: Option<String>,

    #[arg(short, long, help = "Deck file, a JSON list of card names")]
    deck: Option<PathBuf>,

    #[arg(long, help = "Add a practice opponent to offline battles")]
    practice: bool,

    #[arg(long, help = "Let a bot play cards from the hand")]
    autoplay: bool,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, help = "Stop after this many seconds of battle time")]
    max_seconds: Option<f32>,

    #[arg(long, help = "Step as fast as possible instead of in real time")]
    fast: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let deck = match &args.deck {
        Some(path) => load_deck(path).unwrap_or_else(|e| {
            log::warn!("could not read deck {}: {}", path.display(), e);
            default_deck()
        }),
        None => default_deck(),
    };

    match &args.server {
        Some(addr) => run_networked(&args, addr, deck),
        None => run_offline(&args, deck),
    }
}

fn run_offline(args: &Args, deck: Vec<CardId>) -> Result<()> {
    let mut battle = Battle::with_standard_rules(MatchSetup {
        player_deck: deck,
        seed: args.seed,
        practice: args.practice,
        ..MatchSetup::default()
    });
    run_battle(&mut battle, None, args);
    Ok(())
}

fn run_networked(args: &Args, addr: &str, deck: Vec<CardId>) -> Result<()> {
    let player_id = args
        .player_id
        .clone()
        .unwrap_or_else(|| NetworkId::random().to_string());
    let mut client = NetworkClient::connect(addr, player_id.as_str(), ClientConfig::default())
        .with_context(|| format!("connection failed: {addr}"))?;

    if !client.join_queue(&deck) {
        bail!("connection failed: could not queue on {addr}");
    }
    log::info!("{} waiting for an opponent", player_id);
    let found = wait_for_match(&mut client)?;
    log::info!("matched against {} as {}", found.opponent_id, found.side.as_str());

    let mut battle = Battle::with_standard_rules(MatchSetup {
        perspective: found.side,
        player_deck: deck,
        seed: args.seed,
        mode: PlayMode::Networked,
        ..MatchSetup::default()
    });
    let mut controller = NetworkController::new(client, found.side);
    run_battle(&mut battle, Some(&mut controller), args);

    if let Some(status) = controller.status() {
        log::warn!("{}", status);
    }
    controller.disconnect("match over");
    Ok(())
}

fn wait_for_match(client: &mut NetworkClient) -> Result<MatchFound> {
    loop {
        for event in client.poll() {
            match event {
                ClientEvent::MatchFound(found) => return Ok(found),
                ClientEvent::Disconnected { reason } => {
                    bail!("relay closed before a match was found: {reason}")
                }
                ClientEvent::ServerError(message) => bail!("relay error: {message}"),
                ClientEvent::Action(_) => {}
            }
        }
        client.heartbeat();
        thread::sleep(Duration::from_millis(50));
    }
}

fn run_battle(battle: &mut Battle, mut controller: Option<&mut NetworkController>, args: &Args) {
    let mut timestep = FixedTimestep::new(battle.config().tick_rate);
    let mut bot = args.autoplay.then(|| AutoPlayer::new(args.seed));
    let tick_limit = args
        .max_seconds
        .map(|secs| (secs * timestep.tick_rate() as f32) as u64);
    let mut last_frame = Instant::now();

    while !battle.is_over() {
        if tick_limit.is_some_and(|limit| battle.tick() >= limit) {
            log::info!("stopping at tick {}", battle.tick());
            break;
        }

        let delta = if args.fast {
            timestep.dt()
        } else {
            let now = Instant::now();
            let delta = (now - last_frame).as_secs_f32();
            last_frame = now;
            delta
        };

        if let Some(controller) = controller.as_deref_mut() {
            controller.update(battle);
        }
        if let Some(bot) = bot.as_mut() {
            bot.update(battle, delta);
        }
        timestep.advance(delta, |dt| battle.update(dt));
        report(battle);

        if !args.fast {
            thread::sleep(Duration::from_millis(4));
        }
    }

    let crowns = battle.crowns();
    match battle.outcome() {
        Some(Outcome::Winner(Team::Player)) => log::info!("victory {}-{}", crowns[0], crowns[1]),
        Some(Outcome::Winner(Team::Enemy)) => log::info!("defeat {}-{}", crowns[0], crowns[1]),
        Some(Outcome::Draw) => log::info!("draw {}-{}", crowns[0], crowns[1]),
        None => log::info!("battle left unfinished at tick {}", battle.tick()),
    }
    if let Some(bot) = &bot {
        log::info!("autoplay made {} plays", bot.plays());
    }
}

fn report(battle: &mut Battle) {
    for timed in battle.drain_events() {
        if timed.event.is_cosmetic() {
            log::trace!("[{}] {:?}", timed.tick, timed.event);
        } else {
            log::info!("[{}] {:?}", timed.tick, timed.event);
        }
    }
}
