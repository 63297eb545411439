mod tui;

use std::io;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use arena::net::{RelayServer, ServerConfig};
use tui::TuiState;

#[derive(Parser)]
#[command(name = "arena-server")]
#[command(about = "Matchmaking relay for arena battles")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    #[arg(short, long, default_value_t = arena::DEFAULT_PORT)]
    port: u16,

    #[arg(short, long, default_value_t = 64)]
    max_clients: usize,

    #[arg(long, default_value_t = 500, help = "Milliseconds between pairing passes")]
    pair_interval_ms: u64,

    #[arg(long)]
    headless: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let bind_addr = format!("{}:{}", args.bind, args.port);

    let config = ServerConfig {
        pair_interval: Duration::from_millis(args.pair_interval_ms),
        max_clients: args.max_clients,
    };

    if args.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let mut server = RelayServer::bind(&bind_addr, config)
        .with_context(|| format!("could not bind relay on {bind_addr}"))?;

    if args.headless {
        log::info!("Relay started on {}", server.local_addr());
        while server.is_running() {
            for event in server.drain_events() {
                log::debug!("{:?}", event);
            }
            thread::sleep(Duration::from_millis(100));
        }
    } else {
        run_with_tui(&server)?;
    }

    server.stop();
    Ok(())
}

fn run_with_tui(server: &RelayServer) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut tui_state = TuiState::new();
    tui_state.log_info(format!("Relay started on {}", server.local_addr()));

    loop {
        for event in server.drain_events() {
            tui_state.record(&event);
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::PageUp => tui_state.scroll_up(),
                        KeyCode::PageDown => tui_state.scroll_down(),
                        KeyCode::End => tui_state.scroll_to_bottom(),
                        _ => {}
                    }
                }
            }
        }

        let stats = server.stats();
        let sessions = server.sessions();
        terminal.draw(|frame| {
            tui::render(frame, &tui_state, &stats, &sessions);
        })?;
    }

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    Ok(())
}
