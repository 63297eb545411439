use std::collections::VecDeque;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph};

use arena::net::{RelayEvent, RelayStats, SessionSummary};

const MAX_LOG_LINES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    fn color(self) -> Color {
        match self {
            Level::Info => Color::White,
            Level::Warn => Color::Yellow,
            Level::Error => Color::Red,
        }
    }
}

/// Dashboard state. Relay events land here as log lines instead of going
/// through a logger, which would tear the alternate screen.
pub struct TuiState {
    logs: VecDeque<(Level, String)>,
    scroll: usize,
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            logs: VecDeque::new(),
            scroll: 0,
        }
    }

    fn push(&mut self, level: Level, line: String) {
        if self.logs.len() == MAX_LOG_LINES {
            self.logs.pop_front();
        }
        self.logs.push_back((level, line));
    }

    pub fn log_info(&mut self, line: impl Into<String>) {
        self.push(Level::Info, line.into());
    }

    pub fn log_warn(&mut self, line: impl Into<String>) {
        self.push(Level::Warn, line.into());
    }

    pub fn log_error(&mut self, line: impl Into<String>) {
        self.push(Level::Error, line.into());
    }

    pub fn record(&mut self, event: &RelayEvent) {
        match event {
            RelayEvent::ClientConnected { client_id, addr } => {
                self.log_info(format!("Client {} connected from {}", client_id, addr));
            }
            RelayEvent::ClientRejected { addr, reason } => {
                self.log_warn(format!("Rejected {}: {}", addr, reason));
            }
            RelayEvent::Queued {
                client_id,
                player_id,
            } => {
                self.log_info(format!("{} queued (client {})", player_id, client_id));
            }
            RelayEvent::MatchStarted {
                session_id,
                player,
                enemy,
            } => {
                self.log_info(format!("Session {}: {} vs {}", session_id, player, enemy));
            }
            RelayEvent::SessionEnded {
                session_id,
                actions_relayed,
            } => {
                self.log_info(format!(
                    "Session {} ended after {} actions",
                    session_id, actions_relayed
                ));
            }
            RelayEvent::ClientDisconnected { client_id, reason } => {
                self.log_info(format!("Client {} {}", client_id, reason.as_str()));
            }
            RelayEvent::Error { message } => self.log_error(message.clone()),
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = (self.scroll + 10).min(self.logs.len().saturating_sub(1));
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_sub(10);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = 0;
    }
}

pub fn render(frame: &mut Frame, state: &TuiState, stats: &RelayStats, sessions: &[SessionSummary]) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(8),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], stats);
    render_capacity(frame, chunks[1], stats);
    render_traffic(frame, chunks[2], stats);
    render_sessions(frame, chunks[3], sessions);
    render_log(frame, chunks[4], state);
    render_help(frame, chunks[5]);
}

fn render_header(frame: &mut Frame, area: Rect, stats: &RelayStats) {
    let title = format!(" Arena Relay - Uptime: {} ", format_duration(stats.uptime_secs));

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let text = format!(
        "Clients: {}  |  Queued: {} (oldest {}s)  |  Sessions: {}",
        stats.connected, stats.queued, stats.longest_wait_secs, stats.active_sessions
    );

    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(paragraph, area);
}

fn render_capacity(frame: &mut Frame, area: Rect, stats: &RelayStats) {
    let block = Block::default()
        .title(" Capacity ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let ratio = if stats.max_clients == 0 {
        0.0
    } else {
        stats.connected as f64 / stats.max_clients as f64
    };
    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio.min(1.0))
        .label(format!("{}/{} clients", stats.connected, stats.max_clients));

    frame.render_widget(gauge, area);
}

fn render_traffic(frame: &mut Frame, area: Rect, stats: &RelayStats) {
    let block = Block::default()
        .title(" Traffic ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let lines = vec![
        Line::from(vec![
            Span::styled("Received: ", Style::default().fg(Color::Gray)),
            Span::styled(
                stats.messages_received.to_string(),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Relayed: ", Style::default().fg(Color::Gray)),
            Span::styled(
                stats.messages_relayed.to_string(),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Undecodable: ", Style::default().fg(Color::Gray)),
            Span::styled(
                stats.decode_errors.to_string(),
                Style::default().fg(if stats.decode_errors > 0 {
                    Color::Red
                } else {
                    Color::White
                }),
            ),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_sessions(frame: &mut Frame, area: Rect, sessions: &[SessionSummary]) {
    let block = Block::default()
        .title(" Sessions ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    let items: Vec<ListItem> = sessions
        .iter()
        .map(|s| {
            ListItem::new(format!(
                "#{:<4} {} vs {}  {}  {} actions",
                s.id,
                s.player,
                s.enemy,
                format_duration(s.age_secs),
                s.actions_relayed
            ))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn render_log(frame: &mut Frame, area: Rect, state: &TuiState) {
    let block = Block::default()
        .title(" Log ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    let visible = area.height.saturating_sub(2) as usize;
    let end = state.logs.len().saturating_sub(state.scroll);
    let start = end.saturating_sub(visible);
    let lines: Vec<Line> = state
        .logs
        .range(start..end)
        .map(|(level, text)| Line::styled(text.as_str(), Style::default().fg(level.color())))
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text = Paragraph::new("q/ESC quit  |  PgUp/PgDn scroll log  |  End follow")
        .block(block)
        .style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        );

    frame.render_widget(text, area);
}

fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}
