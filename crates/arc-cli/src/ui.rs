use std::io;
use std::time::Duration;
use std::time::Instant;

use arc_core::actions::ArcAction;
use arc_core::actions::RuntimeAction;
use arc_core::actions::UserAction;
use arc_core::reducer::ArcEffect;
use arc_core::state::ApprovalDecisionKind;
use arc_core::state::ArcState;
use arc_core::state::GateStatus;
use arc_core::state::Notice;
use arc_core::state::NoticeLevel;
use arc_core::state::View;
use arc_exec::CommandExecutor;
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap};
use ratatui::Terminal;
use tracing::warn;

use crate::driver::Session;

struct TuiGuard;

impl Drop for TuiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            io::stdout(),
            DisableBracketedPaste,
            LeaveAlternateScreen,
            crossterm::cursor::Show
        );
    }
}

pub fn run<E: CommandExecutor>(mut session: Session<E>) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableBracketedPaste,
        crossterm::cursor::Hide
    )?;
    let _guard = TuiGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    run_app(&mut terminal, &mut session)
}

#[derive(Clone, Copy)]
struct UiPalette {
    accent: Color,
    success: Color,
    warning: Color,
    danger: Color,
    muted: Color,
    border: Color,
    selected_bg: Color,
}

const PALETTE: UiPalette = UiPalette {
    accent: Color::Cyan,
    success: Color::Green,
    warning: Color::Yellow,
    danger: Color::Red,
    muted: Color::DarkGray,
    border: Color::Gray,
    selected_bg: Color::Rgb(18, 28, 42),
};

enum KeyHandlerResult {
    Continue(Vec<ArcEffect>),
    Exit,
}

fn handle_approval_keys<E: CommandExecutor>(
    key: KeyEvent,
    session: &mut Session<E>,
) -> KeyHandlerResult {
    let effects = match key.code {
        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('s') => {
            session.user(UserAction::StartScan)
        }
        KeyCode::Esc | KeyCode::Char('c') => session.user(UserAction::CloseApproval),
        _ => Vec::new(),
    };
    KeyHandlerResult::Continue(effects)
}

fn handle_console_keys<E: CommandExecutor>(
    key: KeyEvent,
    session: &mut Session<E>,
) -> KeyHandlerResult {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        let action = match key.code {
            KeyCode::Char('q') => return KeyHandlerResult::Exit,
            KeyCode::Char('v') => Some(UserAction::ToggleVoice),
            KeyCode::Char('y') => Some(UserAction::CopyExecutionLog),
            KeyCode::Char('l') => Some(UserAction::DismissNotices),
            KeyCode::Char('u') => Some(UserAction::ClearInput),
            _ => None,
        };
        return KeyHandlerResult::Continue(action.map(|a| session.user(a)).unwrap_or_default());
    }

    let action = match key.code {
        KeyCode::Enter => Some(UserAction::SubmitInput),
        KeyCode::Backspace => Some(UserAction::InputBackspace),
        KeyCode::Tab => Some(UserAction::NextSuggestion),
        KeyCode::BackTab => Some(UserAction::PrevSuggestion),
        KeyCode::PageDown => Some(UserAction::NextView),
        KeyCode::PageUp => Some(UserAction::PrevView),
        KeyCode::Home => Some(UserAction::ReturnToDashboard),
        KeyCode::Esc if session.state().input.text.is_empty() => {
            Some(UserAction::ReturnToDashboard)
        }
        KeyCode::Esc => Some(UserAction::ClearInput),
        KeyCode::F(n) => View::ALL
            .get(usize::from(n).saturating_sub(1))
            .copied()
            .map(UserAction::SelectView),
        KeyCode::Char(c) => Some(UserAction::InputChar(c)),
        _ => None,
    };
    KeyHandlerResult::Continue(action.map(|a| session.user(a)).unwrap_or_default())
}

fn handle_key_event<E: CommandExecutor>(
    key: KeyEvent,
    session: &mut Session<E>,
) -> KeyHandlerResult {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyHandlerResult::Exit;
    }
    if session.state().approval.is_open() {
        handle_approval_keys(key, session)
    } else {
        handle_console_keys(key, session)
    }
}

/// Pastes arrive as one event; line breaks are flattened since the input is a
/// single line.
fn handle_terminal_event<E: CommandExecutor>(
    event: Event,
    session: &mut Session<E>,
) -> KeyHandlerResult {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key_event(key, session),
        Event::Paste(text) if !session.state().approval.is_open() => {
            let text = text.replace("\r\n", " ").replace(['\r', '\n'], " ");
            KeyHandlerResult::Continue(session.user(UserAction::InputPaste(text)))
        }
        _ => KeyHandlerResult::Continue(Vec::new()),
    }
}

fn copy_to_clipboard<E: CommandExecutor>(session: &mut Session<E>, text: String) {
    let copied = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
    let notice = match copied {
        Ok(()) => Notice::success("Execution log copied"),
        Err(err) => {
            warn!(%err, "clipboard unavailable");
            Notice::error("Clipboard unavailable").with_description(err.to_string())
        }
    };
    session.dispatch(ArcAction::Runtime(RuntimeAction::Notify(notice)));
}

fn run_app<B: Backend, E: CommandExecutor>(
    terminal: &mut Terminal<B>,
    session: &mut Session<E>,
) -> io::Result<()> {
    let mut last_tick = Instant::now();

    loop {
        let elapsed_ms = last_tick.elapsed().as_millis() as u64;
        if elapsed_ms > 0 {
            last_tick += Duration::from_millis(elapsed_ms);
            session.tick(elapsed_ms);
        }

        terminal.draw(|f| ui(f, session.state()))?;

        if !event::poll(Duration::from_millis(16))? {
            continue;
        }
        let effects = match handle_terminal_event(event::read()?, session) {
            KeyHandlerResult::Continue(effects) => effects,
            KeyHandlerResult::Exit => return Ok(()),
        };

        for effect in effects {
            match effect {
                ArcEffect::CopyToClipboard(text) => copy_to_clipboard(session, text),
                ArcEffect::Quit => return Ok(()),
                ArcEffect::RequestFrame
                | ArcEffect::Notify(_)
                | ArcEffect::StartExecution { .. } => {}
            }
        }
    }
}

fn ui(f: &mut ratatui::Frame, state: &ArcState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Input
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    render_header(f, chunks[0], state);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(0)])
        .split(chunks[1]);
    render_views(f, body[0], state);

    let notice_h = (state.notices.len() as u16).min(6) + 2;
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(notice_h),
        ])
        .split(body[1]);
    render_view_panel(f, right[0], state);
    render_execution_log(f, right[1], state);
    render_notices(f, right[2], state);

    render_input(f, chunks[2], state);
    render_footer(f, chunks[3]);

    if state.approval.is_open() {
        render_approval(f, centered_rect(60, 50, f.area()), state);
    }
}

fn render_header(f: &mut ratatui::Frame, area: Rect, state: &ArcState) {
    let clock = chrono::Local::now().format("%H:%M:%S").to_string();
    let voice = if !state.voice.available {
        "voice: n/a"
    } else if state.voice.listening {
        "voice: listening"
    } else {
        "voice: ready"
    };
    let decision = state
        .last_decision
        .as_ref()
        .map(|record| format!("last gate: {} {}", record.request_id, record.decision.label()))
        .unwrap_or_else(|| "last gate: none".to_string());
    let decision_color = match state.last_decision.as_ref().map(|record| record.decision) {
        Some(ApprovalDecisionKind::Approved) => PALETTE.success,
        Some(ApprovalDecisionKind::Rejected) => PALETTE.danger,
        Some(ApprovalDecisionKind::Cancelled) => PALETTE.warning,
        None => PALETTE.muted,
    };

    let text = Line::from(vec![
        Span::styled(
            "ARC COMMAND",
            Style::default()
                .fg(PALETTE.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" | ", Style::default().fg(PALETTE.muted)),
        Span::raw(state.view.label()),
        Span::styled(" | ", Style::default().fg(PALETTE.muted)),
        Span::raw(voice),
        Span::styled(" | ", Style::default().fg(PALETTE.muted)),
        Span::styled(decision, Style::default().fg(decision_color)),
        Span::styled(" | ", Style::default().fg(PALETTE.muted)),
        Span::raw(clock),
    ]);
    let header = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(PALETTE.border)),
    );
    f.render_widget(header, area);
}

fn render_views(f: &mut ratatui::Frame, area: Rect, state: &ArcState) {
    let items: Vec<ListItem> = View::ALL
        .iter()
        .enumerate()
        .map(|(idx, view)| {
            let style = if *view == state.view {
                Style::default()
                    .fg(PALETTE.accent)
                    .bg(PALETTE.selected_bg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!("F{:<2} {}", idx + 1, view.label())).style(style)
        })
        .collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(PALETTE.border))
            .title("Agents"),
    );
    f.render_widget(list, area);
}

fn render_view_panel(f: &mut ratatui::Frame, area: Rect, state: &ArcState) {
    let panel = Paragraph::new(state.view.summary())
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(PALETTE.border))
                .title(state.view.label()),
        );
    f.render_widget(panel, area);
}

fn render_execution_log(f: &mut ratatui::Frame, area: Rect, state: &ArcState) {
    let log = state.execution.log();
    let lines: Vec<Line> = if log.is_empty() {
        vec![Line::styled(
            "Awaiting command...",
            Style::default().fg(PALETTE.muted),
        )]
    } else {
        log.iter()
            .map(|line| {
                Line::from(vec![
                    Span::styled(
                        format!("{:>2} ", line.seq),
                        Style::default().fg(PALETTE.muted),
                    ),
                    Span::styled("> ", Style::default().fg(PALETTE.accent)),
                    Span::raw(line.text.clone()),
                ])
            })
            .collect()
    };
    let title = match state.execution.active_command() {
        Some(command) => format!("Execution: {command}"),
        None => "Execution".to_string(),
    };
    let panel = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(PALETTE.border))
            .title(title),
    );
    f.render_widget(panel, area);
}

fn notice_color(level: NoticeLevel) -> Color {
    match level {
        NoticeLevel::Info => PALETTE.accent,
        NoticeLevel::Success => PALETTE.success,
        NoticeLevel::Warning => PALETTE.warning,
        NoticeLevel::Error => PALETTE.danger,
    }
}

fn render_notices(f: &mut ratatui::Frame, area: Rect, state: &ArcState) {
    let items: Vec<ListItem> = state
        .notices
        .iter()
        .rev()
        .map(|posted| {
            let notice = &posted.notice;
            let mut spans = vec![
                Span::styled(
                    format!("[{}] ", notice.level.label()),
                    Style::default().fg(notice_color(notice.level)),
                ),
                Span::raw(notice.title.clone()),
            ];
            if let Some(description) = &notice.description {
                spans.push(Span::styled(
                    format!(" - {description}"),
                    Style::default().fg(PALETTE.muted),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(PALETTE.border))
            .title("Notices"),
    );
    f.render_widget(list, area);
}

fn render_input(f: &mut ratatui::Frame, area: Rect, state: &ArcState) {
    let busy = state.execution.is_busy() || state.approval.is_open();
    let (text, style) = if state.input.text.is_empty() && !busy {
        (
            "Type a command, Tab for suggestions".to_string(),
            Style::default().fg(PALETTE.muted),
        )
    } else {
        (state.input.text.clone(), Style::default())
    };
    let title = if state.voice.listening {
        "Command (listening...)"
    } else if busy {
        "Command (busy)"
    } else {
        "Command"
    };
    let input = Paragraph::new(Span::styled(text, style)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(PALETTE.accent))
            .title(title),
    );
    f.render_widget(input, area);
}

fn render_footer(f: &mut ratatui::Frame, area: Rect) {
    let key = |label: &'static str| Span::styled(label, Style::default().fg(PALETTE.accent));
    let text = |label: &'static str| Span::styled(label, Style::default().fg(PALETTE.muted));
    let line = Line::from(vec![
        key("Enter"),
        text(" run  "),
        key("Tab"),
        text(" suggest  "),
        key("F1-F12/PgUp/PgDn"),
        text(" views  "),
        key("^V"),
        text(" voice  "),
        key("^Y"),
        text(" copy log  "),
        key("^L"),
        text(" clear notices  "),
        key("^Q"),
        text(" quit"),
    ]);
    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn gate_banner(status: GateStatus, progress: u8) -> String {
    match status {
        GateStatus::Idle => "WAITING_FOR_INPUT".to_string(),
        GateStatus::Scanning => format!("ACQUIRING_BIOMETRICS... {progress}%"),
        GateStatus::Verifying => "CRYPTOGRAPHIC_VALIDATION...".to_string(),
        GateStatus::Success => "IDENTITY_CONFIRMED // L4_GRANTED".to_string(),
        GateStatus::Failed => "VERIFICATION_FAILED // RETRY_SCAN".to_string(),
    }
}

fn render_approval(f: &mut ratatui::Frame, area: Rect, state: &ArcState) {
    let Some(request) = state.approval.request() else {
        return;
    };
    let status = state.approval.status();
    let banner_color = match status {
        GateStatus::Idle => PALETTE.muted,
        GateStatus::Scanning | GateStatus::Verifying => PALETTE.accent,
        GateStatus::Success => PALETTE.success,
        GateStatus::Failed => PALETTE.danger,
    };

    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(PALETTE.warning))
        .title(format!("Governance Approval {}", request.request_id));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let details = vec![
        Line::from(vec![
            Span::styled("Command: ", Style::default().fg(PALETTE.muted)),
            Span::raw(request.command.clone()),
        ]),
        Line::from(vec![
            Span::styled("Impact:  ", Style::default().fg(PALETTE.muted)),
            Span::raw(request.impact.category),
        ]),
        Line::from(vec![
            Span::styled("Value:   ", Style::default().fg(PALETTE.muted)),
            Span::raw(request.impact.value),
        ]),
        Line::from(vec![
            Span::styled("Risk:    ", Style::default().fg(PALETTE.muted)),
            Span::styled(
                request.impact.risk.label(),
                Style::default().fg(PALETTE.warning),
            ),
        ]),
    ];
    f.render_widget(Paragraph::new(details).wrap(Wrap { trim: true }), rows[0]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(banner_color))
        .percent(u16::from(state.approval.progress()));
    f.render_widget(gauge, rows[1]);

    f.render_widget(
        Paragraph::new(Span::styled(
            gate_banner(status, state.approval.progress()),
            Style::default().fg(banner_color).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        rows[2],
    );

    let hint = match status {
        GateStatus::Idle | GateStatus::Failed => "Enter scan  Esc cancel",
        _ => "Esc cancel",
    };
    f.render_widget(
        Paragraph::new(Span::styled(hint, Style::default().fg(PALETTE.muted)))
            .alignment(Alignment::Center),
        rows[4],
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use arc_core::Config;
    use arc_exec::NarrativeExecutor;
    use pretty_assertions::assert_eq;
    use ratatui::backend::TestBackend;

    use super::*;

    fn session() -> Session<NarrativeExecutor> {
        Session::new(Config::default(), NarrativeExecutor)
    }

    fn press(session: &mut Session<NarrativeExecutor>, code: KeyCode) -> bool {
        let key = KeyEvent::new(code, KeyModifiers::NONE);
        matches!(handle_key_event(key, session), KeyHandlerResult::Continue(_))
    }

    fn type_text(session: &mut Session<NarrativeExecutor>, text: &str) {
        for c in text.chars() {
            press(session, KeyCode::Char(c));
        }
    }

    #[test]
    fn gate_banners_follow_status() {
        assert_eq!(gate_banner(GateStatus::Idle, 0), "WAITING_FOR_INPUT");
        assert_eq!(
            gate_banner(GateStatus::Scanning, 42),
            "ACQUIRING_BIOMETRICS... 42%"
        );
        assert_eq!(
            gate_banner(GateStatus::Success, 100),
            "IDENTITY_CONFIRMED // L4_GRANTED"
        );
    }

    #[test]
    fn enter_in_modal_starts_scan_instead_of_typing() {
        let mut session = session();
        type_text(&mut session, "waive fee");
        press(&mut session, KeyCode::Enter);
        assert!(session.state().approval.is_open());

        press(&mut session, KeyCode::Enter);
        assert_eq!(session.state().approval.status(), GateStatus::Scanning);
        assert_eq!(session.state().input.text, "");

        press(&mut session, KeyCode::Esc);
        assert!(!session.state().approval.is_open());
    }

    #[test]
    fn function_keys_select_views() {
        let mut session = session();
        press(&mut session, KeyCode::F(11));
        assert_eq!(session.state().view, View::Ledger);
        press(&mut session, KeyCode::Esc);
        assert_eq!(session.state().view, View::Dashboard);
    }

    #[test]
    fn bracketed_paste_lands_in_input() {
        let mut session = session();
        handle_terminal_event(Event::Paste("Sync Kingston\r\nstock".to_string()), &mut session);
        assert_eq!(session.state().input.text, "Sync Kingston stock");

        press(&mut session, KeyCode::Enter);
        assert_eq!(
            session.state().execution.active_command(),
            Some("Sync Kingston stock")
        );
    }

    #[test]
    fn paste_is_ignored_while_gate_is_open() {
        let mut session = session();
        type_text(&mut session, "waive fee");
        press(&mut session, KeyCode::Enter);

        handle_terminal_event(Event::Paste("open ledger".to_string()), &mut session);
        assert_eq!(session.state().input.text, "");
        assert!(session.state().approval.is_open());
    }

    #[test]
    fn ctrl_c_exits() {
        let mut session = session();
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(matches!(
            handle_key_event(key, &mut session),
            KeyHandlerResult::Exit
        ));
    }

    #[test]
    fn console_renders_open_gate() {
        let mut session = session();
        type_text(&mut session, "procure steel");
        press(&mut session, KeyCode::Enter);

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).expect("terminal");
        terminal
            .draw(|f| ui(f, session.state()))
            .expect("draw");
        let rendered: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(rendered.contains("WAITING_FOR_INPUT"));
        assert!(rendered.contains("Supply Chain Procurement"));
    }
}
