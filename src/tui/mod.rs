mod help;
mod state;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::model::{format_timestamp, Run};
use crate::orchestrator::{self, ConsoleEvent, RunDetailController, UiCommand};
use crate::status::{Severity, StatusMeta};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::{apply_event, apply_key, key_for, KeyOutcome, UiState, TAB_APPLY, TAB_PLAN};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, OnceLock};
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Why the UI thread stopped.
enum Exit {
    Quit,
    ControllerStopped,
    SessionExpired,
}

/// Watch one run in the terminal until the user quits or the session ends.
pub async fn run(api: Arc<ApiClient>, run_id: String, poll_interval: Duration) -> Result<()> {
    let (event_tx, event_rx) = mpsc::unbounded_channel::<ConsoleEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let detail = Arc::new(RunDetailController::new(api, run_id.clone()));

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(run_id, event_rx, cmd_tx));

    let res = orchestrator::run_controller(detail, poll_interval, event_tx, cmd_rx).await;

    let joined = tokio::task::spawn_blocking(move || ui_handle.join())
        .await
        .context("join TUI thread")?;
    match joined {
        Ok(Ok(Exit::Quit | Exit::ControllerStopped)) => {}
        Ok(Ok(Exit::SessionExpired)) => {
            return Err(ApiError::Unauthorized {
                message: "Unauthorized".into(),
            }
            .into())
        }
        Ok(Err(e)) => return Err(e),
        Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    run_id: String,
    mut event_rx: UnboundedReceiver<ConsoleEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<Exit> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only.
    let mut state = UiState::new(run_id);

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = 'ui: loop {
        loop {
            match event_rx.try_recv() {
                Ok(ev) => {
                    if !apply_event(&mut state, ev) {
                        break 'ui Ok(Exit::SessionExpired);
                    }
                }
                Err(TryRecvError::Empty) => break,
                // Controller is gone; its result carries the reason.
                Err(TryRecvError::Disconnected) => break 'ui Ok(Exit::ControllerStopped),
            }
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match apply_key(&mut state, k.modifiers, k.code) {
                    KeyOutcome::None => {}
                    KeyOutcome::Send(cmd) => {
                        if cmd_tx.send(cmd).is_err() {
                            state.info = "Watch stopped".into();
                        }
                    }
                    KeyOutcome::Copy(text) => {
                        state.info = match copy_to_clipboard(&text) {
                            Ok(()) => format!("✓ Copied to clipboard: {text}"),
                            Err(e) => format!("Clipboard copy failed: {e:#}"),
                        };
                    }
                    KeyOutcome::Quit => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(Exit::Quit);
                    }
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

static CLIPBOARD: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// Hand `text` to the clipboard thread.
///
/// X11 and Wayland serve a selection from the process that set it, so the
/// thread keeps one `arboard::Clipboard` for the rest of the session and
/// reopens it only after a failed write.
fn copy_to_clipboard(text: &str) -> Result<()> {
    let tx = CLIPBOARD.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();
        std::thread::spawn(move || {
            let mut board: Option<arboard::Clipboard> = None;
            for text in rx {
                if board.is_none() {
                    board = arboard::Clipboard::new()
                        .map_err(|e| tracing::warn!(error = %e, "clipboard unavailable"))
                        .ok();
                }
                let Some(b) = board.as_mut() else { continue };
                if let Err(e) = b.set_text(text) {
                    tracing::warn!(error = %e, "clipboard write failed");
                    board = None;
                }
            }
        });
        tx
    });
    tx.send(text.to_string())
        .map_err(|_| anyhow::anyhow!("clipboard thread stopped"))
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Pending => Color::Gray,
        Severity::Info => Color::Cyan,
        Severity::Warning => Color::Yellow,
        Severity::Success => Color::Green,
        Severity::Error => Color::Red,
        Severity::Neutral => Color::DarkGray,
    }
}

fn badge(meta: &StatusMeta) -> Span<'static> {
    let mut style = Style::default()
        .fg(severity_color(meta.severity))
        .add_modifier(Modifier::BOLD);
    if meta.pulse {
        style = style.add_modifier(Modifier::SLOW_BLINK);
    }
    Span::styled(format!(" {} {} ", meta.icon, meta.label), style)
}

/// Wall time from creation to the last recorded phase.
fn elapsed(run: &Run) -> Option<String> {
    let timeline = run.timeline();
    let (_, first) = timeline.first()?;
    let (_, last) = timeline.last()?;
    let secs = u64::try_from((*last - *first).whole_seconds()).ok()?;
    (secs > 0).then(|| humantime::format_duration(Duration::from_secs(secs)).to_string())
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(9),
                Constraint::Min(0),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);

    let tabs = Tabs::new(vec![
        Line::from("Plan output"),
        Line::from("Apply output"),
        Line::from("Help"),
    ])
    .select(state.tab)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("terraconsole · run {}", state.run_id)),
    )
    .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    draw_header(chunks[1], f, state);

    match state.tab {
        TAB_PLAN | TAB_APPLY => draw_log(chunks[2], f, state),
        _ => help::draw_help(chunks[2], f),
    }

    draw_status(chunks[3], f, state);
}

fn draw_header(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let Some(detail) = state.detail.as_ref() else {
        let p = Paragraph::new("Loading run…").block(Block::default().borders(Borders::ALL));
        f.render_widget(p, area);
        return;
    };
    let run = &detail.run;

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
        .split(area);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                run.operation.title(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            badge(&run.status.meta()),
        ]),
        Line::from(vec![
            Span::raw("Workspace: "),
            Span::styled(run.workspace_id.clone(), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(format!(
            "Message:   {}",
            if run.message.is_empty() {
                "No message"
            } else {
                run.message.as_str()
            }
        )),
        Line::from(format!("Creator:   {}", run.creator_name())),
        Line::from(vec![
            Span::raw("Changes:   "),
            Span::styled(
                format!("+{}", run.resources_added),
                Style::default().fg(Color::Green),
            ),
            Span::raw(" "),
            Span::styled(
                format!("~{}", run.resources_changed),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(" "),
            Span::styled(
                format!("-{}", run.resources_deleted),
                Style::default().fg(Color::Red),
            ),
        ]),
    ];
    let mut settings = format!(
        "Terraform: {}   Auto-apply: {}",
        if run.terraform_version.is_empty() {
            "-"
        } else {
            run.terraform_version.as_str()
        },
        if run.auto_apply { "yes" } else { "no" }
    );
    if let Some(took) = elapsed(run) {
        settings.push_str(&format!("   Took: {took}"));
    }
    lines.push(Line::from(settings));

    let run_box = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Run"))
        .wrap(Wrap { trim: true });
    f.render_widget(run_box, cols[0]);

    let timeline: Vec<Line> = run
        .timeline()
        .into_iter()
        .map(|(phase, at)| {
            Line::from(vec![
                Span::styled(
                    format!("{:<10}", phase.label()),
                    Style::default().fg(Color::Gray),
                ),
                Span::raw(format_timestamp(at)),
            ])
        })
        .collect();
    let timeline_box =
        Paragraph::new(timeline).block(Block::default().borders(Borders::ALL).title("Timeline"));
    f.render_widget(timeline_box, cols[1]);
}

fn draw_log(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let title = if state.tab == TAB_PLAN {
        "Plan output"
    } else {
        "Apply output"
    };
    let p = match state.current_log() {
        Some(log) if log.is_placeholder() => Paragraph::new(Span::styled(
            log.text().to_string(),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )),
        Some(log) => Paragraph::new(log.text().to_string()).scroll((state.scroll, 0)),
        None => Paragraph::new(""),
    };
    f.render_widget(
        p.block(Block::default().borders(Borders::ALL).title(title)),
        area,
    );
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut spans = Vec::new();
    for action in state.available_actions() {
        let armed = state.armed == Some(action);
        let key_style = if armed {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Magenta)
        };
        spans.push(Span::styled(format!("[{}]", key_for(action)), key_style));
        spans.push(Span::raw(format!(" {action}  ")));
    }
    spans.push(Span::styled("[r]", Style::default().fg(Color::Magenta)));
    spans.push(Span::raw(" refresh  "));
    spans.push(Span::styled("[?]", Style::default().fg(Color::Magenta)));
    spans.push(Span::raw(" help  │ "));

    let info_style = if state.armed.is_some() {
        Style::default().fg(Color::Red)
    } else if state.busy {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    spans.push(Span::styled(state.info.clone(), info_style));
    if let Some(at) = state.last_update {
        spans.push(Span::styled(
            format!("  (updated {}s ago)", at.elapsed().as_secs()),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let p = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(p, area);
}
