// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod editor;

pub use editor::Editor;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use qshell_app::{Action, Effect, Envelope, Panel, Popup, RequestId, Session, ShellCommand};
use qshell_grid::{CellClass, Grid, GridSheet, PaneLine};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use std::collections::VecDeque;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const PAGE_ROWS: usize = 10;
const COLUMN_STEP: usize = 4;
const MAX_EDITOR_LINES: usize = 6;
const RULE: &str = "─";

/// Where queries and completions are answered. The default `spawn_*`
/// methods answer inline; runtimes that can move work off the UI thread
/// override them and report back over `tx`.
pub trait AppRuntime {
    fn evaluate(&mut self, query: &str, action: Action, page: u32) -> Result<Envelope>;
    fn complete(&mut self, path: &[String]) -> Result<Vec<String>>;
    fn spawn_evaluate(
        &mut self,
        request_id: RequestId,
        query: &str,
        action: Action,
        page: u32,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self
            .evaluate(query, action, page)
            .map_err(|error| format!("{error:#}"));
        tx.send(InternalEvent::Evaluated { request_id, result })
            .map_err(|_| anyhow::anyhow!("evaluation event channel closed"))?;
        Ok(())
    }
    fn spawn_complete(&mut self, path: &[String], tx: Sender<InternalEvent>) -> Result<()> {
        let result = self.complete(path).map_err(|error| format!("{error:#}"));
        tx.send(InternalEvent::Completed {
            path: path.to_vec(),
            result,
        })
        .map_err(|_| anyhow::anyhow!("completion event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    WaitTimer {
        request_id: RequestId,
    },
    Evaluated {
        request_id: RequestId,
        result: Result<Envelope, String>,
    },
    Completed {
        path: Vec<String>,
        result: Result<Vec<String>, String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellOptions {
    /// How long a request may run before the waiting indicator shows.
    pub wait_delay: Duration,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            wait_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Default)]
struct ViewData {
    editor: Editor,
    completion_cursor: usize,
    column_offset: usize,
    status_token: u64,
    wait_delay: Duration,
}

pub fn run_app<R: AppRuntime>(
    session: &mut Session,
    runtime: &mut R,
    options: &ShellOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData {
        wait_delay: options.wait_delay,
        ..ViewData::default()
    };
    let (internal_tx, internal_rx) = mpsc::channel();

    let mut result = Ok(());
    loop {
        process_internal_events(
            session,
            runtime,
            &mut view_data,
            &internal_tx,
            &internal_rx,
        );

        if let Err(error) = terminal.draw(|frame| render(frame, session, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(session, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<R: AppRuntime>(
    session: &mut Session,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        let command = match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                ShellCommand::ClearStatus
            }
            InternalEvent::ClearStatus { .. } => continue,
            InternalEvent::WaitTimer { request_id } => ShellCommand::WaitTimerFired { request_id },
            InternalEvent::Evaluated {
                request_id,
                result: Ok(envelope),
            } => ShellCommand::Finished {
                request_id,
                envelope,
            },
            InternalEvent::Evaluated {
                request_id,
                result: Err(error),
            } => ShellCommand::Failed { request_id, error },
            InternalEvent::Completed {
                path,
                result: Ok(names),
            } => ShellCommand::CompletionsArrived { path, names },
            InternalEvent::Completed {
                path,
                result: Err(error),
            } => ShellCommand::CompletionsFailed { path, error },
        };
        dispatch(session, runtime, view_data, tx, command);
    }
}

fn dispatch<R: AppRuntime>(
    session: &mut Session,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: ShellCommand,
) {
    let mut pending: VecDeque<Effect> = session.dispatch(command).into();
    while let Some(effect) = pending.pop_front() {
        match effect {
            Effect::Evaluate {
                request_id,
                query,
                action,
                page,
            } => {
                if let Err(error) =
                    runtime.spawn_evaluate(request_id, &query, action, page, tx.clone())
                {
                    pending.extend(session.dispatch(ShellCommand::Failed {
                        request_id,
                        error: format!("{error:#}"),
                    }));
                }
            }
            Effect::ArmWaitTimer { request_id } => {
                schedule_wait_timer(tx, request_id, view_data.wait_delay);
            }
            Effect::RestoreScroll { offset } => {
                log::debug!("restored scroll offset {offset}");
            }
            Effect::FetchCompletions { path } => {
                if let Err(error) = runtime.spawn_complete(&path, tx.clone()) {
                    pending.extend(session.dispatch(ShellCommand::CompletionsFailed {
                        path,
                        error: format!("{error:#}"),
                    }));
                }
            }
            Effect::ShowCompletions { .. } => {
                view_data.completion_cursor = 0;
            }
            Effect::StatusUpdated(_) => {
                view_data.status_token = view_data.status_token.saturating_add(1);
                schedule_status_clear(tx, view_data.status_token);
            }
            Effect::StatusCleared => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn schedule_wait_timer(internal_tx: &Sender<InternalEvent>, request_id: RequestId, delay: Duration) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        let _ = sender.send(InternalEvent::WaitTimer { request_id });
    });
}

fn handle_key_event<R: AppRuntime>(
    session: &mut Session,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    if key.code == KeyCode::Char('q') && control {
        return true;
    }

    let listed = match &session.popup {
        Some(Popup::Help) => {
            if matches!(key.code, KeyCode::Esc | KeyCode::F(1)) {
                dispatch(
                    session,
                    runtime,
                    view_data,
                    internal_tx,
                    ShellCommand::ClosePopup,
                );
            }
            return false;
        }
        Some(Popup::Completions { names, .. }) => Some(names.as_ref().map_or(0, Vec::len)),
        None => None,
    };
    if let Some(count) = listed {
        match key.code {
            KeyCode::Up => {
                view_data.completion_cursor = view_data.completion_cursor.saturating_sub(1);
                return false;
            }
            KeyCode::Down => {
                view_data.completion_cursor =
                    (view_data.completion_cursor + 1).min(count.saturating_sub(1));
                return false;
            }
            KeyCode::Enter | KeyCode::Tab if count > 0 => {
                accept_completion(session, view_data);
                return false;
            }
            KeyCode::Esc => {
                session.dispatch(ShellCommand::ClosePopup);
                return false;
            }
            _ => {
                session.dispatch(ShellCommand::ClosePopup);
            }
        }
    }

    let command = match key.code {
        KeyCode::F(1) => Some(ShellCommand::ToggleHelp),
        KeyCode::F(2) => Some(ShellCommand::ShowPanel(next_panel(session.panel))),
        KeyCode::Esc if session.panel != Panel::Results => {
            Some(ShellCommand::ShowPanel(Panel::Results))
        }
        KeyCode::Char('r') if control => Some(ShellCommand::Run {
            query: view_data.editor.text().trim().to_owned(),
            action: Action::Produce,
        }),
        KeyCode::Char('e') if control => Some(ShellCommand::Run {
            query: view_data.editor.text().trim().to_owned(),
            action: Action::Analyze,
        }),
        KeyCode::Char('l') if control => Some(ShellCommand::LoadMore),
        KeyCode::Tab => Some(ShellCommand::Complete {
            text: view_data.editor.before_cursor().to_owned(),
        }),
        KeyCode::Up if alt => Some(scroll_command(session, -1)),
        KeyCode::Down if alt => Some(scroll_command(session, 1)),
        KeyCode::PageUp => Some(scroll_command(session, -(PAGE_ROWS as isize))),
        KeyCode::PageDown => Some(scroll_command(session, PAGE_ROWS as isize)),
        KeyCode::Left if alt => {
            view_data.column_offset = view_data.column_offset.saturating_sub(COLUMN_STEP);
            None
        }
        KeyCode::Right if alt => {
            view_data.column_offset =
                (view_data.column_offset + COLUMN_STEP).min(max_column_offset(session));
            None
        }
        _ => {
            edit(&mut view_data.editor, key, control || alt);
            None
        }
    };
    if let Some(command) = command {
        dispatch(session, runtime, view_data, internal_tx, command);
    }
    false
}

fn edit(editor: &mut Editor, key: KeyEvent, modified: bool) {
    match key.code {
        KeyCode::Char(ch) if !modified => editor.insert_char(ch),
        KeyCode::Enter => editor.insert_char('\n'),
        KeyCode::Backspace => editor.backspace(),
        KeyCode::Delete => editor.delete(),
        KeyCode::Left => editor.move_left(),
        KeyCode::Right => editor.move_right(),
        KeyCode::Up => editor.move_up(),
        KeyCode::Down => editor.move_down(),
        KeyCode::Home => editor.move_home(),
        KeyCode::End => editor.move_end(),
        _ => {}
    }
}

fn accept_completion(session: &mut Session, view_data: &mut ViewData) {
    let Some(Popup::Completions {
        context,
        names: Some(names),
    }) = &session.popup
    else {
        return;
    };
    let Some(name) = names.get(view_data.completion_cursor) else {
        return;
    };
    let (start, name) = (context.start, name.clone());
    session.dispatch(ShellCommand::ClosePopup);
    view_data.editor.replace_word(start, &name);
}

fn next_panel(panel: Panel) -> Panel {
    let index = Panel::ALL
        .iter()
        .position(|candidate| *candidate == panel)
        .unwrap_or(0);
    Panel::ALL[(index + 1) % Panel::ALL.len()]
}

/// Rows that can scroll: the body, plus the foot while more rows exist.
fn scroll_rows(grid: &Grid) -> usize {
    let foot = if grid.has_more() { grid.foot.len() } else { 0 };
    grid.body.len() + foot
}

fn scroll_command(session: &Session, delta: isize) -> ShellCommand {
    let limit = session
        .grid
        .as_ref()
        .map_or(0, |grid| scroll_rows(grid).saturating_sub(1));
    let offset = session.scroll_offset.saturating_add_signed(delta).min(limit);
    ShellCommand::Scrolled { offset }
}

fn max_column_offset(session: &Session) -> usize {
    session
        .grid
        .as_ref()
        .and_then(|grid| GridSheet::new(grid, 0).ok())
        .map_or(0, |sheet| sheet.content_width().saturating_sub(1))
}

fn render(frame: &mut ratatui::Frame<'_>, session: &Session, view_data: &ViewData) {
    let editor_lines = view_data.editor.line_count().clamp(1, MAX_EDITOR_LINES);
    let editor_height = u16::try_from(editor_lines).unwrap_or(1) + 2;
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(editor_height),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    render_editor(frame, layout[0], session, view_data);

    match session.panel {
        Panel::Error => {
            let body = Paragraph::new(error_text(session.result.as_ref()))
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title("error"));
            frame.render_widget(body, layout[1]);
        }
        Panel::Results | Panel::Sql => render_results(frame, layout[1], session, view_data),
    }

    let status_widget = Paragraph::new(status_text(session, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status_widget, layout[2]);

    if session.panel == Panel::Sql
        && let Some(Envelope::Sql { sql }) = &session.result
    {
        let area = centered_rect(80, 60, frame.area());
        frame.render_widget(Clear, area);
        let preview = Paragraph::new(sql.as_str())
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("SQL"));
        frame.render_widget(preview, area);
    }

    match &session.popup {
        Some(Popup::Help) => {
            let area = centered_rect(70, 70, frame.area());
            frame.render_widget(Clear, area);
            let help = Paragraph::new(help_overlay_text())
                .block(Block::default().borders(Borders::ALL).title("help"));
            frame.render_widget(help, area);
        }
        Some(Popup::Completions { names, .. }) => {
            let area = centered_rect(40, 50, frame.area());
            frame.render_widget(Clear, area);
            render_completions(frame, area, names.as_deref(), view_data.completion_cursor);
        }
        None => {}
    }
}

fn render_editor(frame: &mut ratatui::Frame<'_>, area: Rect, session: &Session, view_data: &ViewData) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(editor_title(session));
    let inner = block.inner(area);
    let (row, column) = view_data.editor.cursor_position();
    let visible = usize::from(inner.height.max(1));
    let top = row.saturating_sub(visible - 1);
    let editor = Paragraph::new(view_data.editor.text())
        .block(block)
        .scroll((u16::try_from(top).unwrap_or(u16::MAX), 0));
    frame.render_widget(editor, area);

    if session.popup.is_none() && session.panel != Panel::Sql {
        let x = u16::try_from(column)
            .unwrap_or(u16::MAX)
            .min(inner.width.saturating_sub(1));
        let y = u16::try_from(row - top).unwrap_or(0);
        frame.set_cursor_position((inner.x + x, inner.y + y));
    }
}

fn editor_title(session: &Session) -> &'static str {
    if session.waiting {
        "query · waiting for server…"
    } else if session.is_running() {
        "query · running"
    } else {
        "query"
    }
}

fn render_results(frame: &mut ratatui::Frame<'_>, area: Rect, session: &Session, view_data: &ViewData) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(results_title(session));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(grid) = &session.grid else {
        let placeholder = match &session.result {
            Some(Envelope::Empty) => "no data",
            _ => "type a query and press ctrl+r",
        };
        let body = Paragraph::new(placeholder).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(body, inner);
        return;
    };

    let width = usize::from(inner.width);
    let sheet = match GridSheet::new(grid, width) {
        Ok(sheet) => sheet,
        Err(error) => {
            log::warn!("cannot render result grid: {error:#}");
            let body = Paragraph::new(format!("{error:#}")).style(Style::default().fg(Color::Red));
            frame.render_widget(body, inner);
            return;
        }
    };
    let offset = view_data
        .column_offset
        .min(sheet.content_width().saturating_sub(1));

    let mut head = grid_lines(&sheet.head, offset, width, true);
    if !head.is_empty() {
        let rule = sheet.content_width().saturating_sub(offset).min(width);
        head.push(Line::from(RULE.repeat(rule)));
    }
    let head_height = u16::try_from(head.len())
        .unwrap_or(u16::MAX)
        .min(inner.height / 2);
    let panes = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(head_height), Constraint::Min(0)])
        .split(inner);
    frame.render_widget(Paragraph::new(head), panes[0]);

    let mut body = grid_lines(&sheet.body, offset, width, false);
    if sheet.more {
        body.extend(grid_lines(&sheet.foot, offset, width, false));
    }
    let top = session.scroll_offset.min(body.len().saturating_sub(1));
    let body = body.into_iter().skip(top).collect::<Vec<_>>();
    frame.render_widget(Paragraph::new(body), panes[1]);
}

fn results_title(session: &Session) -> String {
    let Some(grid) = &session.grid else {
        return "results".to_owned();
    };
    let rows = grid.body.len();
    if grid.has_more() {
        format!("results ({rows} rows, ctrl+l for more)")
    } else {
        format!("results ({rows} rows)")
    }
}

fn grid_lines(lines: &[PaneLine], offset: usize, width: usize, header: bool) -> Vec<Line<'static>> {
    lines
        .iter()
        .map(|line| {
            line.pieces(offset, width)
                .into_iter()
                .map(|piece| Span::styled(piece.text, class_style(piece.classes, header)))
                .collect::<Vec<_>>()
        })
        .map(Line::from)
        .collect()
}

fn class_style(classes: &[CellClass], header: bool) -> Style {
    let base = if header {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    classes.iter().fold(base, |style, class| match class {
        CellClass::Section => style.add_modifier(Modifier::BOLD),
        CellClass::Index
        | CellClass::NullVal
        | CellClass::EmptyVal
        | CellClass::NullRecVal
        | CellClass::Dummy => style.fg(Color::DarkGray),
        CellClass::TrueVal => style.fg(Color::Green),
        CellClass::FalseVal => style.fg(Color::Red),
        CellClass::More => style.fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        CellClass::Filler => style,
    })
}

fn error_text(result: Option<&Envelope>) -> String {
    match result {
        Some(Envelope::Error {
            detail,
            hint: Some(hint),
        }) => format!("{detail}\n\nhint: {hint}"),
        Some(Envelope::Error { detail, hint: None }) => detail.clone(),
        Some(Envelope::Unsupported) => {
            "the server cannot evaluate this input; queries start with '/'".to_owned()
        }
        _ => String::new(),
    }
}

fn render_completions(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    names: Option<&[String]>,
    cursor: usize,
) {
    let Some(names) = names else {
        let loading = Paragraph::new("loading…")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("completions"));
        frame.render_widget(loading, area);
        return;
    };

    let visible = usize::from(area.height.saturating_sub(2).max(1));
    let top = cursor.saturating_sub(visible - 1);
    let lines = names
        .iter()
        .enumerate()
        .skip(top)
        .take(visible)
        .map(|(index, name)| {
            let style = if index == cursor {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Line::from(Span::styled(name.clone(), style))
        })
        .collect::<Vec<_>>();
    let list = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("completions ({})", names.len())),
    );
    frame.render_widget(list, area);
}

fn help_overlay_text() -> &'static str {
    "query\n\
     ctrl+r        run the query\n\
     ctrl+e        show the SQL the query translates to\n\
     tab           complete the name under the cursor\n\
     enter         new line\n\
     \n\
     results\n\
     ctrl+l        load more rows\n\
     alt+↑/↓       scroll one row\n\
     pgup/pgdn     scroll one page\n\
     alt+←/→       scroll columns\n\
     f2            switch panel (results, SQL, error)\n\
     \n\
     popups\n\
     ↑/↓           choose a completion\n\
     enter/tab     insert the completion\n\
     esc           close\n\
     \n\
     f1 toggles this help, ctrl+q quits"
}

fn status_text(session: &Session, view_data: &ViewData) -> String {
    let state = if session.waiting {
        "WAITING"
    } else if session.is_running() {
        "RUNNING"
    } else {
        "READY"
    };
    let hints = match &session.popup {
        Some(Popup::Help) => "esc close help",
        Some(Popup::Completions { .. }) => "↑/↓ choose | enter insert | esc cancel",
        None if session.panel == Panel::Sql => "esc close SQL | f2 switch panel",
        None => "ctrl+r run | ctrl+e sql | ctrl+l more | tab complete | f1 help | ctrl+q quit",
    };
    let position = if view_data.column_offset > 0 {
        format!(" | col +{}", view_data.column_offset)
    } else {
        String::new()
    };
    match &session.status_line {
        Some(status) => format!("{state}{position} | {status} | {hints}"),
        None => format!("{state}{position} | {hints}"),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
