use anyhow::Result;
use chrono::{Datelike, Months};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Terminal,
};
use std::io::{self, Stdout};
use std::sync::mpsc::Receiver;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

use gasto_api::Messages;
use gasto_core::{format_cop, format_percent, DateRange};

use crate::panel::{FetchTicket, Panel, PanelData, PanelKind, PanelState};
use crate::worker::{Job, PanelEvent};

/// Interactive shell state: one panel per kind plus the shared date range
pub struct App {
    panels: Vec<Panel>,
    selected: usize,
    cursor: usize,
    range: DateRange,
    fraction_digits: u32,
    jobs: UnboundedSender<Job>,
}

impl App {
    pub fn new(
        range: DateRange,
        start: PanelKind,
        messages: Messages,
        fraction_digits: u32,
        jobs: UnboundedSender<Job>,
    ) -> Self {
        let panels = PanelKind::ALL
            .iter()
            .map(|&k| Panel::new(k, range, messages.clone()))
            .collect();
        let selected = PanelKind::ALL.iter().position(|&k| k == start).unwrap_or(0);
        Self {
            panels,
            selected,
            cursor: 0,
            range,
            fraction_digits,
            jobs,
        }
    }

    pub fn current(&self) -> &Panel {
        &self.panels[self.selected]
    }

    fn current_mut(&mut self) -> &mut Panel {
        &mut self.panels[self.selected]
    }

    fn panel_mut(&mut self, kind: PanelKind) -> Option<&mut Panel> {
        self.panels.iter_mut().find(|p| p.kind() == kind)
    }

    fn send(&self, job: Job) {
        if self.jobs.send(job).is_err() {
            tracing::error!("fetch worker is gone");
        }
    }

    pub fn open_current(&mut self) {
        let range = self.range;
        let ticket = self.current_mut().open(range);
        self.cursor = 0;
        self.send(Job::Fetch(ticket));
    }

    /// Returns true when the user asked to quit
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('o') | KeyCode::Enter => self.open_current(),
            KeyCode::Char('r') => {
                if let Some(ticket) = self.current_mut().refresh() {
                    self.send(Job::Fetch(ticket));
                }
            }
            KeyCode::Char('c') | KeyCode::Esc => self.current_mut().close(),
            KeyCode::Tab => {
                self.selected = (self.selected + 1) % self.panels.len();
                self.cursor = 0;
            }
            KeyCode::BackTab => {
                self.selected = (self.selected + self.panels.len() - 1) % self.panels.len();
                self.cursor = 0;
            }
            KeyCode::Char('[') => self.shift_month(false),
            KeyCode::Char(']') => self.shift_month(true),
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => {
                if let Some(PanelData::Recommendations(items)) = self.current().data() {
                    if self.cursor + 1 < items.len() {
                        self.cursor += 1;
                    }
                }
            }
            KeyCode::Char('a') => {
                let kind = self.current().kind();
                let cursor = self.cursor;
                if let Some(ticket) = self.current_mut().begin_apply(cursor) {
                    self.send(Job::Apply { kind, ticket });
                }
            }
            _ => {}
        }
        false
    }

    pub fn on_event(&mut self, event: PanelEvent) {
        match event {
            PanelEvent::Fetched {
                kind,
                request_id,
                result,
            } => {
                if let Some(panel) = self.panel_mut(kind) {
                    panel.resolve(request_id, result);
                }
            }
            PanelEvent::Applied { kind, ticket, result } => {
                if let Some(panel) = self.panel_mut(kind) {
                    panel.finish_apply(&ticket, result);
                }
            }
        }
    }

    /// Moves the range a month back or forward and reopens every open panel on it
    fn shift_month(&mut self, forward: bool) {
        let anchor = self.range.from.with_day(1).unwrap_or(self.range.from);
        let moved = if forward {
            anchor.checked_add_months(Months::new(1))
        } else {
            anchor.checked_sub_months(Months::new(1))
        };
        let Some(day) = moved else {
            return;
        };
        self.range = DateRange::current_month(day);
        let range = self.range;
        let tickets: Vec<FetchTicket> = self
            .panels
            .iter_mut()
            .filter(|p| p.is_open())
            .map(|p| p.open(range))
            .collect();
        self.cursor = 0;
        for ticket in tickets {
            self.send(Job::Fetch(ticket));
        }
    }
}

/// Text body for a panel, one entry per line
pub fn body_lines(panel: &Panel, fraction_digits: u32, cursor: usize) -> Vec<String> {
    let money = |d| format_cop(d, fraction_digits);
    match panel.state() {
        PanelState::Closed => vec!["Panel cerrado. Pulsa 'o' para abrirlo.".to_string()],
        PanelState::Loading => vec!["Cargando…".to_string()],
        PanelState::Error(msg) => vec![msg.clone()],
        PanelState::Loaded(PanelData::Summary(s)) => {
            let mut lines = vec![
                format!("Ingresos: {}", money(s.total_income)),
                format!("Gastos:   {}", money(s.total_expense)),
                format!("Balance:  {}", money(s.balance)),
            ];
            if s.is_over_budget() {
                lines.push(String::new());
                lines.push("Tus gastos superan tus ingresos este periodo.".to_string());
            }
            lines
        }
        PanelState::Loaded(PanelData::Advice { aggregation, advice }) => {
            let s = &aggregation.summary;
            let mut lines = vec![
                format!("Ingresos: {}", money(s.total_income)),
                format!("Gastos:   {}", money(s.total_expense)),
                format!("Balance:  {}", money(s.balance)),
                String::new(),
            ];
            let top = aggregation.top_categories();
            if top.is_empty() {
                lines.push("Sin gastos en este periodo.".to_string());
            } else {
                lines.push("Principales categorías:".to_string());
                for c in top {
                    lines.push(format!(
                        "  {}  {} ({})",
                        c.category,
                        money(c.total),
                        format_percent(c.percent)
                    ));
                }
            }
            lines.push(String::new());
            lines.extend(advice.iter().map(|a| format!("• {a}")));
            lines
        }
        PanelState::Loaded(PanelData::Recommendations(items)) => {
            if items.is_empty() {
                return vec!["No hay recomendaciones por ahora.".to_string()];
            }
            let mut lines = Vec::new();
            for (i, item) in items.iter().enumerate() {
                let marker = if i == cursor { ">" } else { " " };
                let check = if item.rec.applied { "[x]" } else { "[ ]" };
                lines.push(format!("{marker} {check} {}", item.rec.title));
                if !item.rec.detail.is_empty() {
                    lines.push(format!("      {}", item.rec.detail));
                }
                if item.applying {
                    lines.push("      aplicando…".to_string());
                } else if let Some(err) = &item.error {
                    lines.push(format!("      error: {err}"));
                }
            }
            lines
        }
    }
}

pub fn run_panel(mut app: App, events: Receiver<PanelEvent>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = panel_loop(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn panel_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    events: &Receiver<PanelEvent>,
) -> Result<()> {
    app.open_current();

    loop {
        while let Ok(ev) = events.try_recv() {
            app.on_event(ev);
        }

        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(3)])
                .split(f.area());

            let mut tabs: Vec<Span> = Vec::new();
            for (i, p) in app.panels.iter().enumerate() {
                let style = if i == app.selected {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Gray)
                };
                tabs.push(Span::styled(format!(" {} ", p.kind().title()), style));
            }
            let (from, to) = app.range.iso_bounds();
            tabs.push(Span::styled(format!("  {from} .. {to}"), Style::default().fg(Color::Cyan)));
            let header = Paragraph::new(Line::from(tabs))
                .block(Block::default().borders(Borders::ALL).title("GastoSmart"));
            f.render_widget(header, chunks[0]);

            let panel = app.current();
            let style = if panel.error().is_some() {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            let lines: Vec<Line> = body_lines(panel, app.fraction_digits, app.cursor)
                .into_iter()
                .map(Line::raw)
                .collect();
            let body = Paragraph::new(Text::from(lines))
                .style(style)
                .block(Block::default().borders(Borders::ALL).title(panel.kind().title()))
                .wrap(Wrap { trim: false });
            f.render_widget(body, chunks[1]);

            let help = Paragraph::new(Span::styled(
                "o=abrir  r=actualizar  c=cerrar  Tab=panel  [ ]=mes  ↑↓=elegir  a=aplicar  q=salir",
                Style::default().fg(Color::Gray),
            ))
            .block(Block::default().borders(Borders::ALL));
            f.render_widget(help, chunks[2]);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(key.code) {
                    break;
                }
            }
        }
    }

    Ok(())
}
