use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use life_timeline::{
    export_config, load_config, save_config, share_url, Configuration, Period, PeriodEdit, Rgb,
    Timeline, TimelineState, YearMonth, MONTHS_PER_ROW,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Lifetime,
    Yearly,
    Periods,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Lifetime => Page::Yearly,
            Page::Yearly => Page::Periods,
            Page::Periods => Page::Lifetime,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Lifetime => Page::Periods,
            Page::Yearly => Page::Lifetime,
            Page::Periods => Page::Yearly,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Lifetime => "Lifetime",
            Page::Yearly => "Yearly",
            Page::Periods => "Periods",
        }
    }
}

/// Period field under edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Start,
    Color,
}

impl Field {
    fn next(&self) -> Self {
        match self {
            Field::Name => Field::Start,
            Field::Start => Field::Color,
            Field::Color => Field::Name,
        }
    }

    fn label(&self) -> &str {
        match self {
            Field::Name => "Name",
            Field::Start => "Start (YYYY-MM)",
            Field::Color => "Color (#RRGGBB)",
        }
    }

    fn value_of(&self, period: &Period) -> String {
        match self {
            Field::Name => period.name.clone(),
            Field::Start => period.start.to_string(),
            Field::Color => period.color.to_hex(),
        }
    }

    fn edit(&self, value: String) -> PeriodEdit {
        match self {
            Field::Name => PeriodEdit::Name(value),
            Field::Start => PeriodEdit::Start(value),
            Field::Color => PeriodEdit::Color(value),
        }
    }
}

/// What an open edit buffer is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Name,
    DateOfBirth,
    /// Added to the list only once its name is committed
    NewPeriod,
    Period(usize, Field),
}

impl EditTarget {
    fn label(&self) -> &str {
        match self {
            EditTarget::Name => "Name",
            EditTarget::DateOfBirth => "Date of birth (YYYY-MM)",
            EditTarget::NewPeriod => "Name",
            EditTarget::Period(_, field) => field.label(),
        }
    }

    fn title(&self) -> String {
        match self {
            EditTarget::Name | EditTarget::DateOfBirth => String::from(" Edit timeline "),
            EditTarget::NewPeriod => String::from(" New period "),
            EditTarget::Period(index, _) => format!(" Edit period {} ", index + 1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EditState {
    pub target: EditTarget,
    pub buffer: String,
}

pub struct App {
    pub state: TimelineState,
    pub source: Option<PathBuf>,
    pub as_of: NaiveDate,
    pub current_page: Page,
    pub periods_state: TableState,
    pub selected_year: i32,
    pub editing: Option<EditState>,
    pub status: String,
    pub share_base: String,
    /// Revision last written to or read from `source`
    pub saved_revision: u64,
}

impl App {
    pub fn new(config: Configuration, source: Option<PathBuf>, as_of: NaiveDate) -> Self {
        let mut periods_state = TableState::default();
        if !config.periods.is_empty() {
            periods_state.select(Some(0));
        }

        let state = TimelineState::new(config);
        let saved_revision = state.revision();

        Self {
            state,
            source,
            as_of,
            current_page: Page::Lifetime,
            periods_state,
            selected_year: as_of.year(),
            editing: None,
            status: String::from("Ready"),
            share_base: String::from("http://localhost:3000/"),
            saved_revision,
        }
    }

    pub fn timeline(&self) -> Timeline {
        self.state.timeline(self.as_of)
    }

    /// Unsaved edits since the last save or reload.
    pub fn is_modified(&self) -> bool {
        self.state.revision() != self.saved_revision
    }

    pub fn selected_period(&self) -> Option<usize> {
        self.periods_state
            .selected()
            .filter(|i| *i < self.state.config().periods.len())
    }

    /// Apply a key press. Returns `false` when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.editing.is_some() {
            self.handle_edit_key(key);
            return true;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Tab => self.current_page = self.current_page.next(),
            KeyCode::BackTab => self.current_page = self.current_page.previous(),
            KeyCode::Char('s') => self.save(),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('u') => self.share(),
            _ => match self.current_page {
                Page::Lifetime => self.handle_lifetime_key(key),
                Page::Yearly => self.handle_yearly_key(key),
                Page::Periods => self.handle_periods_key(key),
            },
        }
        true
    }

    fn handle_lifetime_key(&mut self, key: KeyEvent) {
        let years = i64::from(self.state.config().life_expectancy_years);
        let target = match key.code {
            KeyCode::Char('+') | KeyCode::Char('=') => years + 1,
            KeyCode::Char('-') => years - 1,
            KeyCode::Char('n') => {
                self.begin_edit(EditTarget::Name);
                return;
            }
            KeyCode::Char('b') => {
                self.begin_edit(EditTarget::DateOfBirth);
                return;
            }
            _ => return,
        };
        match self.state.set_life_expectancy(target) {
            Ok(()) => self.status = format!("Life expectancy: {} years", target),
            Err(e) => self.status = e.to_string(),
        }
    }

    fn handle_yearly_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.selected_year -= 1,
            KeyCode::Right | KeyCode::Char('l') => self.selected_year += 1,
            KeyCode::Home => self.selected_year = self.as_of.year(),
            _ => {}
        }
    }

    fn handle_periods_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.select_previous(),
            KeyCode::Char('J') => self.move_selected(1),
            KeyCode::Char('K') => self.move_selected(-1),
            KeyCode::Char('a') => self.begin_edit(EditTarget::NewPeriod),
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(index) = self.selected_period() {
                    if let Ok(removed) = self.state.remove_period(index) {
                        self.status = format!("Removed {}", removed.name);
                    }
                    let remaining = self.state.config().periods.len();
                    self.periods_state
                        .select(if remaining == 0 { None } else { Some(index.min(remaining - 1)) });
                }
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                if let Some(index) = self.selected_period() {
                    self.begin_edit(EditTarget::Period(index, Field::Name));
                }
            }
            _ => {}
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) {
        let Some(edit) = self.editing.as_mut() else {
            return;
        };

        match key.code {
            KeyCode::Esc => {
                self.editing = None;
                self.status = String::from("Edit cancelled");
            }
            KeyCode::Backspace => {
                edit.buffer.pop();
            }
            KeyCode::Enter => {
                if self.commit_edit().is_some() {
                    self.editing = None;
                }
            }
            KeyCode::Tab => match self.commit_edit() {
                Some(EditTarget::Name) => self.begin_edit(EditTarget::DateOfBirth),
                Some(EditTarget::DateOfBirth) => self.begin_edit(EditTarget::Name),
                Some(EditTarget::Period(index, field)) => {
                    self.begin_edit(EditTarget::Period(index, field.next()))
                }
                Some(EditTarget::NewPeriod) | None => {}
            },
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                edit.buffer.push(c);
            }
            _ => {}
        }
    }

    fn begin_edit(&mut self, target: EditTarget) {
        let config = self.state.config();
        let buffer = match target {
            EditTarget::Name => config.name.clone(),
            EditTarget::DateOfBirth => config.date_of_birth.to_string(),
            EditTarget::NewPeriod => String::from("New period"),
            EditTarget::Period(index, field) => match config.periods.get(index) {
                Some(period) => field.value_of(period),
                None => return,
            },
        };
        self.status = format!("Editing {}", target.label());
        self.editing = Some(EditState { target, buffer });
    }

    /// Write the buffer to its target. Returns the target it was written
    /// to, which for a new period is its slot in the list.
    fn commit_edit(&mut self) -> Option<EditTarget> {
        let edit = self.editing.as_ref()?;
        let result = match edit.target {
            EditTarget::Name => {
                self.state.set_name(edit.buffer.clone());
                Ok(edit.target)
            }
            EditTarget::DateOfBirth => self
                .state
                .set_date_of_birth(&edit.buffer)
                .map(|_| edit.target),
            EditTarget::NewPeriod => {
                let start = YearMonth::from_date(self.as_of);
                self.state
                    .add_period(Period::new(edit.buffer.clone(), start, Rgb::BLACK));
                let index = self.state.config().periods.len() - 1;
                self.periods_state.select(Some(index));
                Ok(EditTarget::Period(index, Field::Name))
            }
            EditTarget::Period(index, field) => self
                .state
                .update_period(index, field.edit(edit.buffer.clone()))
                .map(|_| edit.target),
        };

        match result {
            Ok(target) => {
                self.status = format!("Updated {}", target.label());
                Some(target)
            }
            Err(e) => {
                self.status = e.to_string();
                None
            }
        }
    }

    fn select_next(&mut self) {
        let len = self.state.config().periods.len();
        if len == 0 {
            return;
        }
        let i = match self.periods_state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.periods_state.select(Some(i));
    }

    fn select_previous(&mut self) {
        let len = self.state.config().periods.len();
        if len == 0 {
            return;
        }
        let i = match self.periods_state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.periods_state.select(Some(i));
    }

    fn move_selected(&mut self, offset: isize) {
        let Some(from) = self.selected_period() else {
            return;
        };
        let to = from as isize + offset;
        if to < 0 || to as usize >= self.state.config().periods.len() {
            return;
        }
        if self.state.move_period(from, to as usize).is_ok() {
            self.periods_state.select(Some(to as usize));
            self.status = String::from("Reordered periods");
        }
    }

    fn save(&mut self) {
        let result = match &self.source {
            Some(path) => save_config(path, self.state.config()).map(|_| path.clone()),
            None => export_config(Path::new("."), self.state.config()),
        };
        match result {
            Ok(path) => {
                self.status = format!("Saved {}", path.display());
                self.source = Some(path);
                self.saved_revision = self.state.revision();
            }
            Err(e) => self.status = format!("Save failed: {}", e),
        }
    }

    fn reload(&mut self) {
        let Some(path) = self.source.clone() else {
            self.status = String::from("Nothing to reload: no file loaded");
            return;
        };
        match load_config(&path) {
            Ok(config) => {
                let has_periods = !config.periods.is_empty();
                self.state.replace(config);
                self.saved_revision = self.state.revision();
                self.periods_state.select(if has_periods { Some(0) } else { None });
                self.status = format!("Reloaded {}", path.display());
            }
            Err(e) => self.status = format!("Reload failed: {}", e),
        }
    }

    fn share(&mut self) {
        self.status = match share_url(&self.share_base, self.state.config()) {
            Ok(url) => url,
            Err(e) => format!("Share failed: {}", e),
        };
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && !app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    let timeline = app.timeline();
    render_header(f, chunks[0], app, &timeline);

    let (content_area, edit_area) = if app.editing.is_some() {
        let content = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(5)])
            .split(chunks[1]);
        (content[0], Some(content[1]))
    } else {
        (chunks[1], None)
    };

    match app.current_page {
        Page::Lifetime => render_lifetime(f, content_area, &timeline),
        Page::Yearly => render_yearly(f, content_area, app),
        Page::Periods => render_periods(f, content_area, app),
    }

    if let (Some(area), Some(edit)) = (edit_area, app.editing.as_ref()) {
        render_edit_panel(f, area, edit);
    }

    render_status_bar(f, chunks[2], app);
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

fn render_header(f: &mut Frame, area: Rect, app: &App, timeline: &Timeline) {
    let config = app.state.config();

    let pages = [Page::Lifetime, Page::Yearly, Page::Periods];
    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        config.name.clone(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("born {}", config.date_of_birth),
        Style::default().fg(Color::Cyan),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!(
            "{}/{} months",
            timeline.lived_months(),
            timeline.len()
        ),
        Style::default().fg(Color::Green),
    ));
    if app.is_modified() {
        tab_spans.push(Span::styled(
            "  ● modified",
            Style::default().fg(Color::Yellow),
        ));
    }

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn legend_lines<'a>(entries: impl Iterator<Item = (Rgb, String)>) -> Vec<Line<'a>> {
    entries
        .map(|(color, label)| {
            Line::from(vec![
                Span::raw("  "),
                Span::styled("    ", Style::default().bg(to_color(color))),
                Span::raw(" "),
                Span::raw(label),
            ])
        })
        .collect()
}

fn render_lifetime(f: &mut Frame, area: Rect, timeline: &Timeline) {
    // Year label + two columns per month when there is room
    let cell_width = if area.width as usize >= 8 + MONTHS_PER_ROW * 2 { 2 } else { 1 };
    let current = timeline.current_index();

    let mut lines: Vec<Line> = timeline
        .rows()
        .map(|row| {
            let mut spans = Vec::with_capacity(row.len() + 1);
            if let Some(first) = row.first() {
                spans.push(Span::styled(
                    format!(" {} ", first.month.year()),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            for cell in row {
                let mut style = Style::default().bg(to_color(cell.display_color()));
                let text = if Some(cell.index) == current {
                    style = style.fg(Color::Black).add_modifier(Modifier::BOLD);
                    if cell_width == 2 { "<>" } else { "*" }
                } else if cell_width == 2 {
                    "  "
                } else {
                    " "
                };
                spans.push(Span::styled(text, style));
            }
            Line::from(spans)
        })
        .collect();

    if timeline.is_empty() {
        lines.push(Line::from("  Life expectancy is 0 years: nothing to show"));
    }

    lines.push(Line::from(""));
    lines.extend(legend_lines(
        timeline.legend.iter().map(|e| (e.color, e.label())),
    ));

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Lifetime - one cell per month "),
    );

    f.render_widget(paragraph, area);
}

fn render_yearly(f: &mut Frame, area: Rect, app: &App) {
    let view = app.state.year(app.selected_year, app.as_of);

    let mut lines: Vec<Line> = view
        .rows()
        .map(|row| {
            let mut spans = vec![Span::raw(" ")];
            for cell in row {
                spans.push(Span::styled(
                    "  ",
                    Style::default().bg(to_color(cell.color.unwrap_or(Rgb::WHITE))),
                ));
            }
            Line::from(spans)
        })
        .collect();

    lines.push(Line::from(""));
    if view.legend.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("  No events recorded for {}", view.year),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }
    lines.extend(legend_lines(view.legend.iter().map(|e| (e.color, e.label()))));

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Year {} - one cell per day (←/→ to change) ", view.year)),
    );

    f.render_widget(paragraph, area);
}

fn render_periods(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["#", "Name", "Start", "Color", ""].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.state.config().periods.iter().enumerate().map(|(i, period)| {
        let cells = vec![
            Cell::from(format!("{}", i + 1)),
            Cell::from(truncate(&period.name, 30)),
            Cell::from(period.start.to_string()),
            Cell::from(period.color.to_hex()),
            Cell::from("      ").style(Style::default().bg(to_color(period.color))),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(32),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Periods - list order decides overlaps (J/K to reorder) "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.periods_state);
}

fn render_edit_panel(f: &mut Frame, area: Rect, edit: &EditState) {
    let content = vec![
        Line::from(vec![
            Span::styled(
                format!("  {}: ", edit.target.label()),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(edit.buffer.clone()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "  Enter save | Tab save + next field | Esc cancel",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ];

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(edit.target.title()),
    );
    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![Span::styled(
        format!(" {} ", app.status),
        Style::default().fg(Color::Cyan),
    )];

    let keys: &[(&str, &str)] = match app.current_page {
        Page::Lifetime => &[("+/-", " Years | "), ("n", " Name | "), ("b", " Born | ")],
        Page::Yearly => &[("←/→", " Year | ")],
        Page::Periods => &[("a", " Add | "), ("e", " Edit | "), ("d", " Delete | ")],
    };

    status_spans.push(Span::raw(" | "));
    for (key, label) in keys {
        status_spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(*label));
    }
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("s", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Save | "));
    status_spans.push(Span::styled("u", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Share | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        App::new(
            Configuration::template(),
            None,
            NaiveDate::from_ymd_opt(2024, 10, 19).unwrap(),
        )
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn clear_buffer(app: &mut App) {
        if let Some(edit) = app.editing.as_mut() {
            edit.buffer.clear();
        }
    }

    #[test]
    fn test_quit_and_page_cycle() {
        let mut app = app();
        assert!(app.handle_key(key(KeyCode::Tab)));
        assert_eq!(app.current_page, Page::Yearly);
        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.current_page, Page::Lifetime);
        assert!(!app.handle_key(key(KeyCode::Char('q'))));
    }

    #[test]
    fn test_life_expectancy_keys() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('+')));
        assert_eq!(app.state.config().life_expectancy_years, 81);
        app.handle_key(key(KeyCode::Char('-')));
        app.handle_key(key(KeyCode::Char('-')));
        assert_eq!(app.timeline().len(), 79 * 12);
    }

    #[test]
    fn test_edit_name_and_date_of_birth() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.editing.as_ref().unwrap().buffer, "John Doe");

        clear_buffer(&mut app);
        type_text(&mut app, "Jane Roe");
        app.handle_key(key(KeyCode::Tab)); // save name, move to birth date
        assert_eq!(app.state.config().name, "Jane Roe");
        assert_eq!(app.editing.as_ref().unwrap().target, EditTarget::DateOfBirth);

        clear_buffer(&mut app);
        type_text(&mut app, "1995-07");
        app.handle_key(key(KeyCode::Enter));

        assert!(app.editing.is_none());
        assert_eq!(app.state.config().date_of_birth, YearMonth::new(1995, 7).unwrap());
        assert_eq!(app.timeline().cells[0].month, YearMonth::new(1995, 7).unwrap());
    }

    #[test]
    fn test_invalid_date_of_birth_keeps_editing() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('b')));
        clear_buffer(&mut app);
        type_text(&mut app, "July");
        app.handle_key(key(KeyCode::Enter));

        assert!(app.editing.is_some());
        assert!(app.status.contains("invalid date"));
        assert_eq!(app.state.config().date_of_birth, YearMonth::new(2000, 1).unwrap());
        assert!(!app.is_modified());
    }

    #[test]
    fn test_edit_period_start() {
        let mut app = app();
        app.current_page = Page::Periods;
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char('e')));
        app.handle_key(key(KeyCode::Tab)); // keep name, move to start

        let edit = app.editing.as_ref().unwrap();
        assert_eq!(edit.target, EditTarget::Period(1, Field::Start));
        assert_eq!(edit.buffer, "2013-01");

        for _ in 0..2 {
            app.handle_key(key(KeyCode::Backspace));
        }
        type_text(&mut app, "09");
        app.handle_key(key(KeyCode::Enter));

        assert!(app.editing.is_none());
        assert_eq!(app.state.config().periods[1].start, YearMonth::new(2013, 9).unwrap());
    }

    #[test]
    fn test_invalid_edit_keeps_editing() {
        let mut app = app();
        app.current_page = Page::Periods;
        app.handle_key(key(KeyCode::Enter));
        app.editing = Some(EditState {
            target: EditTarget::Period(0, Field::Color),
            buffer: String::from("#XYZ"),
        });
        app.handle_key(key(KeyCode::Enter));

        assert!(app.editing.is_some());
        assert!(app.status.contains("invalid color"));
        app.handle_key(key(KeyCode::Esc));
        assert!(app.editing.is_none());
    }

    #[test]
    fn test_cancelled_new_period_is_not_added() {
        let mut app = app();
        app.current_page = Page::Periods;
        let before = app.timeline();

        app.handle_key(key(KeyCode::Char('a')));
        assert!(app.editing.is_some());
        app.handle_key(key(KeyCode::Esc));

        assert_eq!(app.state.config().periods.len(), 4);
        assert_eq!(app.timeline(), before);
        assert!(!app.is_modified());
    }

    #[test]
    fn test_add_move_and_delete() {
        let mut app = app();
        app.current_page = Page::Periods;

        app.handle_key(key(KeyCode::Char('a')));
        clear_buffer(&mut app);
        type_text(&mut app, "Sabbatical");
        app.handle_key(key(KeyCode::Tab)); // add, then edit its start
        assert_eq!(app.editing.as_ref().unwrap().target, EditTarget::Period(4, Field::Start));
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.selected_period(), Some(4));
        assert_eq!(app.state.config().periods[4].start, YearMonth::new(2024, 10).unwrap());

        app.handle_key(key(KeyCode::Char('K')));
        assert_eq!(app.selected_period(), Some(3));
        assert_eq!(app.state.config().periods[3].name, "Sabbatical");

        app.handle_key(key(KeyCode::Char('d')));
        assert_eq!(app.state.config().periods.len(), 4);
        assert_eq!(app.state.config().periods[3].name, "Career Growth");
    }

    #[test]
    fn test_save_clears_modified_marker() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("me.yaml");
        let mut app = App::new(
            Configuration::template(),
            Some(path.clone()),
            NaiveDate::from_ymd_opt(2024, 10, 19).unwrap(),
        );

        app.handle_key(key(KeyCode::Char('+')));
        assert!(app.is_modified());

        app.handle_key(key(KeyCode::Char('s')));
        assert!(!app.is_modified());
        assert_eq!(load_config(&path).unwrap().life_expectancy_years, 81);

        app.handle_key(key(KeyCode::Char('-')));
        app.handle_key(key(KeyCode::Char('r')));
        assert!(!app.is_modified());
        assert_eq!(app.state.config().life_expectancy_years, 81);
    }

    #[test]
    fn test_yearly_navigation() {
        let mut app = app();
        app.current_page = Page::Yearly;
        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.selected_year, 2023);
        app.handle_key(key(KeyCode::Home));
        assert_eq!(app.selected_year, 2024);
    }

    #[test]
    fn test_share_puts_url_in_status() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('u')));
        assert!(app.status.starts_with("http://localhost:3000/?config=%7B"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Early Adulthood", 30), "Early Adulthood");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
    }
}
