use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::cmp::Ordering;
use std::io;
use tp_value::render::{DisplayRow, COLUMNS};
use tp_value::{ComputedRow, PipelineReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Ranking,
    Unmatched,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Ranking => Page::Unmatched,
            Page::Unmatched => Page::Ranking,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::Ranking => "Ranking",
            Page::Unmatched => "Unmatched Names",
        }
    }
}

/// Sortable columns, same order as the rendered table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Name,
    Price,
    Circulating,
    Tp,
    MarketCap,
    PricePerTp,
}

impl SortColumn {
    const ALL: [SortColumn; 6] = [
        SortColumn::Name,
        SortColumn::Price,
        SortColumn::Circulating,
        SortColumn::Tp,
        SortColumn::MarketCap,
        SortColumn::PricePerTp,
    ];

    fn index(&self) -> usize {
        Self::ALL.iter().position(|c| c == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn label(&self) -> &str {
        COLUMNS[self.index()]
    }

    fn key(&self, row: &ComputedRow) -> Option<f64> {
        match self {
            SortColumn::Name => None,
            SortColumn::Price => Some(row.price_usd),
            SortColumn::Circulating => Some(row.circulating_balance),
            SortColumn::Tp => row.tp_off_season,
            SortColumn::MarketCap => Some(row.market_cap),
            SortColumn::PricePerTp => row.price_per_tp,
        }
    }

    fn compare(&self, a: &ComputedRow, b: &ComputedRow) -> Ordering {
        if *self == SortColumn::Name {
            return a.name.to_lowercase().cmp(&b.name.to_lowercase());
        }
        match (self.key(a), self.key(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

pub struct App {
    pub report: PipelineReport,
    pub rows: Vec<ComputedRow>,
    pub state: TableState,
    pub unmatched_state: TableState,
    pub current_page: Page,
    pub sort_column: SortColumn,
    pub ascending: bool,
    pub show_detail: bool,
}

impl App {
    pub fn new(report: PipelineReport) -> Self {
        let mut state = TableState::default();
        if !report.rows.is_empty() {
            state.select(Some(0));
        }

        let mut unmatched_state = TableState::default();
        if !report.unmatched.is_empty() {
            unmatched_state.select(Some(0));
        }

        let rows = report.rows.clone();

        Self {
            report,
            rows,
            state,
            unmatched_state,
            current_page: Page::Ranking,
            sort_column: SortColumn::PricePerTp,
            ascending: true,
            show_detail: false,
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_row(&self) -> Option<&ComputedRow> {
        self.state.selected().and_then(|i| self.rows.get(i))
    }

    /// Re-sort from the ranked order so ties stay in ranking order
    pub fn apply_sort(&mut self) {
        let column = self.sort_column;
        let ascending = self.ascending;

        self.rows = self.report.rows.clone();
        self.rows.sort_by(|a, b| {
            let ord = column.compare(a, b);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });

        if !self.rows.is_empty() {
            self.state.select(Some(0));
        }
    }

    pub fn next_sort_column(&mut self) {
        self.sort_column = self.sort_column.next();
        self.apply_sort();
    }

    pub fn reverse_sort(&mut self) {
        self.ascending = !self.ascending;
        self.apply_sort();
    }

    fn active_len(&self) -> usize {
        match self.current_page {
            Page::Ranking => self.rows.len(),
            Page::Unmatched => self.report.unmatched.len(),
        }
    }

    fn active_state(&mut self) -> &mut TableState {
        match self.current_page {
            Page::Ranking => &mut self.state,
            Page::Unmatched => &mut self.unmatched_state,
        }
    }

    pub fn next(&mut self) {
        let len = self.active_len();
        if len == 0 {
            return;
        }
        let state = self.active_state();
        let i = match state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.active_len();
        if len == 0 {
            return;
        }
        let state = self.active_state();
        let i = match state.selected() {
            Some(0) => len - 1,
            Some(i) => i - 1,
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.active_len();
        if len == 0 {
            return;
        }
        let state = self.active_state();
        let i = state.selected().map(|i| (i + 20).min(len - 1)).unwrap_or(0);
        state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let state = self.active_state();
        let i = state.selected().map(|i| i.saturating_sub(20)).unwrap_or(0);
        state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => app.current_page = app.current_page.next(),
                KeyCode::Char('s') => app.next_sort_column(),
                KeyCode::Char('r') => app.reverse_sort(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => {
                    if app.active_len() > 0 {
                        app.active_state().select(Some(0));
                    }
                }
                KeyCode::End => {
                    let len = app.active_len();
                    if len > 0 {
                        app.active_state().select(Some(len - 1));
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Ranking if app.show_detail => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
                .split(chunks[1]);

            render_table(f, content_chunks[0], app);
            render_detail_panel(f, content_chunks[1], app);
        }
        Page::Ranking => render_table(f, chunks[1], app),
        Page::Unmatched => render_unmatched(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![];
    for (i, page) in [Page::Ranking, Page::Unmatched].iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(page.title(), style));
    }

    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Ranked: {}", app.report.rows.len()),
        Style::default().fg(Color::Green),
    ));
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        format!("Tokens: {}", app.report.entity_count),
        Style::default().fg(Color::White),
    ));
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        format!("Unmatched: {}", app.report.unmatched.len()),
        Style::default().fg(Color::Red),
    ));

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let arrow = if app.ascending { " ▲" } else { " ▼" };
    let header_cells = COLUMNS.iter().enumerate().map(|(i, h)| {
        let label = if i == app.sort_column.index() {
            format!("{}{}", h, arrow)
        } else {
            h.to_string()
        };
        Cell::from(label).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.rows.iter().map(|row| {
        let display = DisplayRow::from(row);
        let cap_color = if row.market_cap < 0.0 { Color::Red } else { Color::White };

        Row::new(vec![
            Cell::from(truncate(&display.name, 28)),
            Cell::from(display.price_usd),
            Cell::from(display.circulating_balance),
            Cell::from(display.tp_off_season),
            Cell::from(display.market_cap).style(Style::default().fg(cap_color)),
            Cell::from(display.price_per_tp).style(Style::default().fg(Color::Green)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(30),
            Constraint::Length(16),
            Constraint::Length(16),
            Constraint::Length(18),
            Constraint::Length(16),
            Constraint::Length(16),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Price per TP (sorted by {}) ", app.sort_column.label())),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_unmatched(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app
        .report
        .unmatched
        .iter()
        .map(|name| Row::new(vec![Cell::from(name.clone())]).height(1));

    let table = Table::new(rows, [Constraint::Percentage(100)])
        .header(
            Row::new(vec![Cell::from("Display name").style(
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )])
            .style(Style::default().bg(Color::DarkGray)),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Tokens without a TP reference match "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.unmatched_state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let lines = match app.selected_row() {
        Some(row) => {
            let display = DisplayRow::from(row);
            let field = |label: &str, value: String| {
                Line::from(vec![
                    Span::styled(format!("{:<16}", label), Style::default().fg(Color::Yellow)),
                    Span::raw(value),
                ])
            };
            vec![
                field("Name", display.name),
                field("Address", row.address.clone()),
                field("Price (USD)", display.price_usd),
                field("Circulating", display.circulating_balance),
                field("TP", display.tp_off_season),
                field("Market cap", display.market_cap),
                field("Price / TP", display.price_per_tp),
            ]
        }
        None => vec![Line::from("No row selected")],
    };

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Detail "),
    );

    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let (selected, total) = match app.current_page {
        Page::Ranking => (app.state.selected(), app.rows.len()),
        Page::Unmatched => (app.unmatched_state.selected(), app.report.unmatched.len()),
    };
    let selected = selected.map(|i| i + 1).unwrap_or(0);

    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    let spans = vec![
        Span::styled(format!(" Row: {}/{} ", selected, total), Style::default().fg(Color::Cyan)),
        Span::raw(" | "),
        key("s"),
        Span::raw(" Sort | "),
        key("r"),
        Span::raw(" Reverse | "),
        key("Enter"),
        Span::raw(" Details | "),
        key("Tab"),
        Span::raw(" Page | "),
        key("↑/↓"),
        Span::raw(" Nav | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
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
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}
