use anyhow::Result;
use cost_of_living::{
    ControlInput, Dashboard, DashboardSession, DashboardUpdate, Indicator, LineChart, Mode,
    TableRow, ViewResult,
};
use cost_of_living::{Cell as ValueCell, ComparisonChart};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Play,
    Charts,
    Results,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Play => Page::Charts,
            Page::Charts => Page::Results,
            Page::Results => Page::Play,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Play => Page::Results,
            Page::Charts => Page::Play,
            Page::Results => Page::Charts,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Play => "Play",
            Page::Charts => "Charts",
            Page::Results => "Results",
        }
    }
}

pub struct App {
    pub dashboard: Dashboard,
    pub session: DashboardSession,
    pub last_update: DashboardUpdate,
    pub current_page: Page,
    pub results_state: TableState,
    pub region: String,
}

impl App {
    pub fn new(dashboard: Dashboard, region: String) -> Self {
        let mut session = dashboard.new_session();
        let last_update = dashboard.start(&mut session);

        let mut results_state = TableState::default();
        results_state.select(Some(0));

        Self {
            dashboard,
            session,
            last_update,
            current_page: Page::Play,
            results_state,
            region,
        }
    }

    fn apply(&mut self, input: ControlInput) {
        self.last_update = self.dashboard.handle(&mut self.session, input);
        self.results_state.select(Some(0));
    }

    /// Move the range start, never past the range end
    pub fn shift_range_start(&mut self, delta: i32) {
        let bounds = self.dashboard.bounds();
        let (start, end) = self.session.controls.range;
        let start = (start + delta).clamp(bounds.min_year, end);
        self.apply(ControlInput::YearRange { start, end });
    }

    /// Move the range end, never before the range start
    pub fn shift_range_end(&mut self, delta: i32) {
        let bounds = self.dashboard.bounds();
        let (start, end) = self.session.controls.range;
        let end = (end + delta).clamp(start, bounds.max_year);
        self.apply(ControlInput::YearRange { start, end });
    }

    /// Move the first pair year; the second resets to its first option
    pub fn shift_pair_a(&mut self, delta: i32) {
        let bounds = self.dashboard.bounds();
        let year_a = (self.session.controls.pair.0 + delta).clamp(bounds.min_year, bounds.max_year);
        let year_b = self.dashboard.pair_options(year_a).default.unwrap_or(year_a);
        self.apply(ControlInput::YearPair { year_a, year_b });
    }

    /// Move the second pair year within the options after the first
    pub fn shift_pair_b(&mut self, delta: i32) {
        let (year_a, year_b) = self.session.controls.pair;
        let options = self.dashboard.pair_options(year_a).options;
        let (Some(&first), Some(&last)) = (options.first(), options.last()) else {
            return;
        };
        let year_b = (year_b + delta).clamp(first, last);
        self.apply(ControlInput::YearPair { year_a, year_b });
    }

    /// Step to the next selectable indicator (no-op without a selector)
    pub fn cycle_indicator(&mut self) {
        let choices = self.dashboard.model().selectable().to_vec();
        if choices.is_empty() {
            return;
        }

        let current = self
            .session
            .controls
            .indicator
            .as_deref()
            .and_then(Indicator::resolve);
        let next = match current.and_then(|c| choices.iter().position(|i| *i == c)) {
            Some(pos) => choices[(pos + 1) % choices.len()],
            None => choices[0],
        };

        self.apply(ControlInput::Indicator {
            name: next.name().to_string(),
        });
    }

    pub fn results(&self) -> &[TableRow] {
        self.last_update.results.as_deref().unwrap_or_default()
    }

    pub fn next_row(&mut self) {
        let len = self.results().len();
        if len == 0 {
            return;
        }
        let i = match self.results_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.results_state.select(Some(i));
    }

    pub fn previous_row(&mut self) {
        let len = self.results().len();
        if len == 0 {
            return;
        }
        let i = match self.results_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.results_state.select(Some(i));
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

    if let Err(err) = res {
        println!("Error: {:?}", err);
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
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => {
                    app.current_page = app.current_page.previous()
                }
                KeyCode::Tab => app.current_page = app.current_page.next(),
                KeyCode::BackTab => app.current_page = app.current_page.previous(),
                KeyCode::Left => app.shift_range_start(-1),
                KeyCode::Right => app.shift_range_start(1),
                KeyCode::Char('h') => app.shift_range_end(-1),
                KeyCode::Char('l') => app.shift_range_end(1),
                KeyCode::Char('[') => app.shift_pair_a(-1),
                KeyCode::Char(']') => app.shift_pair_a(1),
                KeyCode::Char('{') => app.shift_pair_b(-1),
                KeyCode::Char('}') => app.shift_pair_b(1),
                KeyCode::Char('i') => app.cycle_indicator(),
                KeyCode::Down | KeyCode::Char('j') => app.next_row(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_row(),
                _ => {}
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

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Play => render_play(f, chunks[1], app),
        Page::Charts => render_charts(f, chunks[1], app),
        Page::Results => render_results(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2]);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Play, Page::Charts, Page::Results].iter().enumerate() {
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

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    let bounds = app.dashboard.bounds();
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Cost of Living in {}", app.region),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("{} - {}", bounds.min_year, bounds.max_year),
        Style::default().fg(Color::Cyan),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_play(f: &mut Frame, area: Rect, app: &App) {
    let controls = &app.session.controls;
    let active = |mode: Mode| {
        if controls.mode == mode {
            Span::styled("→ ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        } else {
            Span::raw("  ")
        }
    };
    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let mut content = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("  "),
            active(Mode::Range),
            Span::styled("Year range:   ", label),
            Span::raw(format!("{} - {}", controls.range.0, controls.range.1)),
        ]),
        Line::from(vec![
            Span::raw("  "),
            active(Mode::Pair),
            Span::styled("Compare:      ", label),
            Span::raw(format!("{} vs {}", controls.pair.0, controls.pair.1)),
        ]),
        Line::from(vec![
            Span::raw("    "),
            Span::styled("Indicator:    ", label),
            Span::raw(
                controls
                    .indicator
                    .clone()
                    .unwrap_or_else(|| "Unemployment Rate & Median Housing Price".to_string()),
            ),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
    ];

    match &app.last_update.view {
        ViewResult::Placeholder(placeholder) => content.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(placeholder.reason.clone(), Style::default().fg(Color::Yellow)),
        ])),
        view => {
            for summary in view.summaries() {
                let color = if summary.delta > 0.0 { Color::Green } else { Color::Red };
                content.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(summary.text.clone(), Style::default().fg(color)),
                ]));
            }
        }
    }

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Select Year Range or Two Years to Compare "),
    );

    f.render_widget(paragraph, area);
}

fn render_charts(f: &mut Frame, area: Rect, app: &App) {
    match &app.last_update.view {
        ViewResult::Range(view) => {
            let areas = split_evenly(area, view.charts.len() + 1);
            if let Some(first) = view.charts.first() {
                render_income_chart(f, areas[0], first);
            }
            for (chart, chart_area) in view.charts.iter().zip(areas.iter().skip(1)) {
                render_line_chart(f, *chart_area, chart);
            }
        }
        ViewResult::Pair(view) => {
            let areas = split_evenly(area, view.charts.len());
            for (chart, chart_area) in view.charts.iter().zip(areas.iter()) {
                render_comparison_chart(f, *chart_area, chart);
            }
        }
        ViewResult::Placeholder(placeholder) => {
            let message = Paragraph::new(format!("\n  {}", placeholder.reason)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" Charts "),
            );
            f.render_widget(message, area);
        }
    }
}

fn split_evenly(area: Rect, parts: usize) -> Vec<Rect> {
    let parts = parts.max(1) as u32;
    let constraints: Vec<Constraint> = (0..parts).map(|_| Constraint::Ratio(1, parts)).collect();
    Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area)
        .to_vec()
}

fn render_income_chart(f: &mut Frame, area: Rect, chart: &LineChart) {
    let points: Vec<(f64, f64)> = chart.points.iter().map(|p| (p.year as f64, p.income)).collect();
    render_series(
        f,
        area,
        " Median Household Income ".to_string(),
        &chart.income_axis.title,
        &chart.income_axis.color,
        None,
        &points,
    );
}

fn render_line_chart(f: &mut Frame, area: Rect, chart: &LineChart) {
    let points: Vec<(f64, f64)> = chart.points.iter().map(|p| (p.year as f64, p.value)).collect();
    render_series(
        f,
        area,
        format!(" {} ", chart.title),
        &chart.indicator_axis.title,
        &chart.indicator_axis.color,
        chart.indicator_axis.range,
        &points,
    );
}

fn render_comparison_chart(f: &mut Frame, area: Rect, chart: &ComparisonChart) {
    let points: Vec<(f64, f64)> = chart.points.iter().map(|p| (p.year as f64, p.value)).collect();
    let labels: Vec<&str> = chart.points.iter().map(|p| p.label.as_str()).collect();
    render_series(
        f,
        area,
        format!(" {}: {} ", chart.title, labels.join("  →  ")),
        &chart.axis.title,
        &chart.axis.color,
        None,
        &points,
    );
}

fn render_series(
    f: &mut Frame,
    area: Rect,
    title: String,
    axis_title: &str,
    color: &str,
    fixed_range: Option<[f64; 2]>,
    points: &[(f64, f64)],
) {
    let color = color.parse::<Color>().unwrap_or(Color::White);
    let x_bounds = match (points.first(), points.last()) {
        (Some(first), Some(last)) if last.0 > first.0 => [first.0, last.0],
        (Some(only), _) => [only.0 - 0.5, only.0 + 0.5],
        _ => [0.0, 1.0],
    };
    let y_bounds = fixed_range.unwrap_or_else(|| value_bounds(points));

    let x_labels: Vec<Span> = year_labels(x_bounds).into_iter().map(Span::raw).collect();
    let y_labels: Vec<Span> = [y_bounds[0], (y_bounds[0] + y_bounds[1]) / 2.0, y_bounds[1]]
        .iter()
        .map(|v| Span::raw(format!("{:.1}", v)))
        .collect();

    let datasets = vec![Dataset::default()
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(points)];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        )
        .x_axis(
            Axis::default()
                .title("Years")
                .style(Style::default().fg(Color::DarkGray))
                .bounds(x_bounds)
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title(axis_title.to_string())
                .style(Style::default().fg(Color::DarkGray))
                .bounds(y_bounds)
                .labels(y_labels),
        );

    f.render_widget(chart, area);
}

fn value_bounds(points: &[(f64, f64)]) -> [f64; 2] {
    let min = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    let pad = if max > min { (max - min) * 0.05 } else { 1.0 };
    [min - pad, max + pad]
}

fn year_labels(bounds: [f64; 2]) -> Vec<String> {
    let start = bounds[0].ceil() as i32;
    let end = bounds[1].floor() as i32;
    if end <= start {
        return vec![start.to_string()];
    }
    if (end - start) % 2 == 0 {
        vec![start.to_string(), ((start + end) / 2).to_string(), end.to_string()]
    } else {
        vec![start.to_string(), end.to_string()]
    }
}

fn render_results(f: &mut Frame, area: Rect, app: &mut App) {
    let indicators = app.dashboard.table().indicators().to_vec();

    let mut headers = vec!["Year".to_string()];
    headers.extend(indicators.iter().map(|i| i.name().to_string()));
    headers.push("Change".to_string());

    let header_cells = headers.into_iter().map(|h| {
        Cell::from(h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let catalog = app.dashboard.catalog().clone();
    let rows: Vec<Row> = app
        .results()
        .iter()
        .map(|row| {
            let mut cells = vec![Cell::from(row.year.to_string())];
            for indicator in &indicators {
                let text = match row.cells.get(indicator) {
                    Some(ValueCell::Number(value)) => catalog.format(*indicator, *value),
                    Some(ValueCell::Text(text)) => text.clone(),
                    None => String::new(),
                };
                cells.push(Cell::from(text));
            }

            let color = if row.change.starts_with('+') {
                Color::Green
            } else if row.change.starts_with('-') {
                Color::Red
            } else {
                Color::White
            };
            cells.push(Cell::from(row.change.clone()).style(Style::default().fg(color)));

            Row::new(cells).height(1)
        })
        .collect();

    let mut widths = vec![Constraint::Length(6)];
    widths.extend(indicators.iter().map(|_| Constraint::Length(24)));
    widths.push(Constraint::Length(12));

    let title = format!(
        " Results - {} rows in {} selections ",
        app.results().len(),
        app.session.history().batch_count()
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.results_state);
}

fn render_status_bar(f: &mut Frame, area: Rect) {
    let key = Style::default().fg(Color::Yellow);
    let status_spans = vec![
        Span::styled(" ←/→", key),
        Span::raw(" Start | "),
        Span::styled("h/l", key),
        Span::raw(" End | "),
        Span::styled("[/]", key),
        Span::raw(" Year A | "),
        Span::styled("{/}", key),
        Span::raw(" Year B | "),
        Span::styled("i", key),
        Span::raw(" Indicator | "),
        Span::styled("Tab", key),
        Span::raw(" Page | "),
        Span::styled("↑/↓", key),
        Span::raw(" Rows | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}
