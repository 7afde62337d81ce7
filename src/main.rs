use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph};

use farm_terminal::persist;
use farm_terminal::provider;
use farm_terminal::render::{
    AnimalCard, FieldCard, amount_to_feed, feed_percent, format_area, format_local_time,
    format_price,
};
use farm_terminal::settings::{Layout as CardLayout, Mode, Settings};
use farm_terminal::state::{
    self, AppState, FetchDecision, FieldState, ProviderCommand, Tab, apply_delta,
};
use farm_terminal::timers::Countdown;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    last_tick: Instant,
    refresh_every: Option<Duration>,
    last_refresh: Instant,
}

impl App {
    fn new(state: AppState, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        let mut app = Self {
            state,
            should_quit: false,
            cmd_tx,
            last_tick: Instant::now(),
            refresh_every: None,
            last_refresh: Instant::now(),
        };
        app.reschedule_refresh();
        app
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.key_editor.is_some() {
            self.on_editor_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('r') => self.request_fetch(true),
            KeyCode::Tab | KeyCode::BackTab => self.state.toggle_tab(),
            KeyCode::Char('j') | KeyCode::Down => self.state.scroll_down(),
            KeyCode::Char('k') | KeyCode::Up => self.state.scroll_up(),
            KeyCode::Char('m') => self.state.minimized = !self.state.minimized,
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            KeyCode::Char('s') => {
                let current = self
                    .state
                    .explicit_key
                    .clone()
                    .unwrap_or_else(|| self.state.settings.api_key.clone());
                self.state.key_editor = Some(current);
            }
            KeyCode::Char('t') => {
                self.update_settings(|s| s.theme = s.theme.next());
                self.reschedule_refresh();
            }
            KeyCode::Char('l') => self.update_settings(|s| {
                s.mode = match s.mode {
                    Mode::Dark => Mode::Light,
                    Mode::Light => Mode::Dark,
                }
            }),
            KeyCode::Char('g') => self.update_settings(|s| {
                s.layout = match s.layout {
                    CardLayout::Single => CardLayout::Grid,
                    CardLayout::Grid => CardLayout::Single,
                }
            }),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.update_settings(|s| s.bump_refresh(true));
                self.reschedule_refresh();
            }
            KeyCode::Char('-') => {
                self.update_settings(|s| s.bump_refresh(false));
                self.reschedule_refresh();
            }
            KeyCode::Char('o') => self.update_settings(|s| s.bump_opacity(false)),
            KeyCode::Char('O') => self.update_settings(|s| s.bump_opacity(true)),
            _ => {}
        }
    }

    fn on_editor_key(&mut self, key: KeyEvent) {
        let Some(buffer) = self.state.key_editor.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.state.key_editor = None,
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => buffer.push(c),
            KeyCode::Enter => {
                let typed = buffer.trim().to_string();
                self.state.key_editor = None;
                self.state.explicit_key = Some(typed.clone()).filter(|k| !k.is_empty());
                self.update_settings(|s| s.api_key = typed);
                self.reschedule_refresh();
                self.state.push_log("[INFO] Settings saved");
            }
            _ => {}
        }
    }

    fn update_settings(&mut self, change: impl FnOnce(&mut Settings)) {
        change(&mut self.state.settings);
        if let Err(err) = persist::save_settings(&self.state.settings) {
            self.state
                .push_log(format!("[WARN] Could not save settings: {err:#}"));
        }
    }

    /// Replaces the periodic schedule; the old deadline is dropped.
    fn reschedule_refresh(&mut self) {
        let secs = self.state.settings.refresh_interval;
        self.refresh_every = (secs > 0).then(|| Duration::from_secs(secs));
        self.last_refresh = Instant::now();
    }

    fn request_fetch(&mut self, force: bool) {
        let FetchDecision::Issue { seq, api_key } = self.state.begin_fetch(state::now_ms(), force)
        else {
            return;
        };
        let Some(tx) = &self.cmd_tx else {
            self.state.loading = false;
            self.state.push_log("[INFO] Fetch worker unavailable");
            return;
        };
        if tx.send(ProviderCommand::Fetch { seq, api_key }).is_err() {
            self.state.loading = false;
            self.state.set_status("Error: fetch worker stopped", true);
            self.state.push_log("[WARN] Fetch request failed");
        }
    }

    fn maybe_tick(&mut self) {
        if self.last_tick.elapsed() >= TICK_INTERVAL {
            self.state.tick(state::now_secs());
            self.last_tick = Instant::now();
        }
    }

    fn maybe_refresh(&mut self) {
        let Some(every) = self.refresh_every else {
            return;
        };
        if self.last_refresh.elapsed() >= every {
            self.last_refresh = Instant::now();
            self.request_fetch(false);
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let mut state = AppState::new(persist::load_settings());
    state.host_key = std::env::var("FARM_HOST_KEY")
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    provider::spawn_fetch_worker(tx, cmd_rx);

    let mut app = App::new(state, Some(cmd_tx));
    if app.state.credentials().resolve().is_some() {
        app.request_fetch(true);
    }
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let poll_rate = Duration::from_millis(250);

    loop {
        // Deltas first so a fresh render is in place before the tick reads it.
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        app.maybe_tick();
        app.maybe_refresh();

        terminal.draw(|f| ui(f, app))?;

        if event::poll(poll_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

struct Palette {
    accent: Color,
    base: Style,
    muted: Style,
}

fn palette(settings: &Settings) -> Palette {
    let (r, g, b) = settings.theme.rgb();
    let mut base = match settings.mode {
        Mode::Dark => Style::default().fg(Color::White).bg(Color::Black),
        Mode::Light => Style::default().fg(Color::Black).bg(Color::White),
    };
    if settings.opacity < 60 {
        base = base.add_modifier(Modifier::DIM);
    }
    Palette {
        accent: Color::Rgb(r, g, b),
        base,
        muted: base.fg(Color::DarkGray),
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let state = &app.state;
    let pal = palette(&state.settings);
    frame.render_widget(Block::default().style(pal.base), frame.size());

    let body = if state.minimized {
        Constraint::Length(0)
    } else {
        Constraint::Min(1)
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            body,
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    render_header(frame, chunks[0], state, &pal);
    if !state.minimized {
        match state.tab {
            Tab::Fields => render_field_cards(frame, chunks[1], state, &pal),
            Tab::Animals => render_animal_cards(frame, chunks[1], state, &pal),
        }
    }
    render_console(frame, chunks[2], state, &pal);

    let footer = Paragraph::new(footer_text(state)).style(pal.muted);
    frame.render_widget(footer, chunks[3]);

    if state.help_overlay {
        render_help_overlay(frame, frame.size(), &pal);
    }
    if let Some(buffer) = &state.key_editor {
        render_key_editor(frame, frame.size(), buffer, &pal);
    }
}

fn render_header(frame: &mut Frame, area: Rect, state: &AppState, pal: &Palette) {
    let title_style = Style::default()
        .fg(Color::White)
        .bg(pal.accent)
        .add_modifier(Modifier::BOLD);
    let tab_style = |tab: Tab| {
        if state.tab == tab {
            pal.base.add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            pal.muted
        }
    };
    let refresh = match state.settings.refresh_interval {
        0 => "manual".to_string(),
        secs => format!("{secs}s"),
    };
    let title = Line::from(vec![
        Span::styled(" FARM TRACKER ", title_style),
        Span::raw(" "),
        Span::styled(
            format!(" theme {} | refresh {refresh} ", state.settings.theme.label()),
            pal.muted,
        ),
        Span::styled(if state.loading { " Loading... " } else { "" }, pal.base),
    ]);
    let tabs = Line::from(vec![
        Span::styled(
            format!(" Fields {}/{} ", state.owned_fields(), state.fields.len()),
            tab_style(Tab::Fields),
        ),
        Span::raw(" "),
        Span::styled(
            format!(" Animals {}/{} ", state.owned_animals(), state.animals.len()),
            tab_style(Tab::Animals),
        ),
    ]);
    frame.render_widget(Paragraph::new(vec![title, tabs]), area);
}

struct CardView {
    title: String,
    badge: Option<(String, Color)>,
    lines: Vec<Line<'static>>,
    gauge: Option<(f64, String)>,
    dimmed: bool,
}

impl CardView {
    fn height(&self) -> u16 {
        let gauge = u16::from(self.gauge.is_some());
        self.lines.len() as u16 + gauge + 2
    }
}

fn label_line(label: &str, value: impl Into<String>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(Color::Gray)),
        Span::raw(value.into()),
    ])
}

fn countdown_line(label: &str, countdown: Option<&Countdown>) -> Line<'static> {
    let countdown = countdown.cloned().unwrap_or(Countdown::NotAvailable);
    let style = if countdown.is_ready() {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(Color::Gray)),
        Span::styled(countdown.text().to_string(), style),
    ])
}

fn state_color(field_state: &FieldState) -> Color {
    match field_state {
        FieldState::Harvesting => Color::Green,
        FieldState::Growing => Color::Yellow,
        FieldState::Planting => Color::Cyan,
        FieldState::Cultivating => Color::Magenta,
        FieldState::Other(_) => Color::Gray,
    }
}

fn field_view(card: &FieldCard, state: &AppState) -> CardView {
    let Some(record) = &card.record else {
        return CardView {
            title: card.name().to_string(),
            badge: Some(("UNOWNED".to_string(), Color::DarkGray)),
            lines: vec![
                label_line("Area", format_area(card.info.area)),
                label_line("Price", format_price(card.info.price)),
                label_line("Level", card.info.level.to_string()),
            ],
            gauge: None,
            dimmed: true,
        };
    };

    let mut lines = vec![
        label_line("Area", format_area(card.info.area)),
        label_line("Crop", record.crop_name.clone().unwrap_or_else(|| "None".to_string())),
        label_line("State", record.state.label().to_string()),
    ];
    if record.fertilized {
        lines.push(label_line("Fertilized", "yes"));
    }
    let mut gauge = None;
    if let Some((_, harvest)) = card.growth_window() {
        lines.push(label_line("Ready At", format_local_time(harvest)));
        lines.push(countdown_line("Time Left", state.timers.harvest(card.name())));
        let percent = state.timers.progress(card.name()).unwrap_or(0.0);
        gauge = Some((percent, format!("{percent:.0}% grown")));
    }
    CardView {
        title: card.name().to_string(),
        badge: Some((
            record.state.label().to_uppercase(),
            state_color(&record.state),
        )),
        lines,
        gauge,
        dimmed: false,
    }
}

fn animal_view(card: &AnimalCard, state: &AppState) -> CardView {
    let Some(record) = &card.record else {
        return CardView {
            title: format!("{}  0/10", card.display_name()),
            badge: Some(("UNOWNED".to_string(), Color::DarkGray)),
            lines: vec![label_line("Feed type", card.info.feed_type)],
            gauge: None,
            dimmed: true,
        };
    };

    let percent = feed_percent(record.feed_level, record.feed_max);
    let mut lines = vec![
        label_line(
            "Amount to Feed",
            amount_to_feed(record.feed_level, record.feed_max).to_string(),
        ),
        label_line("Feed Level", format!("{percent:.0}%")),
        label_line("Feed Type", card.info.feed_type),
        countdown_line("Collection", state.timers.collection(card.int_name())),
    ];
    if let Some(ts) = record.collection_time {
        lines.push(label_line("Ready At", format_local_time(ts)));
    }
    CardView {
        title: format!("{}  {}/10", card.display_name(), record.total),
        badge: None,
        lines,
        gauge: Some((percent, "feed".to_string())),
        dimmed: false,
    }
}

fn render_field_cards(frame: &mut Frame, area: Rect, state: &AppState, pal: &Palette) {
    let views: Vec<CardView> = state
        .fields
        .iter()
        .skip(state.fields_scroll)
        .map(|card| field_view(card, state))
        .collect();
    render_cards(frame, area, views, state.settings.layout, pal);
}

fn render_animal_cards(frame: &mut Frame, area: Rect, state: &AppState, pal: &Palette) {
    let views: Vec<CardView> = state
        .animals
        .iter()
        .skip(state.animals_scroll)
        .map(|card| animal_view(card, state))
        .collect();
    render_cards(frame, area, views, state.settings.layout, pal);
}

fn render_cards(
    frame: &mut Frame,
    area: Rect,
    views: Vec<CardView>,
    layout: CardLayout,
    pal: &Palette,
) {
    if views.is_empty() {
        let empty = Paragraph::new("Nothing to show").style(pal.muted);
        frame.render_widget(empty, area);
        return;
    }

    let columns: usize = match layout {
        CardLayout::Single => 1,
        CardLayout::Grid => 2,
    };
    let col_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, columns as u32); columns])
        .split(area);

    let mut y = area.y;
    let bottom = area.y + area.height;
    for row in views.chunks(columns) {
        let row_height = row.iter().map(CardView::height).max().unwrap_or(0);
        if y + row_height > bottom {
            break;
        }
        for (col, view) in row.iter().enumerate() {
            let card_area = Rect {
                x: col_areas[col].x,
                y,
                width: col_areas[col].width,
                height: row_height,
            };
            render_card(frame, card_area, view, pal);
        }
        y += row_height;
    }
}

fn render_card(frame: &mut Frame, area: Rect, view: &CardView, pal: &Palette) {
    let mut title = vec![Span::styled(
        format!(" {} ", view.title),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let Some((badge, color)) = &view.badge {
        title.push(Span::styled(
            format!(" {badge} "),
            Style::default().fg(Color::Black).bg(*color),
        ));
    }
    let border = if view.dimmed { pal.muted } else { pal.base.fg(pal.accent) };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Line::from(title));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let text_style = if view.dimmed { pal.muted } else { pal.base };
    let text_height = (view.lines.len() as u16).min(inner.height);
    let text_area = Rect {
        height: text_height,
        ..inner
    };
    frame.render_widget(Paragraph::new(view.lines.clone()).style(text_style), text_area);

    if let Some((percent, label)) = &view.gauge {
        if inner.height > text_height {
            let gauge_area = Rect {
                y: inner.y + text_height,
                height: 1,
                ..inner
            };
            let gauge = Gauge::default()
                .gauge_style(Style::default().fg(pal.accent))
                .ratio((percent / 100.0).clamp(0.0, 1.0))
                .label(label.clone());
            frame.render_widget(gauge, gauge_area);
        }
    }
}

fn render_console(frame: &mut Frame, area: Rect, state: &AppState, pal: &Palette) {
    let status_style = if state.status.is_error {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        pal.base
    };
    let mut lines = vec![Line::from(Span::styled(state.status.text.clone(), status_style))];
    let start = state.logs.len().saturating_sub(2);
    for log in state.logs.iter().skip(start) {
        lines.push(Line::from(Span::styled(log.clone(), pal.muted)));
    }
    let console = Paragraph::new(lines).block(
        Block::default()
            .title("Status")
            .borders(Borders::ALL)
            .border_style(pal.muted),
    );
    frame.render_widget(console, area);
}

fn footer_text(state: &AppState) -> String {
    if state.key_editor.is_some() {
        return "Type API key | Enter Save | Esc Cancel".to_string();
    }
    "r Refresh | Tab Fields/Animals | j/k Scroll | s Settings | t Theme | l Light | g Grid | +/- Interval | m Minimize | ? Help | q Quit".to_string()
}

fn render_help_overlay(frame: &mut Frame, area: Rect, pal: &Palette) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Farm Tracker - Help",
        "",
        "  r            Refresh now (bypasses the 30s cache)",
        "  Tab          Switch Fields / Animals",
        "  j/k or ↑/↓   Scroll cards",
        "  s            Settings: API key",
        "  t            Cycle theme colour",
        "  l            Toggle light / dark",
        "  g            Toggle single / grid layout",
        "  + / -        Refresh interval ±15s (0 = manual)",
        "  o / O        Opacity down / up",
        "  m            Minimize",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(pal.accent)),
        )
        .style(pal.base);
    frame.render_widget(help, popup_area);
}

fn render_key_editor(frame: &mut Frame, area: Rect, buffer: &str, pal: &Palette) {
    let popup_area = centered_rect(60, 20, area);
    frame.render_widget(Clear, popup_area);
    let count = buffer.chars().count();
    let masked: String = buffer
        .chars()
        .enumerate()
        .map(|(i, c)| if i + 4 < count { '*' } else { c })
        .collect();
    let text = vec![
        Line::from("API key (X-Tycoon-Key):"),
        Line::from(Span::styled(
            format!("{masked}_"),
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];
    let editor = Paragraph::new(text)
        .block(
            Block::default()
                .title("Settings")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(pal.accent)),
        )
        .style(pal.base);
    frame.render_widget(editor, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
