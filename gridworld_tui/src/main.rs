mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::AppConfig;
use gridworld_core::{Goal, KeyColor, LoggedEvent, SimEvent, Simulation, Thought, World};
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    fs::File,
    io::{self, Stdout},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Smallest grid side the host will hand to the simulation.
const MIN_SIDE: usize = 5;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Layout file to load instead of the standard layout
    #[arg(short, long, value_name = "MAP_FILE")]
    map: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Grid width of the standard layout. Raised to at least 5; parity is
    /// kept, so even sizes such as the default 12 keep their cross walls.
    /// Only --fit forces odd sides.
    #[arg(long)]
    width: Option<usize>,

    /// Grid height of the standard layout. Same rules as --width
    #[arg(long)]
    height: Option<usize>,

    /// Seed for goal shuffling
    #[arg(short, long)]
    seed: Option<u64>,

    /// Milliseconds between ticks
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Size the grid to the terminal and re-fit on resize
    #[arg(long, conflicts_with = "map")]
    fit: bool,

    /// Run to completion without a terminal UI and print the final state as JSON
    #[arg(long)]
    headless: bool,

    /// Tick budget for headless runs
    #[arg(long, default_value_t = 100_000)]
    max_ticks: u64,

    /// Write logs here. Interactive runs log nowhere without it.
    #[arg(long, value_name = "LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Args {
    /// Folds CLI flags over the file config.
    ///
    /// Dimensions are clamped to [`MIN_SIDE`] but not forced odd; that only
    /// happens when fitting to the terminal.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(width) = self.width {
            config.simulation.width = width;
        }
        if let Some(height) = self.height {
            config.simulation.height = height;
        }
        if let Some(seed) = self.seed {
            config.simulation.seed = seed;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_ms = tick_ms;
        }
        config.simulation.width = config.simulation.width.max(MIN_SIDE);
        config.simulation.height = config.simulation.height.max(MIN_SIDE);
    }
}

struct App {
    sim: Simulation,
    config: AppConfig,
    /// A parsed layout is restarted on reset rather than regenerated.
    from_layout: bool,
    fit: bool,
    paused: bool,
    should_quit: bool,
}

impl App {
    fn tick(&mut self) {
        if self.paused || self.sim.is_halted() {
            return;
        }
        self.sim.tick();
    }

    /// Starts the run over. `area` is the current terminal size, used when fitting.
    fn reset(&mut self, area: Rect) {
        if self.from_layout {
            self.sim.restart();
        } else if self.fit {
            let (width, height) = fit_to(area);
            self.sim.reset(width, height);
        } else {
            self.sim
                .reset(self.config.simulation.width, self.config.simulation.height);
        }
    }

    fn on_resize(&mut self, area: Rect) {
        if !self.fit {
            return;
        }
        let fitted = fit_to(area);
        if fitted != (self.sim.world().width(), self.sim.world().height()) {
            info!(width = fitted.0, height = fitted.1, "terminal resized, refitting grid");
            self.sim.reset(fitted.0, fitted.1);
        }
    }

    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    args.apply(&mut config);

    init_tracing(&args)?;

    let sim = build_simulation(args.map.as_deref(), &config)?;
    if args.headless {
        return run_headless(sim, args.max_ticks);
    }

    let mut terminal = setup_terminal()?;
    let mut app = App {
        sim,
        config,
        from_layout: args.map.is_some(),
        fit: args.fit,
        paused: false,
        should_quit: false,
    };
    if app.fit {
        let size = terminal.size()?;
        app.reset(Rect::new(0, 0, size.width, size.height));
    }

    // Restore the terminal even when the loop fails.
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;
    result
}

fn init_tracing(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Some(path) = &args.log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    } else if args.headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(false)
            .compact()
            .init();
    }
    Ok(())
}

fn build_simulation(map: Option<&Path>, config: &AppConfig) -> Result<Simulation> {
    let Some(path) = map else {
        return Ok(Simulation::new(config.simulation.clone()));
    };
    let layout = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read map file {}", path.display()))?;
    Simulation::from_layout(&layout, config.simulation.clone())
        .with_context(|| format!("failed to parse map file {}", path.display()))
}

fn run_headless(mut sim: Simulation, max_ticks: u64) -> Result<()> {
    let ran = sim.run_until_halt(max_ticks);
    if sim.is_halted() {
        info!(ticks = ran, "run complete");
    } else {
        warn!(ticks = ran, "tick budget exhausted before halting");
    }
    let json = serde_json::to_string_pretty(&sim.view()).context("failed to serialize final state")?;
    println!("{json}");
    Ok(())
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(app.config.tick_ms);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                    KeyCode::Char('p') => app.paused = !app.paused,
                    KeyCode::Char('r') => {
                        let size = terminal.size()?;
                        app.reset(Rect::new(0, 0, size.width, size.height));
                    }
                    _ => {}
                },
                Event::Resize(cols, rows) => app.on_resize(Rect::new(0, 0, cols, rows)),
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Screen regions, shared by drawing and grid fitting.
struct Panes {
    map: Rect,
    inventory: Rect,
    events: Rect,
    status: Rect,
}

fn panes(area: Rect) -> Panes {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(70),
            Constraint::Percentage(20),
            Constraint::Percentage(10),
        ])
        .split(area);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rows[1]);
    Panes {
        map: rows[0],
        inventory: bottom[0],
        events: bottom[1],
        status: rows[2],
    }
}

/// Grid dimensions that fill the map pane of a terminal of size `area`.
fn fit_to(area: Rect) -> (usize, usize) {
    let inner = bordered("").inner(panes(area).map);
    fit_dimensions(inner.width, inner.height)
}

/// Clamps each side to at least [`MIN_SIDE`] and makes it odd.
fn fit_dimensions(cols: u16, rows: u16) -> (usize, usize) {
    let side = |n: u16| {
        let n = usize::from(n).max(MIN_SIDE);
        if n % 2 == 0 { n - 1 } else { n }
    };
    (side(cols), side(rows))
}

fn bordered(title: &str) -> Block<'_> {
    Block::default().borders(Borders::ALL).title(title)
}

fn ui(frame: &mut Frame, app: &App) {
    let panes = panes(frame.area());

    render_map(frame, panes.map, &app.sim);
    render_inventory(frame, panes.inventory, &app.sim);
    render_events(frame, panes.events, &app.sim);

    let state = if app.sim.is_halted() {
        "halted"
    } else if app.paused {
        "paused"
    } else {
        "running"
    };
    let status = Paragraph::new(format!(
        "tick {} | seed {} | {state} | 'q'/Esc quit, 'r' reset, 'p' pause",
        app.sim.tick_count(),
        app.sim.config().seed
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status, panes.status);
}

fn key_style(color: KeyColor) -> Style {
    let fg = match color {
        KeyColor::Red => Color::Red,
        KeyColor::Blue => Color::Blue,
        KeyColor::Green => Color::Green,
        KeyColor::Yellow => Color::Yellow,
    };
    Style::default().fg(fg)
}

/// Draws explored cells; everything else stays under fog.
fn render_map(frame: &mut Frame, area: Rect, sim: &Simulation) {
    let World { map, entities } = sim.world();
    let agent = sim.agent();
    let goal = agent.goal.map(|g| g.position());

    let lines: Vec<Line> = (0..map.height())
        .map(|y| {
            let spans: Vec<Span> = (0..map.width())
                .map(|x| {
                    let cell = gridworld_core::Position::new(x, y);
                    if !sim.visibility().is_explored(cell) {
                        Span::styled("░", Style::default().fg(Color::DarkGray))
                    } else if cell == agent.position {
                        Span::styled("@", Style::default().fg(Color::White).bold())
                    } else if let Some(key) = entities.key_at(cell) {
                        Span::styled("k", key_style(key.color))
                    } else if let Some(door) = entities.door_at(cell) {
                        Span::styled(if door.is_open { "+" } else { "|" }, key_style(door.color))
                    } else if map.is_wall(cell) {
                        Span::styled("#", Style::default().fg(Color::DarkGray))
                    } else if Some(cell) == goal {
                        Span::styled("*", Style::default().fg(Color::Cyan))
                    } else if sim.unreachable().contains(cell) {
                        Span::styled("x", Style::default().fg(Color::DarkGray))
                    } else {
                        Span::raw(" ")
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    let title = format!("Grid World {}x{}", map.width(), map.height());
    let widget = Paragraph::new(lines)
        .block(bordered(&title))
        .alignment(Alignment::Center);
    frame.render_widget(widget, area);
}

fn render_inventory(frame: &mut Frame, area: Rect, sim: &Simulation) {
    let agent = sim.agent();
    let mut keys = vec![Span::raw("Keys: ")];
    keys.extend(
        agent
            .inventory
            .colors()
            .map(|color| Span::styled("k", key_style(color))),
    );

    let goal = match agent.goal {
        Some(goal) => describe_goal(&goal),
        None => "none".to_string(),
    };
    let items = vec![
        ListItem::from(format!("Pos: {}", agent.position)),
        ListItem::from(Line::from(keys)),
        ListItem::from(format!("Goal: {goal}")),
        ListItem::from(format!(
            "Explored: {} / {}",
            sim.visibility().explored_count(),
            sim.world().width() * sim.world().height()
        )),
    ];
    frame.render_widget(List::new(items).block(bordered("Inventory")), area);
}

fn render_events(frame: &mut Frame, area: Rect, sim: &Simulation) {
    let visible = usize::from(area.height.saturating_sub(2));
    let items: Vec<ListItem> = sim
        .events()
        .tail(visible)
        .iter()
        .map(|entry| ListItem::from(narrate(entry)))
        .collect();
    frame.render_widget(List::new(items).block(bordered("Events")), area);
}

fn describe_goal(goal: &Goal) -> String {
    match goal {
        Goal::Key { at, color } => format!("{color} key at {at}"),
        Goal::Door { at, color } => format!("{color} door at {at}"),
        Goal::Explore { at } => format!("explore {at}"),
    }
}

/// One line of narration for the event pane.
fn narrate(entry: &LoggedEvent) -> String {
    let text = match &entry.event {
        SimEvent::GoalSet { goal, .. } => format!("new goal: {}", describe_goal(goal)),
        SimEvent::Deliberated { thought } => match thought {
            Thought::HeadingToKey { color, at } => {
                format!("thinking: the {color} key at {at} looks useful")
            }
            Thought::OpeningDoor { color, at } => {
                format!("thinking: I can open the {color} door at {at}")
            }
            Thought::Exploring { at } => format!("thinking: what is around {at}?"),
        },
        SimEvent::MovedTo { at } => format!("moved to {at}"),
        SimEvent::PickedUp { color } => format!("picked up the {color} key"),
        SimEvent::OpenedDoor { color } => format!("opened the {color} door"),
        SimEvent::GoalAbandoned { goal } => format!("gave up on {}", describe_goal(goal)),
        SimEvent::AllComplete => "nothing left to do".to_string(),
    };
    format!("[{:>4}] {text}", entry.tick)
}
