use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use laptick::{
    alarm::TerminalBell,
    app::{App, AppSettings},
    app_dirs::AppDirs,
    clock::MonotonicClock,
    config::{Config, ConfigStore, FileConfigStore},
    format::parse_hms,
    logging::init_logging,
    persistence::store_for,
    runtime::{AppEvent, Cadence, EventSource, Runner, IDLE_TICK},
    tracker::{Mode, TimeTracker},
    ui,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

/// terminal stopwatch and countdown timer with lap splits
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal stopwatch and countdown timer. Records lap splits, highlights the best and worst lap, and remembers its state between runs."
)]
pub struct Cli {
    /// start in this mode instead of the remembered one
    #[clap(short = 'm', long, value_enum)]
    mode: Option<CliMode>,

    /// countdown duration as H:M:S, M:S or S (implies countdown mode)
    #[clap(short = 'c', long)]
    countdown: Option<String>,

    /// redraw interval in milliseconds
    #[clap(long)]
    tick_rate_ms: Option<u64>,

    /// where to keep the saved timer state
    #[clap(long)]
    state_file: Option<PathBuf>,

    /// reset a running timer without asking
    #[clap(long)]
    no_confirm_reset: bool,

    /// log level for the file log (trace, debug, info, warn, error, off)
    #[clap(long)]
    log_level: Option<String>,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum CliMode {
    Stopwatch,
    Countdown,
}

impl From<CliMode> for Mode {
    fn from(m: CliMode) -> Self {
        match m {
            CliMode::Stopwatch => Mode::Stopwatch,
            CliMode::Countdown => Mode::Countdown,
        }
    }
}

impl Cli {
    /// CLI flags win over the config file
    fn merge_into(&self, mut cfg: Config) -> Config {
        if let Some(ms) = self.tick_rate_ms {
            cfg.tick_rate_ms = ms;
        }
        if self.no_confirm_reset {
            cfg.confirm_reset = false;
        }
        if let Some(level) = &self.log_level {
            cfg.log_level = level.clone();
        }
        cfg.tick_rate_ms = cfg.tick_rate_ms.max(1);
        cfg
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = cli.merge_into(FileConfigStore::new().load());

    if let Some(dir) = AppDirs::log_dir() {
        if let Err(e) = init_logging(&config.log_level, &dir) {
            eprintln!("laptick: logging disabled: {e}");
        }
    }

    let mut tracker = TimeTracker::new(
        Box::new(MonotonicClock::new()),
        Box::new(store_for(cli.state_file.as_deref())),
    );
    if let Err(msg) = apply_cli(&cli, &mut tracker) {
        Cli::command().error(ErrorKind::InvalidValue, msg).exit();
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(tracker, Box::new(TerminalBell), AppSettings::from(&config));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, &config);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        log::error!("terminal loop failed: {e}");
    }
    result
}

fn apply_cli(cli: &Cli, tracker: &mut TimeTracker) -> Result<(), String> {
    // validate the duration before switching modes wipes the saved session
    if let Some(raw) = &cli.countdown {
        let (h, m, s) =
            parse_hms(raw).ok_or_else(|| format!("`{raw}` is not a H:M:S duration"))?;
        tracker
            .configure_countdown(h, m, s)
            .map_err(|e| e.to_string())?;
    }

    let mode = match (&cli.countdown, cli.mode) {
        (Some(_), _) => Some(Mode::Countdown),
        (None, m) => m.map(Mode::from),
    };
    if let Some(mode) = mode {
        if mode != tracker.mode() {
            tracker.switch_mode(mode).map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(
        EventSource::crossterm(),
        Cadence::new(Duration::from_millis(config.tick_rate_ms), IDLE_TICK),
    );

    terminal.draw(|f| ui::draw(app, f))?;

    while !app.should_quit {
        match runner.step(app.tracker.is_running()) {
            AppEvent::Tick => app.on_tick(),
            AppEvent::Key(key) => app.on_key(key),
            AppEvent::Resize => {}
        }
        terminal.draw(|f| ui::draw(app, f))?;
    }

    Ok(())
}
