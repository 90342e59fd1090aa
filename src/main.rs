use std::fs::{self, OpenOptions};
use std::io::{self, stdin};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend as TermBackend, CrosstermBackend},
    Terminal,
};
use tokio::runtime::Handle;
use tracing::info;
use tracing_subscriber::EnvFilter;

use typemaster::{
    api::{Backend, Difficulty, HttpBackend},
    app_dirs::AppDirs,
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore},
    controller::{
        ChatController, GameController, LessonController, ProgressController, TestController,
    },
    game::GameSession,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    ui::{self, ModeKind, UiState},
};

const TICK_RATE_MS: u64 = 100;
const CLOCK_PERIOD: Duration = Duration::from_secs(1);

/// terminal typing practice against a typing-analysis server
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Typing tests with live WPM predictions, guided lessons, a timed word game, progress charts and a typing assistant, all backed by a typing-analysis server."
)]
pub struct Cli {
    /// base url of the typing server (overrides the config file)
    #[clap(long, global = true)]
    server: Option<String>,

    /// text and word difficulty
    #[clap(short = 'd', long, value_enum, global = true)]
    difficulty: Option<Difficulty>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// timed typing test with analysis
    Test,
    /// guided lesson
    Lesson {
        /// lesson to open
        #[clap(long, default_value = "1")]
        id: String,
    },
    /// type as many words as possible before the clock runs out
    Game {
        /// round length in seconds
        #[clap(long)]
        secs: Option<u32>,
    },
    /// history chart and error statistics
    Progress,
    /// ask the typing assistant
    Chat,
    /// print the effective settings; --save writes them to the config file
    Config {
        #[clap(long)]
        save: bool,
    },
}

impl Command {
    /// Screen to open, `None` for commands that don't start the TUI
    fn mode(&self) -> Option<ModeKind> {
        match self {
            Command::Test => Some(ModeKind::Test),
            Command::Lesson { .. } => Some(ModeKind::Lesson),
            Command::Game { .. } => Some(ModeKind::Game),
            Command::Progress => Some(ModeKind::Progress),
            Command::Chat => Some(ModeKind::Chat),
            Command::Config { .. } => None,
        }
    }

    fn lesson_id(&self) -> &str {
        match self {
            Command::Lesson { id } => id,
            _ => "1",
        }
    }
}

impl Cli {
    /// Layer command line overrides over the stored config
    fn apply(&self, mut config: Config) -> Config {
        if let Some(server) = &self.server {
            config.base_url = server.clone();
        }
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Command::Game { secs: Some(secs) } = self.command {
            config.game_duration_secs = secs;
        }
        config
    }
}

enum Controller<B: Backend> {
    Test(TestController<B>),
    Lesson(LessonController<B>, String),
    Game(GameController<B>),
    Progress(ProgressController<B>),
    Chat(ChatController<B>),
}

/// What the loop should do after a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    /// A session (re)started; count the next clock tick from now
    RestartClock,
    Quit,
}

pub struct App<B: Backend> {
    controller: Controller<B>,
    ui: UiState,
}

impl<B: Backend> App<B> {
    fn new(
        mode: ModeKind,
        lesson_id: &str,
        config: &Config,
        backend: Arc<B>,
        handle: Handle,
    ) -> Self {
        let controller = match mode {
            ModeKind::Test => Controller::Test(TestController::with_clock(
                backend,
                handle,
                SystemClock,
                config.difficulty,
                config.prediction_timing(),
            )),
            ModeKind::Lesson => Controller::Lesson(
                LessonController::new(backend, handle),
                lesson_id.to_string(),
            ),
            ModeKind::Game => Controller::Game(GameController::with_game(
                backend,
                handle,
                GameSession::new(config.game_duration_secs),
                config.difficulty,
                config.game_word_count,
            )),
            ModeKind::Progress => Controller::Progress(ProgressController::new(backend, handle)),
            ModeKind::Chat => Controller::Chat(ChatController::new(backend, handle)),
        };

        Self {
            controller,
            ui: UiState::new(mode),
        }
    }

    /// Kick off the first backend request for the chosen mode
    fn open(&mut self) {
        let view = &mut self.ui.view;
        match &mut self.controller {
            Controller::Test(ctl) => ctl.request_text(view),
            Controller::Lesson(ctl, id) => ctl.load_lesson(id, view),
            Controller::Game(ctl) => ctl.start(view),
            Controller::Progress(ctl) => ctl.refresh(view),
            Controller::Chat(ctl) => ctl.open(view),
        }
    }

    fn poll(&mut self) {
        let view = &mut self.ui.view;
        match &mut self.controller {
            Controller::Test(ctl) => ctl.poll(view),
            Controller::Lesson(ctl, _) => ctl.poll(view),
            Controller::Game(ctl) => ctl.poll(view),
            Controller::Progress(ctl) => ctl.poll(view),
            Controller::Chat(ctl) => ctl.poll(view),
        }
        self.ui.sync_input();
    }

    fn tick(&mut self) {
        let view = &mut self.ui.view;
        match &mut self.controller {
            Controller::Test(ctl) => ctl.on_tick(view),
            Controller::Lesson(ctl, _) => ctl.on_tick(view),
            Controller::Game(ctl) => ctl.on_tick(view),
            Controller::Progress(_) | Controller::Chat(_) => {}
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if key.code == KeyCode::Esc || (ctrl && key.code == KeyCode::Char('c')) {
            return Flow::Quit;
        }

        let mut flow = Flow::Continue;
        let ui = &mut self.ui;
        match &mut self.controller {
            Controller::Test(ctl) => match key.code {
                KeyCode::Enter => {
                    ctl.end(&mut ui.view);
                }
                KeyCode::Char('r') if ctrl => {
                    ctl.request_text(&mut ui.view);
                    flow = Flow::RestartClock;
                }
                code if !ctrl => {
                    if let Some(name) = key_name(code) {
                        ctl.on_keystroke(&name);
                    }
                    if edit_input(&mut ui.input, code) {
                        ctl.on_input(&ui.input, &mut ui.view);
                    }
                }
                _ => {}
            },
            Controller::Lesson(ctl, _) => match key.code {
                KeyCode::Enter => {
                    if ctl.start(&mut ui.view) {
                        flow = Flow::RestartClock;
                    }
                }
                KeyCode::PageUp => {
                    ctl.load_adjacent(-1, &mut ui.view);
                }
                KeyCode::PageDown => {
                    ctl.load_adjacent(1, &mut ui.view);
                }
                code if !ctrl => {
                    if let Some(name) = key_name(code) {
                        ctl.on_keystroke(&name);
                    }
                    if edit_input(&mut ui.input, code) {
                        ctl.on_input(&ui.input, &mut ui.view);
                    }
                }
                _ => {}
            },
            Controller::Game(ctl) => match key.code {
                KeyCode::Enter if !ctl.game().is_active() => {
                    ctl.start(&mut ui.view);
                    flow = Flow::RestartClock;
                }
                code if !ctrl => {
                    if edit_input(&mut ui.input, code) {
                        ctl.on_input(&ui.input, &mut ui.view);
                    }
                }
                _ => {}
            },
            Controller::Progress(ctl) => {
                if key.code == KeyCode::Char('r') {
                    ctl.refresh(&mut ui.view);
                }
            }
            Controller::Chat(ctl) => match key.code {
                KeyCode::Enter => {
                    ctl.ask(&ui.input, &mut ui.view);
                }
                KeyCode::Tab => {
                    ctl.ask_suggested(ui.selected_question, &mut ui.view);
                }
                KeyCode::Up => ui.selected_question = ui.selected_question.saturating_sub(1),
                KeyCode::Down => {
                    ui.selected_question = (ui.selected_question + 1)
                        .min(typemaster::chat::SUGGESTED_QUESTIONS.len() - 1)
                }
                code if !ctrl => {
                    edit_input(&mut ui.input, code);
                }
                _ => {}
            },
        }
        self.ui.sync_input();
        flow
    }
}

/// Name recorded in the keystroke log, `None` for keys that are not logged
fn key_name(code: KeyCode) -> Option<String> {
    match code {
        KeyCode::Char(c) => Some(c.to_string()),
        KeyCode::Backspace => Some("Backspace".into()),
        KeyCode::Enter => Some("Enter".into()),
        _ => None,
    }
}

/// Apply a key to the input buffer; true when the buffer changed
fn edit_input(input: &mut String, code: KeyCode) -> bool {
    match code {
        KeyCode::Char(c) => {
            input.push(c);
            true
        }
        KeyCode::Backspace => input.pop().is_some(),
        _ => false,
    }
}

fn init_logging() -> anyhow::Result<()> {
    let Some(path) = AppDirs::log_path() else {
        return Ok(());
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("typemaster=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// `config` subcommand: the effective settings as JSON, stored first when asked
fn config_command<S: ConfigStore>(
    store: &S,
    config: &Config,
    save: bool,
) -> anyhow::Result<String> {
    if save {
        store.save(config).context("writing config file")?;
        info!("config saved");
    }
    Ok(serde_json::to_string_pretty(config)?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let store = FileConfigStore::new();
    let config = cli.apply(store.load());

    let Some(mode) = cli.command.mode() else {
        let save = matches!(cli.command, Command::Config { save: true });
        println!("{}", config_command(&store, &config, save)?);
        println!("# {}", store.path().display());
        return Ok(());
    };

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging()?;

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    let backend = Arc::new(
        HttpBackend::new(&config.base_url, config.request_timeout())
            .context("configuring the server connection")?,
    );
    info!(server = %backend.base_url(), %mode, "starting");

    let mut app = App::new(
        mode,
        cli.command.lesson_id(),
        &config,
        backend,
        runtime.handle().clone(),
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<T: TermBackend, B: Backend>(
    terminal: &mut Terminal<T>,
    app: &mut App<B>,
) -> anyhow::Result<()> {
    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS), CLOCK_PERIOD),
    );
    app.open();

    loop {
        app.poll();
        terminal.draw(|f| ui::draw(&app.ui, f))?;

        match runner.step() {
            AppEvent::Tick => app.tick(),
            AppEvent::Idle | AppEvent::Resize => {}
            AppEvent::Key(key) => match app.on_key(key) {
                Flow::Quit => break,
                Flow::RestartClock => runner.restart_clock(),
                Flow::Continue => {}
            },
        }
    }

    info!("bye");
    Ok(())
}
