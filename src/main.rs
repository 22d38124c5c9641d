use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::LevelFilter;
use quizmaster::{
    app::{App, KeyAction},
    config::{FileConfigStore, RuntimeSettings},
    question::Difficulty,
    runtime::{spawn_load, CrosstermEventSource, FixedTicker, QuizEventSource, Runner, Ticker},
    error::QuizError,
    source::{FallbackBank, OpenTriviaProvider, QuestionProvider, QuestionSource},
    store::{MemoryScores, ScoreDb, ScoreStore},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

const TICK_RATE_MS: u64 = 100;

/// timed multiple-choice trivia in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Timed multiple-choice trivia in the terminal. Questions come from the Open Trivia Database when it is reachable and from a bundled set otherwise; high score and session history are kept locally."
)]
pub struct Cli {
    /// skip the start screen and begin a quiz at this difficulty
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// number of questions to request from the provider
    #[clap(short = 'n', long)]
    questions: Option<usize>,

    /// seconds allowed per question
    #[clap(short = 's', long)]
    seconds: Option<u32>,

    /// never contact the trivia provider, use the bundled questions
    #[clap(long)]
    offline: bool,

    /// trivia provider endpoint
    #[clap(long)]
    api_url: Option<String>,

    /// directory holding the score database (default: ~/.local/state/quizmaster)
    #[clap(long)]
    data_dir: Option<PathBuf>,

    /// append logs to this file (filter with RUST_LOG)
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// write the session history as CSV to this path and exit
    #[clap(long, value_name = "PATH")]
    export_history: Option<PathBuf>,
}

impl Cli {
    /// Layer command line overrides on top of stored settings
    fn apply(&self, settings: &mut RuntimeSettings) {
        if let Some(d) = self.difficulty {
            settings.difficulty = Some(d);
        }
        if let Some(n) = self.questions {
            settings.questions_per_quiz = n.max(1);
        }
        if let Some(s) = self.seconds {
            settings.seconds_per_question = s;
        }
        if self.offline {
            settings.offline = true;
        }
        if let Some(url) = &self.api_url {
            settings.api_url = url.clone();
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    if let Some(path) = &cli.export_history {
        let db = ScoreDb::open(ScoreDb::default_path(cli.data_dir.as_deref()))?;
        let written = db.export_csv(path)?;
        println!("exported {written} sessions to {}", path.display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = FileConfigStore::new();
    log::debug!("config file {}", config_store.path().display());
    let mut settings = RuntimeSettings::from(&config_store.load_or_init());
    cli.apply(&mut settings);
    log::debug!("effective settings: {settings:?}");

    let source = Arc::new(build_source(&settings)?);
    let scores = open_scores(cli.data_dir.as_deref());
    let mut app = App::new(settings, scores);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = start_tui(&mut terminal, &mut app, &runner, source);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn init_logging(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(LevelFilter::Info);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    match &cli.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .target(env_logger::Target::Pipe(Box::new(file)))
                .write_style(env_logger::WriteStyle::Never);
        }
        // stderr is only safe while the alternate screen is not up
        None if cli.export_history.is_some() => {}
        None => return Ok(()),
    }

    builder.try_init()?;
    Ok(())
}

fn build_source(settings: &RuntimeSettings) -> Result<QuestionSource, Box<dyn Error>> {
    let bank = FallbackBank::bundled()?;
    if settings.offline {
        log::info!("offline mode, using bundled questions only");
        return Ok(QuestionSource::new(None, bank, settings.questions_per_quiz));
    }

    let provider = OpenTriviaProvider::new(
        settings.api_url.clone(),
        Duration::from_secs(settings.request_timeout_secs),
    );
    Ok(source_with(provider, bank, settings.questions_per_quiz))
}

fn source_with(
    provider: Result<OpenTriviaProvider, QuizError>,
    bank: FallbackBank,
    amount: usize,
) -> QuestionSource {
    match provider {
        Ok(provider) => {
            let provider: Box<dyn QuestionProvider> = Box::new(provider);
            QuestionSource::new(Some(provider), bank, amount)
        }
        Err(e) => {
            log::warn!("could not set up http client ({e}), using bundled questions only");
            QuestionSource::new(None, bank, amount)
        }
    }
}

fn open_scores(data_dir: Option<&Path>) -> Box<dyn ScoreStore> {
    let path = ScoreDb::default_path(data_dir);
    match ScoreDb::open(&path) {
        Ok(db) => Box::new(db),
        Err(e) => {
            log::warn!(
                "could not open score database {}: {e}; scores will not be kept",
                path.display()
            );
            Box::new(MemoryScores::new())
        }
    }
}

fn start_tui<B: Backend, E: QuizEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
    source: Arc<QuestionSource>,
) -> Result<(), Box<dyn Error>> {
    if let Some(difficulty) = app.settings.difficulty {
        if let Some(request) = app.choose_difficulty(difficulty) {
            spawn_load(Arc::clone(&source), request, runner.sender());
        }
    }

    let mut last_step = Instant::now();
    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let event = runner.step();
        let now = Instant::now();
        let elapsed = now.duration_since(last_step);
        last_step = now;

        match app.handle_event(event, elapsed) {
            KeyAction::Quit => break,
            KeyAction::Load(request) => {
                spawn_load(Arc::clone(&source), request, runner.sender());
            }
            KeyAction::None => {}
        }
    }

    Ok(())
}
