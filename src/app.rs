use std::time::Duration;

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::RuntimeSettings;
use crate::question::Difficulty;
use crate::results::ResultSummary;
use crate::runtime::QuizEvent;
use crate::session::{AdvanceOutcome, AdvanceTrigger, QuizSession};
use crate::source::{Origin, QuestionSet};
use crate::store::{ScoreStore, SessionRecord};
use crate::timer::TimerSlot;

/// Number of past sessions shown on the results screen
pub const HISTORY_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Start,
    Loading,
    Quiz,
    Results,
}

/// A question fetch the event loop should run off the UI thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest {
    pub generation: u64,
    pub difficulty: Difficulty,
}

/// What the event loop should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    None,
    Quit,
    Load(LoadRequest),
}

/// Everything that belongs to a single pass through the three screens
#[derive(Debug)]
pub struct Round {
    pub state: AppState,
    pub difficulty: Option<Difficulty>,
    pub start_cursor: usize,
    pub session: Option<QuizSession>,
    pub origin: Option<Origin>,
    pub summary: Option<ResultSummary>,
    pub timer: TimerSlot<usize>,
    pub results_scroll: usize,
}

impl Default for Round {
    fn default() -> Self {
        Self {
            state: AppState::Start,
            difficulty: None,
            start_cursor: 0,
            session: None,
            origin: None,
            summary: None,
            timer: TimerSlot::new(),
            results_scroll: 0,
        }
    }
}

/// Top level state machine: Start -> Loading -> Quiz -> Results -> Start
pub struct App {
    pub settings: RuntimeSettings,
    pub round: Round,
    pub high_score: u32,
    pub history: Vec<SessionRecord>,
    scores: Box<dyn ScoreStore>,
    load_generation: u64,
}

impl App {
    pub fn new(settings: RuntimeSettings, scores: Box<dyn ScoreStore>) -> Self {
        let high_score = scores.get();
        let history = load_history(scores.as_ref());
        Self {
            settings,
            round: Round::default(),
            high_score,
            history,
            scores,
            load_generation: 0,
        }
    }

    pub fn state(&self) -> AppState {
        self.round.state
    }

    pub fn session(&self) -> Option<&QuizSession> {
        self.round.session.as_ref()
    }

    pub fn seconds_remaining(&self) -> Option<u32> {
        self.round.timer.remaining_secs()
    }

    /// Leaves the start screen; the caller must run the returned load.
    pub fn choose_difficulty(&mut self, difficulty: Difficulty) -> Option<LoadRequest> {
        if self.round.state != AppState::Start {
            return None;
        }
        self.load_generation += 1;
        self.round.difficulty = Some(difficulty);
        self.round.state = AppState::Loading;
        log::info!("starting {difficulty} quiz");
        Some(LoadRequest {
            generation: self.load_generation,
            difficulty,
        })
    }

    /// Installs a resolved question list; stale or unexpected loads are dropped.
    pub fn on_questions_loaded(&mut self, generation: u64, set: QuestionSet) -> bool {
        if self.round.state != AppState::Loading || generation != self.load_generation {
            log::debug!("dropping stale question load {generation}");
            return false;
        }

        let origin = set.origin;
        match QuizSession::new(set.questions) {
            Some(session) => {
                log::info!("{} questions ready ({origin})", session.state().total());
                self.round.session = Some(session);
                self.round.origin = Some(origin);
                self.round.state = AppState::Quiz;
                self.round
                    .timer
                    .replace(0, self.settings.seconds_per_question);
                true
            }
            None => {
                log::warn!("no questions available, back to start");
                self.restart();
                false
            }
        }
    }

    pub fn select_option(&mut self, index: usize) -> bool {
        if self.round.state != AppState::Quiz {
            return false;
        }
        self.round
            .session
            .as_mut()
            .is_some_and(|s| s.select_option(index))
    }

    pub fn next(&mut self) -> AdvanceOutcome {
        self.advance(AdvanceTrigger::User)
    }

    pub fn previous(&mut self) -> bool {
        if self.round.state != AppState::Quiz {
            return false;
        }
        let Some(session) = self.round.session.as_mut() else {
            return false;
        };
        if !session.retreat() {
            return false;
        }
        let index = session.state().current_index;
        self.round
            .timer
            .replace(index, self.settings.seconds_per_question);
        true
    }

    /// Feeds elapsed time to the question countdown.
    pub fn on_tick(&mut self, elapsed: Duration) -> AdvanceOutcome {
        let Some(expired) = self.round.timer.tick(elapsed) else {
            return AdvanceOutcome::Ignored;
        };
        let current = self
            .round
            .session
            .as_ref()
            .map(|s| s.state().current_index);
        if self.round.state != AppState::Quiz || current != Some(expired) {
            return AdvanceOutcome::Ignored;
        }
        log::debug!("time is up for question {}", expired + 1);
        self.advance(AdvanceTrigger::TimerExpired)
    }

    fn advance(&mut self, trigger: AdvanceTrigger) -> AdvanceOutcome {
        if self.round.state != AppState::Quiz {
            return AdvanceOutcome::Ignored;
        }
        let Some(session) = self.round.session.as_mut() else {
            return AdvanceOutcome::Ignored;
        };

        let outcome = session.advance(trigger, self.scores.as_mut());
        match outcome {
            AdvanceOutcome::Ignored => {}
            AdvanceOutcome::Next(index) => {
                self.round
                    .timer
                    .replace(index, self.settings.seconds_per_question);
            }
            AdvanceOutcome::Completed { score, high_score } => {
                self.round.timer.cancel();
                let summary = ResultSummary::new(session.answered(), score);
                self.finish(summary, high_score);
            }
        }
        outcome
    }

    fn finish(&mut self, summary: ResultSummary, high_score: u32) {
        if let Some(difficulty) = self.round.difficulty {
            let record = SessionRecord {
                finished_at: Local::now(),
                difficulty,
                score: summary.score,
                total: summary.total as u32,
                percentage: summary.percentage,
            };
            if let Err(e) = self.scores.record_session(&record) {
                log::warn!("could not record session: {e}");
            }
        }
        self.history = load_history(self.scores.as_ref());
        self.high_score = high_score;
        self.round.summary = Some(summary);
        self.round.results_scroll = 0;
        self.round.state = AppState::Results;
    }

    /// Back to the start screen with nothing carried over from the last round.
    pub fn restart(&mut self) {
        self.round = Round::default();
    }

    /// One loop step: account for `elapsed` time, then apply `event`.
    pub fn handle_event(&mut self, event: QuizEvent, elapsed: Duration) -> KeyAction {
        self.on_tick(elapsed);
        match event {
            QuizEvent::Key(key) => self.handle_key(key),
            QuizEvent::QuestionsLoaded { generation, set } => {
                self.on_questions_loaded(generation, set);
                KeyAction::None
            }
            QuizEvent::Tick | QuizEvent::Resize => KeyAction::None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyAction {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return KeyAction::Quit;
        }

        match self.round.state {
            AppState::Start => self.on_start_key(key),
            AppState::Loading => KeyAction::None,
            AppState::Quiz => {
                self.on_quiz_key(key);
                KeyAction::None
            }
            AppState::Results => self.on_results_key(key),
        }
    }

    fn on_start_key(&mut self, key: KeyEvent) -> KeyAction {
        let last = Difficulty::ALL.len() - 1;
        let chosen = match key.code {
            KeyCode::Char('q') => return KeyAction::Quit,
            KeyCode::Up | KeyCode::Char('k') => {
                self.round.start_cursor = self.round.start_cursor.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.round.start_cursor = (self.round.start_cursor + 1).min(last);
                None
            }
            KeyCode::Enter | KeyCode::Char(' ') => Difficulty::ALL.get(self.round.start_cursor).copied(),
            KeyCode::Char('1') | KeyCode::Char('e') => Some(Difficulty::Easy),
            KeyCode::Char('2') | KeyCode::Char('m') => Some(Difficulty::Medium),
            KeyCode::Char('3') | KeyCode::Char('h') => Some(Difficulty::Hard),
            _ => None,
        };

        chosen
            .and_then(|d| self.choose_difficulty(d))
            .map_or(KeyAction::None, KeyAction::Load)
    }

    fn on_quiz_key(&mut self, key: KeyEvent) {
        let Some(state) = self.round.session.as_ref().map(|s| s.state()) else {
            return;
        };
        let option_count = state.current_question().map_or(0, |q| q.options.len());
        let selected = state.selected;

        match key.code {
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                self.select_option(index);
            }
            KeyCode::Down | KeyCode::Char('j') if option_count > 0 => {
                let index = selected.map_or(0, |i| (i + 1).min(option_count - 1));
                self.select_option(index);
            }
            KeyCode::Up | KeyCode::Char('k') if option_count > 0 => {
                let index = selected.map_or(option_count - 1, |i| i.saturating_sub(1));
                self.select_option(index);
            }
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('n') => {
                self.next();
            }
            KeyCode::Left | KeyCode::Char('p') => {
                self.previous();
            }
            _ => {}
        }
    }

    fn on_results_key(&mut self, key: KeyEvent) -> KeyAction {
        match key.code {
            KeyCode::Char('q') => return KeyAction::Quit,
            KeyCode::Char('r') | KeyCode::Enter => self.restart(),
            KeyCode::Down | KeyCode::Char('j') => {
                let rows = self.round.summary.as_ref().map_or(0, |s| s.reviews.len());
                self.round.results_scroll = (self.round.results_scroll + 1).min(rows.saturating_sub(1));
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.round.results_scroll = self.round.results_scroll.saturating_sub(1);
            }
            _ => {}
        }
        KeyAction::None
    }
}

fn load_history(scores: &dyn ScoreStore) -> Vec<SessionRecord> {
    scores.recent_sessions(HISTORY_LEN).unwrap_or_else(|e| {
        log::warn!("could not read session history: {e}");
        Vec::new()
    })
}
