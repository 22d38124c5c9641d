use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::app::LoadRequest;
use crate::source::{QuestionSet, QuestionSource};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum QuizEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    /// A background question load finished
    QuestionsLoaded { generation: u64, set: QuestionSet },
}

/// Source of events (keyboard, resize, finished loads)
pub trait QuizEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError>;

    /// Handle that background workers use to post events into this source
    fn sender(&self) -> Sender<QuizEvent>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    tx: Sender<QuizEvent>,
    rx: Receiver<QuizEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let reader_tx = tx.clone();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if reader_tx.send(QuizEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if reader_tx.send(QuizEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("terminal event reader stopped: {e}");
                    break;
                }
            }
        });

        Self { tx, rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<QuizEvent> {
        self.tx.clone()
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    tx: Sender<QuizEvent>,
    rx: Receiver<QuizEvent>,
}

impl TestEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }
}

impl Default for TestEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<QuizEvent> {
        self.tx.clone()
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: QuizEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: QuizEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn sender(&self) -> Sender<QuizEvent> {
        self.event_source.sender()
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> QuizEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => QuizEvent::Tick,
        }
    }
}

/// Resolves a question set off the UI thread and posts it back as an event.
pub fn spawn_load(
    source: Arc<QuestionSource>,
    request: LoadRequest,
    tx: Sender<QuizEvent>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let set = source.load(request.difficulty);
        let event = QuizEvent::QuestionsLoaded {
            generation: request.generation,
            set,
        };
        if tx.send(event).is_err() {
            log::debug!("event loop gone before load {} finished", request.generation);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::Difficulty;
    use crate::source::{FallbackBank, Origin};

    #[test]
    fn step_returns_tick_on_timeout() {
        let es = TestEventSource::new();
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        // With no events available, step should yield Tick
        let ev = runner.step();
        match ev {
            QuizEvent::Tick => {}
            _ => panic!("expected Tick on timeout"),
        }
    }

    #[test]
    fn step_passes_through_events() {
        let es = TestEventSource::new();
        es.sender().send(QuizEvent::Resize).unwrap();
        let ticker = FixedTicker::new(Duration::from_millis(10));
        let runner = Runner::new(es, ticker);

        match runner.step() {
            QuizEvent::Resize => {}
            _ => panic!("expected Resize event"),
        }
    }

    #[test]
    fn loads_posted_from_another_thread_arrive() {
        let es = TestEventSource::new();
        let tx = es.sender();
        let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(200)));

        std::thread::spawn(move || {
            let set = QuestionSet {
                questions: vec![],
                origin: Origin::Bundled,
            };
            tx.send(QuizEvent::QuestionsLoaded { generation: 4, set })
                .unwrap();
        })
        .join()
        .unwrap();

        match runner.step() {
            QuizEvent::QuestionsLoaded { generation, .. } => assert_eq!(generation, 4),
            other => panic!("expected QuestionsLoaded, got {other:?}"),
        }
    }

    #[test]
    fn spawn_load_posts_bundled_questions() {
        let es = TestEventSource::new();
        let source = Arc::new(QuestionSource::offline(FallbackBank::bundled().unwrap()));
        let request = LoadRequest {
            generation: 7,
            difficulty: Difficulty::Medium,
        };
        spawn_load(source, request, es.sender()).join().unwrap();

        let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(200)));
        match runner.step() {
            QuizEvent::QuestionsLoaded { generation, set } => {
                assert_eq!(generation, 7);
                assert_eq!(set.origin, Origin::Bundled);
                assert!(!set.questions.is_empty());
            }
            other => panic!("expected QuestionsLoaded, got {other:?}"),
        }
    }
}
