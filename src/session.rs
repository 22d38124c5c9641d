use crate::question::{AnsweredQuestion, Question};
use crate::store::HighScoreStore;

/// What caused an advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceTrigger {
    /// Explicit "next"; requires a selection
    User,
    /// Countdown reached zero; always records an answer
    TimerExpired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingSelection(usize),
    Completed,
}

/// Snapshot of an in-progress quiz.
///
/// `answered.len() == current_index` while awaiting a selection, and `score`
/// always equals the number of correct entries in `answered`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub questions: Vec<Question>,
    pub current_index: usize,
    pub selected: Option<usize>,
    pub score: u32,
    pub answered: Vec<AnsweredQuestion>,
    pub completed: bool,
}

impl SessionState {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            current_index: 0,
            selected: None,
            score: 0,
            answered: Vec::new(),
            completed: false,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.completed {
            Phase::Completed
        } else {
            Phase::AwaitingSelection(self.current_index)
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.completed {
            None
        } else {
            self.questions.get(self.current_index)
        }
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn progress(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        (self.answered.len() as f64 / self.questions.len() as f64) * 100.0
    }

    pub fn can_advance(&self, trigger: AdvanceTrigger) -> bool {
        !self.completed
            && self.current_index < self.questions.len()
            && (trigger == AdvanceTrigger::TimerExpired || self.selected.is_some())
    }

    pub fn can_retreat(&self) -> bool {
        !self.completed && self.current_index > 0
    }

    /// The state after moving past the current question, or `None` when the
    /// move is not allowed.
    pub fn advanced(&self, trigger: AdvanceTrigger) -> Option<SessionState> {
        if !self.can_advance(trigger) {
            return None;
        }

        let question = self.questions[self.current_index].clone();
        let entry = AnsweredQuestion {
            selected: self.selected,
            question,
        };

        let mut next = self.clone();
        if entry.is_correct() {
            next.score += 1;
        }
        next.answered.push(entry);
        next.selected = None;

        if self.current_index + 1 < self.questions.len() {
            next.current_index += 1;
        } else {
            next.current_index = self.questions.len();
            next.completed = true;
        }
        Some(next)
    }

    /// The state after stepping back one question, or `None` when the move is
    /// not allowed. The undone answer becomes the current selection again.
    pub fn retreated(&self) -> Option<SessionState> {
        if !self.can_retreat() {
            return None;
        }

        let mut prev = self.clone();
        let undone = prev.answered.pop()?;
        if undone.is_correct() {
            prev.score -= 1;
        }
        prev.current_index -= 1;
        prev.selected = undone.selected;
        Some(prev)
    }
}

/// Result of an [`QuizSession::advance`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Nothing changed
    Ignored,
    /// Moved on to the question at this index
    Next(usize),
    /// Last question answered
    Completed { score: u32, high_score: u32 },
}

/// Navigation over a resolved question list
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSession {
    state: SessionState,
}

impl QuizSession {
    /// Returns `None` for an empty question list.
    pub fn new(questions: Vec<Question>) -> Option<Self> {
        if questions.is_empty() {
            return None;
        }
        Some(Self {
            state: SessionState::new(questions),
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state.completed
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    pub fn answered(&self) -> &[AnsweredQuestion] {
        &self.state.answered
    }

    /// Records a choice for the current question; returns true if it changed.
    pub fn select_option(&mut self, index: usize) -> bool {
        let valid = self
            .state
            .current_question()
            .is_some_and(|q| index < q.options.len());
        if !valid || self.state.selected == Some(index) {
            return false;
        }
        self.state.selected = Some(index);
        true
    }

    pub fn advance<H: HighScoreStore + ?Sized>(
        &mut self,
        trigger: AdvanceTrigger,
        high_scores: &mut H,
    ) -> AdvanceOutcome {
        let Some(next) = self.state.advanced(trigger) else {
            return AdvanceOutcome::Ignored;
        };
        self.state = next;

        if !self.state.completed {
            return AdvanceOutcome::Next(self.state.current_index);
        }

        let score = self.state.score;
        let high_score = high_scores.get().max(score);
        if let Err(e) = high_scores.set(high_score) {
            log::warn!("could not persist high score {high_score}: {e}");
        }
        log::info!(
            "quiz completed with {score}/{} (high score {high_score})",
            self.state.total()
        );
        AdvanceOutcome::Completed { score, high_score }
    }

    /// Steps back one question; returns true if it moved.
    pub fn retreat(&mut self) -> bool {
        match self.state.retreated() {
            Some(prev) => {
                self.state = prev;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryScores;
    use assert_matches::assert_matches;

    fn questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question {
                id: i as u32,
                text: format!("Q{}", i + 1),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_index: i % 4,
            })
            .collect()
    }

    fn assert_score_matches_log(session: &QuizSession) {
        let correct = session.answered().iter().filter(|a| a.is_correct()).count() as u32;
        assert_eq!(session.score(), correct);
    }

    #[test]
    fn test_empty_question_list_has_no_session() {
        assert!(QuizSession::new(vec![]).is_none());
    }

    #[test]
    fn test_initial_state() {
        let session = QuizSession::new(questions(3)).unwrap();
        assert_eq!(session.state().phase(), Phase::AwaitingSelection(0));
        assert_eq!(session.state().selected, None);
        assert_eq!(session.state().progress(), 0.0);
        assert!(!session.state().can_retreat());
    }

    #[test]
    fn test_select_overwrites_without_advancing() {
        let mut session = QuizSession::new(questions(3)).unwrap();
        assert!(session.select_option(1));
        assert!(session.select_option(2));
        assert_eq!(session.state().selected, Some(2));
        assert_eq!(session.state().current_index, 0);
        assert!(session.answered().is_empty());
    }

    #[test]
    fn test_select_same_option_twice_is_idempotent() {
        let mut session = QuizSession::new(questions(3)).unwrap();
        assert!(session.select_option(3));
        let before = session.clone();
        assert!(!session.select_option(3));
        assert_eq!(session, before);
    }

    #[test]
    fn test_select_out_of_range_is_ignored() {
        let mut session = QuizSession::new(questions(2)).unwrap();
        assert!(!session.select_option(4));
        assert_eq!(session.state().selected, None);
    }

    #[test]
    fn test_user_advance_without_selection_is_noop() {
        let mut session = QuizSession::new(questions(3)).unwrap();
        let mut scores = MemoryScores::new();
        let before = session.clone();
        assert_eq!(
            session.advance(AdvanceTrigger::User, &mut scores),
            AdvanceOutcome::Ignored
        );
        assert_eq!(session, before);
    }

    #[test]
    fn test_timer_advance_without_selection_records_incorrect() {
        let mut session = QuizSession::new(questions(3)).unwrap();
        let mut scores = MemoryScores::new();
        assert_eq!(
            session.advance(AdvanceTrigger::TimerExpired, &mut scores),
            AdvanceOutcome::Next(1)
        );
        assert_eq!(session.answered().len(), 1);
        assert_eq!(session.answered()[0].selected, None);
        assert!(!session.answered()[0].is_correct());
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn test_timer_advance_keeps_pending_selection() {
        let mut session = QuizSession::new(questions(2)).unwrap();
        let mut scores = MemoryScores::new();
        session.select_option(0);
        session.advance(AdvanceTrigger::TimerExpired, &mut scores);
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn test_progress_follows_answer_count() {
        let mut session = QuizSession::new(questions(4)).unwrap();
        let mut scores = MemoryScores::new();
        session.select_option(0);
        session.advance(AdvanceTrigger::User, &mut scores);
        assert_eq!(session.state().progress(), 25.0);
        session.retreat();
        assert_eq!(session.state().progress(), 0.0);
    }

    #[test]
    fn test_three_question_scenario() {
        let mut session = QuizSession::new(questions(3)).unwrap();
        let mut scores = MemoryScores::new();

        session.select_option(0); // correct
        session.advance(AdvanceTrigger::User, &mut scores);
        session.select_option(0); // wrong, answer is 1
        session.advance(AdvanceTrigger::User, &mut scores);
        session.select_option(2); // correct
        let outcome = session.advance(AdvanceTrigger::User, &mut scores);

        assert_eq!(
            outcome,
            AdvanceOutcome::Completed {
                score: 2,
                high_score: 2
            }
        );
        assert!(session.is_completed());
        assert_eq!(session.state().phase(), Phase::Completed);
        assert_eq!(session.state().progress(), 100.0);
        assert_score_matches_log(&session);
    }

    #[test]
    fn test_high_score_only_grows() {
        let mut scores = MemoryScores::with_high_score(3);

        let mut first = QuizSession::new(questions(5)).unwrap();
        for i in 0..5 {
            first.select_option(i % 4);
            first.advance(AdvanceTrigger::User, &mut scores);
        }
        assert_eq!(first.score(), 5);
        assert_eq!(scores.get(), 5);

        let mut second = QuizSession::new(questions(5)).unwrap();
        for i in 0..5 {
            let pick = if i < 2 { i % 4 } else { (i + 1) % 4 };
            second.select_option(pick);
            second.advance(AdvanceTrigger::User, &mut scores);
        }
        assert_eq!(second.score(), 2);
        assert_eq!(scores.get(), 5);
    }

    #[test]
    fn test_retreat_restores_previous_answer() {
        let mut session = QuizSession::new(questions(5)).unwrap();
        let mut scores = MemoryScores::new();
        session.select_option(3);
        session.advance(AdvanceTrigger::User, &mut scores);
        assert_eq!(session.state().current_index, 1);

        assert!(session.retreat());
        assert_eq!(session.state().current_index, 0);
        assert_eq!(session.state().selected, Some(3));
        assert!(session.answered().is_empty());
    }

    #[test]
    fn test_repeated_retreat_restores_each_answer() {
        let mut session = QuizSession::new(questions(4)).unwrap();
        let mut scores = MemoryScores::new();
        for pick in [0, 2, 1] {
            session.select_option(pick);
            session.advance(AdvanceTrigger::User, &mut scores);
        }
        session.select_option(3);

        assert!(session.retreat());
        assert_eq!(session.state().selected, Some(1));
        assert!(session.retreat());
        assert_eq!(session.state().selected, Some(2));
        assert!(session.retreat());
        assert_eq!(session.state().selected, Some(0));
        assert!(!session.retreat());
        assert_eq!(session.state().current_index, 0);
    }

    #[test]
    fn test_retreat_takes_back_the_point() {
        let mut session = QuizSession::new(questions(3)).unwrap();
        let mut scores = MemoryScores::new();
        session.select_option(0);
        session.advance(AdvanceTrigger::User, &mut scores);
        assert_eq!(session.score(), 1);
        session.retreat();
        assert_eq!(session.score(), 0);
        assert_score_matches_log(&session);
    }

    #[test]
    fn test_retreat_after_timeout_restores_no_selection() {
        let mut session = QuizSession::new(questions(3)).unwrap();
        let mut scores = MemoryScores::new();
        session.advance(AdvanceTrigger::TimerExpired, &mut scores);
        session.retreat();
        assert_eq!(session.state().selected, None);
    }

    #[test]
    fn test_no_navigation_after_completion() {
        let mut session = QuizSession::new(questions(1)).unwrap();
        let mut scores = MemoryScores::new();
        session.select_option(0);
        assert_matches!(
            session.advance(AdvanceTrigger::User, &mut scores),
            AdvanceOutcome::Completed { .. }
        );
        assert!(!session.retreat());
        assert!(!session.select_option(1));
        assert_eq!(
            session.advance(AdvanceTrigger::TimerExpired, &mut scores),
            AdvanceOutcome::Ignored
        );
        assert_eq!(session.answered().len(), 1);
    }

    #[test]
    fn test_answer_log_tracks_index() {
        let mut session = QuizSession::new(questions(6)).unwrap();
        let mut scores = MemoryScores::new();
        let steps = [Some(1), None, Some(2), Some(3)];
        for step in steps {
            match step {
                Some(pick) => {
                    session.select_option(pick);
                    session.advance(AdvanceTrigger::User, &mut scores);
                }
                None => {
                    session.retreat();
                }
            }
            assert_eq!(session.answered().len(), session.state().current_index);
            assert_score_matches_log(&session);
        }
    }

    #[test]
    fn test_advanced_is_pure() {
        let mut state = SessionState::new(questions(2));
        state.selected = Some(0);
        let next = state.advanced(AdvanceTrigger::User).unwrap();
        assert_eq!(state.answered.len(), 0);
        assert_eq!(next.answered.len(), 1);
        assert_eq!(next.score, 1);
        assert_eq!(next.selected, None);
    }
}
