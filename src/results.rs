use crate::question::AnsweredQuestion;

/// Qualitative band for a final percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Tier {
    Excellent,
    Good,
    Okay,
    NeedsImprovement,
}

impl Tier {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            p if p >= 80 => Tier::Excellent,
            p if p >= 60 => Tier::Good,
            p if p >= 40 => Tier::Okay,
            _ => Tier::NeedsImprovement,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Tier::Excellent => "Excellent!",
            Tier::Good => "Good job!",
            Tier::Okay => "Not bad!",
            Tier::NeedsImprovement => "Keep practicing!",
        }
    }
}

/// One row of the per-question breakdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionReview {
    pub number: usize,
    pub text: String,
    pub correct: bool,
    /// What the user picked; `None` when time ran out
    pub chosen: Option<String>,
    /// Filled in only for wrong answers
    pub correct_answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSummary {
    pub score: u32,
    pub total: usize,
    pub percentage: u32,
    pub tier: Tier,
    pub reviews: Vec<QuestionReview>,
}

impl ResultSummary {
    pub fn new(answered: &[AnsweredQuestion], score: u32) -> Self {
        let total = answered.len();
        let percentage = percentage(score, total);
        let reviews = answered
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let correct = a.is_correct();
                QuestionReview {
                    number: i + 1,
                    text: a.question.text.clone(),
                    correct,
                    chosen: a.selected_option().map(str::to_owned),
                    correct_answer: if correct {
                        None
                    } else {
                        a.question.correct_option().map(str::to_owned)
                    },
                }
            })
            .collect();

        Self {
            score,
            total,
            percentage,
            tier: Tier::from_percentage(percentage),
            reviews,
        }
    }

    pub fn correct_count(&self) -> usize {
        self.reviews.iter().filter(|r| r.correct).count()
    }
}

/// Rounded percentage; an empty quiz scores zero
pub fn percentage(score: u32, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((score as f64 / total as f64) * 100.0).round() as u32
}
