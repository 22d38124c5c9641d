use std::collections::HashMap;
use std::time::Duration;

use include_dir::{include_dir, Dir};
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use crate::error::QuizError;
use crate::question::{Difficulty, Question};

static DATA_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/data");

const BUNDLE_FILE: &str = "questions.json";

pub const DEFAULT_API_URL: &str = "https://opentdb.com/api.php";
pub const DEFAULT_AMOUNT: usize = 8;

/// Payload returned by the Open Trivia DB `api.php` endpoint
#[derive(Deserialize, Debug)]
pub struct TriviaResponse {
    #[serde(default)]
    pub response_code: u8,
    pub results: Vec<RawQuestion>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RawQuestion {
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

/// Remote supplier of raw trivia questions
pub trait QuestionProvider: Send + Sync {
    fn fetch(&self, difficulty: Difficulty, amount: usize) -> Result<Vec<RawQuestion>, QuizError>;
}

#[derive(Debug, Clone)]
pub struct OpenTriviaProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl OpenTriviaProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, QuizError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

impl QuestionProvider for OpenTriviaProvider {
    fn fetch(&self, difficulty: Difficulty, amount: usize) -> Result<Vec<RawQuestion>, QuizError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("amount", amount.to_string()),
                ("difficulty", difficulty.to_string()),
                ("type", "multiple".to_string()),
            ])
            .send()?;

        if !response.status().is_success() {
            return Err(QuizError::HttpStatus(response.status()));
        }

        let body: TriviaResponse = response.json()?;
        if body.response_code != 0 {
            return Err(QuizError::ProviderCode(body.response_code));
        }
        if body.results.is_empty() {
            return Err(QuizError::EmptyResults);
        }
        Ok(body.results)
    }
}

#[derive(Deserialize, Debug)]
struct BundledQuestion {
    id: u32,
    question: String,
    options: Vec<String>,
    answer: usize,
}

/// Static question lists shipped inside the binary
#[derive(Debug, Clone)]
pub struct FallbackBank {
    by_difficulty: HashMap<Difficulty, Vec<Question>>,
}

impl FallbackBank {
    pub fn bundled() -> Result<Self, QuizError> {
        let file = DATA_DIR
            .get_file(BUNDLE_FILE)
            .ok_or_else(|| QuizError::MissingBundle(BUNDLE_FILE.to_string()))?;
        let text = file
            .contents_utf8()
            .ok_or_else(|| QuizError::Malformed(format!("{BUNDLE_FILE} is not utf-8")))?;
        Self::from_json(text)
    }

    pub fn from_json(text: &str) -> Result<Self, QuizError> {
        let raw: HashMap<Difficulty, Vec<BundledQuestion>> = serde_json::from_str(text)?;
        let mut by_difficulty = HashMap::new();

        for difficulty in Difficulty::ALL {
            let entries = raw
                .get(&difficulty)
                .ok_or_else(|| QuizError::MissingBundle(difficulty.to_string()))?;
            if let Some(id) = entries.iter().map(|e| e.id).duplicates().next() {
                return Err(QuizError::Malformed(format!(
                    "{difficulty} question id {id} appears twice"
                )));
            }
            let mut questions = Vec::with_capacity(entries.len());
            for entry in entries {
                if entry.answer >= entry.options.len() {
                    return Err(QuizError::Malformed(format!(
                        "{difficulty} question {} points at option {} of {}",
                        entry.id,
                        entry.answer,
                        entry.options.len()
                    )));
                }
                questions.push(Question {
                    id: entry.id,
                    text: entry.question.clone(),
                    options: entry.options.clone(),
                    correct_index: entry.answer,
                });
            }
            by_difficulty.insert(difficulty, questions);
        }

        Ok(Self { by_difficulty })
    }

    pub fn questions(&self, difficulty: Difficulty) -> &[Question] {
        self.by_difficulty
            .get(&difficulty)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Origin {
    #[strum(serialize = "online")]
    Remote,
    #[strum(serialize = "offline set")]
    Bundled,
}

/// A fully resolved question list
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionSet {
    pub questions: Vec<Question>,
    pub origin: Origin,
}

/// Resolves a difficulty to questions, preferring the remote provider
pub struct QuestionSource {
    provider: Option<Box<dyn QuestionProvider>>,
    bank: FallbackBank,
    amount: usize,
}

impl QuestionSource {
    pub fn new(
        provider: Option<Box<dyn QuestionProvider>>,
        bank: FallbackBank,
        amount: usize,
    ) -> Self {
        Self {
            provider,
            bank,
            amount,
        }
    }

    /// Bundled questions only, no network
    pub fn offline(bank: FallbackBank) -> Self {
        Self::new(None, bank, DEFAULT_AMOUNT)
    }

    pub fn load(&self, difficulty: Difficulty) -> QuestionSet {
        self.load_with_rng(difficulty, &mut rand::thread_rng())
    }

    pub fn load_with_rng<R: Rng + ?Sized>(
        &self,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> QuestionSet {
        if let Some(provider) = &self.provider {
            match provider.fetch(difficulty, self.amount) {
                Ok(raw) if !raw.is_empty() => {
                    log::info!("loaded {} {difficulty} questions from provider", raw.len());
                    return QuestionSet {
                        questions: from_remote(raw, rng),
                        origin: Origin::Remote,
                    };
                }
                Ok(_) => {
                    log::warn!("provider returned no {difficulty} questions, using bundled set")
                }
                Err(e) => {
                    log::warn!("provider unavailable ({e}), using bundled {difficulty} set")
                }
            }
        }

        QuestionSet {
            questions: self.bank.questions(difficulty).to_vec(),
            origin: Origin::Bundled,
        }
    }
}

/// Mixes the correct answer into the incorrect ones and records where it landed.
pub fn from_remote<R: Rng + ?Sized>(raw: Vec<RawQuestion>, rng: &mut R) -> Vec<Question> {
    raw.into_iter()
        .enumerate()
        .map(|(id, q)| {
            let mut options = q.incorrect_answers;
            options.push(q.correct_answer.clone());
            options.shuffle(rng);
            let correct_index = options
                .iter()
                .position(|o| *o == q.correct_answer)
                .unwrap_or(options.len() - 1);
            Question {
                id: id as u32,
                text: q.question,
                options,
                correct_index,
            }
        })
        .collect()
}
