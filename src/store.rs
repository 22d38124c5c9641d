use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::error::QuizError;
use crate::question::Difficulty;

const HIGH_SCORE_KEY: &str = "high_score";

/// Persistence port for the best final score ever achieved
pub trait HighScoreStore {
    /// Stored high score; anything missing or unreadable reads as zero.
    fn get(&self) -> u32;
    fn set(&mut self, value: u32) -> Result<(), QuizError>;
}

/// Volatile store for tests and for runs where the state db can't be opened
#[derive(Debug, Default, Clone)]
pub struct MemoryScores {
    high_score: u32,
    history: Vec<SessionRecord>,
}

impl MemoryScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_high_score(high_score: u32) -> Self {
        Self {
            high_score,
            history: vec![],
        }
    }
}

impl HighScoreStore for MemoryScores {
    fn get(&self) -> u32 {
        self.high_score
    }

    fn set(&mut self, value: u32) -> Result<(), QuizError> {
        self.high_score = value;
        Ok(())
    }
}

/// One finished quiz
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    pub finished_at: DateTime<Local>,
    pub difficulty: Difficulty,
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
}

/// Append-only log of finished quizzes
pub trait HistoryStore {
    fn record_session(&mut self, record: &SessionRecord) -> Result<(), QuizError>;
    /// Most recent sessions, oldest first
    fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>, QuizError>;
}

impl HistoryStore for MemoryScores {
    fn record_session(&mut self, record: &SessionRecord) -> Result<(), QuizError> {
        self.history.push(record.clone());
        Ok(())
    }

    fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>, QuizError> {
        let skip = self.history.len().saturating_sub(limit);
        Ok(self.history[skip..].to_vec())
    }
}

/// Everything the quiz needs to keep between runs
pub trait ScoreStore: HighScoreStore + HistoryStore {}

impl<T: HighScoreStore + HistoryStore> ScoreStore for T {}

/// SQLite-backed high score and session history
#[derive(Debug)]
pub struct ScoreDb {
    conn: Connection,
}

impl ScoreDb {
    /// Open (creating if needed) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, QuizError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, QuizError> {
        Self::init(Connection::open_in_memory()?)
    }

    pub fn default_path(data_dir: Option<&Path>) -> PathBuf {
        match data_dir {
            Some(dir) => dir.join("scores.db"),
            None => crate::app_dirs::AppDirs::db_path()
                .unwrap_or_else(|| PathBuf::from("quizmaster_scores.db")),
        }
    }

    fn init(conn: Connection) -> Result<Self, QuizError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS session_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                finished_at TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                score INTEGER NOT NULL,
                total INTEGER NOT NULL,
                percentage INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        Ok(Self { conn })
    }

    fn read_high_score(&self) -> Result<Option<u32>, QuizError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                [HIGH_SCORE_KEY],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(value.and_then(|v| u32::try_from(v).ok()))
    }

    /// Every recorded session, oldest first
    pub fn all_sessions(&self) -> Result<Vec<SessionRecord>, QuizError> {
        self.query_sessions(
            "SELECT finished_at, difficulty, score, total, percentage
             FROM session_results ORDER BY id ASC",
            params![],
        )
    }

    fn query_sessions<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<SessionRecord>, QuizError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            let finished_at: String = row.get(0)?;
            let difficulty: String = row.get(1)?;
            Ok((
                finished_at,
                difficulty,
                row.get::<_, u32>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, u32>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (finished_at, difficulty, score, total, percentage) = row?;
            let finished_at = DateTime::parse_from_rfc3339(&finished_at)
                .map_err(|e| QuizError::Malformed(format!("bad timestamp {finished_at}: {e}")))?
                .with_timezone(&Local);
            let difficulty = Difficulty::parse(&difficulty)
                .ok_or_else(|| QuizError::Malformed(format!("bad difficulty {difficulty}")))?;
            records.push(SessionRecord {
                finished_at,
                difficulty,
                score,
                total,
                percentage,
            });
        }
        Ok(records)
    }

    /// Write every recorded session to `path` as CSV
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<usize, QuizError> {
        let records = self.all_sessions()?;
        let mut writer = csv::Writer::from_path(path)?;
        for record in &records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(records.len())
    }
}

impl HighScoreStore for ScoreDb {
    fn get(&self) -> u32 {
        match self.read_high_score() {
            Ok(value) => value.unwrap_or(0),
            Err(e) => {
                log::warn!("could not read high score: {e}");
                0
            }
        }
    }

    fn set(&mut self, value: u32) -> Result<(), QuizError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![HIGH_SCORE_KEY, value],
        )?;
        Ok(())
    }
}

impl HistoryStore for ScoreDb {
    fn record_session(&mut self, record: &SessionRecord) -> Result<(), QuizError> {
        self.conn.execute(
            r#"
            INSERT INTO session_results (finished_at, difficulty, score, total, percentage)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.finished_at.to_rfc3339(),
                record.difficulty.to_string(),
                record.score,
                record.total,
                record.percentage,
            ],
        )?;
        Ok(())
    }

    fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>, QuizError> {
        let mut records = self.query_sessions(
            "SELECT finished_at, difficulty, score, total, percentage
             FROM session_results ORDER BY id DESC LIMIT ?1",
            [limit as i64],
        )?;
        records.reverse();
        Ok(records)
    }
}
