use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::question::Difficulty;
use crate::source::{DEFAULT_AMOUNT, DEFAULT_API_URL};

pub const DEFAULT_SECONDS_PER_QUESTION: u32 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub questions_per_quiz: usize,
    pub seconds_per_question: u32,
    pub api_url: String,
    pub request_timeout_secs: u64,
    pub offline: bool,
    pub difficulty: Option<Difficulty>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            questions_per_quiz: DEFAULT_AMOUNT,
            seconds_per_question: DEFAULT_SECONDS_PER_QUESTION,
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            offline: false,
            difficulty: None,
        }
    }
}

/// Effective settings for one run: stored config with command line overrides applied
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeSettings {
    pub questions_per_quiz: usize,
    pub seconds_per_question: u32,
    pub api_url: String,
    pub request_timeout_secs: u64,
    pub offline: bool,
    pub difficulty: Option<Difficulty>,
}

impl From<&Config> for RuntimeSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            questions_per_quiz: cfg.questions_per_quiz.max(1),
            seconds_per_question: cfg.seconds_per_question,
            api_url: cfg.api_url.clone(),
            request_timeout_secs: cfg.request_timeout_secs,
            offline: cfg.offline,
            difficulty: cfg.difficulty,
        }
    }
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "quizmaster") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("quizmaster_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the config, writing out the defaults first if no file exists yet
    pub fn load_or_init(&self) -> Config {
        if self.path.exists() {
            return self.load();
        }
        let cfg = Config::default();
        match self.save(&cfg) {
            Ok(()) => log::info!("wrote default config to {}", self.path.display()),
            Err(e) => log::warn!("could not write config {}: {e}", self.path.display()),
        }
        cfg
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => log::warn!("ignoring unreadable config {}: {e}", self.path.display()),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
