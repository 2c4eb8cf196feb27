use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::lexicon::normalize;

/// Application configuration loaded from environment variables.
/// Every variable is optional; a value that is present but malformed stops startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// `count` used by generate when the request leaves it out.
    pub default_word_count: usize,
    /// `seed` used by generate when the request leaves it out.
    pub default_seed: String,
    /// Longest seed, in letters, generate accepts.
    pub max_seed_length: usize,
    pub max_word_count: usize,
    pub min_word_length: usize,
    /// Also the margin expansion adds around the requested bounds.
    pub max_word_length: usize,
    /// Widest/tallest rectangle, in cells, a single expand may ask for.
    pub max_expand_span: u32,
    pub session_max_idle_secs: u64,
    pub session_sweep_interval_secs: u64,
    /// One word per line; the built-in list is used when unset.
    pub lexicon_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 3000,
            rust_log: "info".to_string(),
            default_word_count: 30,
            default_seed: "кроссворд".to_string(),
            max_seed_length: 64,
            max_word_count: 500,
            min_word_length: 2,
            max_word_length: 10,
            max_expand_span: 2000,
            session_max_idle_secs: 60 * 60,
            session_sweep_interval_secs: 5 * 60,
            lexicon_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        let config = Config {
            port: env_or("PORT", defaults.port)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            default_word_count: env_or("DEFAULT_WORD_COUNT", defaults.default_word_count)?,
            default_seed: std::env::var("DEFAULT_SEED").unwrap_or(defaults.default_seed),
            max_seed_length: env_or("MAX_SEED_LENGTH", defaults.max_seed_length)?,
            max_word_count: env_or("MAX_WORD_COUNT", defaults.max_word_count)?,
            min_word_length: env_or("MIN_WORD_LENGTH", defaults.min_word_length)?,
            max_word_length: env_or("MAX_WORD_LENGTH", defaults.max_word_length)?,
            max_expand_span: env_or("MAX_EXPAND_SPAN", defaults.max_expand_span)?,
            session_max_idle_secs: env_or("SESSION_MAX_IDLE_SECS", defaults.session_max_idle_secs)?,
            session_sweep_interval_secs: env_or(
                "SESSION_SWEEP_INTERVAL_SECS",
                defaults.session_sweep_interval_secs,
            )?,
            lexicon_path: std::env::var_os("LEXICON_PATH").map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.min_word_length == 0 || self.min_word_length > self.max_word_length {
            bail!(
                "MIN_WORD_LENGTH ({}) must be at least 1 and not exceed MAX_WORD_LENGTH ({})",
                self.min_word_length,
                self.max_word_length
            );
        }
        if self.default_word_count == 0 || self.default_word_count > self.max_word_count {
            bail!(
                "DEFAULT_WORD_COUNT ({}) must be between 1 and MAX_WORD_COUNT ({})",
                self.default_word_count,
                self.max_word_count
            );
        }
        match normalize(&self.default_seed) {
            None => bail!(
                "DEFAULT_SEED ({:?}) must be a single alphabetic word",
                self.default_seed
            ),
            Some(seed) if seed.chars().count() > self.max_seed_length => bail!(
                "DEFAULT_SEED ({seed}) is longer than MAX_SEED_LENGTH ({})",
                self.max_seed_length
            ),
            Some(_) => {}
        }
        if self.session_sweep_interval_secs == 0 {
            bail!("SESSION_SWEEP_INTERVAL_SECS must be positive");
        }
        Ok(())
    }

    pub fn word_lengths(&self) -> std::ops::RangeInclusive<usize> {
        self.min_word_length..=self.max_word_length
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}
