//! Configuration for clarity-grader
//!
//! Provides environment → TOML → default resolution for the bind address,
//! root folder, analysis tier budgets and the model server.

use std::path::PathBuf;
use std::time::Duration;

use clarity_common::config::{
    config_file_path, env_flag, env_string, env_u64, load_toml_or_default, LoggingConfig,
    RootFolderResolver,
};
use clarity_common::time::millis_to_duration;
use serde::Deserialize;
use tracing::warn;

use crate::models::{Tier, TierFlags};

/// Module name used for the config directory
pub const MODULE_NAME: &str = "clarity-grader";

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5730";
pub const DEFAULT_OLLAMA_SERVER: &str = "http://127.0.0.1:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "deepseek-r1:latest";

const DEFAULT_LITE_MAX_CHARS: usize = 4000;
const DEFAULT_ULTRALITE_EXCERPT_CHARS: usize = 200;
const DEFAULT_ULTRALITE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_ULTRALITE_EXTENDED_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_SUPERLITE_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_SUPERLITE_EXTENDED_TIMEOUT_MS: u64 = 90_000;
const DEFAULT_LITE_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_LITE_EXTENDED_TIMEOUT_MS: u64 = 180_000;
const DEFAULT_FULL_TIMEOUT_MS: u64 = 300_000;
const DEFAULT_JOB_PAUSE_MS: u64 = 1_000;
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 30_000;

/// Floor for the synchronous `/analyze` caller-side timeout
const MIN_REQUEST_BUDGET: Duration = Duration::from_secs(30);
/// Headroom added on top of the tier's own timeouts
const REQUEST_BUDGET_SLACK: Duration = Duration::from_secs(5);

/// TOML file contents
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraderConfig {
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub bind_address: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub model: ModelConfig,
}

/// `[analysis]` table; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisConfig {
    pub lite_max_chars: Option<usize>,
    pub full_max_chars: Option<usize>,
    pub ultralite_excerpt_chars: Option<usize>,
    pub ultralite_timeout_ms: Option<u64>,
    pub ultralite_extended_timeout_ms: Option<u64>,
    pub superlite_timeout_ms: Option<u64>,
    pub superlite_extended_timeout_ms: Option<u64>,
    pub lite_timeout_ms: Option<u64>,
    pub lite_extended_timeout_ms: Option<u64>,
    pub full_timeout_ms: Option<u64>,
    #[serde(default)]
    pub ultralite: bool,
    #[serde(default)]
    pub superlite: bool,
    #[serde(default)]
    pub lite: bool,
    pub job_pause_ms: Option<u64>,
    pub fetch_timeout_ms: Option<u64>,
}

/// `[model]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelConfig {
    pub server_url: Option<String>,
    pub model: Option<String>,
}

impl GraderConfig {
    /// Load the TOML file, degrading to defaults when absent or invalid
    pub fn load() -> Self {
        let path = config_file_path(MODULE_NAME);
        load_toml_or_default(path.as_deref())
    }

    /// `CLARITY_BIND_ADDRESS` → TOML → `127.0.0.1:5730`
    pub fn bind_address(&self) -> String {
        env_string("CLARITY_BIND_ADDRESS")
            .or_else(|| self.bind_address.clone())
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string())
    }

    pub fn root_folder(&self) -> PathBuf {
        RootFolderResolver::new(self.root_folder.clone()).resolve()
    }

    pub fn analysis_settings(&self) -> AnalysisSettings {
        AnalysisSettings::resolve(&self.analysis)
    }

    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings::resolve(&self.model)
    }
}

/// First and extended attempt timeouts for a reduced tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierTimeouts {
    pub first_attempt: Duration,
    pub extended: Duration,
}

impl TierTimeouts {
    fn from_millis(first_ms: u64, extended_ms: u64) -> Self {
        Self {
            first_attempt: millis_to_duration(first_ms),
            extended: millis_to_duration(extended_ms),
        }
    }

    /// Raise `extended` to `first_attempt` when configured below it
    fn ordered(self, tier: Tier) -> Self {
        if self.extended >= self.first_attempt {
            return self;
        }
        warn!(
            tier = %tier,
            first_attempt_ms = self.first_attempt.as_millis() as u64,
            extended_ms = self.extended.as_millis() as u64,
            "Extended timeout is shorter than the first attempt; using the first attempt timeout"
        );
        Self {
            extended: self.first_attempt,
            ..self
        }
    }
}

/// Resolved analysis budgets
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    /// Character budget for lite and super-lite text
    pub lite_max_chars: usize,
    /// Character budget for full-tier text
    pub full_max_chars: usize,
    pub ultralite_excerpt_chars: usize,
    pub ultralite: TierTimeouts,
    pub superlite: TierTimeouts,
    pub lite: TierTimeouts,
    pub full_timeout: Duration,
    /// Tier-forcing flags from configuration, merged with request flags
    pub default_flags: TierFlags,
    /// Pause between consecutive jobs on the worker
    pub job_pause: Duration,
    pub fetch_timeout: Duration,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            lite_max_chars: DEFAULT_LITE_MAX_CHARS,
            full_max_chars: DEFAULT_LITE_MAX_CHARS,
            ultralite_excerpt_chars: DEFAULT_ULTRALITE_EXCERPT_CHARS,
            ultralite: TierTimeouts::from_millis(
                DEFAULT_ULTRALITE_TIMEOUT_MS,
                DEFAULT_ULTRALITE_EXTENDED_TIMEOUT_MS,
            ),
            superlite: TierTimeouts::from_millis(
                DEFAULT_SUPERLITE_TIMEOUT_MS,
                DEFAULT_SUPERLITE_EXTENDED_TIMEOUT_MS,
            ),
            lite: TierTimeouts::from_millis(
                DEFAULT_LITE_TIMEOUT_MS,
                DEFAULT_LITE_EXTENDED_TIMEOUT_MS,
            ),
            full_timeout: millis_to_duration(DEFAULT_FULL_TIMEOUT_MS),
            default_flags: TierFlags::default(),
            job_pause: millis_to_duration(DEFAULT_JOB_PAUSE_MS),
            fetch_timeout: millis_to_duration(DEFAULT_FETCH_TIMEOUT_MS),
        }
    }
}

impl AnalysisSettings {
    /// Apply environment overrides on top of the `[analysis]` table
    pub fn resolve(toml: &AnalysisConfig) -> Self {
        let shared_timeout = env_u64("AI_TIMEOUT_MS");
        let ms = |env: &str, fallback: Option<u64>, toml: Option<u64>, default: u64| {
            env_u64(env).or(fallback).or(toml).unwrap_or(default)
        };
        let chars = |env: &str, toml: Option<usize>| {
            env_u64(env)
                .and_then(|v| usize::try_from(v).ok())
                .or(toml)
        };

        let lite_max_chars =
            chars("LITE_MAX_CHARS", toml.lite_max_chars).unwrap_or(DEFAULT_LITE_MAX_CHARS);

        Self {
            lite_max_chars,
            full_max_chars: chars("FULL_MAX_CHARS", toml.full_max_chars).unwrap_or(lite_max_chars),
            ultralite_excerpt_chars: toml
                .ultralite_excerpt_chars
                .unwrap_or(DEFAULT_ULTRALITE_EXCERPT_CHARS),
            ultralite: TierTimeouts::from_millis(
                ms(
                    "AI_TIMEOUT_ULTRALITE_MS",
                    None,
                    toml.ultralite_timeout_ms,
                    DEFAULT_ULTRALITE_TIMEOUT_MS,
                ),
                ms(
                    "AI_TIMEOUT_ULTRALITE_EXTENDED_MS",
                    None,
                    toml.ultralite_extended_timeout_ms,
                    DEFAULT_ULTRALITE_EXTENDED_TIMEOUT_MS,
                ),
            )
            .ordered(Tier::UltraLite),
            superlite: TierTimeouts::from_millis(
                ms(
                    "AI_TIMEOUT_SUPERLITE_MS",
                    None,
                    toml.superlite_timeout_ms,
                    DEFAULT_SUPERLITE_TIMEOUT_MS,
                ),
                ms(
                    "AI_TIMEOUT_SUPERLITE_EXTENDED_MS",
                    None,
                    toml.superlite_extended_timeout_ms,
                    DEFAULT_SUPERLITE_EXTENDED_TIMEOUT_MS,
                ),
            )
            .ordered(Tier::SuperLite),
            lite: TierTimeouts::from_millis(
                ms(
                    "AI_TIMEOUT_LITE_MS",
                    shared_timeout,
                    toml.lite_timeout_ms,
                    DEFAULT_LITE_TIMEOUT_MS,
                ),
                ms(
                    "AI_TIMEOUT_LITE_EXTENDED_MS",
                    None,
                    toml.lite_extended_timeout_ms,
                    DEFAULT_LITE_EXTENDED_TIMEOUT_MS,
                ),
            )
            .ordered(Tier::Lite),
            full_timeout: millis_to_duration(ms(
                "AI_TIMEOUT_FULL_MS",
                shared_timeout,
                toml.full_timeout_ms,
                DEFAULT_FULL_TIMEOUT_MS,
            )),
            default_flags: TierFlags {
                ultralite: env_flag("ULTRALITE_ANALYSIS").unwrap_or(toml.ultralite),
                superlite: env_flag("SUPERLITE_ANALYSIS").unwrap_or(toml.superlite),
                lite: env_flag("LITE_ANALYSIS").unwrap_or(toml.lite),
            },
            job_pause: millis_to_duration(toml.job_pause_ms.unwrap_or(DEFAULT_JOB_PAUSE_MS)),
            fetch_timeout: millis_to_duration(
                toml.fetch_timeout_ms.unwrap_or(DEFAULT_FETCH_TIMEOUT_MS),
            ),
        }
    }

    /// First/extended timeouts for reduced tiers; `None` for full
    pub fn retry_timeouts(&self, tier: Tier) -> Option<TierTimeouts> {
        match tier {
            Tier::Full => None,
            Tier::Lite => Some(self.lite),
            Tier::SuperLite => Some(self.superlite),
            Tier::UltraLite => Some(self.ultralite),
        }
    }

    /// Caller-side timeout for a synchronous analysis: max(30s, tier budget + 5s)
    pub fn request_budget(&self, tier: Tier) -> Duration {
        let tier_budget = match self.retry_timeouts(tier) {
            Some(t) => t.first_attempt + t.extended,
            None => self.full_timeout,
        };
        (tier_budget + REQUEST_BUDGET_SLACK).max(MIN_REQUEST_BUDGET)
    }
}

/// Resolved model server settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSettings {
    pub server_url: String,
    pub model: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_OLLAMA_SERVER.to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
        }
    }
}

impl ModelSettings {
    /// `OLLAMA_SERVER` / `OLLAMA_MODEL` → `[model]` → defaults
    pub fn resolve(toml: &ModelConfig) -> Self {
        let defaults = Self::default();
        Self {
            server_url: env_string("OLLAMA_SERVER")
                .or_else(|| toml.server_url.clone())
                .unwrap_or(defaults.server_url),
            model: env_string("OLLAMA_MODEL")
                .or_else(|| toml.model.clone())
                .unwrap_or(defaults.model),
        }
    }
}
