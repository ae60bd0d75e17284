//! Process configuration
//!
//! Secrets and tunables come from the environment (optionally seeded from a
//! `.env` file). Missing secrets fail fast so no client is ever built with an
//! empty credential.

use crate::assistant::VoiceProfile;
use crate::poller::PollPolicy;
use crate::session::LifecyclePolicy;
use secrecy::SecretString;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_PORT: u16 = 8503;
const DEFAULT_THREAD_FILE: &str = "lil_m_thread.txt";
const DEFAULT_AUDIO_DIR: &str = "audio";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug)]
pub struct Config {
    pub api_key: SecretString,
    pub assistant_id: String,
    pub base_url: String,
    pub port: u16,
    pub thread_file: PathBuf,
    pub audio_dir: PathBuf,
    pub voice: VoiceProfile,
    pub poll: PollPolicy,
    pub lifecycle: LifecyclePolicy,
}

impl Config {
    /// Load from `.env` (if present) and the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parse configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("OPENAI_API_KEY").ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;
        let assistant_id = get("ASSISTANT_ID").ok_or(ConfigError::Missing("ASSISTANT_ID"))?;

        let defaults = VoiceProfile::default();
        let voice = VoiceProfile {
            model: get("LIL_M_TTS_MODEL").unwrap_or(defaults.model),
            voice: get("LIL_M_VOICE").unwrap_or(defaults.voice),
        };

        let poll_defaults = PollPolicy::default();
        let poll = PollPolicy {
            interval: get_parsed::<u64>(&get, "LIL_M_POLL_INTERVAL_MS")?
                .map_or(poll_defaults.interval, Duration::from_millis),
            max_attempts: get_parsed(&get, "LIL_M_POLL_MAX_ATTEMPTS")?
                .unwrap_or(poll_defaults.max_attempts),
            deadline: get_parsed::<u64>(&get, "LIL_M_POLL_DEADLINE_SECS")?
                .map_or(poll_defaults.deadline, Duration::from_secs),
        };
        if poll.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "LIL_M_POLL_MAX_ATTEMPTS",
                reason: "must be at least 1".to_string(),
            });
        }

        let lifecycle_defaults = LifecyclePolicy::default();
        let lifecycle = LifecyclePolicy {
            rest_at: get_parsed(&get, "LIL_M_REST_AT")?.unwrap_or(lifecycle_defaults.rest_at),
            turn_limit: get_parsed(&get, "LIL_M_TURN_LIMIT")?
                .unwrap_or(lifecycle_defaults.turn_limit),
        };
        if lifecycle.turn_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "LIL_M_TURN_LIMIT",
                reason: "must be at least 1".to_string(),
            });
        }
        if lifecycle.rest_at == 0 || lifecycle.rest_at >= lifecycle.turn_limit {
            return Err(ConfigError::Invalid {
                key: "LIL_M_REST_AT",
                reason: format!(
                    "must be between 1 and {} (below the turn limit)",
                    lifecycle.turn_limit - 1
                ),
            });
        }

        Ok(Self {
            api_key: SecretString::from(api_key),
            assistant_id,
            base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            port: get_parsed(&get, "LIL_M_PORT")?.unwrap_or(DEFAULT_PORT),
            thread_file: get("LIL_M_THREAD_FILE")
                .map_or_else(|| PathBuf::from(DEFAULT_THREAD_FILE), PathBuf::from),
            audio_dir: get("LIL_M_AUDIO_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_AUDIO_DIR), PathBuf::from),
            voice,
            poll,
            lifecycle,
        })
    }
}

fn get_parsed<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                key,
                reason: format!("'{raw}': {e}"),
            })
        })
        .transpose()
}
