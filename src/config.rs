//! Environment-driven configuration.

use std::path::PathBuf;

use crate::sim::SimSettings;

/// Application configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the control surface binds to (`CYBERSIM_BIND`).
    pub bind_addr: String,
    /// Chat-completions URL of the LLM collaborator (`LM_STUDIO_URL`).
    pub lm_studio_url: String,
    /// Model identifier passed on every request (`LLM_MODEL`).
    pub llm_model: String,
    /// SQLite database path (`CYBERSIM_DB`); in-memory store when unset.
    pub db_path: Option<PathBuf>,
    /// Simulated minutes per step (`TIME_STEP_MINUTES`).
    pub time_step_minutes: i64,
    /// Generator cooldown in steps (`GENERATOR_COOLDOWN_STEPS`).
    pub generator_cooldown_steps: u32,
    /// Analyzer cooldown in steps (`ANALYZER_COOLDOWN_STEPS`).
    pub analyzer_cooldown_steps: u32,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, raw = %raw, "unparseable value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_or("CYBERSIM_BIND", "0.0.0.0:8000"),
            lm_studio_url: env_or(
                "LM_STUDIO_URL",
                "http://localhost:1234/v1/chat/completions",
            ),
            llm_model: env_or("LLM_MODEL", "instructlab/granite-7b-lab"),
            db_path: std::env::var("CYBERSIM_DB").ok().map(PathBuf::from),
            time_step_minutes: env_parse("TIME_STEP_MINUTES", 60),
            generator_cooldown_steps: env_parse("GENERATOR_COOLDOWN_STEPS", 3),
            analyzer_cooldown_steps: env_parse("ANALYZER_COOLDOWN_STEPS", 2),
        }
    }

    pub fn sim_settings(&self) -> SimSettings {
        SimSettings {
            time_step_minutes: self.time_step_minutes,
            generator_cooldown_steps: self.generator_cooldown_steps,
            analyzer_cooldown_steps: self.analyzer_cooldown_steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parse_falls_back_on_garbage() {
        std::env::set_var("CYBERSIM_TEST_PARSE", "not-a-number");
        let value: u32 = env_parse("CYBERSIM_TEST_PARSE", 7);
        assert_eq!(value, 7);
        std::env::remove_var("CYBERSIM_TEST_PARSE");
    }

    #[test]
    fn test_env_parse_reads_valid_value() {
        std::env::set_var("CYBERSIM_TEST_PARSE_OK", "42");
        let value: u32 = env_parse("CYBERSIM_TEST_PARSE_OK", 7);
        assert_eq!(value, 42);
        std::env::remove_var("CYBERSIM_TEST_PARSE_OK");
    }
}
