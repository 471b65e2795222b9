//! Environment configuration.

use std::str::FromStr;

use anyhow::Context;
use curriculum_core::AssessmentSettings;

const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// `tracing_subscriber` filter directive.
    pub log_filter: String,
    pub assessment: AssessmentSettings,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            assessment: AssessmentSettings::default(),
        }
    }
}

impl ServiceConfig {
    /// Load `.env` if present, then read the process environment.
    ///
    /// Recognized variables:
    /// - RUST_LOG: log filter (default "info")
    /// - CURRICULUM_ADVANCE_DELAY_MS: auto-advance delay
    /// - CURRICULUM_FEEDBACK_DELAY_MS: wrong-pair feedback delay
    /// - CURRICULUM_REFERENCE_LENGTH: placement list length the bands assume
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(filter) = lookup("RUST_LOG") {
            config.log_filter = filter;
        }
        if let Some(ms) = parse_var(&lookup, "CURRICULUM_ADVANCE_DELAY_MS")? {
            config.assessment.advance_delay_ms = ms;
        }
        if let Some(ms) = parse_var(&lookup, "CURRICULUM_FEEDBACK_DELAY_MS")? {
            config.assessment.feedback_delay_ms = ms;
        }
        if let Some(len) = parse_var(&lookup, "CURRICULUM_REFERENCE_LENGTH")? {
            config.assessment.reference_length = len;
        }
        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{key} must be a non-negative integer, got {raw:?}"))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.assessment.advance_delay_ms, 1200);
        assert_eq!(config.assessment.feedback_delay_ms, 1000);
        assert_eq!(config.assessment.reference_length, 20);
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("RUST_LOG", "curriculum_service=debug"),
            ("CURRICULUM_ADVANCE_DELAY_MS", "300"),
            ("CURRICULUM_FEEDBACK_DELAY_MS", " 250 "),
            ("CURRICULUM_REFERENCE_LENGTH", "15"),
        ]))
        .unwrap();
        assert_eq!(config.log_filter, "curriculum_service=debug");
        assert_eq!(config.assessment.advance_delay_ms, 300);
        assert_eq!(config.assessment.feedback_delay_ms, 250);
        assert_eq!(config.assessment.reference_length, 15);
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let err = ServiceConfig::from_lookup(lookup(&[("CURRICULUM_ADVANCE_DELAY_MS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("CURRICULUM_ADVANCE_DELAY_MS"));
    }
}
