// crates/pulse-core/src/config.rs

//! Process configuration, read from the environment once at start-up.
//! A `.env` file in the working directory is honoured.

use crate::error::{PulseError, Result};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::path::PathBuf;

pub const ENV_DATA_DIR: &str = "PULSE_DATA_DIR";
pub const ENV_DATABASE_URL: &str = "PULSE_DATABASE_URL";
pub const ENV_LOG: &str = "RUST_LOG";

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_DATABASE_URL: &str = "pulse.db";
pub const DEFAULT_LOG_FILTER: &str = "info";

static SETTINGS: OnceCell<Settings> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Root of the upstream `data/` checkout.
    pub data_dir: PathBuf,
    /// Passed to [`crate::Store::open_url`].
    pub database_url: String,
    /// `tracing_subscriber::EnvFilter` directive.
    pub log_filter: String,
}

impl Settings {
    /// Process-wide settings. The environment (and `.env`) is read on the
    /// first call only.
    pub fn global() -> &'static Settings {
        SETTINGS.get_or_init(Settings::from_env)
    }

    pub fn from_env() -> Self {
        // A missing .env file is the normal case.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset or blank keys fall back to
    /// the defaults. Validation happens in [`Settings::with_overrides`].
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            non_blank(lookup(key)).unwrap_or_else(|| default.to_string())
        };

        Settings {
            data_dir: PathBuf::from(get(ENV_DATA_DIR, DEFAULT_DATA_DIR)),
            database_url: get(ENV_DATABASE_URL, DEFAULT_DATABASE_URL),
            log_filter: get(ENV_LOG, DEFAULT_LOG_FILTER),
        }
    }

    /// Applies command-line values on top of `self` and validates the
    /// result. Blank flag values count as absent.
    pub fn with_overrides(
        &self,
        data_dir: Option<PathBuf>,
        database_url: Option<String>,
    ) -> Result<Settings> {
        let data_dir = data_dir
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| self.data_dir.clone());
        let database_url = non_blank(database_url).unwrap_or_else(|| self.database_url.clone());
        check_database_url(&database_url)?;
        Ok(Settings {
            data_dir,
            database_url,
            log_filter: self.log_filter.clone(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Only SQLite targets are supported; server URLs are a configuration
/// error rather than a file name.
pub fn check_database_url(url: &str) -> Result<()> {
    let lower = url.trim().to_ascii_lowercase();
    let server = ["postgres://", "postgresql://", "mysql://"]
        .iter()
        .any(|scheme| lower.starts_with(scheme));
    if server {
        return Err(PulseError::Config(format!(
            "database must be a SQLite file, sqlite://path or :memory:, got {url}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let s = Settings::from_lookup(lookup(&[]));
        assert_eq!(s.data_dir, PathBuf::from("data"));
        assert_eq!(s.database_url, "pulse.db");
        assert_eq!(s.log_filter, "info");
    }

    #[test]
    fn environment_overrides_and_blank_values_fall_back() {
        let s = Settings::from_lookup(lookup(&[
            (ENV_DATA_DIR, "/srv/pulse/data"),
            (ENV_DATABASE_URL, "   "),
            (ENV_LOG, "pulse_core=debug"),
        ]));
        assert_eq!(s.data_dir, PathBuf::from("/srv/pulse/data"));
        assert_eq!(s.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(s.log_filter, "pulse_core=debug");
    }

    #[test]
    fn flags_beat_environment() {
        let env = Settings::from_lookup(lookup(&[
            (ENV_DATA_DIR, "/srv/pulse/data"),
            (ENV_DATABASE_URL, "postgres://u:p@host/db"),
        ]));
        let s = env
            .with_overrides(Some(PathBuf::from("./data")), Some("/tmp/x.db".into()))
            .unwrap();
        assert_eq!(s.data_dir, PathBuf::from("./data"));
        assert_eq!(s.database_url, "/tmp/x.db");
        assert_eq!(s.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn blank_flags_fall_back_to_environment() {
        let env = Settings::from_lookup(lookup(&[(ENV_DATABASE_URL, "sqlite://pulse-prod.db")]));
        let s = env
            .with_overrides(Some(PathBuf::new()), Some("  ".into()))
            .unwrap();
        assert_eq!(s.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(s.database_url, "sqlite://pulse-prod.db");
    }

    #[test]
    fn server_database_urls_are_rejected() {
        let env = Settings::from_lookup(lookup(&[(ENV_DATABASE_URL, "postgres://u:p@host/db")]));
        let err = env.with_overrides(None, None).unwrap_err();
        assert!(matches!(err, PulseError::Config(_)));

        let err = Settings::from_lookup(lookup(&[]))
            .with_overrides(None, Some("MySQL://root@localhost/pulse".into()))
            .unwrap_err();
        assert!(matches!(err, PulseError::Config(_)));

        assert!(check_database_url(":memory:").is_ok());
        assert!(check_database_url("sqlite://pulse.db").is_ok());
    }
}
