//! Environment-driven configuration. `.env` is loaded first when present.

use std::env;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_COLLECTION: &str = "reports";
const DEFAULT_ADMIN_EMAIL: &str = "admin@kony.local";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    pub project_id: String,
    pub api_key: String,
    /// Bearer token sent with Firestore requests, when the rules require one.
    pub auth_token: Option<String>,
    pub emulator_host: Option<String>,
    pub collection: String,
}

impl FirebaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            project_id: required("FIREBASE_PROJECT_ID")?,
            api_key: required("FIREBASE_API_KEY")?,
            auth_token: optional("FIREBASE_AUTH_TOKEN"),
            emulator_host: optional("FIRESTORE_EMULATOR_HOST"),
            collection: optional("REPORTS_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
        })
    }
}

/// Timings of the PDF export narration.
#[derive(Debug, Clone, Copy)]
pub struct ExportTimings {
    /// Delay before the "taking longer than expected" warning.
    pub watchdog: Duration,
    /// Interval of the elapsed-time progress lines.
    pub narrator: Duration,
    /// How long an untouched export (and its document) is kept.
    pub idle: Duration,
}

impl Default for ExportTimings {
    fn default() -> Self {
        Self {
            watchdog: Duration::from_secs(15),
            narrator: Duration::from_secs(3),
            idle: Duration::from_secs(10 * 60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub port: u16,
    pub backend: StoreBackend,
    /// Absent in memory mode.
    pub firebase: Option<FirebaseConfig>,
    pub export: ExportTimings,
    pub admin: AdminCredentials,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let backend = match optional("STORE_BACKEND").as_deref() {
            None | Some("firestore") => StoreBackend::Firestore,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let firebase = match backend {
            StoreBackend::Firestore => Some(FirebaseConfig::from_env()?),
            StoreBackend::Memory => None,
        };

        let defaults = ExportTimings::default();
        let export = ExportTimings {
            watchdog: seconds("EXPORT_WATCHDOG_SECS", defaults.watchdog)?,
            narrator: seconds("EXPORT_NARRATOR_SECS", defaults.narrator)?,
            idle: seconds("EXPORT_IDLE_SECS", defaults.idle)?,
        };

        let admin = AdminCredentials {
            email: optional("ADMIN_EMAIL").unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string()),
            password: optional("ADMIN_PASSWORD").unwrap_or_else(|| {
                if backend == StoreBackend::Memory {
                    log::warn!("ADMIN_PASSWORD not set, using the default demo password");
                }
                DEFAULT_ADMIN_PASSWORD.to_string()
            }),
        };

        Ok(Self {
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse("PORT", 8080)?,
            backend,
            firebase,
            export,
            admin,
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

fn parse<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

/// A whole number of seconds. Zero is refused: every export timing must be a real period.
fn seconds(key: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match parse(key, default.as_secs())? {
        0 => Err(ConfigError::Invalid {
            key,
            value: "0".to_string(),
        }),
        secs => Ok(Duration::from_secs(secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_timing_defaults() {
        let timings = ExportTimings::default();
        assert_eq!(timings.watchdog, Duration::from_secs(15));
        assert_eq!(timings.narrator, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_number_is_reported() {
        env::set_var("KONY_TEST_PORT", "eighty");
        let result: Result<u16, _> = parse("KONY_TEST_PORT", 8080);
        assert!(matches!(result, Err(ConfigError::Invalid { key: "KONY_TEST_PORT", .. })));

        env::set_var("KONY_TEST_PORT", " 9090 ");
        assert_eq!(parse::<u16>("KONY_TEST_PORT", 8080).unwrap(), 9090);
        env::remove_var("KONY_TEST_PORT");
    }

    #[test]
    fn test_zero_seconds_is_refused() {
        env::set_var("KONY_TEST_NARRATOR_SECS", "0");
        let result = seconds("KONY_TEST_NARRATOR_SECS", Duration::from_secs(3));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { key: "KONY_TEST_NARRATOR_SECS", .. })
        ));

        env::set_var("KONY_TEST_NARRATOR_SECS", "2");
        assert_eq!(
            seconds("KONY_TEST_NARRATOR_SECS", Duration::from_secs(3)).unwrap(),
            Duration::from_secs(2)
        );
        env::remove_var("KONY_TEST_NARRATOR_SECS");
        assert_eq!(
            seconds("KONY_TEST_NARRATOR_SECS", Duration::from_secs(3)).unwrap(),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn test_missing_required_value() {
        let err = required("KONY_TEST_DEFINITELY_UNSET").unwrap_err();
        assert_eq!(err.to_string(), "KONY_TEST_DEFINITELY_UNSET must be set");
    }
}
