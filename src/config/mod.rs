//! Configuration handling for the application.
//!
//! Everything is read from environment variables with development defaults,
//! so a bare `readmark` starts a local server with the lossy rendering policy.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use crate::extractor::MarkdownOptions;
use crate::fetcher::RetryPolicy;

/// Environment variable names. Kept public so tests and binaries can refer
/// to them.
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_FETCH_MAX_ATTEMPTS: &str = "FETCH_MAX_ATTEMPTS";
pub const ENV_FETCH_BASE_DELAY_MS: &str = "FETCH_BASE_DELAY_MS";
pub const ENV_STRIP_IMAGES: &str = "STRIP_IMAGES";
pub const ENV_STRIP_LINKS: &str = "STRIP_LINKS";
pub const ENV_RENDER_TABLES: &str = "RENDER_TABLES";

/// Default development values used when environment variables are absent.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_FETCH_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_FETCH_BASE_DELAY_MS: u64 = 1000;

/// Application runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    bind_addr: String,
    retry: RetryPolicy,
    markdown: MarkdownOptions,
}

impl Config {
    /// Create a new config explicitly.
    pub fn new(bind_addr: impl Into<String>, retry: RetryPolicy, markdown: MarkdownOptions) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            retry,
            markdown,
        }
    }

    /// Load from environment variables, falling back to development defaults.
    /// Values that are present but unparseable are rejected.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var(ENV_BIND_ADDR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let max_attempts: u32 = parse_var(ENV_FETCH_MAX_ATTEMPTS, DEFAULT_FETCH_MAX_ATTEMPTS)?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_FETCH_MAX_ATTEMPTS,
                reason: "must be at least 1".to_string(),
            });
        }
        let base_delay_ms: u64 = parse_var(ENV_FETCH_BASE_DELAY_MS, DEFAULT_FETCH_BASE_DELAY_MS)?;

        let defaults = MarkdownOptions::default();
        let markdown = MarkdownOptions {
            strip_images: parse_flag(ENV_STRIP_IMAGES, defaults.strip_images)?,
            strip_links: parse_flag(ENV_STRIP_LINKS, defaults.strip_links)?,
            tables: parse_flag(ENV_RENDER_TABLES, defaults.tables)?,
        };

        Ok(Self {
            bind_addr,
            retry: RetryPolicy {
                max_attempts,
                base_delay: Duration::from_millis(base_delay_ms),
            },
            markdown,
        })
    }

    /// TCP bind address (host:port) for the HTTP server.
    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }
    /// Attempts and backoff used when fetching pages.
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }
    /// Image, link and table rendering policy.
    pub fn markdown(&self) -> &MarkdownOptions {
        &self.markdown
    }

    /// Development defaults (mirrors `from_env` with no env overrides).
    pub fn default() -> Self {
        Self::new(
            DEFAULT_BIND_ADDR,
            RetryPolicy {
                max_attempts: DEFAULT_FETCH_MAX_ATTEMPTS,
                base_delay: Duration::from_millis(DEFAULT_FETCH_BASE_DELAY_MS),
            },
            MarkdownOptions::default(),
        )
    }
}

fn parse_var<T: FromStr>(field: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    match env::var(field) {
        Ok(raw) => raw.trim().parse().map_err(|err: T::Err| ConfigError::InvalidValue {
            field,
            reason: format!("{raw:?}: {err}"),
        }),
        Err(_) => Ok(default),
    }
}

fn parse_flag(field: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Ok(raw) = env::var(field) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field,
            reason: format!("{raw:?} is not a boolean"),
        }),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Ensure environment-variable manipulating tests run serially.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const ALL_VARS: [&str; 6] = [
        ENV_BIND_ADDR,
        ENV_FETCH_MAX_ATTEMPTS,
        ENV_FETCH_BASE_DELAY_MS,
        ENV_STRIP_IMAGES,
        ENV_STRIP_LINKS,
        ENV_RENDER_TABLES,
    ];

    fn clear_env() {
        for key in ALL_VARS {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    #[test]
    fn defaults_when_env_missing() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.bind_addr(), super::DEFAULT_BIND_ADDR);
        assert_eq!(cfg.retry().max_attempts, 3);
        assert!(cfg.markdown().strip_images);
    }

    #[test]
    fn overrides_when_env_present() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_BIND_ADDR, "0.0.0.0:9000");
            env::set_var(ENV_FETCH_MAX_ATTEMPTS, "5");
            env::set_var(ENV_FETCH_BASE_DELAY_MS, "250");
            env::set_var(ENV_STRIP_IMAGES, "false");
            env::set_var(ENV_STRIP_LINKS, "0");
            env::set_var(ENV_RENDER_TABLES, "off");
        }
        let cfg = Config::from_env().unwrap();
        clear_env();

        assert_eq!(cfg.bind_addr(), "0.0.0.0:9000");
        assert_eq!(cfg.retry().max_attempts, 5);
        assert_eq!(cfg.retry().base_delay, Duration::from_millis(250));
        assert_eq!(*cfg.markdown(), MarkdownOptions {
            strip_images: false,
            strip_links: false,
            tables: false,
        });
    }

    #[test]
    fn rejects_unparseable_values() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_FETCH_MAX_ATTEMPTS, "lots");
        }
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains(ENV_FETCH_MAX_ATTEMPTS));

        unsafe {
            env::set_var(ENV_FETCH_MAX_ATTEMPTS, "0");
        }
        assert!(Config::from_env().is_err());

        unsafe {
            env::set_var(ENV_FETCH_MAX_ATTEMPTS, "2");
            env::set_var(ENV_STRIP_LINKS, "maybe");
        }
        let err = Config::from_env().unwrap_err();
        clear_env();
        assert!(err.to_string().contains(ENV_STRIP_LINKS));
    }
}
