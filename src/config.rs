//! Configuration types.
//!
//! Everything is read from environment variables. Each `from_env()` has a
//! `from_lookup()` twin so tests can feed values without touching the
//! process environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Reply filter tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterConfig {
    /// Lines with at most this many non-space characters skip the ratio check.
    pub short_line_threshold: usize,
    /// Minimum share of Hangul characters for a long line to survive.
    pub min_script_ratio: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            short_line_threshold: 10,
            min_script_ratio: 0.2,
        }
    }
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Root directory; artifacts are written under `<work_dir>/generated`.
    pub work_dir: PathBuf,
    /// TrueType font used for PDF output when it can be loaded.
    pub pdf_font_path: Option<PathBuf>,
    /// Reply filter thresholds.
    pub filter: FilterConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let work_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            pdf_font_path: Some(work_dir.join("fonts").join("MALGUN.ttf")),
            work_dir,
            filter: FilterConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let work_dir = lookup("AGENT_WORK_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.work_dir);

        let pdf_font_path = Some(
            lookup("AGENT_PDF_FONT")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| work_dir.join("fonts").join("MALGUN.ttf")),
        );

        let filter = FilterConfig {
            short_line_threshold: parse_or(
                &lookup,
                "AGENT_FILTER_SHORT_LINE",
                defaults.filter.short_line_threshold,
            )?,
            min_script_ratio: parse_or(
                &lookup,
                "AGENT_FILTER_MIN_RATIO",
                defaults.filter.min_script_ratio,
            )?,
        };

        if !(0.0..=1.0).contains(&filter.min_script_ratio) {
            return Err(ConfigError::InvalidValue {
                key: "AGENT_FILTER_MIN_RATIO".into(),
                message: format!("{} is outside 0.0..=1.0", filter.min_script_ratio),
            });
        }

        Ok(Self {
            work_dir,
            pdf_font_path,
            filter,
        })
    }

    /// Directory that receives generated artifacts.
    pub fn output_dir(&self) -> PathBuf {
        self.work_dir.join("generated")
    }
}

/// Remote model endpoint configuration.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the model server, without trailing slash.
    pub base_url: Option<String>,
    pub route_timeout: Duration,
    pub chat_timeout: Duration,
    pub summary_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            route_timeout: Duration::from_secs(60),
            chat_timeout: Duration::from_secs(120),
            summary_timeout: Duration::from_secs(300),
        }
    }
}

impl RemoteConfig {
    /// Build config from environment variables.
    /// `COLAB_API_BASE` left unset is not an error here; calls fail later with `NotConfigured`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup("COLAB_API_BASE")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            base_url,
            route_timeout: Duration::from_secs(parse_or(
                &lookup,
                "AGENT_ROUTE_TIMEOUT_SECS",
                defaults.route_timeout.as_secs(),
            )?),
            chat_timeout: Duration::from_secs(parse_or(
                &lookup,
                "AGENT_CHAT_TIMEOUT_SECS",
                defaults.chat_timeout.as_secs(),
            )?),
            summary_timeout: Duration::from_secs(parse_or(
                &lookup,
                "AGENT_SUMMARY_TIMEOUT_SECS",
                defaults.summary_timeout.as_secs(),
            )?),
        })
    }
}

/// SMTP configuration for the email dispatcher.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub from_address: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 465,
            username: None,
            password: None,
            from_address: None,
        }
    }
}

impl SmtpConfig {
    /// Build config from environment variables.
    /// Missing credentials are allowed; sending fails with `MissingCredentials`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let username = non_empty("SMTP_USER");
        let from_address = non_empty("SMTP_FROM").or_else(|| username.clone());

        Ok(Self {
            host: non_empty("SMTP_HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "SMTP_PORT", defaults.port)?,
            username,
            password: non_empty("SMTP_PASSWORD").map(SecretString::from),
            from_address,
        })
    }

    /// Both halves of the login are present.
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                })
        }
        _ => Ok(default),
    }
}
