//! Runtime configuration.
//!
//! Everything the pipeline needs (store location, timeouts, alert credentials)
//! is collected into a [`Config`] once at startup and passed down explicitly.
//! Values come from the environment, optionally seeded from a `.env` file.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_NAV_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_SELECTOR_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_CURRENCY: &str = "₹";

/// Browser-like user agent sent by both fetch tiers.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/131.0.0.0 Safari/537.36";

/// SMTP credentials for email alerts. Only built when all three of
/// `EMAIL_USER`, `EMAIL_PASSWORD` and `NOTIFICATION_EMAIL` are set.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub recipient: String,
}

/// Explicit configuration for a pricewatch instance.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database path.
    pub db_path: PathBuf,
    /// Timeout for the static (tier 1) GET.
    pub http_timeout: Duration,
    /// Timeout for rendered (tier 2) navigation.
    pub navigation_timeout: Duration,
    /// How long tier 2 waits for each selector before moving on.
    pub selector_timeout: Duration,
    /// Products checked concurrently within one cycle.
    pub concurrency: usize,
    /// Whether tier 2 may launch a browser at all.
    pub render_enabled: bool,
    /// Explicit browser executable; auto-detected when unset.
    pub chromium_path: Option<PathBuf>,
    /// Extra strategy table entries (JSON).
    pub sites_file: Option<PathBuf>,
    pub user_agent: String,
    /// Currency symbol used in human-facing messages.
    pub currency: String,
    pub smtp: Option<SmtpSettings>,
    /// Set when only some of the email variables are present.
    pub smtp_incomplete: bool,
    pub webhook_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            http_timeout: Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS),
            navigation_timeout: Duration::from_millis(DEFAULT_NAV_TIMEOUT_MS),
            selector_timeout: Duration::from_millis(DEFAULT_SELECTOR_TIMEOUT_MS),
            concurrency: 1,
            render_enabled: true,
            chromium_path: None,
            sites_file: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            smtp: None,
            smtp_incomplete: false,
            webhook_url: None,
        }
    }
}

impl Config {
    /// Build a configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first if present;
    /// variables already set in the environment take precedence over it.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let email_user = read_env_string("EMAIL_USER");
        let email_password = read_env_string("EMAIL_PASSWORD");
        let recipient = read_env_string("NOTIFICATION_EMAIL");
        let present = [&email_user, &email_password, &recipient]
            .iter()
            .filter(|v| v.is_some())
            .count();

        let smtp = match (email_user, email_password, recipient) {
            (Some(username), Some(password), Some(recipient)) => Some(SmtpSettings {
                server: read_env_string("SMTP_SERVER")
                    .unwrap_or_else(|| DEFAULT_SMTP_SERVER.to_string()),
                port: read_env_u16("SMTP_PORT", DEFAULT_SMTP_PORT),
                username,
                password,
                recipient,
            }),
            _ => None,
        };

        Self {
            db_path: read_env_string("PRICEWATCH_DB")
                .map(PathBuf::from)
                .unwrap_or_else(default_db_path),
            http_timeout: Duration::from_millis(read_env_u64(
                "PRICEWATCH_HTTP_TIMEOUT_MS",
                DEFAULT_HTTP_TIMEOUT_MS,
            )),
            navigation_timeout: Duration::from_millis(read_env_u64(
                "PRICEWATCH_NAV_TIMEOUT_MS",
                DEFAULT_NAV_TIMEOUT_MS,
            )),
            selector_timeout: Duration::from_millis(read_env_u64(
                "PRICEWATCH_SELECTOR_TIMEOUT_MS",
                DEFAULT_SELECTOR_TIMEOUT_MS,
            )),
            concurrency: read_env_usize("PRICEWATCH_CONCURRENCY", 1).max(1),
            render_enabled: read_env_bool("PRICEWATCH_RENDER", true),
            chromium_path: read_env_string("PRICEWATCH_CHROMIUM_PATH").map(PathBuf::from),
            sites_file: read_env_string("PRICEWATCH_SITES_FILE").map(PathBuf::from),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            currency: read_env_string("PRICEWATCH_CURRENCY")
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            smtp,
            smtp_incomplete: present > 0 && present < 3,
            webhook_url: read_env_string("PRICEWATCH_WEBHOOK_URL"),
        }
    }

    /// Override the database path (the `--db` flag).
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }
}

/// `~/.pricewatch/price_data.db`, or the working directory when there is no home.
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".pricewatch")
        .join("price_data.db")
}

fn read_env_u64(name: &str, default_value: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default_value)
}

fn read_env_u16(name: &str, default_value: u16) -> u16 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u16>().ok())
        .unwrap_or(default_value)
}

fn read_env_usize(name: &str, default_value: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default_value)
}

fn read_env_bool(name: &str, default_value: bool) -> bool {
    match read_env_string(name) {
        Some(v) => !matches!(
            v.to_ascii_lowercase().as_str(),
            "0" | "false" | "off" | "no"
        ),
        None => default_value,
    }
}

/// Trimmed value, with empty strings treated as unset.
fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.selector_timeout, Duration::from_secs(10));
        assert_eq!(cfg.concurrency, 1);
        assert!(cfg.render_enabled);
        assert!(cfg.smtp.is_none());
        assert!(cfg.db_path.ends_with("price_data.db"));
    }

    #[test]
    fn test_with_db_path_overrides() {
        let cfg = Config::default().with_db_path("/tmp/other.db");
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/other.db"));
    }

    #[test]
    fn test_unset_variables_fall_back() {
        assert_eq!(read_env_u64("PRICEWATCH_TEST_UNSET_U64", 42), 42);
        assert!(read_env_bool("PRICEWATCH_TEST_UNSET_BOOL", true));
        assert!(read_env_string("PRICEWATCH_TEST_UNSET_STR").is_none());
    }
}
