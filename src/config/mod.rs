use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api/v1";
pub const MAX_TOKEN_DAYS: i64 = 3650;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub log_error_bodies: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub access_token_days: i64,
    pub refresh_token_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub dashboard_stale_secs: u64,
    pub profile_stale_secs: u64,
    pub monthly_trend_months: u32,
    pub recent_transactions_limit: u32,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    /// Development preset pointed at an explicit API base URL
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        let mut config = Self::development();
        config.api.base_url = base_url.into();
        config
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("FINTRACK_API_URL") {
            if !v.trim().is_empty() {
                self.api.base_url = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("FINTRACK_API_TIMEOUT_SECS") {
            self.api.timeout_secs = v.parse().unwrap_or(self.api.timeout_secs);
        }
        if let Ok(v) = env::var("FINTRACK_LOG_ERROR_BODIES") {
            self.api.log_error_bodies = v.parse().unwrap_or(self.api.log_error_bodies);
        }

        // Session overrides
        if let Ok(v) = env::var("FINTRACK_ACCESS_TOKEN_DAYS") {
            self.session.access_token_days = positive_days(&v).unwrap_or(self.session.access_token_days);
        }
        if let Ok(v) = env::var("FINTRACK_REFRESH_TOKEN_DAYS") {
            self.session.refresh_token_days =
                positive_days(&v).unwrap_or(self.session.refresh_token_days);
        }

        // Cache overrides
        if let Ok(v) = env::var("FINTRACK_DASHBOARD_STALE_SECS") {
            self.cache.dashboard_stale_secs = v.parse().unwrap_or(self.cache.dashboard_stale_secs);
        }
        if let Ok(v) = env::var("FINTRACK_PROFILE_STALE_SECS") {
            self.cache.profile_stale_secs = v.parse().unwrap_or(self.cache.profile_stale_secs);
        }
        if let Ok(v) = env::var("FINTRACK_TREND_MONTHS") {
            self.cache.monthly_trend_months = v.parse().unwrap_or(self.cache.monthly_trend_months);
        }
        if let Ok(v) = env::var("FINTRACK_RECENT_LIMIT") {
            self.cache.recent_transactions_limit =
                v.parse().unwrap_or(self.cache.recent_transactions_limit);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: DEFAULT_API_URL.to_string(),
                timeout_secs: 60,
                log_error_bodies: true,
            },
            session: SessionConfig {
                access_token_days: 7,
                refresh_token_days: 30,
            },
            cache: CacheConfig {
                dashboard_stale_secs: 30,
                profile_stale_secs: 5 * 60,
                monthly_trend_months: 6,
                recent_transactions_limit: 5,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                base_url: DEFAULT_API_URL.to_string(),
                timeout_secs: 30,
                log_error_bodies: true,
            },
            ..Self::development()
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: DEFAULT_API_URL.to_string(),
                timeout_secs: 30,
                log_error_bodies: false,
            },
            ..Self::development()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn dashboard_stale_time(&self) -> Duration {
        Duration::from_secs(self.cache.dashboard_stale_secs)
    }

    pub fn profile_stale_time(&self) -> Duration {
        Duration::from_secs(self.cache.profile_stale_secs)
    }
}

/// Credential lifetimes must be a positive day count no larger than
/// `MAX_TOKEN_DAYS`
fn positive_days(value: &str) -> Option<i64> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|days| (1..=MAX_TOKEN_DAYS).contains(days))
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::development()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = ClientConfig::development();
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.session.access_token_days, 7);
        assert_eq!(config.session.refresh_token_days, 30);
        assert_eq!(config.dashboard_stale_time(), Duration::from_secs(30));
    }

    #[test]
    fn test_default_production_config() {
        let config = ClientConfig::production();
        assert_eq!(config.environment, Environment::Production);
        assert!(!config.api.log_error_bodies);
        assert_eq!(config.cache.monthly_trend_months, 6);
        assert_eq!(config.cache.recent_transactions_limit, 5);
    }

    #[test]
    fn test_token_days_must_be_positive_and_bounded() {
        assert_eq!(positive_days("14"), Some(14));
        assert_eq!(positive_days(" 1 "), Some(1));
        assert_eq!(positive_days("0"), None);
        assert_eq!(positive_days("-3"), None);
        assert_eq!(positive_days("100000000"), None);
        assert_eq!(positive_days("week"), None);
    }

    #[test]
    fn test_for_base_url() {
        let config = ClientConfig::for_base_url("http://127.0.0.1:9999/api/v1");
        assert_eq!(config.api.base_url, "http://127.0.0.1:9999/api/v1");
        assert_eq!(config.environment, Environment::Development);
    }
}
