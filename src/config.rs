/*
 * Responsibility
 * - Load settings from the environment (.env is honoured in development)
 * - Validate them up front (missing / malformed values fail startup)
 * - Hand the core components their own small policy structs
 */
use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::services::auth::JwtPolicy;
use crate::services::auth_context::AuthContextConfig;
use crate::services::policy::PolicyConfig;
use crate::services::rate_limit::RateLimitConfig;

/// HS256 needs at least 256 bits of key material.
const MIN_JWT_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<&str>) -> Self {
        match value
            .unwrap_or("development")
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub upstream_base_url: url::Url,
    pub cors_allowed_origin_patterns: Vec<String>,

    pub auth_enabled: bool,
    pub jwt: JwtPolicy,
    pub internal_event_token: String,

    pub cache_url: Option<String>,
    pub auth_context: AuthContextConfig,

    pub rate_limit: RateLimitConfig,
    pub policy: PolicyConfig,

    pub request_body_limit_bytes: usize,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(get);

        let port: u16 = env.parse("PORT", 3000)?;
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(env.get("APP_ENV").as_deref());

        let upstream_base_url = url::Url::parse(&env.required("UPSTREAM_BASE_URL")?)
            .map_err(|_| ConfigError::Invalid("UPSTREAM_BASE_URL"))?;

        let mut cors_allowed_origin_patterns = env.list("CORS_ALLOWED_ORIGIN_PATTERNS");
        if cors_allowed_origin_patterns.is_empty() {
            cors_allowed_origin_patterns.push("https://*".to_string());
        }

        let auth_enabled = env.bool("AUTH_ENABLED", true)?;

        let issuer = env.required("AUTH_ISSUER")?;
        let audience = env.required("AUTH_AUDIENCE")?;
        let secret = env.required("AUTH_JWT_SECRET")?;
        if secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::Invalid("AUTH_JWT_SECRET"));
        }
        let clock_skew_seconds = env.parse("AUTH_CLOCK_SKEW_SECONDS", 30)?;

        let internal_event_token = env.required("INTERNAL_EVENT_TOKEN")?;
        if internal_event_token.trim().is_empty() {
            return Err(ConfigError::Invalid("INTERNAL_EVENT_TOKEN"));
        }

        let cache_url = env
            .get("CACHE_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let token_cache_ttl_seconds: u64 = env.parse("TOKEN_CACHE_TTL_SECONDS", 86_400)?;
        if token_cache_ttl_seconds == 0 {
            return Err(ConfigError::Invalid("TOKEN_CACHE_TTL_SECONDS"));
        }

        let rate_limit = RateLimitConfig {
            enabled: env.bool("RATE_LIMIT_ENABLED", true)?,
            login_per_minute: env.parse("RATE_LIMIT_LOGIN_PER_MINUTE", 10)?,
            refresh_per_minute: env.parse("RATE_LIMIT_REFRESH_PER_MINUTE", 30)?,
            logout_per_minute: env.parse("RATE_LIMIT_LOGOUT_PER_MINUTE", 30)?,
        };

        let policy = PolicyConfig {
            enforce_https: env.bool("POLICY_ENFORCE_HTTPS", false)?,
            allowed_hosts: env
                .list("POLICY_ALLOWED_HOSTS")
                .into_iter()
                .map(|h| h.to_ascii_lowercase())
                .collect::<HashSet<_>>(),
            allow_private_ip_host: env.bool("POLICY_ALLOW_PRIVATE_IP_HOST", true)?,
            enforce_method_path_allowlist: env.bool("POLICY_ENFORCE_METHOD_PATH_ALLOWLIST", true)?,
            enforce_json_content_type: env.bool("POLICY_ENFORCE_JSON_CONTENT_TYPE", true)?,
            prevalidate_refresh_token_type: env
                .bool("POLICY_PREVALIDATE_REFRESH_TOKEN_TYPE", true)?,
        };

        let request_body_limit_bytes = env.parse("REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?;
        let request_timeout = Duration::from_secs(env.parse("REQUEST_TIMEOUT_SECONDS", 30)?);

        Ok(Self {
            addr,
            app_env,
            upstream_base_url,
            cors_allowed_origin_patterns,
            auth_enabled,
            jwt: JwtPolicy {
                issuer,
                audience,
                secret,
                clock_skew_seconds,
            },
            internal_event_token,
            cache_url,
            auth_context: AuthContextConfig {
                ttl: Duration::from_secs(token_cache_ttl_seconds),
            },
            rate_limit,
            policy,
            request_body_limit_bytes,
            request_timeout,
        })
    }
}

/// Typed accessors over a key lookup. Present-but-malformed values are `Invalid`.
struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    fn parse<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => v.trim().parse::<T>().map_err(|_| ConfigError::Invalid(key)),
        }
    }

    fn bool(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        let Some(v) = self.get(key) else {
            return Ok(default);
        };
        match v.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid(key)),
        }
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
