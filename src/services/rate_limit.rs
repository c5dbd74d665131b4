//! Fixed-window counters for the credential endpoints.
//!
//! One counter per key, reset whenever the wall-clock minute advances. The
//! table is a `DashMap`, so a read-modify-write only holds the shard lock of
//! that key. Stale entries are overwritten on the next hit, never swept.
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::Method;
use dashmap::DashMap;
use sha2::{Digest, Sha256};

const WINDOW_SECONDS: u64 = 60;

pub const UNKNOWN_IP: &str = "unknown-ip";
const UNKNOWN_USER: &str = "unknown-user";
const UNKNOWN_REFRESH: &str = "unknown-refresh";

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub login_per_minute: i64,
    pub refresh_per_minute: i64,
    pub logout_per_minute: i64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            login_per_minute: 10,
            refresh_per_minute: 30,
            logout_per_minute: 30,
        }
    }
}

/// The credential endpoints that are rate limited (and body-validated).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEndpoint {
    Login,
    Refresh,
    Logout,
}

impl AuthEndpoint {
    /// POST `/v1/auth/*` or the legacy `/v2/auth/*` equivalents.
    pub fn classify(method: &Method, path: &str) -> Option<Self> {
        if method != Method::POST {
            return None;
        }
        let action = path
            .strip_prefix("/v1/auth/")
            .or_else(|| path.strip_prefix("/v2/auth/"))?;
        match action {
            "login" => Some(Self::Login),
            "refresh" => Some(Self::Refresh),
            "logout" => Some(Self::Logout),
            _ => None,
        }
    }

    pub fn limit(&self, config: &RateLimitConfig) -> i64 {
        match self {
            Self::Login => config.login_per_minute,
            Self::Refresh => config.refresh_per_minute,
            Self::Logout => config.logout_per_minute,
        }
    }
}

/// `login:{ip}:{username}`
pub fn login_key(ip: &str, username: Option<&str>) -> String {
    let user = username
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(UNKNOWN_USER);
    format!("login:{}:{}", ip, user)
}

/// `refresh:{ip}:{sha256(refreshToken)}`; logout shares the refresh keyspace.
pub fn refresh_key(ip: &str, refresh_token: Option<&str>) -> String {
    let token = refresh_token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(UNKNOWN_REFRESH);
    format!("refresh:{}:{}", ip, sha256_hex(token))
}

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

#[derive(Debug, Clone, Copy)]
struct Counter {
    window: u64,
    count: u64,
}

#[derive(Debug, Default)]
pub struct FixedWindowRateLimiter {
    counters: DashMap<String, Counter>,
}

impl FixedWindowRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(&self, key: &str, limit: i64) -> bool {
        self.allow_at(key, limit, now_seconds())
    }

    pub fn allow_at(&self, key: &str, limit: i64, now_seconds: u64) -> bool {
        if limit <= 0 {
            return false;
        }
        let window = now_seconds / WINDOW_SECONDS;

        let mut entry = self
            .counters
            .entry(key.to_string())
            .or_insert(Counter { window, count: 0 });
        if entry.window != window {
            *entry = Counter { window, count: 0 };
        }
        entry.count += 1;

        entry.count <= limit as u64
    }

    /// Seconds until the current window rolls over.
    pub fn retry_after_seconds(&self) -> u64 {
        WINDOW_SECONDS - now_seconds() % WINDOW_SECONDS
    }
}

fn now_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
