// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Configuration module for the firmware notifier
//!
//! Loads configuration from environment variables (with `.env` support).
//! Every duration is given in seconds and converted to [`Duration`] here.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;


/// Default configuration values
pub mod defaults {
    pub const SERVER_ADDR: &str = "0.0.0.0:8080";
    pub const DATABASE_PATH: &str = "data/firmware-notifier.db";
    pub const DISPATCH_INTERVAL_SECS: u64 = 600;
    pub const DISPATCH_CONCURRENCY: usize = 4;
    pub const CATALOG_CACHE_TTL_SECS: u64 = 3600;
    pub const FIRMWARE_CACHE_TTL_SECS: u64 = 900;
    pub const FIRMWARE_CACHE_RETENTION_SECS: u64 = 7 * 24 * 3600;
    pub const CACHE_PURGE_INTERVAL_SECS: u64 = 3600;
    pub const UPSTREAM_BASE_URL: &str = "https://api.ipsw.me/v4";
    pub const UPSTREAM_TIMEOUT_SECS: u64 = 15;
    pub const PUBLIC_BASE_URL: &str = "http://localhost:8080";
    pub const TEMPLATE_DIR: &str = "templates";
    pub const HCAPTCHA_VERIFY_URL: &str = "https://hcaptcha.com/siteverify";
}

/// Environment variable names used by the application
pub mod env_vars {
    pub const SERVER_ADDR: &str = "SERVER_ADDR";
    pub const DATABASE_PATH: &str = "DATABASE_PATH";
    pub const DISPATCH_INTERVAL_SECONDS: &str = "DISPATCH_INTERVAL_SECONDS";
    pub const DISPATCH_CONCURRENCY: &str = "DISPATCH_CONCURRENCY";
    pub const CATALOG_CACHE_TTL_SECONDS: &str = "CATALOG_CACHE_TTL_SECONDS";
    pub const FIRMWARE_CACHE_TTL_SECONDS: &str = "FIRMWARE_CACHE_TTL_SECONDS";
    pub const FIRMWARE_CACHE_RETENTION_SECONDS: &str = "FIRMWARE_CACHE_RETENTION_SECONDS";
    pub const CACHE_PURGE_INTERVAL_SECONDS: &str = "CACHE_PURGE_INTERVAL_SECONDS";
    pub const UPSTREAM_BASE_URL: &str = "UPSTREAM_BASE_URL";
    pub const UPSTREAM_TIMEOUT_SECONDS: &str = "UPSTREAM_TIMEOUT_SECONDS";
    pub const PUBLIC_BASE_URL: &str = "PUBLIC_BASE_URL";
    pub const MAIL_RELAY_URL: &str = "MAIL_RELAY_URL";
    pub const MAIL_RELAY_API_KEY: &str = "MAIL_RELAY_API_KEY";
    pub const TEMPLATE_DIR: &str = "TEMPLATE_DIR";
    pub const HCAPTCHA_SECRET: &str = "HCAPTCHA_SECRET";
    pub const HCAPTCHA_VERIFY_URL: &str = "HCAPTCHA_VERIFY_URL";
}

/// Outbound mail relay settings
#[derive(Debug, Clone)]
pub struct MailRelayConfig {
    pub url: String,
    pub api_key: String,
}

/// hCaptcha settings
#[derive(Debug, Clone)]
pub struct CaptchaConfig {
    pub secret: String,
    pub verify_url: String,
}

/// Application-wide configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub database_path: PathBuf,
    pub dispatch_interval: Duration,
    pub dispatch_concurrency: usize,
    pub catalog_ttl: Duration,
    pub firmware_ttl: Duration,
    pub firmware_retention: Duration,
    pub cache_purge_interval: Duration,
    pub upstream_base_url: String,
    pub upstream_timeout: Duration,
    pub public_base_url: String,
    /// `None` runs the notifier dry: templates are rendered and logged only
    pub mail_relay: Option<MailRelayConfig>,
    pub template_dir: PathBuf,
    /// `None` disables CAPTCHA checks on subscribe
    pub captcha: Option<CaptchaConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_addr: defaults::SERVER_ADDR.to_string(),
            database_path: PathBuf::from(defaults::DATABASE_PATH),
            dispatch_interval: Duration::from_secs(defaults::DISPATCH_INTERVAL_SECS),
            dispatch_concurrency: defaults::DISPATCH_CONCURRENCY,
            catalog_ttl: Duration::from_secs(defaults::CATALOG_CACHE_TTL_SECS),
            firmware_ttl: Duration::from_secs(defaults::FIRMWARE_CACHE_TTL_SECS),
            firmware_retention: Duration::from_secs(defaults::FIRMWARE_CACHE_RETENTION_SECS),
            cache_purge_interval: Duration::from_secs(defaults::CACHE_PURGE_INTERVAL_SECS),
            upstream_base_url: defaults::UPSTREAM_BASE_URL.to_string(),
            upstream_timeout: Duration::from_secs(defaults::UPSTREAM_TIMEOUT_SECS),
            public_base_url: defaults::PUBLIC_BASE_URL.to_string(),
            mail_relay: None,
            template_dir: PathBuf::from(defaults::TEMPLATE_DIR),
            captcha: None,
        }
    }
}

/// Reads a duration in seconds, falling back to `default` when unset or invalid
fn env_secs(name: &str, default: u64) -> Duration {
    let secs = match std::env::var(name) {
        Ok(raw) => raw.trim().parse::<u64>().unwrap_or_else(|e| {
            tracing::warn!("Invalid {}={:?}: {}. Using {}s.", name, raw, e, default);
            default
        }),
        Err(_) => default,
    };
    Duration::from_secs(secs)
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl Config {
    /// Loads configuration from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let server_addr =
            env_string(env_vars::SERVER_ADDR).unwrap_or_else(|| defaults::SERVER_ADDR.to_string());

        let database_path = env_string(env_vars::DATABASE_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(defaults::DATABASE_PATH));

        let dispatch_concurrency = env_string(env_vars::DISPATCH_CONCURRENCY)
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::DISPATCH_CONCURRENCY);

        let mail_relay = match env_string(env_vars::MAIL_RELAY_URL) {
            Some(url) => Some(MailRelayConfig {
                url,
                api_key: env_string(env_vars::MAIL_RELAY_API_KEY).unwrap_or_default(),
            }),
            None => {
                tracing::warn!(
                    "{} is not set. Notifications will be rendered and logged but not sent.",
                    env_vars::MAIL_RELAY_URL
                );
                None
            }
        };

        let captcha = match env_string(env_vars::HCAPTCHA_SECRET) {
            Some(secret) => Some(CaptchaConfig {
                secret,
                verify_url: env_string(env_vars::HCAPTCHA_VERIFY_URL)
                    .unwrap_or_else(|| defaults::HCAPTCHA_VERIFY_URL.to_string()),
            }),
            None => {
                tracing::warn!(
                    "{} is not set. Subscribe requests will not be CAPTCHA-checked.",
                    env_vars::HCAPTCHA_SECRET
                );
                None
            }
        };

        Config {
            server_addr,
            database_path,
            dispatch_interval: env_secs(
                env_vars::DISPATCH_INTERVAL_SECONDS,
                defaults::DISPATCH_INTERVAL_SECS,
            ),
            dispatch_concurrency,
            catalog_ttl: env_secs(
                env_vars::CATALOG_CACHE_TTL_SECONDS,
                defaults::CATALOG_CACHE_TTL_SECS,
            ),
            firmware_ttl: env_secs(
                env_vars::FIRMWARE_CACHE_TTL_SECONDS,
                defaults::FIRMWARE_CACHE_TTL_SECS,
            ),
            firmware_retention: env_secs(
                env_vars::FIRMWARE_CACHE_RETENTION_SECONDS,
                defaults::FIRMWARE_CACHE_RETENTION_SECS,
            ),
            cache_purge_interval: env_secs(
                env_vars::CACHE_PURGE_INTERVAL_SECONDS,
                defaults::CACHE_PURGE_INTERVAL_SECS,
            ),
            upstream_base_url: env_string(env_vars::UPSTREAM_BASE_URL)
                .unwrap_or_else(|| defaults::UPSTREAM_BASE_URL.to_string()),
            upstream_timeout: env_secs(
                env_vars::UPSTREAM_TIMEOUT_SECONDS,
                defaults::UPSTREAM_TIMEOUT_SECS,
            ),
            public_base_url: env_string(env_vars::PUBLIC_BASE_URL)
                .unwrap_or_else(|| defaults::PUBLIC_BASE_URL.to_string()),
            mail_relay,
            template_dir: env_string(env_vars::TEMPLATE_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(defaults::TEMPLATE_DIR)),
            captcha,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.server_addr.parse::<SocketAddr>().is_err() {
            return Err(format!(
                "Invalid server address '{}': expected 'host:port'",
                self.server_addr
            ));
        }

        let durations = [
            ("dispatch interval", self.dispatch_interval),
            ("catalog cache TTL", self.catalog_ttl),
            ("firmware cache TTL", self.firmware_ttl),
            ("firmware cache retention", self.firmware_retention),
            ("cache purge interval", self.cache_purge_interval),
            ("upstream timeout", self.upstream_timeout),
        ];
        for (name, value) in durations {
            if value.is_zero() {
                return Err(format!("The {name} must be greater than zero"));
            }
        }

        if self.firmware_retention < self.firmware_ttl {
            return Err(
                "Firmware cache retention must not be shorter than the firmware cache TTL"
                    .to_string(),
            );
        }

        if self.dispatch_concurrency == 0 {
            return Err("Dispatch concurrency must be at least 1".to_string());
        }

        let mut urls = vec![
            ("upstream base URL", self.upstream_base_url.as_str()),
            ("public base URL", self.public_base_url.as_str()),
        ];
        if let Some(relay) = &self.mail_relay {
            urls.push(("mail relay URL", relay.url.as_str()));
        }
        if let Some(captcha) = &self.captcha {
            urls.push(("hCaptcha verify URL", captcha.verify_url.as_str()));
        }
        for (name, url) in urls {
            if !is_http_url(url) {
                return Err(format!("Invalid {name} '{url}': expected http(s) URL"));
            }
        }

        Ok(())
    }
}
