use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

const INSECURE_SECRET_KEY: &str = "insecure-dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub database_url: String,
    pub secret_key: String,
    pub debug: bool,
    pub allowed_hosts: Vec<String>,
    pub cors_allowed_origins: Vec<String>,

    pub api_prefix: String,
    pub log_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8000".to_string(),
            database_url: "memory://".to_string(),
            secret_key: INSECURE_SECRET_KEY.to_string(),
            debug: true,
            allowed_hosts: split_list("localhost,127.0.0.1"),
            cors_allowed_origins: split_list("http://localhost:3000"),
            api_prefix: "/api".to_string(),
            log_dir: "logs".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let defaults = Self::default();

        let debug = match env::var("DEBUG") {
            Ok(raw) => parse_flag(&raw).with_context(|| format!("DEBUG has invalid value {raw:?}"))?,
            Err(_) => defaults.debug,
        };

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or(defaults.server_addr),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            secret_key: env::var("SECRET_KEY").unwrap_or(defaults.secret_key),
            debug,
            allowed_hosts: env::var("ALLOWED_HOSTS")
                .map(|raw| split_list(&raw))
                .unwrap_or(defaults.allowed_hosts),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|raw| split_list(&raw))
                .unwrap_or(defaults.cors_allowed_origins),
            api_prefix: env::var("API_PREFIX").unwrap_or(defaults.api_prefix),
            log_dir: env::var("LOG_DIR").unwrap_or(defaults.log_dir),
        })
    }

    pub fn uses_insecure_secret(&self) -> bool {
        self.secret_key == INSECURE_SECRET_KEY
    }

    /// Host matching follows the usual allow-list rules: `*` matches
    /// everything, a leading dot matches the domain and its subdomains.
    /// The port, if any, is ignored.
    pub fn host_allowed(&self, host: &str) -> bool {
        let host = strip_port(host).to_ascii_lowercase();
        self.allowed_hosts.iter().any(|pattern| {
            let pattern = pattern.to_ascii_lowercase();
            if pattern == "*" {
                true
            } else if let Some(domain) = pattern.strip_prefix('.') {
                host == domain || host.ends_with(&pattern)
            } else {
                host == pattern
            }
        })
    }

    pub fn origin_allowed(&self, origin: &str) -> bool {
        self.cors_allowed_origins
            .iter()
            .any(|allowed| allowed == "*" || allowed.eq_ignore_ascii_case(origin))
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => anyhow::bail!("expected a boolean flag, got {other:?}"),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_port(host: &str) -> &str {
    // [::1]:8000
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}
