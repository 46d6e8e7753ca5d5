// Configuration for the proxy
//
// Built once at startup and handed to the server; nothing here is global.
// Secrets come from the environment, everything else from an optional
// YAML file next to the binary.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Upstream credential. Overridden by the GROQ_API_KEY environment
    /// variable; an empty value is rejected per request, not at startup.
    #[serde(default)]
    pub groq_api_key: String,

    #[serde(default = "default_groq_base_url")]
    pub groq_base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Origin prefixes allowed to call the proxy. A request passes when
    /// its Origin or Referer starts with any of these.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Counter store for rate limiting. Absent means rate limiting is
    /// disabled entirely.
    #[serde(default)]
    pub redis_url: Option<String>,

    #[serde(default = "default_rate_limit_quota")]
    pub rate_limit_quota: u32,

    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,

    /// Header the edge platform sets with the real client address.
    #[serde(default = "default_client_ip_header")]
    pub client_ip_header: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_groq_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://127.0.0.1".to_string(),
    ]
}

fn default_rate_limit_quota() -> u32 {
    60
}

fn default_upstream_timeout_secs() -> u64 {
    25
}

fn default_max_body_bytes() -> u64 {
    32 * 1024
}

fn default_client_ip_header() -> String {
    "cf-connecting-ip".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            groq_api_key: String::new(),
            groq_base_url: default_groq_base_url(),
            model: default_model(),
            allowed_origins: default_allowed_origins(),
            redis_url: None,
            rate_limit_quota: default_rate_limit_quota(),
            upstream_timeout_secs: default_upstream_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
            client_ip_header: default_client_ip_header(),
        }
    }
}

impl AppConfig {
    /// Load the config file named by LINGUAVOX_CONFIG (default
    /// `config.yaml`), falling back to defaults when it does not exist,
    /// then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path =
            std::env::var("LINGUAVOX_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());

        let mut config = if Path::new(&path).exists() {
            let content = std::fs::read_to_string(&path)?;
            let config = serde_yaml::from_str(&content)?;
            tracing::info!("Config loaded from {}", path);
            config
        } else {
            AppConfig::default()
        };

        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            if !key.is_empty() {
                config.groq_api_key = key;
            }
        }
        if let Ok(url) = std::env::var("REDIS_URL") {
            if !url.is_empty() {
                config.redis_url = Some(url);
            }
        }

        tracing::info!(
            "Config ready: origins={:?} rate_limiting={} quota={}",
            config.allowed_origins,
            config.redis_url.is_some(),
            config.rate_limit_quota
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_policy() {
        let config = AppConfig::default();
        assert_eq!(config.rate_limit_quota, 60);
        assert_eq!(config.upstream_timeout_secs, 25);
        assert_eq!(config.max_body_bytes, 32 * 1024);
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn yaml_fields_are_kebab_case() {
        let config: AppConfig = serde_yaml::from_str(
            "groq-api-key: sk-test\nallowed-origins:\n  - https://linguavox.example\nrate-limit-quota: 10\n",
        )
        .unwrap();
        assert_eq!(config.groq_api_key, "sk-test");
        assert_eq!(config.allowed_origins, vec!["https://linguavox.example"]);
        assert_eq!(config.rate_limit_quota, 10);
        assert_eq!(config.port, 8787);
    }
}
