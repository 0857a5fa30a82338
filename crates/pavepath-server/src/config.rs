//! Server configuration from environment.

use anyhow::{Context, Result};
use pavepath_core::RoutingRules;
use pavepath_providers::ProviderSettings;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Optional JSON file overriding the default routing rules
    pub rules_path: Option<String>,
    pub providers: ProviderSettings,
    pub geocode_cache_ttl: Duration,
    pub geocode_cache_max_entries: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("PAVEPATH_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
            rules_path: env::var("PAVEPATH_RULES_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            providers: ProviderSettings::from_env(),
            geocode_cache_ttl: Duration::from_secs(
                env::var("PAVEPATH_GEOCODE_CACHE_TTL_S")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            ),
            geocode_cache_max_entries: env::var("PAVEPATH_GEOCODE_CACHE_MAX")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024),
        }
    }

    /// Defaults, or the rules file if one is configured.
    pub fn load_rules(&self) -> Result<RoutingRules> {
        let Some(path) = &self.rules_path else {
            return Ok(RoutingRules::default());
        };
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading routing rules from {path}"))?;
        let rules = RoutingRules::from_json(&json)
            .with_context(|| format!("invalid routing rules in {path}"))?;
        tracing::info!(path = %path, "loaded routing rules");
        Ok(rules)
    }
}
