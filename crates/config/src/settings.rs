//! Process-wide settings (env + file), as distinct from per-tenant
//! configuration (see `tenant_loader`).
//!
//! Grounded on the teacher's `config/src/agent.rs`: a serde struct with a
//! `default_*` function per field, loaded through the `config` crate's
//! layered `File`/`Environment` sources with a service-specific env prefix
//! (`RECEPT_` here, `VOICE_AGENT_` in the teacher).

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub bearer_token: Option<String>,
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
            cors_allowed_origins: Vec::new(),
        }
    }
}

/// Global feature/model settings that apply across tenants unless a
/// tenant overrides them (§4.9, §9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalSettings {
    #[serde(default = "default_true")]
    pub enable_3_tier_intelligence: bool,
    #[serde(default = "default_dialogue_model")]
    pub dialogue_llm_model: String,
    #[serde(default = "default_fallback_model")]
    pub fallback_llm_model: String,
    #[serde(default = "default_dialogue_timeout_ms")]
    pub dialogue_llm_timeout_ms: u64,
    #[serde(default = "default_fallback_timeout_ms")]
    pub fallback_llm_timeout_ms: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub tier3_cache_ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub tier3_cache_capacity: usize,
    #[serde(default = "default_call_ttl_secs")]
    pub call_state_ttl_secs: u64,
    #[serde(default = "default_llm_endpoint")]
    pub llm_endpoint: String,
    #[serde(default)]
    pub llm_api_key: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_dialogue_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_fallback_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_dialogue_timeout_ms() -> u64 {
    4_000
}

fn default_fallback_timeout_ms() -> u64 {
    5_000
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_capacity() -> usize {
    1_000
}

fn default_call_ttl_secs() -> u64 {
    1_800
}

fn default_llm_endpoint() -> String {
    "http://localhost:11434".to_string()
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            enable_3_tier_intelligence: true,
            dialogue_llm_model: default_dialogue_model(),
            fallback_llm_model: default_fallback_model(),
            dialogue_llm_timeout_ms: default_dialogue_timeout_ms(),
            fallback_llm_timeout_ms: default_fallback_timeout_ms(),
            tier3_cache_ttl_secs: default_cache_ttl_secs(),
            tier3_cache_capacity: default_cache_capacity(),
            call_state_ttl_secs: default_call_ttl_secs(),
            llm_endpoint: default_llm_endpoint(),
            llm_api_key: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub global: GlobalSettings,
}

/// Load settings layering a `config/default.toml` (if present) under
/// `RECEPT_`-prefixed environment variables, e.g. `RECEPT_SERVER__PORT=9000`.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name("config/default").required(false))
        .add_source(config::Environment::with_prefix("RECEPT").separator("__"));

    let raw = builder.build()?;
    raw.try_deserialize().map_err(ConfigError::from)
}
