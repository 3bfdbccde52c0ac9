use config::{Config, ConfigError, Environment, File};
use ray_core::TierModels;
use ray_core::transport::google::DEFAULT_GOOGLE_SEARCH_URL;
use ray_core::transport::openai::DEFAULT_OPENAI_BASE_URL;
use ray_core::transport::resend::DEFAULT_RESEND_BASE_URL;
use ray_core::window::DEFAULT_HISTORY_LIMIT;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub openai: OpenAiConfig,
    pub google: GoogleConfig,
    pub supabase: SupabaseSettings,
    pub resend: ResendConfig,
    #[serde(default)]
    pub relay: RelaySettings,
    pub storage: StorageConfig,
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AuthConfig {
    /// Shared secret clients send as `X-App-Token`
    pub app_token: Option<String>,
    /// Mount `/api/ray-live` without token checks
    #[serde(default)]
    pub enable_live_route: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GoogleConfig {
    pub api_key: Option<String>,
    pub cse_id: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SupabaseSettings {
    pub url: Option<String>,
    pub service_key: Option<String>,
    pub table: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ResendConfig {
    pub api_key: Option<String>,
    pub from: String,
    pub default_to: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RelaySettings {
    pub history_limit: usize,
    #[serde(default)]
    pub models: TierModels,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            models: TierModels::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Supabase,
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UpstreamConfig {
    pub timeout_seconds: u64,
}

/// Well-known variables that override the matching setting when present
const CREDENTIAL_VARS: &[(&str, &str)] = &[
    ("auth.app_token", "APP_TOKEN"),
    ("openai.api_key", "OPENAI_API_KEY"),
    ("google.api_key", "GOOGLE_API_KEY"),
    ("google.cse_id", "GOOGLE_CSE_ID"),
    ("supabase.url", "SUPABASE_URL"),
    ("supabase.service_key", "SUPABASE_SERVICE_ROLE_KEY"),
    ("resend.api_key", "RESEND_API_KEY"),
    ("resend.from", "RAY_EMAIL_FROM"),
    ("resend.default_to", "RAY_DEFAULT_EMAIL_TO"),
];

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Self::defaults()?
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("RAY").separator("__"));

        for (key, var) in CREDENTIAL_VARS {
            let value = env::var(var).ok().filter(|v| !v.trim().is_empty());
            builder = builder.set_override_option(*key, value)?;
        }

        builder.build()?.try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("auth.enable_live_route", false)?
            .set_default("openai.base_url", DEFAULT_OPENAI_BASE_URL)?
            .set_default("google.base_url", DEFAULT_GOOGLE_SEARCH_URL)?
            .set_default("supabase.table", ray_core::store::supabase::DEFAULT_TABLE)?
            .set_default("resend.from", "Ray <ray@example.com>")?
            .set_default("resend.base_url", DEFAULT_RESEND_BASE_URL)?
            .set_default("relay.history_limit", DEFAULT_HISTORY_LIMIT as i64)?
            .set_default("storage.backend", "supabase")?
            .set_default("upstream.timeout_seconds", 30)
    }

    /// Built-in defaults only, ignoring files and the environment
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self::defaults()
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize())
            .expect("default settings deserialize")
    }
}
