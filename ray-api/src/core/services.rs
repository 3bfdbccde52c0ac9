use ray_core::store::{InMemoryItemStore, ItemStore, SupabaseConfig, SupabaseItemStore};
use ray_core::transport::{
    CompletionBackend, GoogleSearchClient, Mailer, OpenAiClient, ResendMailer, WebSearch,
    http_client,
};
use ray_core::{Relay, RelayConfig, TierModels};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::config::{Settings, StorageBackend};

/// Upstream clients shared by every route, built once at startup
#[derive(Clone)]
pub struct Services {
    pub completion: Arc<dyn CompletionBackend>,
    pub search: Arc<dyn WebSearch>,
    pub mailer: Arc<dyn Mailer>,
    pub store: Arc<dyn ItemStore>,
    pub relay: Arc<Relay>,
    pub models: TierModels,
    /// Recipient used when a chat request carries no address
    pub default_email_to: Option<String>,
}

impl Services {
    pub fn new(
        completion: Arc<dyn CompletionBackend>,
        search: Arc<dyn WebSearch>,
        mailer: Arc<dyn Mailer>,
        store: Arc<dyn ItemStore>,
        relay_config: RelayConfig,
    ) -> Self {
        let models = relay_config.models.clone();
        let relay = Arc::new(Relay::new(completion.clone(), search.clone(), relay_config));
        Self {
            completion,
            search,
            mailer,
            store,
            relay,
            models,
            default_email_to: None,
        }
    }

    pub fn with_default_email_to(mut self, to: Option<String>) -> Self {
        self.default_email_to = to.filter(|t| !t.trim().is_empty());
        self
    }

    /// HTTP clients for every upstream. Missing credentials are reported when
    /// a client is first used, not here.
    pub fn from_settings(settings: &Settings) -> ray_core::Result<Self> {
        let http = http_client(Duration::from_secs(settings.upstream.timeout_seconds))?;

        let completion = Arc::new(OpenAiClient::new(
            http.clone(),
            settings.openai.api_key.clone(),
            settings.openai.base_url.clone(),
        ));
        let search = Arc::new(GoogleSearchClient::new(
            http.clone(),
            settings.google.api_key.clone(),
            settings.google.cse_id.clone(),
            settings.google.base_url.clone(),
        ));
        let mailer = Arc::new(ResendMailer::new(
            http.clone(),
            settings.resend.api_key.clone(),
            settings.resend.from.clone(),
            settings.resend.base_url.clone(),
        ));

        let store: Arc<dyn ItemStore> = match settings.storage.backend {
            StorageBackend::Supabase => Arc::new(SupabaseItemStore::new(
                http,
                SupabaseConfig {
                    url: settings.supabase.url.clone(),
                    service_key: settings.supabase.service_key.clone(),
                    table: settings.supabase.table.clone(),
                },
            )),
            StorageBackend::Memory => {
                info!("Using in-memory item storage; saved items are lost on restart");
                Arc::new(InMemoryItemStore::new())
            },
        };

        Ok(Self::new(
            completion,
            search,
            mailer,
            store,
            relay_config(settings),
        )
        .with_default_email_to(settings.resend.default_to.clone()))
    }
}

pub fn relay_config(settings: &Settings) -> RelayConfig {
    RelayConfig {
        models: settings.relay.models.clone(),
        history_limit: settings.relay.history_limit,
        ..RelayConfig::default()
    }
}
