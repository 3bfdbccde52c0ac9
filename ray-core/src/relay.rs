//! Tiered model relay
//!
//! Every chat question goes through the same chain:
//!
//! 1. a cheap classification call picks a tier (failures fall back to tier 1)
//! 2. tier 1 and 2 answer directly with the tier's model
//! 3. tier 3 compresses the question into keywords, searches the web and has
//!    a model answer from the top results; when search fails or finds
//!    nothing the question is answered by the tier 2 model instead
//!
//! Personal-fact extraction is an independent call the route runs alongside.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::classifier::{
    extract_json_object, has_personal_cues, parse_tier_decision, tier_classification_prompt,
};
use crate::errors::{RayError, Result};
use crate::extract::extract_content;
use crate::models::TierModels;
use crate::prompts::{
    PERSONAL_FACTS_PROMPT, RAY_SYSTEM_PROMPT, SYNTHESIS_SYSTEM_PROMPT, query_optimizer_prompt,
    synthesis_prompt,
};
use crate::transport::{CompletionBackend, CompletionRequest, WebSearch, parse_search_results};
use crate::types::{ChatMessage, PersonalFact, SearchResult, Tier, TierDecision};
use crate::window::{DEFAULT_HISTORY_LIMIT, build_chat_messages, build_system_prompt};

/// Longest search query sent upstream, in words
const MAX_QUERY_WORDS: usize = 10;

/// Relay tuning
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub models: TierModels,
    /// History messages forwarded with each question
    pub history_limit: usize,
    /// Search results given to the synthesis model
    pub search_results: u32,
    pub system_prompt: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            models: TierModels::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            search_results: 3,
            system_prompt: RAY_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// The answer to one chat question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayAnswer {
    pub tier: Tier,
    /// Model that answered, or the search label for search-backed answers
    pub model: String,
    pub message: String,
    pub reasoning: String,
    /// Links of the search results the answer was written from
    pub sources: Vec<String>,
}

#[derive(Deserialize)]
struct FactsEnvelope {
    #[serde(default)]
    facts: Vec<PersonalFact>,
}

pub struct Relay {
    completion: Arc<dyn CompletionBackend>,
    search: Arc<dyn WebSearch>,
    config: RelayConfig,
}

impl Relay {
    pub fn new(
        completion: Arc<dyn CompletionBackend>,
        search: Arc<dyn WebSearch>,
        config: RelayConfig,
    ) -> Self {
        Self {
            completion,
            search,
            config,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Run a completion and pull out its text; blank text is an error
    async fn complete_text(&self, request: CompletionRequest) -> Result<String> {
        let model = request.model.clone();
        let response = self.completion.complete(request).await?;
        let text = extract_content(&response);
        if text.trim().is_empty() {
            warn!("{} returned no text content", model);
            return Err(RayError::EmptyCompletion);
        }
        debug!("{} answered with {} chars", model, text.len());
        Ok(text)
    }

    /// Pick a tier for `query`. Never fails: any problem yields tier 1.
    pub async fn classify_tier(&self, query: &str) -> TierDecision {
        let request = CompletionRequest::new(
            &self.config.models.classifier,
            &[
                ChatMessage::system(tier_classification_prompt()),
                ChatMessage::user(query),
            ],
        )
        .max_tokens(100)
        .temperature(0.0)
        .json_object();

        match self.complete_text(request).await {
            Ok(raw) => {
                let decision = parse_tier_decision(&raw);
                info!("Classified as tier {}: {}", decision.tier, decision.reasoning);
                decision
            },
            Err(e) => {
                warn!("Tier classification failed, using tier 1: {}", e);
                TierDecision::default()
            },
        }
    }

    /// Classify and answer a question
    pub async fn answer(
        &self,
        query: &str,
        history: &[ChatMessage],
        profile: Option<&Value>,
    ) -> Result<RelayAnswer> {
        let decision = self.classify_tier(query).await;
        self.answer_for_tier(decision, query, history, profile).await
    }

    /// Answer a question whose tier is already decided
    pub async fn answer_for_tier(
        &self,
        decision: TierDecision,
        query: &str,
        history: &[ChatMessage],
        profile: Option<&Value>,
    ) -> Result<RelayAnswer> {
        match decision.tier {
            Tier::Simple | Tier::Complex => {
                self.answer_direct(decision, query, history, profile).await
            },
            Tier::Live => self.answer_live(decision, query, history, profile).await,
        }
    }

    async fn answer_direct(
        &self,
        decision: TierDecision,
        query: &str,
        history: &[ChatMessage],
        profile: Option<&Value>,
    ) -> Result<RelayAnswer> {
        let model = self.config.models.for_tier(decision.tier).to_string();
        let system = build_system_prompt(&self.config.system_prompt, profile);
        let messages = build_chat_messages(&system, history, query, self.config.history_limit);

        let message = self
            .complete_text(CompletionRequest::new(&model, &messages))
            .await?;

        Ok(RelayAnswer {
            tier: decision.tier,
            model,
            message,
            reasoning: decision.reasoning,
            sources: Vec::new(),
        })
    }

    async fn answer_live(
        &self,
        decision: TierDecision,
        query: &str,
        history: &[ChatMessage],
        profile: Option<&Value>,
    ) -> Result<RelayAnswer> {
        let keywords = self.optimize_query(query).await;

        let why = match self.search(&keywords).await {
            Ok(results) if !results.is_empty() => {
                return self.synthesize(decision, query, &results).await;
            },
            Ok(_) => {
                info!("No search results for {:?}", keywords);
                "search found nothing"
            },
            Err(e) => {
                warn!("Search failed for {:?}: {}", keywords, e);
                "search failed"
            },
        };

        let reasoning = format!(
            "{} ({}, answered with {})",
            decision.reasoning, why, self.config.models.tier2
        );
        self.answer_direct(
            TierDecision {
                tier: Tier::Live,
                reasoning,
            },
            query,
            history,
            profile,
        )
        .await
    }

    /// Compress a question into search keywords; falls back to the question
    pub async fn optimize_query(&self, query: &str) -> String {
        let request = CompletionRequest::new(
            &self.config.models.optimizer,
            &[
                ChatMessage::system(query_optimizer_prompt(Utc::now().year())),
                ChatMessage::user(query),
            ],
        )
        .max_tokens(50)
        .temperature(0.0);

        let raw = match self.complete_text(request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Query optimization failed, searching the original: {}", e);
                return query.trim().to_string();
            },
        };

        let keywords = raw
            .trim()
            .trim_matches(|c| c == '"' || c == '\'' || c == '`')
            .split_whitespace()
            .take(MAX_QUERY_WORDS)
            .collect::<Vec<_>>()
            .join(" ");

        if keywords.is_empty() {
            query.trim().to_string()
        } else {
            debug!("Optimized {:?} to {:?}", query, keywords);
            keywords
        }
    }

    /// Top search results for `query`
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let raw = self
            .search
            .search_raw(query, self.config.search_results)
            .await?;
        let mut results = parse_search_results(&raw);
        results.truncate(self.config.search_results as usize);
        Ok(results)
    }

    async fn synthesize(
        &self,
        decision: TierDecision,
        query: &str,
        results: &[SearchResult],
    ) -> Result<RelayAnswer> {
        let request = CompletionRequest::new(
            &self.config.models.synthesis,
            &[
                ChatMessage::system(SYNTHESIS_SYSTEM_PROMPT),
                ChatMessage::user(synthesis_prompt(query, results)),
            ],
        );
        let message = self.complete_text(request).await?;

        Ok(RelayAnswer {
            tier: Tier::Live,
            model: self.config.models.tier3_label.clone(),
            message,
            reasoning: decision.reasoning,
            sources: results.iter().map(|r| r.link.clone()).collect(),
        })
    }

    /// Personal details the user stated in `query`. Never fails.
    pub async fn extract_personal_facts(&self, query: &str) -> Vec<PersonalFact> {
        if !has_personal_cues(query) {
            return Vec::new();
        }

        let request = CompletionRequest::new(
            &self.config.models.extractor,
            &[
                ChatMessage::system(PERSONAL_FACTS_PROMPT),
                ChatMessage::user(query),
            ],
        )
        .max_tokens(300)
        .temperature(0.0)
        .json_object();

        let raw = match self.complete_text(request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Personal fact extraction failed: {}", e);
                return Vec::new();
            },
        };

        let parsed = extract_json_object(&raw)
            .and_then(|json| serde_json::from_str::<FactsEnvelope>(json).ok());
        match parsed {
            Some(envelope) => envelope
                .facts
                .into_iter()
                .filter(|f| !f.fact.trim().is_empty())
                .collect(),
            None => {
                warn!("Personal fact reply was not usable JSON");
                Vec::new()
            },
        }
    }
}
