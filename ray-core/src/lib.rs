//! # Ray relay core
//!
//! The domain logic behind the Ray personal assistant: deciding what a chat
//! message is, building the conversation window, relaying it to the right
//! model, and filing saved items.
//!
//! ## Features
//!
//! - **Heuristic classifier**: save commands, zone/subzone filing, tier parsing
//! - **Tiered relay**: direct answers for simple and complex questions, web
//!   search plus synthesis for live ones, with a tier 2 fallback
//! - **Persistence**: an [`ItemStore`] trait with Supabase and in-memory
//!   implementations
//! - **Side effects**: "email me this" through a [`transport::Mailer`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ray_core::transport::mock::{ScriptedCompletion, StaticSearch};
//! use ray_core::{Relay, RelayConfig};
//!
//! # async fn run() -> ray_core::Result<()> {
//! let relay = Relay::new(
//!     Arc::new(ScriptedCompletion::new([])),
//!     Arc::new(StaticSearch::empty()),
//!     RelayConfig::default(),
//! );
//! let answer = relay.answer("What is 2 + 2?", &[], None).await?;
//! println!("{} ({})", answer.message, answer.model);
//! # Ok(())
//! # }
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

pub mod classifier;
pub mod email;
mod errors;
pub mod extract;
pub mod models;
pub mod prompts;
pub mod relay;
pub mod save;
pub mod store;
pub mod transport;
mod types;
pub mod window;

pub use classifier::{classify_content, classify_saved_item, is_save_command};
pub use email::{EmailReply, email_last_answer, is_email_request};
pub use errors::{RayError, Result};
pub use models::TierModels;
pub use relay::{Relay, RelayAnswer, RelayConfig};
pub use save::{ConversationalSave, DirectSave, conversational_save, resolve_direct_save};
pub use store::{InMemoryItemStore, ItemStore, SupabaseConfig, SupabaseItemStore};
pub use types::*;
pub use window::{build_chat_messages, history_from_value};
