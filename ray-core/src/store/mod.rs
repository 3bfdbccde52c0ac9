//! Saved item persistence
//!
//! The `ray_items` table is the only persisted state. Two backends implement
//! [`ItemStore`]:
//!
//! - `supabase`: PostgREST over HTTP (production)
//! - `memory`: process-local list, for tests and local runs

mod memory;
pub mod supabase;
mod traits;

pub use memory::InMemoryItemStore;
pub use supabase::{SupabaseConfig, SupabaseItemStore};
pub use traits::*;
