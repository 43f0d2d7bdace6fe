//! Storage abstractions for watch state persistence.
//!
//! The state is a single JSON document mapping `"{target}|{size}"` to the last
//! observed status:
//!
//! ```text
//! {
//!   "Canyon Allroad R138_P01|2XS": "unavailable",
//!   "Canyon Allroad R138_P02|2XS": "available"
//! }
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::WatchState;

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for watch state storage backends.
#[async_trait]
pub trait StateStorage: Send + Sync {
    /// Load the persisted state.
    ///
    /// A missing or unreadable state is reported as empty, never as an error.
    async fn load_state(&self) -> WatchState;

    /// Overwrite the persisted state with `state`.
    async fn save_state(&self, state: &WatchState) -> Result<()>;
}
