//! Test doubles for the orchestrator's collaborators.
//!
//! Following sqlx's testing philosophy, the PostgreSQL implementations are
//! tested against a real database. These in-memory doubles cover everything
//! that does not need one: pending computation, failure handling, context
//! isolation and authoring.
//!
//! # Example
//!
//! ```ignore
//! use strata_core::testing::{MemoryHistoryStore, RecordingExecutor};
//!
//! let history = Arc::new(MemoryHistoryStore::new());
//! let executor = Arc::new(RecordingExecutor::new());
//! executor.fail_when("CREATE TABLE IF NOT EXISTS \"posts\"");
//! ```

mod history;
mod recording;

pub use history::MemoryHistoryStore;
pub use recording::{RecordingExecutor, RecordingLock, RecordingScaffolder};
