//! In-memory adapters.
//!
//! Test doubles for every port. They enforce the same uniqueness and
//! NotFound semantics as the PostgreSQL adapters so the workflow can be
//! exercised end to end without a database or chat transport.

mod clock;
mod cycle_repository;
mod notifier;
mod roster_directory;
mod status_store;

pub use clock::ManualClock;
pub use cycle_repository::InMemoryCycleRepository;
pub use notifier::{RecordingNotifier, SentMessage};
pub use roster_directory::InMemoryRosterDirectory;
pub use status_store::InMemoryStatusStore;
