//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the workflow and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `CycleRepository` - Notification cycles keyed by (date, type)
//! - `StatusStore` - Per-question status rows and the sweep queries
//! - `RosterDirectory` - Read access to active participants
//!
//! ## Delivery and Time
//!
//! - `NotifierGateway` - Outbound chat messages with answer buttons
//! - `Clock` - Injected time source

mod clock;
mod cycle_repository;
mod notifier_gateway;
mod roster_directory;
mod status_store;

pub use clock::{Clock, SystemClock};
pub use cycle_repository::CycleRepository;
pub use notifier_gateway::{NotifierGateway, ResponseButtons};
pub use roster_directory::RosterDirectory;
pub use status_store::StatusStore;
