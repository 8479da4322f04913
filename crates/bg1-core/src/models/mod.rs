//! Data models for virtual-queue entities.
//!
//! - `Queue`: a virtual queue and its next scheduled opening
//! - `Location`: the resort a queue belongs to

pub mod location;
pub mod queue;

pub use location::Location;
pub use queue::{next_opening, Queue, QueueSortColumn, QueuesResponse};
