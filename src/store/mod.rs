//! Persistence seams: subject profiles and tracking configuration.
//!
//! Schema design lives with the host; the core only defines the traits it
//! reads and writes through, plus an in-memory implementation for tests and
//! embedded use.

pub mod memory;
pub mod store_errors;
pub mod store_model;
pub mod store_traits;

pub use memory::MemoryStore;
pub use store_errors::StoreError;
pub use store_model::{AnnouncedIdLog, SubjectProfile};
pub use store_traits::{SubjectProfileRepository, TrackingConfigRepository};
