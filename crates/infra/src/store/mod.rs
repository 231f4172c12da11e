//! Record storage boundary.
//!
//! The core consumes persistence only through these traits; the in-memory
//! implementations back tests and embedded use.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::{IdAllocator, InMemoryEntityStore, InMemoryRecordStore};
pub use r#trait::{EntityRecord, EntityStore, RecordStore};
