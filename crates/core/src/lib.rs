//! `rolegate-core`: storage-agnostic building blocks.
//!
//! This crate contains **pure** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod query;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, PRESENCE, UNIQUENESS, ValidationError};
pub use id::{RecordId, json_loosely_eq};
pub use query::{Condition, Query};
