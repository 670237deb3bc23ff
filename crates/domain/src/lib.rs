//! Domain layer for the forecast service
//!
//! Contains forecast entities, value objects, and domain errors.
//! This layer has no I/O and defines the ubiquitous language:
//! observations arrive, records persist, keys decide update-vs-insert.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
