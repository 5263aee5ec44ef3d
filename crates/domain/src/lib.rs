//! autopost domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `usecases`: Application use cases / business logic
//! - `policy`: Validation of generated drafts

pub mod model;
pub mod policy;
pub mod ports;
pub mod usecases;

#[cfg(test)]
mod testing;

pub use model::*;
pub use ports::*;
