//! Application use cases / business logic

pub mod automation;
pub mod generate;

pub use automation::{AutomationConfig, AutomationController, AutomationError, LeaseConfig};
pub use generate::{GenerateUseCase, GenerateUseCaseError};
