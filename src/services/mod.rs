//! Business logic services

pub mod events;
pub mod interactions;

pub use events::DomainEvents;
pub use interactions::InteractionService;
