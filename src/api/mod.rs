//! REST API endpoints

pub mod health;
pub mod interactions;
pub mod notices;
pub mod notifications;
pub mod posts;
