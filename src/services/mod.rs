//! Service layer: one module per aggregate, all returning `Result<_, AppError>`.
//!
//! Handlers stay thin; everything that touches the store lives here. Nothing
//! retries: a failed store call surfaces immediately.

pub mod auth;
pub mod notifications;
pub mod preferences;
pub mod suggestions;
pub mod tasks;
