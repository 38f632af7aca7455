//! Web layer for the radio directory client.
//!
//! A thin JSON facade: every endpoint maps onto one [`RadioClient`]
//! operation and keeps its return shape.
//!
//! [`RadioClient`]: crate::client::RadioClient

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
