//! Storyforge API — axum HTTP surface over the orchestration core.

pub mod error;
pub mod routes;
pub mod state;
