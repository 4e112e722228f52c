//! Storyforge Remote — HTTP implementations of the collaborator gateways.
//!
//! [`HttpPersistenceGateway`] talks to the canonical persistence service,
//! [`HttpAiGateway`] to the AI content service. Both map `429` responses to
//! `GatewayError::RateLimited` and every other failure, transport errors
//! included, to `GatewayError::Remote` with a human-readable detail.

mod ai;
mod client;
mod persistence;

pub use ai::HttpAiGateway;
pub use persistence::HttpPersistenceGateway;
