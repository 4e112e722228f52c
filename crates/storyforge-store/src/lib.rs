//! Storyforge Store — in-memory collections and the resource façade.
//!
//! [`OrderedCollection`] keeps sibling lists dense (orders exactly 1..N);
//! [`Workspace`] is the per-entity CRUD façade that issues remote calls,
//! serializes mutations per busy key, and applies only confirmed, still-
//! current results.

mod ordered;
mod workspace;

pub use ordered::{Ordered, OrderedCollection};
pub use workspace::Workspace;
