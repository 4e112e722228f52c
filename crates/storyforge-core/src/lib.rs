//! Storyforge Core — shared domain abstractions.
//!
//! This crate defines the fundamental types and traits that the store,
//! workflow, and delivery crates depend on. It contains no infrastructure
//! code: the remote collaborators appear here only as traits.

pub mod error;
pub mod gateway;
pub mod model;
pub mod screen;
