//! Shared test fakes and utilities for the Storyforge workspace.

mod ai;
mod gate;
mod persistence;

pub use ai::{FailingAi, ScriptedAi};
pub use gate::HoldHandle;
pub use persistence::{FailingPersistence, InMemoryPersistence};
