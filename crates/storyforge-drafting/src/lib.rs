//! Storyforge Drafting — two-phase AI workflows.
//!
//! [`DraftWorkflow`] drives "generate a scene, review, commit or discard";
//! [`SplitWorkflow`] drives "split pasted chapter text into scenes, review,
//! bulk-commit with partial-failure reporting". Both apply results to the
//! workspace only through its serialized entry points, and both drop
//! responses whose context was discarded in the meantime.

mod draft;
mod split;

pub use draft::{DraftState, DraftWorkflow};
pub use split::{SplitState, SplitWorkflow};
