//! Storyforge Tracking — liveness guards and busy-key records.
//!
//! Two small services shared by the store and the workflows:
//!
//! - [`TaskGuard`] decides, after an awaited remote call resolves, whether
//!   its result is still wanted (last-writer-wins at request-issue time).
//! - [`OperationRegistry`] decides, before a remote call is issued, whether
//!   the target key already has a mutation in flight.
//!
//! Mutual exclusion in the whole system is exactly these two checks; there
//! are no locks held across awaits anywhere.

mod guard;
mod key;
mod registry;

pub use guard::{TaskGuard, TaskToken, lanes};
pub use key::OpKey;
pub use registry::{OperationRecord, OperationRegistry};
