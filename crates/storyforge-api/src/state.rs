//! Shared application state.

use std::sync::Arc;

use storyforge_core::gateway::{AiGateway, PersistenceGateway};
use storyforge_drafting::{DraftWorkflow, SplitWorkflow};
use storyforge_store::Workspace;
use storyforge_tracking::{OperationRegistry, TaskGuard};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The serialized resource workspace.
    pub workspace: Arc<Workspace>,
    /// Scene-draft generation workflow.
    pub drafts: Arc<DraftWorkflow>,
    /// Chapter-split workflow.
    pub splits: Arc<SplitWorkflow>,
    /// The AI collaborator, for stateless operations (rephrase).
    pub ai: Arc<dyn AiGateway>,
}

impl AppState {
    /// Wires the workspace and both workflows around the given collaborator
    /// gateways.
    #[must_use]
    pub fn new(persistence: Arc<dyn PersistenceGateway>, ai: Arc<dyn AiGateway>) -> Self {
        let workspace = Arc::new(Workspace::new(
            persistence,
            Arc::new(OperationRegistry::new()),
            Arc::new(TaskGuard::new()),
        ));
        let drafts = Arc::new(DraftWorkflow::new(Arc::clone(&ai), Arc::clone(&workspace)));
        let splits = Arc::new(SplitWorkflow::new(Arc::clone(&ai), Arc::clone(&workspace)));
        Self {
            workspace,
            drafts,
            splits,
            ai,
        }
    }
}
