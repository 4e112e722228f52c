//! Chapter-split workflow.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;
use uuid::Uuid;

use storyforge_core::error::{GatewayError, OrchestrationError, require_non_blank};
use storyforge_core::gateway::AiGateway;
use storyforge_core::model::SceneProposal;
use storyforge_core::screen::screen_ai_payload;
use storyforge_store::Workspace;
use storyforge_tracking::{OpKey, lanes};

/// Where the split workflow currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitState {
    /// Nothing in progress.
    Idle,
    /// An AI split request is in flight for the chapter.
    Splitting {
        /// Target chapter.
        chapter_id: Uuid,
    },
    /// Proposals are ready for review.
    ReviewReady {
        /// Target chapter.
        chapter_id: Uuid,
        /// Proposed scenes, in narrative order.
        proposals: Vec<SceneProposal>,
    },
    /// Proposals are being persisted one by one.
    Committing {
        /// Target chapter.
        chapter_id: Uuid,
    },
    /// Some proposals failed to persist; the rest may be retried.
    PartiallyFailed {
        /// Target chapter.
        chapter_id: Uuid,
        /// Proposals that have not yet succeeded.
        remaining: Vec<SceneProposal>,
        /// One message per failed create, in attempt order.
        errors: Vec<String>,
    },
}

/// Two-phase state machine for "split raw chapter text into scenes, review,
/// bulk-commit with partial-failure reporting".
///
/// Splitting is only permitted on a chapter with zero scenes. Commit
/// iterates proposals sequentially; successes merge into the scene
/// collection immediately, failures accumulate, and only the unsucceeded
/// proposals are retained for retry.
pub struct SplitWorkflow {
    ai: Arc<dyn AiGateway>,
    workspace: Arc<Workspace>,
    state: Mutex<SplitState>,
}

impl SplitWorkflow {
    /// Creates an idle workflow.
    #[must_use]
    pub fn new(ai: Arc<dyn AiGateway>, workspace: Arc<Workspace>) -> Self {
        Self {
            ai,
            workspace,
            state: Mutex::new(SplitState::Idle),
        }
    }

    /// Snapshot of the current state for the rendering layer.
    #[must_use]
    pub fn state(&self) -> SplitState {
        self.state_lock().clone()
    }

    /// Asks the AI collaborator to split `raw_text` into proposed scenes.
    ///
    /// # Errors
    ///
    /// Rejects, before any remote call: blank text (`Validation`), a
    /// chapter whose scenes are unloaded or non-empty (`InvalidState`), a
    /// busy split key (`AlreadyInProgress`), and a workflow that is not
    /// idle (`InvalidState`). Collaborator failures return the workflow to
    /// `Idle` with the error recorded on the split key.
    pub async fn split(
        &self,
        chapter_id: Uuid,
        raw_text: &str,
    ) -> Result<(), OrchestrationError> {
        require_non_blank("chapter text", raw_text)?;
        let project_id = self.workspace.active_project_id()?;
        match self.workspace.scene_count(chapter_id) {
            Some(0) => {}
            Some(_) => {
                return Err(OrchestrationError::InvalidState(
                    "chapter already has scenes".into(),
                ));
            }
            None => {
                return Err(OrchestrationError::InvalidState(
                    "scenes not loaded for chapter".into(),
                ));
            }
        }

        let key = OpKey::split(chapter_id);
        let epoch = self.workspace.registry().try_begin(&key)?;

        {
            let mut state = self.state_lock();
            if *state == SplitState::Idle {
                *state = SplitState::Splitting { chapter_id };
            } else {
                drop(state);
                self.workspace.registry().end(&key, None);
                return Err(OrchestrationError::InvalidState(
                    "a split is already under review".into(),
                ));
            }
        }

        let token = self.workspace.guard().start(lanes::SPLIT);
        let result = self
            .ai
            .split_chapter_into_scenes(project_id, chapter_id, raw_text)
            .await;

        if !self.workspace.guard().is_current(&token) {
            debug!(chapter_id = %chapter_id, "dropping stale split response");
            self.release_if_abandoned(&key, epoch);
            return Ok(());
        }

        match result.and_then(screen_proposals) {
            Ok(proposals) => {
                self.workspace.registry().end(&key, None);
                *self.state_lock() = SplitState::ReviewReady {
                    chapter_id,
                    proposals,
                };
                Ok(())
            }
            Err(err) => {
                let err = OrchestrationError::from(err);
                self.workspace.registry().end(&key, Some(err.clone()));
                *self.state_lock() = SplitState::Idle;
                Err(err)
            }
        }
    }

    /// Persists every pending proposal, sequentially and in order.
    ///
    /// Each success is merged into the scene collection immediately, so
    /// partial progress is visible even when a later proposal fails.
    /// Failures are accumulated rather than short-circuiting; afterwards
    /// the workflow is `Idle` (all succeeded) or `PartiallyFailed` with the
    /// unsucceeded proposals and the joined messages.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` when nothing is pending, `AlreadyInProgress`
    /// when a commit is already running, and a `Remote` error joining the
    /// per-proposal messages when some proposals failed.
    pub async fn commit_all(&self) -> Result<(), OrchestrationError> {
        let (chapter_id, proposals) = {
            let state = self.state_lock();
            match &*state {
                SplitState::ReviewReady {
                    chapter_id,
                    proposals,
                } => (*chapter_id, proposals.clone()),
                SplitState::PartiallyFailed {
                    chapter_id,
                    remaining,
                    ..
                } => (*chapter_id, remaining.clone()),
                _ => {
                    return Err(OrchestrationError::InvalidState(
                        "no split proposals to commit".into(),
                    ));
                }
            }
        };

        let key = OpKey::split(chapter_id);
        let epoch = self.workspace.registry().try_begin(&key)?;
        *self.state_lock() = SplitState::Committing { chapter_id };
        let token = self.workspace.guard().start(lanes::SPLIT);

        let mut failed: Vec<(SceneProposal, String)> = Vec::new();
        for proposal in proposals {
            if !self.workspace.guard().is_current(&token) {
                // Superseded mid-commit; stop issuing creates.
                debug!(chapter_id = %chapter_id, "split commit abandoned mid-run");
                self.release_if_abandoned(&key, epoch);
                return Ok(());
            }
            match self
                .workspace
                .create_scene(chapter_id, &proposal.title, &proposal.content)
                .await
            {
                Ok(Some(_)) => {}
                // The owning context was torn down; the loop has no home
                // for further results.
                Ok(None) => {
                    self.release_if_abandoned(&key, epoch);
                    return Ok(());
                }
                Err(err) => failed.push((proposal, err.to_string())),
            }
        }

        if !self.workspace.guard().is_current(&token) {
            self.release_if_abandoned(&key, epoch);
            return Ok(());
        }

        if failed.is_empty() {
            self.workspace.registry().end(&key, None);
            *self.state_lock() = SplitState::Idle;
            Ok(())
        } else {
            let errors: Vec<String> = failed.iter().map(|(_, msg)| msg.clone()).collect();
            let remaining: Vec<SceneProposal> =
                failed.into_iter().map(|(proposal, _)| proposal).collect();
            let err = OrchestrationError::Remote(errors.join("; "));
            self.workspace.registry().end(&key, Some(err.clone()));
            *self.state_lock() = SplitState::PartiallyFailed {
                chapter_id,
                remaining,
                errors,
            };
            Err(err)
        }
    }

    /// Drops the proposals and returns to `Idle` from any state.
    /// Idempotent; no remote call. An in-flight split or commit is marked
    /// stale so its remaining work is abandoned.
    pub fn discard(&self) {
        let mut state = self.state_lock();
        match &*state {
            SplitState::Splitting { chapter_id } | SplitState::Committing { chapter_id } => {
                self.workspace.registry().end(&OpKey::split(*chapter_id), None);
                self.workspace.guard().cancel(lanes::SPLIT);
            }
            _ => {}
        }
        *state = SplitState::Idle;
    }

    /// Releases the busy key after a stale resolution. An explicit discard
    /// has already ended the key and reset the state; a project-switch
    /// teardown has done neither, so this attempt still owns both.
    fn release_if_abandoned(&self, key: &OpKey, epoch: u64) {
        if self.workspace.registry().end_if_current(key, epoch, None) {
            *self.state_lock() = SplitState::Idle;
        }
    }

    fn state_lock(&self) -> MutexGuard<'_, SplitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Applies the error-as-success screen to a split response.
///
/// The upstream quirk returns a single error-shaped body, never a mixed
/// list, so only a one-element response is screened.
fn screen_proposals(
    proposals: Vec<SceneProposal>,
) -> Result<Vec<SceneProposal>, GatewayError> {
    if proposals.is_empty() {
        return Err(GatewayError::Remote {
            detail: "the splitter returned no scenes".into(),
        });
    }
    if let [only] = proposals.as_slice() {
        screen_ai_payload(&only.title, &only.content)?;
    }
    Ok(proposals)
}
