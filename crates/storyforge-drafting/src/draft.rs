//! Scene-draft generation workflow.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;
use uuid::Uuid;

use storyforge_core::error::{OrchestrationError, require_non_blank};
use storyforge_core::gateway::{AiGateway, DraftRequest};
use storyforge_core::model::{Scene, SceneDraft};
use storyforge_core::screen::screen_ai_payload;
use storyforge_store::Workspace;
use storyforge_tracking::{OpKey, lanes};

/// Where the draft workflow currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftState {
    /// Nothing in progress.
    Idle,
    /// An AI generation request is in flight for the chapter.
    Generating {
        /// Target chapter.
        chapter_id: Uuid,
    },
    /// A draft is ready for review and free editing.
    ReviewReady {
        /// Target chapter.
        chapter_id: Uuid,
        /// The editable draft.
        draft: SceneDraft,
        /// Error from the most recent failed commit attempt, if any. The
        /// draft is preserved so the user can retry without re-generating.
        commit_error: Option<OrchestrationError>,
    },
    /// The reviewed draft is being persisted as a scene.
    Committing {
        /// Target chapter.
        chapter_id: Uuid,
        /// The draft being persisted.
        draft: SceneDraft,
    },
    /// Generation failed.
    Failed {
        /// Target chapter.
        chapter_id: Uuid,
        /// What went wrong.
        error: OrchestrationError,
    },
}

/// Two-phase state machine for "generate a scene via AI, review, commit or
/// discard".
///
/// Idle → Generating → ReviewReady → (Committing → Idle | back to
/// ReviewReady on commit failure); Failed on generation failure; discard
/// from any state returns to Idle.
pub struct DraftWorkflow {
    ai: Arc<dyn AiGateway>,
    workspace: Arc<Workspace>,
    state: Mutex<DraftState>,
}

impl DraftWorkflow {
    /// Creates an idle workflow.
    #[must_use]
    pub fn new(ai: Arc<dyn AiGateway>, workspace: Arc<Workspace>) -> Self {
        Self {
            ai,
            workspace,
            state: Mutex::new(DraftState::Idle),
        }
    }

    /// Snapshot of the current state for the rendering layer.
    #[must_use]
    pub fn state(&self) -> DraftState {
        self.state_lock().clone()
    }

    /// Starts generating a draft for `chapter_id`.
    ///
    /// Rejected with `AlreadyInProgress` while a generation for the chapter
    /// is in flight, and with `InvalidState` while a draft is under review
    /// or committing (it must be committed or discarded first).
    ///
    /// # Errors
    ///
    /// Also propagates validation failures and collaborator errors; a
    /// response that is an error disguised as content is screened and
    /// reported as `Remote` or `RateLimited`.
    pub async fn generate(
        &self,
        chapter_id: Uuid,
        prompt_summary: &str,
        sources: Vec<String>,
    ) -> Result<(), OrchestrationError> {
        require_non_blank("prompt summary", prompt_summary)?;
        let project_id = self.workspace.active_project_id()?;

        let key = OpKey::generate(chapter_id);
        let epoch = self.workspace.registry().try_begin(&key)?;

        {
            let mut state = self.state_lock();
            match &*state {
                DraftState::Idle | DraftState::Failed { .. } => {
                    *state = DraftState::Generating { chapter_id };
                }
                _ => {
                    drop(state);
                    self.workspace.registry().end(&key, None);
                    return Err(OrchestrationError::InvalidState(
                        "a draft is already under review".into(),
                    ));
                }
            }
        }

        let previous_scene_order = self
            .workspace
            .scene_count(chapter_id)
            .and_then(|count| u32::try_from(count).ok())
            .filter(|count| *count > 0);
        let request = DraftRequest {
            prompt_summary: prompt_summary.to_string(),
            previous_scene_order,
            sources,
        };

        let token = self.workspace.guard().start(lanes::GENERATE);
        let result = self
            .ai
            .generate_scene_draft(project_id, chapter_id, &request)
            .await;

        if !self.workspace.guard().is_current(&token) {
            debug!(chapter_id = %chapter_id, "dropping stale draft response");
            // An explicit discard has already released the key; a
            // project-switch teardown has not, and also leaves this
            // workflow frozen in Generating.
            if self
                .workspace
                .registry()
                .end_if_current(&key, epoch, None)
            {
                *self.state_lock() = DraftState::Idle;
            }
            return Ok(());
        }

        let screened = result.and_then(|payload| {
            screen_ai_payload(&payload.title, &payload.content)?;
            Ok(payload)
        });
        match screened {
            Ok(payload) => {
                self.workspace.registry().end(&key, None);
                *self.state_lock() = DraftState::ReviewReady {
                    chapter_id,
                    draft: SceneDraft {
                        chapter_id,
                        title: payload.title,
                        content: payload.content,
                        sources: payload.sources,
                    },
                    commit_error: None,
                };
                Ok(())
            }
            Err(err) => {
                let err = OrchestrationError::from(err);
                self.workspace.registry().end(&key, Some(err.clone()));
                *self.state_lock() = DraftState::Failed {
                    chapter_id,
                    error: err.clone(),
                };
                Err(err)
            }
        }
    }

    /// Free-edits the draft under review in place. No remote call.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` when no draft is under review.
    pub fn edit(
        &self,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<(), OrchestrationError> {
        let mut state = self.state_lock();
        match &mut *state {
            DraftState::ReviewReady {
                draft,
                commit_error,
                ..
            } => {
                if let Some(title) = title {
                    draft.title = title.to_string();
                }
                if let Some(content) = content {
                    draft.content = content.to_string();
                }
                *commit_error = None;
                Ok(())
            }
            _ => Err(OrchestrationError::InvalidState(
                "no draft under review".into(),
            )),
        }
    }

    /// Persists the reviewed draft as a scene at the end of its chapter.
    ///
    /// On failure the workflow returns to `ReviewReady` with the error
    /// attached and the draft preserved, so commit can be retried without
    /// re-generating.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` when no draft is under review; otherwise
    /// propagates the scene-creation failure.
    pub async fn commit(&self) -> Result<Option<Scene>, OrchestrationError> {
        let (chapter_id, draft) = {
            let mut state = self.state_lock();
            match &*state {
                DraftState::ReviewReady {
                    chapter_id, draft, ..
                } => {
                    let chapter_id = *chapter_id;
                    let draft = draft.clone();
                    *state = DraftState::Committing {
                        chapter_id,
                        draft: draft.clone(),
                    };
                    (chapter_id, draft)
                }
                _ => {
                    return Err(OrchestrationError::InvalidState(
                        "no draft under review".into(),
                    ));
                }
            }
        };

        match self
            .workspace
            .create_scene(chapter_id, &draft.title, &draft.content)
            .await
        {
            Ok(scene) => {
                let mut state = self.state_lock();
                if matches!(&*state, DraftState::Committing { .. }) {
                    *state = DraftState::Idle;
                }
                Ok(scene)
            }
            Err(err) => {
                let mut state = self.state_lock();
                if let DraftState::Committing { chapter_id, draft } = &*state {
                    *state = DraftState::ReviewReady {
                        chapter_id: *chapter_id,
                        draft: draft.clone(),
                        commit_error: Some(err.clone()),
                    };
                }
                Err(err)
            }
        }
    }

    /// Drops the draft and returns to `Idle` from any state. Idempotent; no
    /// remote call. An in-flight generation is marked stale so its eventual
    /// response is ignored.
    pub fn discard(&self) {
        let mut state = self.state_lock();
        if let DraftState::Generating { chapter_id } = &*state {
            self.workspace
                .registry()
                .end(&OpKey::generate(*chapter_id), None);
            self.workspace.guard().cancel(lanes::GENERATE);
        }
        *state = DraftState::Idle;
    }

    fn state_lock(&self) -> MutexGuard<'_, DraftState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
