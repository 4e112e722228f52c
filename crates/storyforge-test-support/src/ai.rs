//! Fake AI collaborators.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Semaphore;
use uuid::Uuid;

use storyforge_core::error::GatewayError;
use storyforge_core::gateway::{AiGateway, DraftPayload, DraftRequest, RephraseRequest};
use storyforge_core::model::SceneProposal;

use crate::gate::{self, HoldHandle};

fn exhausted(op: &str) -> GatewayError {
    GatewayError::Remote {
        detail: format!("no scripted response for {op}"),
    }
}

#[derive(Debug, Default)]
struct Script {
    drafts: VecDeque<Result<DraftPayload, GatewayError>>,
    splits: VecDeque<Result<Vec<SceneProposal>, GatewayError>>,
    rephrases: VecDeque<Result<Vec<String>, GatewayError>>,
}

/// An AI collaborator that replays scripted responses in push order.
///
/// Each operation pops the next scripted result; an empty queue yields a
/// remote error naming the operation. Operations can be held open to test
/// discard-while-generating windows.
#[derive(Debug, Default)]
pub struct ScriptedAi {
    script: Mutex<Script>,
    holds: Mutex<HashMap<String, HoldHandle>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedAi {
    /// Creates a fake with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the next `generate_scene_draft` result.
    pub fn push_draft(&self, result: Result<DraftPayload, GatewayError>) {
        self.script_lock().drafts.push_back(result);
    }

    /// Queues the next `split_chapter_into_scenes` result.
    pub fn push_split(&self, result: Result<Vec<SceneProposal>, GatewayError>) {
        self.script_lock().splits.push_back(result);
    }

    /// Queues the next `rephrase_text` result.
    pub fn push_rephrase(&self, result: Result<Vec<String>, GatewayError>) {
        self.script_lock().rephrases.push_back(result);
    }

    /// Holds every future call to `op` open until the handle is released.
    pub fn hold(&self, op: &str) -> HoldHandle {
        let handle = HoldHandle::new();
        self.holds_lock().insert(op.to_string(), handle.clone());
        handle
    }

    /// Number of calls made to `op`.
    #[must_use]
    pub fn call_count(&self, op: &str) -> usize {
        self.calls_lock().iter().filter(|c| *c == op).count()
    }

    async fn enter(&self, op: &str) {
        self.calls_lock().push(op.to_string());
        let gate: Option<Arc<Semaphore>> =
            self.holds_lock().get(op).map(HoldHandle::semaphore);
        gate::wait(gate).await;
    }

    fn script_lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn holds_lock(&self) -> MutexGuard<'_, HashMap<String, HoldHandle>> {
        self.holds.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn calls_lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AiGateway for ScriptedAi {
    async fn generate_scene_draft(
        &self,
        _project_id: Uuid,
        _chapter_id: Uuid,
        _request: &DraftRequest,
    ) -> Result<DraftPayload, GatewayError> {
        self.enter("generate_scene_draft").await;
        self.script_lock()
            .drafts
            .pop_front()
            .unwrap_or_else(|| Err(exhausted("generate_scene_draft")))
    }

    async fn split_chapter_into_scenes(
        &self,
        _project_id: Uuid,
        _chapter_id: Uuid,
        _raw_text: &str,
    ) -> Result<Vec<SceneProposal>, GatewayError> {
        self.enter("split_chapter_into_scenes").await;
        self.script_lock()
            .splits
            .pop_front()
            .unwrap_or_else(|| Err(exhausted("split_chapter_into_scenes")))
    }

    async fn rephrase_text(
        &self,
        _project_id: Uuid,
        _request: &RephraseRequest,
    ) -> Result<Vec<String>, GatewayError> {
        self.enter("rephrase_text").await;
        self.script_lock()
            .rephrases
            .pop_front()
            .unwrap_or_else(|| Err(exhausted("rephrase_text")))
    }
}

/// An AI collaborator that fails every operation.
#[derive(Debug, Default)]
pub struct FailingAi;

#[async_trait]
impl AiGateway for FailingAi {
    async fn generate_scene_draft(
        &self,
        _project_id: Uuid,
        _chapter_id: Uuid,
        _request: &DraftRequest,
    ) -> Result<DraftPayload, GatewayError> {
        Err(GatewayError::Remote {
            detail: "connection refused".into(),
        })
    }

    async fn split_chapter_into_scenes(
        &self,
        _project_id: Uuid,
        _chapter_id: Uuid,
        _raw_text: &str,
    ) -> Result<Vec<SceneProposal>, GatewayError> {
        Err(GatewayError::Remote {
            detail: "connection refused".into(),
        })
    }

    async fn rephrase_text(
        &self,
        _project_id: Uuid,
        _request: &RephraseRequest,
    ) -> Result<Vec<String>, GatewayError> {
        Err(GatewayError::Remote {
            detail: "connection refused".into(),
        })
    }
}
