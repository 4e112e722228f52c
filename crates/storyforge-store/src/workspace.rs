//! The per-project resource store.
//!
//! `Workspace` owns the in-memory collections for the active project and is
//! the only code that mutates them. Every mutating operation follows the
//! same shape: synchronous validation, fail-fast busy-key acquisition,
//! awaited remote call with no lock held, then a liveness check before the
//! confirmed entity is applied.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;
use uuid::Uuid;

use storyforge_core::error::{GatewayError, OrchestrationError, require_non_blank};
use storyforge_core::gateway::{CompileOptions, PersistenceGateway};
use storyforge_core::model::{Chapter, Character, Project, Scene};
use storyforge_tracking::{OpKey, OperationRegistry, TaskGuard, TaskToken, lanes};

use crate::ordered::OrderedCollection;

#[derive(Debug, Default)]
struct WorkspaceState {
    project: Option<Project>,
    chapters: OrderedCollection<Chapter>,
    scenes: HashMap<Uuid, OrderedCollection<Scene>>,
    characters: Vec<Character>,
}

/// CRUD façade over the persistence collaborator for the active project.
///
/// Mutating methods return `Ok(None)` (or `Ok(true)` for deletes) when the
/// resolution arrived after its context was superseded: the remote call
/// completed but the result was dropped without touching state. Stale
/// resolutions are never reported as errors.
pub struct Workspace {
    persistence: Arc<dyn PersistenceGateway>,
    registry: Arc<OperationRegistry>,
    guard: Arc<TaskGuard>,
    state: Mutex<WorkspaceState>,
}

impl Workspace {
    /// Creates a workspace with no active project.
    #[must_use]
    pub fn new(
        persistence: Arc<dyn PersistenceGateway>,
        registry: Arc<OperationRegistry>,
        guard: Arc<TaskGuard>,
    ) -> Self {
        Self {
            persistence,
            registry,
            guard,
            state: Mutex::new(WorkspaceState::default()),
        }
    }

    /// The registry tracking this workspace's operations.
    #[must_use]
    pub fn registry(&self) -> &Arc<OperationRegistry> {
        &self.registry
    }

    /// The guard tracking this workspace's async work.
    #[must_use]
    pub fn guard(&self) -> &Arc<TaskGuard> {
        &self.guard
    }

    // ---- project ----------------------------------------------------------

    /// Switches the active project: tears down all in-flight async work for
    /// the previous project, clears state, and fetches the new project.
    ///
    /// # Errors
    ///
    /// Propagates `AlreadyInProgress` and collaborator failures.
    pub async fn open_project(&self, id: Uuid) -> Result<Option<Project>, OrchestrationError> {
        self.guard.cancel_all();
        *self.state_lock() = WorkspaceState::default();

        let key = OpKey::project(id);
        self.registry.try_begin(&key)?;
        let token = self.guard.start(lanes::PROJECT);
        let result = self.persistence.get_project(id).await;
        match self.settle(&key, &token, result)? {
            Some(project) => {
                self.state_lock().project = Some(project.clone());
                Ok(Some(project))
            }
            None => Ok(None),
        }
    }

    /// Renames the active project.
    ///
    /// # Errors
    ///
    /// Rejects blank names before any remote call; propagates busy-key and
    /// collaborator failures.
    pub async fn rename_project(&self, name: &str) -> Result<Option<Project>, OrchestrationError> {
        require_non_blank("project name", name)?;
        let project_id = self.active_project_id()?;

        let key = OpKey::project(project_id);
        self.registry.try_begin(&key)?;
        let token = self.guard.start(key.as_str());
        let result = self.persistence.update_project(project_id, name).await;
        match self.settle(&key, &token, result)? {
            Some(project) => {
                self.state_lock().project = Some(project.clone());
                Ok(Some(project))
            }
            None => Ok(None),
        }
    }

    /// Snapshot of the active project.
    #[must_use]
    pub fn project(&self) -> Option<Project> {
        self.state_lock().project.clone()
    }

    // ---- chapters ---------------------------------------------------------

    /// Loads the active project's chapters, replacing the collection. A
    /// resolution superseded by a newer load is dropped.
    ///
    /// # Errors
    ///
    /// Propagates busy-key and collaborator failures.
    pub async fn load_chapters(&self) -> Result<(), OrchestrationError> {
        let project_id = self.active_project_id()?;
        let key = OpKey::chapters_load(project_id);
        self.registry.try_begin(&key)?;
        let token = self.guard.start(lanes::CHAPTERS);
        let result = self.persistence.list_chapters(project_id).await;
        if let Some(chapters) = self.settle(&key, &token, result)? {
            self.state_lock().chapters.replace_all(chapters);
        }
        Ok(())
    }

    /// Creates a chapter at the end of the project.
    ///
    /// # Errors
    ///
    /// Rejects blank titles before any remote call; propagates busy-key and
    /// collaborator failures. Failed creates never appear in the collection.
    pub async fn create_chapter(&self, title: &str) -> Result<Option<Chapter>, OrchestrationError> {
        require_non_blank("chapter title", title)?;
        let project_id = self.active_project_id()?;
        let order = self.state_lock().chapters.next_order();

        let key = OpKey::chapter_create(project_id);
        self.registry.try_begin(&key)?;
        let token = self.guard.start(key.as_str());
        let result = self
            .persistence
            .create_chapter(project_id, title, order)
            .await;
        match self.settle(&key, &token, result)? {
            Some(mut chapter) => {
                let mut state = self.state_lock();
                // A sibling delete may have reindexed while the call was in
                // flight; append at the current end and let the next list
                // load reconcile with the server.
                chapter.order = state.chapters.next_order();
                state.chapters.insert(chapter.clone());
                Ok(Some(chapter))
            }
            None => Ok(None),
        }
    }

    /// Renames a chapter, keeping its position.
    ///
    /// # Errors
    ///
    /// Rejects blank titles and unknown chapters before any remote call;
    /// propagates busy-key and collaborator failures.
    pub async fn rename_chapter(
        &self,
        chapter_id: Uuid,
        title: &str,
    ) -> Result<Option<Chapter>, OrchestrationError> {
        require_non_blank("chapter title", title)?;
        let project_id = self.active_project_id()?;
        let order = self
            .state_lock()
            .chapters
            .get(chapter_id)
            .map(|c| c.order)
            .ok_or_else(|| OrchestrationError::InvalidState("unknown chapter".into()))?;

        let key = OpKey::chapter(chapter_id);
        self.registry.try_begin(&key)?;
        let token = self.guard.start(key.as_str());
        let result = self
            .persistence
            .update_chapter(project_id, chapter_id, title, order)
            .await;
        match self.settle(&key, &token, result)? {
            Some(chapter) => {
                self.state_lock()
                    .chapters
                    .update(chapter_id, |c| *c = chapter.clone());
                Ok(Some(chapter))
            }
            None => Ok(None),
        }
    }

    /// Deletes a chapter after the caller-supplied confirmation predicate
    /// agrees. Returns `Ok(false)` — no remote call, no state change, no
    /// error — when the predicate declines.
    ///
    /// # Errors
    ///
    /// Propagates busy-key and collaborator failures.
    pub async fn delete_chapter(
        &self,
        chapter_id: Uuid,
        confirm: impl FnOnce() -> bool + Send,
    ) -> Result<bool, OrchestrationError> {
        let project_id = self.active_project_id()?;
        if !confirm() {
            return Ok(false);
        }

        let key = OpKey::chapter(chapter_id);
        self.registry.try_begin(&key)?;
        let token = self.guard.start(key.as_str());
        let result = self.persistence.delete_chapter(project_id, chapter_id).await;
        if self.settle(&key, &token, result)?.is_some() {
            let mut state = self.state_lock();
            state.chapters.remove_and_reindex(chapter_id);
            state.scenes.remove(&chapter_id);
        }
        Ok(true)
    }

    /// Snapshot of the chapter list.
    #[must_use]
    pub fn chapters(&self) -> Vec<Chapter> {
        self.state_lock().chapters.to_vec()
    }

    // ---- scenes -----------------------------------------------------------

    /// Loads a chapter's scenes. A newer scene load (for this or any other
    /// chapter) supersedes this one, so switching chapters quickly can never
    /// apply an outdated list.
    ///
    /// # Errors
    ///
    /// Propagates busy-key and collaborator failures.
    pub async fn load_scenes(&self, chapter_id: Uuid) -> Result<(), OrchestrationError> {
        let project_id = self.active_project_id()?;
        let key = OpKey::scenes_load(chapter_id);
        self.registry.try_begin(&key)?;
        let token = self.guard.start(lanes::SCENES);
        let result = self.persistence.list_scenes(project_id, chapter_id).await;
        if let Some(scenes) = self.settle(&key, &token, result)? {
            self.state_lock()
                .scenes
                .entry(chapter_id)
                .or_default()
                .replace_all(scenes);
        }
        Ok(())
    }

    /// Creates a scene at the end of a loaded chapter.
    ///
    /// # Errors
    ///
    /// Rejects blank title/content and unloaded chapters before any remote
    /// call; propagates busy-key and collaborator failures. Failed creates
    /// never appear in the collection.
    pub async fn create_scene(
        &self,
        chapter_id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Option<Scene>, OrchestrationError> {
        require_non_blank("scene title", title)?;
        require_non_blank("scene content", content)?;
        let project_id = self.active_project_id()?;
        let order = self
            .state_lock()
            .scenes
            .get(&chapter_id)
            .map(OrderedCollection::next_order)
            .ok_or_else(|| {
                OrchestrationError::InvalidState("scenes not loaded for chapter".into())
            })?;

        let key = OpKey::scene_create(chapter_id);
        self.registry.try_begin(&key)?;
        let token = self.guard.start(key.as_str());
        let result = self
            .persistence
            .create_scene(project_id, chapter_id, title, order, content)
            .await;
        match self.settle(&key, &token, result)? {
            Some(mut scene) => {
                let mut state = self.state_lock();
                let scenes = state.scenes.entry(chapter_id).or_default();
                // Same reconciliation as chapter creation: siblings may
                // have been reindexed during the await.
                scene.order = scenes.next_order();
                scenes.insert(scene.clone());
                Ok(Some(scene))
            }
            None => Ok(None),
        }
    }

    /// Deletes a scene after confirmation, reindexing its siblings.
    /// Returns `Ok(false)` without side effects when the predicate declines.
    ///
    /// # Errors
    ///
    /// Propagates busy-key and collaborator failures.
    pub async fn delete_scene(
        &self,
        chapter_id: Uuid,
        scene_id: Uuid,
        confirm: impl FnOnce() -> bool + Send,
    ) -> Result<bool, OrchestrationError> {
        let project_id = self.active_project_id()?;
        if !confirm() {
            return Ok(false);
        }

        let key = OpKey::scene(scene_id);
        self.registry.try_begin(&key)?;
        let token = self.guard.start(key.as_str());
        let result = self
            .persistence
            .delete_scene(project_id, chapter_id, scene_id)
            .await;
        if self.settle(&key, &token, result)?.is_some() {
            if let Some(scenes) = self.state_lock().scenes.get_mut(&chapter_id) {
                scenes.remove_and_reindex(scene_id);
            }
        }
        Ok(true)
    }

    /// Snapshot of a chapter's scenes, or `None` if never loaded.
    #[must_use]
    pub fn scenes(&self, chapter_id: Uuid) -> Option<Vec<Scene>> {
        self.state_lock()
            .scenes
            .get(&chapter_id)
            .map(OrderedCollection::to_vec)
    }

    /// Number of loaded scenes for a chapter, or `None` if never loaded.
    #[must_use]
    pub fn scene_count(&self, chapter_id: Uuid) -> Option<usize> {
        self.state_lock()
            .scenes
            .get(&chapter_id)
            .map(OrderedCollection::len)
    }

    // ---- characters -------------------------------------------------------

    /// Loads the active project's characters (display-sorted by name).
    ///
    /// # Errors
    ///
    /// Propagates busy-key and collaborator failures.
    pub async fn load_characters(&self) -> Result<(), OrchestrationError> {
        let project_id = self.active_project_id()?;
        let key = OpKey::characters_load(project_id);
        self.registry.try_begin(&key)?;
        let token = self.guard.start(lanes::CHARACTERS);
        let result = self.persistence.list_characters(project_id).await;
        if let Some(mut characters) = self.settle(&key, &token, result)? {
            characters.sort_by(|a, b| a.name.cmp(&b.name));
            self.state_lock().characters = characters;
        }
        Ok(())
    }

    /// Creates a character.
    ///
    /// # Errors
    ///
    /// Rejects blank names before any remote call; propagates busy-key and
    /// collaborator failures.
    pub async fn create_character(
        &self,
        name: &str,
    ) -> Result<Option<Character>, OrchestrationError> {
        require_non_blank("character name", name)?;
        let project_id = self.active_project_id()?;

        let key = OpKey::character_create(project_id);
        self.registry.try_begin(&key)?;
        let token = self.guard.start(key.as_str());
        let result = self.persistence.create_character(project_id, name).await;
        match self.settle(&key, &token, result)? {
            Some(character) => {
                let mut state = self.state_lock();
                state.characters.push(character.clone());
                state.characters.sort_by(|a, b| a.name.cmp(&b.name));
                Ok(Some(character))
            }
            None => Ok(None),
        }
    }

    /// Deletes a character after confirmation. Returns `Ok(false)` without
    /// side effects when the predicate declines.
    ///
    /// # Errors
    ///
    /// Propagates busy-key and collaborator failures.
    pub async fn delete_character(
        &self,
        character_id: Uuid,
        confirm: impl FnOnce() -> bool + Send,
    ) -> Result<bool, OrchestrationError> {
        let project_id = self.active_project_id()?;
        if !confirm() {
            return Ok(false);
        }

        let key = OpKey::character(character_id);
        self.registry.try_begin(&key)?;
        let token = self.guard.start(key.as_str());
        let result = self
            .persistence
            .delete_character(project_id, character_id)
            .await;
        if self.settle(&key, &token, result)?.is_some() {
            self.state_lock()
                .characters
                .retain(|c| c.id != character_id);
        }
        Ok(true)
    }

    /// Snapshot of the character list.
    #[must_use]
    pub fn characters(&self) -> Vec<Character> {
        self.state_lock().characters.clone()
    }

    // ---- project-wide operations ------------------------------------------

    /// Rebuilds the project's server-side search index. No local state is
    /// touched.
    ///
    /// # Errors
    ///
    /// Propagates busy-key and collaborator failures.
    pub async fn rebuild_index(&self) -> Result<(), OrchestrationError> {
        let project_id = self.active_project_id()?;
        let key = OpKey::rebuild(project_id);
        self.registry.try_begin(&key)?;
        match self.persistence.rebuild_project_index(project_id).await {
            Ok(()) => {
                self.registry.end(&key, None);
                Ok(())
            }
            Err(err) => {
                let err = OrchestrationError::from(err);
                self.registry.end(&key, Some(err.clone()));
                Err(err)
            }
        }
    }

    /// Compiles a chapter's scenes into one document. No local state is
    /// touched.
    ///
    /// # Errors
    ///
    /// Propagates busy-key and collaborator failures.
    pub async fn compile_chapter(
        &self,
        chapter_id: Uuid,
        options: &CompileOptions,
    ) -> Result<String, OrchestrationError> {
        let project_id = self.active_project_id()?;
        let key = OpKey::compile(chapter_id);
        self.registry.try_begin(&key)?;
        match self
            .persistence
            .compile_chapter_content(project_id, chapter_id, options)
            .await
        {
            Ok(compiled) => {
                self.registry.end(&key, None);
                Ok(compiled)
            }
            Err(err) => {
                let err = OrchestrationError::from(err);
                self.registry.end(&key, Some(err.clone()));
                Err(err)
            }
        }
    }

    // ---- internals --------------------------------------------------------

    /// Id of the active project.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` when no project is open.
    pub fn active_project_id(&self) -> Result<Uuid, OrchestrationError> {
        self.state_lock()
            .project
            .as_ref()
            .map(|p| p.id)
            .ok_or_else(|| OrchestrationError::InvalidState("no active project".into()))
    }

    /// Post-resolution bookkeeping shared by every tracked operation: ends
    /// the busy key, drops superseded resolutions (including their errors),
    /// and converts collaborator failures.
    fn settle<T>(
        &self,
        key: &OpKey,
        token: &TaskToken,
        result: Result<T, GatewayError>,
    ) -> Result<Option<T>, OrchestrationError> {
        if !self.guard.is_current(token) {
            self.registry.end(key, None);
            debug!(key = %key, "dropping stale resolution");
            return Ok(None);
        }
        match result {
            Ok(value) => {
                self.registry.end(key, None);
                Ok(Some(value))
            }
            Err(err) => {
                let err = OrchestrationError::from(err);
                self.registry.end(key, Some(err.clone()));
                Err(err)
            }
        }
    }

    fn state_lock(&self) -> MutexGuard<'_, WorkspaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
