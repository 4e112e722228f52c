//! Fake persistence collaborators.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Semaphore;
use uuid::Uuid;

use storyforge_core::error::GatewayError;
use storyforge_core::gateway::{CompileOptions, PersistenceGateway};
use storyforge_core::model::{Chapter, Character, Project, Scene};

use crate::gate::{self, HoldHandle};

fn remote(detail: &str) -> GatewayError {
    GatewayError::Remote {
        detail: detail.to_string(),
    }
}

#[derive(Debug, Default)]
struct StoreState {
    projects: HashMap<Uuid, Project>,
    chapters: HashMap<Uuid, Chapter>,
    scenes: HashMap<Uuid, Scene>,
    characters: HashMap<Uuid, Character>,
}

#[derive(Debug, Default)]
struct Faults {
    always: HashMap<String, GatewayError>,
    on_call: HashMap<(String, u32), GatewayError>,
    counters: HashMap<String, u32>,
}

/// An in-memory fake of the persistence collaborator.
///
/// Behaves like the remote store: assigns ids, echoes confirmed orders, and
/// returns canonical entities. Tests can seed state directly, inject
/// failures per operation (always or on the nth call), and hold operations
/// open to exercise in-flight windows.
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    state: Mutex<StoreState>,
    faults: Mutex<Faults>,
    holds: Mutex<HashMap<String, HoldHandle>>,
    calls: Mutex<Vec<String>>,
}

impl InMemoryPersistence {
    /// Creates an empty fake store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a project and returns it.
    pub fn seed_project(&self, name: &str) -> Project {
        let project = Project {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        self.state_lock()
            .projects
            .insert(project.id, project.clone());
        project
    }

    /// Seeds a chapter and returns it.
    pub fn seed_chapter(&self, project_id: Uuid, title: &str, order: u32) -> Chapter {
        let chapter = Chapter {
            id: Uuid::new_v4(),
            project_id,
            title: title.to_string(),
            order,
        };
        self.state_lock()
            .chapters
            .insert(chapter.id, chapter.clone());
        chapter
    }

    /// Seeds a scene and returns it.
    pub fn seed_scene(&self, chapter_id: Uuid, title: &str, order: u32, content: &str) -> Scene {
        let scene = Scene {
            id: Uuid::new_v4(),
            chapter_id,
            title: title.to_string(),
            order,
            content: content.to_string(),
        };
        self.state_lock().scenes.insert(scene.id, scene.clone());
        scene
    }

    /// Seeds a character and returns it.
    pub fn seed_character(&self, project_id: Uuid, name: &str) -> Character {
        let character = Character {
            id: Uuid::new_v4(),
            project_id,
            name: name.to_string(),
        };
        self.state_lock()
            .characters
            .insert(character.id, character.clone());
        character
    }

    /// Makes every future call to `op` fail with `error`.
    pub fn fail_always(&self, op: &str, error: GatewayError) {
        self.faults_lock().always.insert(op.to_string(), error);
    }

    /// Makes the `nth` call (1-based) to `op` fail with `error`.
    pub fn fail_on_call(&self, op: &str, nth: u32, error: GatewayError) {
        self.faults_lock()
            .on_call
            .insert((op.to_string(), nth), error);
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

    /// All recorded operation names, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls_lock().clone()
    }

    /// Scenes currently stored for `chapter_id`, sorted by order.
    #[must_use]
    pub fn stored_scenes(&self, chapter_id: Uuid) -> Vec<Scene> {
        let mut scenes: Vec<Scene> = self
            .state_lock()
            .scenes
            .values()
            .filter(|s| s.chapter_id == chapter_id)
            .cloned()
            .collect();
        scenes.sort_by_key(|s| s.order);
        scenes
    }

    /// Records the call, waits on any hold, and applies injected failures.
    async fn enter(&self, op: &str) -> Result<(), GatewayError> {
        self.calls_lock().push(op.to_string());
        let gate: Option<Arc<Semaphore>> =
            self.holds_lock().get(op).map(HoldHandle::semaphore);
        gate::wait(gate).await;

        let mut faults = self.faults_lock();
        let count = faults.counters.entry(op.to_string()).or_insert(0);
        *count += 1;
        let nth = *count;
        if let Some(error) = faults.on_call.remove(&(op.to_string(), nth)) {
            return Err(error);
        }
        if let Some(error) = faults.always.get(op) {
            return Err(error.clone());
        }
        Ok(())
    }

    fn state_lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn faults_lock(&self) -> MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn holds_lock(&self) -> MutexGuard<'_, HashMap<String, HoldHandle>> {
        self.holds.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn calls_lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryPersistence {
    async fn get_project(&self, id: Uuid) -> Result<Project, GatewayError> {
        self.enter("get_project").await?;
        self.state_lock()
            .projects
            .get(&id)
            .cloned()
            .ok_or_else(|| remote("project not found"))
    }

    async fn update_project(&self, id: Uuid, name: &str) -> Result<Project, GatewayError> {
        self.enter("update_project").await?;
        let mut state = self.state_lock();
        let project = state
            .projects
            .get_mut(&id)
            .ok_or_else(|| remote("project not found"))?;
        project.name = name.to_string();
        Ok(project.clone())
    }

    async fn list_chapters(&self, project_id: Uuid) -> Result<Vec<Chapter>, GatewayError> {
        self.enter("list_chapters").await?;
        let mut chapters: Vec<Chapter> = self
            .state_lock()
            .chapters
            .values()
            .filter(|c| c.project_id == project_id)
            .cloned()
            .collect();
        chapters.sort_by_key(|c| c.order);
        Ok(chapters)
    }

    async fn create_chapter(
        &self,
        project_id: Uuid,
        title: &str,
        order: u32,
    ) -> Result<Chapter, GatewayError> {
        self.enter("create_chapter").await?;
        let chapter = Chapter {
            id: Uuid::new_v4(),
            project_id,
            title: title.to_string(),
            order,
        };
        self.state_lock()
            .chapters
            .insert(chapter.id, chapter.clone());
        Ok(chapter)
    }

    async fn update_chapter(
        &self,
        _project_id: Uuid,
        chapter_id: Uuid,
        title: &str,
        order: u32,
    ) -> Result<Chapter, GatewayError> {
        self.enter("update_chapter").await?;
        let mut state = self.state_lock();
        let chapter = state
            .chapters
            .get_mut(&chapter_id)
            .ok_or_else(|| remote("chapter not found"))?;
        chapter.title = title.to_string();
        chapter.order = order;
        Ok(chapter.clone())
    }

    async fn delete_chapter(
        &self,
        project_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<(), GatewayError> {
        self.enter("delete_chapter").await?;
        let mut state = self.state_lock();
        if state.chapters.remove(&chapter_id).is_none() {
            return Err(remote("chapter not found"));
        }
        state.scenes.retain(|_, s| s.chapter_id != chapter_id);
        // The canonical store keeps sibling orders dense.
        let mut siblings: Vec<&mut Chapter> = state
            .chapters
            .values_mut()
            .filter(|c| c.project_id == project_id)
            .collect();
        siblings.sort_by_key(|c| c.order);
        for (index, chapter) in siblings.into_iter().enumerate() {
            chapter.order = u32::try_from(index + 1).unwrap_or(u32::MAX);
        }
        Ok(())
    }

    async fn list_scenes(
        &self,
        _project_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<Vec<Scene>, GatewayError> {
        self.enter("list_scenes").await?;
        Ok(self.stored_scenes(chapter_id))
    }

    async fn create_scene(
        &self,
        _project_id: Uuid,
        chapter_id: Uuid,
        title: &str,
        order: u32,
        content: &str,
    ) -> Result<Scene, GatewayError> {
        self.enter("create_scene").await?;
        let scene = Scene {
            id: Uuid::new_v4(),
            chapter_id,
            title: title.to_string(),
            order,
            content: content.to_string(),
        };
        self.state_lock().scenes.insert(scene.id, scene.clone());
        Ok(scene)
    }

    async fn delete_scene(
        &self,
        _project_id: Uuid,
        chapter_id: Uuid,
        scene_id: Uuid,
    ) -> Result<(), GatewayError> {
        self.enter("delete_scene").await?;
        let mut state = self.state_lock();
        if state.scenes.remove(&scene_id).is_none() {
            return Err(remote("scene not found"));
        }
        // The canonical store keeps sibling orders dense.
        let mut siblings: Vec<&mut Scene> = state
            .scenes
            .values_mut()
            .filter(|s| s.chapter_id == chapter_id)
            .collect();
        siblings.sort_by_key(|s| s.order);
        for (index, scene) in siblings.into_iter().enumerate() {
            scene.order = u32::try_from(index + 1).unwrap_or(u32::MAX);
        }
        Ok(())
    }

    async fn list_characters(&self, project_id: Uuid) -> Result<Vec<Character>, GatewayError> {
        self.enter("list_characters").await?;
        let mut characters: Vec<Character> = self
            .state_lock()
            .characters
            .values()
            .filter(|c| c.project_id == project_id)
            .cloned()
            .collect();
        characters.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(characters)
    }

    async fn create_character(
        &self,
        project_id: Uuid,
        name: &str,
    ) -> Result<Character, GatewayError> {
        self.enter("create_character").await?;
        let character = Character {
            id: Uuid::new_v4(),
            project_id,
            name: name.to_string(),
        };
        self.state_lock()
            .characters
            .insert(character.id, character.clone());
        Ok(character)
    }

    async fn delete_character(
        &self,
        _project_id: Uuid,
        character_id: Uuid,
    ) -> Result<(), GatewayError> {
        self.enter("delete_character").await?;
        if self.state_lock().characters.remove(&character_id).is_none() {
            return Err(remote("character not found"));
        }
        Ok(())
    }

    async fn rebuild_project_index(&self, _project_id: Uuid) -> Result<(), GatewayError> {
        self.enter("rebuild_project_index").await
    }

    async fn compile_chapter_content(
        &self,
        _project_id: Uuid,
        chapter_id: Uuid,
        options: &CompileOptions,
    ) -> Result<String, GatewayError> {
        self.enter("compile_chapter_content").await?;
        let scenes = self.stored_scenes(chapter_id);
        let parts: Vec<String> = scenes
            .iter()
            .map(|s| {
                if options.include_titles {
                    format!("{}\n{}", s.title, s.content)
                } else {
                    s.content.clone()
                }
            })
            .collect();
        Ok(parts.join(&options.separator))
    }
}

/// A persistence collaborator that fails every operation.
#[derive(Debug, Default)]
pub struct FailingPersistence;

#[async_trait]
impl PersistenceGateway for FailingPersistence {
    async fn get_project(&self, _id: Uuid) -> Result<Project, GatewayError> {
        Err(remote("connection refused"))
    }

    async fn update_project(&self, _id: Uuid, _name: &str) -> Result<Project, GatewayError> {
        Err(remote("connection refused"))
    }

    async fn list_chapters(&self, _project_id: Uuid) -> Result<Vec<Chapter>, GatewayError> {
        Err(remote("connection refused"))
    }

    async fn create_chapter(
        &self,
        _project_id: Uuid,
        _title: &str,
        _order: u32,
    ) -> Result<Chapter, GatewayError> {
        Err(remote("connection refused"))
    }

    async fn update_chapter(
        &self,
        _project_id: Uuid,
        _chapter_id: Uuid,
        _title: &str,
        _order: u32,
    ) -> Result<Chapter, GatewayError> {
        Err(remote("connection refused"))
    }

    async fn delete_chapter(
        &self,
        _project_id: Uuid,
        _chapter_id: Uuid,
    ) -> Result<(), GatewayError> {
        Err(remote("connection refused"))
    }

    async fn list_scenes(
        &self,
        _project_id: Uuid,
        _chapter_id: Uuid,
    ) -> Result<Vec<Scene>, GatewayError> {
        Err(remote("connection refused"))
    }

    async fn create_scene(
        &self,
        _project_id: Uuid,
        _chapter_id: Uuid,
        _title: &str,
        _order: u32,
        _content: &str,
    ) -> Result<Scene, GatewayError> {
        Err(remote("connection refused"))
    }

    async fn delete_scene(
        &self,
        _project_id: Uuid,
        _chapter_id: Uuid,
        _scene_id: Uuid,
    ) -> Result<(), GatewayError> {
        Err(remote("connection refused"))
    }

    async fn list_characters(&self, _project_id: Uuid) -> Result<Vec<Character>, GatewayError> {
        Err(remote("connection refused"))
    }

    async fn create_character(
        &self,
        _project_id: Uuid,
        _name: &str,
    ) -> Result<Character, GatewayError> {
        Err(remote("connection refused"))
    }

    async fn delete_character(
        &self,
        _project_id: Uuid,
        _character_id: Uuid,
    ) -> Result<(), GatewayError> {
        Err(remote("connection refused"))
    }

    async fn rebuild_project_index(&self, _project_id: Uuid) -> Result<(), GatewayError> {
        Err(remote("connection refused"))
    }

    async fn compile_chapter_content(
        &self,
        _project_id: Uuid,
        _chapter_id: Uuid,
        _options: &CompileOptions,
    ) -> Result<String, GatewayError> {
        Err(remote("connection refused"))
    }
}
