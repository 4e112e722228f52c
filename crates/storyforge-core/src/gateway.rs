//! Remote collaborator abstractions.
//!
//! The orchestration core consumes two external services: a persistence
//! service owning the canonical Projects/Chapters/Scenes/Characters, and an
//! AI content service for drafting and splitting. Both are modeled as
//! object-safe async traits so tests can substitute fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GatewayError;
use crate::model::{Chapter, Character, Project, Scene, SceneProposal};

/// Parameters for an AI scene-draft generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRequest {
    /// Short summary of what the scene should contain.
    pub prompt_summary: String,
    /// Order of the last existing sibling scene, if any, so the generator
    /// can continue from it.
    pub previous_scene_order: Option<u32>,
    /// Source references the generator may draw on.
    pub sources: Vec<String>,
}

/// Raw payload returned by the draft generator, before screening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftPayload {
    /// Generated title.
    pub title: String,
    /// Generated prose.
    pub content: String,
    /// Sources the generator reports having used.
    pub sources: Vec<String>,
}

/// Parameters for a rephrase request over a text selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RephraseRequest {
    /// The text to rephrase.
    pub selected_text: String,
    /// Prose immediately before the selection.
    pub context_before: String,
    /// Prose immediately after the selection.
    pub context_after: String,
}

/// Options for compiling a chapter's scenes into one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Whether scene titles are included as headings.
    pub include_titles: bool,
    /// Separator inserted between scenes.
    pub separator: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            include_titles: true,
            separator: "\n\n".to_string(),
        }
    }
}

/// The remote persistence service. Every operation returns the canonical
/// entity (server-assigned id, confirmed order) or a `GatewayError`.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Fetches a project by id.
    async fn get_project(&self, id: Uuid) -> Result<Project, GatewayError>;

    /// Renames a project.
    async fn update_project(&self, id: Uuid, name: &str) -> Result<Project, GatewayError>;

    /// Lists a project's chapters in server order.
    async fn list_chapters(&self, project_id: Uuid) -> Result<Vec<Chapter>, GatewayError>;

    /// Creates a chapter at the given position.
    async fn create_chapter(
        &self,
        project_id: Uuid,
        title: &str,
        order: u32,
    ) -> Result<Chapter, GatewayError>;

    /// Updates a chapter's title and position.
    async fn update_chapter(
        &self,
        project_id: Uuid,
        chapter_id: Uuid,
        title: &str,
        order: u32,
    ) -> Result<Chapter, GatewayError>;

    /// Deletes a chapter.
    async fn delete_chapter(&self, project_id: Uuid, chapter_id: Uuid)
    -> Result<(), GatewayError>;

    /// Lists a chapter's scenes in server order.
    async fn list_scenes(
        &self,
        project_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<Vec<Scene>, GatewayError>;

    /// Creates a scene at the given position.
    async fn create_scene(
        &self,
        project_id: Uuid,
        chapter_id: Uuid,
        title: &str,
        order: u32,
        content: &str,
    ) -> Result<Scene, GatewayError>;

    /// Deletes a scene.
    async fn delete_scene(
        &self,
        project_id: Uuid,
        chapter_id: Uuid,
        scene_id: Uuid,
    ) -> Result<(), GatewayError>;

    /// Lists a project's characters.
    async fn list_characters(&self, project_id: Uuid) -> Result<Vec<Character>, GatewayError>;

    /// Creates a character.
    async fn create_character(
        &self,
        project_id: Uuid,
        name: &str,
    ) -> Result<Character, GatewayError>;

    /// Deletes a character.
    async fn delete_character(
        &self,
        project_id: Uuid,
        character_id: Uuid,
    ) -> Result<(), GatewayError>;

    /// Rebuilds the project's server-side search index.
    async fn rebuild_project_index(&self, project_id: Uuid) -> Result<(), GatewayError>;

    /// Compiles a chapter's scenes into a single document.
    async fn compile_chapter_content(
        &self,
        project_id: Uuid,
        chapter_id: Uuid,
        options: &CompileOptions,
    ) -> Result<String, GatewayError>;
}

/// The remote AI content service.
#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Generates a scene draft for a chapter.
    async fn generate_scene_draft(
        &self,
        project_id: Uuid,
        chapter_id: Uuid,
        request: &DraftRequest,
    ) -> Result<DraftPayload, GatewayError>;

    /// Splits raw pasted chapter text into proposed scenes.
    async fn split_chapter_into_scenes(
        &self,
        project_id: Uuid,
        chapter_id: Uuid,
        raw_text: &str,
    ) -> Result<Vec<SceneProposal>, GatewayError>;

    /// Suggests rephrasings for a text selection.
    async fn rephrase_text(
        &self,
        project_id: Uuid,
        request: &RephraseRequest,
    ) -> Result<Vec<String>, GatewayError>;
}
