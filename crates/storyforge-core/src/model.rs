//! Domain entities for writing projects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A writing project. The client holds at most one in memory at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Server-assigned identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
}

/// A chapter within a project.
///
/// `order` is a positive integer, unique and dense (1..N, no gaps) within
/// the owning project; ascending order is narrative sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Server-assigned identifier.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// Chapter title.
    pub title: String,
    /// Dense 1..N position within the project.
    pub order: u32,
}

/// A scene within a chapter. Same density invariant as `Chapter::order`,
/// scoped to `chapter_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// Server-assigned identifier.
    pub id: Uuid,
    /// Owning chapter.
    pub chapter_id: Uuid,
    /// Scene title.
    pub title: String,
    /// Dense 1..N position within the chapter.
    pub order: u32,
    /// Scene prose.
    pub content: String,
}

/// A named character belonging to a project. Display-sorted by name;
/// characters carry no ordering invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Server-assigned identifier.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// Character name.
    pub name: String,
}

/// An AI-generated scene candidate. Ephemeral: lives only inside the draft
/// workflow and becomes a `Scene` on explicit commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneDraft {
    /// Chapter the draft targets.
    pub chapter_id: Uuid,
    /// Proposed title, free-editable before commit.
    pub title: String,
    /// Proposed prose, free-editable before commit.
    pub content: String,
    /// Source references the generator drew on.
    pub sources: Vec<String>,
}

/// One element of an AI-proposed chapter split. Ephemeral: lives only
/// inside the split workflow until bulk commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneProposal {
    /// Proposed scene title.
    pub title: String,
    /// Proposed scene prose.
    pub content: String,
}
