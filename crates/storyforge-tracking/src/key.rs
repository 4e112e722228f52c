//! Busy keys identifying the resource/operation pair an async mutation owns.

use std::fmt;

use uuid::Uuid;

/// A string key identifying the resource/operation pair serialized by the
/// [`OperationRegistry`](crate::OperationRegistry).
///
/// Keys are stable and visible to the rendering layer, which uses them for
/// per-row busy/error lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpKey(String);

impl OpKey {
    /// Mutations of the project record itself.
    #[must_use]
    pub fn project(id: Uuid) -> Self {
        Self(format!("project:{id}"))
    }

    /// Chapter list load for a project.
    #[must_use]
    pub fn chapters_load(project_id: Uuid) -> Self {
        Self(format!("chapters:load:{project_id}"))
    }

    /// Chapter creation within a project.
    #[must_use]
    pub fn chapter_create(project_id: Uuid) -> Self {
        Self(format!("chapter:create:{project_id}"))
    }

    /// Mutations of one chapter.
    #[must_use]
    pub fn chapter(id: Uuid) -> Self {
        Self(format!("chapter:{id}"))
    }

    /// Scene list load for a chapter.
    #[must_use]
    pub fn scenes_load(chapter_id: Uuid) -> Self {
        Self(format!("scenes:load:{chapter_id}"))
    }

    /// Scene creation within a chapter.
    #[must_use]
    pub fn scene_create(chapter_id: Uuid) -> Self {
        Self(format!("scene:create:{chapter_id}"))
    }

    /// Mutations of one scene.
    #[must_use]
    pub fn scene(id: Uuid) -> Self {
        Self(format!("scene:{id}"))
    }

    /// Character list load for a project.
    #[must_use]
    pub fn characters_load(project_id: Uuid) -> Self {
        Self(format!("characters:load:{project_id}"))
    }

    /// Character creation within a project.
    #[must_use]
    pub fn character_create(project_id: Uuid) -> Self {
        Self(format!("character:create:{project_id}"))
    }

    /// Mutations of one character.
    #[must_use]
    pub fn character(id: Uuid) -> Self {
        Self(format!("character:{id}"))
    }

    /// Scene-draft generation for a chapter.
    #[must_use]
    pub fn generate(chapter_id: Uuid) -> Self {
        Self(format!("generate:{chapter_id}"))
    }

    /// Chapter split for a chapter.
    #[must_use]
    pub fn split(chapter_id: Uuid) -> Self {
        Self(format!("split:{chapter_id}"))
    }

    /// Chapter compilation.
    #[must_use]
    pub fn compile(chapter_id: Uuid) -> Self {
        Self(format!("compile:{chapter_id}"))
    }

    /// Project index rebuild.
    #[must_use]
    pub fn rebuild(project_id: Uuid) -> Self {
        Self(format!("rebuild:{project_id}"))
    }

    /// Rephrase requests for a project.
    #[must_use]
    pub fn rephrase(project_id: Uuid) -> Self {
        Self(format!("rephrase:{project_id}"))
    }

    /// Reconstructs a key from its rendered form, for lookups that arrive
    /// as strings (e.g. an HTTP query parameter).
    #[must_use]
    pub fn raw(key: &str) -> Self {
        Self(key.to_string())
    }

    /// The key as seen by the rendering layer.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_formats_are_stable() {
        let id = Uuid::nil();
        assert_eq!(OpKey::generate(id).as_str(), format!("generate:{id}"));
        assert_eq!(OpKey::split(id).as_str(), format!("split:{id}"));
        assert_eq!(OpKey::compile(id).as_str(), format!("compile:{id}"));
    }

    #[test]
    fn test_same_resource_yields_equal_keys() {
        let id = Uuid::new_v4();
        assert_eq!(OpKey::chapter(id), OpKey::chapter(id));
        assert_ne!(OpKey::chapter(id), OpKey::scene(id));
    }
}
