//! HTTP client for the persistence service.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use storyforge_core::error::GatewayError;
use storyforge_core::gateway::{CompileOptions, PersistenceGateway};
use storyforge_core::model::{Chapter, Character, Project, Scene};

use crate::client::{accept, decode, normalize_base_url, transport};

#[derive(Debug, Serialize)]
struct ProjectBody<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct ChapterBody<'a> {
    title: &'a str,
    order: u32,
}

#[derive(Debug, Serialize)]
struct SceneBody<'a> {
    title: &'a str,
    order: u32,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CharacterBody<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompiledDocument {
    content: String,
}

/// Persistence collaborator backed by the remote HTTP store.
#[derive(Debug, Clone)]
pub struct HttpPersistenceGateway {
    client: Client,
    base_url: String,
}

impl HttpPersistenceGateway {
    /// Creates a gateway rooted at `base_url`.
    #[must_use]
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl PersistenceGateway for HttpPersistenceGateway {
    #[instrument(skip(self))]
    async fn get_project(&self, id: Uuid) -> Result<Project, GatewayError> {
        let response = self
            .client
            .get(self.url(&format!("/projects/{id}")))
            .send()
            .await
            .map_err(|err| transport(&err))?;
        decode(response).await
    }

    #[instrument(skip(self, name))]
    async fn update_project(&self, id: Uuid, name: &str) -> Result<Project, GatewayError> {
        let response = self
            .client
            .put(self.url(&format!("/projects/{id}")))
            .json(&ProjectBody { name })
            .send()
            .await
            .map_err(|err| transport(&err))?;
        decode(response).await
    }

    #[instrument(skip(self))]
    async fn list_chapters(&self, project_id: Uuid) -> Result<Vec<Chapter>, GatewayError> {
        let response = self
            .client
            .get(self.url(&format!("/projects/{project_id}/chapters")))
            .send()
            .await
            .map_err(|err| transport(&err))?;
        decode(response).await
    }

    #[instrument(skip(self, title))]
    async fn create_chapter(
        &self,
        project_id: Uuid,
        title: &str,
        order: u32,
    ) -> Result<Chapter, GatewayError> {
        let response = self
            .client
            .post(self.url(&format!("/projects/{project_id}/chapters")))
            .json(&ChapterBody { title, order })
            .send()
            .await
            .map_err(|err| transport(&err))?;
        decode(response).await
    }

    #[instrument(skip(self, title))]
    async fn update_chapter(
        &self,
        project_id: Uuid,
        chapter_id: Uuid,
        title: &str,
        order: u32,
    ) -> Result<Chapter, GatewayError> {
        let response = self
            .client
            .put(self.url(&format!("/projects/{project_id}/chapters/{chapter_id}")))
            .json(&ChapterBody { title, order })
            .send()
            .await
            .map_err(|err| transport(&err))?;
        decode(response).await
    }

    #[instrument(skip(self))]
    async fn delete_chapter(
        &self,
        project_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<(), GatewayError> {
        let response = self
            .client
            .delete(self.url(&format!("/projects/{project_id}/chapters/{chapter_id}")))
            .send()
            .await
            .map_err(|err| transport(&err))?;
        accept(response).await
    }

    #[instrument(skip(self))]
    async fn list_scenes(
        &self,
        project_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<Vec<Scene>, GatewayError> {
        let response = self
            .client
            .get(self.url(&format!(
                "/projects/{project_id}/chapters/{chapter_id}/scenes"
            )))
            .send()
            .await
            .map_err(|err| transport(&err))?;
        decode(response).await
    }

    #[instrument(skip(self, title, content))]
    async fn create_scene(
        &self,
        project_id: Uuid,
        chapter_id: Uuid,
        title: &str,
        order: u32,
        content: &str,
    ) -> Result<Scene, GatewayError> {
        let response = self
            .client
            .post(self.url(&format!(
                "/projects/{project_id}/chapters/{chapter_id}/scenes"
            )))
            .json(&SceneBody {
                title,
                order,
                content,
            })
            .send()
            .await
            .map_err(|err| transport(&err))?;
        decode(response).await
    }

    #[instrument(skip(self))]
    async fn delete_scene(
        &self,
        project_id: Uuid,
        chapter_id: Uuid,
        scene_id: Uuid,
    ) -> Result<(), GatewayError> {
        let response = self
            .client
            .delete(self.url(&format!(
                "/projects/{project_id}/chapters/{chapter_id}/scenes/{scene_id}"
            )))
            .send()
            .await
            .map_err(|err| transport(&err))?;
        accept(response).await
    }

    #[instrument(skip(self))]
    async fn list_characters(&self, project_id: Uuid) -> Result<Vec<Character>, GatewayError> {
        let response = self
            .client
            .get(self.url(&format!("/projects/{project_id}/characters")))
            .send()
            .await
            .map_err(|err| transport(&err))?;
        decode(response).await
    }

    #[instrument(skip(self, name))]
    async fn create_character(
        &self,
        project_id: Uuid,
        name: &str,
    ) -> Result<Character, GatewayError> {
        let response = self
            .client
            .post(self.url(&format!("/projects/{project_id}/characters")))
            .json(&CharacterBody { name })
            .send()
            .await
            .map_err(|err| transport(&err))?;
        decode(response).await
    }

    #[instrument(skip(self))]
    async fn delete_character(
        &self,
        project_id: Uuid,
        character_id: Uuid,
    ) -> Result<(), GatewayError> {
        let response = self
            .client
            .delete(self.url(&format!(
                "/projects/{project_id}/characters/{character_id}"
            )))
            .send()
            .await
            .map_err(|err| transport(&err))?;
        accept(response).await
    }

    #[instrument(skip(self))]
    async fn rebuild_project_index(&self, project_id: Uuid) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.url(&format!("/projects/{project_id}/index/rebuild")))
            .send()
            .await
            .map_err(|err| transport(&err))?;
        accept(response).await
    }

    #[instrument(skip(self, options))]
    async fn compile_chapter_content(
        &self,
        project_id: Uuid,
        chapter_id: Uuid,
        options: &CompileOptions,
    ) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(self.url(&format!(
                "/projects/{project_id}/chapters/{chapter_id}/compile"
            )))
            .json(options)
            .send()
            .await
            .map_err(|err| transport(&err))?;
        let document: CompiledDocument = decode(response).await?;
        Ok(document.content)
    }
}
