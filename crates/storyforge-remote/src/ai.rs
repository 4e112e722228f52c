//! HTTP client for the AI content service.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use storyforge_core::error::GatewayError;
use storyforge_core::gateway::{AiGateway, DraftPayload, DraftRequest, RephraseRequest};
use storyforge_core::model::SceneProposal;

use crate::client::{decode, normalize_base_url, transport};

#[derive(Debug, Serialize)]
struct SplitBody<'a> {
    raw_text: &'a str,
}

#[derive(Debug, Deserialize)]
struct RephraseResponse {
    suggestions: Vec<String>,
}

/// AI collaborator backed by the remote HTTP content service.
///
/// Responses are returned unscreened; the workflows apply the
/// error-as-success screen after staleness checks.
#[derive(Debug, Clone)]
pub struct HttpAiGateway {
    client: Client,
    base_url: String,
}

impl HttpAiGateway {
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
impl AiGateway for HttpAiGateway {
    #[instrument(skip(self, request))]
    async fn generate_scene_draft(
        &self,
        project_id: Uuid,
        chapter_id: Uuid,
        request: &DraftRequest,
    ) -> Result<DraftPayload, GatewayError> {
        let response = self
            .client
            .post(self.url(&format!(
                "/projects/{project_id}/chapters/{chapter_id}/draft"
            )))
            .json(request)
            .send()
            .await
            .map_err(|err| transport(&err))?;
        decode(response).await
    }

    #[instrument(skip(self, raw_text))]
    async fn split_chapter_into_scenes(
        &self,
        project_id: Uuid,
        chapter_id: Uuid,
        raw_text: &str,
    ) -> Result<Vec<SceneProposal>, GatewayError> {
        let response = self
            .client
            .post(self.url(&format!(
                "/projects/{project_id}/chapters/{chapter_id}/split"
            )))
            .json(&SplitBody { raw_text })
            .send()
            .await
            .map_err(|err| transport(&err))?;
        decode(response).await
    }

    #[instrument(skip(self, request))]
    async fn rephrase_text(
        &self,
        project_id: Uuid,
        request: &RephraseRequest,
    ) -> Result<Vec<String>, GatewayError> {
        let response = self
            .client
            .post(self.url(&format!("/projects/{project_id}/rephrase")))
            .json(request)
            .send()
            .await
            .map_err(|err| transport(&err))?;
        let body: RephraseResponse = decode(response).await?;
        Ok(body.suggestions)
    }
}
