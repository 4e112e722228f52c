//! Route modules, one per context, nested under `/api/v1`.

use axum::Router;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

pub mod chapters;
pub mod characters;
pub mod draft;
pub mod health;
pub mod ops;
pub mod project;
pub mod rephrase;
pub mod scenes;
pub mod split;

/// Builds the full application router over `state`. Middleware layers are
/// added by the binary.
#[must_use]
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/project", project::router())
        .nest(
            "/api/v1/chapters",
            chapters::router().nest("/{chapter_id}/scenes", scenes::router()),
        )
        .nest("/api/v1/characters", characters::router())
        .nest("/api/v1/draft", draft::router())
        .nest("/api/v1/split", split::router())
        .nest("/api/v1/ops", ops::router())
        .nest("/api/v1/rephrase", rephrase::router())
        .with_state(state)
}

/// Body returned by mutations. `entity` is absent when the owning context
/// was torn down before the collaborator answered; nothing was applied.
#[derive(Debug, Serialize)]
pub struct Mutated<T> {
    /// Whether the result was applied to the workspace.
    pub applied: bool,
    /// The canonical entity, when applied.
    pub entity: Option<T>,
}

impl<T> From<Option<T>> for Mutated<T> {
    fn from(entity: Option<T>) -> Self {
        Self {
            applied: entity.is_some(),
            entity,
        }
    }
}

/// Query flag carrying the caller's deletion confirmation.
#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    /// `true` to confirm the deletion; anything else declines it.
    #[serde(default)]
    pub confirm: bool,
}

/// Body returned by deletions.
#[derive(Debug, Serialize)]
pub struct DeletionOutcome {
    /// Whether the entity was deleted. `false` means the confirmation was
    /// declined and nothing happened.
    pub deleted: bool,
}
