//! Shared request plumbing for the HTTP gateways.

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use storyforge_core::error::GatewayError;

/// Maps a transport-level failure (connect, timeout, body read) to a
/// `Remote` error.
pub(crate) fn transport(err: &reqwest::Error) -> GatewayError {
    GatewayError::Remote {
        detail: err.to_string(),
    }
}

/// Passes successful responses through; turns everything else into a
/// `GatewayError`. `429` classifies as `RateLimited`, any other non-success
/// status as `Remote`, with the response body as the detail.
pub(crate) async fn check(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = if body.trim().is_empty() {
        format!("http status {status}")
    } else {
        body
    };
    if status == StatusCode::TOO_MANY_REQUESTS {
        Err(GatewayError::RateLimited { detail })
    } else {
        Err(GatewayError::Remote { detail })
    }
}

/// Checks the status and decodes the JSON body.
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    check(response)
        .await?
        .json::<T>()
        .await
        .map_err(|err| transport(&err))
}

/// Checks the status and discards the body.
pub(crate) async fn accept(response: Response) -> Result<(), GatewayError> {
    check(response).await.map(|_| ())
}

/// Normalizes a base URL so paths can be appended with a leading slash.
pub(crate) fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}
