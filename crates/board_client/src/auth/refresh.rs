use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, Result};

pub(crate) const REFRESH_PATH: &str = "/auth/token/refresh/";

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
}

/// Exchanges a refresh token for a new access token.
///
/// Uses its own client without the bearer layer so the refresh call never
/// carries an access token and can never trigger another refresh.
#[derive(Clone)]
pub struct TokenRefresher {
    client: ClientWithMiddleware,
    url: String,
}

impl TokenRefresher {
    pub fn new(client: ClientWithMiddleware, api_base: &str) -> Self {
        Self {
            client,
            url: format!("{}{}", api_base.trim_end_matches('/'), REFRESH_PATH),
        }
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<String> {
        debug!("Refreshing access token");
        let response = self
            .client
            .post(&self.url)
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_response(status, &body));
        }

        let body = response.bytes().await?;
        let parsed: RefreshResponse = serde_json::from_slice(&body)
            .map_err(|e| ApiError::Decode(format!("refresh response: {e}")))?;
        if parsed.access.trim().is_empty() {
            return Err(ApiError::Decode("refresh response has an empty access token".to_string()));
        }
        Ok(parsed.access)
    }
}
