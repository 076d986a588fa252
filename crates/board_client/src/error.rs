use reqwest::StatusCode;
use session_manager::SessionError;
use thiserror::Error;

/// Client-side API error.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("network: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("session expired: {0}")]
    SessionExpired(String),

    #[error("invalid access token: {0}")]
    InvalidToken(String),

    #[error("decode: {0}")]
    Decode(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("middleware: {0}")]
    Middleware(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => StatusCode::from_u16(*status).ok(),
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Build a status error from a response body, preferring the API's `detail` text.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = extract_detail(body)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        ApiError::Status {
            status: status.as_u16(),
            message,
        }
    }

    /// Map a failed `POST /auth/token/` into the session layer's taxonomy.
    pub(crate) fn into_login_error(self) -> SessionError {
        match self {
            ApiError::Status { status, message } if (400..500).contains(&status) => {
                SessionError::InvalidCredentials(message)
            }
            other => other.into(),
        }
    }
}

impl From<ApiError> for SessionError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Transport(e) => SessionError::Transport(e.to_string()),
            ApiError::SessionExpired(message) => SessionError::SessionExpired(message),
            ApiError::Status { message, .. } => SessionError::Api(message),
            other => SessionError::Api(other.to_string()),
        }
    }
}

impl From<reqwest_middleware::Error> for ApiError {
    fn from(error: reqwest_middleware::Error) -> Self {
        match error {
            reqwest_middleware::Error::Reqwest(e) => ApiError::Transport(e),
            reqwest_middleware::Error::Middleware(inner) => match inner.downcast::<ApiError>() {
                Ok(api_error) => api_error,
                Err(other) => ApiError::Middleware(other.to_string()),
            },
        }
    }
}

/// Pull a human readable message out of an error body.
///
/// Handles `{"detail": "..."}` and field error maps such as
/// `{"username": ["already exists"]}`.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
        return Some(detail.to_string());
    }

    let object = value.as_object()?;
    let messages: Vec<String> = object
        .iter()
        .filter_map(|(field, errors)| {
            let first = match errors {
                serde_json::Value::Array(items) => items.first()?.as_str()?.to_string(),
                serde_json::Value::String(s) => s.clone(),
                _ => return None,
            };
            Some(if field == "non_field_errors" {
                first
            } else {
                format!("{field}: {first}")
            })
        })
        .collect();

    if messages.is_empty() {
        None
    } else {
        Some(messages.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_field_wins() {
        assert_eq!(
            extract_detail(r#"{"detail": "Given token not valid for any token type"}"#).as_deref(),
            Some("Given token not valid for any token type")
        );
    }

    #[test]
    fn field_errors_are_flattened() {
        assert_eq!(
            extract_detail(r#"{"username": ["A user with that username already exists."]}"#)
                .as_deref(),
            Some("username: A user with that username already exists.")
        );
        assert_eq!(
            extract_detail(r#"{"non_field_errors": ["You have already applied for this job."]}"#)
                .as_deref(),
            Some("You have already applied for this job.")
        );
    }

    #[test]
    fn non_json_bodies_fall_back_to_reason() {
        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert_eq!(err.to_string(), "Bad Gateway");
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
    }

    #[test]
    fn login_rejections_become_invalid_credentials() {
        let err = ApiError::from_response(
            StatusCode::UNAUTHORIZED,
            r#"{"detail": "No active account found with the given credentials"}"#,
        );
        assert!(err.is_unauthorized());
        assert!(matches!(
            err.into_login_error(),
            SessionError::InvalidCredentials(m) if m == "No active account found with the given credentials"
        ));

        let server_error = ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert!(matches!(
            server_error.into_login_error(),
            SessionError::Api(_)
        ));
    }

    #[test]
    fn session_expiry_survives_conversion() {
        let converted: SessionError = ApiError::SessionExpired("refresh rejected".to_string()).into();
        assert!(matches!(converted, SessionError::SessionExpired(_)));
    }
}
