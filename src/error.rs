use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream request failed: {0}")]
    UpstreamRequestFailed(#[from] reqwest::Error),

    #[error("{service} returned status {status}")]
    UpstreamRejected {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} returned an unexpected response: {details}")]
    UpstreamMalformed {
        service: &'static str,
        details: String,
    },

    #[error("No games found for this profile")]
    NoGamesFound { data: Value },

    #[error("Steam API key is not configured")]
    MissingApiKey,

    #[error("Enrichment failed: {0}")]
    EnrichmentFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Message suitable for showing to the person who submitted the profile
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidInput(_) => "Enter a valid Steam ID or profile URL.".to_string(),
            AppError::NoGamesFound { .. } => "No games found for this profile.".to_string(),
            AppError::UpstreamRejected { status, .. } => format!(
                "Steam rejected the request (status {}). The profile may be private or may not exist.",
                status
            ),
            AppError::UpstreamRequestFailed(_) => {
                "Could not reach Steam. Please try again.".to_string()
            }
            AppError::UpstreamMalformed { .. } => {
                "Steam returned an unexpected response.".to_string()
            }
            AppError::MissingApiKey => {
                "Steam lookups are not configured on this server.".to_string()
            }
            AppError::EnrichmentFailed(_) => {
                "Recommendations are unavailable right now.".to_string()
            }
            AppError::NotFound(msg) | AppError::Internal(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match &self {
            AppError::UpstreamRejected { status, body, .. } => json!({
                "error": self.to_string(),
                "status": status,
                "details": body,
            }),
            AppError::UpstreamMalformed { details, .. } => json!({
                "error": self.to_string(),
                "details": details,
            }),
            AppError::NoGamesFound { data } => json!({
                "error": self.to_string(),
                "data": data,
            }),
            AppError::UpstreamRequestFailed(e) => json!({
                "error": "Upstream request failed",
                "details": e.to_string(),
            }),
            AppError::InvalidInput(msg) | AppError::NotFound(msg) => json!({ "error": msg }),
            _ => json!({ "error": self.to_string() }),
        };

        let status = match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::NoGamesFound { .. } => StatusCode::NOT_FOUND,
            AppError::UpstreamRequestFailed(_)
            | AppError::UpstreamRejected { .. }
            | AppError::UpstreamMalformed { .. }
            | AppError::EnrichmentFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::MissingApiKey | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_is_bad_request() {
        let response = AppError::InvalidInput("steamId is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_failures_are_bad_gateway() {
        let rejected = AppError::UpstreamRejected {
            service: "Steam",
            status: 403,
            body: "Forbidden".to_string(),
        };
        assert_eq!(rejected.into_response().status(), StatusCode::BAD_GATEWAY);

        let malformed = AppError::UpstreamMalformed {
            service: "Steam",
            details: "expected value".to_string(),
        };
        assert_eq!(malformed.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_no_games_found_is_not_found() {
        let response = AppError::NoGamesFound { data: json!({"response": {}}) }.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_user_messages_distinguish_failures() {
        let rejected = AppError::UpstreamRejected {
            service: "Steam",
            status: 401,
            body: String::new(),
        };
        assert!(rejected.user_message().contains("status 401"));
        assert_eq!(
            AppError::NoGamesFound { data: Value::Null }.user_message(),
            "No games found for this profile."
        );
        assert_ne!(
            AppError::MissingApiKey.user_message(),
            AppError::EnrichmentFailed("down".to_string()).user_message()
        );
    }
}
