// ABOUTME: Error type for the settings endpoint and its HTTP mapping
// ABOUTME: Unauthorized callers get an empty 403, everything else a success/failure envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use keel_security::NonceError;
use keel_settings::StorageError;
use thiserror::Error;
use tracing::error;

use crate::response::SettingsResult;

#[derive(Debug, Error)]
pub enum EndpointError {
    /// Caller lacks the capability; the request ends without a body
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Integrity token rejected: {0}")]
    IntegrityTokenInvalid(#[from] NonceError),

    #[error("Invalid request payload: {0}")]
    InvalidPayload(String),

    #[error("Storage error")]
    Storage(#[from] StorageError),
}

impl EndpointError {
    fn to_status(&self) -> StatusCode {
        match self {
            EndpointError::Unauthorized => StatusCode::FORBIDDEN,
            EndpointError::IntegrityTokenInvalid(_) => StatusCode::FORBIDDEN,
            EndpointError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            EndpointError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to send back to the caller
    pub fn to_user_message(&self) -> String {
        match self {
            EndpointError::Unauthorized => String::new(),
            EndpointError::IntegrityTokenInvalid(_) => {
                "The link you followed has expired. Reload the page and try again".to_string()
            }
            EndpointError::InvalidPayload(msg) => format!("Invalid request: {}", msg),
            EndpointError::Storage(_) => "Settings storage is unavailable".to_string(),
        }
    }
}

impl IntoResponse for EndpointError {
    fn into_response(self) -> Response {
        let status = self.to_status();

        if let EndpointError::Storage(ref e) = self {
            error!(error = %e, "Settings storage failure");
        }

        if matches!(self, EndpointError::Unauthorized) {
            return status.into_response();
        }

        (status, Json(SettingsResult::failure(self.to_user_message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_bytes(response: Response) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    #[tokio::test]
    async fn test_unauthorized_has_empty_body() {
        let response = EndpointError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_integrity_failure_uses_envelope() {
        let response = EndpointError::IntegrityTokenInvalid(NonceError::Invalid).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let json: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["message"].as_str().unwrap().contains("expired"));
    }

    #[tokio::test]
    async fn test_storage_failure_hides_details() {
        let response =
            EndpointError::Storage(StorageError::NotInitialized("secret_name".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(!body.contains("secret_name"));
        assert!(body.contains("Settings storage is unavailable"));
    }
}
