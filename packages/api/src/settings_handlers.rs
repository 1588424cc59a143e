// ABOUTME: HTTP request handlers for settings operations
// ABOUTME: Save, reset, read, integrity token issuing and health

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use keel_security::Principal;
use keel_settings::naming::{normalize_priority, to_kebab_case, to_title_case};
use keel_settings::StoredOptions;

use super::auth::CurrentPrincipal;
use super::endpoint::IntegrityNonces;
use super::error::EndpointError;
use super::response::{ApiResponse, SettingsResult};
use super::AppState;

/// Request body for saving settings
#[derive(Debug, Deserialize)]
pub struct SaveSettingsRequest {
    #[serde(default)]
    pub settings: Value,
    #[serde(default)]
    pub nonce: String,
}

/// Request body for resetting settings
#[derive(Debug, Deserialize)]
pub struct ResetSettingsRequest {
    #[serde(default)]
    pub nonce: String,
}

/// Unwrap a JSON body only once the caller is known to be allowed in, so an
/// unauthorized caller never learns anything about what it sent
fn authorized_body<T>(
    state: &AppState,
    principal: &Principal,
    action: &str,
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, EndpointError> {
    state.endpoint.authorize(principal, action)?;
    body.map(|Json(request)| request)
        .map_err(|rejection| EndpointError::InvalidPayload(rejection.body_text()))
}

/// Save the submitted settings
pub async fn save_settings(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    body: Result<Json<SaveSettingsRequest>, JsonRejection>,
) -> Result<Json<SettingsResult>, EndpointError> {
    let action = state.endpoint.save_action().to_string();
    let request = authorized_body(&state, &principal, &action, body)?;

    let result = state
        .endpoint
        .save(&principal, &request.settings, &request.nonce)
        .await?;
    Ok(Json(result))
}

/// Replace the settings with the defaults
pub async fn reset_settings(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    body: Result<Json<ResetSettingsRequest>, JsonRejection>,
) -> Result<Json<SettingsResult>, EndpointError> {
    let action = state.endpoint.reset_action().to_string();
    let request = authorized_body(&state, &principal, &action, body)?;

    let result = state.endpoint.reset(&principal, &request.nonce).await?;
    Ok(Json(result))
}

/// Get the stored settings with their version
pub async fn get_settings(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<Json<ApiResponse<StoredOptions>>, EndpointError> {
    info!(principal = %principal.id, "Getting settings");

    let stored = state.endpoint.options(&principal).await?;
    Ok(Json(ApiResponse::success(stored)))
}

/// Issue integrity tokens for the settings form
pub async fn get_nonces(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<Json<ApiResponse<IntegrityNonces>>, EndpointError> {
    let nonces = state.endpoint.issue_nonces(&principal)?;
    Ok(Json(ApiResponse::success(nonces)))
}

pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    let option_name = state.endpoint.store().name();

    Json(ApiResponse::success(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "option_name": option_name,
        "menu": {
            "slug": to_kebab_case(option_name),
            "title": to_title_case(option_name),
            "priority": normalize_priority(state.menu_priority),
        }
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_router, SettingsEndpoint};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use keel_security::{hash_token, IntegrityTokens};
    use keel_settings::{MemoryOptionsBackend, OptionsStore, SettingsDocument};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    const ADMIN_TOKEN: &str = "test-admin-token";

    fn defaults() -> SettingsDocument {
        serde_json::from_value(json!({"general": {"site_title": "Keel"}, "enabled": true}))
            .unwrap()
    }

    async fn setup_state(menu_priority: i32) -> AppState {
        let store = OptionsStore::new(
            Arc::new(MemoryOptionsBackend::new()),
            "keel_settings",
            defaults(),
        );
        store.init().await.unwrap();
        let tokens = IntegrityTokens::new(b"handler-test-secret", Duration::from_secs(600)).unwrap();
        AppState::new(
            SettingsEndpoint::new(store, Arc::new(tokens)),
            Some(hash_token(ADMIN_TOKEN)),
            menu_priority,
        )
    }

    fn app(state: AppState) -> Router {
        create_router(state)
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn read_body(response: axum::response::Response) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    async fn read_json(response: axum::response::Response) -> Value {
        serde_json::from_slice(&read_body(response).await).unwrap()
    }

    async fn fetch_nonces(state: &AppState) -> Value {
        let response = app(state.clone())
            .oneshot(get("/api/settings/nonces", Some(ADMIN_TOKEN)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        read_json(response).await["data"].clone()
    }

    #[tokio::test]
    async fn test_health_reports_menu() {
        let state = setup_state(5000).await;
        let response = app(state).oneshot(get("/api/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = read_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["option_name"], "keel_settings");
        assert_eq!(json["data"]["menu"]["slug"], "keel-settings");
        assert_eq!(json["data"]["menu"]["title"], "Keel Settings");
        assert_eq!(json["data"]["menu"]["priority"], 1000);
    }

    #[tokio::test]
    async fn test_save_round_trip_over_http() {
        let state = setup_state(10).await;
        let nonces = fetch_nonces(&state).await;

        let response = app(state.clone())
            .oneshot(post(
                "/api/settings",
                Some(ADMIN_TOKEN),
                json!({
                    "settings": {"general": {"site_title": " <i>New</i> title "}, "enabled": "0"},
                    "nonce": nonces["save"]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            read_json(response).await,
            json!({"success": true, "message": "Settings saved"})
        );

        let response = app(state)
            .oneshot(get("/api/settings", Some(ADMIN_TOKEN)))
            .await
            .unwrap();
        let json = read_json(response).await;
        assert_eq!(json["data"]["version"], 2);
        assert_eq!(json["data"]["updated_by"], "admin");
        assert_eq!(
            json["data"]["settings"],
            json!({"general": {"site_title": "New title"}, "enabled": 0})
        );
    }

    #[tokio::test]
    async fn test_reset_over_http() {
        let state = setup_state(10).await;
        let nonces = fetch_nonces(&state).await;

        app(state.clone())
            .oneshot(post(
                "/api/settings",
                Some(ADMIN_TOKEN),
                json!({"settings": {"x": "y"}, "nonce": nonces["save"]}),
            ))
            .await
            .unwrap();

        let response = app(state.clone())
            .oneshot(post(
                "/api/settings/reset",
                Some(ADMIN_TOKEN),
                json!({"nonce": nonces["reset"]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(
            state.endpoint.store().get_options().await.unwrap(),
            defaults()
        );
    }

    #[tokio::test]
    async fn test_unauthorized_routes_return_empty_forbidden() {
        let state = setup_state(10).await;

        let requests = vec![
            get("/api/settings", None),
            get("/api/settings/nonces", Some("wrong-token")),
            post("/api/settings", None, json!({"settings": {"a": 1}, "nonce": "x"})),
            post("/api/settings/reset", Some("wrong-token"), json!({"nonce": "x"})),
        ];

        for request in requests {
            let response = app(state.clone()).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
            assert!(read_body(response).await.is_empty());
        }

        assert_eq!(state.endpoint.store().current().await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_unauthorized_malformed_body_is_still_silent() {
        let state = setup_state(10).await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/settings")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(read_body(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_bad_nonce_over_http() {
        let state = setup_state(10).await;

        let response = app(state.clone())
            .oneshot(post(
                "/api/settings",
                Some(ADMIN_TOKEN),
                json!({"settings": {"enabled": false}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let json = read_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(state.endpoint.store().current().await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_admin_malformed_body_is_bad_request() {
        let state = setup_state(10).await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/settings/reset")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_TOKEN))
            .body(Body::from("{not json"))
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await["success"], false);
    }
}
