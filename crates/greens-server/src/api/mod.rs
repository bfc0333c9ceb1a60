mod plant_shops;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use greens_core::Environment;
use greens_places::PlacesClient;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id;

#[derive(Clone)]
pub struct AppState {
    pub places: Arc<PlacesClient>,
    pub env: Environment,
}

/// Error body returned by every endpoint.
///
/// The HTTP status is derived from `code`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub code: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthData {
    status: &'static str,
    places_configured: bool,
    timestamp: DateTime<Utc>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            code: code.into(),
            error: error.into(),
            message: None,
            details: None,
            suggestion: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = Some(details);
        self
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Message for an unexpected failure, with detail only in development.
pub(super) fn internal_message(env: Environment, detail: &impl std::fmt::Display) -> String {
    if env.is_development() {
        detail.to_string()
    } else {
        "Internal server error".to_string()
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/plant-shops/nearby",
            get(plant_shops::nearby_plant_shops),
        )
        .route(
            "/api/plant-shops/{place_id}",
            get(plant_shops::plant_shop_details),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthData {
        status: "ok",
        places_configured: state.places.has_api_key(),
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use greens_places::PlacesConfig;
    use wiremock::MockServer;

    use super::*;

    /// An app whose provider calls go to `server`.
    pub(crate) fn app_for(server: &MockServer, api_key: Option<&str>, env: Environment) -> Router {
        let places = PlacesClient::new(&PlacesConfig {
            api_key: api_key.map(ToOwned::to_owned),
            places_base_url: format!("{}/place", server.uri()),
            geocode_base_url: format!("{}/geocode", server.uri()),
            timeout_secs: 5,
            user_agent: "greens-test".to_string(),
        })
        .expect("client");
        build_app(AppState {
            places: Arc::new(places),
            env,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::app_for;
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;
    use wiremock::MockServer;

    #[test]
    fn api_error_codes_map_to_statuses() {
        assert_eq!(
            ApiError::new("validation_error", "bad").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::new("not_found", "gone").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::new("upstream_error", "boom").into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn api_error_omits_empty_optionals() {
        let json = serde_json::to_value(ApiError::new("bad_request", "nope")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "code": "bad_request", "error": "nope"})
        );
    }

    #[test]
    fn internal_message_is_gated_on_environment() {
        let detail = "places status OVER_QUERY_LIMIT";
        assert_eq!(internal_message(Environment::Development, &detail), detail);
        assert_eq!(
            internal_message(Environment::Production, &detail),
            "Internal server error"
        );
    }

    #[tokio::test]
    async fn health_reports_places_configuration() {
        let server = MockServer::start().await;
        let app = app_for(&server, None, Environment::Test);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        assert_eq!(json["status"], "ok");
        assert_eq!(json["placesConfigured"], false);
    }

    #[tokio::test]
    async fn cors_preflight_is_allowed() {
        let server = MockServer::start().await;
        let app = app_for(&server, Some("k"), Environment::Test);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/plant-shops/nearby")
                    .header(header::ORIGIN, "http://localhost:8080")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert!(response.status().is_success());
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }
}
