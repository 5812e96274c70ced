//! Request extractors that reject with the `AppError` JSON envelope.
//!
//! axum's own `Path` and `Json` reject with a plain-text body. These wrappers
//! run the same extraction and turn the rejection into
//! `AppError::Validation`, so a bad provider name or malformed body gets the
//! same `{"error":{code,message}}` shape as every other failure.

use axum::extract::{
    FromRequest, FromRequestParts,
    rejection::{JsonRejection, PathRejection},
};

use crate::error::AppError;

/// `axum::Json` with an `AppError` rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` with an `AppError` rejection.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{credential::UpdateCredentialRequest, provider::Provider};
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        routing::{get, patch},
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn provider_name(ApiPath(provider): ApiPath<Provider>) -> String {
        provider.to_string()
    }

    async fn patch_key(
        ApiPath(_key_id): ApiPath<Uuid>,
        ApiJson(_request): ApiJson<UpdateCredentialRequest>,
    ) -> StatusCode {
        StatusCode::OK
    }

    fn app() -> Router {
        Router::new()
            .route("/providers/{provider}", get(provider_name))
            .route("/keys/{id}", patch(patch_key))
    }

    async fn error_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unknown_provider_is_a_json_validation_error() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/providers/whatsapp")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = error_body(response).await;
        assert_eq!(body["error"]["code"], "validation_error");
        assert!(body["error"]["message"].is_string());
    }

    #[tokio::test]
    async fn known_provider_passes_through() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/providers/gemini")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn bad_uuid_and_malformed_body_use_the_envelope() {
        let bad_id = app()
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri("/keys/not-a-uuid")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"is_active":false}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(bad_id).await["error"]["code"], "validation_error");

        let bad_body = app()
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri(format!("/keys/{}", Uuid::new_v4()))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(bad_body.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(bad_body).await["error"]["code"], "validation_error");
    }
}
