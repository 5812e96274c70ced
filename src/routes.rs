//! HTTP router.
//!
//! Public routes need no token. Everything under `/api/v1` passes through the
//! bearer token middleware; admin checks happen per operation.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{db::DbPool, handlers, middleware};

/// Build the application router around a database pool.
pub fn build_router(pool: DbPool) -> Router {
    let authenticated_routes = Router::new()
        // Key acquisition (any authenticated caller)
        .route(
            "/api/v1/providers/{provider}/keys/active",
            get(handlers::keys::active_key),
        )
        .route(
            "/api/v1/providers/{provider}/keys/acquire",
            post(handlers::keys::acquire_key),
        )
        .route(
            "/api/v1/keys/{id}/usage",
            post(handlers::keys::record_usage),
        )
        // Credential administration (admin only)
        .route(
            "/api/v1/providers/{provider}/keys",
            post(handlers::credentials::create_credential)
                .get(handlers::credentials::list_credentials),
        )
        .route(
            "/api/v1/providers/{provider}/usage",
            get(handlers::credentials::usage_summary),
        )
        .route(
            "/api/v1/providers/{provider}/reset",
            post(handlers::credentials::reset_provider),
        )
        .route(
            "/api/v1/keys/{id}",
            patch(handlers::credentials::update_credential)
                .delete(handlers::credentials::delete_credential),
        )
        .route(
            "/api/v1/keys/{id}/reset",
            post(handlers::credentials::reset_credential),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            pool.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    fn app() -> Router {
        let pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(50))
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .unwrap();
        build_router(pool)
    }

    #[tokio::test]
    async fn api_requires_bearer_token() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/providers/brevo/keys/acquire")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_rejected() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/v1/keys/550e8400-e29b-41d4-a716-446655440000")
                    .header("Authorization", "Basic YWRtaW46YWRtaW4=")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let response = app()
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
