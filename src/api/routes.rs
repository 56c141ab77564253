//! HTTP API route definitions.

use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::docs::{ApiDoc, DOCS_PATH, OPENAPI_PATH};
use super::error::{handle_panic, not_found};
use super::handlers::{
    auth_start, create_space, demo, health, metrics, oauth_callback, AppState,
};
use crate::auth::AuthVariant;

/// Create the API router.
///
/// `/auth` and `/oauth2callback` are mounted only for the OAuth variant.
/// A known path hit with an unsupported method answers like an unknown path.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(health).post(create_space).fallback(not_found))
        .route("/api", get(demo).fallback(not_found))
        .route("/metrics", get(metrics).fallback(not_found));

    if state.auth.variant() == AuthVariant::OAuth {
        router = router
            .route("/auth", get(auth_start).fallback(not_found))
            .route("/oauth2callback", get(oauth_callback).fallback(not_found));
    }

    router
        .merge(SwaggerUi::new(DOCS_PATH).url(OPENAPI_PATH, ApiDoc::openapi()))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::header::{COOKIE, LOCATION, SET_COOKIE};
    use axum::http::{Method, Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;

    const SPACE_JSON: &str = r#"{"name":"spaces/abc","meetingUri":"https://meet.google.com/abc-defg-hij","meetingCode":"abc-defg-hij"}"#;

    fn oauth_state(server_url: &str) -> AppState {
        AppState::new(
            Config::from_vars(vec![
                ("GOOGLE_CLIENT_ID", "client-id".to_string()),
                ("GOOGLE_CLIENT_SECRET", "client-secret".to_string()),
                ("GOOGLE_TOKEN_URL", format!("{server_url}/token")),
                ("MEET_API_URL", format!("{server_url}/v2")),
                ("DEMO_API_URL", format!("{server_url}/demo")),
            ])
            .unwrap(),
        )
        .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> Response {
        app.oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_returns_fixed_message() {
        let app = create_router(oauth_state("http://unused"));

        let response = send(app, get_req("/")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"message": "Meet space service is running"})
        );
    }

    #[tokio::test]
    async fn unmatched_route_returns_404_json() {
        let app = create_router(oauth_state("http://unused"));

        let response = send(app, get_req("/nope")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"message": "Not found"})
        );
    }

    #[tokio::test]
    async fn unsupported_method_returns_404_json() {
        for (method, uri) in [
            (Method::PUT, "/"),
            (Method::DELETE, "/api"),
            (Method::POST, "/auth"),
        ] {
            let app = create_router(oauth_state("http://unused"));

            let response = send(
                app,
                Request::builder()
                    .method(method.clone())
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;

            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {uri}");
            assert_eq!(
                body_json(response).await,
                serde_json::json!({"message": "Not found"})
            );
        }
    }

    #[tokio::test]
    async fn create_space_without_cookie_returns_400() {
        let app = create_router(oauth_state("http://unused"));

        let response = send(
            app,
            Request::builder()
                .method(Method::POST)
                .uri("/")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_space_with_cookie_returns_space() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/spaces")
            .match_header("authorization", "Bearer cookie-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SPACE_JSON)
            .create_async()
            .await;
        let app = create_router(oauth_state(&server.url()));

        let response = send(
            app,
            Request::builder()
                .method(Method::POST)
                .uri("/")
                .header(COOKIE, "access_token=cookie-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["meetingCode"], "abc-defg-hij");
    }

    #[tokio::test]
    async fn meet_failure_returns_500_with_fixed_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v2/spaces")
            .with_status(401)
            .with_body(r#"{"error":{"status":"UNAUTHENTICATED"}}"#)
            .create_async()
            .await;
        let app = create_router(oauth_state(&server.url()));

        let response = send(
            app,
            Request::builder()
                .method(Method::POST)
                .uri("/")
                .header(COOKIE, "access_token=expired")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"message": "Failed to create meeting space"})
        );
    }

    #[tokio::test]
    async fn auth_redirects_to_consent_with_state_cookie() {
        let app = create_router(oauth_state("http://unused"));

        let response = send(app, get_req("/auth")).await;

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let location = response.headers()[LOCATION].to_str().unwrap().to_string();
        assert!(location.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));

        let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        let state = cookie
            .strip_prefix("oauth_state=")
            .and_then(|rest| rest.split(';').next())
            .unwrap();
        assert!(location.contains(&format!("state={state}")));
    }

    #[tokio::test]
    async fn callback_rejects_mismatched_state() {
        let app = create_router(oauth_state("http://unused"));

        let response = send(
            app,
            Request::builder()
                .uri("/oauth2callback?code=abc&state=forged")
                .header(COOKIE, "oauth_state=expected")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn callback_rejects_missing_code() {
        let app = create_router(oauth_state("http://unused"));

        let response = send(
            app,
            Request::builder()
                .uri("/oauth2callback?state=s1")
                .header(COOKIE, "oauth_state=s1")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"message": "Missing authorization code"})
        );
    }

    #[tokio::test]
    async fn callback_sets_token_cookie() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"ya29.fresh","expires_in":3599}"#)
            .create_async()
            .await;
        let app = create_router(oauth_state(&server.url()));

        let response = send(
            app,
            Request::builder()
                .uri("/oauth2callback?code=abc&state=s1")
                .header(COOKIE, "oauth_state=s1")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let cookies: Vec<_> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].starts_with("access_token=ya29.fresh;"));
        assert!(cookies[0].contains("Max-Age=3599"));
        assert!(cookies[1].starts_with("oauth_state=;"));
    }

    #[tokio::test]
    async fn demo_mirrors_upstream_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/demo")
            .with_status(200)
            .create_async()
            .await;
        let app = create_router(oauth_state(&server.url()));

        let response = send(app, get_req("/api")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({"status": 200}));
    }

    #[tokio::test]
    async fn unreachable_demo_api_returns_500() {
        let state = AppState::new(
            Config::from_vars(vec![
                ("GOOGLE_CLIENT_ID", "client-id"),
                ("GOOGLE_CLIENT_SECRET", "client-secret"),
                ("DEMO_API_URL", "http://127.0.0.1:9/"),
            ])
            .unwrap(),
        )
        .unwrap();
        let app = create_router(state);

        let response = send(app, get_req("/api")).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"message": "Failed to reach demo API"})
        );
    }

    #[tokio::test]
    async fn metrics_is_404_without_recorder() {
        let app = create_router(oauth_state("http://unused"));
        let response = send(app, get_req("/metrics")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = create_router(oauth_state("http://unused"));

        let response = send(app, get_req(OPENAPI_PATH)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let doc = body_json(response).await;
        assert_eq!(doc["info"]["title"], "Meet Space Service");
    }
}
