use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::handlers::page::{self, AppState};
use crate::services::QueryPipeline;

/// Create router with application state
pub fn create_router_with_state(pipeline: Arc<QueryPipeline>) -> Router {
    let state = AppState { pipeline };

    Router::new()
        .route("/", get(page::index).post(page::ask))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResultSet;
    use crate::services::mock::{MockDatabase, MockSummarizer, MockSynthesizer, MockTranslator};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    fn router(translator: MockTranslator, database: MockDatabase, synthesizer: Arc<MockSynthesizer>) -> Router {
        let pipeline = QueryPipeline::new(
            Arc::new(translator),
            Arc::new(database),
            Arc::new(MockSummarizer::replying("Alice is the only patient over 40.")),
            synthesizer,
        );
        create_router_with_state(Arc::new(pipeline))
    }

    fn default_router() -> Router {
        router(
            MockTranslator::replying("SQLQuery: SELECT name FROM patients WHERE age > 40"),
            MockDatabase::rows(ResultSet::new(vec!["name".into()], vec![vec![json!("Alice")]])),
            Arc::new(MockSynthesizer::working()),
        )
    }

    async fn post_form(app: Router, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = default_router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn test_index_page() {
        let response = default_router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Hospital Database NLP Query System"));
        assert!(html.contains("Enable Voice Output"));
    }

    #[tokio::test]
    async fn test_ask_renders_answer() {
        let synthesizer = Arc::new(MockSynthesizer::working());
        let app = router(
            MockTranslator::replying("SQLQuery: SELECT name FROM patients WHERE age > 40"),
            MockDatabase::rows(ResultSet::new(vec!["name".into()], vec![vec![json!("Alice")]])),
            synthesizer.clone(),
        );

        let (status, html) = post_form(app, "question=Show+me+all+patients+over+40&voice=on").await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("value=\"Show me all patients over 40\""));
        assert!(html.contains("<td>Alice</td>"));
        assert!(html.contains("Alice is the only patient over 40."));
        assert!(html.contains("<audio controls autoplay>"));
        assert_eq!(synthesizer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_ask_without_voice() {
        let synthesizer = Arc::new(MockSynthesizer::working());
        let app = router(
            MockTranslator::replying("SQLQuery: SELECT name FROM patients WHERE age > 40"),
            MockDatabase::rows(ResultSet::new(vec!["name".into()], vec![vec![json!("Alice")]])),
            synthesizer.clone(),
        );

        let (_, html) = post_form(app, "question=Show+me+all+patients+over+40").await;

        assert!(html.contains("<td>Alice</td>"));
        assert!(!html.contains("<audio"));
        assert_eq!(synthesizer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_ask_empty_question() {
        let (status, html) = post_form(default_router(), "question=+++").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Please enter a question."));
        assert!(!html.contains("<h2>Results</h2>"));
    }

    #[tokio::test]
    async fn test_ask_reports_extraction_failure() {
        let app = router(
            MockTranslator::replying("Sorry, I cannot help with that."),
            MockDatabase::rows(ResultSet::from_rows(vec![])),
            Arc::new(MockSynthesizer::working()),
        );

        let (status, html) = post_form(app, "question=hello").await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Could not extract SQL query from response"));
        assert!(!html.contains("<h2>Results</h2>"));
    }
}
