#![cfg(feature = "vectorize")]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use redraft_core_types::NO_DOCUMENTS_FOUND;
use redraft_services_integrations::{
    DocumentSearch, InstructionRetriever, RetrievalError, SearchContext, VectorizeClient,
    VectorizeConfig,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Captured {
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn retrieval(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    captured.requests.lock().unwrap().push((auth, body));
    Json(json!({
        "question": "ignored",
        "documents": [
            { "id": "1", "text": "Open with the main point.", "source_display_name": "email-guide.md", "similarity": 0.82 },
            { "id": "2", "text": "Avoid idioms for ESL readers." }
        ]
    }))
}

async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/retrieve")
}

fn client(endpoint: String, token: Option<&str>) -> VectorizeClient {
    VectorizeClient::new(VectorizeConfig {
        endpoint,
        access_token: token.map(str::to_string),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn posts_question_with_token_and_parses_documents() {
    let captured = Captured::default();
    let endpoint = spawn(
        Router::new()
            .route("/retrieve", post(retrieval))
            .with_state(captured.clone()),
    )
    .await;

    let documents = client(endpoint, Some("secret-token"))
        .retrieve_documents("email rewriting instructions: hi", 4)
        .await
        .unwrap();

    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].source_display_name.as_deref(), Some("email-guide.md"));
    assert_eq!(documents[0].similarity, Some(0.82));
    assert!(documents[1].source_display_name.is_none());

    let requests = captured.requests.lock().unwrap();
    let (auth, body) = &requests[0];
    assert_eq!(auth.as_deref(), Some("secret-token"));
    assert_eq!(
        body,
        &json!({ "question": "email rewriting instructions: hi", "numResults": 4 })
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn retriever_formats_backend_documents() {
    let endpoint = spawn(
        Router::new()
            .route("/retrieve", post(retrieval))
            .with_state(Captured::default()),
    )
    .await;

    let retriever = InstructionRetriever::new(Arc::new(client(endpoint, None)), 5);
    let context = SearchContext {
        text_type: Some("email".into()),
        ..Default::default()
    };
    let instructions = retriever.search_documents("clarity", &context).await;
    assert_eq!(
        instructions,
        "Document 1 (email-guide.md):\nOpen with the main point.\n\nDocument 2:\nAvoid idioms for ESL readers."
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn error_status_is_reported_and_degrades() {
    let endpoint = spawn(Router::new().route(
        "/retrieve",
        post(|| async { (StatusCode::UNAUTHORIZED, "bad token") }),
    ))
    .await;

    let vectorize = client(endpoint, Some("wrong"));
    let err = vectorize.retrieve_documents("q", 5).await.unwrap_err();
    assert!(matches!(err, RetrievalError::Status { status: 401, ref body } if body == "bad token"));

    let retriever = InstructionRetriever::new(Arc::new(vectorize), 5);
    assert_eq!(
        retriever
            .search_documents("q", &SearchContext::default())
            .await,
        NO_DOCUMENTS_FOUND
    );
}
