use std::{net::SocketAddr, sync::Arc};

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use belongings_lens::{
    models::{SearchScope, VisualSearchRequest},
    HttpSearchClient, ItemKind, SearchBackend, SearchController, SearchError, SelectedFile, WorkflowState,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Received {
    bodies: Arc<Mutex<Vec<Value>>>,
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn matches(State(received): State<Received>, Json(body): Json<Value>) -> impl IntoResponse {
    received.bodies.lock().push(body);
    Json(json!({
        "success": true,
        "message": "Found 2 similar items",
        "items": [
            {
                "_id": "665f1a",
                "title": "Silver watch",
                "description": "Leather strap, engraved back",
                "location": "Library",
                "date": "2024-02-10",
                "similarity_score": 91.4,
                "type": "found"
            },
            {
                "id": 7,
                "title": "Watch box",
                "description": "Empty",
                "location": "Hall B",
                "specificLocation": "Room 4",
                "date": "2024-02-09",
                "type": "lost"
            }
        ]
    }))
}

#[tokio::test]
async fn posts_expected_body_and_parses_items() {
    let received = Received::default();
    let base = spawn(Router::new().route("/api/search/visual", post(matches)).with_state(received.clone())).await;

    let client = HttpSearchClient::new(base);
    let response = client.search(&VisualSearchRequest::both("data:image/png;base64,AAAA")).await.unwrap();

    assert_eq!(
        received.bodies.lock().clone(),
        vec![json!({ "imageBase64": "data:image/png;base64,AAAA", "searchType": "both" })]
    );
    assert!(response.success);
    let items = response.items.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].similarity_score, Some(91));
    assert_eq!(items[0].kind, ItemKind::Found);
    assert_eq!(items[1].id, Some(json!(7)));
    assert_eq!(items[1].specific_location.as_deref(), Some("Room 4"));
}

#[tokio::test]
async fn in_band_failure_survives_error_status() {
    let app = Router::new().route(
        "/api/search/visual",
        post(|| async {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "success": false, "message": "Index unavailable" })))
        }),
    );
    let client = HttpSearchClient::new(spawn(app).await);

    let response = client.search(&VisualSearchRequest::both("data:image/png;base64,")).await.unwrap();
    assert!(!response.success);
    assert_eq!(response.message.as_deref(), Some("Index unavailable"));
}

#[tokio::test]
async fn non_json_body_is_a_parse_error() {
    let app = Router::new().route("/api/search/visual", post(|| async { "<html>Bad Gateway</html>" }));
    let client = HttpSearchClient::new(spawn(app).await);

    let err = client.search(&VisualSearchRequest::both("x")).await.unwrap_err();
    assert!(matches!(err, SearchError::Parse(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_service_is_an_http_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = HttpSearchClient::new(format!("http://{addr}"))
        .search(&VisualSearchRequest { image_base64: "x".into(), search_type: SearchScope::Both })
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Http(_)), "got {err:?}");
}

#[tokio::test]
async fn full_workflow_against_live_service() {
    let received = Received::default();
    let base = spawn(Router::new().route("/api/search/visual", post(matches)).with_state(received.clone())).await;

    let controller = SearchController::new(Arc::new(HttpSearchClient::new(base)), Arc::new(belongings_lens::NullSurface));
    controller.select_file(Some(SelectedFile::new("watch.jpg", "image/jpeg", &b"jpg"[..]))).await.unwrap();
    assert_eq!(controller.trigger().await, Ok(WorkflowState::Succeeded));

    let bodies = received.bodies.lock().clone();
    assert_eq!(bodies[0]["imageBase64"], json!("data:image/jpeg;base64,anBn"));
}
