//! HTTP API integration tests

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use axum::Router;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tower::util::ServiceExt;

use ticket_board::api::{create_router, AppState};
use ticket_board::event_store::{EventStore, Store};
use ticket_board::identity::{IdentityConfig, IdentityService};
use ticket_board::notify::RecordingNotifier;
use ticket_board::types::Student;
use ticket_board::TicketBoard;

struct TestApp {
    router: Router,
    store: Arc<EventStore>,
    board: Arc<TicketBoard>,
    notifier: Arc<RecordingNotifier>,
}

fn setup() -> TestApp {
    let store = Arc::new(EventStore::in_memory());
    let board = Arc::new(TicketBoard::new(store.clone()));
    let notifier = Arc::new(RecordingNotifier::new());
    let identity = Arc::new(IdentityService::new(
        store.clone(),
        notifier.clone(),
        IdentityConfig {
            public_url: "http://buffet.test".to_string(),
            admin_email: "admin@buffet.test".to_string(),
            bcrypt_cost: 4,
        },
    ));
    let state = Arc::new(AppState::new(board.clone(), identity, 4));

    TestApp {
        router: create_router(state),
        store,
        board,
        notifier,
    }
}

fn add_student(store: &EventStore, dni: &str) {
    store
        .upsert_student(&Student::new(
            dni.to_string(),
            "Ana".to_string(),
            "Diaz".to_string(),
            bcrypt::hash("secreto", 4).unwrap(),
        ))
        .unwrap();
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_order_lifecycle() {
    let app = setup();
    add_student(&app.store, "dni-1");

    let (status, body) = send(&app, post_json("/api/pedido", json!({"dni": "dni-1", "items": "X"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["turno"], 1);

    let (status, body) = send(&app, post_json("/api/pedido", json!({"dni": "dni-1", "items": "Y"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = send(&app, get("/api/current-orders")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["ticketNumber"], 1);
    assert_eq!(body[0]["ownerIdentifier"], "dni-1");
    assert_eq!(body[0]["ownerName"], "Ana Diaz");
    assert_eq!(body[0]["state"], "QUEUED");

    let (status, body) = send(
        &app,
        post_json("/api/update-estado", json!({"turno": 1, "estado": "LISTO"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticket"]["state"], "READY");

    let (status, _) = send(
        &app,
        post_json("/api/update-estado", json!({"turno": 1, "estado": "COLLECTED"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get("/api/current-orders")).await;
    assert_eq!(body, json!([]));

    let (_, body) = send(&app, post_json("/api/pedido", json!({"dni": "dni-1", "items": "Y"}))).await;
    assert_eq!(body["turno"], 2);
}

#[tokio::test]
async fn test_order_errors() {
    let app = setup();
    add_student(&app.store, "dni-1");

    let (status, body) = send(&app, post_json("/api/pedido", json!({"dni": "nobody", "items": "X"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = send(
        &app,
        post_json("/api/update-estado", json!({"turno": 42, "estado": "READY"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&app, post_json("/api/pedido", json!({"dni": "dni-1", "items": "X"}))).await;
    let (status, body) = send(
        &app,
        post_json("/api/update-estado", json!({"turno": 1, "estado": "LOST"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
    assert_eq!(app.board.snapshot()[0].state.as_str(), "QUEUED");
}

#[tokio::test]
async fn test_current_orders_refresh_resyncs() {
    let app = setup();
    add_student(&app.store, "dni-1");

    // Written behind the board's back
    app.store
        .insert_ticket(&ticket_board::Ticket::queued(
            7,
            "dni-1".to_string(),
            "Ana Diaz".to_string(),
            "X".to_string(),
        ))
        .unwrap();

    let (_, body) = send(&app, get("/api/current-orders")).await;
    assert_eq!(body, json!([]));

    let (_, body) = send(&app, get("/api/current-orders?refresh=true")).await;
    assert_eq!(body[0]["ticketNumber"], 7);
    assert_eq!(app.board.broadcast_count(), 1);
}

#[tokio::test]
async fn test_import_requires_csv() {
    let app = setup();

    let request = Request::builder()
        .method("POST")
        .uri("/admin/import-alumnos")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let request = Request::builder()
        .method("POST")
        .uri("/admin/import-alumnos")
        .header(CONTENT_TYPE, "text/csv; charset=utf-8")
        .body(Body::from(
            "dni,nombre,apellido,passwordtemporal\n111,Ana,Diaz,pw\n222,,Paz,pw\n",
        ))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imported"], 1);
    assert_eq!(body["failed"], 1);

    let (status, body) = send(&app, post_json("/auth/login", json!({"dni": "111", "password": "pw"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["student"]["firstName"], "Ana");
}

#[tokio::test]
async fn test_registration_review_flow() {
    let app = setup();

    let form = json!({
        "dni": "555",
        "nombre": "Leo",
        "apellido": "Paz",
        "password": "clave",
        "email": "leo@example.com"
    });
    let (status, _) = send(&app, post_json("/auth/register", form.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, post_json("/auth/register", form)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = send(&app, post_json("/auth/login", json!({"dni": "555", "password": "clave"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let token = app
        .store
        .find_pending_by_dni("555")
        .unwrap()
        .unwrap()
        .verification_token;

    let (status, _) = send(&app, get(&format!("/auth/review/{}/maybe", token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/auth/review/unknown-token/accept")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get(&format!("/auth/review/{}/accept", token))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, post_json("/auth/login", json!({"dni": "555", "password": "clave"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["student"]["lastName"], "Paz");
    assert!(body["student"].get("passwordHash").is_none());

    // review request, confirmation and approval
    for _ in 0..100 {
        if app.notifier.sent().len() >= 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(app.notifier.sent().len(), 3);
}

#[tokio::test]
async fn test_health() {
    let app = setup();
    let response = app.router.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve(app: &TestApp) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn connect_viewer(addr: SocketAddr) -> WsClient {
    let (ws, _) = connect_async(format!("ws://{}/ws/turnos", addr)).await.unwrap();
    ws
}

/// Next text frame as JSON
async fn next_json(ws: &mut WsClient) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .unwrap()
            .unwrap();
        if let WsMessage::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn assert_silent(ws: &mut WsClient) {
    let next = tokio::time::timeout(Duration::from_millis(150), ws.next()).await;
    assert!(next.is_err(), "unexpected frame: {:?}", next);
}

async fn wait_for_viewers(board: &TicketBoard, count: usize) {
    for _ in 0..200 {
        if board.viewer_count() == count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("expected {} viewers, got {}", count, board.viewer_count());
}

#[tokio::test]
async fn test_websocket_viewer_session() {
    let app = setup();
    add_student(&app.store, "dni-1");
    add_student(&app.store, "dni-2");
    app.board.create_ticket("dni-1", "X").unwrap();
    let addr = serve(&app).await;

    let mut first = connect_viewer(addr).await;
    let mut second = connect_viewer(addr).await;

    let initial = next_json(&mut first).await;
    assert_eq!(initial["type"], "INITIAL_STATE");
    assert_eq!(initial["data"][0]["ticketNumber"], 1);
    assert_eq!(next_json(&mut second).await["type"], "INITIAL_STATE");
    wait_for_viewers(&app.board, 2).await;

    // Refresh requests answer only the asking socket
    first.send(WsMessage::Text("get_turnos".to_string())).await.unwrap();
    let refreshed = next_json(&mut first).await;
    assert_eq!(refreshed["type"], "UPDATE");
    assert_eq!(refreshed["data"].as_array().unwrap().len(), 1);

    first
        .send(WsMessage::Text(json!({"type": "GET_CURRENT_STATE"}).to_string()))
        .await
        .unwrap();
    assert_eq!(next_json(&mut first).await["type"], "UPDATE");
    assert_silent(&mut second).await;

    first
        .send(WsMessage::Text(json!({"type": "PING"}).to_string()))
        .await
        .unwrap();
    assert_eq!(next_json(&mut first).await, json!({"type": "PONG"}));

    // A mutation reaches every viewer
    let (status, _) = send(&app, post_json("/api/pedido", json!({"dni": "dni-2", "items": "Y"}))).await;
    assert_eq!(status, StatusCode::OK);
    for ws in [&mut first, &mut second] {
        let update = next_json(ws).await;
        assert_eq!(update["type"], "UPDATE");
        assert_eq!(update["data"].as_array().unwrap().len(), 2);
    }

    first.close(None).await.unwrap();
    wait_for_viewers(&app.board, 1).await;

    drop(second);
    wait_for_viewers(&app.board, 0).await;
}
