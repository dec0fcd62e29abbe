use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use huddle::engine::{Engine, NoOverlap};
use huddle::http::{AppState, RequestLog, TokenStore, router};

// ── Test infrastructure ──────────────────────────────────────

static TEST_SEQ: AtomicU64 = AtomicU64::new(0);

async fn start_test_server(tokens: TokenStore) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let seq = TEST_SEQ.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("huddle_http_test_{}_{seq}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let engine = Engine::new(dir.join("bookings.journal"), Box::new(NoOverlap)).unwrap();
    let state = AppState {
        engine: Arc::new(engine),
        requests: Arc::new(RequestLog::new(1000)),
        tokens: Arc::new(tokens),
    };

    let app = router(state);
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    addr
}

struct Api {
    base: String,
    client: reqwest::Client,
}

impl Api {
    async fn start() -> Self {
        Self::start_with_tokens(TokenStore::new(vec!["secret".into()])).await
    }

    async fn start_with_tokens(tokens: TokenStore) -> Self {
        let addr = start_test_server(tokens).await;
        Api {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
        }
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.base))
            .send()
            .await
            .unwrap()
    }

    async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}{path}", self.base))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{path}", self.base))
            .send()
            .await
            .unwrap()
    }

    async fn create_user(&self, name: &str) -> Value {
        let resp = self
            .post(
                "/api/users",
                json!({ "name": name, "email": format!("{name}@example.com") }),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        resp.json().await.unwrap()
    }

    async fn create_room(&self, name: &str, capacity: u32) -> Value {
        let resp = self
            .post("/api/rooms", json!({ "name": name, "capacity": capacity }))
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        resp.json().await.unwrap()
    }

    async fn book(
        &self,
        user_name: &str,
        room_id: u64,
        start: &str,
        end: &str,
    ) -> reqwest::Response {
        self.post(
            "/api/bookings",
            json!({
                "user_name": user_name,
                "room_id": room_id,
                "date": &start[..10],
                "start_time": start,
                "end_time": end,
            }),
        )
        .await
    }
}

// ── Health ───────────────────────────────────────────────────

#[tokio::test]
async fn health_and_ping_respond() {
    let api = Api::start().await;

    let resp = api.get("/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let resp = api.get("/ping").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "pong");
}

// ── Users and rooms ──────────────────────────────────────────

#[tokio::test]
async fn user_crud_over_http() {
    let api = Api::start().await;

    let user = api.create_user("alice").await;
    assert_eq!(user["id"], 1);
    assert_eq!(user["name"], "alice");

    let resp = api.get("/api/users").await;
    let users: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(users.len(), 1);

    let resp = api.delete("/api/users/1").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = api.delete("/api/users/1").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_user_missing_field_is_400() {
    let api = Api::start().await;
    let resp = api.post("/api/users", json!({ "name": "bob" })).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn room_crud_over_http() {
    let api = Api::start().await;

    let room = api.create_room("Board Room", 12).await;
    assert_eq!(room["id"], 1);
    assert_eq!(room["capacity"], 12);

    let resp = api.get("/api/rooms").await;
    let rooms: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(rooms.len(), 1);

    let resp = api.delete("/api/rooms/1").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = api.delete("/api/rooms/1").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_room_zero_capacity_is_400() {
    let api = Api::start().await;
    let resp = api
        .post("/api/rooms", json!({ "name": "Closet", "capacity": 0 }))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ── Bookings ─────────────────────────────────────────────────

#[tokio::test]
async fn booking_flow_over_http() {
    let api = Api::start().await;
    api.create_user("alice").await;
    api.create_user("bob").await;
    api.create_room("Room A", 8).await;

    // Alice books 10:00-11:00.
    let resp = api
        .book("alice", 1, "2030-06-03T10:00:00", "2030-06-03T11:00:00")
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let booking: Value = resp.json().await.unwrap();
    assert_eq!(booking["id"], 1);
    assert_eq!(booking["user_name"], "alice");
    assert_eq!(booking["room_name"], "Room A");

    // Bob's overlapping 10:30-11:30 attempt conflicts.
    let resp = api
        .book("bob", 1, "2030-06-03T10:30:00", "2030-06-03T11:30:00")
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Back-to-back 11:00-12:00 is fine.
    let resp = api
        .book("bob", 1, "2030-06-03T11:00:00", "2030-06-03T12:00:00")
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = api.get("/api/bookings").await;
    let bookings: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(bookings.len(), 2);
}

#[tokio::test]
async fn booking_unknown_user_is_404() {
    let api = Api::start().await;
    api.create_room("Room A", 8).await;
    let resp = api
        .book("nobody", 1, "2030-06-03T10:00:00", "2030-06-03T11:00:00")
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn booking_unknown_room_is_404() {
    let api = Api::start().await;
    api.create_user("alice").await;
    let resp = api
        .book("alice", 99, "2030-06-03T10:00:00", "2030-06-03T11:00:00")
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn booking_missing_field_is_400() {
    let api = Api::start().await;
    let resp = api
        .post(
            "/api/bookings",
            json!({ "user_name": "alice", "room_id": 1 }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn booking_bad_datetime_is_400() {
    let api = Api::start().await;
    api.create_user("alice").await;
    api.create_room("Room A", 8).await;
    let resp = api
        .post(
            "/api/bookings",
            json!({
                "user_name": "alice",
                "room_id": 1,
                "date": "2030-06-03",
                "start_time": "not-a-time",
                "end_time": "2030-06-03T11:00:00",
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn booking_inverted_range_is_400() {
    let api = Api::start().await;
    api.create_user("alice").await;
    api.create_room("Room A", 8).await;
    let resp = api
        .book("alice", 1, "2030-06-03T11:00:00", "2030-06-03T10:00:00")
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bookings_filter_by_user_and_room() {
    let api = Api::start().await;
    api.create_user("alice").await;
    api.create_user("bob").await;
    api.create_room("Room A", 8).await;
    api.create_room("Room B", 4).await;

    api.book("alice", 1, "2030-06-03T10:00:00", "2030-06-03T11:00:00")
        .await;
    api.book("bob", 2, "2030-06-03T10:00:00", "2030-06-03T11:00:00")
        .await;

    let resp = api.get("/api/bookings?user_name=alice").await;
    let bookings: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["user_name"], "alice");

    let resp = api.get("/api/bookings?room_id=2").await;
    let bookings: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["room_id"], 2);

    // Unknown name is a filter that matches nothing, not an error.
    let resp = api.get("/api/bookings?user_name=nobody").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bookings: Vec<Value> = resp.json().await.unwrap();
    assert!(bookings.is_empty());
}

#[tokio::test]
async fn bookings_filter_by_date() {
    let api = Api::start().await;
    api.create_user("alice").await;
    api.create_room("Room A", 8).await;

    api.book("alice", 1, "2030-06-03T10:00:00", "2030-06-03T11:00:00")
        .await;
    api.book("alice", 1, "2030-06-04T10:00:00", "2030-06-04T11:00:00")
        .await;

    let resp = api.get("/api/bookings?date=2030-06-04").await;
    let bookings: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(bookings.len(), 1);

    let resp = api.get("/api/bookings?date=junk").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_booking_enforces_ownership() {
    let api = Api::start().await;
    api.create_user("alice").await;
    api.create_user("bob").await;
    api.create_room("Room A", 8).await;
    api.book("alice", 1, "2030-06-03T10:00:00", "2030-06-03T11:00:00")
        .await;

    // No user_name at all.
    let resp = api.delete("/api/bookings/1").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Bob cannot cancel Alice's booking.
    let resp = api.delete("/api/bookings/1?user_name=bob").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = api.delete("/api/bookings/1?user_name=alice").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = api.delete("/api/bookings/1?user_name=alice").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── Admin ────────────────────────────────────────────────────

#[tokio::test]
async fn admin_requests_require_bearer_token() {
    let api = Api::start().await;

    let resp = api.get("/admin/requests").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = api
        .client
        .get(format!("{}/admin/requests", api.base))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = api
        .client
        .get(format!("{}/admin/requests", api.base))
        .bearer_auth("secret")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_request_log_records_health_hits() {
    let api = Api::start().await;

    api.get("/health").await;
    api.get("/ping").await;
    api.get("/ping").await;

    let resp = api
        .client
        .get(format!("{}/admin/requests", api.base))
        .bearer_auth("secret")
        .send()
        .await
        .unwrap();
    let records: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(records.len(), 3);
    // Newest first.
    assert_eq!(records[0]["endpoint"], "/ping");
    assert_eq!(records[2]["endpoint"], "/health");

    let resp = api
        .client
        .delete(format!("{}/admin/requests", api.base))
        .bearer_auth("secret")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = api
        .client
        .get(format!("{}/admin/requests", api.base))
        .bearer_auth("secret")
        .send()
        .await
        .unwrap();
    let records: Vec<Value> = resp.json().await.unwrap();
    assert!(records.is_empty());
}
