use std::sync::Arc;

use tasktalk_memory::SqliteStore;
use tasktalk_server::create_router;
use tasktalk_server::state::AppState;

/// Bind the app on an ephemeral port and return its base URL.
async fn spawn_app() -> String {
    spawn_app_with_ttl(1800).await
}

async fn spawn_app_with_ttl(token_ttl_secs: i64) -> String {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let state = AppState::new(store, token_ttl_secs);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

async fn register(base: &str, email: &str, password: &str) -> serde_json::Value {
    let response = reqwest::Client::new()
        .post(format!("{base}/api/auth/register"))
        .json(&serde_json::json!({"email": email, "password": password}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}

#[tokio::test]
async fn register_returns_user_and_session() {
    let base = spawn_app().await;

    let body = register(&base, "alice@example.com", "hunter2").await;

    assert_eq!(body["user"]["email"], "alice@example.com");
    assert!(!body["user"]["id"].as_str().unwrap().is_empty());
    assert!(!body["session"]["token"].as_str().unwrap().is_empty());
    assert!(body["session"]["expires_at"].is_string());
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let base = spawn_app().await;
    register(&base, "alice@example.com", "hunter2").await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/auth/register"))
        .json(&serde_json::json!({"email": "alice@example.com", "password": "other"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let base = spawn_app().await;
    register(&base, "alice@example.com", "hunter2").await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/auth/login"))
        .json(&serde_json::json!({"email": "alice@example.com", "password": "wrong"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = client
        .post(format!("{base}/api/auth/login"))
        .json(&serde_json::json!({"email": "nobody@example.com", "password": "hunter2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = client
        .post(format!("{base}/api/auth/login"))
        .json(&serde_json::json!({"email": "alice@example.com", "password": "hunter2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base}/api/todos/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = client
        .post(format!("{base}/api/chat/"))
        .json(&serde_json::json!({"message": "Show me my tasks"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = client
        .get(format!("{base}/api/auth/me"))
        .header("Authorization", "Bearer bogus")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn todos_crud_flow() {
    let base = spawn_app().await;
    let body = register(&base, "alice@example.com", "hunter2").await;
    let token = body["session"]["token"].as_str().unwrap().to_string();
    let client = reqwest::Client::new();
    let auth = format!("Bearer {token}");

    // Create.
    let response = client
        .post(format!("{base}/api/todos/"))
        .header("Authorization", &auth)
        .json(&serde_json::json!({"title": "write tests", "priority": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let created: serde_json::Value = response.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["title"], "write tests");
    assert_eq!(created["completed"], false);

    // Read back.
    let fetched: serde_json::Value = client
        .get(format!("{base}/api/todos/{id}"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["priority"], 1);

    // Update.
    let updated: serde_json::Value = client
        .put(format!("{base}/api/todos/{id}"))
        .header("Authorization", &auth)
        .json(&serde_json::json!({"completed": true}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["completed"], true);

    // Filtered list.
    let done: serde_json::Value = client
        .get(format!("{base}/api/todos/?completed=true"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(done.as_array().unwrap().len(), 1);

    // Delete, then it is gone.
    let response = client
        .delete(format!("{base}/api/todos/{id}"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{base}/api/todos/{id}"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn todos_are_isolated_between_users() {
    let base = spawn_app().await;
    let alice = register(&base, "alice@example.com", "hunter2").await;
    let bob = register(&base, "bob@example.com", "hunter2").await;
    let client = reqwest::Client::new();
    let alice_auth = format!("Bearer {}", alice["session"]["token"].as_str().unwrap());
    let bob_auth = format!("Bearer {}", bob["session"]["token"].as_str().unwrap());

    let created: serde_json::Value = client
        .post(format!("{base}/api/todos/"))
        .header("Authorization", &alice_auth)
        .json(&serde_json::json!({"title": "alice's todo"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_i64().unwrap();

    // Bob can neither see nor delete it.
    let response = client
        .get(format!("{base}/api/todos/{id}"))
        .header("Authorization", &bob_auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = client
        .delete(format!("{base}/api/todos/{id}"))
        .header("Authorization", &bob_auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn chat_creates_a_todo_visible_over_rest() {
    let base = spawn_app().await;
    let body = register(&base, "alice@example.com", "hunter2").await;
    let auth = format!("Bearer {}", body["session"]["token"].as_str().unwrap());
    let client = reqwest::Client::new();

    let reply: serde_json::Value = client
        .post(format!("{base}/api/chat/"))
        .header("Authorization", &auth)
        .json(&serde_json::json!({"message": "Create a new task to buy groceries"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(reply["intent"], "CREATE_TODO");
    assert!(reply["confidence"].as_f64().unwrap() >= 0.8);
    assert!(reply["response"]
        .as_str()
        .unwrap()
        .contains("Successfully created todo"));

    let todos: serde_json::Value = client
        .get(format!("{base}/api/todos/"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let todos = todos.as_array().unwrap();
    assert_eq!(todos.len(), 1);
    assert!(todos[0]["title"].as_str().unwrap().contains("buy groceries"));
}

#[tokio::test]
async fn chat_fallback_still_returns_an_envelope() {
    let base = spawn_app().await;
    let body = register(&base, "alice@example.com", "hunter2").await;
    let auth = format!("Bearer {}", body["session"]["token"].as_str().unwrap());

    let reply: serde_json::Value = reqwest::Client::new()
        .post(format!("{base}/api/chat/"))
        .header("Authorization", &auth)
        .json(&serde_json::json!({"message": "<script>frobnicate the gizmo</script>"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(reply["intent"], "UNKNOWN");
    assert!(reply["response"]
        .as_str()
        .unwrap()
        .contains("not sure I understood"));
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let base = spawn_app().await;
    let body = register(&base, "alice@example.com", "hunter2").await;
    let auth = format!("Bearer {}", body["session"]["token"].as_str().unwrap());
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base}/api/auth/me"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .post(format!("{base}/api/auth/logout"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{base}/api/auth/me"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn expired_tokens_are_rejected() {
    let base = spawn_app_with_ttl(-1).await;
    let body = register(&base, "alice@example.com", "hunter2").await;
    let auth = format!("Bearer {}", body["session"]["token"].as_str().unwrap());

    let response = reqwest::Client::new()
        .get(format!("{base}/api/auth/me"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}
