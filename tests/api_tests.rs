// tests/api_tests.rs

use std::sync::Arc;

use async_trait::async_trait;
use qbank_comments::{
    config::Config,
    error::AppError,
    models::{
        comment::{Comment, NewComment},
        user::PublicIdentity,
    },
    repositories::{CommentRepository, IdentityRepository, InMemoryStore},
    routes,
    services::CommentService,
    state::AppState,
    utils::jwt::sign_jwt,
};

const SECRET: &str = "test_secret_for_integration_tests";

struct TestApp {
    address: String,
    client: reqwest::Client,
}

impl TestApp {
    fn token(&self, user_id: i64, role: &str) -> String {
        sign_jwt(user_id, role, SECRET, 600).expect("Failed to sign token")
    }

    async fn add(&self, token: &str, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/comment/add", self.address))
            .header("Authorization", format!("Bearer {}", token))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn add_ok(&self, token: &str, body: serde_json::Value) -> i64 {
        let response = self.add(token, body).await;
        assert_eq!(response.status().as_u16(), 201);
        let created: serde_json::Value = response.json().await.unwrap();
        created["id"].as_i64().expect("id not found")
    }

    async fn list(&self, question_id: i64) -> reqwest::Response {
        self.client
            .get(format!(
                "{}/api/comment/list?questionId={}",
                self.address, question_id
            ))
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn delete(&self, token: &str, id: i64) -> reqwest::Response {
        self.client
            .post(format!("{}/api/comment/delete?id={}", self.address, id))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// Spawns the app on a random port, backed by an in-memory store
/// seeded with two users and one admin.
async fn spawn_app() -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    for (id, name, role) in [(1, "alice", "user"), (2, "bob", "user"), (3, "root", "admin")] {
        store
            .insert_user(PublicIdentity {
                id,
                user_name: name.to_string(),
                user_avatar: None,
                user_role: role.to_string(),
            })
            .await;
    }

    spawn_app_with(store.clone(), store).await
}

/// Spawns the app on a random port over the given storage collaborators.
async fn spawn_app_with(
    comments: Arc<dyn CommentRepository>,
    identities: Arc<dyn IdentityRepository>,
) -> TestApp {
    let config = Config {
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        jwt_secret: SECRET.to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
        rust_log: "error".to_string(),
    };

    let state = AppState {
        comments: CommentService::new(comments, identities),
        config,
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    }
}

/// Comment storage whose database is unreachable.
struct UnreachableDatabase;

#[async_trait]
impl CommentRepository for UnreachableDatabase {
    async fn list_active_by_subject(&self, _: i64) -> Result<Vec<Comment>, AppError> {
        Err(AppError::StorageFailure("connection refused".to_string()))
    }

    async fn get_by_id(&self, _: i64) -> Result<Option<Comment>, AppError> {
        Err(AppError::StorageFailure("connection refused".to_string()))
    }

    async fn create(&self, _: NewComment) -> Result<Comment, AppError> {
        Err(AppError::StorageFailure("connection refused".to_string()))
    }

    async fn soft_delete(&self, _: i64) -> Result<bool, AppError> {
        Err(AppError::StorageFailure("connection refused".to_string()))
    }
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(format!("{}/random_path_that_does_not_exist", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn add_requires_token() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(format!("{}/api/comment/add", app.address))
        .json(&serde_json::json!({"questionId": 42, "content": "hello"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = app
        .add("not-a-jwt", serde_json::json!({"questionId": 42, "content": "hello"}))
        .await;
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn add_and_list_thread() {
    let app = spawn_app().await;
    let alice = app.token(1, "user");
    let bob = app.token(2, "user");

    let root = app
        .add_ok(&alice, serde_json::json!({"questionId": 42, "content": "first"}))
        .await;
    let reply = app
        .add_ok(
            &bob,
            serde_json::json!({
                "questionId": 42,
                "replyToCommentId": root,
                "content": "reply to first"
            }),
        )
        .await;

    let response = app.list(42).await;
    assert_eq!(response.status().as_u16(), 200);
    let threads: Vec<serde_json::Value> = response.json().await.unwrap();

    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0]["id"], root);
    assert_eq!(threads[0]["subjectId"], 42);
    assert_eq!(threads[0]["author"]["userName"], "alice");
    assert!(threads[0].get("replyToAuthor").is_none());

    let children = threads[0]["children"].as_array().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0]["id"], reply);
    assert_eq!(children[0]["threadRootId"], root);
    assert_eq!(children[0]["replyToAuthor"]["userName"], "alice");
    assert_eq!(children[0]["children"], serde_json::json!([]));
}

#[tokio::test]
async fn list_of_empty_question_is_empty_array() {
    let app = spawn_app().await;

    let response = app.list(99).await;

    assert_eq!(response.status().as_u16(), 200);
    let threads: Vec<serde_json::Value> = response.json().await.unwrap();
    assert!(threads.is_empty());
}

#[tokio::test]
async fn list_rejects_invalid_question() {
    let app = spawn_app().await;

    let response = app.list(0).await;

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "subject not found");
}

#[tokio::test]
async fn add_fails_validation() {
    let app = spawn_app().await;
    let alice = app.token(1, "user");

    let cases = [
        (serde_json::json!({"content": "no question"}), "subject not found"),
        (serde_json::json!({"questionId": 42, "content": "   "}), "content required"),
        (
            serde_json::json!({"questionId": 42, "content": "x".repeat(1200)}),
            "content too long",
        ),
    ];

    for (body, message) in cases {
        let response = app.add(&alice, body).await;
        assert_eq!(response.status().as_u16(), 400);
        let error: serde_json::Value = response.json().await.unwrap();
        assert_eq!(error["error"], message);
    }

    let threads: Vec<serde_json::Value> = app.list(42).await.json().await.unwrap();
    assert!(threads.is_empty());
}

#[tokio::test]
async fn delete_by_author_other_user_and_admin() {
    let app = spawn_app().await;
    let alice = app.token(1, "user");
    let bob = app.token(2, "user");
    let admin = app.token(3, "admin");

    let first = app
        .add_ok(&alice, serde_json::json!({"questionId": 7, "content": "one"}))
        .await;
    let second = app
        .add_ok(&alice, serde_json::json!({"questionId": 7, "content": "two"}))
        .await;

    assert_eq!(app.delete(&bob, first).await.status().as_u16(), 403);

    let response = app.delete(&alice, first).await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.json::<bool>().await.unwrap(), true);

    assert_eq!(app.delete(&admin, second).await.status().as_u16(), 200);
    assert_eq!(app.delete(&admin, second).await.status().as_u16(), 404);
    assert_eq!(app.delete(&admin, 0).await.status().as_u16(), 400);

    let threads: Vec<serde_json::Value> = app.list(7).await.json().await.unwrap();
    assert!(threads.is_empty());
}

#[tokio::test]
async fn storage_failure_is_500_with_hidden_message() {
    let app = spawn_app_with(
        Arc::new(UnreachableDatabase),
        Arc::new(InMemoryStore::new()),
    )
    .await;

    let response = app.list(42).await;

    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"error": "Internal Server Error"}));
}
