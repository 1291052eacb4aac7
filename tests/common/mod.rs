#![allow(dead_code)]

use axum::{body::Body, response::Response};
use courses_api::{
    AppConfig, AppState, MemoryRepository,
    auth::AuthUser,
    models::{CourseFields, NewUser, User},
    password,
    repository::Repository,
};
use std::sync::Arc;

// --- Shared Test Scaffolding ---

pub const OWNER_EMAIL: &str = "owner@example.com";
pub const OTHER_EMAIL: &str = "other@example.com";
pub const PASSWORD: &str = "secret";

/// An AppState over a fresh in-memory repository. The concrete repository is
/// returned alongside so tests can inspect what was persisted.
pub fn create_test_state() -> (AppState, Arc<MemoryRepository>) {
    let repo = Arc::new(MemoryRepository::new());
    let state = AppState::new(repo.clone(), AppConfig::default());
    (state, repo)
}

/// Registers a user directly in the repository with a real bcrypt hash.
pub async fn seed_user(repo: &MemoryRepository, first: &str, email: &str) -> User {
    let password_hash = password::hash_password(PASSWORD.to_string(), 4)
        .await
        .expect("hashing failed");
    repo.create_user(NewUser {
        first_name: first.to_string(),
        last_name: "Tester".to_string(),
        email_address: email.to_string(),
        password_hash,
    })
    .await
    .expect("seeding user failed")
}

pub async fn seed_course(repo: &MemoryRepository, owner: &User, title: &str) -> i32 {
    repo.create_course(
        CourseFields {
            title: title.to_string(),
            description: "A course used in tests".to_string(),
            estimated_time: Some(Some("6 hours".to_string())),
            materials_needed: None,
        },
        owner.id,
    )
    .await
    .expect("seeding course failed")
    .id
}

pub fn identity(user: &User) -> AuthUser {
    AuthUser::from(user.clone())
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("reading body failed");
    serde_json::from_slice(&bytes).expect("body is not JSON")
}
