//! Shared fixtures for the client integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use board_client::ApiClient;
use board_core::{Config, Surface};
use session_manager::{
    CredentialPair, CredentialStore, KeyValueStore, LoginRedirect, MemoryKeyValueStore,
};
use wiremock::MockServer;

/// Config pointing at the mock server, retries off.
pub fn config_for(server: &MockServer) -> Config {
    Config {
        api_url: format!("{}/api", server.uri()),
        max_retries: 0,
        ..Config::default()
    }
}

pub struct Fixture {
    pub store: Arc<MemoryKeyValueStore>,
    pub credentials: CredentialStore,
    pub client: ApiClient,
}

pub fn fixture(server: &MockServer, surface: Surface) -> Fixture {
    fixture_with_config(config_for(server), surface)
}

pub fn fixture_with_config(config: Config, surface: Surface) -> Fixture {
    let store = Arc::new(MemoryKeyValueStore::new());
    let credentials = CredentialStore::new(
        store.clone() as Arc<dyn KeyValueStore>,
        surface.storage_keys(),
    );
    let client = ApiClient::new(&config, credentials.clone()).expect("client");
    Fixture {
        store,
        credentials,
        client,
    }
}

pub fn pair(access: &str, refresh: &str) -> CredentialPair {
    CredentialPair {
        access: access.to_string(),
        refresh: refresh.to_string(),
    }
}

pub fn identity_json(id: i64, username: &str, role: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "username": username,
        "email": format!("{username}@example.com"),
        "role": role,
    })
}

pub fn jobs_json() -> serde_json::Value {
    serde_json::json!([
        {
            "id": 1,
            "title": "Backend Engineer",
            "company": "Acme",
            "location": "Berlin",
            "description": "Rust services",
            "requirements": "Rust\nPostgres",
            "salary_min": 60000,
            "salary_max": 80000,
            "currency": "EUR",
            "type": "full-time",
            "experienceLevel": "senior",
            "category": {"id": 3, "name": "Engineering"},
            "posted_at": "2024-05-01T10:00:00Z",
            "is_active": true
        },
        {
            "id": 2,
            "title": "Support Specialist",
            "company": "Globex",
            "location": "Remote",
            "type": "remote",
            "experienceLevel": "entry",
            "is_active": false
        }
    ])
}

/// Counts how often the login redirect fired.
#[derive(Default, Clone)]
pub struct CountingRedirect {
    count: Arc<AtomicUsize>,
}

impl CountingRedirect {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LoginRedirect for CountingRedirect {
    async fn redirect_to_login(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}
