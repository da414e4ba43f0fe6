use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, NaiveDate, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::InMemoryStore;
use shared_models::auth::{Principal, Role};

use crate::clock::FixedClock;
use crate::state::AppState;

pub struct TestConfig {
    pub jwt_secret: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            auth_jwt_secret: self.jwt_secret.clone(),
            database_url: None,
            database_max_connections: 1,
            host: "127.0.0.1".to_string(),
            port: 0,
            seed_demo_data: false,
        }
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::patient("test@example.com")
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn practitioner(email: &str) -> Self {
        Self::new(email, "practitioner")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn to_principal(&self) -> Principal {
        Principal {
            user_id: self.id,
            role: self.role.parse::<Role>().unwrap_or(Role::Patient),
            email: Some(self.email.clone()),
        }
    }
}

/// Builds HS256 tokens the way the identity provider issues them.
pub struct JwtTestUtils;

impl JwtTestUtils {
    /// Signs `claims` under `secret` as a compact `header.payload.signature` token.
    pub fn sign(claims: &serde_json::Value, secret: &str) -> String {
        let encode = |value: String| general_purpose::URL_SAFE_NO_PAD.encode(value);
        let signing_input = format!(
            "{}.{}",
            encode(json!({ "alg": "HS256", "typ": "JWT" }).to_string()),
            encode(claims.to_string())
        );

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(signing_input.as_bytes());
        let signature = general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{}.{}", signing_input, signature)
    }

    /// A token for `user` expiring `exp_hours` from now (24 by default).
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let issued = Utc::now();
        let expires = issued + Duration::hours(exp_hours.unwrap_or(24));
        Self::sign(
            &json!({
                "sub": user.id,
                "email": user.email,
                "role": user.role,
                "iat": issued.timestamp(),
                "exp": expires.timestamp(),
            }),
            secret,
        )
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", None)
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// In-memory application state with a pinned date, for router tests.
pub struct TestApp {
    pub config: TestConfig,
    pub store: Arc<InMemoryStore>,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn new(today: NaiveDate) -> Self {
        let config = TestConfig::default();
        let store = Arc::new(InMemoryStore::new());
        let state = AppState::new(config.to_app_config(), store.clone())
            .with_clock(Arc::new(FixedClock(today)));

        Self {
            config,
            store,
            state: Arc::new(state),
        }
    }

    pub fn bearer(&self, user: &TestUser) -> String {
        format!(
            "Bearer {}",
            JwtTestUtils::create_test_token(user, &self.config.jwt_secret, None)
        )
    }
}
