#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use campusboard_api::{AppState, build_app};
use campusboard_auth::JwtEncoder;
use campusboard_core::config::AppConfig;
use campusboard_core::types::id::UserId;
use campusboard_database::Stores;
use campusboard_entity::{Identity, UserRole};
use campusboard_realtime::{ConnectionHandle, RealtimeEngine, RoomKey};
use campusboard_service::Services;

/// A router over in-memory stores plus a token issuer.
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub stores: Stores,
    encoder: JwtEncoder,
}

/// A caller with a signed token.
pub struct TestUser {
    pub identity: Identity,
    pub token: String,
}

impl TestUser {
    pub fn id(&self) -> UserId {
        self.identity.user_id
    }
}

impl TestApp {
    pub fn new() -> Self {
        let config = AppConfig::default();
        let stores = Stores::memory();
        let engine = Arc::new(RealtimeEngine::new(config.realtime.clone()));
        let services = Services::new(&stores, engine.emitter.clone(), &config.notifications);
        let encoder = JwtEncoder::new(&config.auth);
        let state = AppState::new(config, None, engine, services);
        Self {
            app: build_app(state.clone()),
            state,
            stores,
            encoder,
        }
    }

    pub fn user(&self, name: &str, role: UserRole) -> TestUser {
        let identity = Identity {
            user_id: UserId::new(),
            name: name.to_string(),
            role,
            department: None,
        };
        let token = self.encoder.issue(&identity).unwrap();
        TestUser { identity, token }
    }

    /// Registers a bus connection for the user and joins their room.
    pub fn connect(&self, user: &TestUser) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let manager = &self.state.realtime.connections;
        let (handle, rx) = manager.register(Some(user.identity.clone()));
        manager.join(&handle.id, RoomKey::User(user.id())).unwrap();
        (handle, rx)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        user: Option<&TestUser>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", user.token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, user: Option<&TestUser>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, user, None).await
    }

    pub async fn post(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(user), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: &TestUser, body: Option<Value>) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(user), body).await
    }

    pub async fn delete(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(user), None).await
    }

    /// Creates a notice through the API and returns its JSON.
    pub async fn create_notice(&self, owner: &TestUser, title: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/notices",
                owner,
                serde_json::json!({
                    "title": title,
                    "content": "Details inside",
                    "category": "exam",
                    "department": "Civil"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"].clone()
    }
}

/// Drains every frame currently queued for a connection.
pub fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<Value> {
    std::iter::from_fn(|| rx.try_recv().ok())
        .map(|frame| serde_json::from_str(&frame).unwrap())
        .collect()
}
