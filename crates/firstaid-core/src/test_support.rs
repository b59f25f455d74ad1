//! In-process stand-in for the identity service, used by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
    hits: Arc<AtomicUsize>,
    last_body: Arc<Mutex<Option<serde_json::Value>>>,
}

pub struct MockIdentity {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    last_body: Arc<Mutex<Option<serde_json::Value>>>,
}

impl MockIdentity {
    /// Serve `POST /users/login` with a fixed status and body.
    pub async fn start(status: u16, body: &str) -> Self {
        Self::spawn(status, body, None).await
    }

    pub async fn start_delayed(status: u16, body: &str, delay: Duration) -> Self {
        Self::spawn(status, body, Some(delay)).await
    }

    /// A base URL nothing is listening on.
    pub async fn unreachable() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    async fn spawn(status: u16, body: &str, delay: Option<Duration>) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let last_body = Arc::new(Mutex::new(None));
        let state = MockState {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
            delay,
            hits: hits.clone(),
            last_body: last_body.clone(),
        };

        let app = Router::new()
            .route("/users/login", post(handle_login))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            hits,
            last_body,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_body(&self) -> Option<serde_json::Value> {
        self.last_body.lock().unwrap().clone()
    }
}

async fn handle_login(State(state): State<MockState>, body: String) -> (StatusCode, String) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    *state.last_body.lock().unwrap() = serde_json::from_str(&body).ok();
    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }
    (state.status, state.body.clone())
}
