//! Shared helpers: an in-process webhook receiver

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::routing::any;
use tokio::net::TcpListener;

/// Collects webhook requests as `(method, body)` pairs.
#[derive(Clone, Default)]
pub struct WebhookSink {
    received: Arc<Mutex<Vec<(Method, String)>>>,
}

impl WebhookSink {
    /// Start listening on an ephemeral port; returns the sink and its hook URL.
    pub async fn start() -> (Self, String) {
        let sink = Self::default();
        let app = Router::new()
            .route("/hook", any(record))
            .with_state(sink.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (sink, format!("http://{addr}/hook"))
    }

    pub fn received(&self) -> Vec<(Method, String)> {
        self.received.lock().unwrap().clone()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.received().into_iter().map(|(_, body)| body).collect()
    }

    /// Poll until `count` requests have arrived or five seconds pass.
    pub async fn wait_for(&self, count: usize) -> Vec<String> {
        for _ in 0..100 {
            if self.received.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        self.bodies()
    }
}

async fn record(State(sink): State<WebhookSink>, method: Method, body: Bytes) -> StatusCode {
    sink.received
        .lock()
        .unwrap()
        .push((method, String::from_utf8_lossy(&body).into_owned()));
    StatusCode::OK
}
