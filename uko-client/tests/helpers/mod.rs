//! In-process mock of the scoring service
//!
//! Serves `/api/tribes` and `/api/predict` on an ephemeral localhost port
//! with scripted behavior, and records what the client sent.

#![allow(dead_code)]

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use uko_client::{HttpBackend, SubmissionController};
use uko_common::config::ClientConfig;

/// How `/api/predict` answers
#[derive(Clone)]
pub enum PredictBehavior {
    Respond(StatusCode, Value),
    RawText(StatusCode, String),
    Delay(Duration, Value),
    Gate(Arc<Notify>, Value),
    /// First request gets the error status, later ones succeed
    FailFirst(StatusCode, Value),
}

#[derive(Clone)]
struct MockContext {
    tribes: (StatusCode, Value),
    predict: PredictBehavior,
    predict_hits: Arc<AtomicUsize>,
    last_body: Arc<Mutex<Option<Value>>>,
}

/// Running mock service
pub struct MockService {
    pub base_url: String,
    pub predict_hits: Arc<AtomicUsize>,
    pub last_body: Arc<Mutex<Option<Value>>>,
}

impl MockService {
    pub async fn start(tribes: (StatusCode, Value), predict: PredictBehavior) -> Self {
        let ctx = MockContext {
            tribes,
            predict,
            predict_hits: Arc::new(AtomicUsize::new(0)),
            last_body: Arc::new(Mutex::new(None)),
        };
        let predict_hits = ctx.predict_hits.clone();
        let last_body = ctx.last_body.clone();

        let app = Router::new()
            .route("/api/tribes", get(tribes_handler))
            .route("/api/predict", post(predict_handler))
            .with_state(ctx);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            predict_hits,
            last_body,
        }
    }

    /// Standard catalog plus a scripted predict endpoint
    pub async fn with_predict(predict: PredictBehavior) -> Self {
        Self::start(default_tribes(), predict).await
    }

    pub fn hits(&self) -> usize {
        self.predict_hits.load(Ordering::SeqCst)
    }

    pub fn last_body(&self) -> Option<Value> {
        self.last_body.lock().unwrap().clone()
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::with_api_base(&self.base_url)
    }

    /// Controller wired to this service, catalog already loaded
    pub async fn controller(&self) -> SubmissionController {
        self.controller_with(self.config()).await
    }

    pub async fn controller_with(&self, config: ClientConfig) -> SubmissionController {
        let backend = HttpBackend::new(&config).unwrap();
        let controller = SubmissionController::new(Arc::new(backend));
        controller.init().await;
        controller
    }
}

pub fn default_tribes() -> (StatusCode, Value) {
    (
        StatusCode::OK,
        json!({ "success": true, "count": 3, "tribes": ["Kikuyu", "Luo", "Kalenjin"] }),
    )
}

async fn tribes_handler(State(ctx): State<MockContext>) -> Response {
    let (status, body) = ctx.tribes.clone();
    (status, Json(body)).into_response()
}

async fn predict_handler(State(ctx): State<MockContext>, Json(body): Json<Value>) -> Response {
    let hit = ctx.predict_hits.fetch_add(1, Ordering::SeqCst);
    *ctx.last_body.lock().unwrap() = Some(body);

    match ctx.predict {
        PredictBehavior::Respond(status, value) => (status, Json(value)).into_response(),
        PredictBehavior::RawText(status, text) => (status, text).into_response(),
        PredictBehavior::Delay(delay, value) => {
            tokio::time::sleep(delay).await;
            (StatusCode::OK, Json(value)).into_response()
        }
        PredictBehavior::Gate(gate, value) => {
            gate.notified().await;
            (StatusCode::OK, Json(value)).into_response()
        }
        PredictBehavior::FailFirst(status, _) if hit == 0 => {
            (status, Json(json!({ "success": false, "error": "try later" }))).into_response()
        }
        PredictBehavior::FailFirst(_, value) => (StatusCode::OK, Json(value)).into_response(),
    }
}
