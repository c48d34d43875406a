#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use serde_json::Value;
use tower::ServiceExt;

use daily_word_backend::app_with_state;
use daily_word_backend::services::word_generator::{
    GeneratedWord, GenerationError, StaticWordGenerator, WordGenerator,
};
use daily_word_backend::state::AppState;
use daily_word_backend::store::{MemoryStore, WordStore};

/// Static generator that counts how often it is asked for a word.
#[derive(Default)]
pub struct CountingGenerator {
    inner: StaticWordGenerator,
    calls: AtomicUsize,
}

impl CountingGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WordGenerator for CountingGenerator {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn generate(&self, date: NaiveDate) -> Result<GeneratedWord, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.generate(date).await
    }
}

pub struct FailingGenerator;

#[async_trait]
impl WordGenerator for FailingGenerator {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn generate(&self, _date: NaiveDate) -> Result<GeneratedWord, GenerationError> {
        Err(GenerationError::Invalid("upstream secret detail".into()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub generator: Arc<CountingGenerator>,
}

pub fn create_test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(CountingGenerator::default());
    let state = AppState::new(store.clone(), generator.clone());
    TestApp {
        router: app_with_state(state),
        store,
        generator,
    }
}

pub fn create_failing_app() -> Router {
    let state = AppState::new(Arc::new(MemoryStore::new()), Arc::new(FailingGenerator));
    app_with_state(state)
}

/// Inserts one generated word per day starting at `first`.
pub async fn seed_words(store: &MemoryStore, first: NaiveDate, count: u64) {
    let generator = StaticWordGenerator::new();
    for offset in 0..count {
        let date = first + chrono::Days::new(offset);
        let generated = generator.build(date);
        store
            .create_word_with_questions(generated.word, generated.questions)
            .await
            .unwrap();
    }
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
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
