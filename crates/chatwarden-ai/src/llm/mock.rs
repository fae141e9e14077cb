//! Deterministic scripted backend for reliability tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{BackendError, Result};
use crate::llm::client::{CompletionBackend, CompletionRequest};

/// A backend driven by a script of canned outcomes.
///
/// Each `complete` call consumes the next step; an exhausted script fails
/// with a transient error so tests notice unexpected extra calls.
#[derive(Clone, Default)]
pub struct MockBackend {
    script: Arc<Mutex<VecDeque<Result<String>>>>,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<Result<String>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::from(steps))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn push_text(&self, text: impl Into<String>) {
        self.script.lock().await.push_back(Ok(text.into()));
    }

    pub async fn push_error(&self, error: BackendError) {
        self.script.lock().await.push_back(Err(error));
    }

    /// Number of `complete` calls observed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    fn provider(&self) -> &str {
        "mock"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Transient("mock script exhausted".to_string())))
    }
}
