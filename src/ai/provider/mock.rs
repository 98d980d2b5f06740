//! Scripted provider for tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use super::CompletionProvider;
use crate::types::{ErrorCategory, LlmError, Result};

type Responder = Box<dyn Fn(&str) -> Result<String> + Send + Sync>;

/// Provider whose replies are computed from the prompt, with an optional
/// script of leading failures
pub struct MockProvider {
    responder: Responder,
    failures: Mutex<VecDeque<ErrorCategory>>,
    delay: Duration,
    calls: AtomicU32,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            failures: Mutex::new(VecDeque::new()),
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `reply`
    pub fn replying(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(move |_| Ok(reply.clone()))
    }

    /// Always fail with the given category
    pub fn failing(category: ErrorCategory) -> Self {
        Self::new(move |_| Err(LlmError::with_provider(category, "scripted failure", "mock").into()))
    }

    /// Fail the first calls with these categories before answering normally
    pub fn with_failures(self, failures: &[ErrorCategory]) -> Self {
        if let Ok(mut queue) = self.failures.lock() {
            queue.extend(failures.iter().copied());
        }
        self
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn generate(&self, prompt: &str, _model: &str, _max_tokens: u32) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let scripted = self.failures.lock().ok().and_then(|mut q| q.pop_front());
        if let Some(category) = scripted {
            return Err(LlmError::with_provider(category, "scripted failure", "mock").into());
        }

        (self.responder)(prompt)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
