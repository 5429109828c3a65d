use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatRequest};
use tracing::debug;

use super::error::ReasonerError;

#[async_trait]
/// Text-in, text-out reasoning provider used for geographic eligibility.
pub trait EligibilityReasoner: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ReasonerError>;
}

/// LLM reasoner backed by `genai`. Provider credentials come from the usual environment
/// variables of the selected model's provider.
pub struct GenaiReasoner {
    client: Client,
    model: String,
}

impl GenaiReasoner {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::default(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EligibilityReasoner for GenaiReasoner {
    async fn complete(&self, prompt: &str) -> Result<String, ReasonerError> {
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)]);

        let response = self
            .client
            .exec_chat(&self.model, request, None)
            .await
            .map_err(|e| ReasonerError::Provider(e.to_string()))?;

        let text = response.first_text().unwrap_or_default().trim().to_string();
        if text.is_empty() {
            return Err(ReasonerError::EmptyResponse);
        }

        debug!(model = %self.model, chars = text.len(), "Reasoner response received");
        Ok(text)
    }
}

#[cfg(any(test, feature = "mock"))]
pub use mock::MockReasoner;

#[cfg(any(test, feature = "mock"))]
mod mock {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::EligibilityReasoner;
    use crate::eligibility::error::ReasonerError;

    type Responder = Box<dyn Fn(&str) -> Result<String, ReasonerError> + Send + Sync>;

    /// Reasoner that answers from a closure, or from a queue of canned responses.
    pub struct MockReasoner {
        responder: Responder,
        queued: Mutex<VecDeque<Result<String, ReasonerError>>>,
        prompts: Mutex<Vec<String>>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl MockReasoner {
        /// Answers every prompt with `respond(prompt)`.
        pub fn from_fn<F>(respond: F) -> Self
        where
            F: Fn(&str) -> Result<String, ReasonerError> + Send + Sync + 'static,
        {
            Self {
                responder: Box::new(respond),
                queued: Mutex::new(VecDeque::new()),
                prompts: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }

        /// Always answers with `response`.
        pub fn fixed(response: impl Into<String>) -> Self {
            let response = response.into();
            Self::from_fn(move |_| Ok(response.clone()))
        }

        /// Always fails.
        pub fn failing() -> Self {
            Self::from_fn(|_| Err(ReasonerError::Provider("service unavailable".to_string())))
        }

        /// Serves queued responses first, then falls back to the responder.
        pub fn push_response(&self, response: Result<String, ReasonerError>) {
            self.queued.lock().push_back(response);
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().clone()
        }
    }

    #[async_trait]
    impl EligibilityReasoner for MockReasoner {
        async fn complete(&self, prompt: &str) -> Result<String, ReasonerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().push(prompt.to_string());

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let queued = self.queued.lock().pop_front();
            match queued {
                Some(response) => response,
                None => (self.responder)(prompt),
            }
        }
    }
}
