use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{AiClient, AiError, AiRequest};

/// Scripted client: pops one reply per call and records every request.
/// With no replies left every call fails.
#[derive(Default)]
pub struct FakeAiClient {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<AiRequest>>,
}

impl FakeAiClient {
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            requests: Mutex::default(),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(reply.into());
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<AiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiClient for FakeAiClient {
    async fn generate(&self, request: AiRequest) -> Result<String, AiError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(AiError::Api {
                status: 503,
                message: "fake service unavailable".into(),
            })
    }
}
