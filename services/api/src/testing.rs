//! services/api/src/testing.rs
//!
//! Fakes for the outbound ports, shared by the unit tests of this crate.

use async_trait::async_trait;
use beyond_bark_core::{
    chat::{ChatRequest, ChatResponse, Choice, Usage},
    ports::{CompletionService, ImageHostService, PortError, PortResult},
    prompts::ModelCatalog,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::adapters::MemoryStore;
use crate::assistant::{PetAssistant, RetryPolicy};
use crate::web::state::AppState;

pub fn reply(content: &str) -> ChatResponse {
    ChatResponse {
        id: "chatcmpl-test".to_string(),
        created: 1_700_000_000,
        model: "test-model".to_string(),
        choices: vec![Choice {
            content: content.to_string(),
        }],
        usage: Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        },
    }
}

/// Plays back a fixed list of outcomes, one per call, and records every request.
pub struct ScriptedCompletion {
    script: Mutex<VecDeque<PortResult<ChatResponse>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedCompletion {
    pub fn new(script: Vec<PortResult<ChatResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: ChatRequest) -> PortResult<ChatResponse> {
        self.requests.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PortError::Unexpected("script exhausted".to_string())))
    }
}

/// Accepts every upload and hands back a predictable URL.
pub struct FakeImageHost;

#[async_trait]
impl ImageHostService for FakeImageHost {
    async fn upload_image(&self, file_name: &str, _image: Vec<u8>) -> PortResult<String> {
        Ok(format!("https://i.ibb.co/test/{}", file_name))
    }
}

/// An `AppState` over in-memory stores whose assistant replays `script`.
pub fn test_state(script: Vec<PortResult<ChatResponse>>) -> Arc<AppState> {
    let store = Arc::new(MemoryStore::new());
    let assistant = PetAssistant::new(
        Arc::new(ScriptedCompletion::new(script)),
        ModelCatalog {
            vision_model: "vision".to_string(),
            text_model: "text".to_string(),
        },
        RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(2)),
    );
    Arc::new(AppState {
        users: store.clone(),
        pets: store,
        images: Arc::new(FakeImageHost),
        assistant,
    })
}
