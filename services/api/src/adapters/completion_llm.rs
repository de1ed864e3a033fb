//! services/api/src/adapters/completion_llm.rs
//!
//! This module contains the adapter for the OpenAI-compatible completion endpoint.
//! It implements the `CompletionService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse, ImageUrlArgs,
    },
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use beyond_bark_core::{
    chat::{ChatRequest, ChatResponse, Choice, Message, Role, Usage},
    ports::{CompletionService, PortError, PortResult},
};
use std::time::Duration;
use tracing::{debug, info};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `CompletionService` using an OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiCompletionAdapter {
    client: Client<OpenAIConfig>,
}

impl OpenAiCompletionAdapter {
    /// Creates a new `OpenAiCompletionAdapter` around an already configured client.
    ///
    /// The client's own backoff is switched off: every call is sent exactly once
    /// and retries are left to the caller's `RetryPolicy`.
    pub fn new(client: Client<OpenAIConfig>) -> Self {
        let single_attempt = ExponentialBackoff {
            max_elapsed_time: Some(Duration::ZERO),
            ..Default::default()
        };
        Self {
            client: client.with_backoff(single_attempt),
        }
    }
}

//=========================================================================================
// `CompletionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CompletionService for OpenAiCompletionAdapter {
    async fn complete(&self, request: ChatRequest) -> PortResult<ChatResponse> {
        info!(model = %request.model, max_tokens = request.max_tokens, "Sending completion request");
        let openai_request = to_openai_request(&request)?;

        let response = self
            .client
            .chat()
            .create(openai_request)
            .await
            .map_err(map_openai_error)?;

        debug!(id = %response.id, choices = response.choices.len(), "Completion received");
        Ok(from_openai_response(response))
    }
}

//=========================================================================================
// Conversions
//=========================================================================================

#[allow(deprecated)]
fn to_openai_request(request: &ChatRequest) -> PortResult<CreateChatCompletionRequest> {
    let messages = request
        .messages
        .iter()
        .map(to_openai_message)
        .collect::<PortResult<Vec<_>>>()?;

    CreateChatCompletionRequestArgs::default()
        .model(&request.model)
        .messages(messages)
        .max_tokens(request.max_tokens)
        .n(1)
        .build()
        .map_err(|e| PortError::Unexpected(e.to_string()))
}

fn to_openai_message(message: &Message) -> PortResult<ChatCompletionRequestMessage> {
    let message = match message.role() {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(message.content())
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into(),
        Role::User => {
            let content = match message.image_url() {
                Some(url) => ChatCompletionRequestUserMessageContent::Array(vec![
                    ChatCompletionRequestUserMessageContentPart::Text(
                        ChatCompletionRequestMessageContentPartTextArgs::default()
                            .text(message.content())
                            .build()
                            .map_err(|e| PortError::Unexpected(e.to_string()))?,
                    ),
                    ChatCompletionRequestUserMessageContentPart::ImageUrl(
                        ChatCompletionRequestMessageContentPartImageArgs::default()
                            .image_url(
                                ImageUrlArgs::default()
                                    .url(url)
                                    .build()
                                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
                            )
                            .build()
                            .map_err(|e| PortError::Unexpected(e.to_string()))?,
                    ),
                ]),
                None => ChatCompletionRequestUserMessageContent::Text(message.content().to_string()),
            };
            ChatCompletionRequestUserMessageArgs::default()
                .content(content)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into()
        }
    };
    Ok(message)
}

fn from_openai_response(response: CreateChatCompletionResponse) -> ChatResponse {
    ChatResponse {
        id: response.id,
        created: i64::from(response.created),
        model: response.model,
        choices: response
            .choices
            .into_iter()
            .map(|choice| Choice {
                content: choice.message.content.unwrap_or_default(),
            })
            .collect(),
        usage: response
            .usage
            .map(|usage| Usage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            })
            .unwrap_or_default(),
    }
}

/// Network failures are transient. An API error means the endpoint answered; one
/// without a type or code is a 5xx whose body was not an OpenAI error, and is
/// treated as transient too.
fn map_openai_error(error: OpenAIError) -> PortError {
    match error {
        OpenAIError::Reqwest(e) => PortError::Transport(e.to_string()),
        OpenAIError::ApiError(e) if e.r#type.is_none() && e.code.is_none() => {
            PortError::Transport(format!("server error: {}", e.message))
        }
        OpenAIError::ApiError(e) => {
            let mut message = match &e.r#type {
                Some(kind) => format!("{}: {}", kind, e.message),
                None => e.message.clone(),
            };
            if let Some(code) = e.code.as_ref().map(ToString::to_string) {
                message.push_str(&format!(" (code: {})", code));
            }
            PortError::Rejected(message)
        }
        other => PortError::Unexpected(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Router};
    use beyond_bark_core::prompts::{build_request, AssistTask, ModelCatalog};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn models() -> ModelCatalog {
        ModelCatalog {
            vision_model: "vision".to_string(),
            text_model: "text".to_string(),
        }
    }

    #[test]
    fn text_request_serializes_with_budget_and_two_messages() {
        let request = build_request(&AssistTask::CareSuggestions { mood: "anxious" }, &models());
        let json = serde_json::to_value(to_openai_request(&request).unwrap()).unwrap();

        assert_eq!(json["model"], "text");
        assert_eq!(json["max_tokens"], request.max_tokens);
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert!(json["messages"][1]["content"]
            .as_str()
            .unwrap()
            .contains("anxious"));
    }

    #[test]
    fn image_reference_becomes_an_image_part() {
        let url = "https://i.ibb.co/x/cat.png";
        let request = build_request(
            &AssistTask::DiseasePrediction {
                image_url: url,
                species: "Cat",
            },
            &models(),
        );
        let json = serde_json::to_value(to_openai_request(&request).unwrap()).unwrap();

        let parts = json["messages"][1]["content"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], url);
    }

    /// Serves `/v1/chat/completions` with a fixed answer and counts the hits.
    async fn fixed_endpoint(status: StatusCode, body: &'static str) -> (OpenAiCompletionAdapter, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (status, [("content-type", "application/json")], body)
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = OpenAIConfig::new()
            .with_api_key("test-key")
            .with_api_base(format!("http://{}/v1", addr));
        (OpenAiCompletionAdapter::new(Client::with_config(config)), hits)
    }

    fn chat_request() -> ChatRequest {
        build_request(&AssistTask::Chatbot { question: "Can cats eat tuna?" }, &models())
    }

    #[tokio::test]
    async fn server_error_is_sent_once_and_reported_as_transient() {
        let (adapter, hits) = fixed_endpoint(StatusCode::SERVICE_UNAVAILABLE, "upstream busy").await;

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            adapter.complete(chat_request()),
        )
        .await
        .expect("a failing call should return promptly");

        assert!(matches!(result, Err(PortError::Transport(_))));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejection_keeps_the_error_type_and_code() {
        let body = r#"{"error":{"message":"model not found","type":"invalid_request_error","param":null,"code":"model_not_found"}}"#;
        let (adapter, hits) = fixed_endpoint(StatusCode::NOT_FOUND, body).await;

        match adapter.complete(chat_request()).await {
            Err(PortError::Rejected(message)) => {
                assert!(message.starts_with("invalid_request_error: model not found"));
                assert!(message.contains("model_not_found"));
            }
            other => panic!("expected a rejection, got {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
