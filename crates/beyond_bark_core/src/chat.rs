//! crates/beyond_bark_core/src/chat.rs
//!
//! The request and response shapes exchanged with a chat-completion endpoint.
//! Adapters translate these to and from whatever client library they use.

/// Who authored a message in the conversation sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

/// A single message in a chat request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    role: Role,
    content: String,
    image_url: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            image_url: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            image_url: None,
        }
    }

    /// A user message that also references an externally hosted image.
    pub fn user_with_image(content: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            image_url: Some(image_url.into()),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}

/// A complete chat-completion request. Built fresh per call, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    pub id: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

impl ChatResponse {
    /// The text of the first choice. Any further choices are ignored.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|choice| choice.content.as_str())
    }
}
