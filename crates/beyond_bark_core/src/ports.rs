//! crates/beyond_bark_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::chat::{ChatRequest, ChatResponse};
use crate::domain::{
    Actor, AuthSession, NewRescuePet, Profile, RescuePet, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    /// The remote service could not be reached or timed out.
    #[error("Network error: {0}")]
    Transport(String),
    /// The remote service answered, but refused the request.
    #[error("Request rejected: {0}")]
    Rejected(String),
    /// A report completion contained none of the expected sections.
    #[error("The model returned no usable sections")]
    EmptyReport { raw: String },
    #[error("Pet {0} has already been rescued")]
    AlreadyRescued(Uuid),
    #[error("The request was cancelled")]
    Cancelled,
    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<PortError> },
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// Whether trying the same call again has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PortError::Transport(_) | PortError::EmptyReport { .. })
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Sends a chat request to the completion endpoint.
    async fn complete(&self, request: ChatRequest) -> PortResult<ChatResponse>;
}

#[async_trait]
pub trait ImageHostService: Send + Sync {
    /// Uploads image bytes and returns the publicly reachable URL.
    async fn upload_image(&self, file_name: &str, image: Vec<u8>) -> PortResult<String>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user_with_email(
        &self,
        display_name: &str,
        email: &str,
        hashed_password: &str,
        profile: &Profile,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    /// Replaces the display name and profile of an existing user.
    async fn update_profile(
        &self,
        user_id: Uuid,
        display_name: &str,
        profile: &Profile,
    ) -> PortResult<User>;

    async fn create_auth_session(&self, session: AuthSession) -> PortResult<()>;

    /// Resolves a live session to its user. Expired sessions are `Unauthorized`.
    async fn validate_auth_session(&self, session_id: &str, now: DateTime<Utc>) -> PortResult<User>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}

#[async_trait]
pub trait RescueStore: Send + Sync {
    async fn register_pet(&self, pet: NewRescuePet, registrant: &Actor) -> PortResult<RescuePet>;

    async fn get_pet(&self, pet_id: Uuid) -> PortResult<RescuePet>;

    /// Lists pets by rescue status, oldest registration first.
    async fn list_pets(&self, rescued: bool) -> PortResult<Vec<RescuePet>>;

    /// Claims a pet for `rescuer`. Exactly one concurrent claimant succeeds;
    /// every other one gets `PortError::AlreadyRescued`.
    async fn claim_pet(&self, pet_id: Uuid, rescuer: &Actor) -> PortResult<RescuePet>;
}
