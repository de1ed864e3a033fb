//! services/api/src/web/assist.rs
//!
//! Endpoints that forward a single question about an animal to the assistant.
//! Images must already be hosted (see `POST /images`); only their URLs are sent.

use axum::{extract::State, Json};
use beyond_bark_core::prompts::resolve_species;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::assistant::Assessment;
use crate::web::errors::{port_error_response, HandlerError};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct ImageAssistRequest {
    pub image_url: String,
    /// A species label such as "Dog". "Other" defers to `other_species`.
    pub species: String,
    pub other_species: Option<String>,
}

impl ImageAssistRequest {
    fn species(&self) -> &str {
        resolve_species(&self.species, self.other_species.as_deref())
    }
}

#[derive(Deserialize, ToSchema)]
pub struct SymptomsRequest {
    pub symptoms: String,
    pub species: String,
    pub other_species: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SpeciesRequest {
    pub image_url: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ChatQuestion {
    pub question: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SuggestionsRequest {
    pub mood: String,
}

#[derive(Serialize, ToSchema)]
pub struct SentenceResponse {
    pub text: String,
}

#[derive(Serialize, ToSchema)]
pub struct SectionView {
    pub label: String,
    pub text: String,
}

/// A multi-section answer. Sections keep the order they were requested in;
/// a heading the model left out comes back with empty text.
#[derive(Serialize, ToSchema)]
pub struct ReportResponse {
    pub raw: String,
    pub sections: Vec<SectionView>,
}

impl From<Assessment> for ReportResponse {
    fn from(assessment: Assessment) -> Self {
        let sections = assessment
            .sections
            .iter()
            .map(|(label, text)| SectionView {
                label: label.to_string(),
                text: text.to_string(),
            })
            .collect();
        Self {
            raw: assessment.raw,
            sections,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /assist/mood - Describe the mood of the animal in a photo
#[utoipa::path(
    post,
    path = "/assist/mood",
    request_body = ImageAssistRequest,
    responses(
        (status = 200, description = "One-sentence mood description", body = SentenceResponse),
        (status = 401, description = "Not logged in"),
        (status = 502, description = "The completion endpoint rejected the request"),
        (status = 504, description = "The completion endpoint could not be reached")
    )
)]
pub async fn mood_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImageAssistRequest>,
) -> Result<Json<SentenceResponse>, HandlerError> {
    let text = state
        .assistant
        .predict_mood(&req.image_url, req.species())
        .await
        .map_err(|e| port_error_response("Failed to detect mood", e))?;
    Ok(Json(SentenceResponse { text }))
}

/// POST /assist/disease - Predict a visible health issue from a photo
#[utoipa::path(
    post,
    path = "/assist/disease",
    request_body = ImageAssistRequest,
    responses(
        (status = 200, description = "One-sentence disease prediction", body = SentenceResponse),
        (status = 401, description = "Not logged in"),
        (status = 502, description = "The completion endpoint rejected the request"),
        (status = 504, description = "The completion endpoint could not be reached")
    )
)]
pub async fn disease_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImageAssistRequest>,
) -> Result<Json<SentenceResponse>, HandlerError> {
    let text = state
        .assistant
        .predict_disease(&req.image_url, req.species())
        .await
        .map_err(|e| port_error_response("Failed to predict disease", e))?;
    Ok(Json(SentenceResponse { text }))
}

/// POST /assist/symptoms - Assess described symptoms
#[utoipa::path(
    post,
    path = "/assist/symptoms",
    request_body = SymptomsRequest,
    responses(
        (status = 200, description = "Structured symptom report", body = ReportResponse),
        (status = 401, description = "Not logged in"),
        (status = 502, description = "The completion endpoint rejected the request"),
        (status = 504, description = "The completion endpoint could not be reached")
    )
)]
pub async fn symptoms_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SymptomsRequest>,
) -> Result<Json<ReportResponse>, HandlerError> {
    let species = resolve_species(&req.species, req.other_species.as_deref());
    let report = state
        .assistant
        .assess_symptoms(&req.symptoms, species)
        .await
        .map_err(|e| port_error_response("Failed to assess symptoms", e))?;
    Ok(Json(report.into()))
}

/// POST /assist/species - Identify the species in a photo
#[utoipa::path(
    post,
    path = "/assist/species",
    request_body = SpeciesRequest,
    responses(
        (status = 200, description = "Structured species report", body = ReportResponse),
        (status = 401, description = "Not logged in"),
        (status = 502, description = "The completion endpoint rejected the request"),
        (status = 504, description = "The completion endpoint could not be reached")
    )
)]
pub async fn species_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeciesRequest>,
) -> Result<Json<ReportResponse>, HandlerError> {
    let report = state
        .assistant
        .identify_species(&req.image_url)
        .await
        .map_err(|e| port_error_response("Failed to identify species", e))?;
    Ok(Json(report.into()))
}

/// POST /assist/chat - Ask the pet-care assistant a question
#[utoipa::path(
    post,
    path = "/assist/chat",
    request_body = ChatQuestion,
    responses(
        (status = 200, description = "Short answer", body = SentenceResponse),
        (status = 401, description = "Not logged in"),
        (status = 502, description = "The completion endpoint rejected the request"),
        (status = 504, description = "The completion endpoint could not be reached")
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatQuestion>,
) -> Result<Json<SentenceResponse>, HandlerError> {
    let text = state
        .assistant
        .ask(&req.question)
        .await
        .map_err(|e| port_error_response("Failed to answer question", e))?;
    Ok(Json(SentenceResponse { text }))
}

/// POST /assist/suggestions - Care suggestions for a detected mood
///
/// Retried on transient failures. Dropping the request cancels any pending retry.
#[utoipa::path(
    post,
    path = "/assist/suggestions",
    request_body = SuggestionsRequest,
    responses(
        (status = 200, description = "Care suggestions by section", body = ReportResponse),
        (status = 401, description = "Not logged in"),
        (status = 502, description = "No usable answer after retrying")
    )
)]
pub async fn suggestions_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SuggestionsRequest>,
) -> Result<Json<ReportResponse>, HandlerError> {
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let report = state
        .assistant
        .care_suggestions(&req.mood, &cancel)
        .await
        .map_err(|e| port_error_response("Failed to fetch care suggestions", e))?;
    Ok(Json(report.into()))
}
