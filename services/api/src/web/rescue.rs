//! services/api/src/web/rescue.rs
//!
//! The shared rescue board: report an abandoned animal, browse pending and
//! rescued animals, and claim one. A pet can be claimed exactly once; any later
//! claim is answered with 409 Conflict.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use beyond_bark_core::domain::{Actor, NewRescuePet, RescuePet, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::web::errors::{port_error_response, HandlerError};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterPetRequest {
    pub common_name: String,
    pub breed: String,
    pub location: String,
    pub condition: String,
}

#[derive(Deserialize, IntoParams)]
pub struct ListPetsQuery {
    /// `true` lists rescued pets; omitted or `false` lists pets awaiting rescue.
    pub rescued: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct PetView {
    pub id: Uuid,
    pub common_name: String,
    pub breed: String,
    pub location: String,
    pub condition: String,
    pub registered_by: String,
    pub registered_by_email: String,
    pub register_date: DateTime<Utc>,
    pub rescued: bool,
    pub rescued_by: Option<String>,
    pub rescued_by_email: Option<String>,
    pub rescue_date: Option<DateTime<Utc>>,
}

impl From<RescuePet> for PetView {
    fn from(pet: RescuePet) -> Self {
        Self {
            id: pet.id,
            common_name: pet.common_name,
            breed: pet.breed,
            location: pet.location,
            condition: pet.condition,
            registered_by: pet.registered_by,
            registered_by_email: pet.registered_by_email,
            register_date: pet.register_date,
            rescued: pet.rescued,
            rescued_by: pet.rescued_by,
            rescued_by_email: pet.rescued_by_email,
            rescue_date: pet.rescue_date,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /rescue/pets - Report an abandoned animal
#[utoipa::path(
    post,
    path = "/rescue/pets",
    request_body = RegisterPetRequest,
    responses(
        (status = 201, description = "Pet registered", body = PetView),
        (status = 400, description = "Missing pet name"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn register_pet_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<RegisterPetRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if req.common_name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "A pet name is required".to_string()));
    }

    let pet = NewRescuePet {
        common_name: req.common_name.trim().to_string(),
        breed: req.breed.trim().to_string(),
        location: req.location.trim().to_string(),
        condition: req.condition.trim().to_string(),
    };
    let registered = state
        .pets
        .register_pet(pet, &Actor::from(&user))
        .await
        .map_err(|e| port_error_response("Failed to register pet", e))?;

    Ok((StatusCode::CREATED, Json(PetView::from(registered))))
}

/// GET /rescue/pets - List pets awaiting rescue, or rescued pets
#[utoipa::path(
    get,
    path = "/rescue/pets",
    params(ListPetsQuery),
    responses(
        (status = 200, description = "Pets, oldest report first", body = Vec<PetView>),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_pets_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListPetsQuery>,
) -> Result<Json<Vec<PetView>>, HandlerError> {
    let pets = state
        .pets
        .list_pets(query.rescued.unwrap_or(false))
        .await
        .map_err(|e| port_error_response("Failed to list pets", e))?;
    Ok(Json(pets.into_iter().map(PetView::from).collect()))
}

/// GET /rescue/pets/{pet_id} - A single rescue record
#[utoipa::path(
    get,
    path = "/rescue/pets/{pet_id}",
    params(("pet_id" = Uuid, Path, description = "Pet id")),
    responses(
        (status = 200, description = "The pet", body = PetView),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "No such pet")
    )
)]
pub async fn get_pet_handler(
    State(state): State<Arc<AppState>>,
    Path(pet_id): Path<Uuid>,
) -> Result<Json<PetView>, HandlerError> {
    let pet = state
        .pets
        .get_pet(pet_id)
        .await
        .map_err(|e| port_error_response("Failed to load pet", e))?;
    Ok(Json(pet.into()))
}

/// POST /rescue/pets/{pet_id}/rescue - Claim a pet as rescued by the caller
#[utoipa::path(
    post,
    path = "/rescue/pets/{pet_id}/rescue",
    params(("pet_id" = Uuid, Path, description = "Pet id")),
    responses(
        (status = 200, description = "Claim accepted", body = PetView),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "No such pet"),
        (status = 409, description = "Somebody already rescued this pet")
    )
)]
pub async fn rescue_pet_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(pet_id): Path<Uuid>,
) -> Result<Json<PetView>, HandlerError> {
    let pet = state
        .pets
        .claim_pet(pet_id, &Actor::from(&user))
        .await
        .map_err(|e| port_error_response("Failed to rescue pet", e))?;
    Ok(Json(pet.into()))
}
