//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: signup, login and logout, plus reading and editing
//! the logged-in user's profile.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use beyond_bark_core::domain::{AuthSession, Profile, User};
use beyond_bark_core::ports::PortError;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::errors::{port_error_response, HandlerError};
use crate::web::state::AppState;

const SESSION_DAYS: i64 = 30;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub display_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema, Default)]
pub struct ProfileFields {
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub favorite_animal: Option<String>,
    pub favorite_pet: Option<String>,
    pub favorite_bird: Option<String>,
    /// A hosted image URL, as returned by `POST /images`.
    pub photo_url: Option<String>,
}

impl From<Profile> for ProfileFields {
    fn from(profile: Profile) -> Self {
        Self {
            phone: profile.phone,
            date_of_birth: profile.date_of_birth,
            gender: profile.gender,
            favorite_animal: profile.favorite_animal,
            favorite_pet: profile.favorite_pet,
            favorite_bird: profile.favorite_bird,
            photo_url: profile.photo_url,
        }
    }
}

impl From<ProfileFields> for Profile {
    fn from(fields: ProfileFields) -> Self {
        Self {
            phone: fields.phone,
            date_of_birth: fields.date_of_birth,
            gender: fields.gender,
            favorite_animal: fields.favorite_animal,
            favorite_pet: fields.favorite_pet,
            favorite_bird: fields.favorite_bird,
            photo_url: fields.photo_url,
        }
    }
}

/// Omitted fields are left unchanged; an empty string clears a text field.
#[derive(Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub profile: ProfileFields,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub display_name: String,
    pub email: String,
    pub profile: ProfileFields,
}

impl From<User> for AuthResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            display_name: user.display_name,
            email: user.email,
            profile: user.profile.into(),
        }
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Extracts the auth session id from the `session` cookie, if present.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|id| !id.is_empty())
}

/// Creates a fresh auth session for the user and returns its `Set-Cookie` value.
async fn start_session(state: &AppState, user_id: Uuid) -> Result<String, HandlerError> {
    let session = AuthSession {
        id: Uuid::new_v4().to_string(),
        user_id,
        expires_at: Utc::now() + Duration::days(SESSION_DAYS),
    };
    let cookie = format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        session.id,
        Duration::days(SESSION_DAYS).num_seconds()
    );

    state
        .users
        .create_auth_session(session)
        .await
        .map_err(|e| port_error_response("Failed to create session", e))?;
    Ok(cookie)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || req.password.is_empty() || req.display_name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Name, email and password are required".to_string(),
        ));
    }

    // 1. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to hash password".to_string())
        })?
        .to_string();

    // 2. Create user
    let mut profile = Profile::default();
    profile.apply(Profile {
        phone: req.phone,
        date_of_birth: req.date_of_birth,
        gender: req.gender,
        ..Profile::default()
    });
    let user = state
        .users
        .create_user_with_email(req.display_name.trim(), &email, &password_hash, &profile)
        .await
        .map_err(|e| port_error_response("Failed to create user", e))?;

    // 3. Start an auth session and hand back its cookie
    let cookie = start_session(&state, user.user_id).await?;
    info!(user_id = %user.user_id, "User signed up");

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse::from(user)),
    ))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let invalid = || (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string());

    // 1. Get user by email
    let credentials = state
        .users
        .get_user_by_email(&req.email.trim().to_lowercase())
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => invalid(),
            other => port_error_response("Failed to log in", other),
        })?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&credentials.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Authentication error".to_string())
    })?;
    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid());
    }

    // 3. Start an auth session and hand back its cookie
    let cookie = start_session(&state, credentials.user_id).await?;
    info!(user_id = %credentials.user_id, "User logged in");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse::from(credentials.to_user())),
    ))
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HandlerError> {
    let auth_session_id = session_id_from_headers(&headers)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    state
        .users
        .delete_auth_session(auth_session_id)
        .await
        .map_err(|e| port_error_response("Failed to logout", e))?;

    let cookie = "session=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0";
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie.to_string())]))
}

/// GET /auth/me - The profile of the logged-in user
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = AuthResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn me_handler(Extension(user): Extension<User>) -> Json<AuthResponse> {
    Json(AuthResponse::from(user))
}

/// PUT /auth/me - Edit the profile of the logged-in user
#[utoipa::path(
    put,
    path = "/auth/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated user", body = AuthResponse),
        (status = 400, description = "Blank display name"),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_me_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<AuthResponse>, HandlerError> {
    let display_name = match req.display_name.as_deref().map(str::trim) {
        Some("") => {
            return Err((StatusCode::BAD_REQUEST, "The name cannot be blank".to_string()));
        }
        Some(name) => name.to_string(),
        None => user.display_name,
    };

    let mut profile = user.profile;
    profile.apply(req.profile.into());

    let updated = state
        .users
        .update_profile(user.user_id, &display_name, &profile)
        .await
        .map_err(|e| port_error_response("Failed to update profile", e))?;
    info!(user_id = %updated.user_id, "Profile edited");
    Ok(Json(updated.into()))
}
