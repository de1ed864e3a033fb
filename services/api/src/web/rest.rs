//! services/api/src/web/rest.rs
//!
//! The OpenAPI description of every REST endpoint, served by Swagger UI and
//! written to disk by the `openapi` binary.

use utoipa::OpenApi;

use crate::web::{assist, auth, images, rescue};

//=========================================================================================
// OpenAPI Documentation
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        auth::update_me_handler,
        images::upload_image_handler,
        assist::mood_handler,
        assist::disease_handler,
        assist::symptoms_handler,
        assist::species_handler,
        assist::chat_handler,
        assist::suggestions_handler,
        rescue::register_pet_handler,
        rescue::list_pets_handler,
        rescue::get_pet_handler,
        rescue::rescue_pet_handler,
    ),
    components(
        schemas(
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            auth::ProfileFields,
            auth::UpdateProfileRequest,
            images::ImageUpload,
            images::ImageUploadResponse,
            assist::ImageAssistRequest,
            assist::SymptomsRequest,
            assist::SpeciesRequest,
            assist::ChatQuestion,
            assist::SuggestionsRequest,
            assist::SentenceResponse,
            assist::SectionView,
            assist::ReportResponse,
            rescue::RegisterPetRequest,
            rescue::PetView,
        )
    ),
    tags(
        (name = "Beyond Bark API", description = "Pet care assistant and rescue board.")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/signup",
            "/auth/login",
            "/auth/logout",
            "/auth/me",
            "/images",
            "/assist/mood",
            "/assist/disease",
            "/assist/symptoms",
            "/assist/species",
            "/assist/chat",
            "/assist/suggestions",
            "/rescue/pets",
            "/rescue/pets/{pet_id}",
            "/rescue/pets/{pet_id}/rescue",
        ] {
            assert!(doc.paths.paths.contains_key(path), "undocumented: {path}");
        }
        assert!(doc.paths.paths["/auth/me"].put.is_some());
    }
}
