//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, ImgbbAdapter, MemoryStore, OpenAiCompletionAdapter},
    assistant::{PetAssistant, RetryPolicy},
    config::{Config, ConfigError},
    error::ApiError,
    web::{
        assist::{
            chat_handler, disease_handler, mood_handler, species_handler, suggestions_handler,
            symptoms_handler,
        },
        auth::{login_handler, logout_handler, me_handler, signup_handler, update_me_handler},
        images::upload_image_handler,
        require_auth,
        rescue::{get_pet_handler, list_pets_handler, register_pet_handler, rescue_pet_handler},
        rest::ApiDoc,
        AppState,
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use beyond_bark_core::{
    ports::{RescueStore, UserStore},
    prompts::ModelCatalog,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect Storage ---
    let (users, pets): (Arc<dyn UserStore>, Arc<dyn RescueStore>) = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = Arc::new(DbAdapter::new(db_pool));
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            let users: Arc<dyn UserStore> = db_adapter.clone();
            let pets: Arc<dyn RescueStore> = db_adapter;
            (users, pets)
        }
        None => {
            warn!("DATABASE_URL is not set; users and pets are kept in memory only");
            let store = Arc::new(MemoryStore::new());
            let users: Arc<dyn UserStore> = store.clone();
            let pets: Arc<dyn RescueStore> = store;
            (users, pets)
        }
    };

    // --- 3. Initialize Service Adapters ---
    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;

    let openai_config = OpenAIConfig::new()
        .with_api_key(config.completion_api_key.clone())
        .with_api_base(config.completion_api_base.clone());
    let openai_client = Client::with_config(openai_config).with_http_client(http.clone());
    let completion_adapter = Arc::new(OpenAiCompletionAdapter::new(openai_client));

    let image_host_key = config
        .image_host_key
        .clone()
        .ok_or_else(|| ConfigError::MissingVar("IMAGE_HOST_KEY".to_string()))?;
    let image_adapter = Arc::new(ImgbbAdapter::new(
        http,
        config.image_host_url.clone(),
        image_host_key,
    ));

    let assistant = PetAssistant::new(
        completion_adapter,
        ModelCatalog {
            vision_model: config.vision_model.clone(),
            text_model: config.text_model.clone(),
        },
        RetryPolicy::new(
            config.retry_max_attempts,
            config.retry_base_delay,
            config.retry_max_delay,
        ),
    );

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        users,
        pets,
        images: image_adapter,
        assistant,
    });

    // --- 5. Create the Web Router ---
    let cors_origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string())
    })?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/me", get(me_handler).put(update_me_handler))
        .route("/images", post(upload_image_handler))
        .route("/assist/mood", post(mood_handler))
        .route("/assist/disease", post(disease_handler))
        .route("/assist/symptoms", post(symptoms_handler))
        .route("/assist/species", post(species_handler))
        .route("/assist/chat", post(chat_handler))
        .route("/assist/suggestions", post(suggestions_handler))
        .route("/rescue/pets", post(register_pet_handler).get(list_pets_handler))
        .route("/rescue/pets/{pet_id}", get(get_pet_handler))
        .route("/rescue/pets/{pet_id}/rescue", post(rescue_pet_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
