//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{completions::OpenAiCompletions, db::PgStore},
    config::Config,
    error::ApiError,
    web::{
        auth::{login_handler, logout_handler, signup_handler},
        middleware::require_auth,
        rest::ApiDoc,
        state::AppState,
        analyze_handler, generate_handler, get_profile_handler, list_documents_handler,
        put_profile_handler, subscription_handler, upgrade_handler,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use mediscribe_core::entitlement::EntitlementService;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PgStore::new(db_pool.clone()));
    info!("Running database migrations...");
    store.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    if config.openai_api_key.is_none() {
        // Not fatal: analysis/generation will answer with a configuration
        // error until a key is provided.
        info!("OPENAI_API_KEY not set; completion endpoints will be unavailable.");
    }
    let analysis_completions = Arc::new(OpenAiCompletions::new(
        config.openai_api_key.as_deref(),
        config.analysis_model.clone(),
    ));
    let generation_completions = Arc::new(OpenAiCompletions::new(
        config.openai_api_key.as_deref(),
        config.generation_model.clone(),
    ));
    let entitlements = EntitlementService::new(store.clone());

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        store,
        analysis_completions,
        generation_completions,
        entitlements,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .frontend_origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("Invalid FRONTEND_ORIGIN: {e}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/analyze", post(analyze_handler))
        .route("/generate", post(generate_handler))
        .route("/subscription", get(subscription_handler))
        .route("/subscription/upgrade", post(upgrade_handler))
        .route("/documents", get(list_documents_handler))
        .route("/profile", get(get_profile_handler).put(put_profile_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
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
