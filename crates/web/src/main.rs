use std::sync::Arc;

use anyhow::Context;
use storage::Database;
use storage::clock::SystemClock;
use storage::repository::{MemoryRepo, Repo};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod extractors;
mod features;
mod middleware;
mod state;

use config::Config;
use features::{comments, contests, photos, ranking};
use middleware::auth::ApiKeys;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        photos::handlers::create_photo,
        photos::handlers::update_photo,
        photos::handlers::delete_photo,
        photos::handlers::report_photo,
        photos::handlers::get_photo_votes,
        photos::handlers::get_vote,
        photos::handlers::cast_vote,
        comments::handlers::list_photo_comments,
        comments::handlers::add_photo_comment,
        comments::handlers::list_contest_comments,
        comments::handlers::add_contest_comment,
        contests::handlers::list_contests,
        contests::handlers::create_contest,
        contests::handlers::owned_contests,
        contests::handlers::get_contest,
        contests::handlers::update_contest,
        contests::handlers::delete_contest,
        contests::handlers::publish_contest,
        contests::handlers::contest_status,
        contests::handlers::register,
        contests::handlers::pending_registrations,
        contests::handlers::decide_registration,
        contests::handlers::get_contest_vote,
        contests::handlers::cast_contest_vote,
        contests::handlers::contest_rankings,
        ranking::handlers::get_rankings,
    ),
    components(
        schemas(
            storage::dto::photo::PhotoRequest,
            storage::dto::photo::ReportResponse,
            storage::dto::photo::DeleteOutcome,
            storage::dto::photo::DeletePhotoResponse,
            storage::dto::vote::CastVoteRequest,
            storage::dto::vote::VoteResponse,
            storage::dto::comment::CommentRequest,
            storage::dto::contest::ContestRequest,
            storage::dto::contest::ContestResponse,
            storage::dto::contest::ContestStatusResponse,
            storage::dto::contest::RegisterRequest,
            storage::dto::contest::ApprovalDecision,
            storage::dto::contest::ApprovalRequest,
            storage::dto::common::PaginationMeta,
            storage::dto::ranking::RankingEntry,
            storage::dto::ranking::PhotoVotesResponse,
            storage::models::Photo,
            storage::models::Contest,
            storage::models::RegItem,
            storage::models::Phase,
            storage::models::Comment,
            storage::models::Commentable,
        )
    ),
    tags(
        (name = "photos", description = "Photo metadata owned by end users"),
        (name = "votes", description = "Heart ratings, open and per contest"),
        (name = "contests", description = "Contest lifecycle"),
        (name = "registrations", description = "Contest entries and owner approval"),
        (name = "rankings", description = "Confidence-adjusted photo rankings"),
        (name = "comments", description = "Comments on photos and contests"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

async fn open_repo(config: &Config) -> anyhow::Result<Arc<dyn Repo>> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, using the in-memory store; data is lost on exit");
        return Ok(Arc::new(MemoryRepo::new()));
    };

    tracing::info!(
        "Connecting to database at: {}",
        database_url.split('@').next_back().unwrap_or("unknown")
    );
    let db = Database::new(database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    Ok(Arc::new(db.repo()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting photo contest API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    let repo = open_repo(&config).await?;
    let state = AppState::new(repo, Arc::new(SystemClock));

    let api_keys = ApiKeys::from_comma_separated(&config.api_keys);
    if api_keys.is_empty() {
        tracing::warn!("API_KEYS is empty, every protected route will answer 401");
    }

    let app = features::router(state, api_keys).merge(
        SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    let bind_address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;

    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    axum::serve(listener, app).await?;

    Ok(())
}
