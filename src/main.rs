use axum::{extract::Extension, Router};
use sea_orm_migration::MigratorTrait;
use std::env;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use yatube::config::{self, media::MediaConfig, site::SiteConfig};
use yatube::services::{bootstrap_admin::ensure_bootstrap_admin, cache::CacheService};
use yatube::{handlers, migration, routes, utils};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        // Posts
        handlers::post::index,
        handlers::post::group_posts,
        handlers::post::profile,
        handlers::post::post_detail,
        handlers::post::post_create_form,
        handlers::post::post_create,
        handlers::post::post_edit_form,
        handlers::post::post_edit,
        handlers::post::add_comment,
        handlers::post::post_delete,
        // Follows
        handlers::post::follow_index,
        handlers::follow::profile_follow,
        handlers::follow::profile_unfollow,
        // Groups
        handlers::group::create_group,
        handlers::group::delete_group,
        // About
        handlers::about::author,
        handlers::about::tech,
        // Auth
        handlers::auth::signup_form,
        handlers::auth::signup,
        handlers::auth::login_form,
        handlers::auth::login,
        handlers::auth::logout,
    ),
    components(
        schemas(
            yatube::response::ApiResponse<serde_json::Value>,
            yatube::response::PaginatedResponse<serde_json::Value>,
            yatube::error::AppError,
            yatube::forms::FormErrors,
            yatube::forms::post::PostFormValues,
            yatube::forms::comment::CommentForm,
            yatube::forms::group::GroupForm,
            yatube::forms::auth::SignupForm,
            yatube::forms::auth::LoginForm,
            yatube::services::post::PostCard,
            yatube::services::post::AuthorSummary,
            yatube::services::post::GroupSummary,
            yatube::services::comment::CommentView,
            yatube::models::group::Model,
            handlers::post::GroupPage,
            handlers::post::ProfilePage,
            handlers::post::PostDetailPage,
            handlers::post::PostFormPage,
            handlers::auth::SignupPage,
            handlers::auth::LoginPage,
            handlers::about::StaticPage,
        )
    ),
    tags(
        (name = "posts", description = "Post pages and forms"),
        (name = "follows", description = "Following authors and the feed"),
        (name = "groups", description = "Group administration"),
        (name = "auth", description = "Signup, login and logout"),
        (name = "about", description = "Static pages"),
        (name = "health", description = "Liveness"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yatube=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration before doing anything else
    let jwt_config = validate_config()?;
    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting Yatube v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    ensure_bootstrap_admin(&db).await?;

    // Redis is optional: fall back to the in-process cache
    let cache = match config::redis::get_redis().await {
        Ok(Some(conn)) => {
            tracing::info!("Redis connected successfully");
            CacheService::new(conn)
        }
        Ok(None) => {
            tracing::info!("REDIS_URL not set, using in-memory page cache");
            CacheService::in_memory()
        }
        Err(e) => {
            tracing::warn!("Redis unavailable, using in-memory page cache: {}", e);
            CacheService::in_memory()
        }
    };

    let site = SiteConfig::from_env();
    let media = MediaConfig::from_env();
    tracing::info!(
        "{} posts per page, index cached for {}s",
        site.posts_per_page,
        site.index_cache_ttl
    );

    let app = create_app(&media.media_dir)
        .layer(Extension(db))
        .layer(Extension(cache))
        .layer(Extension(site))
        .layer(Extension(media));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<config::jwt::JwtConfig> {
    let jwt_config = config::jwt::JwtConfig::from_env()?;

    // DATABASE_URL: checked here for early error; actual connection happens later
    if env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    let media_dir = MediaConfig::from_env().media_dir;
    std::fs::create_dir_all(&media_dir).map_err(|e| {
        anyhow::anyhow!("Failed to create media directory '{}': {}", media_dir, e)
    })?;

    Ok(jwt_config)
}

fn create_app(media_dir: &str) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest_service(config::media::MEDIA_URL_PREFIX, ServeDir::new(media_dir))
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
