use crate::services::cache::CacheService;
use axum::{response::IntoResponse, Extension, Json};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    ),
    tag = "health"
)]
pub async fn health_check(
    Extension(db): Extension<DatabaseConnection>,
    Extension(cache): Extension<CacheService>,
) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "Yatube",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
        "cache": cache.backend_name(),
        "cache_entries": cache.entry_count(),
    }))
}
