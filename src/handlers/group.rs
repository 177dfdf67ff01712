use crate::error::{AppError, AppResult};
use crate::forms::group::GroupForm;
use crate::middleware::auth::{require_admin, AuthUser};
use crate::models::GroupModel;
use crate::response::{found, ApiResponse};
use crate::services::group::GroupService;
use axum::{
    extract::Path,
    response::{IntoResponse, Response},
    Extension, Form,
};
use sea_orm::DatabaseConnection;

#[utoipa::path(
    post,
    path = "/groups/",
    security(("jwt_token" = [])),
    request_body(content = GroupForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Group created", body = GroupModel),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 409, description = "Slug already taken", body = AppError),
    ),
    tag = "groups"
)]
pub async fn create_group(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Form(form): Form<GroupForm>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;

    let clean = form
        .clean()
        .map_err(|errors| AppError::Validation(errors.summary()))?;

    let group = GroupService::new(db)
        .create(&clean.title, clean.slug.as_deref(), &clean.description)
        .await?;
    Ok(ApiResponse::ok(group))
}

#[utoipa::path(
    post,
    path = "/group/{slug}/delete/",
    security(("jwt_token" = [])),
    params(("slug" = String, Path, description = "Group slug")),
    responses(
        (status = 302, description = "Deleted, redirect to the index"),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Group not found", body = AppError),
    ),
    tag = "groups"
)]
pub async fn delete_group(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    require_admin(&auth_user)?;
    GroupService::new(db).delete(&slug).await?;
    Ok(found("/"))
}
