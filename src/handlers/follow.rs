use super::profile_url;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::response::found;
use crate::services::{follow::FollowService, user::UserService};
use axum::{extract::Path, response::Response, Extension};
use sea_orm::DatabaseConnection;

#[utoipa::path(
    post,
    path = "/profile/{username}/follow/",
    security(("jwt_token" = [])),
    params(("username" = String, Path, description = "Author to follow")),
    responses(
        (status = 302, description = "Redirect to the author's profile"),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "follows"
)]
pub async fn profile_follow(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let author = UserService::new(db.clone())
        .get_by_username(&username)
        .await?;
    FollowService::new(db).follow(auth_user.id, author.id).await?;
    Ok(found(&profile_url(&author.username)))
}

#[utoipa::path(
    post,
    path = "/profile/{username}/unfollow/",
    security(("jwt_token" = [])),
    params(("username" = String, Path, description = "Author to unfollow")),
    responses(
        (status = 302, description = "Redirect to the author's profile"),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "follows"
)]
pub async fn profile_unfollow(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let author = UserService::new(db.clone())
        .get_by_username(&username)
        .await?;
    FollowService::new(db)
        .unfollow(auth_user.id, author.id)
        .await?;
    Ok(found(&profile_url(&author.username)))
}
