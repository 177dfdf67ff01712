use crate::error::AppError;
use crate::handlers::{about, auth, follow, group, health, post};
use crate::middleware::auth::{identity_middleware, login_required};
use crate::services::upload::MAX_FILE_SIZE;
use axum::{extract::DefaultBodyLimit, middleware, routing, Router};

/// Room for a full-size image plus the text fields of the post form.
const FORM_BODY_LIMIT: usize = MAX_FILE_SIZE + 1024 * 1024;

/// All site routes. Expects `DatabaseConnection`, `CacheService`,
/// `SiteConfig` and `MediaConfig` extensions to be layered on top.
pub fn create_routes() -> Router {
    public_routes()
        .merge(protected_routes().route_layer(middleware::from_fn(login_required)))
        .fallback(not_found)
        .layer(middleware::from_fn(identity_middleware))
}

/// Pages anyone can see, plus the signup/login forms.
fn public_routes() -> Router {
    Router::new()
        .route("/", routing::get(post::index))
        .route("/group/{slug}/", routing::get(post::group_posts))
        .route("/profile/{username}/", routing::get(post::profile))
        .route("/posts/{post_id}/", routing::get(post::post_detail))
        .route("/about/author/", routing::get(about::author))
        .route("/about/tech/", routing::get(about::tech))
        .route(
            "/auth/signup/",
            routing::get(auth::signup_form).post(auth::signup),
        )
        .route(
            "/auth/login/",
            routing::get(auth::login_form).post(auth::login),
        )
        .route("/health", routing::get(health::health_check))
}

/// Anonymous visitors are redirected to the login page.
fn protected_routes() -> Router {
    Router::new()
        .route(
            "/create/",
            routing::get(post::post_create_form).post(post::post_create),
        )
        .route(
            "/posts/{post_id}/edit/",
            routing::get(post::post_edit_form).post(post::post_edit),
        )
        .route("/posts/{post_id}/comment/", routing::post(post::add_comment))
        .route("/posts/{post_id}/delete/", routing::post(post::post_delete))
        .route("/follow/", routing::get(post::follow_index))
        .route(
            "/profile/{username}/follow/",
            routing::post(follow::profile_follow),
        )
        .route(
            "/profile/{username}/unfollow/",
            routing::post(follow::profile_unfollow),
        )
        .route("/groups/", routing::post(group::create_group))
        .route("/group/{slug}/delete/", routing::post(group::delete_group))
        .route("/auth/logout/", routing::post(auth::logout))
        .layer(DefaultBodyLimit::max(FORM_BODY_LIMIT))
}

async fn not_found() -> AppError {
    AppError::NotFound
}
