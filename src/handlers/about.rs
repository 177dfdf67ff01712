use crate::response::ApiResponse;
use axum::response::IntoResponse;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct StaticPage {
    pub title: &'static str,
    pub text: &'static str,
}

#[utoipa::path(
    get,
    path = "/about/author/",
    responses((status = 200, description = "About the author", body = StaticPage)),
    tag = "about"
)]
pub async fn author() -> impl IntoResponse {
    ApiResponse::ok(StaticPage {
        title: "About the author",
        text: "Yatube is a small blogging service: write posts, join groups, follow other authors.",
    })
}

#[utoipa::path(
    get,
    path = "/about/tech/",
    responses((status = 200, description = "Technologies used", body = StaticPage)),
    tag = "about"
)]
pub async fn tech() -> impl IntoResponse {
    ApiResponse::ok(StaticPage {
        title: "Technologies",
        text: "Rust, axum, sea-orm, PostgreSQL and Redis.",
    })
}
