use super::{post_detail_url, profile_url};
use crate::config::{media::MediaConfig, site::SiteConfig};
use crate::error::{AppError, AppResult};
use crate::forms::{
    comment::CommentForm,
    post::{PostFormData, PostFormValues, UploadedImage},
    FormErrors,
};
use crate::middleware::AuthUser;
use crate::models::{GroupModel, PostModel};
use crate::response::{found, ApiResponse, PageQuery, PaginatedResponse};
use crate::services::{
    cache::CacheService,
    comment::{CommentService, CommentView},
    follow::FollowService,
    group::GroupService,
    post::{AuthorSummary, PostCard, PostService},
    upload::{check_image, UploadService},
    user::UserService,
};
use axum::{
    extract::{Path, Query},
    response::{IntoResponse, Response},
    Extension, Form,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

pub const INDEX_CACHE_PREFIX: &str = "index_page";

#[derive(Debug, Serialize, ToSchema)]
pub struct GroupPage {
    pub group: GroupModel,
    pub page_obj: PaginatedResponse<PostCard>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfilePage {
    pub author: AuthorSummary,
    pub post_count: u64,
    /// Whether the visitor follows this author. Always false for anonymous visitors.
    pub following: bool,
    pub page_obj: PaginatedResponse<PostCard>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostDetailPage {
    pub post: PostCard,
    pub author_post_count: u64,
    pub comments: Vec<CommentView>,
    pub form: CommentForm,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostFormPage {
    pub form: PostFormValues,
    pub errors: FormErrors,
    pub groups: Vec<GroupModel>,
    pub is_edit: bool,
    pub post_id: Option<i32>,
    /// Current image of the post being edited.
    pub image: Option<String>,
}

impl PostFormPage {
    fn blank(groups: Vec<GroupModel>) -> Self {
        Self {
            form: PostFormValues::default(),
            errors: FormErrors::default(),
            groups,
            is_edit: false,
            post_id: None,
            image: None,
        }
    }

    fn editing(post: &PostModel, groups: Vec<GroupModel>) -> Self {
        Self {
            form: PostFormValues::from_post(&post.text, post.group_id),
            errors: FormErrors::default(),
            groups,
            is_edit: true,
            post_id: Some(post.id),
            image: post.image.clone(),
        }
    }

    fn with_errors(mut self, form: PostFormValues, errors: FormErrors) -> Response {
        self.form = form;
        let summary = errors.summary();
        self.errors = errors;
        ApiResponse::rejected(self, summary).into_response()
    }
}

/// Entries are stored under the page actually served, so out-of-range
/// requests share the last page's entry.
fn index_cache_key(page: u64) -> String {
    format!("{}:{}", INDEX_CACHE_PREFIX, page)
}

#[utoipa::path(
    get,
    path = "/",
    params(("page" = Option<String>, Query, description = "Page number")),
    responses(
        (status = 200, description = "Latest posts of all authors", body = PaginatedResponse<PostCard>),
    ),
    tag = "posts"
)]
pub async fn index(
    Extension(db): Extension<DatabaseConnection>,
    Extension(cache): Extension<CacheService>,
    Extension(site): Extension<SiteConfig>,
    Query(query): Query<PageQuery>,
) -> AppResult<impl IntoResponse> {
    if let Some(requested) = query.requested_page() {
        let key = index_cache_key(requested);
        if let Some(page) = cache.get::<PaginatedResponse<PostCard>>(&key).await {
            tracing::debug!("Index served from cache ({})", key);
            return Ok(ApiResponse::ok(page));
        }
    }

    let service = PostService::new(db);
    let posts = service.list_all(&query, site.posts_per_page).await?;
    let page = hydrate(&service, posts).await?;

    cache
        .set(&index_cache_key(page.page), &page, site.index_cache_ttl)
        .await;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    get,
    path = "/group/{slug}/",
    params(
        ("slug" = String, Path, description = "Group slug"),
        ("page" = Option<String>, Query, description = "Page number"),
    ),
    responses(
        (status = 200, description = "Group and its posts", body = GroupPage),
        (status = 404, description = "Group not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn group_posts(
    Extension(db): Extension<DatabaseConnection>,
    Extension(site): Extension<SiteConfig>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<impl IntoResponse> {
    let group = GroupService::new(db.clone()).get_by_slug(&slug).await?;

    let service = PostService::new(db);
    let posts = service
        .list_by_group(group.id, &query, site.posts_per_page)
        .await?;
    let page_obj = hydrate(&service, posts).await?;

    Ok(ApiResponse::ok(GroupPage { group, page_obj }))
}

#[utoipa::path(
    get,
    path = "/profile/{username}/",
    params(
        ("username" = String, Path, description = "Author username"),
        ("page" = Option<String>, Query, description = "Page number"),
    ),
    responses(
        (status = 200, description = "Author profile and posts", body = ProfilePage),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn profile(
    Extension(db): Extension<DatabaseConnection>,
    Extension(site): Extension<SiteConfig>,
    viewer: Option<AuthUser>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<impl IntoResponse> {
    let author = UserService::new(db.clone())
        .get_by_username(&username)
        .await?;

    let following = match &viewer {
        Some(viewer) => {
            FollowService::new(db.clone())
                .is_following(viewer.id, author.id)
                .await?
        }
        None => false,
    };

    let service = PostService::new(db);
    let posts = service
        .list_by_author(author.id, &query, site.posts_per_page)
        .await?;
    let post_count = posts.total;
    let page_obj = hydrate(&service, posts).await?;

    Ok(ApiResponse::ok(ProfilePage {
        author: AuthorSummary {
            id: author.id,
            username: author.username,
        },
        post_count,
        following,
        page_obj,
    }))
}

#[utoipa::path(
    get,
    path = "/posts/{post_id}/",
    params(("post_id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post with its comments", body = PostDetailPage),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn post_detail(
    Extension(db): Extension<DatabaseConnection>,
    Path(post_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db.clone());
    let post = service.get_by_id(post_id).await?;
    let author_post_count = service.count_by_author(post.author_id).await?;
    let comments = CommentService::new(db).list_by_post(post.id).await?;
    let post = service.card(post).await?;

    Ok(ApiResponse::ok(PostDetailPage {
        post,
        author_post_count,
        comments,
        form: CommentForm::default(),
    }))
}

#[utoipa::path(
    get,
    path = "/create/",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Empty post form", body = PostFormPage),
        (status = 302, description = "Anonymous visitor sent to login"),
    ),
    tag = "posts"
)]
pub async fn post_create_form(
    Extension(db): Extension<DatabaseConnection>,
    _auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let groups = GroupService::new(db).list().await?;
    Ok(ApiResponse::ok(PostFormPage::blank(groups)))
}

#[utoipa::path(
    post,
    path = "/create/",
    security(("jwt_token" = [])),
    request_body(content = PostFormValues, content_type = "multipart/form-data"),
    responses(
        (status = 302, description = "Post created, redirect to the author's profile"),
        (status = 200, description = "Form re-rendered with errors", body = PostFormPage),
    ),
    tag = "posts"
)]
pub async fn post_create(
    Extension(db): Extension<DatabaseConnection>,
    Extension(media): Extension<MediaConfig>,
    auth_user: AuthUser,
    form: PostFormData,
) -> AppResult<Response> {
    let groups = GroupService::new(db.clone()).list().await?;
    let page = PostFormPage::blank(groups.clone());

    let clean = match form.clean(&groups) {
        Ok(clean) => clean,
        Err((values, errors)) => return Ok(page.with_errors(values, errors)),
    };

    let image = match store_image(&media, clean.image.as_ref()).await? {
        Ok(image) => image,
        Err(errors) => {
            let values = PostFormValues::from_post(&clean.text, clean.group_id);
            return Ok(page.with_errors(values, errors));
        }
    };

    let created = PostService::new(db)
        .create(auth_user.id, &clean.text, clean.group_id, image.clone())
        .await;
    discard_on_error(&media, image.as_deref(), created).await?;

    Ok(found(&profile_url(&auth_user.username)))
}

#[utoipa::path(
    get,
    path = "/posts/{post_id}/edit/",
    security(("jwt_token" = [])),
    params(("post_id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Form prefilled with the post", body = PostFormPage),
        (status = 302, description = "Not the author, redirect to the post"),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn post_edit_form(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(post_id): Path<i32>,
) -> AppResult<Response> {
    let post = PostService::new(db.clone()).get_by_id(post_id).await?;
    if post.author_id != auth_user.id {
        return Ok(found(&post_detail_url(post.id)));
    }

    let groups = GroupService::new(db).list().await?;
    Ok(ApiResponse::ok(PostFormPage::editing(&post, groups)).into_response())
}

#[utoipa::path(
    post,
    path = "/posts/{post_id}/edit/",
    security(("jwt_token" = [])),
    params(("post_id" = i32, Path, description = "Post ID")),
    request_body(content = PostFormValues, content_type = "multipart/form-data"),
    responses(
        (status = 302, description = "Saved (or not the author), redirect to the post"),
        (status = 200, description = "Form re-rendered with errors", body = PostFormPage),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn post_edit(
    Extension(db): Extension<DatabaseConnection>,
    Extension(media): Extension<MediaConfig>,
    auth_user: AuthUser,
    Path(post_id): Path<i32>,
    form: PostFormData,
) -> AppResult<Response> {
    let service = PostService::new(db.clone());
    let post = service.get_by_id(post_id).await?;
    if post.author_id != auth_user.id {
        tracing::debug!("User {} may not edit post {}", auth_user.id, post.id);
        return Ok(found(&post_detail_url(post.id)));
    }

    let groups = GroupService::new(db).list().await?;
    let page = PostFormPage::editing(&post, groups.clone());

    let clean = match form.clean(&groups) {
        Ok(clean) => clean,
        Err((values, errors)) => return Ok(page.with_errors(values, errors)),
    };

    let image = match store_image(&media, clean.image.as_ref()).await? {
        Ok(image) => image,
        Err(errors) => {
            let values = PostFormValues::from_post(&clean.text, clean.group_id);
            return Ok(page.with_errors(values, errors));
        }
    };

    let updated = service
        .update(post, &clean.text, clean.group_id, image.clone())
        .await;
    let post = discard_on_error(&media, image.as_deref(), updated).await?;
    Ok(found(&post_detail_url(post.id)))
}

#[utoipa::path(
    post,
    path = "/posts/{post_id}/comment/",
    security(("jwt_token" = [])),
    params(("post_id" = i32, Path, description = "Post ID")),
    request_body(content = CommentForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Redirect to the post"),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn add_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(post_id): Path<i32>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let post = PostService::new(db.clone()).get_by_id(post_id).await?;

    match form.clean() {
        Ok(text) => {
            CommentService::new(db)
                .create(post.id, auth_user.id, &text)
                .await?;
        }
        Err(errors) => {
            tracing::debug!("Comment on post {} rejected: {}", post.id, errors.summary());
        }
    }

    Ok(found(&post_detail_url(post.id)))
}

#[utoipa::path(
    post,
    path = "/posts/{post_id}/delete/",
    security(("jwt_token" = [])),
    params(("post_id" = i32, Path, description = "Post ID")),
    responses(
        (status = 302, description = "Deleted, redirect to the author's profile; or not the author, redirect to the post"),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn post_delete(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(post_id): Path<i32>,
) -> AppResult<Response> {
    let service = PostService::new(db);
    let post = service.get_by_id(post_id).await?;
    if post.author_id != auth_user.id {
        return Ok(found(&post_detail_url(post.id)));
    }

    service.delete(post.id).await?;
    Ok(found(&profile_url(&auth_user.username)))
}

#[utoipa::path(
    get,
    path = "/follow/",
    security(("jwt_token" = [])),
    params(("page" = Option<String>, Query, description = "Page number")),
    responses(
        (status = 200, description = "Posts of followed authors", body = PaginatedResponse<PostCard>),
        (status = 302, description = "Anonymous visitor sent to login"),
    ),
    tag = "follows"
)]
pub async fn follow_index(
    Extension(db): Extension<DatabaseConnection>,
    Extension(site): Extension<SiteConfig>,
    auth_user: AuthUser,
    Query(query): Query<PageQuery>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    let posts = service
        .feed(auth_user.id, &query, site.posts_per_page)
        .await?;
    let page_obj = hydrate(&service, posts).await?;

    Ok(ApiResponse::ok(page_obj))
}

/// Check and store the uploaded image, if any. Field errors come back in
/// the inner `Err` for the form to re-render.
async fn store_image(
    media: &MediaConfig,
    image: Option<&UploadedImage>,
) -> AppResult<Result<Option<String>, FormErrors>> {
    let Some(image) = image else {
        return Ok(Ok(None));
    };
    if let Err(message) = check_image(image) {
        let mut errors = FormErrors::default();
        errors.add("image", message);
        return Ok(Err(errors));
    }
    let url = UploadService::save_post_image(media, image).await?;
    Ok(Ok(Some(url)))
}

/// Drop a freshly stored image when the row that should point to it was
/// not written.
async fn discard_on_error<T>(
    media: &MediaConfig,
    image: Option<&str>,
    result: AppResult<T>,
) -> AppResult<T> {
    if let (Err(e), Some(url)) = (&result, image) {
        tracing::warn!("Post not saved ({}), removing {}", e, url);
        UploadService::remove_post_image(media, url).await;
    }
    result
}

async fn hydrate(
    service: &PostService,
    posts: PaginatedResponse<PostModel>,
) -> AppResult<PaginatedResponse<PostCard>> {
    let cards = service.cards(posts.items).await?;
    Ok(PaginatedResponse::new(
        cards,
        posts.total,
        posts.page,
        posts.per_page,
    ))
}
