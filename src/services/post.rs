use crate::{
    error::{AppError, AppResult},
    models::{follow, group, post, user, Group, Post, PostModel, User},
    response::{PageQuery, PaginatedResponse},
};
use sea_orm::{
    sea_query::Query, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Select, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthorSummary {
    pub id: i32,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupSummary {
    pub id: i32,
    pub title: String,
    pub slug: String,
}

/// A post as listings show it: with its author and group resolved.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostCard {
    pub id: i32,
    pub text: String,
    pub pub_date: String,
    pub image: Option<String>,
    pub author: AuthorSummary,
    pub group: Option<GroupSummary>,
}

pub struct PostService {
    db: DatabaseConnection,
}

impl PostService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_all(
        &self,
        page: &PageQuery,
        per_page: u64,
    ) -> AppResult<PaginatedResponse<PostModel>> {
        self.paginate(Post::find(), page, per_page).await
    }

    pub async fn list_by_group(
        &self,
        group_id: i32,
        page: &PageQuery,
        per_page: u64,
    ) -> AppResult<PaginatedResponse<PostModel>> {
        let select = Post::find().filter(post::Column::GroupId.eq(group_id));
        self.paginate(select, page, per_page).await
    }

    pub async fn list_by_author(
        &self,
        author_id: i32,
        page: &PageQuery,
        per_page: u64,
    ) -> AppResult<PaginatedResponse<PostModel>> {
        let select = Post::find().filter(post::Column::AuthorId.eq(author_id));
        self.paginate(select, page, per_page).await
    }

    /// Posts by every author `user_id` follows, newest first.
    ///
    /// Authors are selected with a sub-query over the follow edges, so the
    /// result holds each post once however the edges look.
    pub async fn feed(
        &self,
        user_id: i32,
        page: &PageQuery,
        per_page: u64,
    ) -> AppResult<PaginatedResponse<PostModel>> {
        let followed_authors = Query::select()
            .column(follow::Column::AuthorId)
            .from(follow::Entity)
            .and_where(follow::Column::UserId.eq(user_id))
            .to_owned();

        let select = Post::find().filter(post::Column::AuthorId.in_subquery(followed_authors));
        self.paginate(select, page, per_page).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<PostModel> {
        Post::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(
        &self,
        author_id: i32,
        text: &str,
        group_id: Option<i32>,
        image: Option<String>,
    ) -> AppResult<PostModel> {
        let new_post = post::ActiveModel {
            text: Set(text.to_string()),
            pub_date: Set(chrono::Utc::now().naive_utc()),
            image: Set(image),
            author_id: Set(author_id),
            group_id: Set(group_id),
            ..Default::default()
        };

        let post = new_post.insert(&self.db).await?;
        tracing::info!("Post {} created by user {}", post.id, author_id);
        Ok(post)
    }

    /// Replace text and group. `image` of `None` keeps the current image.
    pub async fn update(
        &self,
        existing: PostModel,
        text: &str,
        group_id: Option<i32>,
        image: Option<String>,
    ) -> AppResult<PostModel> {
        let id = existing.id;
        let mut active: post::ActiveModel = existing.into();
        active.text = Set(text.to_string());
        active.group_id = Set(group_id);
        if let Some(image) = image {
            active.image = Set(Some(image));
        }

        let updated = active.update(&self.db).await?;
        tracing::info!("Post {} updated", id);
        Ok(updated)
    }

    /// Delete a post; its comments go with it.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = Post::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        tracing::info!("Post {} deleted", id);
        Ok(())
    }

    pub async fn count_by_author(&self, author_id: i32) -> AppResult<u64> {
        let count = Post::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    /// Resolve authors and groups for a page of posts, keeping its order.
    pub async fn cards(&self, posts: Vec<PostModel>) -> AppResult<Vec<PostCard>> {
        if posts.is_empty() {
            return Ok(vec![]);
        }

        let author_ids: Vec<i32> = posts
            .iter()
            .map(|p| p.author_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let group_ids: Vec<i32> = posts
            .iter()
            .filter_map(|p| p.group_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let authors: HashMap<i32, AuthorSummary> = User::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| {
                (
                    u.id,
                    AuthorSummary {
                        id: u.id,
                        username: u.username,
                    },
                )
            })
            .collect();

        let groups: HashMap<i32, GroupSummary> = if group_ids.is_empty() {
            HashMap::new()
        } else {
            Group::find()
                .filter(group::Column::Id.is_in(group_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|g| {
                    (
                        g.id,
                        GroupSummary {
                            id: g.id,
                            title: g.title,
                            slug: g.slug,
                        },
                    )
                })
                .collect()
        };

        Ok(posts
            .into_iter()
            .filter_map(|p| {
                let author = authors.get(&p.author_id)?.clone();
                let group = p.group_id.and_then(|id| groups.get(&id).cloned());
                Some(PostCard {
                    id: p.id,
                    text: p.text,
                    pub_date: p.pub_date.to_string(),
                    image: p.image,
                    author,
                    group,
                })
            })
            .collect())
    }

    pub async fn card(&self, post: PostModel) -> AppResult<PostCard> {
        self.cards(vec![post])
            .await?
            .pop()
            .ok_or(AppError::NotFound)
    }

    async fn paginate(
        &self,
        select: Select<Post>,
        page: &PageQuery,
        per_page: u64,
    ) -> AppResult<PaginatedResponse<PostModel>> {
        let paginator = select
            .order_by_desc(post::Column::PubDate)
            .order_by_desc(post::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let page = page.resolve(total, per_page);
        let posts = paginator.fetch_page(page - 1).await?;

        Ok(PaginatedResponse::new(posts, total, page, per_page))
    }
}
