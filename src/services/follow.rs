use crate::{
    error::AppResult,
    models::{follow, Follow},
};
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    SelfFollow,
}

pub struct FollowService {
    db: DatabaseConnection,
}

impl FollowService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Get-or-create the edge `user_id -> author_id`.
    ///
    /// Following yourself does nothing. Repeated calls leave a single edge;
    /// the unique (user_id, author_id) index settles concurrent inserts.
    pub async fn follow(&self, user_id: i32, author_id: i32) -> AppResult<FollowOutcome> {
        if user_id == author_id {
            tracing::debug!("User {} tried to follow themselves", user_id);
            return Ok(FollowOutcome::SelfFollow);
        }

        let edge = follow::ActiveModel {
            user_id: Set(user_id),
            author_id: Set(author_id),
            ..Default::default()
        };

        let inserted = Follow::insert(edge)
            .on_conflict(
                OnConflict::columns([follow::Column::UserId, follow::Column::AuthorId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        if inserted == 0 {
            tracing::debug!("User {} already follows {}", user_id, author_id);
            return Ok(FollowOutcome::AlreadyFollowing);
        }
        tracing::info!("User {} now follows {}", user_id, author_id);
        Ok(FollowOutcome::Created)
    }

    /// Remove every edge `user_id -> author_id`. Returns how many went.
    pub async fn unfollow(&self, user_id: i32, author_id: i32) -> AppResult<u64> {
        let result = Follow::delete_many()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected > 0 {
            tracing::info!("User {} unfollowed {}", user_id, author_id);
        }
        Ok(result.rows_affected)
    }

    pub async fn is_following(&self, user_id: i32, author_id: i32) -> AppResult<bool> {
        let count = Follow::find()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }
}
