use crate::{
    error::AppResult,
    models::{comment, user, Comment, CommentModel, User},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CommentView {
    pub id: i32,
    pub text: String,
    pub created: String,
    pub author_id: i32,
    pub author: String,
}

pub struct CommentService {
    db: DatabaseConnection,
}

impl CommentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Comments of a post, newest first, with author names resolved.
    pub async fn list_by_post(&self, post_id: i32) -> AppResult<Vec<CommentView>> {
        let comments = Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_desc(comment::Column::Created)
            .order_by_desc(comment::Column::Id)
            .all(&self.db)
            .await?;

        if comments.is_empty() {
            return Ok(vec![]);
        }

        let author_ids: Vec<i32> = comments.iter().map(|c| c.author_id).collect();
        let names: HashMap<i32, String> = User::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        Ok(comments
            .into_iter()
            .map(|c| CommentView {
                author: names.get(&c.author_id).cloned().unwrap_or_default(),
                id: c.id,
                text: c.text,
                created: c.created.to_string(),
                author_id: c.author_id,
            })
            .collect())
    }

    pub async fn create(&self, post_id: i32, author_id: i32, text: &str) -> AppResult<CommentModel> {
        let new_comment = comment::ActiveModel {
            post_id: Set(post_id),
            author_id: Set(author_id),
            text: Set(text.to_string()),
            created: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };

        let comment = new_comment.insert(&self.db).await?;
        tracing::info!("Comment {} added to post {}", comment.id, post_id);
        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserModel;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn comment(id: i32, author_id: i32) -> CommentModel {
        CommentModel {
            id,
            post_id: 1,
            author_id,
            text: format!("comment {id}"),
            created: chrono::Utc::now().naive_utc(),
        }
    }

    #[tokio::test]
    async fn list_resolves_author_names() {
        let author = UserModel {
            id: 9,
            username: "anna".to_string(),
            email: "anna@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: "user".to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[comment(2, 9), comment(1, 9)]])
            .append_query_results([[author]])
            .into_connection();

        let comments = CommentService::new(db).list_by_post(1).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].id, 2);
        assert_eq!(comments[0].author, "anna");
    }

    #[tokio::test]
    async fn no_comments_no_user_lookup() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<CommentModel>::new()])
            .into_connection();

        let comments = CommentService::new(db).list_by_post(1).await.unwrap();
        assert!(comments.is_empty());
    }
}
