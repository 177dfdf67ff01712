use crate::{
    error::{AppError, AppResult},
    models::{group, Group, GroupModel},
    utils::slugs::derive_slug,
};
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

pub struct GroupService {
    db: DatabaseConnection,
}

impl GroupService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// All groups, for the post form's choice list.
    pub async fn list(&self) -> AppResult<Vec<GroupModel>> {
        let groups = Group::find()
            .order_by_asc(group::Column::Title)
            .all(&self.db)
            .await?;
        Ok(groups)
    }

    pub async fn get_by_slug(&self, slug: &str) -> AppResult<GroupModel> {
        Group::find()
            .filter(group::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Create a group. A missing slug is derived from the title before insert
    /// and never recomputed afterwards.
    pub async fn create(
        &self,
        title: &str,
        slug: Option<&str>,
        description: &str,
    ) -> AppResult<GroupModel> {
        let slug = resolve_slug(title, slug)?;

        let taken = Group::find()
            .filter(group::Column::Slug.eq(slug.as_str()))
            .one(&self.db)
            .await?
            .is_some();
        if taken {
            return Err(slug_taken(&slug));
        }

        let new_group = group::ActiveModel {
            title: Set(title.to_string()),
            slug: Set(slug.clone()),
            description: Set(description.to_string()),
            ..Default::default()
        };

        // a concurrent create may claim the slug between the check and here
        let inserted = Group::insert(new_group)
            .on_conflict(
                OnConflict::column(group::Column::Slug)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&self.db)
            .await;
        let id = match inserted {
            Ok(res) => res.last_insert_id,
            Err(DbErr::RecordNotInserted) => return Err(slug_taken(&slug)),
            Err(e) => return Err(e.into()),
        };

        let group = Group::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        tracing::info!("Group '{}' created with slug '{}'", group.title, group.slug);
        Ok(group)
    }

    /// Delete a group. Its posts stay, detached from any group.
    pub async fn delete(&self, slug: &str) -> AppResult<()> {
        let group = self.get_by_slug(slug).await?;
        Group::delete_by_id(group.id).exec(&self.db).await?;
        tracing::info!("Group '{}' deleted", slug);
        Ok(())
    }
}

fn slug_taken(slug: &str) -> AppError {
    AppError::Conflict(format!("Group with slug '{}' already exists", slug))
}

fn resolve_slug(title: &str, slug: Option<&str>) -> AppResult<String> {
    if let Some(slug) = slug.map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(slug.to_string());
    }
    let derived = derive_slug(title);
    if derived.is_empty() {
        return Err(AppError::Validation(
            "Cannot derive a slug from this title, please provide one".to_string(),
        ));
    }
    Ok(derived)
}
