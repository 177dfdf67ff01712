use super::{FormErrors, REQUIRED};
use crate::utils::slugs::{is_valid_slug, SLUG_MAX_LENGTH};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Admin form for a new group. Leaving `slug` blank derives it from the title.
#[derive(Debug, Default, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct GroupForm {
    #[serde(default)]
    #[validate(length(max = 200, message = "Ensure this value has at most 200 characters."))]
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanGroup {
    pub title: String,
    pub slug: Option<String>,
    pub description: String,
}

impl GroupForm {
    pub fn clean(&self) -> Result<CleanGroup, FormErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FormErrors::default(),
            Err(e) => FormErrors::from_validation(&e),
        };

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", REQUIRED);
        }
        let description = self.description.trim();
        if description.is_empty() {
            errors.add("description", REQUIRED);
        }

        let slug = self
            .slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(slug) = slug {
            if slug.chars().count() > SLUG_MAX_LENGTH {
                errors.add(
                    "slug",
                    format!("Ensure this value has at most {} characters.", SLUG_MAX_LENGTH),
                );
            } else if !is_valid_slug(slug) {
                errors.add(
                    "slug",
                    "Enter a valid \"slug\" consisting of letters, numbers, underscores or hyphens.",
                );
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(CleanGroup {
            title: title.to_string(),
            slug: slug.map(str::to_string),
            description: description.to_string(),
        })
    }
}
