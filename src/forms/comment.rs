use super::{FormErrors, REQUIRED};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Comment box under a post.
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    /// Trimmed comment text, or the field errors.
    pub fn clean(&self) -> Result<String, FormErrors> {
        let text = self.text.trim();
        if text.is_empty() {
            let mut errors = FormErrors::default();
            errors.add("text", REQUIRED);
            return Err(errors);
        }
        Ok(text.to_string())
    }
}
