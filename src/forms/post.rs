use super::{FormErrors, REQUIRED};
use crate::error::AppError;
use crate::models::GroupModel;
use axum::{
    extract::{multipart::MultipartError, FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Form,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

pub const POST_TEXT_MAX_LENGTH: u64 = 200;
const INVALID_GROUP: &str = "Select a valid choice. That choice is not one of the available choices.";

/// A file part of the post form, not yet written anywhere.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// What the author typed, echoed back when the form is re-rendered.
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostFormValues {
    #[serde(default)]
    pub text: String,
    /// Selected group id as submitted; empty for "no group".
    #[serde(default)]
    pub group: String,
}

/// Raw post form submission, urlencoded or multipart.
#[derive(Debug, Default)]
pub struct PostFormData {
    pub values: PostFormValues,
    pub image: Option<UploadedImage>,
}

/// A post form that passed validation.
#[derive(Debug, Clone)]
pub struct CleanPost {
    pub text: String,
    pub group_id: Option<i32>,
    pub image: Option<UploadedImage>,
}

#[derive(Validate)]
struct PostFields<'a> {
    #[validate(length(max = 200, message = "Ensure this value has at most 200 characters."))]
    text: &'a str,
}

impl PostFormData {
    /// Validate against the groups the author may choose from.
    pub fn clean(self, groups: &[GroupModel]) -> Result<CleanPost, (PostFormValues, FormErrors)> {
        let mut errors = FormErrors::default();
        let text = self.values.text.trim();

        if text.is_empty() {
            errors.add("text", REQUIRED);
        } else if let Err(e) = (PostFields { text }).validate() {
            errors = FormErrors::from_validation(&e);
        }

        let group_id = match self.values.group.trim() {
            "" => None,
            raw => match raw.parse::<i32>() {
                Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
                _ => {
                    errors.add("group", INVALID_GROUP);
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err((self.values, errors));
        }

        Ok(CleanPost {
            text: text.to_string(),
            group_id,
            image: self.image,
        })
    }
}

impl<S> FromRequest<S> for PostFormData
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(values) = Form::<PostFormValues>::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            return Ok(Self {
                values,
                image: None,
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        let mut data = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(multipart_error)?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "text" | "group" => {
                    let value = field
                        .text()
                        .await
                        .map_err(multipart_error)?;
                    if name == "text" {
                        data.values.text = value;
                    } else {
                        data.values.group = value;
                    }
                }
                "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(multipart_error)?;
                    // browsers send an empty part when no file was chosen
                    if !bytes.is_empty() {
                        data.image = Some(UploadedImage {
                            file_name,
                            content_type,
                            data: bytes.to_vec(),
                        });
                    }
                }
                _ => {}
            }
        }

        Ok(data)
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::Validation(format!("Failed to read form: {}", e))
    }
}

impl PostFormValues {
    pub fn from_post(text: &str, group_id: Option<i32>) -> Self {
        Self {
            text: text.to_string(),
            group: group_id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }
}
