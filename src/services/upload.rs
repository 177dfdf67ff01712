use crate::config::media::{MediaConfig, MEDIA_URL_PREFIX};
use crate::error::{AppError, AppResult};
use crate::forms::post::UploadedImage;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

pub const POST_IMAGE_DIR: &str = "posts";
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024; // 5 MB
const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Validate file magic bytes match the declared content type.
fn validate_magic_bytes(data: &[u8], content_type: &str) -> bool {
    match content_type {
        "image/jpeg" => data.starts_with(&[0xFF, 0xD8, 0xFF]),
        "image/png" => data.starts_with(&[0x89, 0x50, 0x4E, 0x47]),
        "image/gif" => data.starts_with(b"GIF8"),
        "image/webp" => data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP",
        _ => false,
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Check an uploaded image without writing it. The error text is shown
/// next to the form's `image` field.
pub fn check_image(image: &UploadedImage) -> Result<&'static str, String> {
    if image.data.len() > MAX_FILE_SIZE {
        return Err("File too large. The maximum size is 5 MB.".to_string());
    }
    let content_type = image.content_type.as_str();
    let Some(ext) = extension_for(content_type).filter(|_| ALLOWED_CONTENT_TYPES.contains(&content_type))
    else {
        return Err(format!(
            "Unsupported file type: {}. Allowed: jpeg, png, gif, webp",
            content_type
        ));
    };
    if !validate_magic_bytes(&image.data, content_type) {
        return Err(
            "Upload a valid image. The file you uploaded was either not an image or a corrupted image."
                .to_string(),
        );
    }
    Ok(ext)
}

pub struct UploadService;

impl UploadService {
    /// Write a post image under the media root.
    /// Returns the public URL path (e.g. `/media/posts/uuid.jpg`).
    pub async fn save_post_image(config: &MediaConfig, image: &UploadedImage) -> AppResult<String> {
        let ext = check_image(image).map_err(AppError::Validation)?;

        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let dir = Path::new(&config.media_dir).join(POST_IMAGE_DIR);

        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to create media directory: {}", e))
        })?;

        let file_path = dir.join(&filename);
        fs::write(&file_path, &image.data)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to write file: {}", e)))?;

        tracing::debug!("Stored post image {}", file_path.display());
        Ok(format!("{}/{}/{}", MEDIA_URL_PREFIX, POST_IMAGE_DIR, filename))
    }

    /// Remove an image stored by [`Self::save_post_image`]. URLs outside the
    /// post image directory are ignored.
    pub async fn remove_post_image(config: &MediaConfig, url: &str) {
        let prefix = format!("{}/{}/", MEDIA_URL_PREFIX, POST_IMAGE_DIR);
        let Some(filename) = url
            .strip_prefix(&prefix)
            .filter(|name| !name.is_empty() && !name.contains('/') && !name.contains(".."))
        else {
            tracing::warn!("Refusing to remove media outside {}: {}", prefix, url);
            return;
        };

        let file_path = Path::new(&config.media_dir)
            .join(POST_IMAGE_DIR)
            .join(filename);
        match fs::remove_file(&file_path).await {
            Ok(()) => tracing::debug!("Removed post image {}", file_path.display()),
            Err(e) => tracing::warn!("Failed to remove {}: {}", file_path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_GIF: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
        0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
        0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
    ];

    fn image(content_type: &str, data: &[u8]) -> UploadedImage {
        UploadedImage {
            file_name: "small.gif".to_string(),
            content_type: content_type.to_string(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn jpeg_magic_bytes_valid() {
        let data = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        assert!(validate_magic_bytes(&data, "image/jpeg"));
    }

    #[test]
    fn webp_magic_bytes_valid() {
        let data = [
            0x52, 0x49, 0x46, 0x46, // RIFF
            0x00, 0x00, 0x00, 0x00, // size
            0x57, 0x45, 0x42, 0x50, // WEBP
        ];
        assert!(validate_magic_bytes(&data, "image/webp"));
    }

    #[test]
    fn wrong_magic_bytes_rejected() {
        let png_data = [0x89, 0x50, 0x4E, 0x47];
        assert!(!validate_magic_bytes(&png_data, "image/jpeg"));
        assert!(!validate_magic_bytes(&[], "image/png"));
    }

    #[test]
    fn gif_passes_check() {
        assert_eq!(check_image(&image("image/gif", SMALL_GIF)), Ok("gif"));
    }

    #[test]
    fn text_file_is_not_an_image() {
        assert!(check_image(&image("text/plain", b"hello")).is_err());
        assert!(check_image(&image("image/png", b"hello")).is_err());
    }

    #[test]
    fn oversized_image_rejected() {
        let mut data = SMALL_GIF.to_vec();
        data.resize(MAX_FILE_SIZE + 1, 0);
        assert!(check_image(&image("image/gif", &data)).is_err());
    }

    #[tokio::test]
    async fn saved_under_posts_dir() {
        let dir = std::env::temp_dir().join(format!("yatube-media-{}", Uuid::new_v4()));
        let config = MediaConfig {
            media_dir: dir.to_string_lossy().to_string(),
        };

        let url = UploadService::save_post_image(&config, &image("image/gif", SMALL_GIF))
            .await
            .unwrap();
        assert!(url.starts_with("/media/posts/"));
        assert!(url.ends_with(".gif"));

        let name = url.rsplit('/').next().unwrap();
        assert!(dir.join(POST_IMAGE_DIR).join(name).exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn removed_image_leaves_disk() {
        let dir = std::env::temp_dir().join(format!("yatube-media-{}", Uuid::new_v4()));
        let config = MediaConfig {
            media_dir: dir.to_string_lossy().to_string(),
        };
        let url = UploadService::save_post_image(&config, &image("image/gif", SMALL_GIF))
            .await
            .unwrap();
        let name = url.rsplit('/').next().unwrap().to_string();

        UploadService::remove_post_image(&config, "/media/../secret").await;
        assert!(dir.join(POST_IMAGE_DIR).join(&name).exists());

        UploadService::remove_post_image(&config, &url).await;
        assert!(!dir.join(POST_IMAGE_DIR).join(&name).exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
