use std::env;

pub const MEDIA_URL_PREFIX: &str = "/media";

/// Where uploaded post images live on disk.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub media_dir: String,
}

impl MediaConfig {
    pub fn from_env() -> Self {
        Self {
            media_dir: env::var("MEDIA_DIR").unwrap_or_else(|_| "./media".to_string()),
        }
    }
}
