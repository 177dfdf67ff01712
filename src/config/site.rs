use std::env;

pub const DEFAULT_POSTS_PER_PAGE: u64 = 10;
pub const DEFAULT_INDEX_CACHE_TTL: u64 = 20;
pub const DEFAULT_LOGIN_URL: &str = "/auth/login/";

/// Process-wide settings for the page views.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub posts_per_page: u64,
    pub index_cache_ttl: u64,
    pub login_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            posts_per_page: DEFAULT_POSTS_PER_PAGE,
            index_cache_ttl: DEFAULT_INDEX_CACHE_TTL,
            login_url: DEFAULT_LOGIN_URL.to_string(),
        }
    }
}

impl SiteConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let posts_per_page = env::var("POSTS_PER_PAGE")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n: &u64| *n > 0)
            .unwrap_or(defaults.posts_per_page);

        let index_cache_ttl = env::var("INDEX_CACHE_TTL")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.index_cache_ttl);

        let login_url = env::var("LOGIN_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.login_url);

        Self {
            posts_per_page,
            index_cache_ttl,
            login_url,
        }
    }
}
