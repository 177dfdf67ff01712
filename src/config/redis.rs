use redis::aio::ConnectionManager;
use tokio::time::{timeout, Duration};

/// Connect to Redis if `REDIS_URL` is configured.
///
/// `Ok(None)` means no Redis was requested; callers fall back to the
/// in-process cache.
pub async fn get_redis() -> anyhow::Result<Option<ConnectionManager>> {
    let Ok(redis_url) = std::env::var("REDIS_URL") else {
        return Ok(None);
    };
    let client = redis::Client::open(redis_url)?;

    let manager = timeout(Duration::from_secs(5), ConnectionManager::new(client))
        .await
        .map_err(|_| anyhow::anyhow!("Redis connection timeout after 5 seconds"))??;

    Ok(Some(manager))
}
