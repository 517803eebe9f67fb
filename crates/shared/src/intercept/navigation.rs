use tracing::{debug, error, warn};

use crate::{
    config::WorkerConfig,
    env::{CacheBucket, Environment},
    error::WorkerError,
    model::RequestInfo,
};

/// Network first with the cached offline page as the fallback.
///
/// `None` means the network failed and there was no fallback to serve,
/// which happens when install never completed. The host turns that into a
/// network error for the document.
pub async fn respond<E: Environment>(
    env: &E,
    config: &WorkerConfig,
    request: &E::Request,
) -> Option<E::Response> {
    match from_network(env, request).await {
        Ok(response) => Some(response),
        Err(e) => {
            warn!(url = %request.url(), "Navigation failed, serving offline page: {e}");
            offline_fallback(env, config).await
        }
    }
}

async fn from_network<E: Environment>(
    env: &E,
    request: &E::Request,
) -> Result<E::Response, WorkerError> {
    if let Some(response) = env.preload_response(request).await? {
        debug!(url = %request.url(), "Using preload response");
        return Ok(response);
    }

    env.fetch(request).await
}

pub async fn offline_fallback<E: Environment>(
    env: &E,
    config: &WorkerConfig,
) -> Option<E::Response> {
    let cached = match env.open_cache(&config.cache_name).await {
        Ok(cache) => cache.lookup(&config.offline_page).await,
        Err(e) => Err(e),
    };

    match cached {
        Ok(Some(response)) => Some(response),
        Ok(None) => {
            error!(
                cache = %config.cache_name,
                page = %config.offline_page,
                "Offline page missing from cache"
            );
            None
        }
        Err(e) => {
            error!(cache = %config.cache_name, "Offline page lookup failed: {e}");
            None
        }
    }
}
