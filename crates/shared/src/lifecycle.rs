use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    config::WorkerConfig,
    env::{CacheBucket, Environment},
    error::WorkerError,
    message::{ControlMessage, MessageOutcome},
};

/// Seeds the bucket with the offline page. The worker must not activate
/// until this resolves, an error fails the install and leaves the previous
/// version in control.
pub async fn install<E: Environment>(env: &E, config: &WorkerConfig) -> Result<(), WorkerError> {
    let result = seed(env, config).await;

    match &result {
        Ok(()) => info!(
            cache = %config.cache_name,
            page = %config.offline_page,
            "Install successful"
        ),
        Err(e) => error!(cache = %config.cache_name, "Install failed: {e}"),
    }

    result
}

async fn seed<E: Environment>(env: &E, config: &WorkerConfig) -> Result<(), WorkerError> {
    let page = &config.offline_page;

    let cache = env
        .open_cache(&config.cache_name)
        .await
        .map_err(|e| WorkerError::install(page, e))?;

    cache
        .add(page)
        .await
        .map_err(|e| WorkerError::install(page, e))
}

/// Turns on navigation preload once for the whole worker. Not having it is
/// fine, navigations just go to the network themselves.
pub async fn activate<E: Environment>(env: &E) -> bool {
    match env.enable_navigation_preload().await {
        Ok(true) => {
            debug!("Navigation preload enabled");
            true
        }
        Ok(false) => {
            debug!("Navigation preload not supported");
            false
        }
        Err(e) => {
            warn!("Enabling navigation preload failed: {e}");
            false
        }
    }
}

pub fn on_message<E: Environment>(env: &E, data: &Value) -> Result<MessageOutcome, WorkerError> {
    match ControlMessage::parse(data) {
        Some(ControlMessage::SkipWaiting) => {
            info!("Got SKIP_WAITING, activating");
            env.skip_waiting()?;
            Ok(MessageOutcome::SkippedWaiting)
        }
        None => {
            debug!("Ignoring unexpected message: {data}");
            Ok(MessageOutcome::Ignored)
        }
    }
}
