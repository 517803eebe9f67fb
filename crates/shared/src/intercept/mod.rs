//! Routes every intercepted request to exactly one policy.
//!
//! Policies are tried in [`Policy::PRIORITY`] order and the first one that
//! matches the request handles it. Responses served by the navigation policy
//! go through the same header rewrite as everything else so the document is
//! cross-origin isolated whether it came from the network or the offline
//! cache.

pub mod isolation;
pub mod navigation;

use tracing::{debug_span, Instrument};

use crate::{config::WorkerConfig, env::Environment, error::WorkerError, model::RequestInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Network first, offline page on failure, then isolation headers
    Navigation,
    /// Network only, isolation headers on the way back
    HeaderRewrite,
}

impl Policy {
    pub const PRIORITY: [Policy; 2] = [Policy::Navigation, Policy::HeaderRewrite];

    pub fn matches<R: RequestInfo>(&self, request: &R) -> bool {
        match self {
            Policy::Navigation => request.is_navigation(),
            Policy::HeaderRewrite => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Interceptor {
    config: WorkerConfig,
}

impl Interceptor {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn route<R: RequestInfo>(&self, request: &R) -> Policy {
        Policy::PRIORITY
            .into_iter()
            .find(|p| p.matches(request))
            .unwrap_or(Policy::HeaderRewrite)
    }

    /// `Ok(None)` is only possible for navigations, see
    /// [`navigation::respond`]
    pub async fn handle<E: Environment>(
        &self,
        env: &E,
        request: &E::Request,
    ) -> Result<Option<E::Response>, WorkerError> {
        let policy = self.route(request);
        let span = debug_span!(
            "intercept",
            method = %request.method(),
            url = %request.url(),
            mode = %request.mode(),
            ?policy
        );

        async move {
            match policy {
                Policy::Navigation => navigation::respond(env, &self.config, request)
                    .await
                    .map(isolation::isolate)
                    .transpose(),
                Policy::HeaderRewrite => isolation::respond(env, request)
                    .await
                    .map(Some),
            }
        }
        .instrument(span)
        .await
    }
}
