use http::{HeaderName, HeaderValue};
use tracing::{debug, trace};

use crate::{
    env::Environment,
    error::WorkerError,
    model::{RequestInfo, ResponseParts},
};

pub const EMBEDDER_POLICY: HeaderName = HeaderName::from_static("cross-origin-embedder-policy");
pub const EMBEDDER_POLICY_VALUE: HeaderValue = HeaderValue::from_static("require-corp");

pub const OPENER_POLICY: HeaderName = HeaderName::from_static("cross-origin-opener-policy");
pub const OPENER_POLICY_VALUE: HeaderValue = HeaderValue::from_static("same-origin");

/// The pair that makes the document cross-origin isolated, which is what
/// unlocks SharedArrayBuffer on static hosts that can't send them
pub fn isolation_headers() -> [(HeaderName, HeaderValue); 2] {
    [
        (EMBEDDER_POLICY, EMBEDDER_POLICY_VALUE),
        (OPENER_POLICY, OPENER_POLICY_VALUE),
    ]
}

/// Force sets the isolation headers, overwriting whatever the origin sent.
///
/// A response that can't be rebuilt (opaque, status 0) fails the request
/// rather than reaching the document without the headers.
pub fn isolate<R: ResponseParts>(response: R) -> Result<R, WorkerError> {
    if !response.is_rewritable() {
        let status = response.status();
        debug!(status, "Can't rewrite headers on opaque response");
        return Err(WorkerError::Platform(format!(
            "Can't rewrite headers on response with status {status}"
        )));
    }

    response.with_headers(&isolation_headers())
}

/// Pass through with header rewrite. Network failures are surfaced as is,
/// there's no fallback for sub-resources.
pub async fn respond<E: Environment>(
    env: &E,
    request: &E::Request,
) -> Result<E::Response, WorkerError> {
    let response = env.fetch(request).await?;
    trace!(url = %request.url(), status = response.status(), "Rewriting headers");
    isolate(response)
}
