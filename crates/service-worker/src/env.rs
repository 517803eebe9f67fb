use http::{HeaderName, HeaderValue, Method};
use js_sys::{Function, Promise, Reflect};
use shared::{
    env::{CacheBucket, Environment},
    error::describe,
    model::{RequestInfo, RequestMode, ResponseParts},
    WorkerError,
};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Cache, FetchEvent, Headers, Request, RequestMode as WebRequestMode, Response, ResponseInit,
    ServiceWorkerGlobalScope,
};

/// An intercepted request. Keeps hold of the event so the navigation preload
/// response can be consumed.
pub struct WebRequest {
    event: FetchEvent,
    request: Request,
}

impl WebRequest {
    pub fn from_event(event: FetchEvent) -> Self {
        let request = event.request();
        Self { event, request }
    }
}

impl RequestInfo for WebRequest {
    fn method(&self) -> Method {
        Method::from_bytes(self.request.method().as_bytes()).unwrap_or(Method::GET)
    }

    fn url(&self) -> String {
        self.request.url()
    }

    fn mode(&self) -> RequestMode {
        match self.request.mode() {
            WebRequestMode::Navigate => RequestMode::Navigate,
            WebRequestMode::SameOrigin => RequestMode::SameOrigin,
            WebRequestMode::NoCors => RequestMode::NoCors,
            _ => RequestMode::Cors,
        }
    }
}

pub struct WebResponse(Response);

impl WebResponse {
    pub fn into_inner(self) -> Response {
        self.0
    }
}

impl ResponseParts for WebResponse {
    fn status(&self) -> u16 {
        self.0.status()
    }

    fn header(&self, name: &HeaderName) -> Option<String> {
        self.0.headers().get(name.as_str()).ok().flatten()
    }

    // Equivalent of `new Response(response.body, response)`: the body stream
    // moves to the new response so the original can't be read again
    fn with_headers(self, forced: &[(HeaderName, HeaderValue)]) -> Result<Self, WorkerError> {
        let headers = Headers::new_with_headers(&self.0.headers())?;
        for (name, value) in forced {
            let value = value
                .to_str()
                .map_err(|e| WorkerError::Platform(format!("{name}: {e}")))?;
            headers.set(name.as_str(), value)?;
        }

        let init = ResponseInit::new();
        init.set_status(self.0.status());
        init.set_status_text(&self.0.status_text());
        init.set_headers(&headers);

        let response = Response::new_with_opt_readable_stream_and_init(self.0.body().as_ref(), &init)?;
        Ok(Self(response))
    }
}

fn as_response(value: JsValue) -> Option<WebResponse> {
    value.dyn_into::<Response>().ok().map(WebResponse)
}

pub struct WebCache(Cache);

impl CacheBucket for WebCache {
    type Response = WebResponse;

    async fn add(&self, path: &str) -> Result<(), WorkerError> {
        // Cache.add rejects on non-OK responses so a 404 fails the install
        JsFuture::from(self.0.add_with_str(path))
            .await
            .map_err(|e| WorkerError::Cache(format!("cache::add {path}: {}", describe(&e))))?;
        Ok(())
    }

    async fn lookup(&self, path: &str) -> Result<Option<WebResponse>, WorkerError> {
        let cached = JsFuture::from(self.0.match_with_str(path))
            .await
            .map_err(|e| WorkerError::Cache(format!("cache::match {path}: {}", describe(&e))))?;
        Ok(as_response(cached))
    }
}

#[derive(Clone)]
pub struct WebEnvironment {
    sw: ServiceWorkerGlobalScope,
}

impl WebEnvironment {
    pub fn new(sw: ServiceWorkerGlobalScope) -> Self {
        Self { sw }
    }
}

impl Environment for WebEnvironment {
    type Request = WebRequest;
    type Response = WebResponse;
    type Cache = WebCache;

    async fn fetch(&self, request: &WebRequest) -> Result<WebResponse, WorkerError> {
        let response = JsFuture::from(self.sw.fetch_with_request(&request.request))
            .await
            .map_err(|e| WorkerError::Network(describe(&e)))?;

        as_response(response).ok_or_else(|| {
            WorkerError::Platform("Fetch returned something other than a Response".to_string())
        })
    }

    async fn preload_response(
        &self,
        request: &WebRequest,
    ) -> Result<Option<WebResponse>, WorkerError> {
        // Not in every browser's FetchEvent so go through Reflect
        let preload = Reflect::get(&request.event, &JsValue::from_str("preloadResponse"))?;
        if preload.is_undefined() || preload.is_null() {
            return Ok(None);
        }

        let response = JsFuture::from(Promise::resolve(&preload))
            .await
            .map_err(|e| WorkerError::Network(describe(&e)))?;
        Ok(as_response(response))
    }

    async fn open_cache(&self, name: &str) -> Result<WebCache, WorkerError> {
        let caches = self.sw.caches()?;
        let cache = JsFuture::from(caches.open(name))
            .await
            .map_err(|e| WorkerError::Cache(format!("caches::open {name}: {}", describe(&e))))?;
        Ok(WebCache(cache.into()))
    }

    async fn enable_navigation_preload(&self) -> Result<bool, WorkerError> {
        let registration = self.sw.registration();
        let manager = Reflect::get(&registration, &JsValue::from_str("navigationPreload"))?;
        if manager.is_undefined() || manager.is_null() {
            return Ok(false);
        }

        let enable: Function = Reflect::get(&manager, &JsValue::from_str("enable"))?.dyn_into()?;
        JsFuture::from(Promise::resolve(&enable.call0(&manager)?)).await?;
        Ok(true)
    }

    fn skip_waiting(&self) -> Result<(), WorkerError> {
        // MDN states the promise returned can be safely ignored
        let _ = self.sw.skip_waiting()?;
        Ok(())
    }
}
