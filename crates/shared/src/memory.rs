//! An in-process [`Environment`]: a scripted origin, a cache storage and a
//! worker registration held in memory.
//!
//! Used to exercise the lifecycle and interception policies without a
//! browser. URLs are resolved against [`MemoryEnvironment::origin`] so
//! `index.html`, `/index.html` and `https://localhost/index.html` all name
//! the same resource, the way the browser resolves them against the worker
//! scope.

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet},
    rc::Rc,
};

use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

use crate::{
    env::{CacheBucket, Environment},
    error::WorkerError,
    model::{RequestInfo, RequestMode, ResponseParts},
};

pub const DEFAULT_ORIGIN: &str = "https://localhost";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRequest {
    pub method: Method,
    pub url: String,
    pub mode: RequestMode,
}

impl MemoryRequest {
    pub fn new<S: Into<String>>(method: Method, url: S, mode: RequestMode) -> Self {
        Self {
            method,
            url: url.into(),
            mode,
        }
    }

    pub fn navigate<S: Into<String>>(url: S) -> Self {
        Self::new(Method::GET, url, RequestMode::Navigate)
    }

    pub fn subresource<S: Into<String>>(url: S) -> Self {
        Self::new(Method::GET, url, RequestMode::Cors)
    }
}

impl RequestInfo for MemoryRequest {
    fn method(&self) -> Method {
        self.method.clone()
    }

    fn url(&self) -> String {
        self.url.clone()
    }

    fn mode(&self) -> RequestMode {
        self.mode
    }
}

/// Status is a raw u16 so opaque (status 0) responses can be represented
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl MemoryResponse {
    pub fn new<B: Into<Vec<u8>>>(status: StatusCode, body: B) -> Self {
        Self {
            status: status.as_u16(),
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn ok<B: Into<Vec<u8>>>(body: B) -> Self {
        Self::new(StatusCode::OK, body)
    }

    pub fn opaque() -> Self {
        Self {
            status: 0,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub fn insert_header(mut self, name: HeaderName, value: &'static str) -> Self {
        self.headers.insert(name, HeaderValue::from_static(value));
        self
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl ResponseParts for MemoryResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn header(&self, name: &HeaderName) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    fn with_headers(mut self, headers: &[(HeaderName, HeaderValue)]) -> Result<Self, WorkerError> {
        for (name, value) in headers {
            // insert replaces every existing value for the name
            self.headers.insert(name.clone(), value.clone());
        }
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub enum Preload {
    Ready(MemoryResponse),
    Failed,
}

type Buckets = HashMap<String, HashMap<String, MemoryResponse>>;

#[derive(Debug)]
struct Origin {
    url: String,
    online: Cell<bool>,
    routes: RefCell<HashMap<String, MemoryResponse>>,
    aborted: RefCell<HashSet<String>>,
    fetches: RefCell<Vec<String>>,
}

impl Origin {
    fn key(&self, url: &str) -> String {
        url.strip_prefix(self.url.as_str())
            .unwrap_or(url)
            .trim_start_matches('/')
            .to_string()
    }

    fn fetch(&self, url: &str) -> Result<MemoryResponse, WorkerError> {
        let key = self.key(url);
        self.fetches.borrow_mut().push(key.clone());

        if !self.online.get() {
            return Err(WorkerError::Network(format!("{url}: offline")));
        }
        if self.aborted.borrow().contains(&key) {
            return Err(WorkerError::Network(format!("{url}: aborted")));
        }

        Ok(self
            .routes
            .borrow()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| MemoryResponse::new(StatusCode::NOT_FOUND, "Not Found")))
    }
}

/// Cheap to clone, clones share the same origin and storage
#[derive(Debug, Clone)]
pub struct MemoryEnvironment {
    origin: Rc<Origin>,
    buckets: Rc<RefCell<Buckets>>,
    storage_available: Rc<Cell<bool>>,
    preload_supported: Rc<Cell<bool>>,
    preload_enabled: Rc<Cell<bool>>,
    preloads: Rc<RefCell<HashMap<String, Preload>>>,
    skip_waiting_calls: Rc<Cell<usize>>,
}

impl Default for MemoryEnvironment {
    fn default() -> Self {
        Self::new(DEFAULT_ORIGIN)
    }
}

impl MemoryEnvironment {
    pub fn new<S: Into<String>>(origin: S) -> Self {
        Self {
            origin: Rc::new(Origin {
                url: origin.into(),
                online: Cell::new(true),
                routes: RefCell::new(HashMap::new()),
                aborted: RefCell::new(HashSet::new()),
                fetches: RefCell::new(Vec::new()),
            }),
            buckets: Rc::new(RefCell::new(HashMap::new())),
            storage_available: Rc::new(Cell::new(true)),
            preload_supported: Rc::new(Cell::new(true)),
            preload_enabled: Rc::new(Cell::new(false)),
            preloads: Rc::new(RefCell::new(HashMap::new())),
            skip_waiting_calls: Rc::new(Cell::new(0)),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin.url
    }

    /// Serve `response` for `url` from the origin
    pub fn route(&self, url: &str, response: MemoryResponse) -> &Self {
        let key = self.origin.key(url);
        self.origin.routes.borrow_mut().insert(key, response);
        self
    }

    pub fn set_online(&self, online: bool) -> &Self {
        self.origin.online.set(online);
        self
    }

    /// Every fetch of `url` rejects as if the document aborted it
    pub fn abort(&self, url: &str) -> &Self {
        let key = self.origin.key(url);
        self.origin.aborted.borrow_mut().insert(key);
        self
    }

    pub fn set_storage_available(&self, available: bool) -> &Self {
        self.storage_available.set(available);
        self
    }

    pub fn set_preload_supported(&self, supported: bool) -> &Self {
        self.preload_supported.set(supported);
        self
    }

    /// Pretend the browser issued a preload for the navigation to `url`.
    /// Only consulted once navigation preload has been enabled.
    pub fn preload(&self, url: &str, preload: Preload) -> &Self {
        let key = self.origin.key(url);
        self.preloads.borrow_mut().insert(key, preload);
        self
    }

    pub fn navigation_preload_enabled(&self) -> bool {
        self.preload_enabled.get()
    }

    /// Resources requested from the origin, in order, including failed ones
    pub fn fetches(&self) -> Vec<String> {
        self.origin.fetches.borrow().clone()
    }

    pub fn skip_waiting_calls(&self) -> usize {
        self.skip_waiting_calls.get()
    }

    pub fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.buckets.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    /// Keys stored in bucket `name`, sorted. None if the bucket doesn't exist.
    pub fn cache_keys(&self, name: &str) -> Option<Vec<String>> {
        self.buckets.borrow().get(name).map(|entries| {
            let mut keys: Vec<_> = entries.keys().cloned().collect();
            keys.sort();
            keys
        })
    }
}

#[derive(Debug, Clone)]
pub struct MemoryCache {
    name: String,
    origin: Rc<Origin>,
    buckets: Rc<RefCell<Buckets>>,
}

impl CacheBucket for MemoryCache {
    type Response = MemoryResponse;

    async fn add(&self, path: &str) -> Result<(), WorkerError> {
        let response = self.origin.fetch(path)?;
        if !StatusCode::from_u16(response.status).is_ok_and(|s| s.is_success()) {
            return Err(WorkerError::Cache(format!(
                "{path}: bad response status {}",
                response.status
            )));
        }

        let key = self.origin.key(path);
        self.buckets
            .borrow_mut()
            .entry(self.name.clone())
            .or_default()
            .insert(key, response);
        Ok(())
    }

    async fn lookup(&self, path: &str) -> Result<Option<MemoryResponse>, WorkerError> {
        let key = self.origin.key(path);
        Ok(self
            .buckets
            .borrow()
            .get(&self.name)
            .and_then(|entries| entries.get(&key))
            .cloned())
    }
}

impl Environment for MemoryEnvironment {
    type Request = MemoryRequest;
    type Response = MemoryResponse;
    type Cache = MemoryCache;

    async fn fetch(&self, request: &MemoryRequest) -> Result<MemoryResponse, WorkerError> {
        self.origin.fetch(&request.url)
    }

    async fn preload_response(
        &self,
        request: &MemoryRequest,
    ) -> Result<Option<MemoryResponse>, WorkerError> {
        if !self.preload_enabled.get() || !request.mode.is_navigation() {
            return Ok(None);
        }

        match self.preloads.borrow().get(&self.origin.key(&request.url)) {
            Some(Preload::Ready(response)) => Ok(Some(response.clone())),
            Some(Preload::Failed) => {
                Err(WorkerError::Network(format!("{}: preload failed", request.url)))
            }
            None => Ok(None),
        }
    }

    async fn open_cache(&self, name: &str) -> Result<MemoryCache, WorkerError> {
        if !self.storage_available.get() {
            return Err(WorkerError::Cache("storage unavailable".to_string()));
        }

        self.buckets
            .borrow_mut()
            .entry(name.to_string())
            .or_default();

        Ok(MemoryCache {
            name: name.to_string(),
            origin: self.origin.clone(),
            buckets: self.buckets.clone(),
        })
    }

    async fn enable_navigation_preload(&self) -> Result<bool, WorkerError> {
        if !self.preload_supported.get() {
            return Ok(false);
        }
        self.preload_enabled.set(true);
        Ok(true)
    }

    fn skip_waiting(&self) -> Result<(), WorkerError> {
        self.skip_waiting_calls.set(self.skip_waiting_calls.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use tokio_test::block_on;

    use super::*;

    #[test]
    fn test_urls_resolve_against_origin() {
        let env = MemoryEnvironment::default();
        env.route("/index.html", MemoryResponse::ok("shell"));

        for url in ["index.html", "/index.html", "https://localhost/index.html"] {
            let response = block_on(env.fetch(&MemoryRequest::subresource(url))).unwrap();
            assert_eq!(response.text(), "shell", "{url}");
        }
    }

    #[test]
    fn test_unknown_route_is_404() {
        let env = MemoryEnvironment::default();
        let response = block_on(env.fetch(&MemoryRequest::subresource("/nope"))).unwrap();
        assert_eq!(response.status, 404);
    }

    #[test]
    fn test_add_rejects_non_ok() {
        let env = MemoryEnvironment::default();
        let cache = block_on(env.open_cache("c")).unwrap();
        assert!(block_on(cache.add("missing.html")).is_err());
        assert_eq!(env.cache_keys("c"), Some(vec![]));
    }

    #[test]
    fn test_preload_ignored_until_enabled() {
        let env = MemoryEnvironment::default();
        env.preload("/", Preload::Ready(MemoryResponse::ok("preloaded")));

        let request = MemoryRequest::navigate("/");
        assert_eq!(block_on(env.preload_response(&request)).unwrap(), None);

        assert!(block_on(env.enable_navigation_preload()).unwrap());
        assert_eq!(
            block_on(env.preload_response(&request)).unwrap().map(|r| r.text()),
            Some("preloaded".to_string())
        );
    }
}
