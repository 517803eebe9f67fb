//! The seam between the worker logic and whatever runs it.
//!
//! Futures returned here are not `Send`: the worker is a single threaded,
//! cooperatively scheduled context and the browser implementation holds
//! `JsValue`s across awaits.
#![allow(async_fn_in_trait)]

use crate::{
    error::WorkerError,
    model::{RequestInfo, ResponseParts},
};

pub trait Environment {
    type Request: RequestInfo;
    type Response: ResponseParts;
    type Cache: CacheBucket<Response = Self::Response>;

    /// Live network fetch of the intercepted request
    async fn fetch(&self, request: &Self::Request) -> Result<Self::Response, WorkerError>;

    /// The response the browser already started fetching for a navigation,
    /// if navigation preload is on and one was issued. Errors when the
    /// preload itself failed.
    async fn preload_response(
        &self,
        request: &Self::Request,
    ) -> Result<Option<Self::Response>, WorkerError>;

    /// Opens the named bucket, creating it if it doesn't exist
    async fn open_cache(&self, name: &str) -> Result<Self::Cache, WorkerError>;

    /// Returns false when the platform doesn't support navigation preload
    async fn enable_navigation_preload(&self) -> Result<bool, WorkerError>;

    fn skip_waiting(&self) -> Result<(), WorkerError>;
}

pub trait CacheBucket {
    type Response;

    /// Fetches `path` and stores the response under it. Fails if the fetch
    /// fails or the response isn't OK, leaving the bucket unchanged.
    async fn add(&self, path: &str) -> Result<(), WorkerError>;

    async fn lookup(&self, path: &str) -> Result<Option<Self::Response>, WorkerError>;
}
