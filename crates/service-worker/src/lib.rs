//! Offline shell service worker.
//!
//! The bootstrap script (`js/sw.js`) constructs one [`Worker`] when the
//! worker script is evaluated and forwards the install, activate, fetch and
//! message events to it.

use std::rc::Rc;

use console_error_panic_hook::set_once as set_panic_hook;
use gloo::utils::format::JsValueSerdeExt;
use shared::{
    intercept::Interceptor, lifecycle, utils::tracing::configure_tracing_once as configure_tracing,
    WorkerConfig, WorkerError,
};
use tracing::{debug, error};
use wasm_bindgen::{prelude::wasm_bindgen, JsValue};
use wasm_bindgen_futures::future_to_promise;
use web_sys::{js_sys::Promise, FetchEvent, MessageEvent, ServiceWorkerGlobalScope};

mod env;
pub use env::{WebCache, WebEnvironment, WebRequest, WebResponse};

fn load_config(config: &JsValue) -> Result<WorkerConfig, WorkerError> {
    let value = if config.is_undefined() || config.is_null() {
        serde_json::Value::Null
    } else {
        config
            .into_serde()
            .map_err(|e| WorkerError::Config(e.to_string()))?
    };
    WorkerConfig::from_value(value)
}

fn data_to_json(data: &JsValue) -> serde_json::Value {
    if data.is_undefined() {
        return serde_json::Value::Null;
    }
    data.into_serde().unwrap_or(serde_json::Value::Null)
}

async fn install(env: WebEnvironment, interceptor: Rc<Interceptor>) -> Result<JsValue, JsValue> {
    lifecycle::install(&env, interceptor.config()).await?;
    Ok(JsValue::undefined())
}

async fn activate(env: WebEnvironment) -> Result<JsValue, JsValue> {
    lifecycle::activate(&env).await;
    Ok(JsValue::undefined())
}

async fn fetch(
    env: WebEnvironment,
    interceptor: Rc<Interceptor>,
    request: WebRequest,
) -> Result<JsValue, JsValue> {
    match interceptor.handle(&env, &request).await {
        Ok(Some(response)) => Ok(response.into_inner().into()),
        // Nothing cached to fall back to, respondWith turns the rejection
        // into a network error for the document
        Ok(None) => Err(WorkerError::Network("No offline page cached".to_string()).into()),
        Err(e) => {
            error!("fetch failed: {e}");
            Err(e.into())
        }
    }
}

#[wasm_bindgen]
pub struct Worker {
    env: WebEnvironment,
    interceptor: Rc<Interceptor>,
}

#[wasm_bindgen]
impl Worker {
    /// `config` is a plain object matching `WorkerConfig` (camelCase keys),
    /// or undefined for the defaults
    #[wasm_bindgen(constructor)]
    pub fn new(sw: ServiceWorkerGlobalScope, config: JsValue) -> Result<Worker, JsValue> {
        set_panic_hook();

        let config = load_config(&config)?;
        configure_tracing(config.max_log_level()?);
        debug!(?config, "Worker starting");

        Ok(Self {
            env: WebEnvironment::new(sw),
            interceptor: Rc::new(Interceptor::new(config)),
        })
    }

    /// Pass the returned promise to `event.waitUntil`
    pub fn install(&self) -> Promise {
        future_to_promise(install(self.env.clone(), self.interceptor.clone()))
    }

    /// Pass the returned promise to `event.waitUntil`
    pub fn activate(&self) -> Promise {
        future_to_promise(activate(self.env.clone()))
    }

    /// Resolves with the response for `event.respondWith`. The bootstrap
    /// calls respondWith synchronously with a promise chained on the wasm
    /// module loading, so this only needs the event for its request and
    /// preload response.
    pub fn fetch(&self, event: FetchEvent) -> Promise {
        future_to_promise(fetch(
            self.env.clone(),
            self.interceptor.clone(),
            WebRequest::from_event(event),
        ))
    }

    pub fn message(&self, event: MessageEvent) -> Result<(), JsValue> {
        lifecycle::on_message(&self.env, &data_to_json(&event.data()))?;
        Ok(())
    }
}
