use console_error_panic_hook::set_once as set_panic_hook;
use shared::{config::SERVICE_WORKER_SCRIPT, utils::tracing::configure_tracing_once};
use tracing::level_filters::LevelFilter;
use wasm_bindgen::{prelude::wasm_bindgen, JsValue};

mod registration;
pub use registration::*;

/// Registers the offline shell worker. Called once by the page on startup,
/// resolves to whether a worker was registered. Inside the native wrapper
/// this resolves to false instead of failing.
#[wasm_bindgen]
pub async fn register_service_worker(script_url: Option<String>) -> Result<bool, JsValue> {
    set_panic_hook();
    configure_tracing_once(LevelFilter::INFO);

    let script_url = script_url.as_deref().unwrap_or(SERVICE_WORKER_SCRIPT);
    let registration = register(script_url).await?;
    Ok(matches!(registration, Registration::Registered(_)))
}
