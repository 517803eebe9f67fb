use js_sys::{Function, Reflect};
use shared::{error::describe, WorkerError};
use tracing::{info, warn};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::ServiceWorkerRegistration;

/// What the page is running in, as far as registering a worker goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Host {
    pub has_window: bool,
    /// Capacitor's native wrapper, which has no service worker host
    pub native_platform: bool,
    pub service_worker_supported: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoWindow,
    NativePlatform,
    Unsupported,
}

#[derive(Debug)]
pub enum Registration {
    Registered(ServiceWorkerRegistration),
    Skipped(SkipReason),
}

impl Host {
    pub fn detect() -> Self {
        let Some(window) = web_sys::window() else {
            return Self {
                has_window: false,
                native_platform: is_native_platform(),
                service_worker_supported: false,
            };
        };

        let service_worker_supported =
            Reflect::has(&window.navigator(), &JsValue::from_str("serviceWorker")).unwrap_or(false);

        Self {
            has_window: true,
            native_platform: is_native_platform(),
            service_worker_supported,
        }
    }

    /// None means go ahead and register
    pub fn skip_reason(&self) -> Option<SkipReason> {
        if !self.has_window {
            Some(SkipReason::NoWindow)
        } else if self.native_platform {
            Some(SkipReason::NativePlatform)
        } else if !self.service_worker_supported {
            Some(SkipReason::Unsupported)
        } else {
            None
        }
    }
}

/// `globalThis.Capacitor?.isNativePlatform?.()`
fn is_native_platform() -> bool {
    let global = js_sys::global();
    let Ok(capacitor) = Reflect::get(&global, &JsValue::from_str("Capacitor")) else {
        return false;
    };
    if capacitor.is_undefined() || capacitor.is_null() {
        return false;
    }

    Reflect::get(&capacitor, &JsValue::from_str("isNativePlatform"))
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok())
        .and_then(|f| f.call0(&capacitor).ok())
        .is_some_and(|v| v.is_truthy())
}

/// Registers `script_url` relative to the page's origin. Skipping is not an
/// error, the page works without the worker, it just isn't available offline.
pub async fn register(script_url: &str) -> Result<Registration, WorkerError> {
    let host = Host::detect();
    if let Some(reason) = host.skip_reason() {
        info!(?reason, "Skipping service worker registration");
        return Ok(Registration::Skipped(reason));
    }

    let Some(window) = web_sys::window() else {
        return Ok(Registration::Skipped(SkipReason::NoWindow));
    };

    let registration = JsFuture::from(window.navigator().service_worker().register(script_url))
        .await
        .map_err(|e| {
            let e = describe(&e);
            warn!(script_url, "Service worker registration failed: {e}");
            WorkerError::Platform(format!("register {script_url}: {e}"))
        })?;

    info!(script_url, "Service worker registered");
    Ok(Registration::Registered(registration.into()))
}

#[cfg(test)]
mod test {
    use super::*;

    fn browser() -> Host {
        Host {
            has_window: true,
            native_platform: false,
            service_worker_supported: true,
        }
    }

    #[test]
    fn test_browser_registers() {
        assert_eq!(browser().skip_reason(), None);
    }

    #[test]
    fn test_native_wrapper_skips() {
        let host = Host {
            native_platform: true,
            ..browser()
        };
        assert_eq!(host.skip_reason(), Some(SkipReason::NativePlatform));
    }

    #[test]
    fn test_no_service_worker_skips() {
        let host = Host {
            service_worker_supported: false,
            ..browser()
        };
        assert_eq!(host.skip_reason(), Some(SkipReason::Unsupported));
    }

    #[test]
    fn test_no_window_skips() {
        let host = Host {
            has_window: false,
            native_platform: true,
            service_worker_supported: false,
        };
        assert_eq!(host.skip_reason(), Some(SkipReason::NoWindow));
    }
}
