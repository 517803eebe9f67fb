use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    /// The fetch rejected: offline, DNS failure, aborted by the document...
    #[error("Network error: {0}")]
    Network(String),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Install failed caching {path}: {inner}")]
    Install { path: String, inner: Box<WorkerError> },
    #[error("Config error: {0}")]
    Config(String),
    /// Anything the host runtime threw that doesn't fit the other variants
    #[error("Platform error: {0}")]
    Platform(String),
}

impl WorkerError {
    pub fn install<S: Into<String>>(path: S, inner: WorkerError) -> Self {
        Self::Install {
            path: path.into(),
            inner: Box::new(inner),
        }
    }
}

#[cfg(feature = "wasm")]
mod js {
    use wasm_bindgen::{JsCast, JsValue};

    use super::WorkerError;

    /// Renders whatever was thrown into something readable. Error objects
    /// don't Debug nicely so pull the message out of them first
    pub fn describe(value: &JsValue) -> String {
        if let Some(e) = value.dyn_ref::<js_sys::Error>() {
            return String::from(e.message());
        }
        value.as_string().unwrap_or_else(|| format!("{:?}", value))
    }

    impl From<JsValue> for WorkerError {
        fn from(value: JsValue) -> Self {
            Self::Platform(describe(&value))
        }
    }

    impl From<WorkerError> for JsValue {
        fn from(err: WorkerError) -> Self {
            // TypeError is what fetch rejects with, respondWith surfaces it
            // to the document as a network error
            match err {
                WorkerError::Network(_) => js_sys::TypeError::new(&err.to_string()).into(),
                _ => js_sys::Error::new(&err.to_string()).into(),
            }
        }
    }
}

#[cfg(feature = "wasm")]
pub use js::describe;
