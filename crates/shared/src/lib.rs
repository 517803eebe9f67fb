//! Offline shell and cross-origin isolation logic shared by the service
//! worker and the host page.
//!
//! Everything in here is written against the [`env::Environment`] seam so the
//! lifecycle and interception policies run the same way in the browser and in
//! the in-memory `memory::MemoryEnvironment` (behind the `memory` feature).

pub mod config;
pub mod env;
pub mod error;
pub mod intercept;
pub mod lifecycle;
#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod message;
pub mod model;
pub mod utils;

pub use config::WorkerConfig;
pub use error::WorkerError;
