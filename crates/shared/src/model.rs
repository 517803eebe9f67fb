use std::fmt::Display;

use http::{HeaderName, HeaderValue, Method};

use crate::error::WorkerError;

/// Mirrors the Fetch standard's request mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Top level document load or reload
    Navigate,
    SameOrigin,
    NoCors,
    Cors,
}

impl RequestMode {
    pub const fn is_navigation(&self) -> bool {
        matches!(self, RequestMode::Navigate)
    }
}

impl Display for RequestMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use RequestMode::*;
        f.write_str(match self {
            Navigate => "navigate",
            SameOrigin => "same-origin",
            NoCors => "no-cors",
            Cors => "cors",
        })
    }
}

/// The parts of an intercepted request the policies look at
pub trait RequestInfo {
    fn method(&self) -> Method;
    fn url(&self) -> String;
    fn mode(&self) -> RequestMode;

    fn is_navigation(&self) -> bool {
        self.mode().is_navigation()
    }
}

pub trait ResponseParts: Sized {
    fn status(&self) -> u16;
    fn header(&self, name: &HeaderName) -> Option<String>;

    /// Builds a new response around the same body and status with `headers`
    /// set, replacing any values already present. Consumes `self` since the
    /// body can only be read once.
    fn with_headers(self, headers: &[(HeaderName, HeaderValue)]) -> Result<Self, WorkerError>;

    /// Opaque (status 0) responses can't be reconstructed, the Response
    /// constructor only accepts 200..=599
    fn is_rewritable(&self) -> bool {
        (200..=599).contains(&self.status())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_only_navigate_is_navigation() {
        assert!(RequestMode::Navigate.is_navigation());
        for mode in [RequestMode::SameOrigin, RequestMode::NoCors, RequestMode::Cors] {
            assert!(!mode.is_navigation(), "{mode}");
        }
    }
}
