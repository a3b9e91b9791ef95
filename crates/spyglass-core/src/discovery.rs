//! Legacy discovery boundary.
//!
//! Some environments mount applications before any explicit registration call
//! can happen. A scanner finds those already-mounted applications; the host
//! feeds each one through the normal registration path with a synthesized
//! descriptor. How a scanner finds applications is out of scope here.

use crate::app::AppHandle;

/// An application found by a scanner, with the runtime version it reports.
#[derive(Debug, Clone)]
pub struct DiscoveredApp {
    pub app: AppHandle,
    pub version: String,
}

impl DiscoveredApp {
    pub fn new(app: AppHandle, version: impl Into<String>) -> Self {
        Self {
            app,
            version: version.into(),
        }
    }
}

/// Producer of already-mounted application handles.
pub trait AppScanner: Send + Sync {
    /// Scan the environment for mounted applications.
    fn scan(&self) -> Vec<DiscoveredApp>;
}
