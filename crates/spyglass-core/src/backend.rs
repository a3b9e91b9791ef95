//! Backend adapter surface and framework-version resolution.
//!
//! A backend adapter bridges the host to one framework major version's
//! runtime introspection. Adapters are declared up front as descriptors and
//! activated lazily: the first registration that needs a given major version
//! instantiates its adapter, later registrations reuse the cached instance.

use crate::app::{AppHandle, DevtoolsOptions, ElementRef, InstanceRef};
use crate::error::Result;
use crate::record::AppRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Capability surface of a backend adapter.
///
/// Every method may suspend; implementations typically call into the
/// instrumented application's runtime.
#[async_trait]
pub trait AppBackend: Send + Sync {
    /// The application's root component instance, if it has mounted one.
    async fn root_instance(&self, app: &AppHandle) -> Result<Option<InstanceRef>>;

    /// A display name for the application. `fallback_seed` is the host's
    /// monotonic counter value for this registration; backends without a
    /// better name derive one from it.
    async fn record_name(&self, app: &AppHandle, fallback_seed: u64) -> Result<String>;

    /// The rendered root elements of a component instance, in order.
    async fn root_elements(&self, root: &InstanceRef) -> Result<Vec<ElementRef>>;

    /// Inspector options the application declares on its root.
    async fn devtools_options(&self, root: &InstanceRef) -> Result<DevtoolsOptions>;

    /// The backend's application-registration capability, awaited once per
    /// record after it is published.
    async fn register_application(&self, app: &AppHandle) -> Result<()>;

    /// Optional synchronous setup hook, invoked fire-and-forget with the new
    /// record right after publication. The adapter itself is the capability
    /// surface available to the hook. Default: no-op.
    fn setup_app(&self, _record: &Arc<AppRecord>) {}
}

type BackendFactory = Box<dyn Fn() -> Arc<dyn AppBackend> + Send + Sync>;

/// Declaration of an available backend adapter.
pub struct BackendDescriptor {
    framework_major: u64,
    factory: BackendFactory,
}

impl BackendDescriptor {
    /// Declare an adapter for a framework major version. The factory runs at
    /// most once, when the first matching application registers.
    pub fn new<F>(framework_major: u64, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn AppBackend> + Send + Sync + 'static,
    {
        Self {
            framework_major,
            factory: Box::new(factory),
        }
    }

    /// The framework major version this adapter handles.
    pub fn framework_major(&self) -> u64 {
        self.framework_major
    }
}

impl std::fmt::Debug for BackendDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendDescriptor")
            .field("framework_major", &self.framework_major)
            .finish()
    }
}

/// Registry of declared adapters with lazy activation.
pub struct BackendRegistry {
    descriptors: Vec<BackendDescriptor>,
    /// Resolved adapters by framework major.
    resolved: RwLock<HashMap<u64, Arc<dyn AppBackend>>>,
}

impl BackendRegistry {
    /// Create a registry over a list of adapter descriptors. Declaration
    /// order matters: the first descriptor matching a version wins.
    pub fn new(descriptors: Vec<BackendDescriptor>) -> Self {
        Self {
            descriptors,
            resolved: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve the adapter for an application's reported version string.
    ///
    /// Returns `None` when the version has no parseable major component or
    /// no declared adapter matches it; the caller treats that as a silent
    /// registration abandon.
    pub fn resolve_for_version(&self, version: &str) -> Option<Arc<dyn AppBackend>> {
        let major = framework_major(version)?;

        let descriptor = self
            .descriptors
            .iter()
            .find(|d| d.framework_major == major)?;

        {
            let resolved = self.resolved.read().unwrap_or_else(|e| e.into_inner());
            if let Some(backend) = resolved.get(&major) {
                return Some(backend.clone());
            }
        }

        let backend = (descriptor.factory)();
        debug!(major, "activated backend adapter");

        let mut resolved = self.resolved.write().unwrap_or_else(|e| e.into_inner());
        // A concurrent resolution may have won the race; keep the first.
        Some(resolved.entry(major).or_insert(backend).clone())
    }

    /// Number of declared adapters.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether any adapters are declared.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("descriptors", &self.descriptors)
            .finish()
    }
}

/// The framework major version of a reported runtime version string: the
/// integer prefix before the first `.`.
pub fn framework_major(version: &str) -> Option<u64> {
    version.split('.').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpyglassError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubBackend;

    #[async_trait]
    impl AppBackend for StubBackend {
        async fn root_instance(&self, _app: &AppHandle) -> Result<Option<InstanceRef>> {
            Ok(None)
        }

        async fn record_name(&self, _app: &AppHandle, fallback_seed: u64) -> Result<String> {
            Ok(format!("App {}", fallback_seed))
        }

        async fn root_elements(&self, _root: &InstanceRef) -> Result<Vec<ElementRef>> {
            Ok(Vec::new())
        }

        async fn devtools_options(&self, _root: &InstanceRef) -> Result<DevtoolsOptions> {
            Ok(DevtoolsOptions::default())
        }

        async fn register_application(&self, _app: &AppHandle) -> Result<()> {
            Err(SpyglassError::backend("stub"))
        }
    }

    #[test]
    fn test_framework_major_parsing() {
        assert_eq!(framework_major("3.2.0"), Some(3));
        assert_eq!(framework_major("2.7"), Some(2));
        assert_eq!(framework_major("10"), Some(10));
        assert_eq!(framework_major("3.2.0-beta.1"), Some(3));
        assert_eq!(framework_major(""), None);
        assert_eq!(framework_major("v3.2.0"), None);
        assert_eq!(framework_major("next"), None);
    }

    #[test]
    fn test_resolution_matches_major() {
        let registry = BackendRegistry::new(vec![
            BackendDescriptor::new(2, || Arc::new(StubBackend)),
            BackendDescriptor::new(3, || Arc::new(StubBackend)),
        ]);

        assert!(registry.resolve_for_version("3.2.0").is_some());
        assert!(registry.resolve_for_version("2.6.14").is_some());
        assert!(registry.resolve_for_version("4.0.0").is_none());
        assert!(registry.resolve_for_version("garbage").is_none());
    }

    #[test]
    fn test_resolution_activates_lazily_and_caches() {
        let activations = Arc::new(AtomicUsize::new(0));
        let counter = activations.clone();

        let registry = BackendRegistry::new(vec![BackendDescriptor::new(3, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(StubBackend)
        })]);

        assert_eq!(activations.load(Ordering::SeqCst), 0);

        let first = registry.resolve_for_version("3.0.0").unwrap();
        let second = registry.resolve_for_version("3.9.9").unwrap();

        assert_eq!(activations.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_first_matching_descriptor_wins() {
        let registry = BackendRegistry::new(vec![
            BackendDescriptor::new(3, || Arc::new(StubBackend)),
            BackendDescriptor::new(3, || {
                panic!("second descriptor for the same major must not activate")
            }),
        ]);

        assert!(registry.resolve_for_version("3.1.0").is_some());
    }
}
