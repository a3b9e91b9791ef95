//! Application handles, descriptors, and opaque instrumentation references.
//!
//! Everything the host knows about an application arrives through these
//! identity-bearing tokens. The host never mutates them: per-handle state
//! (cached identifier, record back-reference) lives in a side table owned by
//! the registry, keyed by [`HandleId`].

use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_DESCRIPTOR_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an [`AppHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "app-{}", self.0)
    }
}

/// Process-unique identity of an [`AppDescriptor`].
///
/// Deduplication is by descriptor identity: two registrations carrying the
/// same descriptor refer to the same application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorId(u64);

/// Opaque handle to one instrumented application instance.
///
/// Cheap to clone; clones share identity. An optional label is carried for
/// diagnostics only and never influences behavior.
#[derive(Clone)]
pub struct AppHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    id: HandleId,
    label: Option<String>,
}

impl AppHandle {
    /// Create a new handle with a fresh identity.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id: HandleId(NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed)),
                label: None,
            }),
        }
    }

    /// Create a new handle carrying a diagnostic label.
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id: HandleId(NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed)),
                label: Some(label.into()),
            }),
        }
    }

    /// The handle's process-unique identity.
    pub fn id(&self) -> HandleId {
        self.inner.id
    }

    /// The diagnostic label, if one was set.
    pub fn label(&self) -> Option<&str> {
        self.inner.label.as_deref()
    }

    /// Human-readable description for logs and error messages.
    pub fn describe(&self) -> String {
        match self.inner.label {
            Some(ref label) => label.clone(),
            None => self.inner.id.to_string(),
        }
    }
}

impl Default for AppHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for AppHandle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for AppHandle {}

impl fmt::Debug for AppHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppHandle")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .finish()
    }
}

/// Identity and metadata token for one application instance.
///
/// Carries the application handle, the runtime version the application
/// reports, and a free-form metadata mapping copied onto the record at
/// registration time.
#[derive(Clone)]
pub struct AppDescriptor {
    inner: Arc<DescriptorInner>,
}

struct DescriptorInner {
    id: DescriptorId,
    app: AppHandle,
    version: String,
    meta: Map<String, Value>,
}

impl AppDescriptor {
    /// Create a descriptor with empty metadata.
    pub fn new(app: AppHandle, version: impl Into<String>) -> Self {
        Self::with_meta(app, version, Map::new())
    }

    /// Create a descriptor with a metadata mapping.
    pub fn with_meta(
        app: AppHandle,
        version: impl Into<String>,
        meta: Map<String, Value>,
    ) -> Self {
        Self {
            inner: Arc::new(DescriptorInner {
                id: DescriptorId(NEXT_DESCRIPTOR_ID.fetch_add(1, Ordering::Relaxed)),
                app,
                version: version.into(),
                meta,
            }),
        }
    }

    /// The descriptor's process-unique identity.
    pub fn id(&self) -> DescriptorId {
        self.inner.id
    }

    /// The application handle this descriptor identifies.
    pub fn app(&self) -> &AppHandle {
        &self.inner.app
    }

    /// The runtime version string the application reported.
    pub fn version(&self) -> &str {
        &self.inner.version
    }

    /// The free-form metadata mapping.
    pub fn meta(&self) -> &Map<String, Value> {
        &self.inner.meta
    }
}

impl fmt::Debug for AppDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppDescriptor")
            .field("id", &self.inner.id)
            .field("app", &self.inner.app)
            .field("version", &self.inner.version)
            .finish()
    }
}

/// Opaque reference to a component instance inside an application.
///
/// Produced by backend adapters; the host only stores and forwards these.
#[derive(Clone)]
pub struct InstanceRef {
    inner: Arc<InstanceInner>,
}

struct InstanceInner {
    uid: u64,
}

impl InstanceRef {
    /// Create a fresh instance reference.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(InstanceInner {
                uid: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
            }),
        }
    }

    /// Check whether two references point at the same instance.
    pub fn same_instance(&self, other: &InstanceRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for InstanceRef {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InstanceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceRef({})", self.inner.uid)
    }
}

/// Reference to a document an element is rendered into.
///
/// Comparison is by identity, not by path: two documents may share a path
/// string while being distinct documents.
#[derive(Clone)]
pub struct DocumentRef {
    inner: Arc<DocumentInner>,
}

struct DocumentInner {
    path: String,
}

impl DocumentRef {
    /// Create a document reference with the given path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(DocumentInner { path: path.into() }),
        }
    }

    /// The document's path.
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// Check whether two references point at the same document.
    pub fn same_document(&self, other: &DocumentRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentRef({:?})", self.inner.path)
    }
}

/// Opaque reference to a rendered root element.
#[derive(Debug, Clone)]
pub struct ElementRef {
    document: DocumentRef,
}

impl ElementRef {
    /// Create an element reference owned by the given document.
    pub fn in_document(document: DocumentRef) -> Self {
        Self { document }
    }

    /// The document this element is rendered into.
    pub fn owner_document(&self) -> &DocumentRef {
        &self.document
    }
}

/// Inspector-facing options a backend reports for an application root.
#[derive(Debug, Clone, Default)]
pub struct DevtoolsOptions {
    /// When true, the application is hidden from the inspector: it is
    /// excluded from list snapshots and never auto-selected.
    pub hide: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_identity_unique() {
        let a = AppHandle::new();
        let b = AppHandle::new();
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
    }

    #[test]
    fn test_handle_clone_shares_identity() {
        let a = AppHandle::new();
        let b = a.clone();
        assert_eq!(a.id(), b.id());
        assert_eq!(a, b);
    }

    #[test]
    fn test_handle_describe() {
        let plain = AppHandle::new();
        assert!(plain.describe().starts_with("app-"));

        let labelled = AppHandle::with_label("storefront");
        assert_eq!(labelled.describe(), "storefront");
    }

    #[test]
    fn test_descriptor_identity() {
        let app = AppHandle::new();
        let a = AppDescriptor::new(app.clone(), "3.2.0");
        let b = AppDescriptor::new(app, "3.2.0");

        // Distinct descriptors, even over the same handle and version.
        assert_ne!(a.id(), b.id());
        // Clones share identity.
        assert_eq!(a.id(), a.clone().id());
    }

    #[test]
    fn test_document_identity_not_path() {
        let a = DocumentRef::new("/index.html");
        let b = DocumentRef::new("/index.html");
        assert!(a.same_document(&a.clone()));
        assert!(!a.same_document(&b));
        assert_eq!(a.path(), b.path());
    }

    #[test]
    fn test_element_owner_document() {
        let doc = DocumentRef::new("/frame.html");
        let el = ElementRef::in_document(doc.clone());
        assert!(el.owner_document().same_document(&doc));
    }
}
