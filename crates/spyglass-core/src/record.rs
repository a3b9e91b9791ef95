//! Application records.
//!
//! An [`AppRecord`] is the tracked representation of one registered
//! application instance. Records are created only by the registration
//! pipeline and destroyed only by removal; everything else reads them through
//! shared `Arc`s.

use crate::app::{AppDescriptor, InstanceRef};
use crate::backend::AppBackend;
use crate::events::MinimalAppRecord;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// One registered application instance.
pub struct AppRecord {
    id: String,
    name: String,
    descriptor: AppDescriptor,
    backend: Arc<dyn AppBackend>,
    root_instance: InstanceRef,
    iframe_origin: Option<String>,
    registered_at: DateTime<Utc>,
    state: RwLock<RecordState>,
}

/// Mutable parts of a record, touched after registration by selection,
/// instrumentation, and performance tracking.
#[derive(Default)]
struct RecordState {
    last_inspected_component_id: Option<String>,
    instances: HashMap<String, InstanceRef>,
    perf_group_ids: HashMap<String, u64>,
}

impl AppRecord {
    /// Construct a record. The instance map starts with the `"{id}:root"`
    /// entry pointing at the root instance; that entry exists for the
    /// record's whole lifetime.
    pub fn new(
        id: String,
        name: String,
        descriptor: AppDescriptor,
        backend: Arc<dyn AppBackend>,
        root_instance: InstanceRef,
        iframe_origin: Option<String>,
    ) -> Self {
        let root_id = format!("{}:root", id);
        let mut instances = HashMap::new();
        instances.insert(root_id, root_instance.clone());

        Self {
            id,
            name,
            descriptor,
            backend,
            root_instance,
            iframe_origin,
            registered_at: Utc::now(),
            state: RwLock::new(RecordState {
                instances,
                ..Default::default()
            }),
        }
    }

    /// The record's identifier, unique among currently active records.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The backend-provided display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The descriptor this record was registered from.
    pub fn descriptor(&self) -> &AppDescriptor {
        &self.descriptor
    }

    /// The runtime version the application reported.
    pub fn version(&self) -> &str {
        self.descriptor.version()
    }

    /// Metadata copied from the descriptor.
    pub fn meta(&self) -> &Map<String, Value> {
        self.descriptor.meta()
    }

    /// The resolved backend adapter handling this application.
    pub fn backend(&self) -> &Arc<dyn AppBackend> {
        &self.backend
    }

    /// The application's root component instance.
    pub fn root_instance(&self) -> &InstanceRef {
        &self.root_instance
    }

    /// The composite instance id of the root instance.
    pub fn root_instance_id(&self) -> String {
        format!("{}:root", self.id)
    }

    /// Path of the owning document when the application's root element lives
    /// in a different document than the host document.
    pub fn iframe_origin(&self) -> Option<&str> {
        self.iframe_origin.as_deref()
    }

    /// When this record was registered.
    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    // ========================================
    // Inspection state
    // ========================================

    /// The last component selected for inspection, if any.
    pub fn last_inspected_component_id(&self) -> Option<String> {
        self.read().last_inspected_component_id.clone()
    }

    /// Record which component was last selected for inspection.
    pub fn set_last_inspected_component_id(&self, component_id: Option<String>) {
        self.write().last_inspected_component_id = component_id;
    }

    // ========================================
    // Instance map
    // ========================================

    /// Look up a component instance by composite id.
    pub fn instance(&self, instance_id: &str) -> Option<InstanceRef> {
        self.read().instances.get(instance_id).cloned()
    }

    /// Add a component instance under a composite id. Instrumentation grows
    /// the map as it walks the application.
    pub fn add_instance(&self, instance_id: impl Into<String>, instance: InstanceRef) {
        self.write().instances.insert(instance_id.into(), instance);
    }

    /// Composite ids of every tracked instance, sorted.
    pub fn instance_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.read().instances.keys().cloned().collect();
        ids.sort();
        ids
    }

    // ========================================
    // Performance tracking
    // ========================================

    /// Look up a performance group id. Opaque to this core.
    pub fn perf_group_id(&self, key: &str) -> Option<u64> {
        self.read().perf_group_ids.get(key).copied()
    }

    /// Store a performance group id. Opaque to this core.
    pub fn set_perf_group_id(&self, key: impl Into<String>, group_id: u64) {
        self.write().perf_group_ids.insert(key.into(), group_id);
    }

    /// The minimized projection carried by outbound events.
    pub fn to_minimal(&self) -> MinimalAppRecord {
        MinimalAppRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            version: self.descriptor.version().to_string(),
            iframe: self.iframe_origin.clone(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RecordState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, RecordState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for AppRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("version", &self.descriptor.version())
            .field("iframe_origin", &self.iframe_origin)
            .finish()
    }
}
