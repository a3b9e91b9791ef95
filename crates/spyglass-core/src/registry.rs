//! Registry state: the ordered record sequence, the selection pointer, the
//! shared counter, and the per-handle side table.
//!
//! One value of this type sits behind the host's lock. Mutations that must be
//! atomic with a related read happen inside a single method call, so callers
//! never hold partial state across a suspension point.

use crate::app::{DescriptorId, HandleId};
use crate::ident::IdentRegistry;
use crate::record::AppRecord;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-handle state owned by the registry.
///
/// The original design cached the identifier and the record directly on the
/// application's own object; this side table keeps the core from mutating
/// externally owned values while preserving the same lookups.
#[derive(Default)]
struct HandleState {
    ident: Option<String>,
    record: Option<Arc<AppRecord>>,
}

pub(crate) struct RegistryState {
    /// Active records in registration order.
    records: Vec<Arc<AppRecord>>,
    /// The selected record. Always a member of `records` when set.
    current: Option<Arc<AppRecord>>,
    /// Mirror of the selected record's last-inspected component id.
    current_inspected_component_id: Option<String>,
    /// Shared monotonic counter: naming seed and identifier fallback.
    counter: u64,
    idents: IdentRegistry,
    handles: HashMap<HandleId, HandleState>,
}

impl RegistryState {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            current: None,
            current_inspected_component_id: None,
            counter: 0,
            idents: IdentRegistry::new(),
            handles: HashMap::new(),
        }
    }

    /// Advance the shared counter and return the new value. Values are
    /// strictly increasing; abandoned registrations leave gaps.
    pub fn next_counter(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }

    /// Allocate (or return the cached) identifier for a handle.
    ///
    /// Idempotent per handle: the first allocation is cached in the side
    /// table and returned unchanged by later calls.
    pub fn ident_for(
        &mut self,
        handle: HandleId,
        default_id: Option<&str>,
        fallback_seed: u64,
    ) -> String {
        let entry = self.handles.entry(handle).or_default();
        if let Some(ref ident) = entry.ident {
            return ident.clone();
        }

        let ident = self.idents.allocate(default_id, fallback_seed);
        entry.ident = Some(ident.clone());
        ident
    }

    /// Store the record back-reference for a handle.
    pub fn set_handle_record(&mut self, handle: HandleId, record: Arc<AppRecord>) {
        self.handles.entry(handle).or_default().record = Some(record);
    }

    /// The published record for a handle, if any.
    ///
    /// Only consults the record sequence: a record that is still being
    /// constructed by an in-flight registration does not count as existing
    /// yet, so waiters synchronize on publication rather than on a partially
    /// constructed record.
    pub fn record_for_handle(&self, handle: HandleId) -> Option<Arc<AppRecord>> {
        self.records
            .iter()
            .find(|r| r.descriptor().app().id() == handle)
            .cloned()
    }

    /// The record registered from a descriptor, if any.
    pub fn record_for_descriptor(&self, descriptor: DescriptorId) -> Option<Arc<AppRecord>> {
        self.records
            .iter()
            .find(|r| r.descriptor().id() == descriptor)
            .cloned()
    }

    /// Append a record to the sequence.
    pub fn insert_record(&mut self, record: Arc<AppRecord>) {
        self.records.push(record);
    }

    /// Remove a handle's record: frees its identifier, drops it from the
    /// sequence and the side table, and clears the selection if it pointed at
    /// the removed record. Returns the removed record.
    pub fn remove_by_handle(&mut self, handle: HandleId) -> Option<Arc<AppRecord>> {
        let state = self.handles.remove(&handle)?;
        let record = state.record?;

        if let Some(ref ident) = state.ident {
            self.idents.free(ident);
        }

        self.records.retain(|r| r.id() != record.id());

        if self
            .current
            .as_ref()
            .is_some_and(|current| current.id() == record.id())
        {
            self.current = None;
            self.current_inspected_component_id = None;
        }

        Some(record)
    }

    /// Point the selection at a record and mirror its last-inspected id.
    pub fn select(&mut self, record: &Arc<AppRecord>) {
        self.current_inspected_component_id = record.last_inspected_component_id();
        self.current = Some(record.clone());
    }

    /// Snapshot of the active records, in registration order.
    pub fn records(&self) -> Vec<Arc<AppRecord>> {
        self.records.clone()
    }

    /// The selected record, if any.
    pub fn selected(&self) -> Option<Arc<AppRecord>> {
        self.current.clone()
    }

    /// Mirror of the selected record's last-inspected component id.
    pub fn current_inspected_component_id(&self) -> Option<String> {
        self.current_inspected_component_id.clone()
    }

    /// Whether an identifier is currently allocated.
    #[cfg(test)]
    pub fn ident_allocated(&self, id: &str) -> bool {
        self.idents.is_allocated(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{AppDescriptor, AppHandle, DevtoolsOptions, ElementRef, InstanceRef};
    use crate::backend::AppBackend;
    use crate::error::Result;
    use async_trait::async_trait;

    struct StubBackend;

    #[async_trait]
    impl AppBackend for StubBackend {
        async fn root_instance(&self, _app: &AppHandle) -> Result<Option<InstanceRef>> {
            Ok(Some(InstanceRef::new()))
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
            Ok(())
        }
    }

    fn record_for(descriptor: &AppDescriptor, id: &str) -> Arc<AppRecord> {
        Arc::new(AppRecord::new(
            id.to_string(),
            id.to_string(),
            descriptor.clone(),
            Arc::new(StubBackend),
            InstanceRef::new(),
            None,
        ))
    }

    fn register(state: &mut RegistryState, id: &str) -> (AppHandle, Arc<AppRecord>) {
        let app = AppHandle::new();
        let descriptor = AppDescriptor::new(app.clone(), "3.0.0");
        let seed = state.next_counter();
        let ident = state.ident_for(app.id(), Some(id), seed);
        let record = record_for(&descriptor, &ident);
        state.set_handle_record(app.id(), record.clone());
        state.insert_record(record.clone());
        (app, record)
    }

    #[test]
    fn test_counter_strictly_increasing() {
        let mut state = RegistryState::new();
        let values: Vec<_> = (0..5).map(|_| state.next_counter()).collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_ident_for_is_idempotent() {
        let mut state = RegistryState::new();
        let app = AppHandle::new();

        let first = state.ident_for(app.id(), Some("shop"), 1);
        let second = state.ident_for(app.id(), Some("other"), 2);

        assert_eq!(first, "shop");
        assert_eq!(second, "shop");
    }

    #[test]
    fn test_records_keep_registration_order() {
        let mut state = RegistryState::new();
        register(&mut state, "alpha");
        register(&mut state, "beta");
        register(&mut state, "gamma");

        let ids: Vec<_> = state.records().iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_remove_frees_ident_and_side_table() {
        let mut state = RegistryState::new();
        let (app, record) = register(&mut state, "shop");
        assert!(state.ident_allocated("shop"));

        let removed = state.remove_by_handle(app.id()).expect("record removed");
        assert_eq!(removed.id(), record.id());
        assert!(!state.ident_allocated("shop"));
        assert!(state.record_for_handle(app.id()).is_none());
        assert!(state.records().is_empty());

        // A removed handle's idempotency cache is gone with it.
        let again = state.ident_for(app.id(), Some("shop"), 9);
        assert_eq!(again, "shop");
    }

    #[test]
    fn test_remove_selected_clears_selection() {
        let mut state = RegistryState::new();
        let (app, record) = register(&mut state, "shop");

        record.set_last_inspected_component_id(Some("shop:3".into()));
        state.select(&record);
        assert!(state.selected().is_some());
        assert_eq!(state.current_inspected_component_id(), Some("shop:3".into()));

        state.remove_by_handle(app.id());
        assert!(state.selected().is_none());
        assert!(state.current_inspected_component_id().is_none());
    }

    #[test]
    fn test_remove_other_keeps_selection() {
        let mut state = RegistryState::new();
        let (_app_a, record_a) = register(&mut state, "alpha");
        let (app_b, _record_b) = register(&mut state, "beta");

        state.select(&record_a);
        state.remove_by_handle(app_b.id());

        assert_eq!(state.selected().map(|r| r.id().to_string()), Some("alpha".into()));
    }

    #[test]
    fn test_record_for_descriptor() {
        let mut state = RegistryState::new();
        let (_app, record) = register(&mut state, "shop");

        assert!(state
            .record_for_descriptor(record.descriptor().id())
            .is_some());

        let other = AppDescriptor::new(AppHandle::new(), "3.0.0");
        assert!(state.record_for_descriptor(other.id()).is_none());
    }
}
