//! The inspection host: registration pipeline, selection, and removal.
//!
//! One [`InspectionHost`] lives for the whole host process. Applications
//! register concurrently; the host serializes record construction through its
//! job queue, assigns stable human-readable identifiers, and reports every
//! addition, removal, and selection change to the outbound channel.

use crate::app::{AppDescriptor, AppHandle, DocumentRef};
use crate::backend::{BackendDescriptor, BackendRegistry};
use crate::config::HostConfig;
use crate::discovery::AppScanner;
use crate::error::{Result, SpyglassError};
use crate::events::{AppEvent, EventChannel, NullChannel};
use crate::ident::slugify;
use crate::queue::JobQueue;
use crate::record::AppRecord;
use crate::registry::RegistryState;
use crate::timeline::{NoopTimeline, TimelineHooks};
use crate::waiters::WaiterRegistry;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Builder for [`InspectionHost`].
pub struct HostBuilder {
    backends: Vec<BackendDescriptor>,
    channel: Option<Arc<dyn EventChannel>>,
    timeline: Option<Arc<dyn TimelineHooks>>,
    host_document: Option<DocumentRef>,
    wait_timeout: Duration,
    queue_depth: usize,
}

impl HostBuilder {
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
            channel: None,
            timeline: None,
            host_document: None,
            wait_timeout: HostConfig::WAIT_TIMEOUT,
            queue_depth: HostConfig::JOB_QUEUE_DEPTH,
        }
    }

    /// Declare a backend adapter. Declaration order decides ties: the first
    /// adapter matching an application's framework major wins.
    pub fn backend(mut self, descriptor: BackendDescriptor) -> Self {
        self.backends.push(descriptor);
        self
    }

    /// Attach the outbound notification channel. Defaults to a channel that
    /// drops every event.
    pub fn channel(mut self, channel: Arc<dyn EventChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Attach the timeline collaborator. Defaults to no-op hooks.
    pub fn timeline(mut self, timeline: Arc<dyn TimelineHooks>) -> Self {
        self.timeline = Some(timeline);
        self
    }

    /// The document this host runs in. Root elements owned by any other
    /// document mark their record with that document's path as its iframe
    /// origin.
    pub fn host_document(mut self, document: DocumentRef) -> Self {
        self.host_document = Some(document);
        self
    }

    /// Override the `wait_for_record` timeout.
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Override the registration queue depth.
    pub fn queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth;
        self
    }

    /// Build the host and spawn its queue worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> InspectionHost {
        InspectionHost {
            inner: Arc::new(HostInner {
                state: RwLock::new(RegistryState::new()),
                waiters: WaiterRegistry::new(),
                queue: JobQueue::new(self.queue_depth),
                backends: BackendRegistry::new(self.backends),
                channel: self.channel.unwrap_or_else(|| Arc::new(NullChannel)),
                timeline: self.timeline.unwrap_or_else(|| Arc::new(NoopTimeline)),
                host_document: self.host_document.unwrap_or_else(|| DocumentRef::new("/")),
                wait_timeout: self.wait_timeout,
            }),
        }
    }
}

impl Default for HostBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks the lifecycle of application records inside a long-lived
/// introspection host process.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct InspectionHost {
    inner: Arc<HostInner>,
}

struct HostInner {
    state: RwLock<RegistryState>,
    waiters: WaiterRegistry,
    queue: JobQueue,
    backends: BackendRegistry,
    channel: Arc<dyn EventChannel>,
    timeline: Arc<dyn TimelineHooks>,
    host_document: DocumentRef,
    wait_timeout: Duration,
}

impl InspectionHost {
    /// Create a builder.
    pub fn builder() -> HostBuilder {
        HostBuilder::new()
    }

    // ========================================
    // Registration
    // ========================================

    /// Register an application.
    ///
    /// The registration runs as a queued job; this call resolves once the job
    /// has run. A job that abandons (duplicate descriptor, no matching
    /// backend, no root instance) resolves `Ok` without creating a record;
    /// the silence is part of the contract.
    ///
    /// # Errors
    /// Only queue-level failures surface here: `QueueFull` and `QueueClosed`.
    pub async fn register_app(&self, descriptor: AppDescriptor) -> Result<()> {
        let host = self.clone();
        let ticket = self
            .inner
            .queue
            .enqueue(async move { host.run_registration(descriptor).await })?;
        ticket.outcome().await
    }

    /// The registration pipeline. Runs inside a queued job, so at most one
    /// instance of this function is in flight at any time; mutations of the
    /// counter, the identifier set, and the record sequence stay atomic
    /// between suspension points.
    async fn run_registration(&self, descriptor: AppDescriptor) -> Result<()> {
        let app = descriptor.app().clone();

        // Dedup: the same descriptor, or a handle that already has an active
        // record, never yields a second record.
        let duplicate = {
            let state = self.state_read();
            state.record_for_descriptor(descriptor.id()).is_some()
                || state.record_for_handle(app.id()).is_some()
        };
        if duplicate {
            debug!(app = %app.describe(), "application already registered, skipping");
            return Ok(());
        }

        // Backend resolution. A missing adapter is an intentional unreported
        // no-op; downstream behavior depends on the absence of a visible
        // failure here.
        let Some(backend) = self.inner.backends.resolve_for_version(descriptor.version()) else {
            debug!(
                app = %app.describe(),
                version = descriptor.version(),
                "no backend adapter for version, skipping registration"
            );
            return Ok(());
        };

        // Root discovery. Without a root instance there is nothing to track.
        let root = match backend.root_instance(&app).await {
            Ok(Some(root)) => root,
            Ok(None) => {
                warn!(app = %app.describe(), "application has no root instance, skipping registration");
                return Ok(());
            }
            Err(err) => {
                warn!(app = %app.describe(), error = %err, "root discovery failed, skipping registration");
                return Ok(());
            }
        };

        // Counter advance. The value seeds naming and the fallback
        // identifier; abandoned registrations above never consumed one.
        let seed = self.state_write().next_counter();

        let name = match backend.record_name(&app, seed).await {
            Ok(name) => name,
            Err(err) => {
                warn!(app = %app.describe(), error = %err, "backend returned no record name, skipping registration");
                return Ok(());
            }
        };

        let slug = slugify(&name);
        let default_id = if slug.is_empty() {
            None
        } else {
            Some(slug.as_str())
        };
        let id = self.state_write().ident_for(app.id(), default_id, seed);

        // Iframe detection: compare the first root element's owning document
        // against the host document.
        let iframe_origin = match backend.root_elements(&root).await {
            Ok(elements) => elements.first().and_then(|element| {
                let document = element.owner_document();
                if document.same_document(&self.inner.host_document) {
                    None
                } else {
                    Some(document.path().to_string())
                }
            }),
            Err(err) => {
                warn!(app = %app.describe(), error = %err, "failed to resolve root elements, assuming host document");
                None
            }
        };

        let record = Arc::new(AppRecord::new(
            id,
            name,
            descriptor.clone(),
            backend.clone(),
            root,
            iframe_origin,
        ));

        // Back-reference the record from the handle's side-table entry so
        // lookups by handle resolve from here on.
        self.state_write()
            .set_handle_record(app.id(), record.clone());

        self.inner.timeline.add_builtin_layers(&record).await;

        // Publish.
        self.state_write().insert_record(record.clone());

        // Adapter setup hook: synchronous, fire-and-forget.
        backend.setup_app(&record);

        // Finalize with the backend.
        if let Err(err) = backend.register_application(&app).await {
            warn!(app = %record.id(), error = %err, "backend application-registration capability failed");
        }

        self.inner.channel.send(AppEvent::Added {
            app_record: record.to_minimal(),
        });
        info!(app = %record.id(), name = %record.name(), "application registered");

        // Resolve the waiters parked before this job finished, in
        // registration order.
        self.inner.waiters.resolve(app.id(), &record);

        // Auto-select the first record that is not hidden from the inspector.
        if self.state_read().selected().is_none() {
            let hidden = match backend.devtools_options(record.root_instance()).await {
                Ok(options) => options.hide,
                Err(_) => false,
            };
            if !hidden {
                self.select(&record);
            }
        }

        Ok(())
    }

    /// Feed every application a scanner finds through the normal registration
    /// path with a synthesized descriptor. Returns how many applications the
    /// scanner produced.
    pub async fn scan_legacy_apps(&self, scanner: &dyn AppScanner) -> Result<usize> {
        let discovered = scanner.scan();
        let count = discovered.len();
        debug!(count, "legacy scan produced applications");

        for found in discovered {
            let descriptor = AppDescriptor::new(found.app, found.version);
            self.register_app(descriptor).await?;
        }

        Ok(count)
    }

    // ========================================
    // Waiting
    // ========================================

    /// Wait until a record exists for `app`.
    ///
    /// Resolves immediately when the record already exists; otherwise parks a
    /// continuation that the registration pipeline resolves on completion.
    ///
    /// # Errors
    /// `WaitTimeout` when no registration completes within the host's wait
    /// timeout (2000 ms by default).
    pub async fn wait_for_record(&self, app: &AppHandle) -> Result<Arc<AppRecord>> {
        // Park the continuation before checking, so a registration finishing
        // between the check and the park cannot be missed.
        let (token, rx) = self.inner.waiters.register(app.id());

        if let Some(record) = self.state_read().record_for_handle(app.id()) {
            token.cancel();
            self.inner.waiters.prune(app.id());
            return Ok(record);
        }

        match tokio::time::timeout(self.inner.wait_timeout, rx).await {
            Ok(Ok(record)) => Ok(record),
            // The registry dropped the continuation without resolving it;
            // treat it like an expired wait.
            Ok(Err(_)) => Err(SpyglassError::WaitTimeout {
                app: app.describe(),
            }),
            Err(_elapsed) => {
                token.cancel();
                self.inner.waiters.prune(app.id());
                Err(SpyglassError::WaitTimeout {
                    app: app.describe(),
                })
            }
        }
    }

    /// Wait until every registration queued before this call has finished,
    /// including ones that silently abandoned. Registrations queued later are
    /// not covered.
    pub async fn flush_registrations(&self) -> Result<()> {
        let ticket = self.inner.queue.enqueue(async { Ok(()) })?;
        ticket.outcome().await
    }

    // ========================================
    // Selection & removal
    // ========================================

    /// Make `record` the selected record, mirror its last-inspected component
    /// id, and report the change.
    pub fn select(&self, record: &Arc<AppRecord>) {
        let last_inspected = record.last_inspected_component_id();
        self.state_write().select(record);

        self.inner.channel.send(AppEvent::Selected {
            id: record.id().to_string(),
            last_inspected_component_id: last_inspected,
        });
        debug!(app = %record.id(), "application selected");
    }

    /// Emit a full `APP_LIST` snapshot of the records whose backends do not
    /// hide them from the inspector.
    pub async fn send_app_list(&self) {
        let records = self.state_read().records();

        let mut apps = Vec::with_capacity(records.len());
        for record in records {
            let hidden = match record
                .backend()
                .devtools_options(record.root_instance())
                .await
            {
                Ok(options) => options.hide,
                Err(_) => false,
            };
            if !hidden {
                apps.push(record.to_minimal());
            }
        }

        self.inner.channel.send(AppEvent::List { apps });
    }

    /// Remove `app`'s record: free its identifier, drop it from the registry,
    /// clean up its timeline layers, and report the removal.
    ///
    /// Waits (bounded by the wait timeout) for an in-flight registration of
    /// the same application, so a removal racing a registration acts on the
    /// finished record instead of silently missing it. Failures are absorbed:
    /// at most they produce a debug-level log entry.
    pub async fn remove_app(&self, app: &AppHandle) {
        match self.wait_for_record(app).await {
            Ok(record) => {
                if self.state_write().remove_by_handle(app.id()).is_none() {
                    debug!(app = %app.describe(), "record already removed");
                    return;
                }

                self.inner.timeline.remove_layers_for_app(app).await;
                self.inner.channel.send(AppEvent::Removed {
                    id: record.id().to_string(),
                });
                info!(app = %record.id(), "application removed");
            }
            Err(err) => {
                debug!(app = %app.describe(), error = %err, "removal found no record");
            }
        }
    }

    // ========================================
    // Accessors
    // ========================================

    /// Snapshot of the active records, in registration order.
    pub fn records(&self) -> Vec<Arc<AppRecord>> {
        self.state_read().records()
    }

    /// The selected record, if any.
    pub fn selected(&self) -> Option<Arc<AppRecord>> {
        self.state_read().selected()
    }

    /// Mirror of the selected record's last-inspected component id.
    pub fn current_inspected_component_id(&self) -> Option<String> {
        self.state_read().current_inspected_component_id()
    }

    /// The document this host runs in.
    pub fn host_document(&self) -> &DocumentRef {
        &self.inner.host_document
    }

    fn state_read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.inner.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn state_write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.inner.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for InspectionHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InspectionHost")
            .field("records", &self.state_read().records().len())
            .field("backends", &self.inner.backends)
            .finish()
    }
}
