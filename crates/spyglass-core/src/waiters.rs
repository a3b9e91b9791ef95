//! Waiter registry: pending "a record for application X exists" continuations.
//!
//! Callers that need a record before it is published (removal racing an
//! in-flight registration, external lookups) park a continuation here, keyed
//! by handle identity. The registration pipeline resolves all of a handle's
//! continuations in registration order once the record is finished. Each
//! continuation carries a cancellation token set by its timeout; a stale
//! resolution attempt consults the token and is silently skipped.

use crate::app::HandleId;
use crate::cancel::CancellationToken;
use crate::record::AppRecord;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

struct Waiter {
    token: CancellationToken,
    tx: oneshot::Sender<Arc<AppRecord>>,
}

/// Ordered lists of pending continuations, keyed by handle identity.
#[derive(Default)]
pub(crate) struct WaiterRegistry {
    pending: Mutex<HashMap<HandleId, Vec<Waiter>>>,
}

impl WaiterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a continuation for a handle. Returns the expiry token (for the
    /// caller's timeout to set) and the receiving end of the continuation.
    pub fn register(
        &self,
        handle: HandleId,
    ) -> (CancellationToken, oneshot::Receiver<Arc<AppRecord>>) {
        let (tx, rx) = oneshot::channel();
        let token = CancellationToken::new();

        self.lock().entry(handle).or_default().push(Waiter {
            token: token.clone(),
            tx,
        });

        (token, rx)
    }

    /// Deliver a finished record to every still-pending continuation for a
    /// handle, in registration order. Expired continuations are skipped.
    pub fn resolve(&self, handle: HandleId, record: &Arc<AppRecord>) {
        let waiters = self.lock().remove(&handle).unwrap_or_default();

        for waiter in waiters {
            if waiter.token.is_cancelled() {
                continue;
            }
            // The receiver may have gone away; nothing to deliver then.
            let _ = waiter.tx.send(record.clone());
        }
    }

    /// Drop expired continuations for a handle, releasing their slots. The
    /// entry itself is removed once no live continuation remains.
    pub fn prune(&self, handle: HandleId) {
        let mut pending = self.lock();
        if let Some(waiters) = pending.get_mut(&handle) {
            waiters.retain(|w| !w.token.is_cancelled());
            if waiters.is_empty() {
                pending.remove(&handle);
            }
        }
    }

    /// Number of live continuations for a handle.
    #[cfg(test)]
    pub fn pending_for(&self, handle: HandleId) -> usize {
        self.lock().get(&handle).map_or(0, Vec::len)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<HandleId, Vec<Waiter>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
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

    fn test_record(app: &AppHandle) -> Arc<AppRecord> {
        Arc::new(AppRecord::new(
            "shop".to_string(),
            "Shop".to_string(),
            AppDescriptor::new(app.clone(), "3.0.0"),
            Arc::new(StubBackend),
            InstanceRef::new(),
            None,
        ))
    }

    #[tokio::test]
    async fn test_resolve_delivers_in_registration_order() {
        let registry = WaiterRegistry::new();
        let app = AppHandle::new();

        let (_t1, rx1) = registry.register(app.id());
        let (_t2, rx2) = registry.register(app.id());

        let record = test_record(&app);
        registry.resolve(app.id(), &record);

        assert_eq!(rx1.await.unwrap().id(), "shop");
        assert_eq!(rx2.await.unwrap().id(), "shop");
    }

    #[tokio::test]
    async fn test_expired_waiter_is_skipped() {
        let registry = WaiterRegistry::new();
        let app = AppHandle::new();

        let (expired_token, expired_rx) = registry.register(app.id());
        let (_live_token, live_rx) = registry.register(app.id());

        expired_token.cancel();
        registry.resolve(app.id(), &test_record(&app));

        // The expired continuation never receives a record.
        assert!(expired_rx.await.is_err());
        assert!(live_rx.await.is_ok());
    }

    #[tokio::test]
    async fn test_resolve_unknown_handle_is_noop() {
        let registry = WaiterRegistry::new();
        let app = AppHandle::new();
        registry.resolve(app.id(), &test_record(&app));
    }

    #[tokio::test]
    async fn test_prune_drops_only_expired() {
        let registry = WaiterRegistry::new();
        let app = AppHandle::new();

        let (expired_token, _expired_rx) = registry.register(app.id());
        let (_live_token, _live_rx) = registry.register(app.id());
        expired_token.cancel();

        registry.prune(app.id());
        assert_eq!(registry.pending_for(app.id()), 1);
    }

    #[tokio::test]
    async fn test_prune_removes_empty_entries() {
        let registry = WaiterRegistry::new();
        let app = AppHandle::new();

        let (token, _rx) = registry.register(app.id());
        token.cancel();

        registry.prune(app.id());
        assert_eq!(registry.pending_for(app.id()), 0);
    }
}
