//! Timeline collaborator boundary.
//!
//! The timeline subsystem lives outside this crate; the host only calls it at
//! two points of a record's life: right before publication (to attach the
//! built-in layers) and during removal (to drop the application's layers).

use crate::app::AppHandle;
use crate::record::AppRecord;
use async_trait::async_trait;
use std::sync::Arc;

/// Hooks the host invokes on the timeline subsystem.
#[async_trait]
pub trait TimelineHooks: Send + Sync {
    /// Attach the built-in timeline layers for a newly created record.
    async fn add_builtin_layers(&self, record: &Arc<AppRecord>);

    /// Drop every timeline layer owned by the application being removed.
    async fn remove_layers_for_app(&self, app: &AppHandle);
}

/// Hooks that do nothing. Used when no timeline subsystem is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTimeline;

#[async_trait]
impl TimelineHooks for NoopTimeline {
    async fn add_builtin_layers(&self, _record: &Arc<AppRecord>) {}

    async fn remove_layers_for_app(&self, _app: &AppHandle) {}
}
