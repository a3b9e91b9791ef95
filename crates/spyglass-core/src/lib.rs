//! Spyglass Core - headless application-record registry for a long-lived
//! introspection host.
//!
//! This crate tracks the lifecycle of "application records": handles
//! representing instrumented application instances attached to inspection
//! backends. Several independently mounted applications may register
//! concurrently; the host serializes record construction through a FIFO job
//! queue, resolves the backend adapter matching each application's framework
//! major version, assigns stable, human-readable, collision-free
//! identifiers, and reports additions, removals, and selection changes to an
//! external observer channel.
//!
//! Instrumentation itself (root discovery, component traversal), the
//! observer channel's transport, and the timeline subsystem live behind
//! boundary traits; this crate holds only the registry core.
//!
//! # Example
//!
//! ```rust,ignore
//! use spyglass_core::{AppDescriptor, AppHandle, BackendDescriptor, InspectionHost};
//!
//! #[tokio::main]
//! async fn main() -> spyglass_core::Result<()> {
//!     let host = InspectionHost::builder()
//!         .backend(BackendDescriptor::new(3, || my_major3_backend()))
//!         .build();
//!
//!     let app = AppHandle::with_label("storefront");
//!     host.register_app(AppDescriptor::new(app.clone(), "3.2.0")).await?;
//!
//!     let record = host.wait_for_record(&app).await?;
//!     println!("registered as {}", record.id());
//!
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod backend;
pub mod cancel;
pub mod config;
pub mod discovery;
pub mod error;
pub mod events;
pub mod host;
pub mod ident;
pub mod queue;
pub mod record;
pub mod timeline;

mod registry;
mod waiters;

// Re-export commonly used types
pub use app::{
    AppDescriptor, AppHandle, DescriptorId, DevtoolsOptions, DocumentRef, ElementRef, HandleId,
    InstanceRef,
};
pub use backend::{framework_major, AppBackend, BackendDescriptor, BackendRegistry};
pub use cancel::CancellationToken;
pub use config::HostConfig;
pub use discovery::{AppScanner, DiscoveredApp};
pub use error::{Result, SpyglassError};
pub use events::{AppEvent, BufferedChannel, EventChannel, MinimalAppRecord, NullChannel};
pub use host::{HostBuilder, InspectionHost};
pub use ident::slugify;
pub use queue::{JobQueue, JobTicket};
pub use record::AppRecord;
pub use timeline::{NoopTimeline, TimelineHooks};
