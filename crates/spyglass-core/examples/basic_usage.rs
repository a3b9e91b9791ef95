//! Basic usage example - register two applications and inspect the registry.

use async_trait::async_trait;
use spyglass_core::{
    AppBackend, AppDescriptor, AppHandle, BackendDescriptor, BufferedChannel, DevtoolsOptions,
    ElementRef, EventChannel, InspectionHost, InstanceRef, Result,
};
use std::sync::Arc;

/// Minimal in-process backend for the demo: every application has a root
/// instance and takes its name from the handle label.
struct DemoBackend;

#[async_trait]
impl AppBackend for DemoBackend {
    async fn root_instance(&self, _app: &AppHandle) -> Result<Option<InstanceRef>> {
        Ok(Some(InstanceRef::new()))
    }

    async fn record_name(&self, app: &AppHandle, fallback_seed: u64) -> Result<String> {
        Ok(app
            .label()
            .map(String::from)
            .unwrap_or_else(|| format!("App {}", fallback_seed)))
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

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let channel = Arc::new(BufferedChannel::new());
    let host = InspectionHost::builder()
        .backend(BackendDescriptor::new(3, || Arc::new(DemoBackend)))
        .channel(channel.clone() as Arc<dyn EventChannel>)
        .build();

    // Two mounted applications, one of them twice (deduplicated).
    let storefront = AppDescriptor::new(AppHandle::with_label("Storefront"), "3.2.0");
    let admin = AppDescriptor::new(AppHandle::with_label("Admin Panel"), "3.4.1");
    host.register_app(storefront.clone()).await?;
    host.register_app(admin).await?;
    host.register_app(storefront).await?;

    println!("Registered applications:");
    for record in host.records() {
        println!(
            "  - {} ({}, version {})",
            record.id(),
            record.name(),
            record.version()
        );
    }

    if let Some(selected) = host.selected() {
        println!("Selected: {}", selected.id());
    }

    println!("Events observed:");
    for (name, payload) in channel.events() {
        println!("  {} {}", name, payload);
    }

    Ok(())
}
