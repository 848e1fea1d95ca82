//! CLI commands
//!
//! 모든 명령은 같은 방식으로 런타임을 만듭니다: 설정 → `Runtime::new` → 기본 제공
//! 네임스페이스로 `bootstrap`.

use anyhow::Context;
use std::collections::BTreeMap;
use uniapp_core::builtin::{self, CalculatorService};
use uniapp_core::{service_call, HeadlessHost, Runtime, RuntimeConfig};
use uniapp_foundation::CompletionQueue;

fn bootstrap(config: RuntimeConfig) -> anyhow::Result<(Runtime, BTreeMap<String, bool>)> {
    let runtime = Runtime::new(config);
    let results = runtime
        .bootstrap([builtin::namespace()])
        .context("Failed to bootstrap plugins")?;
    Ok((runtime, results))
}

// ============================================================================
// plugins
// ============================================================================

pub fn plugins(mut config: RuntimeConfig, json: bool) -> anyhow::Result<()> {
    config.plugins.auto_activate = false;
    let (runtime, _) = bootstrap(config)?;
    let metadata = runtime.plugin_registry().list_all_plugin_metadata();

    if json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }

    if metadata.is_empty() {
        println!("No plugins discovered.");
        return Ok(());
    }

    println!("{:<16} {:<20} {:<8} {:<14} DEPENDS", "ID", "NAME", "VERSION", "STATE");
    for plugin in &metadata {
        let descriptor = &plugin.descriptor;
        println!(
            "{:<16} {:<20} {:<8} {:<14} {}",
            descriptor.id,
            descriptor.name,
            descriptor.version,
            plugin.state,
            descriptor.dependencies.join(", ")
        );
    }

    for report in runtime.plugin_registry().discovery_reports() {
        for collision in &report.collisions {
            println!(
                "! duplicate id {}: kept {}, ignored {}",
                collision.id, collision.kept, collision.ignored
            );
        }
        for failure in &report.failed_units {
            println!("! unit {} failed: {}", failure.unit, failure.error);
        }
    }
    Ok(())
}

// ============================================================================
// services
// ============================================================================

pub fn services(config: RuntimeConfig) -> anyhow::Result<()> {
    let (runtime, _) = bootstrap(config)?;
    let services = runtime.container().list_all_services();

    if services.is_empty() {
        println!("No services registered.");
    } else {
        println!("{:<16} {:<20} {:<11} MATERIALIZED", "NAME", "INTERFACE", "OVERRIDDEN");
        for (name, summary) in &services {
            println!(
                "{:<16} {:<20} {:<11} {}",
                name, summary.interface, summary.overridden, summary.materialized
            );
        }
    }

    runtime.shutdown();
    Ok(())
}

// ============================================================================
// run
// ============================================================================

pub async fn run(config: RuntimeConfig) -> anyhow::Result<()> {
    let (runtime, results) = bootstrap(config)?;
    for (id, activated) in &results {
        println!("{} {}", if *activated { "✓" } else { "✗" }, id);
    }
    for outcome in runtime.start() {
        if let Err(e) = outcome.into_result() {
            println!("! {}", e);
        }
    }

    let mut host = HeadlessHost::new();
    runtime.plugin_registry().attach_ui_plugins(&mut host);
    for page in host.pages() {
        println!("page: {} ({})", page.title, page.page_id);
    }

    match runtime
        .container()
        .resolve_by_interface::<dyn CalculatorService>()
    {
        Ok(calculator) => {
            println!("2 + 3 = {}", calculator.add(2.0, 3.0));
            match service_call("calculator", "divide", || calculator.divide(1.0, 0.0)) {
                Ok(value) => println!("1 / 0 = {}", value),
                Err(e) => println!("1 / 0 -> {}", e),
            }

            // 무거운 계산은 worker에서, 결과는 여기서 처리
            let worker = runtime.worker()?;
            let mut queue = CompletionQueue::new();
            let background = calculator.clone();
            worker
                .spawn_to_owner("multiply", move || Ok(background.multiply(6.0, 7.0)), queue.sender())
                .await?;
            for completion in queue.drain() {
                match completion.result {
                    Ok(value) => println!("{} (background) = {}", completion.name, value),
                    Err(e) => println!("{} (background) failed: {}", completion.name, e),
                }
            }
            println!("history: {} calculations", calculator.history().len());
        }
        Err(e) => println!("calculator unavailable: {}", e),
    }

    runtime.shutdown();
    println!("events published: {}", runtime.event_bus().event_count());
    Ok(())
}

// ============================================================================
// events
// ============================================================================

pub fn events(config: RuntimeConfig) -> anyhow::Result<()> {
    let (runtime, _) = bootstrap(config)?;
    for (kind, handlers) in runtime.event_bus().subscription_info() {
        println!("{}", kind);
        for handler in handlers {
            println!("  - {}", handler);
        }
    }
    runtime.shutdown();
    Ok(())
}
