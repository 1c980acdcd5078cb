//! Device and system-health subcommands.

use std::sync::Arc;

use anyhow::Result;
use hearth_core::device::{Device, DeviceKind, SystemHealth};
use hearth_devices::{DeviceWatcher, HealthWatcher};
use tokio_util::sync::CancellationToken;

use crate::App;
use crate::notify::StderrNotifier;

fn kind_label(kind: DeviceKind) -> &'static str {
    match kind {
        DeviceKind::Light => "light",
        DeviceKind::Switch => "switch",
        DeviceKind::Climate => "climate",
        DeviceKind::Cover => "cover",
        DeviceKind::MediaPlayer => "media_player",
        DeviceKind::Sensor => "sensor",
        DeviceKind::Scene => "scene",
        DeviceKind::Script => "script",
        DeviceKind::Other => "other",
    }
}

fn print_device(device: &Device) {
    let online = if device.is_online() { "" } else { "  [offline]" };
    let area = device.area.as_deref().unwrap_or("-");
    println!(
        "{:<28} {:<20} {:<12} {:<14} {}{online}",
        device.id.as_str(),
        device.name,
        kind_label(device.kind),
        area,
        device.state,
    );
}

fn print_health(health: &SystemHealth) {
    let flag = |ok: bool| if ok { "ok" } else { "DOWN" };
    let latency = |ms: Option<u64>| ms.map_or_else(|| "-".to_string(), |ms| format!("{ms}ms"));
    println!(
        "uptime {}s  ha {} ({})  db {} ({})",
        health.uptime_s,
        flag(health.ha_ok),
        latency(health.ha_latency_ms),
        flag(health.db_ok),
        latency(health.db_latency_ms),
    );
}

/// Wait for Ctrl-C, then cancel the watcher.
async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        cancel.cancel();
    }
}

pub async fn devices(app: &App, watch: bool) -> Result<()> {
    let snapshot = app.api.list_devices().await?;
    for device in &snapshot.items {
        print_device(device);
    }
    if !watch {
        return Ok(());
    }

    let watcher = Arc::new(DeviceWatcher::new(
        reqwest::Client::new(),
        app.api.base_url(),
        app.settings.devices.reconnect.clone(),
        Arc::new(StderrNotifier),
    ));
    let cancel = CancellationToken::new();
    let _ = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));
    eprintln!("watching devices (Ctrl-C to stop)");
    watcher.run(cancel).await;
    Ok(())
}

pub async fn health(app: &App, watch: bool) -> Result<()> {
    let current = app.api.system_health().await?;
    print_health(&current);
    if !watch {
        return Ok(());
    }

    let watcher = Arc::new(HealthWatcher::new(
        reqwest::Client::new(),
        app.api.base_url(),
        app.settings.devices.reconnect.clone(),
        Arc::new(StderrNotifier),
    ));
    let cancel = CancellationToken::new();
    let _ = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));
    eprintln!("watching system health (Ctrl-C to stop)");
    watcher.run(cancel).await;
    Ok(())
}
