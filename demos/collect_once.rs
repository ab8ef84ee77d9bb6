//! Snapshot collection example
//!
//! Collects one round of metric snapshots for the first connected
//! device and appends them to its on-disk history.

use devitals::{DevitalsError, resolve_device, toolchain};

#[tokio::main]
async fn main() -> Result<(), DevitalsError> {
    println!("=== devitals Snapshot Collection Example ===\n");

    if let Err(e) = toolchain::check_toolchain().await {
        eprintln!("❌ Toolchain check failed: {e}");
        return Ok(());
    }

    let device = resolve_device(None).await?;
    println!("Device: {} ({}, iOS {})", device.name, device.model, device.version);

    let collected = devitals::collect_device_snapshots(&device.udid).await?;

    for (family, snapshot) in &collected {
        println!("\n📦 {family} snapshot @ {}", snapshot.timestamp);
        for (field, value) in &snapshot.fields {
            match value {
                Some(v) => println!("  {field}: {v}"),
                None => println!("  {field}: N/A"),
            }
        }
    }

    println!("\n💡 Run this on a schedule (cron, launchd) to build up history");
    println!("   for trend analysis: `devitals --collect`.");

    Ok(())
}
