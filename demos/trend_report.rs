//! Trend analysis example
//!
//! Reads the recorded history of the first connected device and prints
//! a trend summary for each metric with enough data.

use devitals::{DevitalsError, Trend, resolve_device};

#[tokio::main]
async fn main() -> Result<(), DevitalsError> {
    println!("=== devitals Trend Analysis Example ===\n");

    let device = resolve_device(None).await?;
    println!("Device: {} ({})", device.name, device.udid);

    let trends = devitals::analyze_device_trends(&device.udid, 30)?;

    if trends.is_empty() {
        println!("\nNo metric has enough history yet.");
        println!("Collect snapshots for a few days (`devitals --collect`) and retry.");
        return Ok(());
    }

    println!("\n📊 Trends over the last 30 days:");
    for (key, result) in &trends {
        let marker = match result.trend {
            Trend::Improving => "📈",
            Trend::Stable => "➡️",
            Trend::Degrading => "📉",
        };

        println!(
            "\n{marker} {} ({key}): current {}",
            result.metric_name, result.current_value
        );
        match result.prediction {
            Some(prediction) => println!("   next expected: {prediction}"),
            None => println!("   next expected: N/A"),
        }
        println!("   confidence: {:.0}%", result.confidence * 100.0);

        for rec in &result.recommendations {
            println!("   • {rec}");
        }
    }

    Ok(())
}
