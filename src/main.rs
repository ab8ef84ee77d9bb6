//! devitals - iOS Device Diagnostics & Trend Analytics
//!
//! Command-line surface over the devitals library. Logs go to stderr;
//! stdout carries only the requested output.

use clap::{Arg, ArgMatches, Command};
use devitals::{
    AdviceClient, DeviceAnalytics, DeviceInfo, DevitalsError, HistoryStore, diag, report,
    toolchain,
};
use std::path::PathBuf;
use std::process;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("DEVITALS_LOG")
                .unwrap_or_else(|_| "warn".to_string())
                .parse()
                .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let matches = build_cli().get_matches();

    if let Err(e) = run(matches).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Build command line interface
fn build_cli() -> Command {
    Command::new("devitals")
        .version(VERSION)
        .about("iOS device diagnostics and trend analytics")
        .long_about(
            "devitals inspects a connected iOS device through the \
             libimobiledevice tools, runs diagnostic routines, records \
             metric snapshots, and reports battery/storage/thermal \
             trends computed from its recorded history.",
        )
        .arg(
            Arg::new("device")
                .short('d')
                .long("device")
                .value_name("UDID")
                .help("Target device UDID (prefix match; defaults to the first device)"),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .help("List connected devices and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("module")
                .short('m')
                .long("module")
                .value_name("NAME")
                .help("Run one diagnostic module")
                .value_parser([
                    "battery",
                    "storage",
                    "network",
                    "security",
                    "performance",
                    "thermal",
                    "backup",
                    "accessibility",
                    "apps",
                    "crashes",
                ]),
        )
        .arg(
            Arg::new("report")
                .short('r')
                .long("report")
                .help("Run all diagnostics and write a markdown report")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("collect")
                .short('c')
                .long("collect")
                .help("Collect metric snapshots into the device history")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("trends")
                .short('t')
                .long("trends")
                .help("Analyze metric trends from recorded history")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("days")
                .long("days")
                .value_name("N")
                .help("Trailing window for trend analysis, in days")
                .value_parser(clap::value_parser!(i64))
                .default_value("30"),
        )
        .arg(
            Arg::new("ask")
                .long("ask")
                .value_name("PROBLEM")
                .help("Ask the advice service about a device problem"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .value_parser(["text", "json", "yaml"])
                .default_value("text"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("PATH")
                .help("History directory (default: ~/.devitals/analytics)"),
        )
        .arg(
            Arg::new("check-toolchain")
                .long("check-toolchain")
                .help("Check that the libimobiledevice tools are installed and exit")
                .action(clap::ArgAction::SetTrue),
        )
}

/// Run main logic
async fn run(matches: ArgMatches) -> Result<(), DevitalsError> {
    if matches.get_flag("check-toolchain") {
        return check_toolchain_command().await;
    }

    if matches.get_flag("list") {
        return list_devices_command(&matches).await;
    }

    let device = devitals::resolve_device(matches.get_one::<String>("device").map(String::as_str))
        .await?;
    tracing::debug!(udid = %device.udid, name = %device.name, "selected device");

    let analytics = open_analytics(&matches, &device)?;
    let mut acted = false;

    if matches.get_flag("collect") {
        acted = true;
        let collected = analytics.collect_snapshots().await?;
        println!("Collected {} snapshots for {}", collected.len(), device.name);
    }

    if let Some(module) = matches.get_one::<String>("module") {
        acted = true;
        let kind: diag::DiagnosticKind = module.parse()?;
        let result = diag::run(kind, &device).await?;
        output_diagnostics(&matches, std::slice::from_ref(&result))?;
    }

    if matches.get_flag("trends") {
        acted = true;
        let days = *matches.get_one::<i64>("days").unwrap_or(&30);
        let trends = analytics.analyze_trends(days)?;
        output_trends(&matches, &trends)?;
    }

    if matches.get_flag("report") {
        acted = true;
        write_report_command(&device, &analytics, &matches).await?;
    }

    if let Some(problem) = matches.get_one::<String>("ask") {
        acted = true;
        ask_command(problem, &device).await?;
    }

    // With no action flags, run every diagnostic as an overview
    if !acted {
        let reports = diag::run_all(&device).await?;
        output_diagnostics(&matches, &reports)?;
    }

    Ok(())
}

fn open_analytics(matches: &ArgMatches, device: &DeviceInfo) -> Result<DeviceAnalytics, DevitalsError> {
    match matches.get_one::<String>("data-dir") {
        Some(dir) => Ok(DeviceAnalytics::new(
            device.udid.clone(),
            HistoryStore::new(PathBuf::from(dir)),
        )),
        None => DeviceAnalytics::open(device.udid.clone()),
    }
}

/// Check toolchain availability command
async fn check_toolchain_command() -> Result<(), DevitalsError> {
    match toolchain::check_toolchain().await {
        Ok(()) => {
            println!("Toolchain check: OK");
            println!("libimobiledevice tools are available.");
            Ok(())
        }
        Err(e) => {
            eprintln!("Toolchain check: FAILED");
            Err(e)
        }
    }
}

/// List connected devices command
async fn list_devices_command(matches: &ArgMatches) -> Result<(), DevitalsError> {
    let devices = devitals::list_devices().await?;
    let format = matches.get_one::<String>("format").unwrap();

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&devices).unwrap()),
        "yaml" => println!("{}", serde_yaml::to_string(&devices).unwrap()),
        _ => {
            if devices.is_empty() {
                println!("No devices connected.");
                return Ok(());
            }
            println!("Connected devices:");
            for device in devices {
                println!(
                    "  {}  {} ({}, iOS {})",
                    device.udid, device.name, device.model, device.version
                );
            }
        }
    }

    Ok(())
}

/// Output diagnostic reports in the requested format
fn output_diagnostics(
    matches: &ArgMatches,
    reports: &[diag::DiagnosticReport],
) -> Result<(), DevitalsError> {
    let format = matches.get_one::<String>("format").unwrap();

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(reports).unwrap()),
        "yaml" => println!("{}", serde_yaml::to_string(reports).unwrap()),
        _ => {
            for result in reports {
                print!("{}", report::render_diagnostic_text(result));
            }
        }
    }

    Ok(())
}

/// Output trend results in the requested format
fn output_trends(
    matches: &ArgMatches,
    trends: &std::collections::BTreeMap<String, devitals::TrendResult>,
) -> Result<(), DevitalsError> {
    let format = matches.get_one::<String>("format").unwrap();

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(trends).unwrap()),
        "yaml" => println!("{}", serde_yaml::to_string(trends).unwrap()),
        _ => print!("{}", report::render_trends_text(trends)),
    }

    Ok(())
}

/// Run all diagnostics and write a markdown report file
async fn write_report_command(
    device: &DeviceInfo,
    analytics: &DeviceAnalytics,
    matches: &ArgMatches,
) -> Result<(), DevitalsError> {
    let diagnostics = diag::run_all(device).await?;
    let days = *matches.get_one::<i64>("days").unwrap_or(&30);
    let trends = analytics.analyze_trends(days)?;

    let now = chrono::Utc::now();
    let markdown = report::render_markdown_report(device, &diagnostics, &trends, now);

    let file_name = format!(
        "devitals_report_{}_{}.md",
        device.name.replace(' ', "_"),
        now.format("%Y%m%d_%H%M%S")
    );
    std::fs::write(&file_name, markdown)?;
    println!("Report saved to: {file_name}");

    Ok(())
}

/// Ask the advice service about a problem
async fn ask_command(problem: &str, device: &DeviceInfo) -> Result<(), DevitalsError> {
    let client = AdviceClient::from_env()?;
    let suggestion = client.suggest_solution(problem, device).await?;
    println!("{suggestion}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_defaults() {
        let app = build_cli();

        let matches = app.try_get_matches_from(vec!["devitals"]).unwrap();
        assert_eq!(matches.get_one::<String>("format").unwrap(), "text");
        assert_eq!(*matches.get_one::<i64>("days").unwrap(), 30);
        assert!(!matches.get_flag("trends"));
        assert!(!matches.get_flag("collect"));
        assert!(!matches.get_flag("report"));
    }

    #[test]
    fn test_cli_with_args() {
        let app = build_cli();

        let matches = app
            .try_get_matches_from(vec![
                "devitals",
                "--device",
                "00008030",
                "--trends",
                "--days",
                "7",
                "--format",
                "json",
            ])
            .unwrap();

        assert_eq!(matches.get_one::<String>("device").unwrap(), "00008030");
        assert!(matches.get_flag("trends"));
        assert_eq!(*matches.get_one::<i64>("days").unwrap(), 7);
        assert_eq!(matches.get_one::<String>("format").unwrap(), "json");
    }

    #[test]
    fn test_cli_rejects_unknown_module() {
        let app = build_cli();
        let result = app.try_get_matches_from(vec!["devitals", "--module", "telemetry"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        let app = build_cli();
        let result = app.try_get_matches_from(vec!["devitals", "--format", "xml"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_module_names_cover_all_diagnostics() {
        // The value_parser list must stay in sync with DiagnosticKind
        let app = build_cli();
        for kind in diag::DiagnosticKind::ALL {
            let matches = app
                .clone()
                .try_get_matches_from(vec!["devitals", "--module", kind.as_str()])
                .unwrap();
            assert_eq!(matches.get_one::<String>("module").unwrap(), kind.as_str());
        }
    }
}
