//! socsim demo runner.
//!
//! Seeds a store with demo integrations, team members, and baseline
//! metrics, starts the simulation engine, and prints delivered
//! notifications until Ctrl-C or the requested duration elapses.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use socsim_core::config::{ProducerConfig, SimulationConfig, VariationIntensity};
use socsim_core::model::{
    DashboardMetrics, Integration, Notification, NotificationKind, PresenceStatus, Severity,
    TeamMember,
};
use socsim_core::store::{StateStore, StoreUpdate};
use socsim_engine::{register_dispatch_metrics, SimulationEngine};
use socsim_observability::{init_logging_with_config, LoggingConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "socsim")]
#[command(version)]
#[command(about = "Live SOC-environment simulation demo", long_about = None)]
struct Cli {
    /// Stop after this many seconds (runs until Ctrl-C when omitted)
    #[arg(short, long)]
    duration: Option<u64>,

    /// Alert producer interval in seconds
    #[arg(long, default_value = "8")]
    alert_interval: u64,

    /// Integration health-check interval in seconds
    #[arg(long, default_value = "12")]
    health_interval: u64,

    /// Minimum alert severity that produces a notification (low, medium, high, critical)
    #[arg(long, default_value = "medium", value_parser = parse_severity)]
    severity_threshold: Severity,

    /// Metrics drift aggressiveness (low, medium, high)
    #[arg(long, default_value = "medium", value_parser = parse_intensity)]
    intensity: VariationIntensity,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_severity(s: &str) -> Result<Severity, String> {
    match s.to_lowercase().as_str() {
        "low" => Ok(Severity::Low),
        "medium" => Ok(Severity::Medium),
        "high" => Ok(Severity::High),
        "critical" => Ok(Severity::Critical),
        other => Err(format!("invalid severity: {other}")),
    }
}

fn parse_intensity(s: &str) -> Result<VariationIntensity, String> {
    match s.to_lowercase().as_str() {
        "low" => Ok(VariationIntensity::Low),
        "medium" => Ok(VariationIntensity::Medium),
        "high" => Ok(VariationIntensity::High),
        other => Err(format!("invalid intensity: {other}")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging = if cli.verbose {
        LoggingConfig::development()
    } else if cli.json_logs {
        LoggingConfig::json()
    } else {
        LoggingConfig::default()
    };
    init_logging_with_config(logging);
    register_dispatch_metrics();

    let mut config = SimulationConfig::default();
    config.alerts = ProducerConfig::every(Duration::from_secs(cli.alert_interval));
    config.health = ProducerConfig::every(Duration::from_secs(cli.health_interval));
    config.alert_severity_threshold = cli.severity_threshold;
    config.variation_intensity = cli.intensity;

    let store = Arc::new(StateStore::new());
    seed_store(&store).await;

    let mut engine = SimulationEngine::new(Arc::clone(&store), config)?;
    let mut notifications = engine.dispatcher().subscribe();
    engine.start().await;
    info!("simulation running; press Ctrl-C to stop");

    let deadline = cli.duration.map(Duration::from_secs);
    let run = async {
        loop {
            match notifications.recv().await {
                Ok(notification) => print_notification(&notification),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    eprintln!("{}", format!("(skipped {skipped} notifications)").dimmed());
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    match deadline {
        Some(after) => {
            tokio::select! {
                _ = run => {}
                _ = tokio::time::sleep(after) => {}
                _ = tokio::signal::ctrl_c() => {}
            }
        }
        None => {
            tokio::select! {
                _ = run => {}
                _ = tokio::signal::ctrl_c() => {}
            }
        }
    }

    engine.stop().await;

    let snapshot = store.snapshot().await;
    let stats = engine.dispatcher().stats();
    println!();
    println!("{}", "session summary".bold());
    println!("  alerts in store:      {}", snapshot.alerts.len());
    println!("  delivered:            {}", stats.delivered);
    println!("  suppressed:           {}", stats.suppressed);
    println!("  rate limited:         {}", stats.rate_limited);
    println!("  mttr:                 {}", snapshot.metrics.mttr_display());

    Ok(())
}

async fn seed_store(store: &StateStore) {
    store
        .apply(StoreUpdate::SetIntegrations {
            integrations: vec![
                Integration::connected("Splunk SIEM"),
                Integration::connected("CrowdStrike EDR"),
                Integration::connected("Okta IdP"),
                Integration::connected("M365 Email Security"),
            ],
        })
        .await;

    store
        .apply(StoreUpdate::SetTeam {
            members: vec![
                TeamMember {
                    name: "Riley Chen".into(),
                    role: "Threat Hunter".into(),
                    status: PresenceStatus::Online,
                    active_alerts: 2,
                },
                TeamMember {
                    name: "Sam Okafor".into(),
                    role: "SOC Lead".into(),
                    status: PresenceStatus::Online,
                    active_alerts: 4,
                },
                TeamMember {
                    name: "Dana Ito".into(),
                    role: "Incident Responder".into(),
                    status: PresenceStatus::Away,
                    active_alerts: 1,
                },
            ],
        })
        .await;

    store
        .apply(StoreUpdate::SetMetrics {
            metrics: DashboardMetrics::default(),
        })
        .await;
}

fn print_notification(notification: &Notification) {
    let tag = match notification.kind {
        NotificationKind::Alert => " ALERT ".on_red().white().bold(),
        NotificationKind::Error => " ERROR ".red().bold(),
        NotificationKind::Warning => " WARN  ".yellow().bold(),
        NotificationKind::Success => " OK    ".green().bold(),
        NotificationKind::Info => " INFO  ".cyan(),
    };
    let time = notification.timestamp.format("%H:%M:%S");
    println!(
        "{} {} {} {}",
        time.to_string().dimmed(),
        tag,
        notification.title.bold(),
        notification.message
    );
    for action in &notification.actions {
        println!("           {} {}", "->".dimmed(), action.label.underline());
    }
}
