//! cluman - container cluster aggregation
//!
//! This is the main CLI entry point for cluman.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cluman::access::{RoleVoter, ADMIN_ROLE, CLUSTER_READ_ROLE};
use cluman::config::{AppConfig, CONFIG_ENV};
use cluman::facade::{AggregationFacade, ClusterSnapshot, FleetReport};
use cluman::model::{ContainerService, DockerContainer};
use cluman::registry::ManagerRegistry;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// cluman - container cluster aggregation
#[derive(Parser)]
#[command(name = "cluman")]
#[command(author = "Evoker Industries")]
#[command(version)]
#[command(about = "Services and containers across a fleet of clusters", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Config file
    #[arg(short, long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Caller authority (repeatable)
    #[arg(long = "authority", global = true, env = "CLUMAN_AUTHORITY", value_delimiter = ',')]
    authorities: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured clusters
    Clusters,

    /// List services
    Services {
        /// Only this cluster
        #[arg(long)]
        cluster: Option<String>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// List containers
    Containers {
        /// Only this cluster
        #[arg(long)]
        cluster: Option<String>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Services and containers of one cluster
    Snapshot {
        /// Cluster ID
        #[arg(long)]
        cluster: String,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for results
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    RoleVoter::new().require(cli.authorities.as_slice(), &[CLUSTER_READ_ROLE, ADMIN_ROLE])?;

    let path = cli
        .config
        .or_else(AppConfig::default_path)
        .context("no config path given and no user config directory")?;
    let config = AppConfig::parse_file(&path)
        .with_context(|| format!("loading config {}", path.display()))?;

    let registry = Arc::new(ManagerRegistry::new(
        Arc::new(config.directory()),
        Arc::new(config.client_pool()?),
    ));
    let facade =
        AggregationFacade::with_options(registry.clone(), config.aggregation.fleet_options());

    match cli.command {
        Commands::Clusters => {
            println!("{:<24} {:<16} {}", "CLUSTER", "KIND", "SNAPSHOT");
            for (id, entry) in &config.clusters {
                let snapshot = entry
                    .snapshot
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<24} {:<16} {}", id, entry.kind, snapshot);
            }
        }

        Commands::Services { cluster, json } => {
            let report = match cluster {
                Some(id) => {
                    let mut report = FleetReport::default();
                    report.add_listing(&id, facade.list_services(&id).await?);
                    report
                }
                None => facade.fleet_services().await,
            };
            if json {
                print_json(&report)?;
            } else {
                print_services(&report);
                print_problems(&report);
            }
        }

        Commands::Containers { cluster, json } => {
            let report = match cluster {
                Some(id) => {
                    let mut report = FleetReport::default();
                    report.add_listing(&id, facade.list_containers(&id).await?);
                    report
                }
                None => facade.fleet_containers().await,
            };
            if json {
                print_json(&report)?;
            } else {
                print_containers(&report);
                print_problems(&report);
            }
        }

        Commands::Snapshot { cluster, json } => {
            let snapshot = facade.cluster_snapshot(&cluster).await?;
            if json {
                print_json(&snapshot)?;
            } else {
                print_snapshot(snapshot);
            }
        }
    }

    registry.shutdown();
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn short_id(id: &str) -> &str {
    id.char_indices().nth(12).map_or(id, |(end, _)| &id[..end])
}

fn replicas(current: Option<u64>, desired: Option<u64>) -> String {
    match (current, desired) {
        (Some(current), Some(desired)) => format!("{}/{}", current, desired),
        (None, Some(desired)) => format!("?/{}", desired),
        _ => "-".to_string(),
    }
}

fn print_services(report: &FleetReport<ContainerService>) {
    println!(
        "{:<16} {:<14} {:<20} {:<10} {}",
        "CLUSTER", "SERVICE ID", "NAME", "REPLICAS", "IMAGE"
    );
    for s in &report.items {
        println!(
            "{:<16} {:<14} {:<20} {:<10} {}",
            s.cluster_id,
            short_id(&s.item.id),
            s.item.name,
            replicas(s.item.current_replicas, s.item.desired_replicas),
            s.item.image
        );
    }
}

fn print_containers(report: &FleetReport<DockerContainer>) {
    println!(
        "{:<16} {:<14} {:<20} {:<10} {:<14} {}",
        "CLUSTER", "CONTAINER ID", "NAME", "STATUS", "SERVICE", "IMAGE"
    );
    for c in &report.items {
        println!(
            "{:<16} {:<14} {:<20} {:<10} {:<14} {}",
            c.cluster_id,
            short_id(&c.item.id),
            c.item.name.as_deref().unwrap_or("-"),
            c.item.status.to_string(),
            c.item.service_id.as_deref().map(short_id).unwrap_or("-"),
            c.item.image
        );
    }
}

fn print_problems<T>(report: &FleetReport<T>) {
    for d in &report.degraded {
        eprintln!("DEGRADED {}: {}", d.cluster_id, d.reason);
    }
    for f in &report.failed {
        eprintln!("FAILED   {}: {}", f.cluster_id, f.error);
    }
    for a in &report.anomalies {
        eprintln!("ANOMALY  {}: {}", a.cluster_id, a.item);
    }
}

fn print_snapshot(snapshot: ClusterSnapshot) {
    println!(
        "Cluster {} ({}) at {}",
        snapshot.cluster_id,
        snapshot.backend,
        snapshot.taken_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!();

    let cluster_id = snapshot.cluster_id;
    let mut services = FleetReport::default();
    services.add_listing(&cluster_id, snapshot.services);
    let mut containers = FleetReport::default();
    containers.add_listing(&cluster_id, snapshot.containers);

    print_services(&services);
    println!();
    print_containers(&containers);
    print_problems(&services);
    print_problems(&containers);
}
