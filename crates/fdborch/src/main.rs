//! fdborch entry point.
//!
//! Starts the FDB cache on the simulated hardware backend, runs the
//! notification pipeline, and stops it cleanly on Ctrl-C.

use anyhow::Context;
use clap::Parser;
use sonic_fdborch::audit::{init_logging, LogFormat};
use sonic_fdborch::config::{FdbOrchConfig, HardwareBackend, DEFAULT_CONFIG_PATH};
use sonic_fdborch::fdb::{
    FdbDomain, FdbHwEvent, FdbKey, FdbNotification, FdbOrch, ModuleLocks, NotificationPipeline,
};
use sonic_fdborch::sim::{SimulatedFdbHardware, SimulatedL2Topology};
use sonic_sai::{BridgePortOid, PortOid};
use sonic_types::{MacAddress, VlanId};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

/// SONiC FDB orchestration daemon
#[derive(Parser, Debug)]
#[command(name = "fdborch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (YAML)
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Human-readable logs instead of JSON
    #[arg(long)]
    pretty_logs: bool,

    /// Seed a VLAN, two ports and a few learn events into the simulator
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let format = if args.pretty_logs {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    };
    init_logging(&args.log_level, format);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("fdborch: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = FdbOrchConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    info!(
        batch_size = config.notification_batch_size,
        shutdown_policy = ?config.shutdown_policy,
        "Starting fdborch"
    );

    let hardware = match config.hardware.backend {
        HardwareBackend::Simulated => Arc::new(SimulatedFdbHardware::from_config(&config.hardware)),
    };
    let topology = if args.demo {
        Arc::new(demo_topology()?)
    } else {
        Arc::new(SimulatedL2Topology::new())
    };
    let policy = config.shutdown_policy;

    let orch = FdbOrch::new(
        config,
        hardware.clone(),
        topology,
        Arc::new(ModuleLocks::new()),
    );
    orch.init().context("initializing FDB hardware")?;

    let pipeline = NotificationPipeline::spawn(orch.clone(), policy);

    if args.demo {
        seed_demo(&orch, &hardware)?;
    }

    info!("fdborch running, Ctrl-C to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
    }

    let report = pipeline.shutdown().await;
    let stats = orch.stats();
    info!(
        delivered = report.delivered,
        abandoned = report.abandoned,
        entries = orch.entry_count(),
        learns_accepted = stats.learns_accepted,
        learns_rejected = stats.learns_rejected,
        "fdborch shutdown complete"
    );
    Ok(())
}

const DEMO_VLAN: u16 = 100;

/// VLAN 100 with two member ports.
fn demo_topology() -> anyhow::Result<SimulatedL2Topology> {
    let vlan = VlanId::new(DEMO_VLAN)?;
    let bp1 = BridgePortOid::from_index(1);
    let bp2 = BridgePortOid::from_index(2);

    Ok(SimulatedL2Topology::new()
        .with_vlan(vlan)
        .with_port_bridge_port(bp1, PortOid::from_index(1))
        .with_port_bridge_port(bp2, PortOid::from_index(2))
        .with_vlan_member(vlan, bp1)
        .with_vlan_member(vlan, bp2))
}

/// Three MACs learned on the first port, then one of them moves.
fn seed_demo(orch: &Arc<FdbOrch>, hardware: &SimulatedFdbHardware) -> anyhow::Result<()> {
    let vlan = VlanId::new(DEMO_VLAN)?;
    let bp1 = BridgePortOid::from_index(1);
    let bp2 = BridgePortOid::from_index(2);

    orch.set_notification_callback(Arc::new(|batch: &[FdbNotification]| {
        for n in batch {
            info!(key = %n.key, bridge_port = %n.bridge_port, event = ?n.event, "FDB notification");
        }
    }));

    let macs: Vec<MacAddress> = ["00:11:22:33:44:01", "00:11:22:33:44:02", "00:11:22:33:44:03"]
        .iter()
        .map(|s| s.parse())
        .collect::<Result<_, _>>()?;
    let keys: Vec<FdbKey> = macs.iter().map(|m| FdbKey::new(FdbDomain::Vlan(vlan), *m)).collect();
    for key in &keys {
        orch.register_entry(*key);
    }

    let learns: Vec<FdbHwEvent> = keys.iter().map(|k| FdbHwEvent::learned(*k, bp1)).collect();
    hardware.inject_events(&learns);
    hardware.inject_events(&[FdbHwEvent::learned(keys[0], bp2)]);

    info!(entries = orch.entry_count(), "demo topology seeded");
    Ok(())
}
