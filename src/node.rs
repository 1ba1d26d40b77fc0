// NODE RUNTIME
// Wires one FlightSurety instance to the oracle simulator task and the RPC
// server, then waits for shutdown.

use crate::node_config::NodeConfig;
use anyhow::{Context, Result};
use flightsurety_core::{FlightSurety, SharedFlightSurety};
use flightsurety_oracle_sim::{OracleSimulator, RandomStatusPicker, SimulatorConfig};
use flightsurety_rpc::{ReferenceStore, RpcState};
use std::future::Future;
use tokio::sync::watch;
use tracing::{info, warn};

pub fn build_system(config: &NodeConfig) -> Result<SharedFlightSurety> {
    let system = FlightSurety::new(config.owner(), config.genesis_airline(), config.protocol.clone())
        .context("initialising FlightSurety")?;
    Ok(system.into_shared())
}

/// Reference catalogs, or empty ones when the file is unavailable.
pub fn load_reference_store(config: &NodeConfig) -> ReferenceStore {
    match ReferenceStore::load(&config.reference_db) {
        Ok(store) => store,
        Err(e) => {
            warn!("{:#}; serving empty catalogs", e);
            ReferenceStore::default()
        }
    }
}

fn simulator_config(config: &NodeConfig) -> SimulatorConfig {
    SimulatorConfig {
        account_label: config.account_label.clone(),
        ..config.simulator.clone()
    }
}

/// Run until `shutdown` resolves.
pub async fn run(config: NodeConfig, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
    let system = build_system(&config)?;
    info!(
        "Contract is operational: {}",
        system.lock().is_operational()
    );

    let sim_config = simulator_config(&config);
    let picker = RandomStatusPicker::new(sim_config.status_seed);
    let mut simulator = OracleSimulator::new(system.clone(), sim_config, picker);
    simulator
        .register_all()
        .context("registering simulated oracles")?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let simulator_task = tokio::spawn(simulator.run(stop_rx));

    let state = RpcState::new(load_reference_store(&config), system);
    let served = flightsurety_rpc::serve(config.rpc_addr(), state, &config.cors_origin, shutdown).await;

    let _ = stop_tx.send(true);
    simulator_task
        .await
        .context("oracle simulator task failed")??;
    served
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_system_registers_genesis_airline() {
        let config = NodeConfig::default();
        let system = build_system(&config).unwrap();
        let fs = system.lock();
        assert!(fs.is_registered_airline(&config.genesis_airline()));
        assert_eq!(fs.owner(), config.owner());
    }

    #[test]
    fn test_missing_reference_file_serves_empty_catalogs() {
        let config = NodeConfig {
            reference_db: "/nonexistent/airDB.json".into(),
            ..NodeConfig::default()
        };
        let store = load_reference_store(&config);
        assert!(store.airline_ids().is_empty());
    }

    #[test]
    fn test_simulator_uses_node_account_label() {
        let config = NodeConfig {
            account_label: "ganache".to_string(),
            ..NodeConfig::default()
        };
        assert_eq!(simulator_config(&config).account_label, "ganache");
    }
}
