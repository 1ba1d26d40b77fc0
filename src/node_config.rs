/// NODE CONFIGURATION
///
/// Layered: built-in defaults, then an optional file (format by extension),
/// then `FLIGHTSURETY__*` environment variables, e.g.
/// `FLIGHTSURETY__RPC_PORT=3100` or `FLIGHTSURETY__SIMULATOR__ORACLE_COUNT=20`.

use anyhow::{Context, Result};
use flightsurety_core::{Address, ProtocolConfig};
use flightsurety_oracle_sim::SimulatorConfig;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::ops::Range;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "FLIGHTSURETY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub rpc_host: IpAddr,
    pub rpc_port: u16,
    /// Origin allowed by CORS (the dapp)
    pub cors_origin: String,
    /// JSON file holding `airlinesDB` and `flightsDB`
    pub reference_db: PathBuf,
    /// Label from which local account addresses are derived
    pub account_label: String,
    pub owner_account: u32,
    pub genesis_airline_account: u32,
    pub simulator: SimulatorConfig,
    pub protocol: ProtocolConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            rpc_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            rpc_port: 3000,
            cors_origin: "http://localhost:8000".to_string(),
            reference_db: PathBuf::from("config/airDB.json"),
            account_label: "account".to_string(),
            owner_account: 0,
            genesis_airline_account: 1,
            simulator: SimulatorConfig::default(),
            protocol: ProtocolConfig::default(),
        }
    }
}

impl NodeConfig {
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("assembling node configuration")?;
        let node: NodeConfig = settings
            .try_deserialize()
            .context("deserializing node configuration")?;
        node.validate()?;
        Ok(node)
    }

    pub fn validate(&self) -> Result<()> {
        self.protocol.validate()?;
        anyhow::ensure!(
            self.owner_account != self.genesis_airline_account,
            "owner and genesis airline must be different accounts"
        );
        let oracles = self.oracle_accounts()?;
        anyhow::ensure!(
            !oracles.contains(&self.owner_account) && !oracles.contains(&self.genesis_airline_account),
            "oracle accounts overlap the owner or genesis airline"
        );
        Ok(())
    }

    /// Account numbers the simulator registers as oracles.
    pub fn oracle_accounts(&self) -> Result<Range<u32>> {
        self.simulator.oracle_accounts().with_context(|| {
            format!(
                "{} oracle accounts starting at {} exceed the account space",
                self.simulator.oracle_count, self.simulator.first_oracle_account
            )
        })
    }

    pub fn rpc_addr(&self) -> SocketAddr {
        SocketAddr::new(self.rpc_host, self.rpc_port)
    }

    pub fn account(&self, index: u32) -> Address {
        Address::derive(&self.account_label, index)
    }

    pub fn owner(&self) -> Address {
        self.account(self.owner_account)
    }

    pub fn genesis_airline(&self) -> Address {
        self.account(self.genesis_airline_account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = NodeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rpc_addr().to_string(), "127.0.0.1:3000");
        assert_ne!(config.owner(), config.genesis_airline());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = std::env::temp_dir().join("flightsurety-node-config-test.toml");
        std::fs::write(
            &path,
            "rpc_port = 3100\ncors_origin = \"http://localhost:9000\"\n\n[simulator]\noracle_count = 12\n",
        )
        .unwrap();

        let config = NodeConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.rpc_port, 3100);
        assert_eq!(config.cors_origin, "http://localhost:9000");
        assert_eq!(config.simulator.oracle_count, 12);
        assert_eq!(config.simulator.first_oracle_account, 10);
        assert_eq!(config.protocol, ProtocolConfig::default());
    }

    #[test]
    fn test_overlapping_oracle_accounts_rejected() {
        let mut config = NodeConfig::default();
        config.simulator.first_oracle_account = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oracle_range_past_account_space_rejected() {
        let mut config = NodeConfig::default();
        config.simulator.first_oracle_account = u32::MAX;
        assert!(config.oracle_accounts().is_err());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("exceed the account space"));
    }
}
