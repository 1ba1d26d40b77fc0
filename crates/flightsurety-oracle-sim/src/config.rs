use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Oracle simulator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Number of simulated oracles
    pub oracle_count: u32,
    /// Account number of the first oracle
    pub first_oracle_account: u32,
    /// Label used to derive local account addresses
    pub account_label: String,
    /// Seed for status code selection; random when absent
    pub status_seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            oracle_count: 30,
            first_oracle_account: 10,
            account_label: "account".to_string(),
            status_seed: None,
        }
    }
}

impl SimulatorConfig {
    /// Account numbers reserved for oracles, or `None` when the range passes `u32::MAX`.
    pub fn oracle_accounts(&self) -> Option<Range<u32>> {
        let end = self.first_oracle_account.checked_add(self.oracle_count)?;
        Some(self.first_oracle_account..end)
    }
}
