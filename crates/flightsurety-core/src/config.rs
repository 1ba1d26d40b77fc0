/// PROTOCOL PARAMETERS
///
/// Fixed economic and consensus constants. Every field has a default matching
/// the reference deployment; a deployment may override them through its
/// configuration file.

use crate::error::{FlightSuretyError, Result};
use crate::types::{is_valid_status_code, StatusCode, Wei, STATUS_CODE_LATE_AIRLINE, UNIT};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Minimum deposit an airline must make to become funded
    pub airline_ante: Wei,
    /// Maximum premium a passenger may pay for one policy
    pub max_premium: Wei,
    /// Fee an oracle pays to receive its index set
    pub oracle_registration_fee: Wei,
    /// Matching responses needed to finalize a status request
    pub min_responses: u32,
    /// Registered airlines beyond which admission needs votes
    pub consensus_threshold: u64,
    /// Exclusive upper bound of oracle indices
    pub oracle_index_space: u8,
    /// Indices assigned to each oracle
    pub indexes_per_oracle: usize,
    /// Payout multiplier numerator
    pub payout_numerator: u128,
    /// Payout multiplier denominator
    pub payout_denominator: u128,
    /// Status code that makes policies eligible for payout
    pub delayed_status_code: StatusCode,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        ProtocolConfig {
            airline_ante: 10 * UNIT,
            max_premium: UNIT,
            oracle_registration_fee: UNIT,
            min_responses: 3,
            consensus_threshold: 4,
            oracle_index_space: 10,
            indexes_per_oracle: 3,
            payout_numerator: 3,
            payout_denominator: 2,
            delayed_status_code: STATUS_CODE_LATE_AIRLINE,
        }
    }
}

impl ProtocolConfig {
    pub fn validate(&self) -> Result<()> {
        if self.airline_ante == 0 {
            return Err(FlightSuretyError::InvalidConfig("airline_ante must be positive".into()));
        }
        if self.max_premium == 0 {
            return Err(FlightSuretyError::InvalidConfig("max_premium must be positive".into()));
        }
        if self.min_responses == 0 {
            return Err(FlightSuretyError::InvalidConfig("min_responses must be positive".into()));
        }
        if self.indexes_per_oracle == 0
            || self.indexes_per_oracle > self.oracle_index_space as usize
        {
            return Err(FlightSuretyError::InvalidConfig(format!(
                "indexes_per_oracle must be in 1..={}",
                self.oracle_index_space
            )));
        }
        if self.payout_denominator == 0 {
            return Err(FlightSuretyError::InvalidConfig(
                "payout_denominator must be positive".into(),
            ));
        }
        if !is_valid_status_code(self.delayed_status_code) {
            return Err(FlightSuretyError::InvalidConfig(format!(
                "delayed_status_code {} is not a valid status code",
                self.delayed_status_code
            )));
        }
        Ok(())
    }

    /// Amount credited to a passenger for a delayed flight.
    pub fn payout_for(&self, premium: Wei) -> Wei {
        premium.saturating_mul(self.payout_numerator) / self.payout_denominator
    }

    /// Distinct votes needed to admit a candidate when `registered` airlines exist.
    pub fn required_votes(registered: u64) -> u64 {
        registered.div_ceil(2)
    }
}
