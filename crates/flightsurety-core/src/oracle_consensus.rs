/// ORACLE CONSENSUS
///
/// Registered oracles hold a fixed set of indices. A status request is keyed by
/// (index, flight) and only oracles holding that index may answer it. A request
/// finalizes the first time one status code collects `min_responses` distinct
/// responders; later responses are still counted but never change the outcome.
///
/// There is no expiry: a request that never reaches quorum stays open.

use crate::config::ProtocolConfig;
use crate::entropy::{Entropy, HashEntropy};
use crate::error::{FlightSuretyError, Result};
use crate::types::{is_valid_status_code, Address, FlightKey, RequestKey, StatusCode, Wei};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Draws tried before falling back to probing for a free index
const MAX_INDEX_DRAWS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRequest {
    pub key: RequestKey,
    /// Distinct responders per status code
    pub responses: BTreeMap<StatusCode, u32>,
    pub responders: BTreeSet<Address>,
    pub final_status: Option<StatusCode>,
}

impl StatusRequest {
    fn open(key: RequestKey) -> Self {
        StatusRequest {
            key,
            responses: BTreeMap::new(),
            responders: BTreeSet::new(),
            final_status: None,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.final_status.is_some()
    }

    pub fn response_count(&self, status: StatusCode) -> u32 {
        self.responses.get(&status).copied().unwrap_or(0)
    }
}

/// Result of an accepted oracle response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseOutcome {
    /// Responders now agreeing on the submitted code
    pub matching: u32,
    /// Set when this response finalized the request
    pub finalized: Option<StatusCode>,
}

pub struct OracleConsensus {
    oracles: BTreeMap<Address, Vec<u8>>,
    requests: BTreeMap<RequestKey, StatusRequest>,
    /// Latest finalized status per departure
    flight_statuses: BTreeMap<FlightKey, StatusCode>,
    nonce: u64,
    entropy: Box<dyn Entropy>,
    registration_fee: Wei,
    min_responses: u32,
    index_space: u8,
    indexes_per_oracle: usize,
}

impl std::fmt::Debug for OracleConsensus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleConsensus")
            .field("oracles", &self.oracles.len())
            .field("requests", &self.requests.len())
            .field("nonce", &self.nonce)
            .finish()
    }
}

impl OracleConsensus {
    pub fn new(config: &ProtocolConfig) -> Self {
        Self::with_entropy(config, Box::new(HashEntropy))
    }

    pub fn with_entropy(config: &ProtocolConfig, entropy: Box<dyn Entropy>) -> Self {
        OracleConsensus {
            oracles: BTreeMap::new(),
            requests: BTreeMap::new(),
            flight_statuses: BTreeMap::new(),
            nonce: 0,
            entropy,
            registration_fee: config.oracle_registration_fee,
            min_responses: config.min_responses,
            index_space: config.oracle_index_space,
            indexes_per_oracle: config.indexes_per_oracle,
        }
    }

    /// Next pseudo-random index for `seed`; advances the nonce.
    pub fn draw_index(&mut self, seed: &Address) -> u8 {
        let index = self.entropy.draw(seed, self.nonce, self.index_space);
        self.nonce = self.nonce.wrapping_add(1);
        index
    }

    fn assign_indexes(&mut self, seed: &Address) -> Vec<u8> {
        let mut indexes: Vec<u8> = Vec::with_capacity(self.indexes_per_oracle);
        let mut draws = 0;
        while indexes.len() < self.indexes_per_oracle {
            let mut index = self.draw_index(seed);
            draws += 1;
            if indexes.contains(&index) {
                if draws < MAX_INDEX_DRAWS {
                    continue;
                }
                while indexes.contains(&index) {
                    index = (index + 1) % self.index_space;
                }
            }
            indexes.push(index);
        }
        indexes
    }

    /// Validate the fee and assign an index set. The fee deposit belongs to the ledger.
    pub fn register_oracle(&mut self, caller: Address, fee: Wei) -> Result<Vec<u8>> {
        if fee < self.registration_fee {
            return Err(FlightSuretyError::InsufficientFee);
        }
        if self.oracles.contains_key(&caller) {
            return Err(FlightSuretyError::OracleAlreadyRegistered);
        }

        let indexes = self.assign_indexes(&caller);
        info!("Oracle {} registered with indexes {:?}", caller, indexes);
        self.oracles.insert(caller, indexes.clone());
        Ok(indexes)
    }

    pub fn oracle_indexes(&self, oracle: &Address) -> Result<&[u8]> {
        self.oracles
            .get(oracle)
            .map(Vec::as_slice)
            .ok_or(FlightSuretyError::UnknownOracle)
    }

    /// Open a request for `flight` under `index`. Returns false if it already existed.
    pub fn request_status(&mut self, index: u8, flight: FlightKey) -> bool {
        let key = RequestKey { index, flight };
        if self.requests.contains_key(&key) {
            return false;
        }
        debug!("Status request opened for {} at index {}", key.flight, index);
        self.requests.insert(key.clone(), StatusRequest::open(key));
        true
    }

    pub fn submit_oracle_response(
        &mut self,
        caller: Address,
        index: u8,
        flight: FlightKey,
        status: StatusCode,
    ) -> Result<ResponseOutcome> {
        if !is_valid_status_code(status) {
            return Err(FlightSuretyError::InvalidStatusCode);
        }
        let indexes = self
            .oracles
            .get(&caller)
            .ok_or(FlightSuretyError::UnknownOracle)?;
        if !indexes.contains(&index) {
            return Err(FlightSuretyError::IndexMismatch);
        }
        let key = RequestKey { index, flight };
        let request = self
            .requests
            .get_mut(&key)
            .ok_or(FlightSuretyError::RequestNotFound)?;
        if request.responders.contains(&caller) {
            return Err(FlightSuretyError::DuplicateResponse);
        }

        request.responders.insert(caller);
        let matching = {
            let count = request.responses.entry(status).or_insert(0);
            *count += 1;
            *count
        };
        debug!(
            "Oracle {} reported {} for {} ({} matching)",
            caller, status, key.flight, matching
        );

        let mut finalized = None;
        if matching >= self.min_responses && !request.is_finalized() {
            request.final_status = Some(status);
            self.flight_statuses.insert(key.flight.clone(), status);
            finalized = Some(status);
            info!("Flight {} finalized with status {}", key.flight, status);
        }

        Ok(ResponseOutcome { matching, finalized })
    }

    pub fn request(&self, index: u8, flight: &FlightKey) -> Option<&StatusRequest> {
        self.requests.get(&RequestKey {
            index,
            flight: flight.clone(),
        })
    }

    pub fn flight_status(&self, flight: &FlightKey) -> Option<StatusCode> {
        self.flight_statuses.get(flight).copied()
    }

    pub fn oracle_count(&self) -> usize {
        self.oracles.len()
    }

    pub fn registration_fee(&self) -> Wei {
        self.registration_fee
    }
}
