// FLIGHTSURETY STATE MACHINE
// Single owned store composing the registry, the insurance pool, the oracle
// layer, the escrow ledger and the event log.
//
// SAFETY INVARIANTS:
// 1. Every operation validates all preconditions before mutating anything
// 2. Events are emitted only for operations that succeeded
// 3. Only the owner toggles the operational gate
// 4. While not operational, every state-changing call fails

use crate::airline_registry::{AirlineInfo, AirlineRegistry};
use crate::config::ProtocolConfig;
use crate::entropy::{Entropy, HashEntropy};
use crate::error::{FlightSuretyError, Result};
use crate::events::{EventLog, EventRecord, FlightSuretyEvent};
use crate::insurance_pool::{InsurancePolicy, InsurancePool};
use crate::ledger::{DepositKind, Ledger};
use crate::oracle_consensus::{OracleConsensus, ResponseOutcome};
use crate::types::{Address, FlightKey, PolicyKey, StatusCode, Wei};
use log::{info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Handle through which concurrent actors share one FlightSurety instance.
/// The mutex serializes every call into a total order.
pub type SharedFlightSurety = Arc<Mutex<FlightSurety>>;

#[derive(Debug)]
pub struct FlightSurety {
    config: ProtocolConfig,
    owner: Address,
    operational: bool,
    ledger: Ledger,
    registry: AirlineRegistry,
    pool: InsurancePool,
    oracles: OracleConsensus,
    events: EventLog,
}

impl FlightSurety {
    pub fn new(owner: Address, genesis_airline: Address, config: ProtocolConfig) -> Result<Self> {
        Self::with_entropy(owner, genesis_airline, config, Box::new(HashEntropy))
    }

    pub fn with_entropy(
        owner: Address,
        genesis_airline: Address,
        config: ProtocolConfig,
        entropy: Box<dyn Entropy>,
    ) -> Result<Self> {
        config.validate()?;
        info!(
            "FlightSurety initialised (owner {}, genesis airline {})",
            owner, genesis_airline
        );
        Ok(FlightSurety {
            registry: AirlineRegistry::genesis(genesis_airline, &config),
            pool: InsurancePool::new(config.max_premium),
            oracles: OracleConsensus::with_entropy(&config, entropy),
            ledger: Ledger::new(),
            events: EventLog::new(),
            operational: true,
            owner,
            config,
        })
    }

    pub fn into_shared(self) -> SharedFlightSurety {
        Arc::new(Mutex::new(self))
    }

    fn require_operational(&self) -> Result<()> {
        if !self.operational {
            return Err(FlightSuretyError::NotOperational);
        }
        Ok(())
    }

    // --- Operational gate ---

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    pub fn set_operating_status(&mut self, caller: Address, operational: bool) -> Result<()> {
        if caller != self.owner {
            warn!("Operating status change refused for {}", caller);
            return Err(FlightSuretyError::NotAuthorized);
        }
        self.operational = operational;
        info!("Operational status set to {}", operational);
        self.events
            .emit(FlightSuretyEvent::OperationalStatusChanged { operational });
        Ok(())
    }

    // --- Airlines ---

    pub fn register_airline(&mut self, caller: Address, candidate: Address) -> Result<()> {
        self.require_operational()?;
        let admission = self.registry.register_airline(caller, candidate)?;
        if admission.implicit_vote {
            self.events.emit(FlightSuretyEvent::Voted {
                candidate,
                voter: caller,
            });
        }
        self.events
            .emit(FlightSuretyEvent::Registered { airline: candidate });
        Ok(())
    }

    pub fn vote(&mut self, caller: Address, candidate: Address) -> Result<u64> {
        self.require_operational()?;
        let count = self.registry.vote(caller, candidate)?;
        self.events.emit(FlightSuretyEvent::Voted {
            candidate,
            voter: caller,
        });
        Ok(count)
    }

    pub fn fund_account(&mut self, caller: Address, amount: Wei) -> Result<()> {
        self.require_operational()?;
        self.ledger
            .check_deposit(&caller, DepositKind::AirlineFunding, amount)?;
        self.registry.fund_account(caller, amount)?;
        self.ledger
            .deposit(caller, DepositKind::AirlineFunding, amount)?;
        info!("Airline {} funded with {} wei", caller, amount);
        self.events.emit(FlightSuretyEvent::Funded {
            airline: caller,
            amount,
        });
        Ok(())
    }

    pub fn is_registered_airline(&self, airline: &Address) -> bool {
        self.registry.is_registered(airline)
    }

    pub fn is_funded_airline(&self, airline: &Address) -> bool {
        self.registry.is_funded(airline)
    }

    pub fn get_airline_info(&self, airline: &Address) -> AirlineInfo {
        self.registry.airline_info(airline)
    }

    pub fn get_registered_airline_num(&self) -> u64 {
        self.registry.registered_count()
    }

    pub fn get_vote_count(&self, candidate: &Address) -> u64 {
        self.registry.vote_count(candidate)
    }

    // --- Insurance ---

    pub fn buy_insurance(
        &mut self,
        passenger: Address,
        airline: Address,
        flight: &str,
        timestamp: u64,
        premium: Wei,
    ) -> Result<PolicyKey> {
        self.require_operational()?;
        if !self.registry.is_funded(&airline) {
            return Err(FlightSuretyError::AirlineNotFunded);
        }
        let key = PolicyKey::new(&FlightKey::new(airline, flight, timestamp), passenger);
        self.ledger
            .check_deposit(&passenger, DepositKind::Premium, premium)?;
        self.pool.buy_insurance(key.clone(), premium)?;
        self.ledger.deposit(passenger, DepositKind::Premium, premium)?;
        self.events.emit(FlightSuretyEvent::Purchased {
            key: key.clone(),
            premium,
        });
        Ok(key)
    }

    pub fn get_insurance_amount(&self, flight: &str, passenger: &Address) -> Result<Wei> {
        self.require_operational()?;
        self.pool.insurance_amount(flight, passenger)
    }

    pub fn get_insurance_data(&self, key: &PolicyKey) -> Result<InsurancePolicy> {
        self.require_operational()?;
        self.pool.insurance_data(key).cloned()
    }

    pub fn get_active_insurance_keys(&self) -> Result<Vec<PolicyKey>> {
        self.require_operational()?;
        Ok(self.pool.active_keys().to_vec())
    }

    /// Mark one policy paid and credit its payout to the passenger.
    fn credit_payout(&mut self, key: &PolicyKey) -> Result<Wei> {
        let policy = self.pool.insurance_data(key)?;
        let amount = self.config.payout_for(policy.amount);
        self.ledger.check_credit(&key.passenger, amount)?;
        self.pool.mark_paid(key)?;
        self.ledger.credit(key.passenger, amount)?;
        info!("Credited {} wei to {} for {}", amount, key.passenger, key.flight_key());
        Ok(amount)
    }

    /// Credit every unpaid policy on a delayed departure.
    fn credit_insurees(&mut self, flight: &FlightKey) -> Vec<FlightSuretyEvent> {
        let mut events = Vec::new();
        for key in self.pool.unpaid_policies(flight) {
            // Keys come from the pool and are unpaid; only an overflowing credit is skipped
            if let Ok(amount) = self.credit_payout(&key) {
                events.push(FlightSuretyEvent::InsureeCredited { key, amount });
            }
        }
        events
    }

    /// Release the caller's accumulated payout credit.
    pub fn withdraw(&mut self, caller: Address) -> Result<Wei> {
        self.require_operational()?;
        let amount = self.ledger.withdraw(caller)?;
        info!("{} withdrew {} wei", caller, amount);
        self.events.emit(FlightSuretyEvent::Withdrawn {
            account: caller,
            amount,
        });
        Ok(amount)
    }

    pub fn pending_credit(&self, account: &Address) -> Result<Wei> {
        self.require_operational()?;
        Ok(self.ledger.credit_of(account))
    }

    pub fn escrow_balance(&self) -> Result<Wei> {
        self.require_operational()?;
        Ok(self.ledger.escrow_balance())
    }

    // --- Oracles ---

    pub fn register_oracle(&mut self, caller: Address, fee: Wei) -> Result<Vec<u8>> {
        self.require_operational()?;
        self.ledger
            .check_deposit(&caller, DepositKind::OracleFee, fee)?;
        let indexes = self.oracles.register_oracle(caller, fee)?;
        self.ledger.deposit(caller, DepositKind::OracleFee, fee)?;
        Ok(indexes)
    }

    pub fn get_oracle_indexes(&self, caller: &Address) -> Result<Vec<u8>> {
        self.require_operational()?;
        self.oracles.oracle_indexes(caller).map(<[u8]>::to_vec)
    }

    /// Open (or re-announce) a status request for `flight` under `index`.
    pub fn request_status(&mut self, index: u8, flight: FlightKey) -> Result<()> {
        self.require_operational()?;
        self.oracles.request_status(index, flight.clone());
        self.events
            .emit(FlightSuretyEvent::OracleRequest { index, flight });
        Ok(())
    }

    /// Flight-status check: draw an index for the caller and ask the oracles.
    pub fn fetch_flight_status(
        &mut self,
        caller: Address,
        airline: Address,
        flight: &str,
        timestamp: u64,
    ) -> Result<u8> {
        self.require_operational()?;
        let index = self.oracles.draw_index(&caller);
        self.request_status(index, FlightKey::new(airline, flight, timestamp))?;
        Ok(index)
    }

    pub fn submit_oracle_response(
        &mut self,
        caller: Address,
        index: u8,
        airline: Address,
        flight: &str,
        timestamp: u64,
        status: StatusCode,
    ) -> Result<ResponseOutcome> {
        self.require_operational()?;
        let flight_key = FlightKey::new(airline, flight, timestamp);
        let outcome = self
            .oracles
            .submit_oracle_response(caller, index, flight_key.clone(), status)?;

        if let Some(final_status) = outcome.finalized {
            let mut events = vec![FlightSuretyEvent::FlightStatusUpdated {
                index,
                flight: flight_key.clone(),
                status: final_status,
            }];
            if final_status == self.config.delayed_status_code {
                events.extend(self.credit_insurees(&flight_key));
            }
            self.events.emit_all(events);
        }
        Ok(outcome)
    }

    pub fn flight_status(&self, flight: &FlightKey) -> Option<StatusCode> {
        self.oracles.flight_status(flight)
    }

    pub fn oracle_registration_fee(&self) -> Wei {
        self.oracles.registration_fee()
    }

    // --- Events & introspection ---

    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}
