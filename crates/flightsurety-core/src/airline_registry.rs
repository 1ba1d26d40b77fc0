// AIRLINE REGISTRY
// Admission and governance of airlines.
//
// INVARIANTS:
// 1. funded implies registered
// 2. The first `consensus_threshold` airlines are admitted by any funded airline
// 3. Later candidates need ceil(N/2) distinct recorded voters, N evaluated at
//    admission time; the registering call itself is not one of them
// 4. An airline votes at most once per candidate
// 5. A rejected call leaves no trace (votes included)

use crate::config::ProtocolConfig;
use crate::error::{FlightSuretyError, Result};
use crate::types::{Address, Wei};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Airline record. Unregistered records exist only for candidates with votes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airline {
    pub address: Address,
    pub registered: bool,
    pub funded: bool,
    /// Airlines that voted for this one's admission
    pub voters: BTreeSet<Address>,
}

impl Airline {
    fn candidate(address: Address) -> Self {
        Airline {
            address,
            registered: false,
            funded: false,
            voters: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirlineInfo {
    pub registered: bool,
    pub funded: bool,
}

/// What a successful `register_airline` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub candidate: Address,
    /// The caller's vote was recorded by this call
    pub implicit_vote: bool,
    /// Recorded voters that carried the admission (0 on the bootstrap path)
    pub votes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirlineRegistry {
    airlines: BTreeMap<Address, Airline>,
    registered_count: u64,
    consensus_threshold: u64,
    airline_ante: Wei,
}

impl AirlineRegistry {
    /// Registry holding only the genesis airline (registered, unfunded).
    pub fn genesis(first_airline: Address, config: &ProtocolConfig) -> Self {
        let mut airlines = BTreeMap::new();
        let mut genesis = Airline::candidate(first_airline);
        genesis.registered = true;
        airlines.insert(first_airline, genesis);

        AirlineRegistry {
            airlines,
            registered_count: 1,
            consensus_threshold: config.consensus_threshold,
            airline_ante: config.airline_ante,
        }
    }

    fn require_funded_caller(&self, caller: &Address) -> Result<()> {
        let airline = self
            .airlines
            .get(caller)
            .filter(|a| a.registered)
            .ok_or(FlightSuretyError::NotRegistered)?;
        if !airline.funded {
            return Err(FlightSuretyError::NotFunded);
        }
        Ok(())
    }

    fn require_candidate(&self, candidate: &Address) -> Result<()> {
        if self.is_registered(candidate) {
            return Err(FlightSuretyError::AlreadyRegistered);
        }
        Ok(())
    }

    /// Admit `candidate` on behalf of `caller`.
    ///
    /// Below the consensus threshold the candidate is admitted directly.
    /// Above it admission succeeds only once the votes already recorded reach
    /// half of the registered airlines; the caller's vote is then added.
    /// A rejected call records nothing.
    pub fn register_airline(&mut self, caller: Address, candidate: Address) -> Result<Admission> {
        self.require_funded_caller(&caller)?;
        self.require_candidate(&candidate)?;

        if self.registered_count < self.consensus_threshold {
            self.admit(candidate);
            info!(
                "Airline {} registered by {} ({} registered)",
                candidate, caller, self.registered_count
            );
            return Ok(Admission {
                candidate,
                implicit_vote: false,
                votes: 0,
            });
        }

        let (votes, caller_voted) = self
            .airlines
            .get(&candidate)
            .map(|a| (a.voters.len() as u64, a.voters.contains(&caller)))
            .unwrap_or((0, false));
        let required = ProtocolConfig::required_votes(self.registered_count);

        if votes < required {
            warn!(
                "Registration of {} by {} rejected: {}/{} votes",
                candidate, caller, votes, required
            );
            return Err(FlightSuretyError::ConsensusNotReached);
        }

        if !caller_voted {
            self.record_vote(caller, candidate);
        }
        self.admit(candidate);
        info!(
            "Airline {} registered by consensus ({}/{} votes, {} registered)",
            candidate, votes, required, self.registered_count
        );

        Ok(Admission {
            candidate,
            implicit_vote: !caller_voted,
            votes,
        })
    }

    /// Record a vote for `candidate` without admitting it. Returns the vote count.
    pub fn vote(&mut self, caller: Address, candidate: Address) -> Result<u64> {
        self.require_funded_caller(&caller)?;
        self.require_candidate(&candidate)?;
        if self
            .airlines
            .get(&candidate)
            .is_some_and(|a| a.voters.contains(&caller))
        {
            return Err(FlightSuretyError::AlreadyVoted);
        }

        let count = self.record_vote(caller, candidate);
        info!("Airline {} voted for {} ({} votes)", caller, candidate, count);
        Ok(count)
    }

    /// Validate and apply an airline's ante. The deposit itself belongs to the ledger.
    pub fn fund_account(&mut self, caller: Address, amount: Wei) -> Result<()> {
        let airline = self
            .airlines
            .get_mut(&caller)
            .filter(|a| a.registered)
            .ok_or(FlightSuretyError::NotRegistered)?;
        if amount < self.airline_ante {
            return Err(FlightSuretyError::InvalidAmount);
        }
        airline.funded = true;
        Ok(())
    }

    fn record_vote(&mut self, voter: Address, candidate: Address) -> u64 {
        let record = self
            .airlines
            .entry(candidate)
            .or_insert_with(|| Airline::candidate(candidate));
        record.voters.insert(voter);
        record.voters.len() as u64
    }

    fn admit(&mut self, candidate: Address) {
        let record = self
            .airlines
            .entry(candidate)
            .or_insert_with(|| Airline::candidate(candidate));
        record.registered = true;
        self.registered_count += 1;
    }

    pub fn is_registered(&self, airline: &Address) -> bool {
        self.airlines.get(airline).is_some_and(|a| a.registered)
    }

    pub fn is_funded(&self, airline: &Address) -> bool {
        self.airlines.get(airline).is_some_and(|a| a.funded)
    }

    pub fn airline_info(&self, airline: &Address) -> AirlineInfo {
        AirlineInfo {
            registered: self.is_registered(airline),
            funded: self.is_funded(airline),
        }
    }

    pub fn registered_count(&self) -> u64 {
        self.registered_count
    }

    pub fn vote_count(&self, candidate: &Address) -> u64 {
        self.airlines
            .get(candidate)
            .map(|a| a.voters.len() as u64)
            .unwrap_or(0)
    }

    pub fn airline(&self, address: &Address) -> Option<&Airline> {
        self.airlines.get(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UNIT;
    use proptest::prelude::*;

    fn airline(n: u32) -> Address {
        Address::derive("airline", n)
    }

    fn registry() -> AirlineRegistry {
        let mut registry = AirlineRegistry::genesis(airline(1), &ProtocolConfig::default());
        registry.fund_account(airline(1), 10 * UNIT).unwrap();
        registry
    }

    /// Registry with airlines 1..=n registered and funded
    fn registry_with(n: u32) -> AirlineRegistry {
        let mut registry = registry();
        for i in 2..=n {
            let votes_needed = if registry.registered_count() < 4 {
                0
            } else {
                ProtocolConfig::required_votes(registry.registered_count())
            };
            // Airline 1 votes first, so its register call adds nothing
            for v in 1..=votes_needed as u32 {
                registry.vote(airline(v), airline(i)).unwrap();
            }
            registry.register_airline(airline(1), airline(i)).unwrap();
            registry.fund_account(airline(i), 10 * UNIT).unwrap();
        }
        registry
    }

    #[test]
    fn test_genesis_airline_registered_not_funded() {
        let registry = AirlineRegistry::genesis(airline(1), &ProtocolConfig::default());
        assert_eq!(registry.registered_count(), 1);
        assert_eq!(
            registry.airline_info(&airline(1)),
            AirlineInfo { registered: true, funded: false }
        );
    }

    #[test]
    fn test_unregistered_airline_cannot_fund() {
        let mut registry = registry();
        assert_eq!(
            registry.fund_account(airline(2), 10 * UNIT),
            Err(FlightSuretyError::NotRegistered)
        );
        assert!(!registry.is_funded(&airline(2)));
    }

    #[test]
    fn test_fund_below_ante_rejected() {
        let mut registry = AirlineRegistry::genesis(airline(1), &ProtocolConfig::default());
        assert_eq!(
            registry.fund_account(airline(1), 9 * UNIT),
            Err(FlightSuretyError::InvalidAmount)
        );
        assert!(!registry.is_funded(&airline(1)));
    }

    #[test]
    fn test_refunding_is_accepted() {
        let mut registry = registry();
        assert!(registry.fund_account(airline(1), 10 * UNIT).is_ok());
        assert!(registry.is_funded(&airline(1)));
    }

    #[test]
    fn test_only_funded_airline_registers_others() {
        let mut registry = registry();
        assert_eq!(
            registry.register_airline(airline(2), airline(2)),
            Err(FlightSuretyError::NotRegistered)
        );

        registry.register_airline(airline(1), airline(2)).unwrap();
        assert_eq!(
            registry.register_airline(airline(2), airline(3)),
            Err(FlightSuretyError::NotFunded)
        );
    }

    #[test]
    fn test_first_four_airlines_need_no_vote() {
        let registry = registry_with(4);
        assert_eq!(registry.registered_count(), 4);
        for i in 1..=4 {
            assert!(registry.is_registered(&airline(i)));
        }
        assert_eq!(registry.vote_count(&airline(4)), 0);
    }

    #[test]
    fn test_registering_twice_rejected() {
        let mut registry = registry_with(2);
        assert_eq!(
            registry.register_airline(airline(1), airline(2)),
            Err(FlightSuretyError::AlreadyRegistered)
        );
        assert_eq!(registry.registered_count(), 2);
    }

    #[test]
    fn test_double_vote_rejected_without_increment() {
        let mut registry = registry();
        assert_eq!(registry.vote(airline(1), airline(5)).unwrap(), 1);
        assert_eq!(registry.vote(airline(1), airline(5)), Err(FlightSuretyError::AlreadyVoted));
        assert_eq!(registry.vote_count(&airline(5)), 1);
    }

    #[test]
    fn test_unfunded_airline_cannot_vote() {
        let mut registry = registry();
        registry.register_airline(airline(1), airline(2)).unwrap();
        assert_eq!(registry.vote(airline(2), airline(5)), Err(FlightSuretyError::NotFunded));
        assert_eq!(registry.vote(airline(9), airline(5)), Err(FlightSuretyError::NotRegistered));
        assert_eq!(registry.vote_count(&airline(5)), 0);
    }

    #[test]
    fn test_fifth_airline_needs_half_of_four() {
        let mut registry = registry_with(4);

        assert_eq!(
            registry.register_airline(airline(4), airline(5)),
            Err(FlightSuretyError::ConsensusNotReached)
        );
        // Rejected call kept no vote
        assert_eq!(registry.vote_count(&airline(5)), 0);
        assert!(!registry.is_registered(&airline(5)));

        registry.vote(airline(2), airline(5)).unwrap();
        // One recorded vote of four airlines is not enough, whoever calls
        assert_eq!(
            registry.register_airline(airline(4), airline(5)),
            Err(FlightSuretyError::ConsensusNotReached)
        );
        assert_eq!(registry.vote_count(&airline(5)), 1);

        registry.vote(airline(3), airline(5)).unwrap();
        let admission = registry.register_airline(airline(4), airline(5)).unwrap();
        assert!(admission.implicit_vote);
        assert_eq!(admission.votes, 2);
        assert_eq!(registry.vote_count(&airline(5)), 3);
        assert_eq!(registry.registered_count(), 5);
        assert_eq!(registry.airline_info(&airline(5)), AirlineInfo { registered: true, funded: false });
    }

    #[test]
    fn test_prior_vote_by_caller_is_not_counted_twice() {
        let mut registry = registry_with(4);
        registry.vote(airline(4), airline(5)).unwrap();
        assert_eq!(
            registry.register_airline(airline(4), airline(5)),
            Err(FlightSuretyError::ConsensusNotReached)
        );
        registry.vote(airline(3), airline(5)).unwrap();
        let admission = registry.register_airline(airline(4), airline(5)).unwrap();
        assert!(!admission.implicit_vote);
        assert_eq!(registry.vote_count(&airline(5)), 2);
    }

    #[test]
    fn test_six_airlines_need_three_votes() {
        let mut registry = registry_with(6);
        assert_eq!(registry.registered_count(), 6);

        registry.vote(airline(2), airline(7)).unwrap();
        registry.vote(airline(4), airline(7)).unwrap();
        // Two of six is not enough
        assert_eq!(
            registry.register_airline(airline(3), airline(7)),
            Err(FlightSuretyError::ConsensusNotReached)
        );
        assert_eq!(registry.vote_count(&airline(7)), 2);

        registry.vote(airline(5), airline(7)).unwrap();
        let admission = registry.register_airline(airline(3), airline(7)).unwrap();
        assert_eq!(admission.votes, 3);
        assert_eq!(registry.vote_count(&airline(7)), 4);
        assert!(registry.is_registered(&airline(7)));
    }

    #[test]
    fn test_early_vote_then_consensus_for_fifth() {
        // Airline 1 votes for the fifth before the others have joined
        let mut registry = registry();
        registry.register_airline(airline(1), airline(2)).unwrap();
        registry.vote(airline(1), airline(5)).unwrap();
        registry.fund_account(airline(2), 10 * UNIT).unwrap();
        registry.register_airline(airline(2), airline(3)).unwrap();
        registry.fund_account(airline(3), 10 * UNIT).unwrap();
        registry.register_airline(airline(3), airline(4)).unwrap();
        registry.fund_account(airline(4), 10 * UNIT).unwrap();
        assert_eq!(registry.registered_count(), 4);

        assert_eq!(
            registry.register_airline(airline(4), airline(5)),
            Err(FlightSuretyError::ConsensusNotReached)
        );
        assert!(!registry.is_registered(&airline(5)));
        assert_eq!(registry.vote_count(&airline(5)), 1);

        assert_eq!(registry.vote(airline(2), airline(5)).unwrap(), 2);
        registry.register_airline(airline(4), airline(5)).unwrap();
        assert_eq!(registry.airline_info(&airline(5)), AirlineInfo { registered: true, funded: false });
        assert_eq!(registry.registered_count(), 5);
    }

    #[test]
    fn test_vote_for_registered_airline_rejected() {
        let mut registry = registry_with(2);
        assert_eq!(registry.vote(airline(1), airline(2)), Err(FlightSuretyError::AlreadyRegistered));
    }

    proptest! {
        #[test]
        fn prop_admission_exactly_at_half(registered in 4u32..12, prior_votes in 0u32..8) {
            let mut registry = registry_with(registered);
            let candidate = airline(100);
            let prior_votes = prior_votes.min(registered - 1);
            // Voters 2..=prior_votes+1, caller is airline 1
            for v in 0..prior_votes {
                registry.vote(airline(v + 2), candidate).unwrap();
            }
            let required = ProtocolConfig::required_votes(registered as u64);
            let result = registry.register_airline(airline(1), candidate);
            if prior_votes as u64 >= required {
                prop_assert!(result.is_ok());
                prop_assert!(registry.is_registered(&candidate));
                prop_assert_eq!(registry.vote_count(&candidate), prior_votes as u64 + 1);
            } else {
                prop_assert_eq!(result, Err(FlightSuretyError::ConsensusNotReached));
                prop_assert_eq!(registry.vote_count(&candidate), prior_votes as u64);
            }
        }
    }
}
