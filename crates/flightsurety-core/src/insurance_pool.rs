/// INSURANCE POOL
///
/// Escrowed passenger policies, one per (airline, flight, timestamp, passenger).
/// Policies are never removed; the only mutation after purchase is the payout mark.

use crate::error::{FlightSuretyError, Result};
use crate::types::{Address, FlightKey, PolicyKey, Wei};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsurancePolicy {
    pub key: PolicyKey,
    /// Escrowed premium
    pub amount: Wei,
    pub paid_out: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsurancePool {
    policies: HashMap<PolicyKey, InsurancePolicy>,
    /// Every key ever created, in creation order
    active_keys: Vec<PolicyKey>,
    by_flight: BTreeMap<FlightKey, Vec<PolicyKey>>,
    max_premium: Wei,
}

impl InsurancePool {
    pub fn new(max_premium: Wei) -> Self {
        InsurancePool {
            max_premium,
            ..Default::default()
        }
    }

    /// Create a policy. The caller is responsible for checking the airline is funded.
    pub fn buy_insurance(&mut self, key: PolicyKey, premium: Wei) -> Result<()> {
        if premium == 0 {
            return Err(FlightSuretyError::InvalidAmount);
        }
        if premium > self.max_premium {
            return Err(FlightSuretyError::PremiumTooHigh);
        }
        if self.policies.contains_key(&key) {
            return Err(FlightSuretyError::DuplicatePolicy);
        }

        self.by_flight
            .entry(key.flight_key())
            .or_default()
            .push(key.clone());
        self.active_keys.push(key.clone());
        self.policies.insert(
            key.clone(),
            InsurancePolicy {
                key: key.clone(),
                amount: premium,
                paid_out: false,
            },
        );

        info!(
            "Passenger {} insured flight {} for {} wei",
            key.passenger,
            key.flight_key(),
            premium
        );
        Ok(())
    }

    /// Mark a policy paid and return its premium. Fails on the second call.
    pub fn mark_paid(&mut self, key: &PolicyKey) -> Result<Wei> {
        let policy = self.policies.get_mut(key).ok_or(FlightSuretyError::NotFound)?;
        if policy.paid_out {
            return Err(FlightSuretyError::AlreadyPaid);
        }
        policy.paid_out = true;
        Ok(policy.amount)
    }

    /// Unpaid policies on a flight departure, in purchase order.
    pub fn unpaid_policies(&self, flight: &FlightKey) -> Vec<PolicyKey> {
        self.by_flight
            .get(flight)
            .map(|keys| {
                keys.iter()
                    .filter(|k| self.policies.get(*k).is_some_and(|p| !p.paid_out))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total premium a passenger holds on a flight code, across airlines and departures.
    pub fn insurance_amount(&self, flight: &str, passenger: &Address) -> Result<Wei> {
        let mut found = false;
        let mut total: Wei = 0;
        for policy in self
            .policies
            .values()
            .filter(|p| p.key.flight == flight && p.key.passenger == *passenger)
        {
            found = true;
            total += policy.amount;
        }
        if !found {
            return Err(FlightSuretyError::NotFound);
        }
        Ok(total)
    }

    pub fn insurance_data(&self, key: &PolicyKey) -> Result<&InsurancePolicy> {
        self.policies.get(key).ok_or(FlightSuretyError::NotFound)
    }

    pub fn active_keys(&self) -> &[PolicyKey] {
        &self.active_keys
    }

    pub fn max_premium(&self) -> Wei {
        self.max_premium
    }
}
