/// ESCROW LEDGER
///
/// Bookkeeping for native currency held by the system: airline antes,
/// passenger premiums and oracle fees flow in, passenger payouts flow out.
/// Credits are liabilities owed to passengers until they withdraw them.

use crate::error::{FlightSuretyError, Result};
use crate::types::{Address, Wei};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DepositKind {
    /// Airline ante
    AirlineFunding,
    /// Passenger premium
    Premium,
    /// Oracle registration fee
    OracleFee,
}

/// Aggregate escrow accounting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowState {
    /// Currency currently held
    pub escrow_balance: Wei,
    /// Total ever deposited
    pub total_deposited: Wei,
    /// Total ever withdrawn
    pub total_withdrawn: Wei,
    /// Credits owed but not yet withdrawn
    pub outstanding_credits: Wei,
}

impl EscrowState {
    /// Verify the consistency of escrow accounting
    pub fn verify(&self) -> Result<()> {
        if self.total_withdrawn > self.total_deposited {
            return Err(FlightSuretyError::InsufficientEscrow);
        }
        if self.escrow_balance != self.total_deposited - self.total_withdrawn {
            return Err(FlightSuretyError::InsufficientEscrow);
        }
        Ok(())
    }

    /// Hash commitment over the aggregate state
    pub fn compute_hash(&self) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(self.escrow_balance.to_le_bytes());
        hasher.update(self.total_deposited.to_le_bytes());
        hasher.update(self.total_withdrawn.to_le_bytes());
        hasher.update(self.outstanding_credits.to_le_bytes());
        hasher.finalize().to_vec()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    state: EscrowState,
    /// Deposits per account and kind
    deposits: BTreeMap<(Address, DepositKind), Wei>,
    /// Withdrawable credit per account
    credits: BTreeMap<Address, Wei>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that a deposit of `amount` by `from` fits every running total.
    pub fn check_deposit(&self, from: &Address, kind: DepositKind, amount: Wei) -> Result<()> {
        self.deposit_totals(from, kind, amount).map(|_| ())
    }

    fn deposit_totals(&self, from: &Address, kind: DepositKind, amount: Wei) -> Result<(Wei, Wei, Wei)> {
        let account = self
            .deposited_by(from, kind)
            .checked_add(amount)
            .ok_or(FlightSuretyError::InvalidAmount)?;
        let escrow = self
            .state
            .escrow_balance
            .checked_add(amount)
            .ok_or(FlightSuretyError::InvalidAmount)?;
        let total = self
            .state
            .total_deposited
            .checked_add(amount)
            .ok_or(FlightSuretyError::InvalidAmount)?;
        Ok((account, escrow, total))
    }

    /// Move `amount` from `from` into escrow. Nothing changes on overflow.
    pub fn deposit(&mut self, from: Address, kind: DepositKind, amount: Wei) -> Result<()> {
        let (account, escrow, total) = self.deposit_totals(&from, kind, amount)?;
        self.deposits.insert((from, kind), account);
        self.state.escrow_balance = escrow;
        self.state.total_deposited = total;
        Ok(())
    }

    /// Check that `amount` can be owed to `to`.
    pub fn check_credit(&self, to: &Address, amount: Wei) -> Result<()> {
        self.credit_totals(to, amount).map(|_| ())
    }

    fn credit_totals(&self, to: &Address, amount: Wei) -> Result<(Wei, Wei)> {
        let account = self
            .credit_of(to)
            .checked_add(amount)
            .ok_or(FlightSuretyError::InvalidAmount)?;
        let outstanding = self
            .state
            .outstanding_credits
            .checked_add(amount)
            .ok_or(FlightSuretyError::InvalidAmount)?;
        Ok((account, outstanding))
    }

    /// Owe `amount` to `to`, payable on withdrawal.
    pub fn credit(&mut self, to: Address, amount: Wei) -> Result<()> {
        let (account, outstanding) = self.credit_totals(&to, amount)?;
        self.credits.insert(to, account);
        self.state.outstanding_credits = outstanding;
        Ok(())
    }

    /// Check that `account` could withdraw its credit right now.
    pub fn check_withdraw(&self, account: &Address) -> Result<Wei> {
        let amount = self.credit_of(account);
        if amount == 0 {
            return Err(FlightSuretyError::NothingToWithdraw);
        }
        if amount > self.state.escrow_balance {
            return Err(FlightSuretyError::InsufficientEscrow);
        }
        Ok(amount)
    }

    /// Pay out the whole credit of `account`; returns the amount released.
    pub fn withdraw(&mut self, account: Address) -> Result<Wei> {
        let amount = self.check_withdraw(&account)?;
        self.credits.remove(&account);
        self.state.escrow_balance -= amount;
        self.state.total_withdrawn += amount;
        self.state.outstanding_credits -= amount;
        Ok(amount)
    }

    pub fn escrow_balance(&self) -> Wei {
        self.state.escrow_balance
    }

    pub fn credit_of(&self, account: &Address) -> Wei {
        self.credits.get(account).copied().unwrap_or(0)
    }

    pub fn deposited_by(&self, account: &Address, kind: DepositKind) -> Wei {
        self.deposits.get(&(*account, kind)).copied().unwrap_or(0)
    }

    pub fn state(&self) -> &EscrowState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UNIT;

    #[test]
    fn test_deposit_increases_escrow() {
        let mut ledger = Ledger::new();
        let airline = Address::derive("airline", 1);
        ledger.deposit(airline, DepositKind::AirlineFunding, 10 * UNIT).unwrap();
        ledger.deposit(airline, DepositKind::AirlineFunding, 5 * UNIT).unwrap();

        assert_eq!(ledger.escrow_balance(), 15 * UNIT);
        assert_eq!(ledger.deposited_by(&airline, DepositKind::AirlineFunding), 15 * UNIT);
        assert_eq!(ledger.deposited_by(&airline, DepositKind::Premium), 0);
        assert!(ledger.state().verify().is_ok());
    }

    #[test]
    fn test_withdraw_releases_credit() {
        let mut ledger = Ledger::new();
        let passenger = Address::derive("passenger", 1);
        ledger.deposit(passenger, DepositKind::Premium, UNIT).unwrap();
        ledger.credit(passenger, UNIT * 3 / 2).unwrap();

        // Not enough escrow yet for a 1.5x payout
        assert_eq!(ledger.withdraw(passenger), Err(FlightSuretyError::InsufficientEscrow));

        ledger.deposit(Address::derive("airline", 1), DepositKind::AirlineFunding, 10 * UNIT).unwrap();
        assert_eq!(ledger.withdraw(passenger).unwrap(), UNIT * 3 / 2);
        assert_eq!(ledger.credit_of(&passenger), 0);
        assert_eq!(ledger.escrow_balance(), 11 * UNIT - UNIT * 3 / 2);
        assert_eq!(ledger.state().outstanding_credits, 0);
        assert!(ledger.state().verify().is_ok());
    }

    #[test]
    fn test_withdraw_without_credit_fails() {
        let mut ledger = Ledger::new();
        assert_eq!(
            ledger.withdraw(Address::derive("passenger", 1)),
            Err(FlightSuretyError::NothingToWithdraw)
        );
    }

    #[test]
    fn test_state_hash_changes_with_balance() {
        let mut ledger = Ledger::new();
        let before = ledger.state().compute_hash();
        ledger.deposit(Address::derive("oracle", 1), DepositKind::OracleFee, UNIT).unwrap();
        assert_ne!(before, ledger.state().compute_hash());
    }

    #[test]
    fn test_overflowing_deposit_leaves_ledger_untouched() {
        let mut ledger = Ledger::new();
        let airline = Address::derive("airline", 1);
        ledger.deposit(airline, DepositKind::AirlineFunding, Wei::MAX).unwrap();
        let before = ledger.state().clone();

        assert_eq!(
            ledger.check_deposit(&airline, DepositKind::AirlineFunding, 1),
            Err(FlightSuretyError::InvalidAmount)
        );
        // A different account still overflows the aggregate totals
        assert_eq!(
            ledger.deposit(Address::derive("oracle", 1), DepositKind::OracleFee, UNIT),
            Err(FlightSuretyError::InvalidAmount)
        );
        assert_eq!(ledger.state(), &before);
        assert_eq!(ledger.deposited_by(&airline, DepositKind::AirlineFunding), Wei::MAX);
        assert_eq!(ledger.deposited_by(&Address::derive("oracle", 1), DepositKind::OracleFee), 0);
    }

    #[test]
    fn test_overflowing_credit_rejected() {
        let mut ledger = Ledger::new();
        let passenger = Address::derive("passenger", 1);
        ledger.credit(passenger, Wei::MAX).unwrap();
        assert_eq!(ledger.credit(passenger, 1), Err(FlightSuretyError::InvalidAmount));
        assert_eq!(ledger.credit_of(&passenger), Wei::MAX);
        assert_eq!(ledger.state().outstanding_credits, Wei::MAX);
    }
}
