//! # Payment Adapter
//!
//! In-memory settlement ledger standing in for the execution environment's
//! value channel.
//!
//! Value attached to a call is first taken into custody with `hold`, kept
//! per payer; `send` pays out of the payer's custody; `refund` returns it
//! after a failed operation. Payouts double as the settlement journal:
//! `rollback_to` pops them newest first and moves the value back into
//! custody. Recipients can be marked as rejecting to exercise the rollback
//! path.

use crate::domain::value_objects::{Address, U256};
use crate::errors::PaymentError;
use crate::ports::inbound::LandRegistryApi;
use crate::ports::outbound::{PaymentChannel, PaymentSavepoint, ValueEscrow};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A completed payout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// Account whose custody funded the payout.
    pub payer: Address,
    /// Credited account.
    pub recipient: Address,
    /// Credited amount.
    pub amount: U256,
}

/// In-memory balances with per-payer custody of attached value.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPayments {
    balances: HashMap<Address, U256>,
    held: HashMap<Address, U256>,
    rejecting: HashSet<Address>,
    payouts: Vec<Payout>,
}

impl InMemoryPayments {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `amount` to `account` from outside the system.
    ///
    /// # Errors
    /// - `Overflow` if the balance would exceed `U256::MAX`.
    pub fn fund(&mut self, account: Address, amount: U256) -> Result<(), PaymentError> {
        let updated = self
            .balance_of(account)
            .checked_add(amount)
            .ok_or(PaymentError::Overflow(account))?;
        self.balances.insert(account, updated);
        Ok(())
    }

    /// Spendable balance of `account`.
    #[must_use]
    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    /// Value currently in custody for `payer`.
    #[must_use]
    pub fn held_for(&self, payer: Address) -> U256 {
        self.held.get(&payer).copied().unwrap_or_default()
    }

    /// Value currently in custody across all payers.
    #[must_use]
    pub fn total_held(&self) -> U256 {
        self.held
            .values()
            .fold(U256::zero(), |sum, v| sum.saturating_add(*v))
    }

    /// Makes every later payment to `account` fail.
    pub fn reject_payments_to(&mut self, account: Address) {
        self.rejecting.insert(account);
    }

    /// Completed payouts, oldest first.
    #[must_use]
    pub fn payouts(&self) -> &[Payout] {
        &self.payouts
    }

    fn set_held(&mut self, payer: Address, amount: U256) {
        if amount.is_zero() {
            self.held.remove(&payer);
        } else {
            self.held.insert(payer, amount);
        }
    }
}

impl PaymentChannel for InMemoryPayments {
    fn send(
        &mut self,
        _registry: &mut dyn LandRegistryApi,
        payer: Address,
        recipient: Address,
        amount: U256,
    ) -> Result<(), PaymentError> {
        if self.rejecting.contains(&recipient) {
            return Err(PaymentError::Rejected(recipient));
        }
        let available = self.held_for(payer);
        let remaining = available
            .checked_sub(amount)
            .ok_or(PaymentError::InsufficientBalance {
                required: amount,
                available,
            })?;
        let credited = self
            .balance_of(recipient)
            .checked_add(amount)
            .ok_or(PaymentError::Overflow(recipient))?;

        self.set_held(payer, remaining);
        self.balances.insert(recipient, credited);
        self.payouts.push(Payout {
            payer,
            recipient,
            amount,
        });
        debug!(%payer, %recipient, %amount, "Payout settled");
        Ok(())
    }

    fn savepoint(&self) -> PaymentSavepoint {
        PaymentSavepoint(self.payouts.len())
    }

    fn rollback_to(&mut self, savepoint: PaymentSavepoint) {
        if savepoint.0 >= self.payouts.len() {
            return;
        }
        let undone = self.payouts.split_off(savepoint.0);
        for payout in undone.into_iter().rev() {
            // Custody is only drawn down inside an operation, so a recipient
            // still holds everything it was credited since the savepoint.
            let balance = self.balance_of(payout.recipient);
            self.balances
                .insert(payout.recipient, balance.saturating_sub(payout.amount));
            let held = self.held_for(payout.payer).saturating_add(payout.amount);
            self.set_held(payout.payer, held);
            debug!(payer = %payout.payer, recipient = %payout.recipient, amount = %payout.amount, "Payout reverted");
        }
    }
}

impl ValueEscrow for InMemoryPayments {
    fn hold(&mut self, payer: Address, amount: U256) -> Result<(), PaymentError> {
        let available = self.balance_of(payer);
        let remaining = available
            .checked_sub(amount)
            .ok_or(PaymentError::InsufficientBalance {
                required: amount,
                available,
            })?;
        let held = self
            .held_for(payer)
            .checked_add(amount)
            .ok_or(PaymentError::Overflow(payer))?;
        self.balances.insert(payer, remaining);
        self.set_held(payer, held);
        Ok(())
    }

    fn refund(&mut self, payer: Address, amount: U256) -> Result<(), PaymentError> {
        let available = self.held_for(payer);
        let remaining = available
            .checked_sub(amount)
            .ok_or(PaymentError::InsufficientBalance {
                required: amount,
                available,
            })?;
        let balance = self
            .balance_of(payer)
            .checked_add(amount)
            .ok_or(PaymentError::Overflow(payer))?;
        self.set_held(payer, remaining);
        self.balances.insert(payer, balance);
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryOwnership, InMemoryParcelStore};
    use crate::engine::RegistryEngine;

    fn alice() -> Address {
        Address::new([1u8; 20])
    }

    fn bob() -> Address {
        Address::new([2u8; 20])
    }

    fn carol() -> Address {
        Address::new([3u8; 20])
    }

    fn registry() -> RegistryEngine<InMemoryParcelStore, InMemoryOwnership> {
        RegistryEngine::in_memory()
    }

    #[test]
    fn test_hold_send_moves_value() {
        let mut payments = InMemoryPayments::new();
        let mut registry = registry();
        payments.fund(bob(), U256::from(500)).unwrap();

        payments.hold(bob(), U256::from(150)).unwrap();
        assert_eq!(payments.balance_of(bob()), U256::from(350));
        assert_eq!(payments.held_for(bob()), U256::from(150));

        payments
            .send(&mut registry, bob(), alice(), U256::from(150))
            .unwrap();
        assert_eq!(payments.balance_of(alice()), U256::from(150));
        assert_eq!(payments.held_for(bob()), U256::zero());
        assert_eq!(
            payments.payouts(),
            &[Payout {
                payer: bob(),
                recipient: alice(),
                amount: U256::from(150)
            }]
        );
    }

    #[test]
    fn test_hold_beyond_balance_rejected() {
        let mut payments = InMemoryPayments::new();
        payments.fund(bob(), U256::from(10)).unwrap();

        assert_eq!(
            payments.hold(bob(), U256::from(11)),
            Err(PaymentError::InsufficientBalance {
                required: U256::from(11),
                available: U256::from(10),
            })
        );
        assert_eq!(payments.balance_of(bob()), U256::from(10));
    }

    #[test]
    fn test_rejecting_recipient_moves_nothing() {
        let mut payments = InMemoryPayments::new();
        let mut registry = registry();
        payments.fund(bob(), U256::from(100)).unwrap();
        payments.hold(bob(), U256::from(100)).unwrap();
        payments.reject_payments_to(alice());

        assert_eq!(
            payments.send(&mut registry, bob(), alice(), U256::from(100)),
            Err(PaymentError::Rejected(alice()))
        );
        assert_eq!(payments.balance_of(alice()), U256::zero());
        assert_eq!(payments.held_for(bob()), U256::from(100));

        payments.refund(bob(), U256::from(100)).unwrap();
        assert_eq!(payments.balance_of(bob()), U256::from(100));
        assert_eq!(payments.total_held(), U256::zero());
    }

    #[test]
    fn test_send_without_custody_fails() {
        let mut payments = InMemoryPayments::new();
        let mut registry = registry();
        assert!(matches!(
            payments.send(&mut registry, bob(), alice(), U256::one()),
            Err(PaymentError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_send_cannot_spend_another_payers_custody() {
        let mut payments = InMemoryPayments::new();
        let mut registry = registry();
        payments.fund(bob(), U256::from(100)).unwrap();
        payments.hold(bob(), U256::from(100)).unwrap();

        assert_eq!(
            payments.send(&mut registry, carol(), alice(), U256::from(40)),
            Err(PaymentError::InsufficientBalance {
                required: U256::from(40),
                available: U256::zero(),
            })
        );
        assert_eq!(payments.held_for(bob()), U256::from(100));
        assert!(payments.payouts().is_empty());
    }

    #[test]
    fn test_refund_beyond_custody_is_an_error() {
        let mut payments = InMemoryPayments::new();
        payments.fund(bob(), U256::from(100)).unwrap();
        payments.hold(bob(), U256::from(60)).unwrap();

        assert_eq!(
            payments.refund(bob(), U256::from(100)),
            Err(PaymentError::InsufficientBalance {
                required: U256::from(100),
                available: U256::from(60),
            })
        );
        assert_eq!(payments.held_for(bob()), U256::from(60));
        assert_eq!(payments.balance_of(bob()), U256::from(40));
    }

    #[test]
    fn test_rollback_restores_custody_and_balances() {
        let mut payments = InMemoryPayments::new();
        let mut registry = registry();
        payments.fund(bob(), U256::from(100)).unwrap();
        payments.fund(carol(), U256::from(40)).unwrap();
        payments.hold(bob(), U256::from(100)).unwrap();
        payments.hold(carol(), U256::from(40)).unwrap();

        let savepoint = payments.savepoint();
        payments
            .send(&mut registry, bob(), alice(), U256::from(100))
            .unwrap();
        payments
            .send(&mut registry, carol(), alice(), U256::from(40))
            .unwrap();
        assert_eq!(payments.balance_of(alice()), U256::from(140));

        payments.rollback_to(savepoint);
        assert_eq!(payments.balance_of(alice()), U256::zero());
        assert_eq!(payments.held_for(bob()), U256::from(100));
        assert_eq!(payments.held_for(carol()), U256::from(40));
        assert!(payments.payouts().is_empty());

        // Rolling back to the present is a no-op.
        let now = payments.savepoint();
        payments.rollback_to(now);
        assert_eq!(payments.total_held(), U256::from(140));
    }
}
