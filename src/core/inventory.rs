//! CP-002: Inventory: a multiset of ingredient amounts keyed by identity.
//!
//! At most one entry per identity; entries that reach zero are removed, so
//! no zero-amount entry ever persists. Identities are matched exactly: a
//! name entry never satisfies a tag entry or vice versa.

use super::error::{CraftError, Result};
use super::types::{Identity, Quantity};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// Ingredient identity → amount, in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    entries: IndexMap<Identity, u64>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an inventory from quantities, summing repeated identities.
    pub fn from_quantities(quantities: impl IntoIterator<Item = Quantity>) -> Result<Self> {
        let mut inventory = Inventory::new();
        for quantity in quantities {
            inventory.add_quantity(&quantity)?;
        }
        Ok(inventory)
    }

    /// Add `amount` units of `identity`. Adding 0 is a no-op.
    ///
    /// Fails with `AmountOverflow` (leaving the inventory untouched) if the
    /// held amount would no longer fit.
    pub fn add(&mut self, identity: Identity, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let total = self
            .amount_of(&identity)
            .checked_add(amount)
            .ok_or_else(|| CraftError::overflow(&identity))?;
        self.entries.insert(identity, total);
        Ok(())
    }

    /// Add a single quantity.
    pub fn add_quantity(&mut self, quantity: &Quantity) -> Result<()> {
        self.add(quantity.identity().clone(), quantity.amount())
    }

    /// Add every entry of `other` into this inventory. On overflow nothing
    /// is merged.
    pub fn merge(&mut self, other: &Inventory) -> Result<()> {
        let mut merged = self.clone();
        for (identity, &amount) in &other.entries {
            merged.add(identity.clone(), amount)?;
        }
        *self = merged;
        Ok(())
    }

    /// Units currently held of `identity`.
    pub fn amount_of(&self, identity: &Identity) -> u64 {
        self.entries.get(identity).copied().unwrap_or(0)
    }

    /// True iff an entry for `identity` holds at least `required` units.
    pub fn sufficient_for(&self, identity: &Identity, required: u64) -> bool {
        self.entries
            .get(identity)
            .is_some_and(|&held| held >= required)
    }

    /// True iff any units of `identity` are held.
    pub fn has_item(&self, identity: &Identity) -> bool {
        self.entries.contains_key(identity)
    }

    /// Remove exactly `amount` units of `identity`.
    ///
    /// Taking 0 always succeeds. Fails with `InsufficientStock` (leaving the
    /// inventory untouched) if fewer units are held.
    pub fn take(&mut self, identity: &Identity, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        if !self.sufficient_for(identity, amount) {
            return Err(CraftError::InsufficientStock {
                identity: identity.to_string(),
                available: self.amount_of(identity),
                requested: amount,
            });
        }
        self.decrement(identity, amount);
        Ok(())
    }

    /// Remove up to `amount` units of `identity`, returning how many were
    /// actually removed.
    pub fn take_up_to(&mut self, identity: &Identity, amount: u64) -> u64 {
        let taken = amount.min(self.amount_of(identity));
        if taken > 0 {
            self.decrement(identity, taken);
        }
        taken
    }

    fn decrement(&mut self, identity: &Identity, amount: u64) {
        if let Some(held) = self.entries.get_mut(identity) {
            *held -= amount;
            if *held == 0 {
                self.entries.shift_remove(identity);
            }
        }
    }

    /// A new inventory with every amount multiplied by `factor`.
    pub fn scale_all(&self, factor: u64) -> Result<Inventory> {
        let mut scaled = Inventory::new();
        for (identity, &amount) in &self.entries {
            let product = amount
                .checked_mul(factor)
                .ok_or_else(|| CraftError::overflow(identity))?;
            scaled.add(identity.clone(), product)?;
        }
        Ok(scaled)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Identity, u64)> {
        self.entries.iter().map(|(identity, &amount)| (identity, amount))
    }

    /// Number of distinct identities held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all amounts. Widened so it cannot overflow.
    pub fn total_units(&self) -> u128 {
        self.entries.values().map(|&amount| u128::from(amount)).sum()
    }

    pub fn to_quantities(&self) -> Vec<Quantity> {
        self.iter()
            .map(|(identity, amount)| Quantity::new(identity.clone(), amount))
            .collect()
    }
}

impl Serialize for Inventory {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_quantities().serialize(serializer)
    }
}

impl fmt::Display for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (identity, amount) in self.iter() {
            writeln!(f, "{}x {}", amount, identity)?;
        }
        Ok(())
    }
}
