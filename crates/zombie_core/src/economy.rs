//! Resource ledger and periodic resource production.
//!
//! The ledger is the single store of named resource counters (Bone, Flesh,
//! Biohazard, ...). Purchases go through [`ResourceLedger::try_deduct`],
//! which performs the affordability check and the deduction in one call so
//! no other deduction can interleave between them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{seconds, Fixed};

/// A single `(resource, amount)` entry of a cost list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceCost {
    /// Resource name, e.g. `"Bone"`.
    pub resource: String,
    /// Amount required. Negative amounts are treated as zero.
    pub amount: i64,
}

impl ResourceCost {
    /// Create a new cost entry.
    #[must_use]
    pub fn new(resource: impl Into<String>, amount: i64) -> Self {
        Self {
            resource: resource.into(),
            amount,
        }
    }

    fn required(&self) -> i64 {
        self.amount.max(0)
    }
}

/// Notification that one resource counter changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceChanged {
    /// Resource name.
    pub resource: String,
    /// Amount before the change.
    pub previous: i64,
    /// Amount after the change.
    pub current: i64,
}

/// Named resource counters.
///
/// Amounts never go negative: deductions are only applied after a
/// successful [`has`](Self::has) check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLedger {
    amounts: BTreeMap<String, i64>,
    #[serde(skip)]
    changes: Vec<ResourceChanged>,
}

impl ResourceLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger pre-filled with starting amounts.
    ///
    /// Initial amounts do not queue change notifications.
    #[must_use]
    pub fn with_amounts<I, S>(amounts: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        Self {
            amounts: amounts
                .into_iter()
                .map(|(name, amount)| (name.into(), amount.max(0)))
                .collect(),
            changes: Vec::new(),
        }
    }

    /// Current amount of a resource. Unknown resources hold zero.
    #[must_use]
    pub fn amount(&self, resource: &str) -> i64 {
        self.amounts.get(resource).copied().unwrap_or(0)
    }

    /// All known resources in name order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, i64)> {
        self.amounts
            .iter()
            .map(|(name, amount)| (name.clone(), *amount))
            .collect()
    }

    /// Whether every cost in the list can be paid.
    ///
    /// An unknown resource counts as zero, so it only passes when the
    /// requested amount is zero. Repeated entries for the same resource are
    /// summed.
    #[must_use]
    pub fn has(&self, costs: &[ResourceCost]) -> bool {
        self.first_shortfall(costs).is_none()
    }

    /// Subtract every cost in the list.
    ///
    /// Must only be called right after a successful [`has`](Self::has);
    /// prefer [`try_deduct`](Self::try_deduct). A shortfall here is a caller
    /// bug: it trips a debug assertion and otherwise clamps at zero.
    pub fn deduct(&mut self, costs: &[ResourceCost]) {
        debug_assert!(self.has(costs), "deduct called without a passing has()");
        #[cfg(feature = "debug-validation")]
        assert!(self.has(costs), "deduct called without a passing has()");

        for cost in costs {
            let required = cost.required();
            if required == 0 {
                continue;
            }
            let previous = self.amount(&cost.resource);
            let current = (previous - required).max(0);
            self.set(&cost.resource, previous, current);
        }
    }

    /// Like [`has`](Self::has), but names the first missing resource.
    pub fn check(&self, costs: &[ResourceCost]) -> Result<()> {
        match self.first_shortfall(costs) {
            Some((resource, required, available)) => Err(GameError::InsufficientResources {
                resource,
                required,
                available,
            }),
            None => Ok(()),
        }
    }

    /// Check and deduct in one step.
    ///
    /// Leaves the ledger untouched on failure.
    pub fn try_deduct(&mut self, costs: &[ResourceCost]) -> Result<()> {
        if let Err(err) = self.check(costs) {
            tracing::debug!(%err, "Purchase refused");
            return Err(err);
        }
        self.deduct(costs);
        Ok(())
    }

    /// Increase (or initialise) a resource.
    pub fn add(&mut self, resource: &str, amount: i64) {
        let previous = self.amount(resource);
        let current = previous.saturating_add(amount).max(0);
        if !self.amounts.contains_key(resource) || current != previous {
            self.set(resource, previous, current);
        }
    }

    /// Return a full cost list, e.g. when a building is removed.
    pub fn refund(&mut self, costs: &[ResourceCost]) {
        for cost in costs {
            self.add(&cost.resource, cost.required());
        }
    }

    /// Take every change queued since the last drain, oldest first.
    pub fn drain_changes(&mut self) -> Vec<ResourceChanged> {
        std::mem::take(&mut self.changes)
    }

    fn set(&mut self, resource: &str, previous: i64, current: i64) {
        self.amounts.insert(resource.to_string(), current);
        self.changes.push(ResourceChanged {
            resource: resource.to_string(),
            previous,
            current,
        });
    }

    fn first_shortfall(&self, costs: &[ResourceCost]) -> Option<(String, i64, i64)> {
        let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
        for cost in costs {
            *totals.entry(cost.resource.as_str()).or_insert(0) += cost.required();
        }
        totals.into_iter().find_map(|(resource, required)| {
            let available = self.amount(resource);
            (available < required).then(|| (resource.to_string(), required, available))
        })
    }
}

/// Shortest production cycle blueprint validation accepts, in seconds.
pub const MIN_CYCLE_SECONDS: f32 = 0.1;

/// A building's resource production rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceProduction {
    /// Resource produced.
    pub resource: String,
    /// Amount added each cycle.
    pub amount_per_cycle: i64,
    /// Seconds between cycles.
    pub cycle_seconds: f32,
}

/// Timer driving one [`ResourceProduction`] rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceProducer {
    /// The rule being produced.
    pub rule: ResourceProduction,
    #[serde(with = "crate::math::fixed_serde")]
    elapsed: Fixed,
}

impl ResourceProducer {
    /// Create a producer at the start of its first cycle.
    #[must_use]
    pub fn new(rule: ResourceProduction) -> Self {
        Self {
            rule,
            elapsed: Fixed::ZERO,
        }
    }

    /// Advance by `dt` and pay out every completed cycle into the ledger.
    ///
    /// Returns the number of cycles completed. Rules with a zero cycle or a
    /// non-positive amount never produce.
    pub fn tick(&mut self, dt: Fixed, ledger: &mut ResourceLedger) -> u32 {
        let cycle = seconds(self.rule.cycle_seconds);
        if cycle == Fixed::ZERO || self.rule.amount_per_cycle <= 0 {
            return 0;
        }

        self.elapsed = self.elapsed.saturating_add(dt);
        if self.elapsed < cycle {
            return 0;
        }
        let whole = self.elapsed.saturating_div(cycle).int();
        self.elapsed %= cycle;
        let cycles = u32::try_from(whole.to_num::<i64>()).unwrap_or(u32::MAX);
        ledger.add(
            &self.rule.resource,
            self.rule.amount_per_cycle.saturating_mul(i64::from(cycles)),
        );
        cycles
    }
}
