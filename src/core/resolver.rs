//! CP-004: Recipe resolution: expand a target into base ingredients.
//!
//! Recursive expansion with surplus carry-forward. Each requirement first
//! draws from the surplus pool, then either lands in `needed` (base
//! ingredient) or runs the producing recipe `ceil(outstanding / yield)`
//! times. Over-production and byproducts go back into the pool, where any
//! later requirement anywhere in the same call can reuse them.
//!
//! Identities currently being crafted are tracked on an explicit chain, so
//! a recipe that needs its own output (directly or transitively) fails with
//! `CyclicDependency`, and the chain length is bounded by
//! `ResolverConfig::max_depth`.

use super::cookbook::Cookbook;
use super::error::{CraftError, Result};
use super::inventory::Inventory;
use super::tags::TagTable;
use super::types::{Identity, Quantity, Recipe, ResolverConfig};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::collections::BTreeSet;

/// Outcome of one resolution call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Base ingredients consumed
    pub needed: Inventory,
    /// Intermediate goods produced but never consumed
    pub surplus: Inventory,
    /// Recipe name → total batches run, in order of first run
    pub crafts: IndexMap<String, u64>,
    /// Stations required by the recipes that ran
    pub stations: BTreeSet<String>,
}

/// Resolves recipes against a shared, read-only cookbook and tag table.
///
/// Holds no per-call state: every `resolve` owns its own accumulators, so
/// one resolver (or many) may run on any number of threads at once.
#[derive(Debug, Clone)]
pub struct Resolver<'a> {
    cookbook: &'a Cookbook,
    tags: &'a TagTable,
    config: ResolverConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(cookbook: &'a Cookbook, tags: &'a TagTable) -> Self {
        Self {
            cookbook,
            tags,
            config: ResolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Base ingredients needed to make `count` units of `target`'s primary
    /// output by running `target`.
    pub fn resolve(&self, target: &Recipe, count: u64) -> Result<Resolution> {
        let mut expansion = Expansion::new(self);
        let identity = target.primary_output().identity();
        if count > 0 {
            expansion.craft(target, identity, count)?;
        }
        Ok(expansion.resolution)
    }

    /// Base ingredients needed to obtain every quantity in `requirements`,
    /// with one surplus pool shared across all of them. Each requirement
    /// is routed through the cookbook.
    pub fn resolve_quantities(&self, requirements: &[Quantity]) -> Result<Resolution> {
        let mut expansion = Expansion::new(self);
        for requirement in requirements {
            expansion.require(requirement.identity(), requirement.amount())?;
        }
        Ok(expansion.resolution)
    }
}

/// Resolve `count` units of `target` with the default configuration.
pub fn resolve(
    target: &Recipe,
    count: u64,
    cookbook: &Cookbook,
    tags: &TagTable,
) -> Result<Resolution> {
    Resolver::new(cookbook, tags).resolve(target, count)
}

/// Per-call state. Owned by exactly one resolution call.
struct Expansion<'a> {
    cookbook: &'a Cookbook,
    tags: &'a TagTable,
    max_depth: usize,
    resolution: Resolution,
    in_progress: IndexSet<Identity>,
}

impl<'a> Expansion<'a> {
    fn new(resolver: &Resolver<'a>) -> Self {
        Self {
            cookbook: resolver.cookbook,
            tags: resolver.tags,
            max_depth: resolver.config.max_depth,
            resolution: Resolution::default(),
            in_progress: IndexSet::new(),
        }
    }

    /// Satisfy a requirement of `amount` units of `identity`.
    fn require(&mut self, identity: &Identity, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }

        let name = match identity {
            Identity::Name(_) => identity.clone(),
            Identity::Tag(_) => self.select_tag_member(identity, amount)?,
        };

        let drawn = self.resolution.surplus.take_up_to(&name, amount);
        let outstanding = amount - drawn;
        if outstanding == 0 {
            return Ok(());
        }

        let cookbook = self.cookbook;
        match cookbook.recipe_for(&name) {
            Some(recipe) => self.craft(recipe, &name, outstanding),
            None => self.resolution.needed.add(name, outstanding),
        }
    }

    /// Run `recipe` enough times to cover `outstanding` units of `identity`.
    fn craft(&mut self, recipe: &Recipe, identity: &Identity, outstanding: u64) -> Result<()> {
        if self.in_progress.contains(identity) {
            let mut chain: Vec<String> = self
                .in_progress
                .iter()
                .skip_while(|id| *id != identity)
                .map(ToString::to_string)
                .collect();
            chain.push(identity.to_string());
            return Err(CraftError::CyclicDependency { chain });
        }
        if self.in_progress.len() >= self.max_depth {
            return Err(CraftError::DepthExceeded {
                limit: self.max_depth,
            });
        }

        let per_batch = recipe
            .output_amount_for(identity)
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                CraftError::invalid(recipe.name(), format!("does not produce '{}'", identity))
            })?;
        let batches = outstanding.div_ceil(per_batch);

        self.in_progress.insert(identity.clone());
        for input in recipe.inputs() {
            let scaled = input.scale(batches)?;
            self.require(scaled.identity(), scaled.amount())?;
        }
        self.in_progress.pop();

        for output in recipe.outputs() {
            // per_batch * batches - outstanding, without forming the product
            let spare = if output.identity() == identity {
                (per_batch - outstanding % per_batch) % per_batch
            } else {
                output.scale(batches)?.amount()
            };
            self.resolution.surplus.add(output.identity().clone(), spare)?;
        }

        let runs = self
            .resolution
            .crafts
            .entry(recipe.name().to_string())
            .or_insert(0);
        *runs = runs
            .checked_add(batches)
            .ok_or_else(|| CraftError::overflow(&recipe.name()))?;
        self.resolution
            .stations
            .extend(recipe.stations().iter().cloned());
        Ok(())
    }

    /// Pick the concrete item a tag requirement of `amount` units is
    /// satisfied with: the first candidate already sitting in surplus, else
    /// the first candidate in configured order.
    ///
    /// Candidates still being crafted further up the chain are passed over
    /// unless surplus alone covers `amount`. If every candidate is in
    /// progress the first one is returned and the cycle is reported.
    fn select_tag_member(&self, identity: &Identity, amount: u64) -> Result<Identity> {
        let candidates: Vec<Identity> = self
            .tags
            .candidates(identity)?
            .into_iter()
            .map(Identity::name)
            .collect();
        let surplus = &self.resolution.surplus;
        let usable = |name: &Identity| {
            !self.in_progress.contains(name) || surplus.sufficient_for(name, amount)
        };
        candidates
            .iter()
            .find(|name| surplus.has_item(name) && usable(name))
            .or_else(|| candidates.iter().find(|name| usable(name)))
            .or_else(|| candidates.first())
            .cloned()
            .ok_or_else(|| CraftError::UnknownTag {
                tag: identity.to_string(),
            })
    }
}
