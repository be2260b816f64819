//! CP-001: Value types: ingredient identities, quantities, recipes, config.
//!
//! An ingredient is identified either by a concrete name or by a set of
//! category tags ("any item carrying one of these tags"). The two never mix:
//! `Identity` is a sum type, so a doubly-specified or unspecified identity
//! cannot be represented once constructed.

use super::error::{CraftError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// Identity
// ============================================================================

/// The key distinguishing one kind of ingredient from another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Identity {
    /// A concrete item, e.g. `"Wood Plank"`
    Name(String),
    /// Any item carrying at least one of these tags
    Tag(BTreeSet<String>),
}

impl Identity {
    /// A name identity.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// A tag identity over one or more tags.
    pub fn tag<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Tag(tags.into_iter().map(Into::into).collect())
    }

    /// Build an identity from the optional `name`/`tags` pair of a recipe
    /// source entry. Exactly one must be present and non-empty.
    pub fn from_parts(
        name: Option<String>,
        tags: Option<Vec<String>>,
    ) -> std::result::Result<Self, String> {
        match (name, tags) {
            (Some(_), Some(_)) => Err("both 'name' and 'tags' are set".to_string()),
            (None, None) => Err("neither 'name' nor 'tags' is set".to_string()),
            (Some(name), None) => {
                if name.trim().is_empty() {
                    return Err("name is empty".to_string());
                }
                Ok(Self::Name(name))
            }
            (None, Some(tags)) => {
                if tags.is_empty() || tags.iter().any(|t| t.trim().is_empty()) {
                    return Err("tag list is empty or contains an empty tag".to_string());
                }
                Ok(Self::tag(tags))
            }
        }
    }

    /// The concrete name, if this is a name identity.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(n) => Some(n),
            Self::Tag(_) => None,
        }
    }

    pub fn is_tag(&self) -> bool {
        matches!(self, Self::Tag(_))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(n) => write!(f, "{}", n),
            Self::Tag(tags) => {
                let joined: Vec<&str> = tags.iter().map(String::as_str).collect();
                write!(f, "any-of[{}]", joined.join(", "))
            }
        }
    }
}

// ============================================================================
// Quantity
// ============================================================================

/// An amount of one kind of ingredient. Value semantics: every operation
/// returns a new quantity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Quantity {
    identity: Identity,
    amount: u64,
}

impl Quantity {
    pub fn new(identity: Identity, amount: u64) -> Self {
        Self { identity, amount }
    }

    /// Shorthand for a named quantity.
    pub fn name(name: impl Into<String>, amount: u64) -> Self {
        Self::new(Identity::name(name), amount)
    }

    /// Shorthand for a tagged quantity.
    pub fn tag<I, S>(tags: I, amount: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Identity::tag(tags), amount)
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// An amount-0 quantity denotes absence.
    pub fn is_empty(&self) -> bool {
        self.amount == 0
    }

    fn check_same_kind(&self, other: &Quantity) -> Result<()> {
        if self.identity != other.identity {
            return Err(CraftError::IdentityMismatch {
                left: self.identity.to_string(),
                right: other.identity.to_string(),
            });
        }
        Ok(())
    }

    /// Sum of two quantities of the same kind.
    pub fn add(&self, other: &Quantity) -> Result<Quantity> {
        self.check_same_kind(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| CraftError::overflow(&self.identity))?;
        Ok(Self::new(self.identity.clone(), amount))
    }

    /// Difference of two quantities of the same kind; never goes negative.
    pub fn subtract(&self, other: &Quantity) -> Result<Quantity> {
        self.check_same_kind(other)?;
        if self.amount < other.amount {
            return Err(CraftError::InsufficientAmount {
                identity: self.identity.to_string(),
                available: self.amount,
                requested: other.amount,
            });
        }
        Ok(Self::new(self.identity.clone(), self.amount - other.amount))
    }

    /// This quantity multiplied by `factor`. Fails with `AmountOverflow`
    /// if the product does not fit.
    pub fn scale(&self, factor: u64) -> Result<Quantity> {
        let amount = self
            .amount
            .checked_mul(factor)
            .ok_or_else(|| CraftError::overflow(&self.identity))?;
        Ok(Self::new(self.identity.clone(), amount))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x {}", self.amount, self.identity)
    }
}

// ============================================================================
// Recipe
// ============================================================================

/// One way of turning inputs into outputs at a set of stations.
///
/// Running a recipe K times consumes every input scaled by K and yields
/// every output scaled by K.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipe {
    name: String,
    stations: BTreeSet<String>,
    inputs: Vec<Quantity>,
    outputs: Vec<Quantity>,
}

impl Recipe {
    /// Build a validated recipe.
    ///
    /// Fails with `InvalidRecipe` when the name is empty, an input amount is
    /// below 1, there are no outputs, an output is a tag, an output amount is
    /// 0, or the same output is listed twice.
    pub fn new<I, S>(
        name: impl Into<String>,
        stations: I,
        inputs: Vec<Quantity>,
        outputs: Vec<Quantity>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CraftError::invalid(&name, "recipe name is empty"));
        }

        for input in &inputs {
            if input.amount < 1 {
                return Err(CraftError::invalid(
                    &name,
                    format!("input '{}' must have amount >= 1", input.identity),
                ));
            }
        }

        if outputs.is_empty() {
            return Err(CraftError::invalid(&name, "recipe has no outputs"));
        }
        let mut seen = BTreeSet::new();
        for output in &outputs {
            if output.identity.is_tag() {
                return Err(CraftError::invalid(
                    &name,
                    format!("output '{}' must be a concrete item", output.identity),
                ));
            }
            if output.amount == 0 {
                return Err(CraftError::invalid(
                    &name,
                    format!("output '{}' has amount 0", output.identity),
                ));
            }
            if !seen.insert(&output.identity) {
                return Err(CraftError::invalid(
                    &name,
                    format!("output '{}' is listed twice", output.identity),
                ));
            }
        }

        Ok(Self {
            name,
            stations: stations.into_iter().map(Into::into).collect(),
            inputs,
            outputs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stations(&self) -> &BTreeSet<String> {
        &self.stations
    }

    pub fn inputs(&self) -> &[Quantity] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Quantity] {
        &self.outputs
    }

    /// The first output. A top-level request for `count` units of a recipe
    /// is expressed in this output.
    pub fn primary_output(&self) -> &Quantity {
        // outputs is non-empty by construction
        &self.outputs[0]
    }

    /// Units of `identity` yielded by one run of this recipe.
    pub fn output_amount_for(&self, identity: &Identity) -> Option<u64> {
        self.outputs
            .iter()
            .find(|q| &q.identity == identity)
            .map(Quantity::amount)
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |qs: &[Quantity]| {
            qs.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(
            f,
            "{}: {} -> {}",
            self.name,
            list(&self.inputs),
            list(&self.outputs)
        )?;
        if !self.stations.is_empty() {
            let stations: Vec<&str> = self.stations.iter().map(String::as_str).collect();
            write!(f, " @ {}", stations.join(", "))?;
        }
        Ok(())
    }
}

// ============================================================================
// Resolver configuration
// ============================================================================

/// Tunables for a resolution call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Maximum length of the active resolution chain
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_depth() -> usize {
    256
}
