//! CP-007: Error taxonomy for recipe loading and resolution.
//!
//! Every failure is unrecoverable for the call that raised it and propagates
//! to the caller. The core never prints or logs.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a cookbook or resolving a recipe.
#[derive(Error, Debug)]
pub enum CraftError {
    /// Malformed recipe definition
    #[error("invalid recipe '{recipe}': {reason}")]
    InvalidRecipe { recipe: String, reason: String },

    /// Two recipes claim the same output
    #[error("duplicate output '{output}': produced by both '{first}' and '{second}'")]
    DuplicateOutput {
        output: String,
        first: String,
        second: String,
    },

    /// Arithmetic between quantities of different kinds
    #[error("cannot combine '{left}' with '{right}'")]
    IdentityMismatch { left: String, right: String },

    /// Quantity subtraction would go negative
    #[error("cannot subtract {requested} from {available}x {identity}")]
    InsufficientAmount {
        identity: String,
        available: u64,
        requested: u64,
    },

    /// Inventory take would go negative
    #[error("insufficient stock of '{identity}': have {available}, need {requested}")]
    InsufficientStock {
        identity: String,
        available: u64,
        requested: u64,
    },

    /// Resolution revisited an identity still in progress
    #[error("cyclic dependency: {}", chain.join(" -> "))]
    CyclicDependency { chain: Vec<String> },

    /// A tag with no members in the tag table
    #[error("unknown tag '{tag}': no items carry it")]
    UnknownTag { tag: String },

    /// An amount no longer fits in a `u64`
    #[error("amount of '{identity}' overflows")]
    AmountOverflow { identity: String },

    /// Resolution chain grew past the configured bound
    #[error("resolution depth exceeded limit of {limit}")]
    DepthExceeded { limit: usize },

    /// Target names neither a recipe nor a produced item
    #[error("no recipe named or producing '{0}'")]
    UnknownRecipe(String),

    /// I/O failure reading or writing a source file
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Syntax error in a recipe source, tag table or config
    #[error("parse error in {path}: {message}")]
    Parse { path: String, message: String },
}

impl CraftError {
    pub(crate) fn overflow(identity: &impl std::fmt::Display) -> Self {
        Self::AmountOverflow {
            identity: identity.to_string(),
        }
    }

    pub(crate) fn invalid(recipe: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRecipe {
            recipe: recipe.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias for craftplan operations.
pub type Result<T> = std::result::Result<T, CraftError>;
