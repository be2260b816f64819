//! craftplan: crafting recipe resolver.
//!
//! Expands a target recipe into the base ingredients it needs, aggregating
//! repeated ingredients across the crafting tree and reusing over-produced
//! surplus between branches.

pub mod cli;
pub mod core;
