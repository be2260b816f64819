//! Core crafting logic: value types, inventory, cookbook, resolution, loading.

pub mod cookbook;
pub mod error;
pub mod inventory;
pub mod parser;
pub mod resolver;
pub mod tags;
pub mod types;
