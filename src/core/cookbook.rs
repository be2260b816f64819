//! CP-003: Cookbook: the read-only index of every known recipe.
//!
//! Built once from validated recipes. Maps each output identity to the one
//! recipe producing it and derives the set of base ingredients: names that
//! some recipe consumes but no recipe produces.

use super::error::{CraftError, Result};
use super::types::{Identity, Recipe};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};

/// Immutable recipe index. Safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct Cookbook {
    /// Recipes by name, in source order
    recipes: IndexMap<String, Recipe>,
    /// Output identity → recipe name
    by_output: HashMap<Identity, String>,
    /// Consumed but never produced
    bases: BTreeSet<Identity>,
}

impl Cookbook {
    /// Index `recipes`.
    ///
    /// Fails with `InvalidRecipe` on a repeated recipe name and with
    /// `DuplicateOutput` when two recipes claim the same output.
    pub fn new(recipes: impl IntoIterator<Item = Recipe>) -> Result<Self> {
        let mut indexed: IndexMap<String, Recipe> = IndexMap::new();
        let mut by_output: HashMap<Identity, String> = HashMap::new();

        for recipe in recipes {
            if indexed.contains_key(recipe.name()) {
                return Err(CraftError::invalid(
                    recipe.name(),
                    "recipe name is defined more than once",
                ));
            }
            for output in recipe.outputs() {
                if let Some(first) = by_output.get(output.identity()) {
                    return Err(CraftError::DuplicateOutput {
                        output: output.identity().to_string(),
                        first: first.clone(),
                        second: recipe.name().to_string(),
                    });
                }
                by_output.insert(output.identity().clone(), recipe.name().to_string());
            }
            indexed.insert(recipe.name().to_string(), recipe);
        }

        let bases = indexed
            .values()
            .flat_map(Recipe::inputs)
            .map(|q| q.identity())
            .filter(|id| !id.is_tag() && !by_output.contains_key(*id))
            .cloned()
            .collect();

        Ok(Self {
            recipes: indexed,
            by_output,
            bases,
        })
    }

    /// The recipe producing `identity`, if any. Tags never have one.
    pub fn recipe_for(&self, identity: &Identity) -> Option<&Recipe> {
        self.by_output
            .get(identity)
            .and_then(|name| self.recipes.get(name))
    }

    /// A name identity that no recipe produces.
    pub fn is_base(&self, identity: &Identity) -> bool {
        !identity.is_tag() && !self.by_output.contains_key(identity)
    }

    pub fn recipe_named(&self, name: &str) -> Option<&Recipe> {
        self.recipes.get(name)
    }

    /// All recipes in source order.
    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }

    /// Names consumed by some recipe and produced by none, sorted.
    pub fn base_identities(&self) -> &BTreeSet<Identity> {
        &self.bases
    }

    /// Every tag referenced by some recipe input, sorted.
    pub fn referenced_tags(&self) -> BTreeSet<&str> {
        self.recipes
            .values()
            .flat_map(Recipe::inputs)
            .filter_map(|q| match q.identity() {
                Identity::Tag(tags) => Some(tags),
                Identity::Name(_) => None,
            })
            .flatten()
            .map(String::as_str)
            .collect()
    }

    /// True iff some recipe consumes `identity` directly.
    pub fn is_consumed(&self, identity: &Identity) -> bool {
        self.recipes
            .values()
            .flat_map(Recipe::inputs)
            .any(|q| q.identity() == identity)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}
