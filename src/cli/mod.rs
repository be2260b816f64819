//! CP-006: CLI subcommands: init, validate, bases, resolve.

use crate::core::error::CraftError;
use crate::core::tags::TagTable;
use crate::core::{cookbook, parser, resolver, types};
use clap::Subcommand;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter recipes.json and tags.json
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Validate a recipe source and tag table without resolving anything
    Validate {
        /// Path to the recipe source (JSON, or YAML by extension)
        #[arg(short, long, default_value = "recipes.json")]
        recipes: PathBuf,

        /// Path to the tag table
        #[arg(short, long)]
        tags: Option<PathBuf>,
    },

    /// List base ingredients (consumed by some recipe, produced by none)
    Bases {
        /// Path to the recipe source
        #[arg(short, long, default_value = "recipes.json")]
        recipes: PathBuf,
    },

    /// Expand a target into the base ingredients it needs
    Resolve {
        /// Recipe name, or the name of the item it produces
        target: String,

        /// Units of the target's primary output to make
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u64,

        /// Path to the recipe source
        #[arg(short, long, default_value = "recipes.json")]
        recipes: PathBuf,

        /// Path to the tag table
        #[arg(short, long)]
        tags: Option<PathBuf>,

        /// Resolver config (YAML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the maximum resolution depth
        #[arg(long)]
        max_depth: Option<usize>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { recipes, tags } => cmd_validate(&recipes, tags.as_deref()),
        Commands::Bases { recipes } => cmd_bases(&recipes),
        Commands::Resolve {
            target,
            count,
            recipes,
            tags,
            config,
            max_depth,
            json,
        } => cmd_resolve(
            &target,
            count,
            &recipes,
            tags.as_deref(),
            config.as_deref(),
            max_depth,
            json,
        ),
    }
}

const STARTER_RECIPES: &str = r#"[
  {
    "name": "Plank",
    "stations": ["Sawmill"],
    "inputs": [{"name": "Log", "tags": null, "amount": 1}],
    "outputs": [{"name": "Plank", "amount": 4}]
  },
  {
    "name": "Stick",
    "stations": [],
    "inputs": [{"name": "Plank", "tags": null, "amount": 2}],
    "outputs": [{"name": "Stick", "amount": 4}]
  },
  {
    "name": "Torch",
    "stations": ["Workbench"],
    "inputs": [
      {"name": "Stick", "tags": null, "amount": 1},
      {"name": "CoalDust", "tags": null, "amount": 1}
    ],
    "outputs": [{"name": "Torch", "amount": 4}]
  },
  {
    "name": "Tool Handle",
    "stations": ["Workbench"],
    "inputs": [{"name": null, "tags": ["wood"], "amount": 1}],
    "outputs": [{"name": "Tool Handle", "amount": 1}]
  }
]
"#;

const STARTER_TAGS: &str = r#"{
  "wood": ["Plank", "Log"]
}
"#;

fn cmd_init(path: &Path) -> Result<(), String> {
    let recipes_path = path.join("recipes.json");
    let tags_path = path.join("tags.json");
    for existing in [&recipes_path, &tags_path] {
        if existing.exists() {
            return Err(format!("{} already exists", existing.display()));
        }
    }

    std::fs::create_dir_all(path)
        .map_err(|e| format!("cannot create {}: {}", path.display(), e))?;
    std::fs::write(&recipes_path, STARTER_RECIPES)
        .map_err(|e| format!("cannot write {}: {}", recipes_path.display(), e))?;
    std::fs::write(&tags_path, STARTER_TAGS)
        .map_err(|e| format!("cannot write {}: {}", tags_path.display(), e))?;

    println!("Initialized recipe book at {}", path.display());
    println!("  Created: {}", recipes_path.display());
    println!("  Created: {}", tags_path.display());
    Ok(())
}

/// Load the cookbook and (optional) tag table.
fn load_sources(
    recipes: &Path,
    tags: Option<&Path>,
) -> Result<(cookbook::Cookbook, TagTable), String> {
    let book = parser::load_cookbook(recipes).map_err(|e| e.to_string())?;
    let table = match tags {
        Some(path) => parser::load_tags(path).map_err(|e| e.to_string())?,
        None => {
            debug!("no tag table given, using an empty one");
            TagTable::new()
        }
    };
    Ok((book, table))
}

fn cmd_validate(recipes: &Path, tags: Option<&Path>) -> Result<(), String> {
    let (book, table) = load_sources(recipes, tags)?;
    let findings = parser::validate_sources(&book, &table);

    let mut errors = 0;
    for finding in &findings {
        match finding.severity {
            parser::Severity::Error => {
                errors += 1;
                eprintln!("  ERROR: {}", finding);
            }
            parser::Severity::Warning => eprintln!("  WARN: {}", finding),
        }
    }

    if errors > 0 {
        return Err(format!("{} validation error(s)", errors));
    }
    println!(
        "OK: {} ({} recipes, {} base ingredients, {} tags)",
        recipes.display(),
        book.len(),
        book.base_identities().len(),
        table.len()
    );
    Ok(())
}

fn cmd_bases(recipes: &Path) -> Result<(), String> {
    let book = parser::load_cookbook(recipes).map_err(|e| e.to_string())?;
    for base in book.base_identities() {
        println!("{}", base);
    }
    Ok(())
}

/// Find a recipe by name, falling back to the recipe producing an item of
/// that name.
fn find_target<'a>(
    book: &'a cookbook::Cookbook,
    target: &str,
) -> Result<&'a types::Recipe, String> {
    book.recipe_named(target)
        .or_else(|| book.recipe_for(&types::Identity::name(target)))
        .ok_or_else(|| CraftError::UnknownRecipe(target.to_string()).to_string())
}

/// Resolver config from an optional file, with the CLI override applied.
fn load_resolver_config(
    config: Option<&Path>,
    max_depth: Option<usize>,
) -> Result<types::ResolverConfig, String> {
    let mut resolved = match config {
        Some(path) => parser::load_config(path).map_err(|e| e.to_string())?,
        None => types::ResolverConfig::default(),
    };
    if let Some(depth) = max_depth {
        resolved.max_depth = depth;
    }
    Ok(resolved)
}

fn cmd_resolve(
    target: &str,
    count: u64,
    recipes: &Path,
    tags: Option<&Path>,
    config: Option<&Path>,
    max_depth: Option<usize>,
    json: bool,
) -> Result<(), String> {
    let (book, table) = load_sources(recipes, tags)?;
    let config = load_resolver_config(config, max_depth)?;
    let recipe = find_target(&book, target)?;
    if count == 0 {
        warn!(recipe = recipe.name(), "count is 0, nothing to resolve");
    }

    info!(recipe = recipe.name(), count, max_depth = config.max_depth, "resolving");
    let resolution = resolver::Resolver::new(&book, &table)
        .with_config(config)
        .resolve(recipe, count)
        .map_err(|e| e.to_string())?;

    if json {
        let out = serde_json::to_string_pretty(&resolution)
            .map_err(|e| format!("cannot serialize result: {}", e))?;
        println!("{}", out);
    } else {
        print!("{}", render_resolution(recipe, count, &resolution));
    }
    Ok(())
}

/// Render a resolution as text.
fn render_resolution(
    recipe: &types::Recipe,
    count: u64,
    resolution: &resolver::Resolution,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Resolving: {}x {} (recipe {})",
        count,
        recipe.primary_output().identity(),
        recipe.name()
    );
    out.push('\n');

    out.push_str("Base ingredients:\n");
    if resolution.needed.is_empty() {
        out.push_str("  (none)\n");
    }
    for (identity, amount) in resolution.needed.iter() {
        let _ = writeln!(out, "  {}x {}", amount, identity);
    }
    if resolution.needed.len() > 1 {
        let _ = writeln!(out, "  ({} units total)", resolution.needed.total_units());
    }

    if !resolution.crafts.is_empty() {
        out.push_str("\nCrafts:\n");
        for (name, batches) in &resolution.crafts {
            let _ = writeln!(out, "  {} x{}", name, batches);
        }
    }

    if !resolution.stations.is_empty() {
        let stations: Vec<&str> = resolution.stations.iter().map(String::as_str).collect();
        let _ = writeln!(out, "\nStations: {}", stations.join(", "));
    }

    if !resolution.surplus.is_empty() {
        out.push_str("\nSurplus:\n");
        for (identity, amount) in resolution.surplus.iter() {
            let _ = writeln!(out, "  {}x {}", amount, identity);
        }
    }
    out
}
