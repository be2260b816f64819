//! CP-005: Recipe-source loading and validation.
//!
//! Parses recipe sources (a JSON array of recipe objects, or the same schema
//! in YAML for `.yaml`/`.yml` files), tag tables and resolver config.
//! Structural problems surface as `InvalidRecipe`/`DuplicateOutput`, and a
//! cookbook is only returned when every recipe is valid.

use super::cookbook::Cookbook;
use super::error::{CraftError, Result};
use super::tags::TagTable;
use super::types::{Identity, Quantity, Recipe, ResolverConfig};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

// ============================================================================
// Source schema
// ============================================================================

/// One recipe as written in a recipe source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDef {
    pub name: String,
    #[serde(default)]
    pub stations: Vec<String>,
    #[serde(default)]
    pub inputs: Vec<InputDef>,
    pub outputs: Vec<OutputDef>,
}

/// A recipe input: exactly one of `name` or `tags`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputDef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    pub amount: i64,
}

/// A recipe output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputDef {
    pub name: String,
    pub amount: i64,
}

impl RecipeDef {
    /// Validate and convert into a `Recipe`.
    pub fn into_recipe(self) -> Result<Recipe> {
        let name = self.name;

        let mut inputs = Vec::with_capacity(self.inputs.len());
        for (i, input) in self.inputs.into_iter().enumerate() {
            let identity = Identity::from_parts(input.name, input.tags).map_err(|reason| {
                CraftError::invalid(&name, format!("input #{}: {}", i + 1, reason))
            })?;
            let amount = positive_amount(&name, &identity, input.amount)?;
            inputs.push(Quantity::new(identity, amount));
        }

        let mut outputs = Vec::with_capacity(self.outputs.len());
        for output in self.outputs {
            let identity = Identity::from_parts(Some(output.name), None)
                .map_err(|reason| CraftError::invalid(&name, format!("output: {}", reason)))?;
            let amount = positive_amount(&name, &identity, output.amount)?;
            outputs.push(Quantity::new(identity, amount));
        }

        Recipe::new(name, self.stations, inputs, outputs)
    }
}

fn positive_amount(recipe: &str, identity: &Identity, amount: i64) -> Result<u64> {
    match u64::try_from(amount) {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(CraftError::invalid(
            recipe,
            format!("'{}' must have amount >= 1, got {}", identity, amount),
        )),
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Serialization format of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Yaml,
}

impl SourceFormat {
    /// YAML for `.yaml`/`.yml`, JSON otherwise.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

fn parse_as<T: DeserializeOwned>(text: &str, format: SourceFormat, origin: &str) -> Result<T> {
    let parsed: std::result::Result<T, String> = match format {
        SourceFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        SourceFormat::Yaml => serde_yaml_ng::from_str(text).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| CraftError::Parse {
        path: origin.to_string(),
        message,
    })
}

fn read_source(path: &Path) -> Result<String> {
    debug!(path = %path.display(), "reading source");
    std::fs::read_to_string(path).map_err(|source| CraftError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse and validate recipes from source text.
pub fn parse_recipes_as(text: &str, format: SourceFormat, origin: &str) -> Result<Vec<Recipe>> {
    let defs: Vec<RecipeDef> = parse_as(text, format, origin)?;
    defs.into_iter().map(RecipeDef::into_recipe).collect()
}

/// Parse and validate recipes from a JSON string.
pub fn parse_recipes(json: &str) -> Result<Vec<Recipe>> {
    parse_recipes_as(json, SourceFormat::Json, "<string>")
}

/// Load recipes from a file.
pub fn load_recipes(path: &Path) -> Result<Vec<Recipe>> {
    let text = read_source(path)?;
    parse_recipes_as(&text, SourceFormat::from_path(path), &path.display().to_string())
}

/// Load recipes from a file and index them.
pub fn load_cookbook(path: &Path) -> Result<Cookbook> {
    let cookbook = Cookbook::new(load_recipes(path)?)?;
    info!(
        path = %path.display(),
        recipes = cookbook.len(),
        bases = cookbook.base_identities().len(),
        "loaded cookbook"
    );
    Ok(cookbook)
}

/// Parse a tag table from a JSON string.
pub fn parse_tags(json: &str) -> Result<TagTable> {
    parse_as(json, SourceFormat::Json, "<string>")
}

/// Load a tag table from a file.
pub fn load_tags(path: &Path) -> Result<TagTable> {
    let text = read_source(path)?;
    let origin = path.display().to_string();
    let tags: TagTable = parse_as(&text, SourceFormat::from_path(path), &origin)?;
    info!(path = %path.display(), tags = tags.len(), "loaded tag table");
    Ok(tags)
}

/// Load resolver config from a YAML file.
pub fn load_config(path: &Path) -> Result<ResolverConfig> {
    let text = read_source(path)?;
    parse_as(&text, SourceFormat::Yaml, &path.display().to_string())
}

// ============================================================================
// Validation
// ============================================================================

/// How serious a validation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A cross-reference problem between a cookbook and its tag table.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Check a loaded cookbook against a tag table. Returns findings (empty =
/// clean).
///
/// - Error: an input references a tag with no members.
/// - Warning: a tag member that no recipe produces or consumes.
/// - Warning: a recipe consumes a tag that its own output carries.
pub fn validate_sources(cookbook: &Cookbook, tags: &TagTable) -> Vec<ValidationError> {
    let mut findings = Vec::new();

    for tag in cookbook.referenced_tags() {
        if !tags.contains(tag) {
            findings.push(ValidationError {
                severity: Severity::Error,
                message: format!("tag '{}' is referenced but has no members", tag),
            });
        }
    }

    for (tag, members) in tags.iter() {
        for member in members {
            let identity = Identity::name(member.as_str());
            if cookbook.recipe_for(&identity).is_none() && !cookbook.is_consumed(&identity) {
                findings.push(ValidationError {
                    severity: Severity::Warning,
                    message: format!(
                        "tag '{}' member '{}' is not produced or consumed by any recipe",
                        tag, member
                    ),
                });
            }
        }
    }

    for recipe in cookbook.recipes() {
        for input in recipe.inputs() {
            let Identity::Tag(consumed) = input.identity() else {
                continue;
            };
            for item in recipe.outputs().iter().filter_map(|q| q.identity().as_name()) {
                for tag in consumed.iter().filter(|tag| tags.carries(item, tag)) {
                    findings.push(ValidationError {
                        severity: Severity::Warning,
                        message: format!(
                            "recipe '{}' consumes tag '{}' but its output '{}' carries it",
                            recipe.name(),
                            tag,
                            item
                        ),
                    });
                }
            }
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    const TORCH_JSON: &str = r#"[
  {"name": "Plank", "stations": ["Sawmill"],
   "inputs": [{"name": "Log", "tags": null, "amount": 1}],
   "outputs": [{"name": "Plank", "amount": 4}]},
  {"name": "Stick", "stations": [],
   "inputs": [{"name": "Plank", "amount": 2}],
   "outputs": [{"name": "Stick", "amount": 4}]},
  {"name": "Torch", "stations": ["Workbench"],
   "inputs": [{"name": "Stick", "amount": 1}, {"name": null, "tags": ["coal"], "amount": 1}],
   "outputs": [{"name": "Torch", "amount": 4}]}
]"#;

    #[test]
    fn test_cp005_parse_recipes() {
        let recipes = parse_recipes(TORCH_JSON).unwrap();
        assert_eq!(recipes.len(), 3);
        assert_eq!(recipes[0].name(), "Plank");
        assert_eq!(recipes[2].inputs()[1], Quantity::tag(["coal"], 1));
        assert!(recipes[2].stations().contains("Workbench"));
    }

    #[test]
    fn test_cp005_input_with_name_and_tags() {
        let json = r#"[{"name": "X", "inputs": [{"name": "A", "tags": ["t"], "amount": 1}],
                        "outputs": [{"name": "X", "amount": 1}]}]"#;
        let err = parse_recipes(json).unwrap_err();
        assert!(matches!(err, CraftError::InvalidRecipe { .. }));
        assert!(err.to_string().contains("both"));
    }

    #[test]
    fn test_cp005_input_with_neither() {
        let json = r#"[{"name": "X", "inputs": [{"amount": 1}],
                        "outputs": [{"name": "X", "amount": 1}]}]"#;
        let err = parse_recipes(json).unwrap_err();
        assert!(err.to_string().contains("input #1"));
    }

    #[test]
    fn test_cp005_non_positive_amounts() {
        for amount in ["0", "-3"] {
            let json = format!(
                r#"[{{"name": "X", "inputs": [{{"name": "A", "amount": {amount}}}],
                     "outputs": [{{"name": "X", "amount": 1}}]}}]"#
            );
            let err = parse_recipes(&json).unwrap_err();
            assert!(matches!(err, CraftError::InvalidRecipe { .. }), "{amount}");
        }
        let json = r#"[{"name": "X", "inputs": [], "outputs": [{"name": "X", "amount": 0}]}]"#;
        assert!(matches!(
            parse_recipes(json).unwrap_err(),
            CraftError::InvalidRecipe { .. }
        ));
    }

    #[test]
    fn test_cp005_syntax_error() {
        let err = parse_recipes("[{not json").unwrap_err();
        assert!(matches!(err, CraftError::Parse { .. }));
    }

    #[test]
    fn test_cp005_duplicate_output_aborts_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipes.json");
        std::fs::write(
            &path,
            r#"[{"name": "Iron Gear", "inputs": [{"name": "Iron", "amount": 2}],
                 "outputs": [{"name": "Gear", "amount": 1}]},
                {"name": "Stone Gear", "inputs": [{"name": "Stone", "amount": 4}],
                 "outputs": [{"name": "Gear", "amount": 1}]}]"#,
        )
        .unwrap();
        let err = load_cookbook(&path).unwrap_err();
        assert!(matches!(err, CraftError::DuplicateOutput { .. }));
    }

    #[test]
    fn test_cp005_load_yaml_recipes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipes.yaml");
        std::fs::write(
            &path,
            r#"
- name: Plank
  inputs:
    - name: Log
      amount: 1
  outputs:
    - name: Plank
      amount: 4
"#,
        )
        .unwrap();
        let book = load_cookbook(&path).unwrap();
        assert_eq!(book.len(), 1);
        assert!(book.is_base(&Identity::name("Log")));
    }

    #[test]
    fn test_cp005_missing_file() {
        let err = load_recipes(Path::new("/nonexistent/recipes.json")).unwrap_err();
        assert!(matches!(err, CraftError::Io { .. }));
    }

    #[test]
    fn test_cp005_load_tags_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let tags_path = dir.path().join("tags.json");
        std::fs::write(&tags_path, r#"{"wood": ["Plank", "Log"]}"#).unwrap();
        let tags = load_tags(&tags_path).unwrap();
        assert_eq!(tags.members("wood").unwrap()[0], "Plank");

        let config_path = dir.path().join("craftplan.yaml");
        std::fs::write(&config_path, "max_depth: 12\n").unwrap();
        assert_eq!(load_config(&config_path).unwrap().max_depth, 12);
    }

    #[test]
    fn test_cp005_validate_sources() {
        let book = Cookbook::new(parse_recipes(TORCH_JSON).unwrap()).unwrap();
        let findings = validate_sources(&book, &TagTable::new());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert!(findings[0].message.contains("'coal'"));

        let tags = parse_tags(r#"{"coal": ["Coal", "Charcoal"], "wood": ["Log"]}"#).unwrap();
        let findings = validate_sources(&book, &tags);
        assert!(findings.iter().all(|f| f.severity == Severity::Warning));
        // Log is consumed by Plank, so only the two coal members are flagged
        assert_eq!(findings.len(), 2);
    }

    #[test]
    fn test_cp005_validate_self_tagged_output() {
        let json = r#"[{"name": "Plank", "inputs": [{"tags": ["wood"], "amount": 1}],
                        "outputs": [{"name": "Plank", "amount": 4}]}]"#;
        let book = Cookbook::new(parse_recipes(json).unwrap()).unwrap();
        let tags = parse_tags(r#"{"wood": ["Plank", "Log"]}"#).unwrap();
        let findings = validate_sources(&book, &tags);
        // Log is neither produced nor consumed, and Plank feeds its own tag
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.severity == Severity::Warning));
        assert!(findings[1]
            .message
            .contains("recipe 'Plank' consumes tag 'wood' but its output 'Plank' carries it"));
    }

    #[test]
    fn test_cp005_source_format() {
        assert_eq!(SourceFormat::from_path(Path::new("a.yml")), SourceFormat::Yaml);
        assert_eq!(SourceFormat::from_path(Path::new("a.yaml")), SourceFormat::Yaml);
        assert_eq!(SourceFormat::from_path(Path::new("a.json")), SourceFormat::Json);
        assert_eq!(SourceFormat::from_path(Path::new("recipes")), SourceFormat::Json);
    }
}
