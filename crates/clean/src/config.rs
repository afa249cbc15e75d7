use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::error::CleanError;
use crate::model::Table;
use crate::vocab::Vocabularies;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub name: String,
    pub inputs: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub vocabulary: VocabularyConfig,
}

// ---------------------------------------------------------------------------
// Inputs + outputs
// ---------------------------------------------------------------------------

/// CSV file per table. Relative paths resolve against the config file's directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    pub providers: String,
    pub receivers: String,
    pub food_listings: String,
    pub claims: String,
}

impl InputConfig {
    pub fn file(&self, table: Table) -> &str {
        match table {
            Table::Providers => &self.providers,
            Table::Receivers => &self.receivers,
            Table::FoodListings => &self.food_listings,
            Table::Claims => &self.claims,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    /// Defaults to `<dir>/rejects`.
    #[serde(default)]
    pub rejects_dir: Option<String>,
    /// Defaults to `<dir>/food_waste.db`.
    #[serde(default)]
    pub database: Option<String>,
}

fn default_output_dir() -> String {
    "cleaned_outputs".into()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            rejects_dir: None,
            database: None,
        }
    }
}

/// Extra aliases per categorical field, merged over the built-in vocabularies.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VocabularyConfig {
    #[serde(default)]
    pub provider_type: BTreeMap<String, String>,
    #[serde(default)]
    pub food_type: BTreeMap<String, String>,
    #[serde(default)]
    pub meal_type: BTreeMap<String, String>,
    #[serde(default)]
    pub status: BTreeMap<String, String>,
}

/// Output locations after resolving defaults and the config base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub inputs: BTreeMap<Table, PathBuf>,
    pub output_dir: PathBuf,
    pub rejects_dir: PathBuf,
    pub database: PathBuf,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl PipelineConfig {
    pub fn from_toml(input: &str) -> Result<Self, CleanError> {
        let config: PipelineConfig =
            toml::from_str(input).map_err(|e| CleanError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CleanError> {
        if self.name.trim().is_empty() {
            return Err(CleanError::ConfigValidation("name must not be empty".into()));
        }

        for table in Table::ALL {
            if self.inputs.file(table).trim().is_empty() {
                return Err(CleanError::ConfigValidation(format!(
                    "inputs.{}: path must not be empty",
                    table.stem()
                )));
            }
        }

        if self.output.dir.trim().is_empty() {
            return Err(CleanError::ConfigValidation("output.dir must not be empty".into()));
        }

        self.check_output_locations()?;

        // Surfaces alias cycles at load time rather than mid-run.
        self.vocabularies()?;
        Ok(())
    }

    /// Output locations must not share a directory with (or overwrite) an input.
    fn check_output_locations(&self) -> Result<(), CleanError> {
        let paths = self.resolve_paths(Path::new(""));
        let output_dir = lexical(&paths.output_dir);
        let rejects_dir = lexical(&paths.rejects_dir);
        let database = lexical(&paths.database);

        for (table, input) in &paths.inputs {
            let input = lexical(input);
            let input_dir = input.parent().map(Path::to_path_buf).unwrap_or_default();
            let clash = if input_dir == output_dir {
                Some("output.dir")
            } else if input_dir == rejects_dir {
                Some("output.rejects_dir")
            } else if input == database {
                Some("output.database")
            } else {
                None
            };
            if let Some(key) = clash {
                return Err(CleanError::ConfigValidation(format!(
                    "{key} would overwrite or share a directory with inputs.{}",
                    table.stem()
                )));
            }
        }
        Ok(())
    }

    /// Built-in vocabularies with this config's aliases merged in.
    pub fn vocabularies(&self) -> Result<Vocabularies, CleanError> {
        let mut vocab = Vocabularies::default();
        vocab.provider_type.extend(&self.vocabulary.provider_type)?;
        vocab.food_type.extend(&self.vocabulary.food_type)?;
        vocab.meal_type.extend(&self.vocabulary.meal_type)?;
        vocab.status.extend(&self.vocabulary.status)?;
        Ok(vocab)
    }

    pub fn resolve_paths(&self, base_dir: &Path) -> ResolvedPaths {
        let output_dir = base_dir.join(&self.output.dir);
        let rejects_dir = match &self.output.rejects_dir {
            Some(dir) => base_dir.join(dir),
            None => output_dir.join("rejects"),
        };
        let database = match &self.output.database {
            Some(db) => base_dir.join(db),
            None => output_dir.join("food_waste.db"),
        };
        let inputs = Table::ALL
            .into_iter()
            .map(|t| (t, base_dir.join(self.inputs.file(t))))
            .collect();
        ResolvedPaths {
            inputs,
            output_dir,
            rejects_dir,
            database,
        }
    }
}

/// `path` with `.` components dropped, so `./data` and `data` compare equal.
fn lexical(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
