use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub catalog: CatalogConfig,
    pub output: OutputConfig,
    pub diagrams: DiagramConfig,
}

/// Project metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub title: String,
}

/// Catalog assembly settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Attribute that excludes an application or endpoint
    pub ignore_marker: String,
    /// Attribute that marks an application as a database
    pub database_marker: String,
    /// Worker threads used to assemble sequence diagrams
    pub jobs: usize,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

/// Diagram settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    /// How many levels of calls a sequence diagram follows
    pub max_depth: usize,
    /// Layout direction of integration diagrams
    pub direction: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            title: "Catalog".to_string(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            ignore_marker: "ignore".to_string(),
            database_marker: "db".to_string(),
            jobs: 1,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./apicatalog-docs"),
        }
    }
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            direction: "LR".to_string(),
        }
    }
}

const DIRECTIONS: [&str; 5] = ["TB", "TD", "BT", "LR", "RL"];

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file or return defaults
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(
        &mut self,
        output: Option<PathBuf>,
        title: Option<String>,
        jobs: Option<usize>,
    ) {
        if let Some(out) = output {
            self.output.directory = out;
        }

        if let Some(title) = title {
            self.project.title = title;
        }

        if let Some(jobs) = jobs {
            self.catalog.jobs = jobs;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.catalog.jobs == 0 {
            return Err(Error::config_validation("jobs must be at least 1"));
        }

        if self.catalog.ignore_marker.trim().is_empty() {
            return Err(Error::config_validation("ignore_marker cannot be empty"));
        }

        if self.catalog.database_marker.trim().is_empty() {
            return Err(Error::config_validation("database_marker cannot be empty"));
        }

        if self.diagrams.max_depth == 0 {
            return Err(Error::config_validation("max_depth must be at least 1"));
        }

        if self.diagrams.max_depth > 32 {
            return Err(Error::config_validation("max_depth cannot exceed 32"));
        }

        if !DIRECTIONS.contains(&self.diagrams.direction.as_str()) {
            return Err(Error::config_validation(format!(
                "direction must be one of {}",
                DIRECTIONS.join(", ")
            )));
        }

        Ok(())
    }
}
