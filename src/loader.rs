//! Specification loading.
//!
//! A specification is a JSON or TOML file holding an `apps` table, or a
//! directory of such files that are merged into one [`Module`].

use crate::error::{Error, Result};
use crate::model::Module;
use log::debug;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Load a specification file or directory
pub fn load_module(path: &Path) -> Result<Module> {
    if !path.exists() {
        return Err(Error::PathNotFound(path.to_path_buf()));
    }

    if !path.is_dir() {
        let mut module = parse_file(path)?;
        module.normalize_names();
        return Ok(module);
    }

    let files = discover_spec_files(path)?;
    debug!("Loading {} specification files from {}", files.len(), path.display());

    let mut module = Module::new();
    for file in &files {
        let part = parse_file(file)?;
        for (name, app) in part.apps {
            if module.apps.contains_key(&name) {
                return Err(Error::DuplicateApplication(name));
            }
            module.apps.insert(name, app);
        }
    }

    module.normalize_names();
    Ok(module)
}

/// Find all spec files under a directory, sorted by path
fn discover_spec_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && SpecFormat::from_path(path).is_some() {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

fn parse_file(path: &Path) -> Result<Module> {
    let format = SpecFormat::from_path(path)
        .ok_or_else(|| Error::spec_parse(path, "expected a .json or .toml file"))?;
    let contents = std::fs::read_to_string(path)?;

    debug!("Parsing {}", path.display());
    match format {
        SpecFormat::Json => {
            serde_json::from_str(&contents).map_err(|e| Error::spec_parse(path, e.to_string()))
        }
        SpecFormat::Toml => {
            toml::from_str(&contents).map_err(|e| Error::spec_parse(path, e.to_string()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpecFormat {
    Json,
    Toml,
}

impl SpecFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(SpecFormat::Json),
            Some("toml") => Some(SpecFormat::Toml),
            _ => None,
        }
    }
}
