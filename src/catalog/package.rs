// Per-package aggregation of assembled diagrams

use super::diagram::{Diagram, SequenceDiagram};
use super::selector::alphabetical;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Page file written for every package and for the project root
pub const PAGE_FILENAME: &str = "README.md";

/// A documentation grouping of applications, one page per package
#[derive(Debug, Clone, Serialize)]
pub struct Package {
    pub name: String,
    pub output_dir: PathBuf,
    pub output_file: String,
    pub integration: Option<Diagram>,
    /// In traversal order; sort before presenting alphabetically
    pub sequence_diagrams: Vec<SequenceDiagram>,
    /// Unset until the package receives its first diagram
    pub data_model_diagrams: Option<Vec<Diagram>>,
}

impl Package {
    pub fn new(name: &str, output_root: &Path) -> Self {
        Self {
            name: name.to_string(),
            output_dir: output_root.join(name),
            output_file: PAGE_FILENAME.to_string(),
            integration: None,
            sequence_diagrams: Vec::new(),
            data_model_diagrams: None,
        }
    }

    pub fn data_model_diagrams(&self) -> &[Diagram] {
        self.data_model_diagrams.as_deref().unwrap_or_default()
    }

    /// Sequence diagrams ordered by (application, endpoint)
    pub fn sorted_sequence_diagrams(&self) -> Vec<&SequenceDiagram> {
        let mut diagrams: Vec<&SequenceDiagram> = self.sequence_diagrams.iter().collect();
        diagrams.sort_by(|a, b| {
            (&a.app_name, &a.endpoint_name).cmp(&(&b.app_name, &b.endpoint_name))
        });
        diagrams
    }

    /// Every diagram the package page embeds
    pub fn diagrams(&self) -> impl Iterator<Item = &Diagram> {
        self.integration
            .iter()
            .chain(self.sequence_diagrams.iter().flat_map(SequenceDiagram::diagrams))
            .chain(self.data_model_diagrams().iter())
    }
}

/// Owns the package map while a catalog is being assembled
#[derive(Debug)]
pub struct PackageAggregator {
    output_root: PathBuf,
    packages: HashMap<String, Package>,
}

impl PackageAggregator {
    pub fn new(output_root: &Path) -> Self {
        Self {
            output_root: output_root.to_path_buf(),
            packages: HashMap::new(),
        }
    }

    /// Directory a package's page and diagrams are written to
    pub fn package_dir(&self, package: &str) -> PathBuf {
        self.output_root.join(package)
    }

    fn entry(&mut self, package: &str) -> &mut Package {
        let root = &self.output_root;
        let entry = self
            .packages
            .entry(package.to_string())
            .or_insert_with(|| Package::new(package, root));
        entry.data_model_diagrams.get_or_insert_with(Vec::new);
        entry
    }

    /// Append an endpoint's sequence diagram to its package
    pub fn register(&mut self, package: &str, diagram: SequenceDiagram) {
        self.entry(package).sequence_diagrams.push(diagram);
    }

    /// Append a data model diagram (such as a database schema) to a package
    pub fn add_data_model(&mut self, package: &str, diagram: Diagram) {
        self.entry(package)
            .data_model_diagrams
            .get_or_insert_with(Vec::new)
            .push(diagram);
    }

    pub fn set_integration(&mut self, package: &str, diagram: Diagram) {
        self.entry(package).integration = Some(diagram);
    }

    /// Order each package's sequence diagrams by (application, endpoint)
    pub fn sort(&mut self) {
        for package in self.packages.values_mut() {
            package.sequence_diagrams.sort_by(|a, b| {
                (&a.app_name, &a.endpoint_name).cmp(&(&b.app_name, &b.endpoint_name))
            });
        }
    }

    pub fn package_names(&self) -> Vec<String> {
        alphabetical(&self.packages).into_iter().cloned().collect()
    }

    pub fn into_packages(self) -> HashMap<String, Package> {
        self.packages
    }
}
