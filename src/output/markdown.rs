// Markdown catalog writer
//
// Renders the root page, one page per package and every diagram file,
// then writes them below the project's output directory.

use crate::catalog::{Project, PAGE_FILENAME};
use crate::error::Result;
use crate::output::templates::TemplateEngine;
use log::{debug, info};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Markdown site generator
pub struct MarkdownGenerator {
    template_engine: TemplateEngine,
}

impl MarkdownGenerator {
    /// Create a generator using the embedded templates
    pub fn new() -> Result<Self> {
        Ok(Self {
            template_engine: TemplateEngine::new()?,
        })
    }

    /// Create a generator using templates from a directory
    pub fn from_dir(template_dir: &str) -> Result<Self> {
        Ok(Self {
            template_engine: TemplateEngine::from_dir(template_dir)?,
        })
    }

    /// Render every page and diagram of an assembled project, keyed by path
    pub fn render(&self, project: &Project) -> Result<RenderedCatalog> {
        let mut rendered = RenderedCatalog::default();

        let root = project.output_dir().join(PAGE_FILENAME);
        rendered
            .pages
            .insert(root, self.template_engine.render_project(project)?);

        for package in project.alphabetical_rows() {
            let page = self.template_engine.render_package(package)?;
            rendered
                .pages
                .insert(package.output_dir.join(&package.output_file), page);
        }

        for diagram in project.diagrams() {
            rendered
                .diagrams
                .insert(diagram.output_path(), diagram.payload.clone());
        }

        Ok(rendered)
    }

    /// Render the project, then write it to disk.
    ///
    /// Nothing is written if any page fails to render.
    pub fn generate(&self, project: &Project) -> Result<GenerationReport> {
        let rendered = self.render(project)?;

        fs::create_dir_all(project.output_dir())?;
        for (path, contents) in rendered.pages.iter().chain(rendered.diagrams.iter()) {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            debug!("Writing {}", path.display());
            fs::write(path, contents)?;
        }

        let report = GenerationReport {
            pages_generated: rendered.pages.len(),
            diagrams_generated: rendered.diagrams.len(),
            packages: project.packages().len(),
            skipped: project.skipped().len(),
        };
        info!("{}", report.summary());
        Ok(report)
    }
}

/// Page and diagram contents ready to be written
#[derive(Debug, Default)]
pub struct RenderedCatalog {
    pub pages: BTreeMap<PathBuf, String>,
    pub diagrams: BTreeMap<PathBuf, String>,
}

/// Report of what was generated
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub pages_generated: usize,
    pub diagrams_generated: usize,
    pub packages: usize,
    pub skipped: usize,
}

impl GenerationReport {
    pub fn summary(&self) -> String {
        format!(
            "Generated {} pages and {} diagrams for {} packages ({} skipped)",
            self.pages_generated, self.diagrams_generated, self.packages, self.skipped
        )
    }
}
