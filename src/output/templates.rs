// Template engine for generating Markdown pages

use crate::catalog::{Diagram, Package, Project, SequenceDiagram};
use crate::error::Result;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tera::{Context, Tera, Value};

const PROJECT_TEMPLATE: &str = "project.md";
const PACKAGE_TEMPLATE: &str = "package.md";

/// Template engine wrapping Tera with the catalog page templates
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Create a new template engine with embedded templates
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            (PROJECT_TEMPLATE, include_str!("../../templates/project.md.tera")),
            (PACKAGE_TEMPLATE, include_str!("../../templates/package.md.tera")),
        ])?;
        tera.register_filter("image", image);
        tera.register_filter("embed", embed);

        Ok(Self { tera })
    }

    /// Create a template engine from a custom directory.
    ///
    /// The directory must provide `project.md.tera` and `package.md.tera`.
    pub fn from_dir(template_dir: &str) -> Result<Self> {
        let mut tera = Tera::default();

        let dir = std::path::Path::new(template_dir);
        tera.add_template_files(vec![
            (dir.join("project.md.tera"), Some(PROJECT_TEMPLATE)),
            (dir.join("package.md.tera"), Some(PACKAGE_TEMPLATE)),
        ])?;
        tera.register_filter("image", image);
        tera.register_filter("embed", embed);

        Ok(Self { tera })
    }

    /// Render the root page
    pub fn render_project(&self, project: &Project) -> Result<String> {
        let mut context = Context::new();
        context.insert("title", project.title());
        context.insert("packages", &project.alphabetical_rows());
        context.insert("integration", &project.integration());
        context.insert("integration_epa", &project.integration_epa());

        Ok(self.tera.render(PROJECT_TEMPLATE, &context)?)
    }

    /// Render one package page
    pub fn render_package(&self, package: &Package) -> Result<String> {
        let sequences = package.sorted_sequence_diagrams();

        let services: Vec<ServiceRow> = sequences
            .iter()
            .map(|s| ServiceRow {
                app: &s.app_name,
                endpoint: &s.endpoint_name,
                anchor: anchor(&format!("{} {}", s.app_name, s.endpoint_name)),
            })
            .collect();

        let mut apps: Vec<AppBlock> = Vec::new();
        for &seq in &sequences {
            match apps.last_mut() {
                Some(block) if block.name == seq.app_name => block.sequences.push(seq),
                _ => apps.push(AppBlock {
                    name: &seq.app_name,
                    comment: seq.app_comment.as_deref(),
                    sequences: vec![seq],
                }),
            }
        }

        let mut databases: Vec<DatabaseRow> = package
            .data_model_diagrams()
            .iter()
            .map(|d| DatabaseRow {
                app_name: &d.app_name,
                anchor: anchor(&format!("Database {}", d.app_name)),
                diagram: d,
            })
            .collect();
        databases.sort_by(|a, b| a.app_name.cmp(b.app_name));

        let mut context = Context::new();
        context.insert("package_name", &package.name);
        context.insert("services", &services);
        context.insert("apps", &apps);
        context.insert("databases", &databases);
        context.insert("integration", &package.integration);
        context.insert("types", &type_rows(&sequences));

        Ok(self.tera.render(PACKAGE_TEMPLATE, &context)?)
    }

    /// Get the underlying Tera instance for advanced usage
    pub fn tera(&self) -> &Tera {
        &self.tera
    }
}

#[derive(Debug, Serialize)]
struct ServiceRow<'a> {
    app: &'a str,
    endpoint: &'a str,
    anchor: String,
}

#[derive(Debug, Serialize)]
struct AppBlock<'a> {
    name: &'a str,
    comment: Option<&'a str>,
    sequences: Vec<&'a SequenceDiagram>,
}

#[derive(Debug, Serialize)]
struct DatabaseRow<'a> {
    app_name: &'a str,
    anchor: String,
    diagram: &'a Diagram,
}

#[derive(Debug, Serialize)]
struct TypeRow<'a> {
    app: &'a str,
    name: &'a str,
    comment: &'a str,
    diagram: &'a Diagram,
}

/// One row per distinct named type used by the package's endpoints
fn type_rows<'a>(sequences: &[&'a SequenceDiagram]) -> Vec<TypeRow<'a>> {
    let mut rows: BTreeMap<String, TypeRow<'a>> = BTreeMap::new();
    for &seq in sequences {
        for diagram in seq.input_data_model.iter().chain(seq.output_data_model.iter()) {
            let Some(reference) = &diagram.type_ref else {
                continue;
            };
            rows.entry(reference.to_string()).or_insert_with(|| TypeRow {
                app: &reference.app,
                name: &reference.name,
                comment: diagram.comment.as_deref().unwrap_or_default(),
                diagram,
            });
        }
    }
    rows.into_values().collect()
}

/// Extension of Mermaid sources, which viewers render from fenced blocks
const MERMAID_EXTENSION: &str = ".mmd";

/// Reference a diagram file from its page.
///
/// Mermaid sources are linked, anything else is embedded as an image.
fn image(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let (alt, file) = diagram_file(value)?;
    Ok(Value::String(file_reference(alt, file)))
}

/// Show a diagram inline: Mermaid sources as a fenced block followed by a
/// link to the file, anything else as an image
fn embed(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let (alt, file) = diagram_file(value)?;
    let reference = file_reference(alt, file);
    if !file.ends_with(MERMAID_EXTENSION) {
        return Ok(Value::String(reference));
    }

    let payload = value
        .get("payload")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    Ok(Value::String(format!(
        "```mermaid\n{}\n```\n\n{}",
        payload, reference
    )))
}

/// Alt text and file name of a serialized diagram
fn diagram_file(value: &Value) -> tera::Result<(&str, &str)> {
    let file = value
        .get("output_file")
        .and_then(|v| v.as_str())
        .ok_or_else(|| tera::Error::msg("expected a diagram"))?;

    let field = |key: &str| value.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty());
    let alt = field("type_name")
        .or_else(|| field("endpoint_name"))
        .or_else(|| field("app_name"))
        .unwrap_or("diagram");

    Ok((alt, file))
}

fn file_reference(alt: &str, file: &str) -> String {
    if file.ends_with(MERMAID_EXTENSION) {
        format!("[{}]({})", alt, file)
    } else {
        format!("![{}]({})", alt, file)
    }
}

/// Anchor GitHub generates for a Markdown heading
pub fn anchor(heading: &str) -> String {
    heading
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}
