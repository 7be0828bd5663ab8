// Rendered diagram records

use crate::model::TypeReference;
use serde::Serialize;
use std::path::PathBuf;

/// What a diagram depicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramKind {
    Sequence,
    DataModel,
    Database,
    Integration,
}

/// A rendered artifact and where it is written
#[derive(Debug, Clone, Serialize)]
pub struct Diagram {
    pub kind: DiagramKind,
    /// Owning application (empty for project-wide diagrams)
    pub app_name: String,
    /// Owning endpoint (empty for diagrams not tied to one)
    pub endpoint_name: String,
    /// Type the diagram depicts, as written
    pub type_name: Option<String>,
    /// Resolved named type, if any
    pub type_ref: Option<TypeReference>,
    pub comment: Option<String>,
    /// Directory the diagram is written to
    pub output_dir: PathBuf,
    /// File name, relative to `output_dir` and to the page embedding it
    pub output_file: String,
    /// Rendered payload from the diagram engine
    pub payload: String,
}

impl Diagram {
    pub fn new(
        kind: DiagramKind,
        output_dir: PathBuf,
        output_file: String,
        payload: String,
    ) -> Self {
        Self {
            kind,
            app_name: String::new(),
            endpoint_name: String::new(),
            type_name: None,
            type_ref: None,
            comment: None,
            output_dir,
            output_file,
            payload,
        }
    }

    pub fn with_owner(mut self, app: &str, endpoint: &str) -> Self {
        self.app_name = app.to_string();
        self.endpoint_name = endpoint.to_string();
        self
    }

    pub fn with_type(mut self, name: String, reference: Option<TypeReference>) -> Self {
        self.type_name = Some(name);
        self.type_ref = reference;
        self
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file)
    }
}

/// Sequence diagram of one endpoint with its request and response types
#[derive(Debug, Clone, Serialize)]
pub struct SequenceDiagram {
    pub app_name: String,
    pub endpoint_name: String,
    pub app_comment: Option<String>,
    pub endpoint_comment: Option<String>,
    pub diagram: Diagram,
    /// One entry per parameter, in declaration order
    pub input_data_model: Vec<Diagram>,
    /// One entry per return statement with an extracted type reference
    pub output_data_model: Vec<Diagram>,
}

impl SequenceDiagram {
    /// All diagrams belonging to this endpoint
    pub fn diagrams(&self) -> impl Iterator<Item = &Diagram> {
        std::iter::once(&self.diagram)
            .chain(self.input_data_model.iter())
            .chain(self.output_data_model.iter())
    }
}

/// Build a file name from free-form name parts
pub fn file_name(stem: &str, suffix: &str, extension: &str) -> String {
    let stem: String = stem
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}{}.{}", stem, suffix, extension)
}
