//! apicatalog - Generate Markdown catalogs from architecture specifications
//!
//! Loads a specification of applications and endpoints, assembles one
//! package page per documentation package with sequence, data model,
//! database and integration diagrams, and writes it as a Markdown site.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod model;
pub mod output;
pub mod render;

// Re-export main types
pub use catalog::{Diagram, DiagramKind, Package, Project, SequenceDiagram};
pub use config::Config;
pub use error::{Error, Result};
pub use loader::load_module;
pub use model::{Application, Endpoint, Module, Statement, Type, TypeReference};
pub use output::{GenerationReport, MarkdownGenerator, TemplateEngine};
pub use render::{DiagramRenderer, MermaidRenderer};
