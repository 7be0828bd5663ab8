// Diagram rendering engines

mod mermaid;

pub use mermaid::MermaidRenderer;

use crate::error::Result;
use crate::model::{Module, Type};

/// Separator between the caller and the endpoint in a call expression
pub const CALL_SEPARATOR: &str = " <- ";

/// Build the call expression for "application invokes endpoint"
pub fn call_expression(app: &str, endpoint: &str) -> String {
    format!("{}{}{}", app, CALL_SEPARATOR, endpoint)
}

/// Split a call expression back into (application, endpoint)
pub fn parse_call_expression(call: &str) -> Option<(&str, &str)> {
    let (app, endpoint) = call.split_once(CALL_SEPARATOR)?;
    let (app, endpoint) = (app.trim(), endpoint.trim());
    if app.is_empty() || endpoint.is_empty() {
        return None;
    }
    Some((app, endpoint))
}

/// Engine that turns specification elements into diagram payloads.
///
/// The catalog treats every method as a pure function of its inputs; an
/// error from any of them aborts the catalog run.
pub trait DiagramRenderer: Send + Sync {
    /// Render the sequence diagram for a call expression (`App <- Endpoint`)
    fn render_sequence(&self, call: &str, module: &Module) -> Result<String>;

    /// Render the data model of a type, scoped to `app`
    fn render_data_model(&self, app: &str, ty: &Type, module: &Module) -> Result<String>;

    /// Render every type of a database application
    fn render_database(&self, app: &str, module: &Module) -> Result<String>;

    /// Render how the given applications call each other.
    ///
    /// With `endpoint_analysis` the edges name the calling and called endpoints.
    fn render_integration(
        &self,
        apps: &[&str],
        module: &Module,
        endpoint_analysis: bool,
    ) -> Result<String>;

    /// File extension of the rendered payloads
    fn extension(&self) -> &str;
}
