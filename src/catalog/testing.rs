// Test double for the diagram engine

use crate::error::{Error, Result};
use crate::model::{Module, Type};
use crate::render::DiagramRenderer;
use std::sync::Mutex;

/// Renderer that echoes its inputs, records requests and fails on demand
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    fail_on: Option<String>,
    fail_on_type: Option<String>,
    sequence_calls: Mutex<Vec<String>>,
    data_model_calls: Mutex<usize>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail when asked to render this call expression
    pub fn failing_on(mut self, call: &str) -> Self {
        self.fail_on = Some(call.to_string());
        self
    }

    /// Fail when asked to render the data model of this type, as displayed
    pub fn failing_on_type(mut self, ty: &str) -> Self {
        self.fail_on_type = Some(ty.to_string());
        self
    }

    pub fn sequence_calls(&self) -> Vec<String> {
        self.sequence_calls.lock().unwrap().clone()
    }

    pub fn data_model_calls(&self) -> usize {
        *self.data_model_calls.lock().unwrap()
    }
}

impl DiagramRenderer for RecordingRenderer {
    fn render_sequence(&self, call: &str, _module: &Module) -> Result<String> {
        self.sequence_calls.lock().unwrap().push(call.to_string());
        if self.fail_on.as_deref() == Some(call) {
            return Err(Error::render(call, "engine failure"));
        }
        Ok(format!("sequence {}", call))
    }

    fn render_data_model(&self, app: &str, ty: &Type, _module: &Module) -> Result<String> {
        *self.data_model_calls.lock().unwrap() += 1;
        if self.fail_on_type.as_deref() == Some(ty.to_string().as_str()) {
            return Err(Error::render(ty.to_string(), "engine failure"));
        }
        Ok(format!("data {} {}", app, ty))
    }

    fn render_database(&self, app: &str, _module: &Module) -> Result<String> {
        Ok(format!("database {}", app))
    }

    fn render_integration(
        &self,
        apps: &[&str],
        _module: &Module,
        endpoint_analysis: bool,
    ) -> Result<String> {
        Ok(format!("integration {} {}", apps.join(","), endpoint_analysis))
    }

    fn extension(&self) -> &str {
        "mmd"
    }
}
