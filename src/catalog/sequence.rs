// Per-endpoint diagram assembly

use super::diagram::{file_name, Diagram, DiagramKind, SequenceDiagram};
use super::returns::ReturnTypeExtractor;
use crate::error::Result;
use crate::model::{Application, Endpoint, Module, Type};
use crate::render::{call_expression, DiagramRenderer};
use log::debug;
use std::path::Path;

/// Shared, read-only inputs of sequence assembly
pub struct AssemblyContext<'a> {
    pub module: &'a Module,
    pub renderer: &'a dyn DiagramRenderer,
    pub extractor: &'a ReturnTypeExtractor,
}

impl AssemblyContext<'_> {
    /// Build the sequence diagram and data models of one endpoint.
    ///
    /// `package_dir` is where the endpoint's diagrams are written. The first
    /// rendering error is returned and nothing is built for the endpoint.
    pub fn assemble_sequence(
        &self,
        app: &Application,
        endpoint: &Endpoint,
        package_dir: &Path,
    ) -> Result<SequenceDiagram> {
        let call = call_expression(&app.name, &endpoint.name);
        debug!("Rendering sequence diagram for {}", call);

        let ext = self.renderer.extension();
        let stem = format!("{}{}", app.name, endpoint.name);
        let payload = self.renderer.render_sequence(&call, self.module)?;
        let diagram = Diagram::new(
            DiagramKind::Sequence,
            package_dir.to_path_buf(),
            file_name(&stem, "", ext),
            payload,
        )
        .with_owner(&app.name, &endpoint.name);

        let mut index = 0;
        let mut next_file = || {
            let name = file_name(&stem, &format!("-data-model-{}", index), ext);
            index += 1;
            name
        };

        let mut input_data_model = Vec::with_capacity(endpoint.params.len());
        for param in &endpoint.params {
            let payload = self
                .renderer
                .render_data_model(&app.name, &param.ty, self.module)?;
            input_data_model.push(self.data_model(
                &app.name,
                &endpoint.name,
                &param.ty,
                package_dir,
                next_file(),
                payload,
            ));
        }

        let mut output_data_model = Vec::new();
        for reference in self.extractor.output_references(&endpoint.stmts) {
            let ty = reference.to_type();
            let payload = self
                .renderer
                .render_data_model(&reference.app, &ty, self.module)?;
            output_data_model.push(self.data_model(
                &reference.app,
                &endpoint.name,
                &ty,
                package_dir,
                next_file(),
                payload,
            ));
        }

        Ok(SequenceDiagram {
            app_name: app.name.clone(),
            endpoint_name: endpoint.name.clone(),
            app_comment: app.description.clone(),
            endpoint_comment: endpoint.description.clone(),
            diagram,
            input_data_model,
            output_data_model,
        })
    }

    fn data_model(
        &self,
        app: &str,
        endpoint: &str,
        ty: &Type,
        package_dir: &Path,
        output_file: String,
        payload: String,
    ) -> Diagram {
        let reference = ty.resolve(app);
        let comment = reference
            .as_ref()
            .and_then(|r| self.module.type_def(&r.app, &r.name))
            .and_then(|def| def.description.clone());
        let name = match &reference {
            Some(r) => r.to_string(),
            None => ty.to_string(),
        };

        Diagram::new(DiagramKind::DataModel, package_dir.to_path_buf(), output_file, payload)
            .with_owner(app, endpoint)
            .with_type(name, reference)
            .with_comment(comment)
    }
}
