// Mermaid diagram engine
//
// Renders sequence, class, entity-relationship and flowchart diagrams as
// Mermaid source text.

use super::{parse_call_expression, DiagramRenderer};
use crate::error::{Error, Result};
use crate::model::{Endpoint, Module, Statement, Type, TypeDef, TypeReference};
use log::debug;
use petgraph::graphmap::DiGraphMap;
use std::collections::{BTreeSet, HashSet};

/// Participant name for whoever invokes the documented endpoint
const CLIENT: &str = "Client";

/// Renderer producing Mermaid diagram source
#[derive(Debug, Clone)]
pub struct MermaidRenderer {
    /// Levels of nested calls followed by sequence diagrams
    max_depth: usize,
    /// Layout direction (TB, LR, BT, RL)
    direction: String,
}

impl MermaidRenderer {
    pub fn new() -> Self {
        Self {
            max_depth: 4,
            direction: "LR".to_string(),
        }
    }

    /// Set how many levels of calls a sequence diagram follows
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set layout direction of integration diagrams
    pub fn with_direction(mut self, dir: &str) -> Self {
        self.direction = dir.to_string();
        self
    }

    /// Append the interactions of `endpoint` (owned by `app`, called by `caller`)
    fn expand_endpoint(
        &self,
        module: &Module,
        caller: &str,
        app: &str,
        endpoint: &Endpoint,
        depth: usize,
        path: &mut HashSet<(String, String)>,
        lines: &mut Vec<String>,
    ) {
        for stmt in &endpoint.stmts {
            match stmt {
                Statement::Call {
                    app: target,
                    endpoint: target_ep,
                } => {
                    lines.push(format!(
                        "    {}->>{}: {}",
                        sanitize_id(app),
                        sanitize_id(target),
                        escape_text(target_ep)
                    ));

                    let Some(callee) = module.app(target).and_then(|a| a.endpoints.get(target_ep))
                    else {
                        debug!("Call target {}.{} is not in the module", target, target_ep);
                        continue;
                    };

                    let key = (target.clone(), target_ep.clone());
                    if depth < self.max_depth && path.insert(key.clone()) {
                        self.expand_endpoint(module, app, target, callee, depth + 1, path, lines);
                        path.remove(&key);
                    }
                }
                Statement::Return { payload } => {
                    lines.push(format!(
                        "    {}-->>{}: {}",
                        sanitize_id(app),
                        sanitize_id(caller),
                        escape_text(payload)
                    ));
                }
                Statement::Action { action } => {
                    lines.push(format!(
                        "    Note over {}: {}",
                        sanitize_id(app),
                        escape_text(action)
                    ));
                }
            }
        }
    }

    /// Append a class block for a resolved type
    fn push_class(lines: &mut Vec<String>, reference: &TypeReference, def: Option<&TypeDef>) {
        let id = class_id(reference);
        match def {
            Some(def) if !def.fields.is_empty() => {
                lines.push(format!("    class {}[\"{}\"] {{", id, reference));
                for field in &def.fields {
                    lines.push(format!("        +{} {}", member_type(&field.ty), field.name));
                }
                lines.push("    }".to_string());
            }
            _ => lines.push(format!("    class {}[\"{}\"]", id, reference)),
        }
    }
}

impl Default for MermaidRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagramRenderer for MermaidRenderer {
    fn render_sequence(&self, call: &str, module: &Module) -> Result<String> {
        let (app_name, ep_name) = parse_call_expression(call)
            .ok_or_else(|| Error::render(call, "expected `<application> <- <endpoint>`"))?;
        let app = module
            .app(app_name)
            .ok_or_else(|| Error::render(call, format!("unknown application {}", app_name)))?;
        let endpoint = app.endpoints.get(ep_name).ok_or_else(|| {
            Error::render(call, format!("unknown endpoint {} of {}", ep_name, app_name))
        })?;

        let mut lines = vec!["sequenceDiagram".to_string()];
        lines.push(format!(
            "    {}->>{}: {}",
            CLIENT,
            sanitize_id(app_name),
            escape_text(ep_name)
        ));

        let mut path = HashSet::new();
        path.insert((app_name.to_string(), ep_name.to_string()));
        self.expand_endpoint(module, CLIENT, app_name, endpoint, 1, &mut path, &mut lines);

        Ok(lines.join("\n"))
    }

    fn render_data_model(&self, app: &str, ty: &Type, module: &Module) -> Result<String> {
        let mut lines = vec!["classDiagram".to_string()];

        let Some(reference) = ty.resolve(app) else {
            lines.push(format!("    class {}", sanitize_id(&ty.to_string())));
            return Ok(lines.join("\n"));
        };

        let def = module.type_def(&reference.app, &reference.name);
        if def.is_none() {
            debug!("Type {} is not defined in the module", reference);
        }
        Self::push_class(&mut lines, &reference, def);

        // One level of referenced field types
        let mut seen = BTreeSet::new();
        seen.insert(reference.clone());
        for field in def.map(|d| d.fields.as_slice()).unwrap_or_default() {
            let Some(child) = field.ty.resolve(&reference.app) else {
                continue;
            };
            if seen.insert(child.clone()) {
                Self::push_class(&mut lines, &child, module.type_def(&child.app, &child.name));
            }
            lines.push(format!(
                "    {} --> {} : {}",
                class_id(&reference),
                class_id(&child),
                field.name
            ));
        }

        Ok(lines.join("\n"))
    }

    fn render_database(&self, app: &str, module: &Module) -> Result<String> {
        let application = module
            .app(app)
            .ok_or_else(|| Error::render(app, format!("unknown application {}", app)))?;

        let mut names: Vec<&String> = application.types.keys().collect();
        names.sort();

        let mut lines = vec!["erDiagram".to_string()];
        let mut relations = Vec::new();
        for name in names {
            let def = &application.types[name];
            let entity = sanitize_id(name);
            lines.push(format!("    {} {{", entity));
            for field in &def.fields {
                lines.push(format!(
                    "        {} {}",
                    sanitize_id(&member_type(&field.ty)),
                    sanitize_id(&field.name)
                ));
                if let Some(target) = field.ty.resolve(app) {
                    if target.app == app && application.types.contains_key(&target.name) {
                        let cardinality = match field.ty {
                            Type::Sequence(_) => "||--o{",
                            _ => "||--||",
                        };
                        relations.push(format!(
                            "    {} {} {} : {}",
                            entity,
                            cardinality,
                            sanitize_id(&target.name),
                            sanitize_id(&field.name)
                        ));
                    }
                }
            }
            lines.push("    }".to_string());
        }
        lines.extend(relations);

        Ok(lines.join("\n"))
    }

    fn render_integration(
        &self,
        apps: &[&str],
        module: &Module,
        endpoint_analysis: bool,
    ) -> Result<String> {
        let mut graph: DiGraphMap<&str, BTreeSet<String>> = DiGraphMap::new();

        for &name in apps {
            let app = module
                .app(name)
                .ok_or_else(|| Error::render(name, format!("unknown application {}", name)))?;
            graph.add_node(app.name.as_str());

            for endpoint in app.endpoints.values() {
                for stmt in &endpoint.stmts {
                    let Statement::Call {
                        app: target,
                        endpoint: target_ep,
                    } = stmt
                    else {
                        continue;
                    };
                    if target == &app.name {
                        continue;
                    }
                    if module.app(target).is_none() {
                        debug!(
                            "Dropping call {} -> {}: target not in the module",
                            app.name, target
                        );
                        continue;
                    }
                    let label = format!("{} -> {}", endpoint.name, target_ep);
                    let from = app.name.as_str();
                    let to = target.as_str();
                    match graph.edge_weight_mut(from, to) {
                        Some(labels) => {
                            labels.insert(label);
                        }
                        None => {
                            graph.add_edge(from, to, BTreeSet::from([label]));
                        }
                    }
                }
            }
        }

        let mut lines = vec![format!("graph {}", self.direction)];

        let mut nodes: Vec<&str> = graph.nodes().collect();
        nodes.sort_unstable();
        for node in nodes {
            lines.push(format!("    {}[\"{}\"]", sanitize_id(node), escape_text(node)));
        }

        let mut edges: Vec<(&str, &str, &BTreeSet<String>)> = graph.all_edges().collect();
        edges.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        for (from, to, labels) in edges {
            if endpoint_analysis {
                for label in labels {
                    lines.push(format!(
                        "    {} -->|\"{}\"| {}",
                        sanitize_id(from),
                        escape_text(label),
                        sanitize_id(to)
                    ));
                }
            } else {
                lines.push(format!("    {} --> {}", sanitize_id(from), sanitize_id(to)));
            }
        }

        Ok(lines.join("\n"))
    }

    fn extension(&self) -> &str {
        "mmd"
    }
}

/// Sanitize a string for use as a Mermaid identifier
fn sanitize_id(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

fn class_id(reference: &TypeReference) -> String {
    sanitize_id(&format!("{}_{}", reference.app, reference.name))
}

/// Type as written inside a class member
fn member_type(ty: &Type) -> String {
    match ty {
        Type::Primitive(name) => name.clone(),
        Type::Ref { name, .. } => name.clone(),
        Type::Sequence(inner) => format!("List~{}~", member_type(inner)),
    }
}

/// Escape characters Mermaid treats as syntax in labels
fn escape_text(s: &str) -> String {
    s.replace(';', "#59;")
        .replace('"', "#quot;")
        .replace(['\n', '\r'], " ")
}
