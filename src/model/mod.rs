// Specification model: applications, endpoints, statements and types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The parsed architecture specification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Module {
    pub apps: HashMap<String, Application>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an application, keyed by its name
    pub fn with_app(mut self, app: Application) -> Self {
        self.apps.insert(app.name.clone(), app);
        self
    }

    pub fn app(&self, name: &str) -> Option<&Application> {
        self.apps.get(name)
    }

    /// Look up a type owned by an application
    pub fn type_def(&self, app: &str, name: &str) -> Option<&TypeDef> {
        self.apps.get(app).and_then(|a| a.types.get(name))
    }

    /// Name every application and endpoint after its map key.
    ///
    /// Lookups go through the keys, so a `name` field that disagrees with
    /// its key is overwritten.
    pub fn normalize_names(&mut self) {
        for (key, app) in self.apps.iter_mut() {
            app.name.clone_from(key);
            for (ep_key, endpoint) in app.endpoints.iter_mut() {
                endpoint.name.clone_from(ep_key);
            }
        }
    }
}

/// A named service or component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Application {
    pub name: String,
    pub attrs: Vec<String>,
    pub package: Option<String>,
    pub description: Option<String>,
    pub endpoints: HashMap<String, Endpoint>,
    pub types: HashMap<String, TypeDef>,
}

impl Application {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_attr(mut self, attr: impl Into<String>) -> Self {
        self.attrs.push(attr.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.insert(endpoint.name.clone(), endpoint);
        self
    }

    pub fn with_type(mut self, name: impl Into<String>, def: TypeDef) -> Self {
        self.types.insert(name.into(), def);
        self
    }

    /// Documentation package this application belongs to.
    ///
    /// Falls back to the application name when no package is set.
    pub fn package_name(&self) -> &str {
        match self.package.as_deref() {
            Some(p) if !p.trim().is_empty() => p,
            _ => &self.name,
        }
    }

    pub fn has_attr(&self, marker: &str) -> bool {
        has_attr(&self.attrs, marker)
    }
}

/// A named operation of an application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoint {
    pub name: String,
    pub attrs: Vec<String>,
    pub description: Option<String>,
    pub params: Vec<Param>,
    pub stmts: Vec<Statement>,
}

impl Endpoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, attr: impl Into<String>) -> Self {
        self.attrs.push(attr.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.params.push(Param {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn with_stmt(mut self, stmt: Statement) -> Self {
        self.stmts.push(stmt);
        self
    }

    pub fn has_attr(&self, marker: &str) -> bool {
        has_attr(&self.attrs, marker)
    }
}

/// An endpoint parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
}

/// A statement in an endpoint body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Statement {
    /// Invoke an endpoint of another (or the same) application
    Call { app: String, endpoint: String },
    /// Free-text description of what the endpoint returns
    Return { payload: String },
    /// Any other step, kept as text
    Action { action: String },
}

impl Statement {
    pub fn call(app: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Statement::Call {
            app: app.into(),
            endpoint: endpoint.into(),
        }
    }

    pub fn ret(payload: impl Into<String>) -> Self {
        Statement::Return {
            payload: payload.into(),
        }
    }

    pub fn action(action: impl Into<String>) -> Self {
        Statement::Action {
            action: action.into(),
        }
    }

    /// Payload of a return statement
    pub fn return_payload(&self) -> Option<&str> {
        match self {
            Statement::Return { payload } => Some(payload),
            _ => None,
        }
    }
}

/// The type of a parameter or field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Primitive(String),
    /// Reference to a named type; without an application it is scoped to the current one
    Ref {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        app: Option<String>,
        name: String,
    },
    Sequence(Box<Type>),
}

impl Type {
    pub fn primitive(name: impl Into<String>) -> Self {
        Type::Primitive(name.into())
    }

    pub fn reference(app: impl Into<String>, name: impl Into<String>) -> Self {
        Type::Ref {
            app: Some(app.into()),
            name: name.into(),
        }
    }

    pub fn local(name: impl Into<String>) -> Self {
        Type::Ref {
            app: None,
            name: name.into(),
        }
    }

    /// Resolve a reference against the application it appears in
    pub fn resolve(&self, current_app: &str) -> Option<TypeReference> {
        match self {
            Type::Ref { app, name } => Some(TypeReference::new(
                app.as_deref().unwrap_or(current_app),
                name.as_str(),
            )),
            Type::Sequence(inner) => inner.resolve(current_app),
            Type::Primitive(_) => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(name) => write!(f, "{}", name),
            Type::Ref { app: Some(app), name } => write!(f, "{}.{}", app, name),
            Type::Ref { app: None, name } => write!(f, "{}", name),
            Type::Sequence(inner) => write!(f, "sequence of {}", inner),
        }
    }
}

/// A resolved (application, type) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeReference {
    pub app: String,
    pub name: String,
}

impl TypeReference {
    pub fn new(app: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            name: name.into(),
        }
    }

    pub fn to_type(&self) -> Type {
        Type::reference(self.app.clone(), self.name.clone())
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app, self.name)
    }
}

/// A named record type owned by an application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeDef {
    pub description: Option<String>,
    pub fields: Vec<Field>,
}

impl TypeDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.fields.push(Field {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A field of a record type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
}

/// Check whether an attribute list carries a marker
pub fn has_attr(attrs: &[String], marker: &str) -> bool {
    attrs.iter().any(|a| a == marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_name_fallback() {
        let app = Application::new("Orders");
        assert_eq!(app.package_name(), "Orders");

        let app = Application::new("Orders").with_package("commerce");
        assert_eq!(app.package_name(), "commerce");

        let app = Application::new("Orders").with_package(" ");
        assert_eq!(app.package_name(), "Orders");
    }

    #[test]
    fn test_has_attr_is_exact() {
        let attrs = vec!["ignored".to_string(), "db".to_string()];
        assert!(has_attr(&attrs, "db"));
        assert!(!has_attr(&attrs, "ignore"));
    }

    #[test]
    fn test_type_resolve() {
        assert_eq!(
            Type::local("Receipt").resolve("Orders"),
            Some(TypeReference::new("Orders", "Receipt"))
        );
        assert_eq!(
            Type::reference("Billing", "Invoice").resolve("Orders"),
            Some(TypeReference::new("Billing", "Invoice"))
        );
        assert_eq!(
            Type::Sequence(Box::new(Type::local("Line"))).resolve("Orders"),
            Some(TypeReference::new("Orders", "Line"))
        );
        assert_eq!(Type::primitive("int").resolve("Orders"), None);
    }

    #[test]
    fn test_type_display() {
        assert_eq!(Type::primitive("string").to_string(), "string");
        assert_eq!(Type::reference("Orders", "Receipt").to_string(), "Orders.Receipt");
        assert_eq!(
            Type::Sequence(Box::new(Type::local("Line"))).to_string(),
            "sequence of Line"
        );
    }

    #[test]
    fn test_statement_json_shape() {
        let stmt: Statement =
            serde_json::from_str(r#"{"kind": "return", "payload": "ok: Orders.Receipt"}"#).unwrap();
        assert_eq!(stmt.return_payload(), Some("ok: Orders.Receipt"));

        let stmt: Statement =
            serde_json::from_str(r#"{"kind": "call", "app": "Billing", "endpoint": "Charge"}"#)
                .unwrap();
        assert_eq!(stmt, Statement::call("Billing", "Charge"));
        assert_eq!(stmt.return_payload(), None);
    }

    #[test]
    fn test_normalize_names() {
        let json = r#"{"apps": {"Orders": {"endpoints": {"Get": {}}}}}"#;
        let mut module: Module = serde_json::from_str(json).unwrap();
        module.normalize_names();

        let app = module.app("Orders").unwrap();
        assert_eq!(app.name, "Orders");
        assert_eq!(app.endpoints["Get"].name, "Get");
    }

    #[test]
    fn test_normalize_names_prefers_keys() {
        let json = r#"{"apps": {"Orders": {"name": "OrderService",
            "endpoints": {"Get": {"name": "Fetch"}}}}}"#;
        let mut module: Module = serde_json::from_str(json).unwrap();
        module.normalize_names();

        let app = module.app("Orders").unwrap();
        assert_eq!(app.name, "Orders");
        assert_eq!(app.endpoints["Get"].name, "Get");
    }

    #[test]
    fn test_type_def_lookup() {
        let module = Module::new().with_app(
            Application::new("Orders")
                .with_type("Receipt", TypeDef::new().with_field("id", Type::primitive("int"))),
        );
        assert!(module.type_def("Orders", "Receipt").is_some());
        assert!(module.type_def("Orders", "Missing").is_none());
        assert!(module.type_def("Billing", "Receipt").is_none());
    }
}
