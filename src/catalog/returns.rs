//! Return type extraction.
//!
//! Return statements carry free text such as `ok: Orders.Receipt`. The first
//! `Namespace.TypeName` token in that text is taken as the returned type. This
//! is a heuristic: payloads with several tokens only yield the first one, and
//! the namespace is not checked against the module.

use crate::error::{Error, Result};
use crate::model::{Statement, TypeReference};
use regex::Regex;

// ASCII word characters only
const TYPE_TOKEN: &str = r"(?-u:\w)+\.(?-u:\w)+";

/// Pulls `App.Type` references out of return payloads
#[derive(Debug, Clone)]
pub struct ReturnTypeExtractor {
    pattern: Regex,
}

impl ReturnTypeExtractor {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(TYPE_TOKEN)
            .map_err(|e| Error::other(format!("invalid return type pattern: {}", e)))?;
        Ok(Self { pattern })
    }

    /// Extract the type reference embedded in one payload
    pub fn extract(&self, payload: &str) -> Option<TypeReference> {
        let token = self.pattern.find(payload)?.as_str();
        let (app, name) = token.split_once('.')?;
        Some(TypeReference::new(app, name))
    }

    /// Type references of all return statements, in statement order
    pub fn output_references(&self, stmts: &[Statement]) -> Vec<TypeReference> {
        stmts
            .iter()
            .filter_map(Statement::return_payload)
            .filter_map(|payload| self.extract(payload))
            .collect()
    }
}
