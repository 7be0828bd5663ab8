// Deterministic ordering and filtering of specification entities

use crate::model::{Application, Endpoint, Module};
use log::info;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::BuildHasher;

/// Keys of a map in lexicographic order
pub fn alphabetical<K: Ord, V, S: BuildHasher>(map: &HashMap<K, V, S>) -> Vec<&K> {
    let mut keys: Vec<&K> = map.keys().collect();
    keys.sort();
    keys
}

/// An application or endpoint excluded by the ignore marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub app: String,
    /// `None` when the whole application was skipped
    pub endpoint: Option<String>,
}

impl fmt::Display for Skipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.endpoint {
            Some(endpoint) => write!(f, "endpoint {} {}", self.app, endpoint),
            None => write!(f, "application {}", self.app),
        }
    }
}

/// The entities a catalog run visits, in visiting order
#[derive(Debug, Default)]
pub struct Selection<'m> {
    /// Non-ignored applications, alphabetical
    pub apps: Vec<&'m Application>,
    /// Non-ignored endpoints of non-ignored applications, by application then endpoint
    pub endpoints: Vec<(&'m Application, &'m Endpoint)>,
    pub skipped: Vec<Skipped>,
}

impl Selection<'_> {
    /// The selected applications and endpoints as a module of their own
    pub fn retained(&self) -> Module {
        let kept: HashSet<(&str, &str)> = self
            .endpoints
            .iter()
            .map(|(app, endpoint)| (app.name.as_str(), endpoint.name.as_str()))
            .collect();

        let mut module = Module::new();
        for &app in &self.apps {
            let mut app = app.clone();
            let name = app.name.clone();
            app.endpoints
                .retain(|_, endpoint| kept.contains(&(name.as_str(), endpoint.name.as_str())));
            module.apps.insert(name, app);
        }
        module
    }
}

/// Walk the module in lexicographic order, dropping ignored entities
pub fn select<'m>(module: &'m Module, ignore_marker: &str) -> Selection<'m> {
    let mut selection = Selection::default();

    for app_name in alphabetical(&module.apps) {
        let app = &module.apps[app_name];
        if app.has_attr(ignore_marker) {
            info!("Skipping application {}", app.name);
            selection.skipped.push(Skipped {
                app: app.name.clone(),
                endpoint: None,
            });
            continue;
        }
        selection.apps.push(app);

        for ep_name in alphabetical(&app.endpoints) {
            let endpoint = &app.endpoints[ep_name];
            if endpoint.has_attr(ignore_marker) {
                info!("Skipping endpoint {} {}", app.name, endpoint.name);
                selection.skipped.push(Skipped {
                    app: app.name.clone(),
                    endpoint: Some(endpoint.name.clone()),
                });
                continue;
            }
            selection.endpoints.push((app, endpoint));
        }
    }

    selection
}
