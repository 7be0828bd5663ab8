//! CLI module for apicatalog

mod args;

pub use args::{Args, Command};

use crate::catalog::{select, Project};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::loader::load_module;
use crate::model::Module;
use crate::output::MarkdownGenerator;
use crate::render::MermaidRenderer;
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::ExitCode;

const DEFAULT_CONFIG: &str = "apicatalog.toml";

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();
    init_logging(args.verbose);

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // A second initialization (embedding, tests) keeps the first logger
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init();
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Generate {
            spec,
            output,
            config,
            title,
            jobs,
            templates,
        } => {
            let mut cfg = load_config(config.as_deref())?;

            // CLI takes precedence over the config file
            cfg.merge_cli(output, title, jobs);
            cfg.validate()?;
            debug!("Configuration: {:?}", cfg);

            let module = load_spec(&spec)?;
            let renderer = MermaidRenderer::new()
                .with_max_depth(cfg.diagrams.max_depth)
                .with_direction(&cfg.diagrams.direction);

            let mut project = Project::from_config(module, &cfg)?.with_verbose(args.verbose);
            project.assemble_with_jobs(&renderer, cfg.catalog.jobs)?;

            let generator = match &templates {
                Some(dir) => MarkdownGenerator::from_dir(&dir.to_string_lossy())?,
                None => MarkdownGenerator::new()?,
            };
            let report = generator.generate(&project)?;

            println!("{}", report.summary());
            println!("Catalog written to: {}", project.output_dir().display());
            Ok(())
        }

        Command::List { spec, config } => {
            let cfg = load_config(config.as_deref())?;
            cfg.validate()?;

            let module = load_spec(&spec)?;
            print!("{}", package_tree(&module, &cfg));
            Ok(())
        }

        Command::Version => {
            println!("apicatalog {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Load an explicit config file, or `apicatalog.toml` when present
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::PathNotFound(path.to_path_buf()));
            }
            Config::load(path)
        }
        None => Ok(Config::load_or_default(Path::new(DEFAULT_CONFIG))),
    }
}

fn load_spec(spec: &Path) -> Result<Module> {
    info!("Loading specification from {}", spec.display());
    let module = load_module(spec)?;
    info!("Loaded {} applications", module.apps.len());
    Ok(module)
}

/// Packages, applications and endpoints that survive the ignore marker
fn package_tree(module: &Module, cfg: &Config) -> String {
    let selection = select(module, &cfg.catalog.ignore_marker);

    let mut tree: BTreeMap<&str, BTreeMap<&str, Vec<&str>>> = BTreeMap::new();
    for app in &selection.apps {
        tree.entry(app.package_name())
            .or_default()
            .entry(app.name.as_str())
            .or_default();
    }
    for (app, endpoint) in &selection.endpoints {
        tree.entry(app.package_name())
            .or_default()
            .entry(app.name.as_str())
            .or_default()
            .push(endpoint.name.as_str());
    }

    let mut out = String::new();
    for (package, apps) in &tree {
        out.push_str(&format!("{}\n", package));
        for (app, endpoints) in apps {
            let is_db = module
                .app(app)
                .is_some_and(|a| a.has_attr(&cfg.catalog.database_marker));
            if is_db {
                out.push_str(&format!("  {} (database)\n", app));
            } else {
                out.push_str(&format!("  {}\n", app));
            }
            for endpoint in endpoints {
                out.push_str(&format!("    {}\n", endpoint));
            }
        }
    }
    out
}
