// Catalog builder: the root of a documentation run

use super::diagram::{file_name, Diagram, DiagramKind, SequenceDiagram};
use super::package::{Package, PackageAggregator};
use super::returns::ReturnTypeExtractor;
use super::selector::{alphabetical, select, Selection, Skipped};
use super::sequence::AssemblyContext;
use crate::config::Config;
use crate::error::Result;
use crate::model::Module;
use crate::render::DiagramRenderer;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Owns the specification and the package tree built from it
pub struct Project {
    title: String,
    module: Module,
    output_dir: PathBuf,
    ignore_marker: String,
    database_marker: String,
    extractor: ReturnTypeExtractor,
    verbose: bool,
    packages: HashMap<String, Package>,
    integration: Option<Diagram>,
    integration_epa: Option<Diagram>,
    skipped: Vec<Skipped>,
}

/// Everything one assembly pass produces
struct Assembled {
    packages: HashMap<String, Package>,
    integration: Diagram,
    integration_epa: Diagram,
    skipped: Vec<Skipped>,
}

impl Project {
    pub fn new(module: Module, output_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            title: "Catalog".to_string(),
            module,
            output_dir: output_dir.into(),
            ignore_marker: "ignore".to_string(),
            database_marker: "db".to_string(),
            extractor: ReturnTypeExtractor::new()?,
            verbose: false,
            packages: HashMap::new(),
            integration: None,
            integration_epa: None,
            skipped: Vec::new(),
        })
    }

    /// Create a project with the title, output directory and markers from a config
    pub fn from_config(module: Module, config: &Config) -> Result<Self> {
        Ok(Self::new(module, config.output.directory.clone())?
            .with_title(&config.project.title)
            .with_ignore_marker(&config.catalog.ignore_marker)
            .with_database_marker(&config.catalog.database_marker))
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_ignore_marker(mut self, marker: &str) -> Self {
        self.ignore_marker = marker.to_string();
        self
    }

    pub fn with_database_marker(mut self, marker: &str) -> Self {
        self.database_marker = marker.to_string();
        self
    }

    /// Show a progress bar while assembling
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Assemble the full catalog, visiting endpoints one at a time.
    ///
    /// Stops at the first rendering error. The package tree is only replaced
    /// when the whole pass succeeds.
    pub fn assemble(&mut self, renderer: &dyn DiagramRenderer) -> Result<()> {
        let assembled = self.build(renderer, None)?;
        self.commit(assembled);
        Ok(())
    }

    /// Assemble the full catalog on a pool of `jobs` worker threads.
    ///
    /// Produces the same tree as [`Project::assemble`]: each package's
    /// sequence diagrams are sorted by (application, endpoint) once all
    /// workers are done.
    pub fn assemble_parallel(&mut self, renderer: &dyn DiagramRenderer, jobs: usize) -> Result<()> {
        let assembled = self.build(renderer, Some(jobs.max(1)))?;
        self.commit(assembled);
        Ok(())
    }

    /// Assemble sequentially for one job, in parallel otherwise
    pub fn assemble_with_jobs(
        &mut self,
        renderer: &dyn DiagramRenderer,
        jobs: usize,
    ) -> Result<()> {
        if jobs <= 1 {
            self.assemble(renderer)
        } else {
            self.assemble_parallel(renderer, jobs)
        }
    }

    fn commit(&mut self, assembled: Assembled) {
        self.packages = assembled.packages;
        self.integration = Some(assembled.integration);
        self.integration_epa = Some(assembled.integration_epa);
        self.skipped = assembled.skipped;
    }

    fn build(&self, renderer: &dyn DiagramRenderer, jobs: Option<usize>) -> Result<Assembled> {
        let selection = select(&self.module, &self.ignore_marker);
        let ctx = AssemblyContext {
            module: &self.module,
            renderer,
            extractor: &self.extractor,
        };
        let mut aggregator = PackageAggregator::new(&self.output_dir);

        info!(
            "Assembling {} endpoints of {} applications",
            selection.endpoints.len(),
            selection.apps.len()
        );
        let progress = self.progress(selection.endpoints.len());

        match jobs {
            None => self.collect_sequential(&ctx, &selection, &mut aggregator, &progress)?,
            Some(jobs) => {
                self.collect_parallel(&ctx, &selection, &mut aggregator, &progress, jobs)?
            }
        }
        progress.finish_and_clear();

        self.add_databases(renderer, &selection, &mut aggregator)?;

        // Integration diagrams only see what survived the ignore marker
        let retained = selection.retained();
        self.add_package_integrations(renderer, &selection, &retained, &mut aggregator)?;

        let ext = renderer.extension();
        let apps: Vec<&str> = selection.apps.iter().map(|a| a.name.as_str()).collect();
        let integration = Diagram::new(
            DiagramKind::Integration,
            self.output_dir.clone(),
            file_name("integration", "", ext),
            renderer.render_integration(&apps, &retained, false)?,
        );
        let integration_epa = Diagram::new(
            DiagramKind::Integration,
            self.output_dir.clone(),
            file_name("integration", "-epa", ext),
            renderer.render_integration(&apps, &retained, true)?,
        );

        Ok(Assembled {
            packages: aggregator.into_packages(),
            integration,
            integration_epa,
            skipped: selection.skipped,
        })
    }

    fn collect_sequential(
        &self,
        ctx: &AssemblyContext<'_>,
        selection: &Selection<'_>,
        aggregator: &mut PackageAggregator,
        progress: &ProgressBar,
    ) -> Result<()> {
        for &(app, endpoint) in &selection.endpoints {
            let package = app.package_name();
            let diagram = ctx.assemble_sequence(app, endpoint, &aggregator.package_dir(package))?;
            aggregator.register(package, diagram);
            progress.inc(1);
        }
        Ok(())
    }

    fn collect_parallel(
        &self,
        ctx: &AssemblyContext<'_>,
        selection: &Selection<'_>,
        aggregator: &mut PackageAggregator,
        progress: &ProgressBar,
        jobs: usize,
    ) -> Result<()> {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

        // Collecting into a Result stops handing out new endpoints after the
        // first error; diagrams finished by other workers are dropped.
        let results: Result<Vec<(&str, SequenceDiagram)>> = pool.install(|| {
            selection
                .endpoints
                .par_iter()
                .map(|&(app, endpoint)| {
                    let package = app.package_name();
                    let dir = self.output_dir.join(package);
                    let diagram = ctx.assemble_sequence(app, endpoint, &dir)?;
                    progress.inc(1);
                    Ok((package, diagram))
                })
                .collect()
        });

        for (package, diagram) in results? {
            aggregator.register(package, diagram);
        }
        aggregator.sort();
        Ok(())
    }

    /// Schema diagrams for applications carrying the database marker
    fn add_databases(
        &self,
        renderer: &dyn DiagramRenderer,
        selection: &Selection<'_>,
        aggregator: &mut PackageAggregator,
    ) -> Result<()> {
        let ext = renderer.extension();
        for app in selection.apps.iter().filter(|a| a.has_attr(&self.database_marker)) {
            let package = app.package_name();
            let payload = renderer.render_database(&app.name, &self.module)?;
            let diagram = Diagram::new(
                DiagramKind::Database,
                aggregator.package_dir(package),
                file_name(&app.name, "-database", ext),
                payload,
            )
            .with_owner(&app.name, "")
            .with_comment(app.description.clone());
            aggregator.add_data_model(package, diagram);
        }
        Ok(())
    }

    fn add_package_integrations(
        &self,
        renderer: &dyn DiagramRenderer,
        selection: &Selection<'_>,
        retained: &Module,
        aggregator: &mut PackageAggregator,
    ) -> Result<()> {
        let mut members: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for app in &selection.apps {
            members
                .entry(app.package_name())
                .or_default()
                .push(app.name.as_str());
        }

        let ext = renderer.extension();
        for package in aggregator.package_names() {
            let apps = members.get(package.as_str()).cloned().unwrap_or_default();
            let payload = renderer.render_integration(&apps, retained, false)?;
            let diagram = Diagram::new(
                DiagramKind::Integration,
                aggregator.package_dir(&package),
                file_name("integration", "", ext),
                payload,
            );
            aggregator.set_integration(&package, diagram);
        }
        Ok(())
    }

    fn progress(&self, len: usize) -> ProgressBar {
        if !self.verbose {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} endpoints")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn packages(&self) -> &HashMap<String, Package> {
        &self.packages
    }

    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    /// Packages in alphabetical order
    pub fn alphabetical_rows(&self) -> Vec<&Package> {
        alphabetical(&self.packages)
            .into_iter()
            .map(|name| &self.packages[name])
            .collect()
    }

    /// Integration diagram of all applications
    pub fn integration(&self) -> Option<&Diagram> {
        self.integration.as_ref()
    }

    /// Integration diagram with endpoint analysis
    pub fn integration_epa(&self) -> Option<&Diagram> {
        self.integration_epa.as_ref()
    }

    /// Entities left out by the ignore marker during the last assembly
    pub fn skipped(&self) -> &[Skipped] {
        &self.skipped
    }

    /// Every diagram in the catalog
    pub fn diagrams(&self) -> impl Iterator<Item = &Diagram> {
        self.integration
            .iter()
            .chain(self.integration_epa.iter())
            .chain(self.packages.values().flat_map(Package::diagrams))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::RecordingRenderer;
    use crate::model::{Application, Endpoint, Statement, Type, TypeReference};
    use crate::render::MermaidRenderer;

    fn single_orders() -> Module {
        Module::new().with_app(
            Application::new("Orders")
                .with_package("commerce")
                .with_endpoint(
                    Endpoint::new("Get").with_stmt(Statement::ret("ok: Orders.Receipt")),
                ),
        )
    }

    /// Ten endpoints over three applications and two packages
    fn ten_endpoints() -> Module {
        let mut cart = Application::new("Cart").with_package("commerce");
        for name in ["Add", "Clear", "Get", "Remove"] {
            cart = cart.with_endpoint(Endpoint::new(name).with_param("id", Type::primitive("int")));
        }
        let mut orders = Application::new("Orders").with_package("commerce");
        for name in ["Cancel", "Create", "Get"] {
            orders = orders
                .with_endpoint(Endpoint::new(name).with_stmt(Statement::ret("ok: Orders.Order")));
        }
        let mut billing = Application::new("Billing").with_package("finance");
        for name in ["Charge", "Refund", "Status"] {
            billing = billing.with_endpoint(Endpoint::new(name));
        }
        Module::new().with_app(cart).with_app(orders).with_app(billing)
    }

    fn project(module: Module) -> Project {
        Project::new(module, "docs").unwrap()
    }

    #[test]
    fn test_single_endpoint_scenario() {
        let mut project = project(single_orders());
        project.assemble(&RecordingRenderer::new()).unwrap();

        let package = project.package("commerce").unwrap();
        assert_eq!(package.sequence_diagrams.len(), 1);
        assert_eq!(package.output_dir, PathBuf::from("docs/commerce"));

        let seq = &package.sequence_diagrams[0];
        assert!(seq.input_data_model.is_empty());
        assert_eq!(seq.output_data_model.len(), 1);
        assert_eq!(
            seq.output_data_model[0].type_ref,
            Some(TypeReference::new("Orders", "Receipt"))
        );
        assert!(package.data_model_diagrams.is_some());
    }

    #[test]
    fn test_ignored_endpoint_is_skipped() {
        let module = Module::new().with_app(
            Application::new("Orders")
                .with_package("commerce")
                .with_endpoint(Endpoint::new("Get").with_stmt(Statement::ret("ok: Orders.Receipt")))
                .with_endpoint(Endpoint::new("Purge").with_attr("ignore")),
        );
        let mut project = project(module);
        project.assemble(&RecordingRenderer::new()).unwrap();

        assert_eq!(project.package("commerce").unwrap().sequence_diagrams.len(), 1);
        assert_eq!(project.skipped().len(), 1);
        assert_eq!(project.skipped()[0].app, "Orders");
        assert_eq!(project.skipped()[0].endpoint.as_deref(), Some("Purge"));
    }

    #[test]
    fn test_ignored_application_never_appears() {
        let module = ten_endpoints().with_app(
            Application::new("Legacy")
                .with_package("commerce")
                .with_attr("ignore")
                .with_attr("db")
                .with_endpoint(Endpoint::new("Get")),
        );
        let mut project = project(module);
        let renderer = RecordingRenderer::new();
        project.assemble(&renderer).unwrap();

        for package in project.packages().values() {
            assert!(package.sequence_diagrams.iter().all(|s| s.app_name != "Legacy"));
            assert!(package.data_model_diagrams().iter().all(|d| d.app_name != "Legacy"));
        }
        assert!(renderer.sequence_calls().iter().all(|c| !c.starts_with("Legacy")));
        assert_eq!(project.skipped()[0].to_string(), "application Legacy");
    }

    #[test]
    fn test_package_sizes_match_endpoint_counts() {
        let mut project = project(ten_endpoints());
        project.assemble(&RecordingRenderer::new()).unwrap();

        assert_eq!(project.packages().len(), 2);
        assert_eq!(project.package("commerce").unwrap().sequence_diagrams.len(), 7);
        assert_eq!(project.package("finance").unwrap().sequence_diagrams.len(), 3);
    }

    #[test]
    fn test_inputs_match_parameters() {
        let mut project = project(ten_endpoints());
        project.assemble(&RecordingRenderer::new()).unwrap();

        for package in project.packages().values() {
            for seq in &package.sequence_diagrams {
                let app = project.module().app(&seq.app_name).unwrap();
                let endpoint = &app.endpoints[&seq.endpoint_name];
                assert_eq!(seq.input_data_model.len(), endpoint.params.len());
            }
        }
    }

    #[test]
    fn test_no_type_in_return_yields_no_output() {
        let module = Module::new().with_app(
            Application::new("Orders")
                .with_endpoint(Endpoint::new("Get").with_stmt(Statement::ret("no type here"))),
        );
        let mut project = project(module);
        project.assemble(&RecordingRenderer::new()).unwrap();

        // Package falls back to the application name
        let package = project.package("Orders").unwrap();
        assert!(package.sequence_diagrams[0].output_data_model.is_empty());
    }

    #[test]
    fn test_traversal_order_is_deterministic() {
        let first = RecordingRenderer::new();
        let second = RecordingRenderer::new();
        project(ten_endpoints()).assemble(&first).unwrap();
        project(ten_endpoints()).assemble(&second).unwrap();

        assert_eq!(first.sequence_calls(), second.sequence_calls());
        assert_eq!(
            first.sequence_calls()[..3],
            ["Billing <- Charge", "Billing <- Refund", "Billing <- Status"]
        );
    }

    #[test]
    fn test_rendering_error_fails_fast() {
        // Sixth endpoint in visiting order
        let renderer = RecordingRenderer::new().failing_on("Cart <- Get");
        let mut project = project(ten_endpoints());

        let result = project.assemble(&renderer);
        assert!(result.is_err());
        assert_eq!(
            renderer.sequence_calls(),
            vec![
                "Billing <- Charge",
                "Billing <- Refund",
                "Billing <- Status",
                "Cart <- Add",
                "Cart <- Clear",
                "Cart <- Get",
            ]
        );
        assert!(project.packages().is_empty());
        assert!(project.integration().is_none());
    }

    #[test]
    fn test_failed_run_keeps_previous_catalog() {
        let mut project = project(ten_endpoints());
        project.assemble(&RecordingRenderer::new()).unwrap();

        let failing = RecordingRenderer::new().failing_on("Orders <- Get");
        assert!(project.assemble(&failing).is_err());
        assert_eq!(project.package("commerce").unwrap().sequence_diagrams.len(), 7);
    }

    #[test]
    fn test_data_model_error_fails_fast() {
        let mut project = project(ten_endpoints());
        project.assemble(&RecordingRenderer::new()).unwrap();

        // Orders.Order is the first response type, after every Cart input
        let renderer = RecordingRenderer::new().failing_on_type("Orders.Order");
        let err = project.assemble(&renderer).unwrap_err();
        assert!(err.to_string().contains("Orders.Order"));
        assert_eq!(renderer.data_model_calls(), 5);
        assert_eq!(renderer.sequence_calls().last().unwrap(), "Orders <- Cancel");

        assert_eq!(project.package("commerce").unwrap().sequence_diagrams.len(), 7);
        assert_eq!(project.package("finance").unwrap().sequence_diagrams.len(), 3);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut sequential = project(ten_endpoints());
        sequential.assemble(&RecordingRenderer::new()).unwrap();
        let mut parallel = project(ten_endpoints());
        parallel.assemble_parallel(&RecordingRenderer::new(), 4).unwrap();

        for name in ["commerce", "finance"] {
            let a: Vec<(String, String)> = sequential
                .package(name)
                .unwrap()
                .sequence_diagrams
                .iter()
                .map(|s| (s.app_name.clone(), s.endpoint_name.clone()))
                .collect();
            let b: Vec<(String, String)> = parallel
                .package(name)
                .unwrap()
                .sequence_diagrams
                .iter()
                .map(|s| (s.app_name.clone(), s.endpoint_name.clone()))
                .collect();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_parallel_error_discards_results() {
        let renderer = RecordingRenderer::new().failing_on("Orders <- Create");
        let mut project = project(ten_endpoints());

        assert!(project.assemble_parallel(&renderer, 3).is_err());
        assert!(project.packages().is_empty());
    }

    #[test]
    fn test_assemble_with_jobs_dispatch() {
        let mut project = project(ten_endpoints());
        project.assemble_with_jobs(&RecordingRenderer::new(), 2).unwrap();
        assert_eq!(project.packages().len(), 2);
    }

    #[test]
    fn test_database_application_gets_schema() {
        let module = single_orders().with_app(
            Application::new("Store")
                .with_package("storage")
                .with_attr("db")
                .with_description("Primary database"),
        );
        let mut project = project(module);
        project.assemble(&RecordingRenderer::new()).unwrap();

        let storage = project.package("storage").unwrap();
        assert!(storage.sequence_diagrams.is_empty());
        let dbs = storage.data_model_diagrams();
        assert_eq!(dbs.len(), 1);
        assert_eq!(dbs[0].kind, DiagramKind::Database);
        assert_eq!(dbs[0].payload, "database Store");
        assert_eq!(dbs[0].output_file, "Store-database.mmd");
        assert_eq!(dbs[0].comment.as_deref(), Some("Primary database"));
    }

    #[test]
    fn test_integration_diagrams() {
        let mut project = project(ten_endpoints());
        project.assemble(&RecordingRenderer::new()).unwrap();

        let root = project.integration().unwrap();
        assert_eq!(root.payload, "integration Billing,Cart,Orders false");
        assert_eq!(root.output_path(), PathBuf::from("docs/integration.mmd"));
        let epa = project.integration_epa().unwrap();
        assert_eq!(epa.payload, "integration Billing,Cart,Orders true");
        assert_eq!(epa.output_file, "integration-epa.mmd");

        let commerce = project.package("commerce").unwrap();
        assert_eq!(
            commerce.integration.as_ref().unwrap().payload,
            "integration Cart,Orders false"
        );
    }

    #[test]
    fn test_integration_leaves_out_ignored_entities() {
        let module = Module::new()
            .with_app(
                Application::new("Orders")
                    .with_package("commerce")
                    .with_endpoint(
                        Endpoint::new("Get").with_stmt(Statement::call("Billing", "Charge")),
                    )
                    .with_endpoint(
                        Endpoint::new("Purge")
                            .with_attr("ignore")
                            .with_stmt(Statement::call("Billing", "Wipe")),
                    )
                    .with_endpoint(
                        Endpoint::new("Old").with_stmt(Statement::call("Legacy", "Ping")),
                    ),
            )
            .with_app(
                Application::new("Billing")
                    .with_package("commerce")
                    .with_endpoint(Endpoint::new("Charge"))
                    .with_endpoint(Endpoint::new("Wipe")),
            )
            .with_app(
                Application::new("Legacy")
                    .with_attr("ignore")
                    .with_endpoint(Endpoint::new("Ping")),
            );
        let mut project = project(module);
        project.assemble(&MermaidRenderer::new()).unwrap();

        let epa = &project.integration_epa().unwrap().payload;
        assert!(epa.contains("Orders -->|\"Get -> Charge\"| Billing"));
        assert!(!epa.contains("Purge"));
        assert!(!epa.contains("Legacy"));

        let plain = &project.integration().unwrap().payload;
        assert!(plain.contains("Orders --> Billing"));
        assert!(!plain.contains("Legacy"));

        let package = &project.package("commerce").unwrap().integration;
        let package = &package.as_ref().unwrap().payload;
        assert!(!package.contains("Legacy"));
    }

    #[test]
    fn test_alphabetical_rows() {
        let mut project = project(ten_endpoints());
        project.assemble(&RecordingRenderer::new()).unwrap();

        let names: Vec<&str> = project
            .alphabetical_rows()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["commerce", "finance"]);
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.project.title = "Shop".to_string();
        config.catalog.ignore_marker = "skip".to_string();
        config.output.directory = PathBuf::from("out");

        let module = single_orders().with_app(Application::new("Hidden").with_attr("skip"));
        let mut project = Project::from_config(module, &config).unwrap();
        project.assemble(&RecordingRenderer::new()).unwrap();

        assert_eq!(project.title(), "Shop");
        assert_eq!(project.output_dir(), Path::new("out"));
        assert_eq!(project.skipped().len(), 1);
    }

    #[test]
    fn test_diagrams_iter_counts_everything() {
        let mut project = project(single_orders());
        project.assemble(&RecordingRenderer::new()).unwrap();

        // root integration x2, package integration, sequence, one response type
        assert_eq!(project.diagrams().count(), 5);
    }
}
