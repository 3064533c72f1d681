//! Runner orchestration for one test file
//!
//! The Runner ties the components together:
//! - ModuleGraph and GraphLoader for compiling and linking imports
//! - Sandbox for the window-like script environment
//! - Node trees from test_model for execution and rendering

use crate::bridge::{self, Settled};
use crate::options::RunOptions;
use core_types::{ensure_supported, EasyTestsError, EasyTestsResult};
use module_graph::{GraphLoader, ModuleGraph, SpecifierResolver};
use sandbox::{MainOutput, Sandbox};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use test_model::{ConsoleSurface, Styler, Surface, TestReport};
use tracing::{info, info_span, warn, Instrument};
use transformer::{SourceTransformer, TypeStripper};
use walkdir::WalkDir;

/// Suffixes that mark a file as a test entry in directory runs
pub const TEST_FILE_SUFFIXES: [&str; 4] = [".test.js", ".test.mjs", ".test.ts", ".test.mts"];

/// Runs test files, one fresh sandbox per file
pub struct Runner {
    /// Options applied to every run
    options: RunOptions,
    /// Where rendered trees are written
    surface: Rc<dyn Surface>,
    /// Glyph and decoration style
    styler: Styler,
    /// Compiler used for every module
    transformer: Rc<dyn SourceTransformer>,
}

impl Runner {
    /// Create a runner that renders to the console
    ///
    /// # Arguments
    /// * `options` - Options applied to every run
    ///
    /// # Example
    /// ```
    /// use easytests::{RunOptions, Runner};
    ///
    /// let runner = Runner::new(RunOptions::default());
    /// assert_eq!(runner.options().tick_millis, 1);
    /// ```
    pub fn new(options: RunOptions) -> Self {
        Self {
            options,
            surface: Rc::new(ConsoleSurface::new()),
            styler: Styler::detect(),
            transformer: Rc::new(TypeStripper::new()),
        }
    }

    /// Render to a different surface
    pub fn with_surface(mut self, surface: Rc<dyn Surface>) -> Self {
        self.surface = surface;
        self
    }

    /// Use a different styler
    pub fn with_styler(mut self, styler: Styler) -> Self {
        self.styler = styler;
        self
    }

    /// Compile modules with a different transformer
    pub fn with_transformer(mut self, transformer: Rc<dyn SourceTransformer>) -> Self {
        self.transformer = transformer;
        self
    }

    /// Options applied to every run
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Run one test file.
    ///
    /// Must be called inside a [`tokio::task::LocalSet`]; tests run as
    /// local tasks.
    ///
    /// # Arguments
    /// * `path` - Entry file, ending in `.js`, `.mjs`, `.ts` or `.mts`
    ///
    /// # Returns
    /// Totals for every tree the file passed to `executeAsMain()`
    ///
    /// # Errors
    /// - [`EasyTestsError::UnsupportedExtension`] before any I/O
    /// - [`EasyTestsError::Resolution`] / [`EasyTestsError::Compile`] from
    ///   linking, with the failing module named
    /// - [`EasyTestsError::Evaluation`] if the entry module or a test
    ///   callback throws
    /// - [`EasyTestsError::Timeout`] for a stuck test under
    ///   [`test_model::TimeoutPolicy::Error`]
    ///
    /// # Example
    /// ```no_run
    /// use easytests::{RunOptions, Runner};
    ///
    /// let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
    /// let local = tokio::task::LocalSet::new();
    /// let report = local
    ///     .block_on(&runtime, Runner::new(RunOptions::default()).execute("math.test.ts"))
    ///     .unwrap();
    /// println!("{}", report.summary());
    /// ```
    pub async fn execute(&self, path: impl AsRef<Path>) -> EasyTestsResult<TestReport> {
        let path = path.as_ref();
        ensure_supported(path)?;
        let span = info_span!("run", file = %path.display());
        self.execute_file(path).instrument(span).await
    }

    /// Run every `*.test.{js,mjs,ts,mts}` file under `dir`, one after another.
    ///
    /// Entries that cannot be read while walking are logged and skipped.
    ///
    /// # Errors
    /// The first error from any file run.
    pub async fn run_directory(&self, dir: impl AsRef<Path>) -> EasyTestsResult<TestReport> {
        let mut report = TestReport::new();
        for file in discover_test_files(dir.as_ref()) {
            report.merge(&self.execute(&file).await?);
        }
        Ok(report)
    }

    async fn execute_file(&self, path: &Path) -> EasyTestsResult<TestReport> {
        let tick = self.options.tick();
        let resolver = SpecifierResolver::new(self.options.resolved_base_path()?);
        let graph = ModuleGraph::new(self.transformer.clone(), resolver)
            .with_dialect(self.options.dialect);
        let loader = Rc::new(GraphLoader::new(graph));
        let entry = loader.link_entry(path)?;

        let mut sandbox = Sandbox::build(
            self.options.html.as_deref(),
            &self.options.window,
            loader.clone(),
        )?;
        sandbox.set_output(MainOutput {
            surface: self.surface.clone(),
            styler: self.styler,
            policy: self.options.timeout_policy,
        });
        let sandbox = Rc::new(RefCell::new(sandbox));

        let evaluation = {
            let mut guard = sandbox.borrow_mut();
            let module = loader.module(&entry, guard.context_mut())?;
            module.load_link_evaluate(guard.context_mut())
        };
        match bridge::settle(&sandbox, evaluation.into(), tick).await {
            Ok(Settled::Fulfilled(_)) => {
                // Failures the script caught itself do not fail the run.
                loader.take_failure();
            }
            Ok(Settled::Rejected(reason)) => {
                return Err(loader.take_failure().unwrap_or_else(|| {
                    EasyTestsError::evaluation(sandbox.borrow_mut().render_value(&reason))
                }));
            }
            Err(error) => return Err(loader.take_failure().unwrap_or(error)),
        }
        info!(modules = loader.graph().len(), "entry module evaluated");

        let runs = bridge::drive(&sandbox, tick).await?;
        let mut outcome = Ok(());
        let mut report = TestReport::new();
        for run in runs {
            let waited = run.handle.wait().await;
            if outcome.is_ok() {
                outcome = waited;
            }
            report.merge(&TestReport::from_tree(&run.root));
        }
        info!(
            total = report.total,
            passed = report.passed,
            failed = report.failed,
            "run finished"
        );
        outcome.map(|()| report)
    }
}

/// Test entry files under `dir`, sorted by path
pub fn discover_test_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if TEST_FILE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            files.push(entry.into_path());
        }
    }
    files
}
