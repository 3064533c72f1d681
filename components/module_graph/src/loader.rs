//! Engine-side module loading backed by a [`ModuleGraph`].

use crate::graph::ModuleGraph;
use boa_engine::{
    module::{Module, ModuleLoader, Referrer},
    Context, JsError, JsNativeError, JsResult, JsString, Source,
};
use core_types::{EasyTestsError, EasyTestsResult, ModuleId};
use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Serves compiled units to the engine.
///
/// Each unit is parsed into an engine module once and reused for every
/// import of the same id. Errors raised while the engine is loading are
/// kept so the caller can report them with their real kind.
pub struct GraphLoader {
    graph: RefCell<ModuleGraph>,
    modules: RefCell<HashMap<ModuleId, Module>>,
    failure: RefCell<Option<EasyTestsError>>,
}

impl GraphLoader {
    /// Wrap a graph
    pub fn new(graph: ModuleGraph) -> Self {
        Self {
            graph: RefCell::new(graph),
            modules: RefCell::new(HashMap::new()),
            failure: RefCell::new(None),
        }
    }

    /// Borrow the underlying graph
    pub fn graph(&self) -> Ref<'_, ModuleGraph> {
        self.graph.borrow()
    }

    /// Link the entry file into the graph
    pub fn link_entry(&self, entry: &Path) -> EasyTestsResult<ModuleId> {
        self.graph.borrow_mut().link_entry(entry)
    }

    /// Engine module for `id`, parsed on first use.
    ///
    /// # Errors
    /// [`EasyTestsError::Compile`] if the engine rejects the code, or
    /// [`EasyTestsError::Evaluation`] if `id` was never linked.
    pub fn module(&self, id: &ModuleId, context: &mut Context) -> EasyTestsResult<Module> {
        if let Some(module) = self.modules.borrow().get(id) {
            return Ok(module.clone());
        }

        let (code, path) = {
            let graph = self.graph.borrow();
            let unit = graph.unit(id).ok_or_else(|| {
                EasyTestsError::evaluation(format!("module `{id}` is not linked"))
            })?;
            (unit.code.clone(), graph.path_of(id).map(Path::to_path_buf))
        };

        let source = Source::from_bytes(code.as_bytes());
        let parsed = match &path {
            Some(path) => Module::parse(source.with_path(path), None, context),
            None => Module::parse(source, None, context),
        };
        let module = parsed.map_err(|e| EasyTestsError::Compile {
            path: path.clone().unwrap_or_else(|| PathBuf::from(id.as_str())),
            message: e.to_string(),
            position: None,
        })?;

        debug!(%id, "created engine module");
        self.modules.borrow_mut().insert(id.clone(), module.clone());
        Ok(module)
    }

    /// Map an engine request to a linked id, linking it now if needed
    fn resolve_request(&self, specifier: &str, referrer: Option<&Path>) -> EasyTestsResult<ModuleId> {
        let id = ModuleId::from(specifier);
        if self.graph.borrow().unit(&id).is_some() {
            return Ok(id);
        }
        debug!(specifier, ?referrer, "linking late import");
        self.graph.borrow_mut().link_specifier(specifier, referrer)
    }

    /// Take the first error raised during engine loading, if any
    pub fn take_failure(&self) -> Option<EasyTestsError> {
        self.failure.borrow_mut().take()
    }

    fn stash(&self, error: EasyTestsError) -> JsError {
        warn!(%error, "module load failed");
        let message = error.to_string();
        let mut failure = self.failure.borrow_mut();
        if failure.is_none() {
            *failure = Some(error);
        }
        JsNativeError::error().with_message(message).into()
    }
}

impl std::fmt::Debug for GraphLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphLoader")
            .field("graph", &self.graph)
            .field("modules", &self.modules.borrow().len())
            .finish()
    }
}

impl ModuleLoader for GraphLoader {
    fn load_imported_module(
        self: std::rc::Rc<Self>,
        referrer: Referrer,
        specifier: JsString,
        context: &RefCell<&mut Context>,
    ) -> impl std::future::Future<Output = JsResult<Module>> {
        let specifier = specifier.to_std_string_escaped();
        let referrer_path = referrer.path().map(Path::to_path_buf);

        async move {
            let id = self
                .resolve_request(&specifier, referrer_path.as_deref())
                .map_err(|e| self.stash(e))?;
            let mut ctx = context.borrow_mut();
            self.module(&id, &mut **ctx).map_err(|e| self.stash(e))
        }
    }
}
