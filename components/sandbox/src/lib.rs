//! Sandbox Builder Component
//!
//! One isolated script environment per test file: a fresh engine context
//! whose global object looks enough like a browser window for tests, with
//! the test API injected under a fixed name.
//!
//! # Overview
//!
//! - [`WindowOptions`] - Window construction options
//! - [`DocumentEngine`] / [`StaticDocument`] - Simulated document
//! - [`Location`] - `window.location` derived from the URL
//! - [`Bindings`] - Explicit table of injected globals
//! - [`MainOutput`] / [`MainRun`] - Where script `executeAsMain()` renders,
//!   and the trees it started
//! - [`Sandbox`] - The built environment
//!
//! Script `Test` and `Group` objects are handles onto test model nodes.
//! `executeAsMain()` and `execute()` start the tree immediately, spawning
//! local tasks, so scripts that call them must be evaluated inside a
//! [`tokio::task::LocalSet`].
//!
//! # Example
//!
//! ```
//! use boa_engine::module::IdleModuleLoader;
//! use sandbox::{Sandbox, WindowOptions, TEST_API_BINDING};
//! use std::rc::Rc;
//!
//! let mut sandbox = Sandbox::build(
//!     Some("<title>Demo</title>"),
//!     &WindowOptions::default(),
//!     Rc::new(IdleModuleLoader),
//! )
//! .unwrap();
//! let title = sandbox.eval("document.title").unwrap();
//! assert_eq!(sandbox.render_value(&title), "Demo");
//! assert_eq!(TEST_API_BINDING, "$EASYTESTS");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bindings;
pub mod console;
pub mod document;
mod host;
pub mod location;
pub mod options;

pub use bindings::{BindingValue, Bindings};
pub use console::TracingLogger;
pub use document::{Document, DocumentEngine, StaticDocument};
pub use host::{MainOutput, MainRun};
pub use location::Location;
pub use options::WindowOptions;

use boa_engine::{
    builtins::promise::PromiseState, context::ContextBuilder, module::ModuleLoader,
    object::builtins::JsPromise, Context, JsError, JsObject, JsValue, Source,
};
use core_types::{EasyTestsError, EasyTestsResult};
use host::Host;
use std::rc::Rc;
use tokio::time::Instant;
use tracing::debug;

/// Global name the test API is bound to
pub const TEST_API_BINDING: &str = "$EASYTESTS";

const PRELUDE: &str = include_str!("prelude.js");

/// An isolated script environment for one test-file run
pub struct Sandbox {
    context: Context,
    host: Rc<Host>,
    hooks: JsObject,
    document: Document,
    location: Location,
    started: Instant,
}

impl Sandbox {
    /// Build a sandbox with the default [`StaticDocument`] engine.
    ///
    /// Root runs render to the console until [`Sandbox::set_output`] says
    /// otherwise.
    ///
    /// # Arguments
    /// * `html` - Markup seeding the document
    /// * `options` - Window options
    /// * `loader` - Module loader the engine context uses for imports
    ///
    /// # Errors
    /// Returns [`EasyTestsError::Config`] for an invalid window URL and
    /// [`EasyTestsError::Evaluation`] if the environment cannot be set up.
    pub fn build<L: ModuleLoader + 'static>(
        html: Option<&str>,
        options: &WindowOptions,
        loader: Rc<L>,
    ) -> EasyTestsResult<Self> {
        Self::build_with(&StaticDocument::new()?, html, options, loader)
    }

    /// Build a sandbox with a custom document engine
    pub fn build_with<L: ModuleLoader + 'static>(
        engine: &dyn DocumentEngine,
        html: Option<&str>,
        options: &WindowOptions,
        loader: Rc<L>,
    ) -> EasyTestsResult<Self> {
        let document = engine.create(html, options)?;
        let location = Location::parse(&options.url)?;

        let mut context = ContextBuilder::default()
            .module_loader(loader)
            .build()
            .map_err(|e| EasyTestsError::evaluation(format!("cannot create context: {e}")))?;
        console::register(&mut context)?;

        let host = Rc::new(Host::default());
        let natives = host::install(host.clone(), &mut context);
        let hooks = install_prelude(&mut context, natives, options.pretend_to_be_visual)?;
        let api = get(&hooks, "api", &mut context)?
            .as_object()
            .ok_or_else(|| EasyTestsError::evaluation("test API missing from prelude"))?;

        let navigator = serde_json::json!({
            "userAgent": options.user_agent,
            "language": "en-US",
            "languages": ["en-US", "en"],
            "onLine": true,
        });
        let mut bindings = Bindings::new();
        bindings
            .insert("window", BindingValue::Global)
            .insert("self", BindingValue::Global)
            .insert("document", BindingValue::Json(to_json(&document)?))
            .insert("location", BindingValue::Json(to_json(&location)?))
            .insert("navigator", BindingValue::Json(navigator))
            .insert(
                "__options__",
                BindingValue::Json(serde_json::Value::Object(
                    options.extra.clone().into_iter().collect(),
                )),
            );
        bindings.install(&mut context)?;
        bindings::define_constant(&mut context, TEST_API_BINDING, api.into())?;

        debug!(url = %options.url, "sandbox ready");
        Ok(Self {
            context,
            host,
            hooks,
            document,
            location,
            started: Instant::now(),
        })
    }

    /// Render root runs to `output` from now on
    pub fn set_output(&mut self, output: MainOutput) {
        self.host.set_output(output);
    }

    /// The engine context
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The engine context, mutably
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Document the sandbox was built with
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Parsed window location
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Evaluate a script in the global scope
    pub fn eval(&mut self, code: &str) -> EasyTestsResult<JsValue> {
        let result = self.context.eval(Source::from_bytes(code.as_bytes()));
        result.map_err(|e| self.evaluation_error(&e))
    }

    /// One turn of the event loop: run queued test API work, fire due
    /// timers, then run queued promise jobs.
    ///
    /// Returns how many timer callbacks ran.
    pub fn tick(&mut self) -> EasyTestsResult<usize> {
        host::drain(&self.host, &mut self.context);
        let now = self.started.elapsed().as_millis() as f64;
        let fired = self.call_hook("tick", &[JsValue::from(now)])?;
        let fired = fired.to_number(&mut self.context).unwrap_or(0.0) as usize;
        let jobs = self.context.run_jobs();
        jobs.map_err(|e| self.evaluation_error(&e))?;
        host::drain(&self.host, &mut self.context);
        Ok(fired)
    }

    /// Number of scheduled timers that have not fired or been cleared
    pub fn pending_timers(&mut self) -> EasyTestsResult<usize> {
        let count = self.call_hook("pendingTimers", &[])?;
        Ok(count.to_number(&mut self.context).unwrap_or(0.0) as usize)
    }

    /// Check if nothing can make progress without outside input: no timer
    /// scheduled, no test running and no test API work queued
    pub fn is_idle(&mut self) -> EasyTestsResult<bool> {
        Ok(self.pending_timers()? == 0 && self.host.is_idle())
    }

    /// Drain the trees script code started with `executeAsMain()`, oldest
    /// first
    pub fn take_runs(&mut self) -> Vec<MainRun> {
        self.host.take_runs()
    }

    /// Settlement state if `value` is a promise
    pub fn promise_state(&self, value: &JsValue) -> Option<PromiseState> {
        value
            .as_object()
            .and_then(|object| JsPromise::from_object(object).ok())
            .map(|promise| promise.state())
    }

    /// Render a script value the way `String(value)` would
    pub fn render_value(&mut self, value: &JsValue) -> String {
        value
            .to_string(&mut self.context)
            .map(|s| s.to_std_string_escaped())
            .unwrap_or_else(|_| value.display().to_string())
    }

    /// Turn an engine error into an evaluation error
    pub fn evaluation_error(&mut self, error: &JsError) -> EasyTestsError {
        EasyTestsError::evaluation(host::render_error(error, &mut self.context))
    }

    fn call_hook(&mut self, method: &str, args: &[JsValue]) -> EasyTestsResult<JsValue> {
        let function = get(&self.hooks, method, &mut self.context)?
            .as_callable()
            .ok_or_else(|| EasyTestsError::evaluation(format!("host hook `{method}` missing")))?;
        let result = function.call(&JsValue::undefined(), args, &mut self.context);
        result.map_err(|e| self.evaluation_error(&e))
    }
}

impl std::fmt::Debug for Sandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sandbox")
            .field("url", &self.location.href)
            .field("title", &self.document.title)
            .finish()
    }
}

fn install_prelude(
    context: &mut Context,
    natives: JsObject,
    visual: bool,
) -> EasyTestsResult<JsObject> {
    let factory = context
        .eval(Source::from_bytes(PRELUDE.as_bytes()))
        .map_err(|e| EasyTestsError::evaluation(format!("prelude failed: {e}")))?;
    let factory = factory
        .as_callable()
        .ok_or_else(|| EasyTestsError::evaluation("prelude did not produce a function"))?;
    let hooks = factory
        .call(
            &JsValue::undefined(),
            &[natives.into(), JsValue::from(visual)],
            context,
        )
        .map_err(|e| EasyTestsError::evaluation(format!("prelude failed: {e}")))?;

    hooks
        .as_object()
        .ok_or_else(|| EasyTestsError::evaluation("prelude did not return its hooks"))
}

fn get(object: &JsObject, key: &str, context: &mut Context) -> EasyTestsResult<JsValue> {
    object
        .get(boa_engine::JsString::from(key), context)
        .map_err(|e| EasyTestsError::evaluation(format!("cannot read `{key}`: {e}")))
}

fn to_json(value: &impl serde::Serialize) -> EasyTestsResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| EasyTestsError::Config {
        message: e.to_string(),
    })
}
