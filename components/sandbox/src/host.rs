//! Host side of the script test API.
//!
//! Script `Test` and `Group` instances are handles onto [`Node`]s stored
//! here. Natives reach this state through the context's host data rather
//! than through the [`crate::Sandbox`], since they run while the sandbox is
//! already borrowed.
//!
//! Nothing in the tree calls into the engine directly. Callback invocations,
//! `onChange` notifications and settled `execute()` promises are queued and
//! run by `drain`, which every starting native calls before returning and
//! [`crate::Sandbox::tick`] calls on every turn.

use boa_engine::{
    builtins::promise::ResolvingFunctions,
    js_string,
    native_function::NativeFunction,
    object::{
        builtins::{JsFuture, JsPromise},
        ObjectInitializer,
    },
    Context, JsArgs, JsData, JsError, JsNativeError, JsObject, JsResult, JsString, JsValue,
};
use boa_gc::{Finalize, Trace};
use core_types::{EasyTestsError, EasyTestsResult};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use test_model::{
    CallbackFuture, ConsoleSurface, ExecutionHandle, Group, Node, Reporter, Styler, Surface, Test,
    TestCallback, TestStatus, TimeoutPolicy,
};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Where `executeAsMain()` renders and what a stuck test does
#[derive(Clone)]
pub struct MainOutput {
    /// Repainted with the whole tree on every change
    pub surface: Rc<dyn Surface>,
    /// Glyph and decoration style, also used by script `toString()`
    pub styler: Styler,
    /// Reaction to a test missing its deadline
    pub policy: TimeoutPolicy,
}

impl Default for MainOutput {
    fn default() -> Self {
        Self {
            surface: Rc::new(ConsoleSurface::new()),
            styler: Styler::detect(),
            policy: TimeoutPolicy::Exit,
        }
    }
}

impl std::fmt::Debug for MainOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainOutput")
            .field("styler", &self.styler)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// A tree script code started with `executeAsMain()`
#[derive(Debug)]
pub struct MainRun {
    /// Root of the tree
    pub root: Node,
    /// One task per leaf
    pub handle: ExecutionHandle,
}

/// How a script callback returned
enum Outcome {
    Value(bool),
    Promise(JsFuture),
    Failed(EasyTestsError),
}

/// Work that needs the engine context
enum Job {
    Invoke {
        function: JsObject,
        reply: oneshot::Sender<Outcome>,
    },
    Notify {
        function: JsObject,
    },
    Settle {
        resolvers: ResolvingFunctions,
        result: EasyTestsResult<()>,
    },
}

type JobQueue = RefCell<VecDeque<Job>>;

/// Test API state for one sandbox
#[derive(Default)]
pub(crate) struct Host {
    nodes: RefCell<Vec<Node>>,
    jobs: Rc<JobQueue>,
    runs: RefCell<Vec<MainRun>>,
    executing: Cell<usize>,
    output: RefCell<MainOutput>,
}

impl Host {
    pub(crate) fn set_output(&self, output: MainOutput) {
        *self.output.borrow_mut() = output;
    }

    pub(crate) fn take_runs(&self) -> Vec<MainRun> {
        std::mem::take(&mut *self.runs.borrow_mut())
    }

    /// Nothing queued, no test still running and no `execute()` promise
    /// waiting to settle
    pub(crate) fn is_idle(&self) -> bool {
        self.jobs.borrow().is_empty()
            && self.executing.get() == 0
            && self.runs.borrow().iter().all(|run| run.handle.is_finished())
    }

    fn node(&self, id: &JsValue) -> JsResult<Node> {
        let index = id.as_number().filter(|n| n.fract() == 0.0 && *n >= 0.0);
        index
            .and_then(|index| self.nodes.borrow().get(index as usize).cloned())
            .ok_or_else(|| {
                JsNativeError::typ()
                    .with_message("not a test or group of this sandbox")
                    .into()
            })
    }

    fn declare(&self, node: Node) -> JsValue {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(node);
        JsValue::from((nodes.len() - 1) as u32)
    }
}

#[derive(Trace, Finalize, JsData)]
struct HostData {
    #[unsafe_ignore_trace]
    host: Rc<Host>,
}

/// Store `host` in the context and build the object of natives the prelude
/// receives
pub(crate) fn install(host: Rc<Host>, context: &mut Context) -> JsObject {
    context.insert_data(HostData { host });
    ObjectInitializer::new(context)
        .function(NativeFunction::from_fn_ptr(declare_test), js_string!("declareTest"), 3)
        .function(NativeFunction::from_fn_ptr(declare_group), js_string!("declareGroup"), 1)
        .function(NativeFunction::from_fn_ptr(status), js_string!("status"), 1)
        .function(NativeFunction::from_fn_ptr(time_str), js_string!("timeStr"), 1)
        .function(NativeFunction::from_fn_ptr(render), js_string!("render"), 1)
        .function(NativeFunction::from_fn_ptr(execute), js_string!("execute"), 3)
        .function(NativeFunction::from_fn_ptr(execute_as_main), js_string!("executeAsMain"), 1)
        .build()
}

/// Run every queued job, including jobs queued by the jobs themselves
pub(crate) fn drain(host: &Host, context: &mut Context) {
    loop {
        let job = host.jobs.borrow_mut().pop_front();
        let Some(job) = job else {
            return;
        };
        match job {
            Job::Invoke { function, reply } => {
                let outcome = match function.call(&JsValue::undefined(), &[], context) {
                    Ok(value) => match value.as_promise() {
                        Some(promise) => Outcome::Promise(promise.into_js_future(context)),
                        None => Outcome::Value(value.to_boolean()),
                    },
                    Err(error) => Outcome::Failed(EasyTestsError::evaluation(render_error(
                        &error, context,
                    ))),
                };
                // A dropped receiver means the test itself is gone.
                let _ = reply.send(outcome);
            }
            Job::Notify { function } => {
                if let Err(error) = function.call(&JsValue::undefined(), &[], context) {
                    warn!(error = %render_error(&error, context), "onChange threw");
                }
            }
            Job::Settle { resolvers, result } => {
                host.executing.set(host.executing.get().saturating_sub(1));
                let settled = match result {
                    Ok(()) => resolvers.resolve.call(&JsValue::undefined(), &[], context),
                    Err(error) => {
                        let reason = JsNativeError::error()
                            .with_message(error.to_string())
                            .to_opaque(context);
                        resolvers
                            .reject
                            .call(&JsValue::undefined(), &[reason.into()], context)
                    }
                };
                if let Err(error) = settled {
                    warn!(error = %render_error(&error, context), "cannot settle execute() promise");
                }
            }
        }
    }
}

/// `String(error)` for a thrown value
pub(crate) fn render_error(error: &JsError, context: &mut Context) -> String {
    let value = error.to_opaque(context);
    value
        .to_string(context)
        .map(|s| s.to_std_string_escaped())
        .unwrap_or_else(|_| value.display().to_string())
}

/// A test callback backed by a zero-argument script function.
///
/// The function runs the next time the owning sandbox drains its jobs; a
/// returned promise is awaited as the result.
pub(crate) struct ScriptCallback {
    function: JsObject,
    jobs: Rc<JobQueue>,
}

impl TestCallback for ScriptCallback {
    fn call(&self) -> CallbackFuture {
        let (reply, outcome) = oneshot::channel();
        self.jobs.borrow_mut().push_back(Job::Invoke {
            function: self.function.clone(),
            reply,
        });
        Box::pin(async move {
            match outcome.await {
                Ok(Outcome::Value(passed)) => Ok(passed),
                Ok(Outcome::Promise(result)) => match result.await {
                    Ok(value) => Ok(value.to_boolean()),
                    Err(reason) => Err(EasyTestsError::evaluation(reason.to_string())),
                },
                Ok(Outcome::Failed(error)) => Err(error),
                Err(_) => Err(EasyTestsError::evaluation(
                    "sandbox closed before the test callback ran",
                )),
            }
        })
    }
}

impl std::fmt::Debug for ScriptCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ScriptCallback")
    }
}

/// Forwards status changes to a script `onChange` function
struct ScriptReporter {
    on_change: Option<JsObject>,
    jobs: Rc<JobQueue>,
    policy: TimeoutPolicy,
}

impl Reporter for ScriptReporter {
    fn changed(&self) {
        if let Some(function) = &self.on_change {
            self.jobs.borrow_mut().push_back(Job::Notify {
                function: function.clone(),
            });
        }
    }

    fn timed_out(&self, test: &str) {
        self.policy.apply(test)
    }
}

fn host(context: &Context) -> JsResult<Rc<Host>> {
    context
        .get_data::<HostData>()
        .map(|data| data.host.clone())
        .ok_or_else(|| {
            JsNativeError::typ()
                .with_message("test API used outside its sandbox")
                .into()
        })
}

fn text(value: &JsValue, context: &mut Context) -> JsResult<String> {
    Ok(value.to_string(context)?.to_std_string_escaped())
}

/// `declareTest(name, callback, timeoutSeconds)` -> id
fn declare_test(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let host = host(context)?;
    let name = text(args.get_or_undefined(0), context)?;
    let function = args.get_or_undefined(1).as_callable().ok_or_else(|| {
        JsNativeError::typ().with_message("Test callback must be a function")
    })?;
    let timeout_seconds = args.get_or_undefined(2).to_number(context)?;

    debug!(test = %name, timeout_seconds, "declared test");
    let callback = ScriptCallback {
        function,
        jobs: host.jobs.clone(),
    };
    let test = Test::new(name, callback).with_timeout(timeout_seconds);
    Ok(host.declare(test.into()))
}

/// `declareGroup(name, ...childIds)` -> id
fn declare_group(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let host = host(context)?;
    let name = text(args.get_or_undefined(0), context)?;
    let children = args
        .iter()
        .skip(1)
        .map(|id| host.node(id))
        .collect::<JsResult<Vec<_>>>()?;
    Ok(host.declare(Group::new(name, children).into()))
}

fn leaf(host: &Host, id: &JsValue) -> JsResult<Rc<Test>> {
    match host.node(id)? {
        Node::Test(test) => Ok(test),
        Node::Group(_) => Err(JsNativeError::typ()
            .with_message("groups have no status")
            .into()),
    }
}

/// `status(id)` -> `"RUNNING"`, `"PASSED"` or `"FAILED"`
fn status(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let test = leaf(&*host(context)?, args.get_or_undefined(0))?;
    let label = match test.status() {
        TestStatus::Running => js_string!("RUNNING"),
        TestStatus::Passed => js_string!("PASSED"),
        TestStatus::Failed => js_string!("FAILED"),
    };
    Ok(label.into())
}

/// `timeStr(id)`
fn time_str(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let test = leaf(&*host(context)?, args.get_or_undefined(0))?;
    Ok(JsString::from(test.time_str()).into())
}

/// `render(id)`, backing `toString()`
fn render(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let host = host(context)?;
    let node = host.node(args.get_or_undefined(0))?;
    let styler = host.output.borrow().styler;
    Ok(JsString::from(node.render(&styler)).into())
}

/// `execute(id, startTime, onChange)` -> promise settled with the subtree
fn execute(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let host = host(context)?;
    let node = host.node(args.get_or_undefined(0))?;
    let start = start_instant(args.get_or_undefined(1).to_number(context)?);
    let reporter = Rc::new(ScriptReporter {
        on_change: args.get_or_undefined(2).as_callable(),
        jobs: host.jobs.clone(),
        policy: host.output.borrow().policy,
    });

    let handle = node.execute(start, reporter);
    let (promise, resolvers) = JsPromise::new_pending(context);
    host.executing.set(host.executing.get() + 1);
    let jobs = host.jobs.clone();
    tokio::task::spawn_local(async move {
        let result = handle.wait().await;
        jobs.borrow_mut().push_back(Job::Settle { resolvers, result });
    });

    drain(&host, context);
    Ok(promise.into())
}

/// `executeAsMain(id)`
fn execute_as_main(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let host = host(context)?;
    let root = host.node(args.get_or_undefined(0))?;
    let output = host.output.borrow().clone();

    debug!(root = %root.name(), "executing as main");
    let handle = root.execute_as_main_with(output.surface, output.styler, output.policy);
    host.runs.borrow_mut().push(MainRun { root, handle });

    drain(&host, context);
    Ok(JsValue::undefined())
}

/// Convert a `Date.now()` timestamp into the runtime clock; anything not in
/// the past means now
fn start_instant(start_ms: f64) -> Instant {
    let now = Instant::now();
    let wall_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0);
    Duration::try_from_secs_f64((wall_ms - start_ms) / 1000.0)
        .ok()
        .and_then(|ago| now.checked_sub(ago))
        .unwrap_or(now)
}
