//! `console` and `queueMicrotask` for sandboxed scripts.

use boa_engine::{Context, JsResult};
use boa_gc::{Finalize, Trace};
use boa_runtime::{
    extensions::{ConsoleExtension, MicrotaskExtension},
    register_extensions, ConsoleState, Logger,
};
use core_types::{EasyTestsError, EasyTestsResult};
use tracing::{error, info, warn};

/// Console sink writing to the terminal and the `easytests::console`
/// tracing target
#[derive(Debug, Clone, Default, Trace, Finalize)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, msg: String, _state: &ConsoleState, _context: &mut Context) -> JsResult<()> {
        info!(target: "easytests::console", "{msg}");
        println!("{msg}");
        Ok(())
    }

    fn info(&self, msg: String, _state: &ConsoleState, _context: &mut Context) -> JsResult<()> {
        info!(target: "easytests::console", "{msg}");
        println!("{msg}");
        Ok(())
    }

    fn warn(&self, msg: String, _state: &ConsoleState, _context: &mut Context) -> JsResult<()> {
        warn!(target: "easytests::console", "{msg}");
        eprintln!("{msg}");
        Ok(())
    }

    fn error(&self, msg: String, _state: &ConsoleState, _context: &mut Context) -> JsResult<()> {
        error!(target: "easytests::console", "{msg}");
        eprintln!("{msg}");
        Ok(())
    }
}

/// Register `console` and `queueMicrotask` on the global object
pub(crate) fn register(context: &mut Context) -> EasyTestsResult<()> {
    register_extensions(
        (ConsoleExtension(TracingLogger), MicrotaskExtension),
        None,
        context,
    )
    .map_err(|e| EasyTestsError::evaluation(format!("cannot register console: {e}")))
}
