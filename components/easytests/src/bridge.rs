//! Event-loop pumping between the sandbox and the tokio runtime.

use boa_engine::{builtins::promise::PromiseState, JsValue};
use core_types::{EasyTestsError, EasyTestsResult};
use sandbox::{MainRun, Sandbox};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// How a script value ended up once its promise (if any) settled
#[derive(Debug, Clone)]
pub enum Settled {
    /// Plain value or fulfilled promise
    Fulfilled(JsValue),
    /// Rejected promise, with the reason
    Rejected(JsValue),
}

/// Pump the sandbox event loop until `value` is no longer a pending promise.
///
/// Each round fires due timers, drains the job queue and then yields to the
/// runtime for `tick`, so running tests make progress in between. A promise
/// still pending while the sandbox is idle can never settle and is reported
/// as an evaluation error.
pub async fn settle(
    sandbox: &Rc<RefCell<Sandbox>>,
    value: JsValue,
    tick: Duration,
) -> EasyTestsResult<Settled> {
    loop {
        let (state, idle) = {
            let mut sandbox = sandbox.borrow_mut();
            sandbox.tick()?;
            (sandbox.promise_state(&value), sandbox.is_idle()?)
        };
        match state {
            None => return Ok(Settled::Fulfilled(value)),
            Some(PromiseState::Fulfilled(result)) => return Ok(Settled::Fulfilled(result)),
            Some(PromiseState::Rejected(reason)) => return Ok(Settled::Rejected(reason)),
            Some(PromiseState::Pending) if idle => {
                return Err(EasyTestsError::evaluation(
                    "module evaluation is waiting on a promise that can never settle",
                ));
            }
            Some(PromiseState::Pending) => tokio::time::sleep(tick).await,
        }
    }
}

/// Keep the event loop turning until every tree started with
/// `executeAsMain()` has settled, including trees started while waiting.
pub async fn drive(sandbox: &Rc<RefCell<Sandbox>>, tick: Duration) -> EasyTestsResult<Vec<MainRun>> {
    let mut runs = Vec::new();
    loop {
        {
            let mut sandbox = sandbox.borrow_mut();
            sandbox.tick()?;
            runs.extend(sandbox.take_runs());
        }
        if runs.iter().all(|run| run.handle.is_finished()) {
            return Ok(runs);
        }
        tokio::time::sleep(tick).await;
    }
}
