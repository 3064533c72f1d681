use boa_engine::{builtins::promise::PromiseState, module::IdleModuleLoader};
use sandbox::{MainOutput, Sandbox, WindowOptions, TEST_API_BINDING};
use std::rc::Rc;
use std::time::Duration;
use test_model::{MemorySurface, Styler, TestStatus, TimeoutPolicy};
use tokio::task::LocalSet;

fn sandbox(html: Option<&str>, options: &WindowOptions) -> Sandbox {
    Sandbox::build(html, options, Rc::new(IdleModuleLoader)).expect("Should build sandbox")
}

fn plain_sandbox() -> Sandbox {
    let mut sb = sandbox(None, &WindowOptions::default());
    sb.set_output(MainOutput {
        surface: Rc::new(MemorySurface::new()),
        styler: Styler::plain(),
        policy: TimeoutPolicy::Error,
    });
    sb
}

fn text(sandbox: &mut Sandbox, code: &str) -> String {
    let value = sandbox.eval(code).expect("Should evaluate");
    sandbox.render_value(&value)
}

#[cfg(test)]
mod window_tests {
    use super::*;

    #[test]
    fn test_window_aliases_global() {
        let mut sb = sandbox(None, &WindowOptions::default());
        assert_eq!(text(&mut sb, "window === globalThis && self === window"), "true");
    }

    #[test]
    fn test_document_from_html() {
        let mut sb = sandbox(
            Some("<html><head><title>Page</title></head><body><p id=\"x\">Hello</p></body></html>"),
            &WindowOptions::default(),
        );
        assert_eq!(text(&mut sb, "document.title"), "Page");
        assert_eq!(text(&mut sb, "document.body.textContent"), "Hello");
        assert_eq!(text(&mut sb, "document.readyState"), "complete");
        assert_eq!(sb.document().title, "Page");
    }

    #[test]
    fn test_location_and_navigator() {
        let options = WindowOptions::default().with_url("https://app.test:8080/index.html?a=1");
        let mut sb = sandbox(None, &options);
        assert_eq!(text(&mut sb, "location.hostname"), "app.test");
        assert_eq!(text(&mut sb, "location.search"), "?a=1");
        assert_eq!(text(&mut sb, "document.URL"), "https://app.test:8080/index.html?a=1");
        assert!(text(&mut sb, "navigator.userAgent").contains("EasyTests"));
    }

    #[test]
    fn test_extra_options_exposed() {
        let options: WindowOptions =
            serde_json::from_str(r#"{ "runScripts": "dangerously", "resources": "usable" }"#).unwrap();
        let mut sb = sandbox(None, &options);
        assert_eq!(text(&mut sb, "window.__options__.runScripts"), "dangerously");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let options = WindowOptions::default().with_url("not a url");
        let err = Sandbox::build(None, &options, Rc::new(IdleModuleLoader)).unwrap_err();
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn test_animation_frame_only_when_visual() {
        let mut plain = sandbox(None, &WindowOptions::default());
        assert_eq!(text(&mut plain, "typeof requestAnimationFrame"), "undefined");

        let mut visual = sandbox(None, &WindowOptions::default().visual());
        assert_eq!(text(&mut visual, "typeof requestAnimationFrame"), "function");
    }

    #[test]
    fn test_sandboxes_are_isolated() {
        let mut first = sandbox(None, &WindowOptions::default());
        let mut second = sandbox(None, &WindowOptions::default());
        first.eval("globalThis.leak = 1;").unwrap();
        assert_eq!(text(&mut second, "typeof leak"), "undefined");
    }
}

#[cfg(test)]
mod test_api_tests {
    use super::*;

    #[test]
    fn test_api_bound_and_fixed() {
        let mut sb = sandbox(None, &WindowOptions::default());
        let probe = format!("typeof {TEST_API_BINDING}.Test + ' ' + typeof {TEST_API_BINDING}.Group");
        assert_eq!(text(&mut sb, &probe), "function function");

        sb.eval(&format!("{TEST_API_BINDING} = null;")).unwrap();
        assert_eq!(text(&mut sb, &format!("typeof {TEST_API_BINDING}")), "object");
        assert_eq!(text(&mut sb, &format!("{TEST_API_BINDING} === null")), "false");
    }

    #[test]
    fn test_constructor_validation() {
        let mut sb = sandbox(None, &WindowOptions::default());
        let err = sb.eval("new $EASYTESTS.Test(1, () => true)").unwrap_err();
        assert!(err.is_evaluation());
        assert!(err.to_string().contains("TypeError"));

        assert!(sb.eval("new $EASYTESTS.Test('a', 'nope')").is_err());
        assert!(sb.eval("new $EASYTESTS.Group('g', {})").is_err());
        assert!(sb.eval("new $EASYTESTS.Group('g', new $EASYTESTS.Test('a', () => true))").is_ok());
    }

    #[test]
    fn test_objects_render_before_running() {
        let mut sb = plain_sandbox();
        let rendered = text(
            &mut sb,
            "const { Test, Group } = $EASYTESTS;\n\
             const t = new Test('a', () => true);\n\
             [t.status, t.timeStr, String(new Group('G', t, new Group('inner')))].join('|')",
        );
        assert_eq!(rendered, "RUNNING|--s|G:\n ⏳ --s a\n inner:");
    }

    #[test]
    fn test_foreign_children_rejected() {
        let mut sb = plain_sandbox();
        let err = sb
            .eval("new $EASYTESTS.Group('g', Object.create($EASYTESTS.Test.prototype))")
            .unwrap_err();
        assert!(err.to_string().contains("Not a Test or Group"));
    }

    #[tokio::test]
    async fn test_execute_as_main_starts_immediately() {
        let mut sb = plain_sandbox();
        let surface = Rc::new(MemorySurface::new());
        sb.set_output(MainOutput {
            surface: surface.clone(),
            styler: Styler::plain(),
            policy: TimeoutPolicy::Error,
        });

        LocalSet::new()
            .run_until(async {
                let calls = text(
                    &mut sb,
                    "const { Test, Group } = $EASYTESTS;\n\
                     globalThis.calls = [];\n\
                     new Group('root', new Test('a', () => calls.push('a'), 5), new Group('inner', new Test('b', () => calls.push('b') > 5))).executeAsMain();\n\
                     calls.join()",
                );
                assert_eq!(calls, "a,b");

                let runs = sb.take_runs();
                assert_eq!(runs.len(), 1);
                assert_eq!(runs[0].root.name(), "root");
                let leaves = runs[0].root.leaves();
                assert_eq!(leaves[0].1.timeout(), Duration::from_secs(5));
                assert_eq!(leaves[1].0, vec!["root", "inner", "b"]);

                for run in runs {
                    run.handle.wait().await.unwrap();
                }
                assert!(sb.take_runs().is_empty());
            })
            .await;

        assert_eq!(
            surface.last().unwrap(),
            "root:\n ✔  00s a\n inner:\n  ✖  00s b"
        );
    }

    #[tokio::test]
    async fn test_default_timeout() {
        let mut sb = plain_sandbox();
        LocalSet::new()
            .run_until(async {
                sb.eval("new $EASYTESTS.Test('solo', () => true).executeAsMain();").unwrap();
                let run = sb.take_runs().remove(0);
                assert_eq!(run.root.leaves()[0].1.timeout(), Duration::from_secs(30));
                run.handle.wait().await.unwrap();
            })
            .await;
    }

    #[tokio::test]
    async fn test_promise_results_settle_through_tick() {
        let mut sb = plain_sandbox();
        LocalSet::new()
            .run_until(async {
                sb.eval("new $EASYTESTS.Test('async', async () => 1 + 1 === 2).executeAsMain();")
                    .unwrap();
                let run = sb.take_runs().remove(0);
                assert!(!sb.is_idle().unwrap());
                while !run.handle.is_finished() {
                    sb.tick().unwrap();
                    tokio::task::yield_now().await;
                }
                assert_eq!(run.root.leaves()[0].1.status(), TestStatus::Passed);
                assert!(sb.is_idle().unwrap());
            })
            .await;
    }

    #[test]
    fn test_promise_state() {
        let mut sb = plain_sandbox();
        let value = sb.eval("Promise.resolve(7)").unwrap();
        sb.tick().unwrap();
        match sb.promise_state(&value) {
            Some(PromiseState::Fulfilled(result)) => assert_eq!(result.as_number(), Some(7.0)),
            other => panic!("unexpected state: {other:?}"),
        }
        assert!(sb.promise_state(&boa_engine::JsValue::from(true)).is_none());
    }
}

#[cfg(test)]
mod timer_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_fire_when_due() {
        let mut sb = sandbox(None, &WindowOptions::default());
        sb.eval("globalThis.hits = []; setTimeout(() => hits.push('late'), 100); setTimeout(() => hits.push('soon'), 0);")
            .unwrap();
        assert_eq!(sb.pending_timers().unwrap(), 2);

        assert_eq!(sb.tick().unwrap(), 1);
        assert_eq!(text(&mut sb, "hits.join()"), "soon");

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(sb.tick().unwrap(), 1);
        assert_eq!(text(&mut sb, "hits.join()"), "soon,late");
        assert_eq!(sb.pending_timers().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_and_interval() {
        let mut sb = sandbox(None, &WindowOptions::default());
        sb.eval(
            "globalThis.count = 0;\n\
             const id = setTimeout(() => { count = -100; }, 10);\n\
             clearTimeout(id);\n\
             globalThis.every = setInterval(() => { count += 1; }, 10);",
        )
        .unwrap();

        tokio::time::advance(Duration::from_millis(35)).await;
        sb.tick().unwrap();
        assert_eq!(text(&mut sb, "count"), "3");

        sb.eval("clearInterval(every);").unwrap();
        assert_eq!(sb.pending_timers().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_promise_resolved_by_timer() {
        let mut sb = sandbox(None, &WindowOptions::default());
        let value = sb
            .eval("new Promise((resolve) => setTimeout(() => resolve('done'), 50))")
            .unwrap();
        sb.tick().unwrap();
        assert!(matches!(sb.promise_state(&value), Some(PromiseState::Pending)));

        tokio::time::advance(Duration::from_millis(50)).await;
        sb.tick().unwrap();
        assert!(matches!(sb.promise_state(&value), Some(PromiseState::Fulfilled(_))));
    }

    #[test]
    fn test_throwing_timer_does_not_stop_others() {
        let mut sb = sandbox(None, &WindowOptions::default());
        sb.eval("globalThis.ran = false; setTimeout(() => { throw new Error('boom'); }); setTimeout(() => { ran = true; });")
            .unwrap();
        assert_eq!(sb.tick().unwrap(), 2);
        assert_eq!(text(&mut sb, "ran"), "true");
    }

    #[test]
    fn test_console_available() {
        let mut sb = sandbox(None, &WindowOptions::default());
        assert_eq!(text(&mut sb, "typeof console.log + ' ' + typeof console.error"), "function function");
        sb.eval("console.log('from the sandbox', { a: 1 });").unwrap();
    }

    #[test]
    fn test_microtasks_run_on_tick() {
        let mut sb = sandbox(None, &WindowOptions::default());
        sb.eval("globalThis.flag = 'no'; queueMicrotask(() => { flag = 'yes'; });").unwrap();
        sb.tick().unwrap();
        assert_eq!(text(&mut sb, "flag"), "yes");
    }
}
