// tests/run_fake_executor.rs

mod common;
use crate::common::{RecordingHandler, init_tracing};

use std::sync::{Arc, Mutex};

use taskshim::handler::{EnvHandler, SourceSettings, TaskSource, build_handler};
use taskshim::run_with;
use taskshim::types::TaskResult;
use taskshim_test_utils::FakeExecutor;

fn executor(result: TaskResult) -> (FakeExecutor, Arc<Mutex<Vec<String>>>) {
    let executed = Arc::new(Mutex::new(Vec::new()));
    (FakeExecutor::new(result, Arc::clone(&executed)), executed)
}

#[tokio::test]
async fn success_exits_zero() {
    init_tracing();
    let (exec, executed) = executor(TaskResult::success());
    let mut handler = EnvHandler::new("{}");

    assert_eq!(run_with(&exec, &mut handler).await, 0);
    assert_eq!(*executed.lock().unwrap(), vec!["local".to_string()]);
}

#[tokio::test]
async fn child_exit_code_is_propagated() {
    init_tracing();
    let (exec, _) = executor(TaskResult::failure("disk full", Some("3".to_string())));
    let mut handler = EnvHandler::new("{}");

    assert_eq!(run_with(&exec, &mut handler).await, 3);
}

#[tokio::test]
async fn labelled_failures_exit_one() {
    init_tracing();
    for exit in ["Timeout", "SignalInterruption", "signal 9", "0", "300"] {
        let (exec, _) = executor(TaskResult::failure("x", Some(exit.to_string())));
        let mut handler = EnvHandler::new("{}");
        assert_eq!(run_with(&exec, &mut handler).await, 1, "exit {exit}");
    }

    let (exec, _) = executor(TaskResult::failure("could not start", None));
    let mut handler = EnvHandler::new("{}");
    assert_eq!(run_with(&exec, &mut handler).await, 1);
}

#[tokio::test]
async fn no_work_exits_zero_without_running() {
    init_tracing();
    let (exec, executed) = executor(TaskResult::failure("never", Some("9".to_string())));
    let mut handler = RecordingHandler::empty();

    assert_eq!(run_with(&exec, &mut handler).await, 0);
    assert!(executed.lock().unwrap().is_empty());
}

#[test]
fn static_payload_builds_env_handler() {
    let source = TaskSource::detect(&SourceSettings {
        payload: Some("{}".to_string()),
        ..Default::default()
    })
    .unwrap();
    assert!(build_handler(&source).is_ok());
}

#[cfg(unix)]
#[tokio::test]
async fn real_supervisor_propagates_exit_code() {
    use crate::common::{TaskDefinitionBuilder, supervisor, with_timeout};

    init_tracing();
    let sup = supervisor(TaskDefinitionBuilder::shell("exit 7").build());
    let mut handler = EnvHandler::new("{}");

    assert_eq!(with_timeout(run_with(&sup, &mut handler)).await, 7);
}
