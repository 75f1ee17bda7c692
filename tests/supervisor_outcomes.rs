// tests/supervisor_outcomes.rs

#![cfg(unix)]

mod common;
use crate::common::{
    HandlerCall, RecordingHandler, TaskDefinitionBuilder, init_tracing, supervisor, with_timeout,
};

use taskshim::types::{DEFAULT_ERROR_LABEL, TaskResult};

#[tokio::test]
async fn success_hands_stdout_response_to_handler() {
    init_tracing();
    let task = TaskDefinitionBuilder::shell("echo starting; echo '-=result=-'; echo HELLO").build();
    let mut handler = RecordingHandler::new("job-1", "{}");

    let result = with_timeout(supervisor(task).execute(&mut handler)).await;

    assert_eq!(result, Some(TaskResult::success()));
    assert_eq!(
        handler.calls(),
        vec![
            HandlerCall::Initialize,
            HandlerCall::Receive,
            HandlerCall::Success(Some("HELLO".to_string())),
        ]
    );
}

#[tokio::test]
async fn last_marked_line_wins() {
    init_tracing();
    let task = TaskDefinitionBuilder::shell(
        "echo '-=result=-'; echo first; echo noise; echo '-=result=-'; echo second",
    )
    .build();
    let mut handler = RecordingHandler::new("job-2", "");

    with_timeout(supervisor(task).execute(&mut handler)).await;

    assert_eq!(
        handler.calls().last(),
        Some(&HandlerCall::Success(Some("second".to_string())))
    );
}

#[tokio::test]
async fn success_without_marker_has_no_response() {
    init_tracing();
    let task = TaskDefinitionBuilder::shell("echo just logging").build();
    let mut handler = RecordingHandler::new("job-3", "");

    let result = with_timeout(supervisor(task).execute(&mut handler)).await;

    assert_eq!(result, Some(TaskResult::success()));
    assert_eq!(handler.calls().last(), Some(&HandlerCall::Success(None)));
}

#[tokio::test]
async fn non_zero_exit_reads_error_from_stderr() {
    init_tracing();
    let task = TaskDefinitionBuilder::shell(
        r#"echo '-=error=-' >&2; echo '{"error":"disk full"}' >&2; exit 3"#,
    )
    .build();
    let mut handler = RecordingHandler::new("job-4", "");

    let result = with_timeout(supervisor(task).execute(&mut handler))
        .await
        .expect("task was received");

    let expected = TaskResult::failure("disk full", Some("3".to_string()));
    assert_eq!(result, expected);
    assert_eq!(result.exit_code(), 3);
    assert_eq!(handler.calls().last(), Some(&HandlerCall::Failure(expected)));
}

#[tokio::test]
async fn unparsable_error_response_falls_back_to_default_label() {
    init_tracing();
    let task = TaskDefinitionBuilder::shell("echo '-=error=-' >&2; echo oops >&2; exit 1").build();
    let mut handler = RecordingHandler::new("job-5", "");

    let result = with_timeout(supervisor(task).execute(&mut handler))
        .await
        .expect("task was received");

    assert_eq!(result.error.as_deref(), Some(DEFAULT_ERROR_LABEL));
    assert_eq!(result.exit.as_deref(), Some("1"));
}

#[tokio::test]
async fn stdout_response_is_ignored_on_failure() {
    init_tracing();
    let task = TaskDefinitionBuilder::shell("echo '-=result=-'; echo partial; exit 2").build();
    let mut handler = RecordingHandler::new("job-6", "");

    let result = with_timeout(supervisor(task).execute(&mut handler))
        .await
        .expect("task was received");

    assert_eq!(
        result,
        TaskResult::failure(DEFAULT_ERROR_LABEL, Some("2".to_string()))
    );
}

#[tokio::test]
async fn start_failure_is_reported_without_exit() {
    init_tracing();
    let task = TaskDefinitionBuilder::new("/definitely/not/a/binary").build();
    let mut handler = RecordingHandler::new("job-7", "");

    let result = with_timeout(supervisor(task).execute(&mut handler))
        .await
        .expect("task was received");

    assert!(result.exit.is_none());
    let error = result.error.clone().unwrap_or_default();
    assert!(error.contains("/definitely/not/a/binary"), "got: {error}");
    assert_eq!(result.exit_code(), 1);

    let calls = handler.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[2], HandlerCall::Failure(result));
}

#[tokio::test]
async fn child_sees_task_id_and_payload_in_environment() {
    init_tracing();
    let task = TaskDefinitionBuilder::shell(r#"echo '-=result=-'; echo "$TASK_ID:$TASK_PAYLOAD""#)
        .build();
    let mut handler = RecordingHandler::new("job-8", r#"{"n":1}"#);

    with_timeout(supervisor(task).execute(&mut handler)).await;

    assert_eq!(
        handler.calls().last(),
        Some(&HandlerCall::Success(Some(r#"job-8:{"n":1}"#.to_string())))
    );
}

#[tokio::test]
async fn payload_arrives_on_stdin_followed_by_eof() {
    init_tracing();
    let task = TaskDefinitionBuilder::shell("echo '-=result=-'; cat").build();
    let mut handler = RecordingHandler::new("job-9", "from stdin");

    with_timeout(supervisor(task).execute(&mut handler)).await;

    assert_eq!(
        handler.calls().last(),
        Some(&HandlerCall::Success(Some("from stdin".to_string())))
    );
}

#[tokio::test]
async fn empty_payload_gives_empty_input() {
    init_tracing();
    let task = TaskDefinitionBuilder::shell(
        r#"test -z "$TASK_PAYLOAD" || exit 9; n=$(cat | wc -c); test "$n" -eq 0 || exit 8"#,
    )
    .build();
    let mut handler = RecordingHandler::new("job-10", "");

    let result = with_timeout(supervisor(task).execute(&mut handler)).await;

    assert_eq!(result, Some(TaskResult::success()));
}

#[tokio::test]
async fn child_ignoring_stdin_still_succeeds() {
    init_tracing();
    let task = TaskDefinitionBuilder::shell("exit 0").build();
    let big = "x".repeat(1 << 20);
    let mut handler = RecordingHandler::new("job-11", &big);

    let result = with_timeout(supervisor(task).execute(&mut handler)).await;

    assert_eq!(result, Some(TaskResult::success()));
}

#[tokio::test]
async fn signal_killed_child_reports_the_signal() {
    init_tracing();
    let task = TaskDefinitionBuilder::shell("kill -9 $$").build();
    let mut handler = RecordingHandler::new("job-12", "");

    let result = with_timeout(supervisor(task).execute(&mut handler))
        .await
        .expect("task was received");

    assert_eq!(result.exit.as_deref(), Some("signal 9"));
    assert_eq!(result.error.as_deref(), Some(DEFAULT_ERROR_LABEL));
    assert_eq!(result.exit_code(), 1);
}

#[tokio::test]
async fn no_work_means_no_process_and_no_terminal_call() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran");
    let task = TaskDefinitionBuilder::shell(&format!("touch {}", marker.display())).build();
    let mut handler = RecordingHandler::empty();

    let result = with_timeout(supervisor(task).execute(&mut handler)).await;

    assert_eq!(result, None);
    assert_eq!(handler.calls(), vec![HandlerCall::Initialize, HandlerCall::Receive]);
    assert!(!marker.exists());
}
