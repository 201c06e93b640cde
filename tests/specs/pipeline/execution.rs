//! Workflow execution specs
//!
//! Every execution terminates in exactly one of succeed or fail, retries
//! are observable in the history, and failures carry their cause.

use crate::prelude::*;
use ferry_core::{
    Clock, Execution, ExecutionState, FakeClock, FakeRegistrar, SequentialIdGen, TransitionTable,
    TriggerPayload, TIMEOUT_ERROR,
};
use ferry_engine::{EffectExecutor, ExecutionRunner, Runtime};
use std::time::Duration;

fn runtime(
    dir: &tempfile::TempDir,
    registrar: FakeRegistrar,
) -> Runtime<FakeRegistrar, FakeClock, SequentialIdGen> {
    let executor = EffectExecutor::open(dir.path().join("history.jsonl")).unwrap();
    Runtime::new(
        test_config(Duration::from_secs(720 * 60)),
        registrar,
        FakeClock::new(),
        SequentialIdGen::default(),
        executor,
    )
}

#[tokio::test]
async fn transient_failure_then_success_reaches_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let registrar = FakeRegistrar::new();
    registrar.push_retryable_failure("throttled");
    registrar.push_success(12);
    let runtime = runtime(&dir, registrar.clone());

    let execution = runtime
        .backup_once(serde_json::json!({"source": "spec"}))
        .await
        .unwrap();

    assert_eq!(execution.state, ExecutionState::Succeed);
    assert_eq!(execution.response.unwrap().assets_written, 12);
    assert_eq!(registrar.call_count(), 2);

    // The retry is observable in the execution history
    let names: Vec<String> = runtime
        .executor()
        .records()
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    let retries = names.iter().filter(|n| n.as_str() == "worker:retry").count();
    assert_eq!(retries, 1);
    assert!(names.contains(&"execution:succeeded".to_string()));
}

#[tokio::test]
async fn failure_on_all_attempts_reaches_fail_with_error_payload() {
    let dir = tempfile::tempdir().unwrap();
    let registrar = FakeRegistrar::new();
    registrar.push_retryable_failure("unavailable");
    registrar.push_retryable_failure("still unavailable");
    let runtime = runtime(&dir, registrar.clone());

    let execution = runtime
        .backup_once(serde_json::json!({"source": "spec"}))
        .await
        .unwrap();

    assert_eq!(execution.state, ExecutionState::Fail);
    let cause = execution.error.expect("dedicated error field populated");
    assert!(!cause.error.is_empty());
    assert!(cause.cause.contains("still unavailable"));

    // Recorded, not fatal: the next backup still runs
    let next = runtime
        .backup_once(serde_json::json!({"source": "spec"}))
        .await
        .unwrap();
    assert_eq!(next.state, ExecutionState::Succeed);
}

#[tokio::test]
async fn every_execution_reaches_exactly_one_terminal_state() {
    let dir = tempfile::tempdir().unwrap();
    let registrar = FakeRegistrar::new();
    registrar.push_retryable_failure("flaky");
    registrar.push_permanent_failure("bad input");
    let runtime = runtime(&dir, registrar);

    for _ in 0..4 {
        let execution = runtime
            .backup_once(serde_json::json!({"source": "spec"}))
            .await
            .unwrap();
        assert!(execution.is_terminal());
        assert!(matches!(
            execution.state,
            ExecutionState::Succeed | ExecutionState::Fail
        ));
        // Terminal exactly once: success and failure never coexist
        assert!(execution.error.is_some() != execution.response.is_some());
    }
}

#[tokio::test]
async fn timeout_is_surfaced_like_a_task_failure() {
    let dir = tempfile::tempdir().unwrap();
    let registrar = FakeRegistrar::new();
    let executor = EffectExecutor::open(dir.path().join("history.jsonl")).unwrap();
    let clock = FakeClock::new();
    let config = test_config(Duration::from_secs(720 * 60));

    let execution = Execution::new(
        "exec-timeout".into(),
        TriggerPayload::new(clock.now_utc(), serde_json::json!({"source": "spec"})),
        config.retry.clone(),
        Duration::from_secs(5 * 60),
        TransitionTable::standard(),
        1,
        &clock,
    );
    // The whole run has outlived its five-minute bound before the first
    // invocation goes out
    clock.advance(Duration::from_secs(6 * 60));

    let runner = ExecutionRunner::new(registrar.clone(), clock.clone(), executor.clone());
    let result = runner.run(execution).await.unwrap();

    assert_eq!(result.state, ExecutionState::Fail);
    assert_eq!(result.error.unwrap().error, TIMEOUT_ERROR);
    assert_eq!(registrar.call_count(), 0);

    // Surfaced the same way as a task failure
    let names: Vec<String> = executor
        .records()
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert!(names.contains(&"execution:failed".to_string()));
}
