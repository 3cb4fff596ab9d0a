use super::common::*;
use blok_deploy::JobState;
use blok_pipeline::{
    ErrorKind, PipelineError, ResumeOptions, RunOutcome, RunRequest, RunStore, StepKind,
};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn failed_deployment_resumes_without_resubmitting() {
    let h = Harness::new();
    h.platform.set_state(JobState::Failed);
    let orchestrator = h.orchestrator();

    let first = orchestrator
        .run(RunRequest::create("Task Manager", h.destination(), task_schema()))
        .await
        .unwrap();
    assert_eq!(first.outcome, RunOutcome::Failed);
    let blocking = first.blocking_error.clone().unwrap();
    assert_eq!(blocking.step, "await-deployment");
    assert_eq!(blocking.error.kind, ErrorKind::DeploymentFailed);
    assert_eq!(first.next_steps, vec![format!("blok resume {}", first.root.display())]);
    assert!(!first.root.join("src/types/generated.ts").exists());

    h.platform.set_state(JobState::Succeeded);
    let second = orchestrator
        .resume(&first.root, ResumeOptions::default())
        .await
        .unwrap();

    assert_eq!(second.outcome, RunOutcome::Succeeded, "{}", second);
    assert_eq!(second.run_id, first.run_id);
    assert_eq!(h.platform.submits(), 1);

    let saved = h.store.load(&second.root).unwrap().unwrap();
    assert_eq!(saved.step(&StepKind::ProvisionTemplate).unwrap().attempts, 1);
    assert_eq!(saved.step(&StepKind::SubmitDeployment).unwrap().attempts, 1);
    assert_eq!(saved.step(&StepKind::AwaitDeployment).unwrap().attempts, 2);
}

#[tokio::test]
async fn resubmit_discards_the_previous_job() {
    let h = Harness::new();
    h.platform.set_state(JobState::TimedOut);
    let orchestrator = h.orchestrator();

    let first = orchestrator
        .run(RunRequest::create("Task Manager", h.destination(), task_schema()))
        .await
        .unwrap();
    assert_eq!(
        first.blocking_error.unwrap().error.kind,
        ErrorKind::DeploymentTimedOut
    );

    h.platform.set_state(JobState::Succeeded);
    let second = orchestrator
        .resume(&first.root, ResumeOptions { resubmit: true })
        .await
        .unwrap();

    assert!(second.succeeded());
    assert_eq!(h.platform.submits(), 2);
    assert_eq!(second.backend.unwrap().job_id, "job-2");
}

#[tokio::test]
async fn resuming_a_finished_run_does_nothing() {
    let h = Harness::new();
    let orchestrator = h.orchestrator();
    let first = orchestrator
        .run(RunRequest::create("Task Manager", h.destination(), task_schema()))
        .await
        .unwrap();
    let polls = h.platform.polls();

    let again = orchestrator
        .resume(&first.root, ResumeOptions::default())
        .await
        .unwrap();

    assert!(again.succeeded());
    assert_eq!(h.platform.submits(), 1);
    assert_eq!(h.platform.polls(), polls);
    assert!(again.steps.iter().all(|s| s.attempts == 1));
}

#[tokio::test]
async fn resume_without_saved_run_is_not_found() {
    let h = Harness::new();
    let missing = h.destination().join("nothing-here");

    let err = h
        .orchestrator()
        .resume(&missing, ResumeOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::RunNotFound(_)));
}

#[tokio::test]
async fn new_run_does_not_replace_a_run_holding_a_deployment() {
    let h = Harness::new();
    h.platform.set_state(JobState::Failed);
    let orchestrator = h.orchestrator();

    let first = orchestrator
        .run(RunRequest::create("Task Manager", h.destination(), task_schema()))
        .await
        .unwrap();
    assert_eq!(first.outcome, RunOutcome::Failed);

    let err = orchestrator
        .run(RunRequest::create("Task Manager", h.destination(), task_schema()))
        .await
        .unwrap_err();
    match &err {
        PipelineError::ExistingRun { root, run_id } => {
            assert_eq!(root, &first.root);
            assert_eq!(*run_id, first.run_id);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.kind(), ErrorKind::ExistingRun);

    let saved = h.store.load(&first.root).unwrap().unwrap();
    assert_eq!(saved.id, first.run_id);
    assert_eq!(saved.deployment.unwrap().job_id, "job-1");

    h.platform.set_state(JobState::Succeeded);
    let resumed = orchestrator
        .resume(&first.root, ResumeOptions::default())
        .await
        .unwrap();
    assert!(resumed.succeeded(), "{}", resumed);
    assert_eq!(h.platform.submits(), 1);
}
