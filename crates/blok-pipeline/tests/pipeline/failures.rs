use super::common::*;
use blok_pipeline::{
    DestinationRegistry, ErrorKind, PipelineError, PipelineOrchestrator, RunOutcome, RunRequest,
    RunStore,
};
use std::sync::Arc;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;

#[tokio::test]
async fn invalid_schema_never_reaches_the_platform() {
    let h = Harness::new();
    let schema = json!({
        "users": { "email": { "type": "string", "max_length": 255 } },
        "tasks": { "title": { "type": "string" } }
    });

    let err = h
        .orchestrator()
        .run(RunRequest::create("Task Manager", h.destination(), schema))
        .await
        .unwrap_err();

    match err {
        PipelineError::Validation(issues) => assert!(issues.len() >= 2, "{:?}", issues),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.platform.submits(), 0);
    assert!(!h.destination().join("task-manager").exists());
    assert!(h.store.list().unwrap().is_empty());
}

#[tokio::test]
async fn busy_destination_is_refused() {
    let h = Harness::new();
    let orchestrator = h.orchestrator();
    let root = std::path::absolute(h.destination().join("task-manager")).unwrap();
    let _lease = orchestrator.registry().acquire(&root).unwrap();

    let err = orchestrator
        .run(RunRequest::create("Task Manager", h.destination(), task_schema()))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::DestinationBusy(_)));
    assert_eq!(err.kind(), ErrorKind::DestinationBusy);
    assert_eq!(h.platform.submits(), 0);
}

#[tokio::test]
async fn lock_files_exclude_orchestrators_that_share_a_run_store() {
    let h = Harness::new();
    let locks = h.workspace.path().join("runs/locks");
    let holder = h.orchestrator().with_registry(DestinationRegistry::with_lock_dir(&locks));
    let other = h.orchestrator().with_registry(DestinationRegistry::with_lock_dir(&locks));
    let root = std::path::absolute(h.destination().join("task-manager")).unwrap();
    let lease = holder.registry().acquire(&root).unwrap();

    let err = other
        .run(RunRequest::create("Task Manager", h.destination(), task_schema()))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::DestinationBusy(_)));
    assert_eq!(h.platform.submits(), 0);
    assert!(h.store.list().unwrap().is_empty());

    drop(lease);
    let report = other
        .run(RunRequest::create("Task Manager", h.destination(), task_schema()))
        .await
        .unwrap();
    assert!(report.succeeded(), "{}", report);
}

#[tokio::test]
async fn existing_destination_fails_provisioning() {
    let h = Harness::new();
    fs::create_dir_all(h.destination().join("task-manager")).unwrap();

    let report = h
        .orchestrator()
        .run(RunRequest::create("Task Manager", h.destination(), task_schema()))
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Failed);
    let blocking = report.blocking_error.unwrap();
    assert_eq!(blocking.step, "provision-template");
    assert_eq!(blocking.error.kind, ErrorKind::Template);
    assert_eq!(h.platform.submits(), 0);
}

#[tokio::test]
async fn one_entity_failure_blocks_on_that_step() {
    let h = Harness::new();
    // A directory where the view should go makes that single write fail.
    fs::create_dir_all(h.template_dir().join("src/components/views/TasksView.tsx")).unwrap();

    let report = h
        .orchestrator()
        .run(RunRequest::create("Task Manager", h.destination(), task_schema()))
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert_eq!(report.entity_failures.len(), 1);
    assert_eq!(report.entity_failures[0].table, "tasks");
    assert_eq!(report.blocking_error.unwrap().step, "generate-view:tasks");

    // Siblings still complete; later steps do not start.
    assert!(report.root.join("src/components/views/TaskFormView.tsx").is_file());
    assert!(report.root.join("src/components/views/ProjectsView.tsx").is_file());
    assert!(!report.root.join("src/components/views/DashboardView.tsx").exists());
}

#[tokio::test]
async fn several_entity_failures_are_reported_together() {
    let h = Harness::new();
    let views = h.template_dir().join("src/components/views");
    fs::create_dir_all(views.join("TasksView.tsx")).unwrap();
    fs::create_dir_all(views.join("ProjectFormView.tsx")).unwrap();

    let report = h
        .orchestrator()
        .run(RunRequest::create("Task Manager", h.destination(), task_schema()))
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Failed);
    let mut tables: Vec<_> = report.entity_failures.iter().map(|f| f.table.as_str()).collect();
    tables.sort();
    assert_eq!(tables, vec!["projects", "tasks"]);

    let blocking = report.blocking_error.unwrap();
    assert_eq!(blocking.step, "generate-entities");
    assert_eq!(blocking.error.kind, ErrorKind::PartialGenerationFailure);
}

#[tokio::test]
async fn concurrent_runs_on_one_destination_conflict() {
    let h = Harness::new();
    let orchestrator = h.orchestrator();

    let (first, second) = tokio::join!(
        orchestrator.run(RunRequest::create("Task Manager", h.destination(), task_schema())),
        orchestrator.run(RunRequest::create("Task Manager", h.destination(), task_schema())),
    );

    assert!(first.unwrap().succeeded());
    assert!(matches!(second, Err(PipelineError::DestinationBusy(_))));
    assert_eq!(h.platform.submits(), 1);
    assert!(!orchestrator.registry().is_held(&h.destination().join("task-manager")));
}

#[tokio::test]
async fn tables_with_colliding_component_names_are_rejected() {
    let h = Harness::new();
    let schema = json!({
        "task": { "title": { "type": "text" } },
        "tasks": { "title": { "type": "text" } }
    });

    let err = h
        .orchestrator()
        .run(RunRequest::create("Task Manager", h.destination(), schema))
        .await
        .unwrap_err();

    match err {
        PipelineError::Validation(issues) => {
            assert_eq!(issues.len(), 1, "{:?}", issues);
            assert_eq!(issues[0].path.to_string(), "tasks");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.platform.submits(), 0);
    assert!(!h.destination().join("task-manager").exists());
}

#[tokio::test]
async fn unusable_config_is_refused_before_any_effect() {
    let h = Harness::new();
    let mut config = h.config();
    config.deployment.poll_floor_ms = 0;
    let orchestrator = PipelineOrchestrator::new(config, h.platform.clone(), h.store.clone());

    let err = orchestrator
        .run(RunRequest::create("Task Manager", h.destination(), task_schema()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Config);
    assert_eq!(h.platform.submits(), 0);
    assert!(h.store.list().unwrap().is_empty());
}
