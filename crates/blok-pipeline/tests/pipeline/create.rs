use super::common::*;
use blok_pipeline::{LocalTemplateSource, PipelineOrchestrator, RunOutcome, RunRequest, RunStore, StepKind};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::test]
async fn create_run_provisions_generates_and_finalizes() {
    let h = Harness::new();
    let request = RunRequest::create("Task Manager", h.destination(), task_schema())
        .with_description("Tracks tasks");

    let report = h.orchestrator().run(request).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Succeeded, "{}", report);
    assert!(report.blocking_error.is_none());
    assert_eq!(h.platform.submits(), 1);

    let root = std::path::absolute(h.destination().join("task-manager")).unwrap();
    assert_eq!(report.root, root);

    for file in [
        "src/types/generated.ts",
        "src/services/appApi.ts",
        "src/components/views/TasksView.tsx",
        "src/components/views/TaskFormView.tsx",
        "src/components/views/ProjectsView.tsx",
        "src/components/views/ProjectFormView.tsx",
        "src/components/views/DashboardView.tsx",
        "src/App.tsx",
        "src/config/Navbar.tsx",
    ] {
        assert!(root.join(file).is_file(), "{} missing", file);
    }

    // Template leftovers are removed, generated views with listed names are not.
    assert!(!root.join("src/components/views/BillingView.tsx").exists());
    assert!(root.join("src/components/views/HomeView.tsx").exists());
    assert!(read(&root, "src/components/views/ProjectsView.tsx").contains("ProjectsView()"));
    assert!(!root.join("node_modules").exists());

    let api = read(&root, "src/services/appApi.ts");
    assert!(api.contains(STAGING_URL));
    assert!(api.contains("  TASKS: \"tasks\",\n"));

    let env = read(&root, ".env");
    assert!(env.contains(&format!("VITE_DATABASE_API_URL={}\n", STAGING_URL)));
    assert!(env.contains("VITE_APP_MODE=dev"));

    let manifest: serde_json::Value = serde_json::from_str(&read(&root, "package.json")).unwrap();
    assert_eq!(manifest["name"], "task-manager");
    assert_eq!(manifest["description"], "Tracks tasks");
    assert_eq!(manifest["version"], "1.0.0");
    assert_eq!(manifest["scripts"]["dev"], "vite");
}

#[tokio::test]
async fn report_lists_backend_and_next_steps() {
    let h = Harness::new();
    let report = h
        .orchestrator()
        .run(RunRequest::create("Task Manager", h.destination(), task_schema()))
        .await
        .unwrap();

    let backend = report.backend.clone().unwrap();
    assert_eq!(backend.project_code, "tm01");
    assert_eq!(backend.staging_url.as_deref(), Some(STAGING_URL));

    assert_eq!(
        report.next_steps,
        vec![
            format!("Backend API: {}", STAGING_URL),
            format!("cd {}", report.root.display()),
            "npm install && npm run dev".to_string(),
            "Open http://localhost:5173".to_string(),
        ]
    );
    assert!(report.generated_files.contains(&PathBuf::from("src/App.tsx")));
    assert!(report.generated_files.contains(&PathBuf::from(".env")));
}

#[tokio::test]
async fn every_step_is_persisted_as_done() {
    let h = Harness::new();
    let report = h
        .orchestrator()
        .run(RunRequest::create("Task Manager", h.destination(), task_schema()))
        .await
        .unwrap();

    let saved = h.store.load(&report.root).unwrap().unwrap();
    assert_eq!(saved.id, report.run_id);
    assert!(saved.steps.iter().all(|s| s.status.is_done() && s.attempts == 1));
    assert!(saved.step(&StepKind::InstallDependencies).is_none());
    assert_eq!(saved.deployment.unwrap().job_id, "job-1");
}

#[tokio::test]
async fn without_waiting_the_deployment_is_never_polled() {
    let h = Harness::new();
    let mut request = RunRequest::create("Task Manager", h.destination(), task_schema());
    request.wait_for_deployment = Some(false);

    let report = h.orchestrator().run(request).await.unwrap();

    assert!(report.succeeded());
    assert_eq!(h.platform.polls(), 0);
    assert!(!report.steps.iter().any(|s| s.name == "await-deployment"));
    assert!(read(&report.root, "src/services/appApi.ts").contains(STAGING_URL));
}

#[tokio::test]
async fn requested_install_runs_the_configured_command_when_config_disables_it() {
    let h = Harness::new();
    let mut config = h.config();
    config.install.enabled = false;
    config.install.program = "sh".to_string();
    config.install.args = vec!["-c".to_string(), "touch installed.marker".to_string()];
    let orchestrator = PipelineOrchestrator::new(config, h.platform.clone(), h.store.clone())
        .with_template(Arc::new(LocalTemplateSource::new(h.template_dir())));

    let mut request = RunRequest::create("Task Manager", h.destination(), task_schema());
    request.install_dependencies = Some(true);
    let report = orchestrator.run(request).await.unwrap();

    assert!(report.succeeded(), "{}", report);
    assert!(report.root.join("installed.marker").is_file());
    let install = report.steps.iter().find(|s| s.name == "install-dependencies").unwrap();
    assert_eq!(install.status, "done");
    assert!(report.next_steps.contains(&"npm run dev".to_string()));
}
