use super::common::*;
use blok_pipeline::{RunRequest, StepKind};
use std::fs;

#[tokio::test]
async fn scaffold_generates_into_existing_project_without_deploying() {
    let h = Harness::new();
    let root = h.destination().join("existing-app");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join(".env"), "VITE_DATABASE_API_URL=http://old\nKEEP=1\n").unwrap();

    let request = RunRequest::scaffold(
        "Existing App",
        &root,
        task_schema(),
        Some("https://api.example.test".to_string()),
    );
    let report = h.orchestrator().run(request).await.unwrap();

    assert!(report.succeeded(), "{}", report);
    assert_eq!(h.platform.submits(), 0);
    assert!(report.backend.is_none());
    assert!(!report.steps.iter().any(|s| s.name == "provision-template"));
    assert_eq!(
        report.steps.last().map(|s| s.name.as_str()),
        Some(StepKind::ConfigureEnv.to_string().as_str())
    );

    assert_eq!(
        read(&root, ".env"),
        "VITE_DATABASE_API_URL=https://api.example.test\nKEEP=1\n"
    );
    assert!(read(&root, "src/services/appApi.ts").contains("https://api.example.test"));
    assert!(root.join("src/components/views/TaskFormView.tsx").is_file());
}

#[tokio::test]
async fn scaffold_keeps_hand_written_code_outside_regions() {
    let h = Harness::new();
    let root = h.destination().join("existing-app");
    fs::create_dir_all(&root).unwrap();
    let orchestrator = h.orchestrator();

    orchestrator
        .run(RunRequest::scaffold("Existing App", &root, task_schema(), None))
        .await
        .unwrap();
    let app = read(&root, "src/App.tsx");
    fs::write(root.join("src/App.tsx"), format!("// local tweak\n{}", app)).unwrap();

    let report = orchestrator
        .run(RunRequest::scaffold("Existing App", &root, task_schema(), None))
        .await
        .unwrap();

    assert!(report.succeeded());
    assert!(!report.steps.iter().any(|s| s.name == "configure-env"));
    assert!(read(&root, "src/App.tsx").starts_with("// local tweak\n"));
    assert!(!root.join(".env").exists());
}
