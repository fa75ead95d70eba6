//! Runner and assertion helper behaviour: continue-after-failure, halting,
//! setup failures, screenshots, reporters and suites.

mod common;

use std::sync::Arc;

use common::{memory_runner, temp_dir, FakeApp, FAKE_PNG};

use refui_core::context::ScenarioContext;
use refui_core::driver::{AutomationDriver, DriverError};
use refui_core::report::{FanoutReporter, JsonlReporter, MemoryReporter, FAILURES_FILE};
use refui_core::runner::{RunnerConfig, ScenarioRunner, ScenarioState};
use refui_core::scenario::Scenario;

fn stop_on_failure() -> RunnerConfig {
    RunnerConfig {
        continue_after_failure: false,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Continue after failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_later_assertions_run_after_a_failure() {
    let app = FakeApp::new();
    let reporter = MemoryReporter::new();
    let mut ctx = ScenarioContext::new("continue", &app, &reporter, true);
    ctx.launch().await;

    assert!(!ctx.assert_text_exists("Goodbye").await);
    assert!(!ctx.assert_button_with_text_exists("Submit").await);
    assert!(ctx.assert_text_exists("Hello!!").await);
    assert!(!ctx.assert_equal("Hello!!", "Hello").await);

    let descriptions: Vec<&str> = ctx.failures().iter().map(|f| f.description()).collect();
    assert_eq!(
        descriptions,
        vec![
            "Goodbye does not exist!",
            "Submit does not exist!",
            "expected \"Hello\", observed \"Hello!!\"",
        ]
    );
    assert!(!ctx.halted());
    assert_eq!(reporter.len(), 3);
}

#[tokio::test]
async fn test_first_failure_halts_when_continue_is_off() {
    let app = FakeApp::new();
    let reporter = MemoryReporter::new();
    let mut ctx = ScenarioContext::new("halt", &app, &reporter, false);
    ctx.launch().await;

    assert!(!ctx.assert_text_exists("Goodbye").await);
    assert!(ctx.halted());
    let fetches = app.calls().tree_fetches;

    assert!(!ctx.assert_text_exists("Hello!!").await);
    assert!(!ctx.tap_button("generateButton").await);
    assert_eq!(ctx.read_label("label").await.as_str(), "");

    assert_eq!(app.calls().tree_fetches, fetches, "halted helpers must not touch the driver");
    assert_eq!(app.calls().taps, 0);
    assert_eq!(ctx.failures().len(), 1);
}

#[tokio::test]
async fn test_runner_stop_on_failure_records_one_failure() {
    let (runner, reporter) = memory_runner(stop_on_failure());
    let app = FakeApp::new().without_button();

    let report = runner.run(Scenario::GenerateValue, &app).await;

    assert_eq!(report.state, ScenarioState::Failed);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(reporter.len(), 1);
    assert_eq!(app.calls().terminates, 1, "teardown still runs");
}

#[tokio::test]
async fn test_runner_continue_records_every_failure() {
    let (runner, _) = memory_runner(RunnerConfig::default());
    let app = FakeApp::new().without_button();

    let report = runner.run(Scenario::PersistenceInBackground, &app).await;

    assert_eq!(report.state, ScenarioState::Failed);
    // Tap fails, the label never shows a euro amount; the not-equal check passes.
    assert_eq!(report.failures.len(), 2);
    assert_eq!(app.calls().home_presses, 1);
    assert_eq!(app.calls().activates, 1);
}

// ---------------------------------------------------------------------------
// Call sites and screenshots
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_failure_points_at_calling_line() {
    let app = FakeApp::new();
    let reporter = MemoryReporter::new();
    let mut ctx = ScenarioContext::new("call_site", &app, &reporter, true);
    ctx.launch().await;

    let line = line!() + 1;
    ctx.assert_text_exists("Nope").await;

    let failure = &ctx.failures()[0];
    assert_eq!(failure.file(), file!());
    assert_eq!(failure.line(), line);
}

#[tokio::test]
async fn test_failure_carries_screenshot() {
    let app = FakeApp::new();
    let reporter = MemoryReporter::new();
    let mut ctx = ScenarioContext::new("screenshot", &app, &reporter, true);
    ctx.launch().await;

    ctx.assert_text_exists("Nope").await;

    assert_eq!(ctx.failures()[0].screenshot(), Some(FAKE_PNG));
    assert_eq!(app.calls().screenshots, 1);
}

#[tokio::test]
async fn test_failed_capture_still_records_failure() {
    let app = FakeApp::new().failing_screenshots();
    let reporter = MemoryReporter::new();
    let mut ctx = ScenarioContext::new("screenshot", &app, &reporter, true);
    ctx.launch().await;

    ctx.assert_text_exists("Nope").await;

    assert_eq!(ctx.failures().len(), 1);
    assert!(ctx.failures()[0].screenshot().is_none());
}

#[tokio::test]
async fn test_passing_assertions_take_no_screenshots() {
    let (runner, _) = memory_runner(RunnerConfig::default());
    let app = FakeApp::new();
    runner.run(Scenario::PersistenceInBackground, &app).await;
    assert_eq!(app.calls().screenshots, 0);
}

// ---------------------------------------------------------------------------
// Helper semantics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_assert_text_exists_is_idempotent() {
    let app = FakeApp::new();
    let reporter = MemoryReporter::new();
    let mut ctx = ScenarioContext::new("idempotent", &app, &reporter, true);
    ctx.launch().await;

    let first = ctx.assert_text_exists("Hello!!").await;
    let second = ctx.assert_text_exists("Hello!!").await;
    assert!(first && second);

    let first = ctx.assert_text_exists("Hello").await;
    let second = ctx.assert_text_exists("Hello").await;
    assert_eq!(first, second);
    assert_eq!(ctx.failures().len(), 2);
}

#[tokio::test]
async fn test_button_found_by_title_or_identifier() {
    let app = FakeApp::new();
    let reporter = MemoryReporter::new();
    let mut ctx = ScenarioContext::new("buttons", &app, &reporter, true);
    ctx.launch().await;

    assert!(ctx.assert_button_with_text_exists("Button").await);
    assert!(ctx.assert_button_with_text_exists("generateButton").await);
    assert!(ctx.tap_button("Button").await);
    assert!(ctx.read_label("label").await.contains("€"));
}

#[tokio::test]
async fn test_label_contains_matches_any_static_text() {
    let app = FakeApp::new();
    let reporter = MemoryReporter::new();
    let mut ctx = ScenarioContext::new("contains", &app, &reporter, true);
    ctx.launch().await;

    assert!(ctx.assert_label_contains("label", "Hello").await);
    assert!(ctx.assert_label_contains("identifier", "lab").await);
    assert!(!ctx.assert_label_contains("label", "€").await);
    assert!(ctx.failures()[0].description().contains("label CONTAINS '€'"));
}

#[tokio::test]
async fn test_label_contains_rejects_unknown_field() {
    let app = FakeApp::new();
    let reporter = MemoryReporter::new();
    let mut ctx = ScenarioContext::new("contains", &app, &reporter, true);
    ctx.launch().await;

    assert!(!ctx.assert_label_contains("text", "Hello").await);
    let failure = &ctx.failures()[0];
    assert!(!failure.expected());
    assert!(failure.description().contains("unknown element field 'text'"));
    assert_eq!(app.calls().tree_fetches, 0);
}

#[tokio::test]
async fn test_tap_on_missing_button_is_not_interactable() {
    let app = FakeApp::new().without_button();
    let reporter = MemoryReporter::new();
    let mut ctx = ScenarioContext::new("tap", &app, &reporter, true);
    ctx.launch().await;

    assert!(!ctx.tap_button("generateButton").await);
    let failure = &ctx.failures()[0];
    assert!(failure.expected());
    assert_eq!(
        failure.description(),
        "button 'generateButton' is not interactable: no matching button exists"
    );
    assert_eq!(app.calls().taps, 0);
}

// ---------------------------------------------------------------------------
// Setup and teardown
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_launch_failure_skips_body() {
    let (runner, reporter) = memory_runner(RunnerConfig::default());
    let app = FakeApp::new().failing_launch();

    let report = runner.run(Scenario::GenerateValue, &app).await;

    assert_eq!(report.state, ScenarioState::Failed);
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert!(!failure.expected());
    assert!(failure.description().starts_with("Failed to launch the app"));
    assert_eq!(app.calls().tree_fetches, 0);
    assert_eq!(app.calls().taps, 0);
    assert_eq!(reporter.len(), 1);
}

#[tokio::test]
async fn test_teardown_can_leave_app_running() {
    let config = RunnerConfig {
        terminate_on_teardown: false,
        ..Default::default()
    };
    let (runner, _) = memory_runner(config);
    let app = FakeApp::new();

    runner.run(Scenario::InitialLayout, &app).await;

    assert!(app.is_running());
    assert_eq!(app.calls().terminates, 0);
}

#[tokio::test]
async fn test_every_run_ends_passed_or_failed() {
    let apps: Vec<fn() -> FakeApp> = vec![
        FakeApp::new,
        || FakeApp::new().without_button(),
        || FakeApp::new().failing_launch(),
        || FakeApp::new().with_greeting("Hi"),
        || FakeApp::new().failing_screenshots().unhittable_button(),
    ];

    for config in [RunnerConfig::default(), stop_on_failure()] {
        let (runner, _) = memory_runner(config);
        for make in &apps {
            for scenario in Scenario::all() {
                let report = runner.run(scenario, &make()).await;
                assert!(report.state.is_finished(), "{scenario} ended in {:?}", report.state);
                assert_eq!(report.passed(), report.failures.is_empty());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Suites
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_suite_builds_a_driver_per_scenario() {
    let (runner, _) = memory_runner(RunnerConfig::default());
    let mut built = 0;

    let suite = runner
        .run_suite(&Scenario::all(), || {
            built += 1;
            Ok(Box::new(FakeApp::new()) as Box<dyn AutomationDriver>)
        })
        .await;

    assert_eq!(built, 4);
    assert_eq!(suite.total(), 4);
    assert!(suite.passed());
    let order: Vec<Scenario> = suite.scenarios.iter().map(|r| r.scenario).collect();
    assert_eq!(order, Scenario::all().to_vec());
}

#[tokio::test]
async fn test_suite_continues_past_missing_driver() {
    let (runner, reporter) = memory_runner(RunnerConfig::default());
    let mut built = 0;

    let suite = runner
        .run_suite(&[Scenario::InitialLayout, Scenario::GenerateValue], || {
            built += 1;
            if built == 1 {
                Err(DriverError::NoBootedSimulator)
            } else {
                Ok(Box::new(FakeApp::new()) as Box<dyn AutomationDriver>)
            }
        })
        .await;

    assert_eq!(suite.failed_count(), 1);
    assert_eq!(suite.passed_count(), 1);
    let failure = &suite.scenarios[0].failures[0];
    assert!(failure.description().contains("No booted simulator"));
    assert!(!failure.expected());
    assert_eq!(reporter.len(), 1);
}

// ---------------------------------------------------------------------------
// Persisted reports
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_jsonl_reporter_receives_runner_failures() {
    let dir = temp_dir("refui_runner_report");
    let memory = Arc::new(MemoryReporter::new());
    let fanout = FanoutReporter::new()
        .with(memory.clone())
        .with(JsonlReporter::create(&dir).unwrap());
    let runner = ScenarioRunner::new(RunnerConfig::default(), Arc::new(fanout));

    let report = runner.run(Scenario::InitialLayout, &FakeApp::new().without_button()).await;
    assert_eq!(report.failures.len(), 1);
    assert_eq!(memory.len(), 1);

    let contents = std::fs::read_to_string(dir.join(FAILURES_FILE)).unwrap();
    let line: serde_json::Value = serde_json::from_str(contents.trim()).unwrap();
    assert_eq!(line["scenario"], "initial_layout");
    assert_eq!(line["description"], "Button does not exist!");
    let png = line["screenshot_file"].as_str().unwrap();
    assert_eq!(std::fs::read(dir.join(png)).unwrap(), FAKE_PNG);

    let _ = std::fs::remove_dir_all(&dir);
}
