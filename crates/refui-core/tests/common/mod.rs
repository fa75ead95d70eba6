//! Shared test helpers for refui-core integration tests.
//!
//! [`FakeApp`] is an in-memory [`AutomationDriver`] that behaves like the
//! reference app on a simulator: a `label` static text showing the greeting
//! and a `generateButton` that writes a euro amount into it. Backgrounding
//! keeps the label, termination resets it.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use refui_core::driver::{AutomationDriver, DriverError, WaitBudget};
use refui_core::element::{ElementFrame, UIElement};
use refui_core::report::MemoryReporter;
use refui_core::runner::{RunnerConfig, ScenarioRunner};
use refui_core::scenario::AppExpectations;

/// Bytes every successful fake screenshot returns.
pub const FAKE_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

// ---------------------------------------------------------------------------
// Fake app
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct Calls {
    pub launches: u32,
    pub terminates: u32,
    pub activates: u32,
    pub home_presses: u32,
    pub taps: u32,
    pub screenshots: u32,
    pub tree_fetches: u32,
}

#[derive(Debug)]
struct AppState {
    running: bool,
    foreground: bool,
    label: String,
    generated: u32,
    calls: Calls,
}

pub struct FakeApp {
    greeting: String,
    budget: WaitBudget,
    fail_launch: bool,
    fail_screenshot: bool,
    show_button: bool,
    button_hittable: bool,
    state: Mutex<AppState>,
}

impl FakeApp {
    /// The reference app, not yet launched.
    pub fn new() -> Self {
        Self {
            greeting: "Hello!!".to_string(),
            budget: WaitBudget::immediate(),
            fail_launch: false,
            fail_screenshot: false,
            show_button: true,
            button_hittable: true,
            state: Mutex::new(AppState {
                running: false,
                foreground: false,
                label: String::new(),
                generated: 0,
                calls: Calls::default(),
            }),
        }
    }

    pub fn with_greeting(mut self, greeting: &str) -> Self {
        self.greeting = greeting.to_string();
        self
    }

    pub fn with_budget(mut self, budget: WaitBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn failing_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    pub fn failing_screenshots(mut self) -> Self {
        self.fail_screenshot = true;
        self
    }

    pub fn without_button(mut self) -> Self {
        self.show_button = false;
        self
    }

    pub fn unhittable_button(mut self) -> Self {
        self.button_hittable = false;
        self
    }

    /// The text currently in the `label` static text.
    pub fn label(&self) -> String {
        self.state.lock().unwrap().label.clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().unwrap().running
    }

    pub fn calls(&self) -> Calls {
        self.state.lock().unwrap().calls.clone()
    }

    fn cold_start(&self, state: &mut AppState) {
        state.running = true;
        state.foreground = true;
        state.label = self.greeting.clone();
    }

    fn tree(&self, state: &AppState) -> Vec<UIElement> {
        let mut children = vec![UIElement {
            identifier: Some("label".into()),
            label: Some(state.label.clone()),
            element_type: Some("StaticText".into()),
            frame: frame(120.0, 300.0, 135.0, 21.0),
            ..Default::default()
        }];
        if self.show_button {
            children.push(UIElement {
                identifier: Some("generateButton".into()),
                label: Some("Button".into()),
                element_type: Some("Button".into()),
                frame: frame(157.0, 360.0, 60.0, 30.0),
                hittable: Some(self.button_hittable),
                ..Default::default()
            });
        }
        vec![UIElement {
            label: Some("ReferenceiOS".into()),
            element_type: Some("Application".into()),
            frame: frame(0.0, 0.0, 375.0, 667.0),
            children,
            ..Default::default()
        }]
    }
}

fn frame(x: f64, y: f64, width: f64, height: f64) -> Option<ElementFrame> {
    Some(ElementFrame {
        x,
        y,
        width,
        height,
    })
}

#[async_trait]
impl AutomationDriver for FakeApp {
    fn wait_budget(&self) -> WaitBudget {
        self.budget
    }

    async fn dump_tree(&self) -> Result<Vec<UIElement>, DriverError> {
        let mut state = self.state.lock().unwrap();
        state.calls.tree_fetches += 1;
        if !(state.running && state.foreground) {
            return Ok(vec![]);
        }
        Ok(self.tree(&state))
    }

    async fn tap(&self, element: &UIElement) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        state.calls.taps += 1;
        if !(state.running && state.foreground) {
            return Err(DriverError::ElementNotInteractable("app is not in the foreground".into()));
        }
        if !element.is_hittable() {
            return Err(DriverError::ElementNotInteractable(format!(
                "{} is not hittable",
                element.describe()
            )));
        }
        if element.identifier.as_deref() == Some("generateButton") {
            state.generated += 1;
            state.label = format!("€ {},{:02}", state.generated * 17, state.generated * 3 % 100);
        }
        Ok(())
    }

    async fn launch(&self) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        state.calls.launches += 1;
        if self.fail_launch {
            return Err(DriverError::CommandFailed(
                "Unable to launch com.abnamro.ReferenceiOS".into(),
            ));
        }
        self.cold_start(&mut state);
        Ok(())
    }

    async fn terminate(&self) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        state.calls.terminates += 1;
        state.running = false;
        state.foreground = false;
        state.label.clear();
        Ok(())
    }

    async fn activate(&self) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        state.calls.activates += 1;
        if state.running {
            state.foreground = true;
        } else {
            self.cold_start(&mut state);
        }
        Ok(())
    }

    async fn press_home(&self) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        state.calls.home_presses += 1;
        state.foreground = false;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        let mut state = self.state.lock().unwrap();
        state.calls.screenshots += 1;
        if self.fail_screenshot {
            return Err(DriverError::CommandFailed("screenshot failed".into()));
        }
        Ok(FAKE_PNG.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Runner helpers
// ---------------------------------------------------------------------------

/// A runner that collects failures in memory.
pub fn memory_runner(config: RunnerConfig) -> (ScenarioRunner, Arc<MemoryReporter>) {
    let reporter = Arc::new(MemoryReporter::new());
    let runner = ScenarioRunner::new(config, reporter.clone());
    (runner, reporter)
}

pub fn memory_runner_with(
    config: RunnerConfig,
    expectations: AppExpectations,
) -> (ScenarioRunner, Arc<MemoryReporter>) {
    let (runner, reporter) = memory_runner(config);
    (runner.with_expectations(expectations), reporter)
}

/// Unique scratch directory under the system temp dir.
pub fn temp_dir(prefix: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("{prefix}_{}", uuid::Uuid::new_v4()))
}
