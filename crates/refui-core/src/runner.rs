//! Scenario lifecycle: setup, body, teardown, verdict.
//!
//! ```text
//! NotStarted -> Running -> Passed
//!                       -> Failed
//! ```
//!
//! Setup launches the app fresh. If that fails the body is skipped and the
//! scenario fails. Teardown terminates the app on a best-effort basis; its
//! errors are logged and never change the verdict. Scenarios in a suite run
//! one after another, each against its own driver.

use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::context::ScenarioContext;
use crate::driver::{millis, AutomationDriver, DriverError};
use crate::failure::FailureRecord;
use crate::report::FailureReporter;
use crate::scenario::{AppExpectations, Scenario};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioState {
    NotStarted,
    Running,
    Passed,
    Failed,
}

impl ScenarioState {
    pub fn is_finished(&self) -> bool {
        matches!(self, ScenarioState::Passed | ScenarioState::Failed)
    }

    /// The state a running scenario ends in.
    fn verdict(failures: &[FailureRecord]) -> Self {
        if failures.is_empty() {
            ScenarioState::Passed
        } else {
            ScenarioState::Failed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Keep executing a scenario's remaining steps after a failure.
    pub continue_after_failure: bool,
    /// Terminate the app once the scenario body is done.
    pub terminate_on_teardown: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            continue_after_failure: true,
            terminate_on_teardown: true,
        }
    }
}

/// Outcome of one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub state: ScenarioState,
    pub failures: Vec<FailureRecord>,
    #[serde(rename = "duration_ms", with = "millis")]
    pub duration: Duration,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.state == ScenarioState::Passed
    }
}

/// Outcome of a sequence of scenarios.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteReport {
    pub scenarios: Vec<ScenarioReport>,
    #[serde(rename = "duration_ms", with = "millis")]
    pub duration: Duration,
}

impl SuiteReport {
    pub fn total(&self) -> usize {
        self.scenarios.len()
    }

    pub fn passed_count(&self) -> usize {
        self.scenarios.iter().filter(|r| r.passed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.total() - self.passed_count()
    }

    pub fn failure_count(&self) -> usize {
        self.scenarios.iter().map(|r| r.failures.len()).sum()
    }

    /// True when every scenario passed.
    pub fn passed(&self) -> bool {
        self.scenarios.iter().all(|r| r.passed())
    }
}

pub struct ScenarioRunner {
    config: RunnerConfig,
    expectations: AppExpectations,
    reporter: Arc<dyn FailureReporter>,
}

impl ScenarioRunner {
    pub fn new(config: RunnerConfig, reporter: Arc<dyn FailureReporter>) -> Self {
        Self {
            config,
            expectations: AppExpectations::default(),
            reporter,
        }
    }

    pub fn with_expectations(mut self, expectations: AppExpectations) -> Self {
        self.expectations = expectations;
        self
    }

    pub fn config(&self) -> RunnerConfig {
        self.config
    }

    pub fn expectations(&self) -> &AppExpectations {
        &self.expectations
    }

    /// Runs one scenario to completion against `driver`.
    pub async fn run(&self, scenario: Scenario, driver: &dyn AutomationDriver) -> ScenarioReport {
        let span = info_span!("scenario", name = scenario.name());
        self.run_inner(scenario, driver).instrument(span).await
    }

    async fn run_inner(&self, scenario: Scenario, driver: &dyn AutomationDriver) -> ScenarioReport {
        let started = Instant::now();
        let mut state = ScenarioState::NotStarted;
        let mut ctx = ScenarioContext::new(
            scenario.name(),
            driver,
            self.reporter.as_ref(),
            self.config.continue_after_failure,
        );

        state = transition(state, ScenarioState::Running);
        if ctx.launch().await {
            scenario.run(&mut ctx, &self.expectations).await;
        } else {
            warn!("launch failed, skipping scenario body");
        }

        if self.config.terminate_on_teardown {
            if let Err(e) = driver.terminate().await {
                warn!(error = %e, "teardown terminate failed");
            }
        }

        let failures = ctx.into_failures();
        state = transition(state, ScenarioState::verdict(&failures));
        let duration = started.elapsed();
        info!(
            state = ?state,
            failures = failures.len(),
            elapsed_ms = duration.as_millis() as u64,
            "scenario finished"
        );

        ScenarioReport {
            scenario,
            state,
            failures,
            duration,
        }
    }

    /// Runs scenarios strictly in order, building a fresh driver for each.
    ///
    /// A driver that cannot be built fails its scenario with one unexpected
    /// failure record and the suite moves on.
    pub async fn run_suite<F>(&self, scenarios: &[Scenario], mut make_driver: F) -> SuiteReport
    where
        F: FnMut() -> Result<Box<dyn AutomationDriver>, DriverError>,
    {
        let started = Instant::now();
        let mut reports = Vec::with_capacity(scenarios.len());

        for &scenario in scenarios {
            let report = match make_driver() {
                Ok(driver) => self.run(scenario, driver.as_ref()).await,
                Err(e) => self.driver_unavailable(scenario, e),
            };
            reports.push(report);
        }

        SuiteReport {
            scenarios: reports,
            duration: started.elapsed(),
        }
    }

    fn driver_unavailable(&self, scenario: Scenario, err: DriverError) -> ScenarioReport {
        warn!(scenario = scenario.name(), error = %err, "no driver for scenario");
        let record = FailureRecord::new(
            scenario.name(),
            format!("Failed to set up the driver: {err}"),
            Location::caller(),
            false,
            None,
        );
        self.reporter.record(&record);
        ScenarioReport {
            scenario,
            state: ScenarioState::Failed,
            failures: vec![record],
            duration: Duration::ZERO,
        }
    }
}

fn transition(from: ScenarioState, to: ScenarioState) -> ScenarioState {
    debug_assert!(
        matches!(
            (from, to),
            (ScenarioState::NotStarted, ScenarioState::Running)
                | (ScenarioState::Running, ScenarioState::Passed)
                | (ScenarioState::Running, ScenarioState::Failed)
        ),
        "illegal transition {from:?} -> {to:?}"
    );
    debug!(?from, ?to, "scenario state");
    to
}
