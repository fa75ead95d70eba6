//! # refui-core
//!
//! End-to-end UI checks for the reference iOS app, run against the iOS
//! Simulator on macOS.
//!
//! Scenarios are written against the [`driver::AutomationDriver`] trait and
//! a small set of assertion helpers. A failed assertion never aborts the
//! scenario: it becomes a [`failure::FailureRecord`] with the scenario line
//! that made the call and a screenshot of the screen at that moment.
//!
//! ## Modules
//!
//! - [`element`] - Accessibility tree model
//! - [`query`] - Element queries and typed predicates
//! - [`driver`] - The automation driver trait and its element wait budget
//! - [`simctl`] - Wrapper around Apple's `xcrun simctl` CLI for simulator control
//! - [`axe`] - Wrapper around the `axe` accessibility tool for UI inspection and interaction
//! - [`simulator`] - Driver implementation backed by `simctl` and `axe`
//! - [`context`] - Assertion helpers bound to a running scenario
//! - [`failure`] - Failure records and the assertion error taxonomy
//! - [`runner`] - Scenario lifecycle and suite execution
//! - [`scenario`] - The four reference app scenarios
//! - [`report`] - Failure reporters, JUnit XML and console summaries
//! - [`config`] - Persistent settings in `~/.refui/config.json`
//!
//! ## External Dependencies
//!
//! - **Xcode** (for `xcrun simctl`) - Provides simulator control functionality
//! - **axe** - Third-party accessibility tool (`brew install cameroncooke/axe/axe`)
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use refui_core::driver::DriverConfig;
//! use refui_core::report::TracingReporter;
//! use refui_core::runner::{RunnerConfig, ScenarioRunner};
//! use refui_core::scenario::Scenario;
//! use refui_core::simulator::SimulatorDriver;
//!
//! # async fn example() -> Result<(), refui_core::driver::DriverError> {
//! let driver = SimulatorDriver::from_config(DriverConfig::default())?;
//! let runner = ScenarioRunner::new(RunnerConfig::default(), Arc::new(TracingReporter));
//! let report = runner.run(Scenario::GenerateValue, &driver).await;
//! println!("{}: {:?}", report.scenario, report.state);
//! # Ok(())
//! # }
//! ```

pub mod axe;
pub mod config;
pub mod context;
pub mod driver;
pub mod element;
pub mod failure;
pub mod query;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod simctl;
pub mod simulator;
