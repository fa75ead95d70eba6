//! Assertion helpers bound to one running scenario.
//!
//! A [`ScenarioContext`] is handed the driver explicitly when the runner
//! starts a scenario; helpers never look up an app handle on their own.
//! Helpers do not panic or return errors: a failed check captures a
//! screenshot, produces a [`FailureRecord`] pointing at the scenario line
//! that made the call, passes it to the reporter, and returns `false` (or an
//! empty snapshot) so the scenario carries on with its next statement.
//!
//! When continue-after-failure is off, the first failure halts the scenario:
//! every later helper returns immediately without touching the driver.

use std::fmt;
use std::future::Future;
use std::panic::Location;

use tracing::{debug, warn};

use crate::driver::{AutomationDriver, DriverError};
use crate::element::ElementKind;
use crate::failure::{AssertionError, FailureRecord};
use crate::query::{ElementField, ElementQuery, Predicate};
use crate::report::FailureReporter;

type CallSite = &'static Location<'static>;

/// Text read from an element at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSnapshot {
    identifier: String,
    value: String,
}

impl LabelSnapshot {
    pub fn new(identifier: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            value: value.into(),
        }
    }

    /// Identifier of the element the text was read from.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.value.contains(needle)
    }
}

impl AsRef<str> for LabelSnapshot {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl PartialEq<str> for LabelSnapshot {
    fn eq(&self, other: &str) -> bool {
        self.value == other
    }
}

impl PartialEq<&str> for LabelSnapshot {
    fn eq(&self, other: &&str) -> bool {
        self.value == *other
    }
}

impl fmt::Display for LabelSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[derive(Debug, Clone, Copy)]
enum LifecycleStep {
    Launch,
    Terminate,
    Activate,
    PressHome,
}

impl LifecycleStep {
    fn verb(&self) -> &'static str {
        match self {
            LifecycleStep::Launch => "launch the app",
            LifecycleStep::Terminate => "terminate the app",
            LifecycleStep::Activate => "activate the app",
            LifecycleStep::PressHome => "press home",
        }
    }
}

/// The state one scenario threads through its helper calls.
pub struct ScenarioContext<'d> {
    driver: &'d dyn AutomationDriver,
    reporter: &'d dyn FailureReporter,
    scenario: String,
    continue_after_failure: bool,
    failures: Vec<FailureRecord>,
}

impl<'d> ScenarioContext<'d> {
    pub fn new(
        scenario: impl Into<String>,
        driver: &'d dyn AutomationDriver,
        reporter: &'d dyn FailureReporter,
        continue_after_failure: bool,
    ) -> Self {
        Self {
            driver,
            reporter,
            scenario: scenario.into(),
            continue_after_failure,
            failures: Vec::new(),
        }
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    /// Failures recorded so far, in order.
    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<FailureRecord> {
        self.failures
    }

    /// True once a failure was recorded with continue-after-failure off.
    pub fn halted(&self) -> bool {
        !self.continue_after_failure && !self.failures.is_empty()
    }

    /// Succeeds iff a static text with exactly this content exists.
    #[track_caller]
    pub fn assert_text_exists<'a>(
        &'a mut self,
        text: &'a str,
    ) -> impl Future<Output = bool> + use<'a, 'd> {
        let at = Location::caller();
        async move {
            if self.halted() {
                return false;
            }
            match self.driver.find_text(text).await {
                Ok(Some(_)) => true,
                Ok(None) => {
                    let err = AssertionError::ElementNotFound {
                        what: text.to_string(),
                    };
                    self.fail(err, at).await
                }
                Err(e) => self.fail_driver("look up text", e, at).await,
            }
        }
    }

    /// Succeeds iff a button with this identifier or title exists.
    #[track_caller]
    pub fn assert_button_with_text_exists<'a>(
        &'a mut self,
        button_text: &'a str,
    ) -> impl Future<Output = bool> + use<'a, 'd> {
        let at = Location::caller();
        async move {
            if self.halted() {
                return false;
            }
            match self.driver.find_button(button_text).await {
                Ok(Some(_)) => true,
                Ok(None) => {
                    let err = AssertionError::ElementNotFound {
                        what: button_text.to_string(),
                    };
                    self.fail(err, at).await
                }
                Err(e) => self.fail_driver("look up button", e, at).await,
            }
        }
    }

    /// Succeeds iff any static text's `field` contains `substring`.
    ///
    /// `field` names an element attribute (`label`, `identifier` or
    /// `value`), not a particular element: the first static text on screen
    /// that satisfies the predicate is enough, even if it is not the one the
    /// caller had in mind.
    #[track_caller]
    pub fn assert_label_contains<'a>(
        &'a mut self,
        field: &'a str,
        substring: &'a str,
    ) -> impl Future<Output = bool> + use<'a, 'd> {
        let at = Location::caller();
        async move {
            if self.halted() {
                return false;
            }
            let field: ElementField = match field.parse() {
                Ok(field) => field,
                Err(e) => return self.record(e.to_string(), false, at).await,
            };
            let predicate = Predicate::contains(field, substring);
            match self.driver.find_first(&predicate, ElementKind::StaticText).await {
                Ok(Some(_)) => true,
                Ok(None) => {
                    let err = AssertionError::ElementNotFound {
                        what: format!("static text matching {predicate}"),
                    };
                    self.fail(err, at).await
                }
                Err(e) => self.fail_driver("evaluate predicate", e, at).await,
            }
        }
    }

    /// Taps the button with this identifier, or failing that, this title.
    #[track_caller]
    pub fn tap_button<'a>(
        &'a mut self,
        identifier_or_label: &'a str,
    ) -> impl Future<Output = bool> + use<'a, 'd> {
        let at = Location::caller();
        async move {
            if self.halted() {
                return false;
            }
            let what = ElementQuery::button(identifier_or_label).to_string();
            let button = match self.driver.find_button(identifier_or_label).await {
                Ok(Some(button)) => button,
                Ok(None) => {
                    let err = AssertionError::ElementNotInteractable {
                        what,
                        reason: "no matching button exists".to_string(),
                    };
                    return self.fail(err, at).await;
                }
                Err(e) => return self.fail_driver("look up button", e, at).await,
            };
            match self.driver.tap(&button).await {
                Ok(()) => {
                    debug!(scenario = %self.scenario, button = %what, "tapped");
                    true
                }
                Err(DriverError::ElementNotInteractable(reason)) => {
                    let err = AssertionError::ElementNotInteractable { what, reason };
                    self.fail(err, at).await
                }
                Err(e) => self.fail_driver("tap", e, at).await,
            }
        }
    }

    /// Reads the displayed text of the static text with this identifier.
    ///
    /// A missing element is recorded as a failure and yields an empty
    /// snapshot.
    #[track_caller]
    pub fn read_label<'a>(
        &'a mut self,
        identifier: &'a str,
    ) -> impl Future<Output = LabelSnapshot> + use<'a, 'd> {
        let at = Location::caller();
        async move {
            if self.halted() {
                return LabelSnapshot::new(identifier, "");
            }
            match self.driver.read_label(identifier).await {
                Ok(value) => {
                    debug!(scenario = %self.scenario, identifier, value = %value, "read label");
                    LabelSnapshot::new(identifier, value)
                }
                Err(DriverError::ElementNotFound(what)) => {
                    self.fail(AssertionError::ElementNotFound { what }, at).await;
                    LabelSnapshot::new(identifier, "")
                }
                Err(e) => {
                    self.fail_driver("read label", e, at).await;
                    LabelSnapshot::new(identifier, "")
                }
            }
        }
    }

    /// Succeeds iff `observed` differs from `unexpected`.
    #[track_caller]
    pub fn assert_not_equal<'a>(
        &'a mut self,
        observed: &'a str,
        unexpected: &'a str,
    ) -> impl Future<Output = bool> + use<'a, 'd> {
        let at = Location::caller();
        async move {
            if self.halted() {
                return false;
            }
            if observed != unexpected {
                return true;
            }
            let err = AssertionError::UnexpectedValue {
                expected: format!("a value other than \"{unexpected}\""),
                observed: observed.to_string(),
            };
            self.fail(err, at).await
        }
    }

    /// Succeeds iff `observed` equals `expected`.
    #[track_caller]
    pub fn assert_equal<'a>(
        &'a mut self,
        observed: &'a str,
        expected: &'a str,
    ) -> impl Future<Output = bool> + use<'a, 'd> {
        let at = Location::caller();
        async move {
            if self.halted() {
                return false;
            }
            if observed == expected {
                return true;
            }
            let err = AssertionError::UnexpectedValue {
                expected: format!("\"{expected}\""),
                observed: observed.to_string(),
            };
            self.fail(err, at).await
        }
    }

    /// Launches the app fresh.
    #[track_caller]
    pub fn launch(&mut self) -> impl Future<Output = bool> + use<'_, 'd> {
        self.lifecycle(LifecycleStep::Launch, Location::caller())
    }

    #[track_caller]
    pub fn terminate(&mut self) -> impl Future<Output = bool> + use<'_, 'd> {
        self.lifecycle(LifecycleStep::Terminate, Location::caller())
    }

    /// Brings the running app back to the foreground.
    #[track_caller]
    pub fn activate(&mut self) -> impl Future<Output = bool> + use<'_, 'd> {
        self.lifecycle(LifecycleStep::Activate, Location::caller())
    }

    /// Sends the app to the background via the home button.
    #[track_caller]
    pub fn press_home(&mut self) -> impl Future<Output = bool> + use<'_, 'd> {
        self.lifecycle(LifecycleStep::PressHome, Location::caller())
    }

    async fn lifecycle(&mut self, step: LifecycleStep, at: CallSite) -> bool {
        if self.halted() {
            return false;
        }
        let result = match step {
            LifecycleStep::Launch => self.driver.launch().await,
            LifecycleStep::Terminate => self.driver.terminate().await,
            LifecycleStep::Activate => self.driver.activate().await,
            LifecycleStep::PressHome => self.driver.press_home().await,
        };
        match result {
            Ok(()) => {
                debug!(scenario = %self.scenario, step = step.verb(), "lifecycle step done");
                true
            }
            Err(e) => self.fail_driver(step.verb(), e, at).await,
        }
    }

    async fn fail(&mut self, err: AssertionError, at: CallSite) -> bool {
        self.record(err.to_string(), true, at).await
    }

    async fn fail_driver(&mut self, action: &str, err: DriverError, at: CallSite) -> bool {
        self.record(format!("Failed to {action}: {err}"), false, at).await
    }

    /// Captures the screen and records one failure. Always returns false.
    pub(crate) async fn record(
        &mut self,
        description: String,
        expected: bool,
        at: CallSite,
    ) -> bool {
        let screenshot = match self.driver.screenshot().await {
            Ok(png) => Some(png),
            Err(e) => {
                warn!(scenario = %self.scenario, error = %e, "screenshot capture failed");
                None
            }
        };
        let record = FailureRecord::new(&self.scenario, description, at, expected, screenshot);
        debug!(scenario = %self.scenario, failure = %record, "failure recorded");
        self.reporter.record(&record);
        self.failures.push(record);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_compares_by_value() {
        let snapshot = LabelSnapshot::new("label", "€ 4,20");
        assert!(snapshot.contains("€"));
        assert!(snapshot != "Hello");
        assert!(snapshot == "€ 4,20");
        assert_eq!(snapshot.identifier(), "label");
        assert_eq!(snapshot.to_string(), "€ 4,20");
    }

    #[test]
    fn default_snapshot_is_empty() {
        let snapshot = LabelSnapshot::default();
        assert_eq!(snapshot.as_str(), "");
        assert!(!snapshot.contains("€"));
    }
}
