//! Automation driver trait: the boundary to the OS-level UI automation.
//!
//! [`AutomationDriver`] is the fixed capability set the scenarios are written
//! against: fetch the accessibility tree, tap an element, move the app
//! through its lifecycle, press the home button and capture the screen. The
//! element lookups (`find_text`, `find_button`, `find_first`, `read_label`)
//! have default implementations that fetch the live tree and search it
//! locally, so a backend only has to provide the primitives.
//!
//! # Element wait budget
//!
//! Lookups poll the tree until a match appears or the driver's
//! [`WaitBudget`] runs out, then report absence. Actions (tap, lifecycle,
//! home, screenshot) are issued exactly once and never retried.
//!
//! ```no_run
//! use refui_core::driver::{AutomationDriver, DriverConfig};
//! use refui_core::simulator::SimulatorDriver;
//!
//! # async fn example() -> Result<(), refui_core::driver::DriverError> {
//! let driver = SimulatorDriver::from_config(DriverConfig::default())?;
//! driver.launch().await?;
//! if let Some(button) = driver.find_button("generateButton").await? {
//!     driver.tap(&button).await?;
//! }
//! println!("label: {}", driver.read_label("label").await?);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;
use tracing::trace;

use crate::axe::AxeError;
use crate::element::{ElementKind, UIElement};
use crate::query::{ElementQuery, Predicate};
use crate::simctl::SimctlError;

/// Bundle identifier of the reference app.
pub const DEFAULT_BUNDLE_ID: &str = "com.abnamro.ReferenceiOS";

/// Errors from driver operations, unified across backends.
#[derive(Error, Debug)]
pub enum DriverError {
    /// A lookup found no matching element.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The element exists but cannot receive the action.
    #[error("Element not interactable: {0}")]
    ElementNotInteractable(String),

    /// A backend command failed.
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// No simulator is in the "Booted" state.
    #[error("No booted simulator found")]
    NoBootedSimulator,

    /// A required external tool is missing.
    #[error("{0}")]
    NotInstalled(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

impl From<SimctlError> for DriverError {
    fn from(e: SimctlError) -> Self {
        match e {
            SimctlError::NoBootedSimulator => DriverError::NoBootedSimulator,
            SimctlError::CommandFailed(msg) => DriverError::CommandFailed(msg),
            SimctlError::JsonParse(e) => DriverError::JsonParse(e.to_string()),
            SimctlError::Io(e) => DriverError::Io(e),
        }
    }
}

impl From<AxeError> for DriverError {
    fn from(e: AxeError) -> Self {
        match e {
            AxeError::NotInstalled => DriverError::NotInstalled(e.to_string()),
            AxeError::CommandFailed(msg) => DriverError::CommandFailed(msg),
            AxeError::JsonParse(e) => DriverError::JsonParse(e.to_string()),
            AxeError::Io(e) => DriverError::Io(e),
        }
    }
}

/// How long element lookups keep polling before reporting absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitBudget {
    /// Total time a lookup may wait for its element. Zero queries once.
    #[serde(with = "millis")]
    pub timeout: Duration,
    /// Pause between two tree fetches.
    #[serde(with = "millis")]
    pub poll_interval: Duration,
}

impl WaitBudget {
    pub const DEFAULT_TIMEOUT_MS: u64 = 3000;
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
    /// Shortest pause between tree fetches. Zero is raised to this.
    pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

    pub fn from_millis(timeout_ms: u64, poll_interval_ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
            poll_interval: Duration::from_millis(poll_interval_ms).max(Self::MIN_POLL_INTERVAL),
        }
    }

    /// A budget that queries the tree exactly once.
    pub fn immediate() -> Self {
        Self::from_millis(0, Self::DEFAULT_POLL_INTERVAL_MS)
    }
}

impl Default for WaitBudget {
    fn default() -> Self {
        Self::from_millis(Self::DEFAULT_TIMEOUT_MS, Self::DEFAULT_POLL_INTERVAL_MS)
    }
}

pub(crate) mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Selects the simulator and app a driver is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Simulator UDID. `None` means the first booted simulator.
    pub udid: Option<String>,
    /// Bundle identifier of the app under test.
    pub bundle_id: String,
    pub wait: WaitBudget,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            udid: None,
            bundle_id: DEFAULT_BUNDLE_ID.to_string(),
            wait: WaitBudget::default(),
        }
    }
}

/// Polls the live tree until `matcher` returns a match or the budget expires.
async fn poll_tree<D, F>(
    driver: &D,
    budget: WaitBudget,
    mut matcher: F,
) -> Result<Option<UIElement>, DriverError>
where
    D: AutomationDriver + ?Sized,
    F: FnMut(&[UIElement]) -> Option<UIElement> + Send,
{
    let deadline = Instant::now() + budget.timeout;
    let pause = budget.poll_interval.max(WaitBudget::MIN_POLL_INTERVAL);
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let tree = driver.dump_tree().await?;
        if let Some(found) = matcher(&tree) {
            return Ok(Some(found));
        }
        if Instant::now() >= deadline {
            trace!(attempts, "lookup exhausted wait budget");
            return Ok(None);
        }
        tokio::time::sleep(pause).await;
    }
}

/// Backend-agnostic UI automation for one app under test.
///
/// Required methods are the primitives a backend must supply; the lookups are
/// provided on top of [`dump_tree`](AutomationDriver::dump_tree). Every call
/// suspends the caller until the backend confirms completion.
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    /// The element wait budget used by the provided lookups.
    fn wait_budget(&self) -> WaitBudget {
        WaitBudget::default()
    }

    /// Fetch the current accessibility tree of the app.
    async fn dump_tree(&self) -> Result<Vec<UIElement>, DriverError>;

    /// Tap the given element.
    ///
    /// Fails with [`DriverError::ElementNotInteractable`] if the element
    /// cannot receive the tap.
    async fn tap(&self, element: &UIElement) -> Result<(), DriverError>;

    /// Launch the app fresh (cold start), terminating a running instance.
    async fn launch(&self) -> Result<(), DriverError>;

    /// Terminate the app.
    async fn terminate(&self) -> Result<(), DriverError>;

    /// Bring an already running app to the foreground without relaunching it.
    async fn activate(&self) -> Result<(), DriverError>;

    /// Press the device home button, sending the foreground app to the background.
    async fn press_home(&self) -> Result<(), DriverError>;

    /// Capture the current screen as PNG bytes. No side effects on the app.
    async fn screenshot(&self) -> Result<Vec<u8>, DriverError>;

    /// Resolve a query against the live tree within the wait budget.
    async fn locate(&self, query: &ElementQuery) -> Result<Option<UIElement>, DriverError> {
        poll_tree(self, self.wait_budget(), |tree| query.find(tree)).await
    }

    /// A static text whose content equals `text`.
    async fn find_text(&self, text: &str) -> Result<Option<UIElement>, DriverError> {
        self.locate(&ElementQuery::text(text)).await
    }

    /// A button by accessibility identifier, falling back to its title.
    async fn find_button(
        &self,
        identifier_or_label: &str,
    ) -> Result<Option<UIElement>, DriverError> {
        self.locate(&ElementQuery::button(identifier_or_label)).await
    }

    /// The first element of `kind` satisfying `predicate`.
    async fn find_first(
        &self,
        predicate: &Predicate,
        kind: ElementKind,
    ) -> Result<Option<UIElement>, DriverError> {
        poll_tree(self, self.wait_budget(), |tree| predicate.first_match(kind, tree)).await
    }

    /// The displayed text of the static text with this identifier.
    ///
    /// Returns the label, or the value when the label is missing or empty.
    async fn read_label(&self, identifier: &str) -> Result<String, DriverError> {
        let query = ElementQuery::identified(ElementKind::StaticText, identifier);
        let element = self
            .locate(&query)
            .await?
            .ok_or_else(|| DriverError::ElementNotFound(query.to_string()))?;
        Ok(element
            .label
            .filter(|label| !label.is_empty())
            .or(element.value)
            .unwrap_or_default())
    }
}
