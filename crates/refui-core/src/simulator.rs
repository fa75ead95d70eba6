//! [`AutomationDriver`] backed by a booted iOS Simulator.
//!
//! The accessibility tree, taps and the home button go through `axe`; app
//! launch, activation, termination and screenshots go through `xcrun simctl`.
//! Both are blocking subprocesses, so every call runs on tokio's blocking
//! pool and the caller awaits its completion.

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::axe::Axe;
use crate::driver::{AutomationDriver, DriverConfig, DriverError, WaitBudget};
use crate::element::UIElement;
use crate::simctl::Simctl;

/// Drives one app on one simulator.
#[derive(Debug, Clone)]
pub struct SimulatorDriver {
    udid: String,
    bundle_id: String,
    wait: WaitBudget,
}

impl SimulatorDriver {
    pub fn new(udid: impl Into<String>, bundle_id: impl Into<String>, wait: WaitBudget) -> Self {
        Self {
            udid: udid.into(),
            bundle_id: bundle_id.into(),
            wait,
        }
    }

    /// Build a driver from config, resolving the booted simulator when no
    /// UDID is given.
    pub fn from_config(config: DriverConfig) -> Result<Self, DriverError> {
        let udid = match config.udid {
            Some(udid) => udid,
            None => Simctl::get_booted_udid()?,
        };
        debug!(udid = %udid, bundle_id = %config.bundle_id, "simulator driver ready");
        Ok(Self::new(udid, config.bundle_id, config.wait))
    }

    pub fn udid(&self) -> &str {
        &self.udid
    }

    pub fn bundle_id(&self) -> &str {
        &self.bundle_id
    }
}

/// Runs a blocking backend call on the blocking pool and awaits it.
async fn blocking<T, E, F>(f: F) -> Result<T, DriverError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<DriverError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DriverError::CommandFailed(format!("backend task failed: {e}")))?
        .map_err(Into::into)
}

#[async_trait]
impl AutomationDriver for SimulatorDriver {
    fn wait_budget(&self) -> WaitBudget {
        self.wait
    }

    async fn dump_tree(&self) -> Result<Vec<UIElement>, DriverError> {
        let udid = self.udid.clone();
        blocking(move || Axe::dump_hierarchy(&udid)).await
    }

    #[instrument(skip_all, fields(element = %element.describe()), level = "debug")]
    async fn tap(&self, element: &UIElement) -> Result<(), DriverError> {
        if !element.is_hittable() {
            return Err(DriverError::ElementNotInteractable(format!(
                "{} is not hittable",
                element.describe()
            )));
        }
        let frame = element.frame.ok_or_else(|| {
            DriverError::ElementNotInteractable(format!("{} has no frame", element.describe()))
        })?;
        if frame.width <= 0.0 || frame.height <= 0.0 {
            return Err(DriverError::ElementNotInteractable(format!(
                "{} has an empty frame",
                element.describe()
            )));
        }

        let (x, y) = frame.center();
        let udid = self.udid.clone();
        blocking(move || Axe::tap(&udid, x, y)).await
    }

    #[instrument(skip(self), fields(bundle_id = %self.bundle_id), level = "debug")]
    async fn launch(&self) -> Result<(), DriverError> {
        let (udid, bundle_id) = (self.udid.clone(), self.bundle_id.clone());
        blocking(move || Simctl::launch_app(&udid, &bundle_id, true)).await
    }

    #[instrument(skip(self), fields(bundle_id = %self.bundle_id), level = "debug")]
    async fn terminate(&self) -> Result<(), DriverError> {
        let (udid, bundle_id) = (self.udid.clone(), self.bundle_id.clone());
        blocking(move || Simctl::terminate_app(&udid, &bundle_id)).await
    }

    #[instrument(skip(self), fields(bundle_id = %self.bundle_id), level = "debug")]
    async fn activate(&self) -> Result<(), DriverError> {
        let (udid, bundle_id) = (self.udid.clone(), self.bundle_id.clone());
        blocking(move || Simctl::launch_app(&udid, &bundle_id, false)).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn press_home(&self) -> Result<(), DriverError> {
        let udid = self.udid.clone();
        blocking(move || Axe::press_home(&udid)).await
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        let udid = self.udid.clone();
        blocking(move || Simctl::screenshot(&udid)).await
    }
}
