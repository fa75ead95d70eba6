//! Interface to Apple's `xcrun simctl` command-line tool.
//!
//! Covers what the scenarios need from the simulator itself: finding the
//! booted device, app launch and termination, and screenshots.
//!
//! # Requirements
//!
//! Xcode must be installed for `xcrun simctl` to be available.
//!
//! # Example
//!
//! ```no_run
//! use refui_core::simctl::Simctl;
//!
//! let udid = Simctl::get_booted_udid().unwrap();
//! Simctl::launch_app(&udid, "com.abnamro.ReferenceiOS", true).unwrap();
//! let png_bytes = Simctl::screenshot(&udid).unwrap();
//! ```

use std::path::Path;
use std::process::{Command, Output};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when interacting with simctl.
#[derive(Error, Debug)]
pub enum SimctlError {
    /// A simctl command exited with a non-zero status.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// No simulator is currently in the "Booted" state.
    #[error("No booted simulator found")]
    NoBootedSimulator,

    /// Failed to parse JSON output from simctl.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// An I/O error occurred while executing the command.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An iOS Simulator device as reported by `xcrun simctl list devices -j`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorDevice {
    /// The unique device identifier (UDID).
    pub udid: String,

    /// The human-readable name (e.g., "iPhone 15 Pro").
    pub name: String,

    /// The current state (e.g., "Booted", "Shutdown").
    pub state: String,

    /// The device type identifier.
    #[serde(rename = "deviceTypeIdentifier")]
    pub device_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeviceList {
    devices: std::collections::HashMap<String, Vec<SimulatorDevice>>,
}

/// Wrapper for `xcrun simctl` commands.
///
/// All methods are synchronous and block until the command exits; async
/// callers run them through `tokio::task::spawn_blocking`.
pub struct Simctl;

impl Simctl {
    fn run(args: &[&str]) -> Result<Output, SimctlError> {
        Ok(Command::new("xcrun").arg("simctl").args(args).output()?)
    }

    fn check(output: Output) -> Result<Output, SimctlError> {
        if output.status.success() {
            Ok(output)
        } else {
            Err(SimctlError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }

    /// Lists all simulator devices across all runtimes.
    ///
    /// # Errors
    ///
    /// - [`SimctlError::Io`] if the command fails to execute
    /// - [`SimctlError::CommandFailed`] if simctl returns a non-zero exit code
    /// - [`SimctlError::JsonParse`] if the output cannot be parsed as JSON
    pub fn list_devices() -> Result<Vec<SimulatorDevice>, SimctlError> {
        let output = Self::check(Self::run(&["list", "devices", "-j"])?)?;
        Self::parse_device_list(&output.stdout)
    }

    /// Returns the UDID of the first booted simulator.
    ///
    /// # Errors
    ///
    /// - [`SimctlError::NoBootedSimulator`] if no simulator is booted
    /// - Any errors from [`Self::list_devices`]
    pub fn get_booted_udid() -> Result<String, SimctlError> {
        let devices = Self::list_devices()?;
        Self::find_booted_device(&devices)
            .map(|d| d.udid.clone())
            .ok_or(SimctlError::NoBootedSimulator)
    }

    /// Takes a screenshot of the simulator screen and returns PNG bytes.
    ///
    /// The image is written to a temporary file, read back, and the file is
    /// removed.
    pub fn screenshot(udid: &str) -> Result<Vec<u8>, SimctlError> {
        let temp_path = std::env::temp_dir()
            .join(format!("refui_screenshot_{}.png", uuid::Uuid::new_v4()));
        let temp_str = temp_path.to_string_lossy();

        Self::check(Self::run(&["io", udid, "screenshot", &temp_str])?)?;

        Ok(Self::take_file(&temp_path)?)
    }

    /// Reads a file and removes it, whether or not the read succeeded.
    fn take_file(path: &Path) -> std::io::Result<Vec<u8>> {
        let bytes = std::fs::read(path);
        let _ = std::fs::remove_file(path);
        bytes
    }

    /// Launches an app.
    ///
    /// With `terminate_running` the existing process is killed first, which
    /// gives a cold start. Without it, simctl brings an already running
    /// instance to the foreground.
    pub fn launch_app(
        udid: &str,
        bundle_id: &str,
        terminate_running: bool,
    ) -> Result<(), SimctlError> {
        let mut args = vec!["launch"];
        if terminate_running {
            args.push("--terminate-running-process");
        }
        args.extend([udid, bundle_id]);
        Self::check(Self::run(&args)?)?;
        Ok(())
    }

    /// Terminates an app. An app that is not running is not an error.
    pub fn terminate_app(udid: &str, bundle_id: &str) -> Result<(), SimctlError> {
        let output = Self::run(&["terminate", udid, bundle_id])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !Self::is_not_running_error(&stderr) {
                return Err(SimctlError::CommandFailed(stderr.trim().to_string()));
            }
        }
        Ok(())
    }

    fn is_not_running_error(stderr: &str) -> bool {
        let lower = stderr.to_lowercase();
        lower.contains("not running") || lower.contains("found nothing to terminate")
    }

    /// Parses `simctl list devices -j` output into a flat device list.
    pub fn parse_device_list(json: &[u8]) -> Result<Vec<SimulatorDevice>, SimctlError> {
        let device_list: DeviceList = serde_json::from_slice(json)?;
        Ok(device_list.devices.into_values().flatten().collect())
    }

    /// The first device in state "Booted".
    pub fn find_booted_device(devices: &[SimulatorDevice]) -> Option<&SimulatorDevice> {
        devices.iter().find(|d| d.state == "Booted")
    }
}
