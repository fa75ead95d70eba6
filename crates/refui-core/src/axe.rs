//! Wrapper around the `axe` accessibility CLI.
//!
//! `axe` reads the simulator's accessibility tree and injects touches and
//! hardware button presses. Install with `brew install cameroncooke/axe/axe`.

use std::process::Command;

use thiserror::Error;

use crate::element::UIElement;

#[derive(Error, Debug)]
pub enum AxeError {
    #[error("Command execution failed: {0}")]
    CommandFailed(String),
    #[error("axe tool not found - install with: brew install cameroncooke/axe/axe")]
    NotInstalled,
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct Axe;

impl Axe {
    /// Check if axe is on the PATH.
    pub fn is_installed() -> bool {
        Command::new("which")
            .arg("axe")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn run(args: &[&str]) -> Result<Vec<u8>, AxeError> {
        if !Self::is_installed() {
            return Err(AxeError::NotInstalled);
        }

        let output = Command::new("axe").args(args).output()?;
        if !output.status.success() {
            return Err(AxeError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(output.stdout)
    }

    /// Dump the accessibility hierarchy of the foreground app.
    pub fn dump_hierarchy(udid: &str) -> Result<Vec<UIElement>, AxeError> {
        let stdout = Self::run(&["describe-ui", "--udid", udid])?;
        Self::parse_hierarchy(&stdout)
    }

    /// Parse `describe-ui` output.
    pub fn parse_hierarchy(json: &[u8]) -> Result<Vec<UIElement>, AxeError> {
        Ok(serde_json::from_slice(json)?)
    }

    /// Tap at x,y screen coordinates.
    pub fn tap(udid: &str, x: i32, y: i32) -> Result<(), AxeError> {
        Self::run(&["tap", "-x", &x.to_string(), "-y", &y.to_string(), "--udid", udid])?;
        Ok(())
    }

    /// Press the hardware home button.
    pub fn press_home(udid: &str) -> Result<(), AxeError> {
        Self::run(&["button", "home", "--udid", udid])?;
        Ok(())
    }
}
