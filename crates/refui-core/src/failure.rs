//! Assertion failures and the records they produce.
//!
//! Every failed assertion becomes exactly one [`FailureRecord`]: what went
//! wrong, where in the scenario it happened, whether it was an assertion
//! (expected) or an unexpected driver error, and the screen at that moment.

use std::panic::Location;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Why an assertion failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssertionError {
    /// A query located zero matching elements.
    #[error("{what} does not exist!")]
    ElementNotFound { what: String },

    /// An element could not receive the requested action.
    #[error("{what} is not interactable: {reason}")]
    ElementNotInteractable { what: String, reason: String },

    /// An observed value did not satisfy the expected predicate.
    #[error("expected {expected}, observed \"{observed}\"")]
    UnexpectedValue { expected: String, observed: String },
}

/// One recorded failure. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    id: Uuid,
    scenario: String,
    description: String,
    file: String,
    line: u32,
    expected: bool,
    #[serde(with = "base64_png", default, skip_serializing_if = "Option::is_none")]
    screenshot: Option<Vec<u8>>,
    recorded_at: DateTime<Utc>,
}

impl FailureRecord {
    /// Creates a record stamped with a fresh id and the current time.
    ///
    /// `expected` is true for assertion failures and false for errors the
    /// scenario did not anticipate (a lifecycle call failing, for example).
    pub fn new(
        scenario: impl Into<String>,
        description: impl Into<String>,
        location: &Location<'_>,
        expected: bool,
        screenshot: Option<Vec<u8>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            scenario: scenario.into(),
            description: description.into(),
            file: location.file().to_string(),
            line: location.line(),
            expected,
            screenshot,
            recorded_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn expected(&self) -> bool {
        self.expected
    }

    /// PNG bytes of the screen when the failure was recorded, if capture worked.
    pub fn screenshot(&self) -> Option<&[u8]> {
        self.screenshot.as_deref()
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

impl std::fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.description)
    }
}

mod base64_png {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => s.serialize_str(&STANDARD.encode(b)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
