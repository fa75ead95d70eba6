//! The four end-to-end scenarios for the reference app.
//!
//! Each scenario is a straight line of helper calls. The app starts freshly
//! launched (the runner's setup does that) and every helper is awaited before
//! the next one starts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::context::ScenarioContext;

/// What the scenarios expect the app to show.
///
/// Defaults describe the reference app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppExpectations {
    /// Static text shown at launch.
    pub greeting: String,
    /// Title of the generate button.
    pub button_title: String,
    /// Accessibility identifier of the generate button.
    pub generate_button: String,
    /// Accessibility identifier of the static text that shows the value.
    pub value_label: String,
    /// Element attribute the contains-check inspects.
    pub label_field: String,
    /// Substring every generated value carries.
    pub currency: String,
    /// Text a generated value must differ from.
    pub placeholder: String,
    /// Static text expected after terminate and relaunch.
    pub reset_text: String,
}

impl Default for AppExpectations {
    fn default() -> Self {
        Self {
            greeting: "Hello!!".to_string(),
            button_title: "Button".to_string(),
            generate_button: "generateButton".to_string(),
            value_label: "label".to_string(),
            label_field: "label".to_string(),
            currency: "€".to_string(),
            placeholder: "Hello".to_string(),
            reset_text: "Hello!!".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    InitialLayout,
    GenerateValue,
    PersistenceInBackground,
    PersistenceWhenTerminating,
}

impl Scenario {
    /// Every scenario, in execution order.
    pub fn all() -> [Scenario; 4] {
        [
            Scenario::InitialLayout,
            Scenario::GenerateValue,
            Scenario::PersistenceInBackground,
            Scenario::PersistenceWhenTerminating,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::InitialLayout => "initial_layout",
            Scenario::GenerateValue => "generate_value",
            Scenario::PersistenceInBackground => "persistence_in_background",
            Scenario::PersistenceWhenTerminating => "persistence_when_terminating",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Scenario::InitialLayout => "greeting and generate button are shown at launch",
            Scenario::GenerateValue => "tapping generate shows a euro amount",
            Scenario::PersistenceInBackground => "the generated amount survives backgrounding",
            Scenario::PersistenceWhenTerminating => "termination resets the label",
        }
    }

    /// Runs the scenario body against an already launched app.
    pub async fn run(self, ctx: &mut ScenarioContext<'_>, expect: &AppExpectations) {
        match self {
            Scenario::InitialLayout => {
                ctx.assert_text_exists(&expect.greeting).await;
                ctx.assert_button_with_text_exists(&expect.button_title).await;
            }
            Scenario::GenerateValue => {
                ctx.tap_button(&expect.generate_button).await;
                let label = ctx.read_label(&expect.value_label).await;
                ctx.assert_label_contains(&expect.label_field, &expect.currency).await;
                ctx.assert_not_equal(label.as_str(), &expect.placeholder).await;
            }
            Scenario::PersistenceInBackground => {
                ctx.tap_button(&expect.generate_button).await;
                ctx.press_home().await;
                ctx.activate().await;
                let label = ctx.read_label(&expect.value_label).await;
                ctx.assert_label_contains(&expect.label_field, &expect.currency).await;
                ctx.assert_not_equal(label.as_str(), &expect.placeholder).await;
            }
            Scenario::PersistenceWhenTerminating => {
                ctx.tap_button(&expect.generate_button).await;
                ctx.terminate().await;
                ctx.launch().await;
                ctx.assert_text_exists(&expect.reset_text).await;
            }
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = String;

    /// Accepts the snake_case name, with `-` allowed in place of `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Scenario::all()
            .into_iter()
            .find(|scenario| scenario.name() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Scenario::all().iter().map(|s| s.name()).collect();
                format!("unknown scenario '{s}' (expected one of: {})", known.join(", "))
            })
    }
}
