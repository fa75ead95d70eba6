use crate::runner::SuiteReport;

/// Suite name written into the `<testsuite>` element.
pub const SUITE_NAME: &str = "refui";

/// Render a suite report as JUnit XML for CI systems.
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <testsuite name="refui" tests="2" failures="1" time="4.210">
///   <testcase name="initial_layout" classname="refui" time="1.020" />
///   <testcase name="generate_value" classname="refui" time="3.190">
///     <failure message="1 failure(s)" type="AssertionFailure">scenario.rs:104: expected a value other than &quot;Hello&quot;, observed &quot;Hello&quot;</failure>
///   </testcase>
/// </testsuite>
/// ```
///
/// A scenario whose failures are all unexpected (driver errors rather than
/// assertions) is reported as `<error>` instead of `<failure>`.
pub fn render(report: &SuiteReport) -> String {
    let mut cases = String::new();
    for result in &report.scenarios {
        let name = escape_xml(result.scenario.name());
        let time = result.duration.as_secs_f64();
        if result.passed() {
            cases.push_str(&format!(
                "  <testcase name=\"{name}\" classname=\"{SUITE_NAME}\" time=\"{time:.3}\" />\n"
            ));
            continue;
        }

        let body: Vec<String> = result.failures.iter().map(|f| f.to_string()).collect();
        let tag = if result.failures.iter().any(|f| f.expected()) {
            "failure"
        } else {
            "error"
        };
        let kind = if tag == "failure" {
            "AssertionFailure"
        } else {
            "DriverError"
        };
        cases.push_str(&format!(
            "  <testcase name=\"{name}\" classname=\"{SUITE_NAME}\" time=\"{time:.3}\">\n    <{tag} message=\"{message}\" type=\"{kind}\">{body}</{tag}>\n  </testcase>\n",
            message = escape_xml(&format!("{} failure(s)", result.failures.len())),
            body = escape_xml(&body.join("\n")),
        ));
    }

    let errors = report
        .scenarios
        .iter()
        .filter(|r| !r.passed() && r.failures.iter().all(|f| !f.expected()))
        .count();

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<testsuite name=\"{SUITE_NAME}\" tests=\"{tests}\" failures=\"{failures}\" errors=\"{errors}\" time=\"{time:.3}\">\n{cases}</testsuite>\n",
        tests = report.total(),
        failures = report.failed_count() - errors,
        time = report.duration.as_secs_f64(),
    )
}

/// Escape XML special characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
