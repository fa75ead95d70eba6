use crate::runner::SuiteReport;

/// Format a suite report for the terminal.
///
/// ```text
/// ✓ PASS  initial_layout (0.8s)
/// ✗ FAIL  persistence_when_terminating (2.4s)
///     scenario.rs:117: Hello does not exist!
///
/// 1 passed, 1 failed (2 total) in 3.2s
/// ```
pub fn render(report: &SuiteReport) -> String {
    let mut out = String::new();

    for result in &report.scenarios {
        let marker = if result.passed() {
            "\u{2713} PASS"
        } else {
            "\u{2717} FAIL"
        };
        out.push_str(&format!(
            "{}  {} ({:.1}s)\n",
            marker,
            result.scenario.name(),
            result.duration.as_secs_f64()
        ));

        for failure in &result.failures {
            let tag = if failure.expected() { "" } else { "[ERROR] " };
            out.push_str(&format!("    {tag}{failure}\n"));
        }
    }

    out.push_str(&format!(
        "\n{} passed, {} failed ({} total) in {:.1}s\n",
        report.passed_count(),
        report.failed_count(),
        report.total(),
        report.duration.as_secs_f64()
    ));

    out
}
