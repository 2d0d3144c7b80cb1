use scuttle_coordinator::UninstallReport;

/// Render a plan report as the indented phase/step tree operators read
/// from the terminal (E3). The HTTP surface hands back the same
/// [`UninstallReport`] as JSON; this is its text twin.
pub fn render_report(report: &UninstallReport) -> String {
    report.render_text()
}
