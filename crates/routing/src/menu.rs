//! Selection menu text.

/// Render the selection menu: the title, a newline, then one
/// `"<n>) <label>"` line per entry numbered from 1.
#[must_use]
pub fn render_menu<S: AsRef<str>>(title: &str, labels: &[S]) -> String {
    let lines: Vec<String> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| format!("{}) {}", i + 1, label.as_ref()))
        .collect();
    format!("{title}\n{}", lines.join("\n"))
}
