//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use jujuact_core::ActionStatus;

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Status label, colored by lifecycle state when `color` is set.
pub fn paint_status(status: ActionStatus, color: bool) -> String {
    let label = status.to_string();
    if !color {
        return label;
    }
    match status {
        ActionStatus::Pending => label.yellow().to_string(),
        ActionStatus::Completed => label.green().to_string(),
        ActionStatus::Failed => label.red().bold().to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, which returns a pre-formatted
/// key/value block.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize + ?Sized,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Align `label: value` lines for detail views.
pub fn detail_lines(pairs: &[(&str, String)]) -> String {
    let width = pairs.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    pairs
        .iter()
        .map(|(label, value)| format!("{label:<width$}  {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: serialization failed: {e}"))
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Unit {
        name: String,
        state: String,
    }

    #[derive(Tabled)]
    struct UnitRow {
        #[tabled(rename = "Unit")]
        name: String,
        #[tabled(rename = "State")]
        state: String,
    }

    fn units() -> Vec<Unit> {
        vec![
            Unit {
                name: "redmine/0".into(),
                state: "started".into(),
            },
            Unit {
                name: "redmine/1".into(),
                state: "pending".into(),
            },
        ]
    }

    fn row(u: &Unit) -> UnitRow {
        UnitRow {
            name: u.name.clone(),
            state: u.state.clone(),
        }
    }

    #[test]
    fn plain_emits_one_id_per_line() {
        let out = render_list(&OutputFormat::Plain, &units(), row, |u| u.name.clone());
        assert_eq!(out, "redmine/0\nredmine/1");
    }

    #[test]
    fn table_has_headers_and_rows() {
        let out = render_list(&OutputFormat::Table, &units(), row, |u| u.name.clone());
        assert!(out.contains("Unit"));
        assert!(out.contains("redmine/1"));
    }

    #[test]
    fn json_keeps_serde_shape() {
        let out = render_list(&OutputFormat::JsonCompact, &units(), row, |u| u.name.clone());
        assert_eq!(
            out,
            r#"[{"name":"redmine/0","state":"started"},{"name":"redmine/1","state":"pending"}]"#
        );
    }

    #[test]
    fn status_is_plain_without_color() {
        assert_eq!(paint_status(ActionStatus::Failed, false), "failed");
        assert!(paint_status(ActionStatus::Completed, true).contains("completed"));
    }

    #[test]
    fn detail_lines_align_labels() {
        let out = detail_lines(&[("Tag", "action-1".into()), ("Status", "pending".into())]);
        assert_eq!(out, "Tag     action-1\nStatus  pending");
    }
}
