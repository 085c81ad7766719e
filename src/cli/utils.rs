//! Shared utilities for CLI commands

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::error::{CliError, CliResult};
use crate::db::Timestamp;

/// Truncate a string with ellipsis if it exceeds max length
pub fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional timestamp for display
pub fn format_timestamp(ts: Option<&Timestamp>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Parse an optional RFC 3339 timestamp given on the command line
pub fn parse_timestamp(raw: Option<&str>) -> CliResult<Option<Timestamp>> {
    raw.map(|s| {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| CliError::InvalidInput {
                message: format!("'{}' is not an RFC 3339 timestamp: {}", s, e),
            })
    })
    .transpose()
}

/// Apply consistent table styling
pub fn apply_table_style(table: &mut Table) {
    table.with(Style::rounded());
}

/// Render items as JSON or as a styled table of their display rows
pub fn render<T, D>(items: &[T], format: &str, empty: &str) -> CliResult<String>
where
    T: Serialize,
    D: Tabled + for<'a> From<&'a T>,
{
    if format == "json" {
        return Ok(serde_json::to_string_pretty(items)?);
    }
    if items.is_empty() {
        return Ok(empty.to_string());
    }

    let rows: Vec<D> = items.iter().map(D::from).collect();
    let mut table = Table::new(rows);
    apply_table_style(&mut table);
    Ok(table.to_string())
}
