//! Plain-text table output for the CLI
//!
//! Runs rows through the same [`TableViewState`] pipeline as the console
//! table, then lays the rendered cells out in fixed-width columns.
//! Detail views print as indented sections.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::models::RecordDetail;
use crate::schema::{
    find_column, ColumnDescriptor, ColumnKey, SchemaError, SortDirection, TableRow,
    TableViewState, ViewOptions,
};

const MAX_CELL_WIDTH: usize = 40;
const COLUMN_GAP: &str = "  ";

/// What the user asked the list to show
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    pub search: Option<String>,
    /// `(column, value)` pairs
    pub filters: Vec<(String, String)>,
    pub sort: Option<String>,
    pub descending: bool,
}

impl ListOptions {
    /// Parse `column=value`
    pub fn parse_filter(raw: &str) -> Result<(String, String), String> {
        match raw.split_once('=') {
            Some((column, value)) if !column.trim().is_empty() => {
                Ok((column.trim().to_string(), value.to_string()))
            }
            _ => Err(format!("expected column=value, got '{raw}'")),
        }
    }

    /// Resolve column names against the row's columns. Unknown names and
    /// sorting on a non-sortable column are errors.
    pub fn view_state<R: TableRow>(
        &self,
        columns: &[ColumnDescriptor<R>],
    ) -> Result<TableViewState<R::Key>, SchemaError> {
        let mut view = TableViewState::new();
        if let Some(term) = &self.search {
            view.set_search(term.clone());
        }
        for (column, value) in &self.filters {
            let key = R::Key::parse(column)?;
            view.set_filter(key, value.clone());
        }
        if let Some(name) = &self.sort {
            let column = find_column(columns, name)?;
            if !column.sortable {
                return Err(SchemaError::NotSortable(name.clone()));
            }
            let direction = if self.descending {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            };
            view.set_sort(column.key, direction);
        }
        Ok(view)
    }
}

/// Cut to a display width, marking the cut with an ellipsis
pub fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

pub(crate) fn pad_to_width(text: &str, width: usize) -> String {
    let padding = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(padding))
}

/// Lay out headers and rendered cells
pub fn render_table<R: TableRow>(columns: &[ColumnDescriptor<R>], rows: &[&R]) -> String {
    let headers: Vec<String> = columns.iter().map(|c| c.label.clone()).collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| {
                    let content = column.render_cell(row);
                    truncate_to_width(&content.plain().replace('\n', " "), MAX_CELL_WIDTH)
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            cells
                .iter()
                .map(|row| row[i].width())
                .chain(std::iter::once(header.width()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_line = |values: &[String]| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(value, width)| pad_to_width(value, *width))
            .collect::<Vec<_>>()
            .join(COLUMN_GAP)
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(cells.len() + 2);
    lines.push(format_line(&headers));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join(COLUMN_GAP),
    );
    for row in &cells {
        lines.push(format_line(row));
    }
    lines.join("\n")
}

/// Filter, sort and print rows, or "No data found" when nothing is left
pub fn render_list<R: TableRow>(
    columns: &[ColumnDescriptor<R>],
    rows: &[R],
    options: &ListOptions,
) -> Result<String, SchemaError> {
    let view = options.view_state(columns)?;
    let visible = view.apply(rows, ViewOptions::default());
    if visible.is_empty() {
        return Ok("No data found".to_string());
    }
    Ok(format!(
        "{}\n\n{} of {} rows",
        render_table(columns, &visible),
        visible.len(),
        rows.len()
    ))
}

/// Sections of a detail view, one indented line per entry
pub fn render_detail(detail: &RecordDetail) -> String {
    let mut out = vec![detail.title.clone(), "=".repeat(detail.title.width())];
    for section in &detail.sections {
        out.push(String::new());
        out.push(format!("{}:", section.heading));
        if section.lines.is_empty() {
            out.push("  No data found".to_string());
        }
        for line in &section.lines {
            out.push(match &line.label {
                Some(label) => format!("  {}: {}", label, line.text),
                None => format!("  {}", line.text),
            });
        }
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DetailLine, DetailSection};
    use crate::schema::column::fixtures::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            ListOptions::parse_filter("name=ali"),
            Ok(("name".to_string(), "ali".to_string()))
        );
        assert_eq!(
            ListOptions::parse_filter("note=a=b"),
            Ok(("note".to_string(), "a=b".to_string()))
        );
        assert!(ListOptions::parse_filter("nameali").is_err());
        assert!(ListOptions::parse_filter("=x").is_err());
    }

    #[test]
    fn test_render_list_searches_and_sorts() {
        let rows = alice_and_bob();
        let options = ListOptions {
            sort: Some("name".to_string()),
            descending: true,
            ..Default::default()
        };
        let out = render_list(&person_columns(), &rows, &options).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Name   Active");
        assert_eq!(lines[1], "-----  ------");
        assert_eq!(lines[2], "Bob    No");
        assert_eq!(lines[3], "Alice  Yes");
        assert!(out.ends_with("2 of 2 rows"));

        let searched = ListOptions {
            search: Some("zzz".to_string()),
            ..Default::default()
        };
        assert_eq!(render_list(&person_columns(), &rows, &searched).unwrap(), "No data found");
    }

    #[test]
    fn test_unknown_and_unsortable_columns_fail() {
        let rows = alice_and_bob();
        let unknown = ListOptions {
            filters: vec![("email".to_string(), "x".to_string())],
            ..Default::default()
        };
        assert_eq!(
            render_list(&person_columns(), &rows, &unknown),
            Err(SchemaError::UnknownColumn("email".to_string()))
        );

        let unsortable = ListOptions {
            sort: Some("active".to_string()),
            ..Default::default()
        };
        assert_eq!(
            render_list(&person_columns(), &rows, &unsortable),
            Err(SchemaError::NotSortable("active".to_string()))
        );
    }

    #[test]
    fn test_truncate_respects_display_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
        // Wide characters take two columns each
        assert_eq!(truncate_to_width("日本語テキスト", 7), "日本語…");
    }

    #[test]
    fn test_render_detail_sections() {
        let detail = RecordDetail {
            title: "Alice".to_string(),
            sections: vec![
                DetailSection {
                    heading: "Profile".to_string(),
                    lines: vec![DetailLine::labelled("email", "alice@example.com")],
                },
                DetailSection {
                    heading: "Vehicles".to_string(),
                    lines: Vec::new(),
                },
            ],
        };
        assert_eq!(
            render_detail(&detail),
            "Alice\n=====\n\nProfile:\n  email: alice@example.com\n\nVehicles:\n  No data found"
        );
    }
}
