//! Table output formatting

use tabled::{
    Table, Tabled,
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Rows},
};

use crate::client::models::Row;

/// Format data as a table
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    if data.is_empty() {
        return "No results found.".to_string();
    }

    let mut table = Table::new(data);
    style(&mut table);
    table.to_string()
}

/// Format report rows under dynamic column headers.
///
/// Each row contributes its dimension values then its metric values.
pub fn format_report(columns: &[String], rows: &[Row]) -> String {
    if rows.is_empty() {
        return "No rows returned.".to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(columns.iter().cloned());
    for row in rows {
        builder.push_record(
            row.dimension_values
                .iter()
                .chain(row.metric_values.iter())
                .map(|cell| cell.value.clone()),
        );
    }

    let mut table = builder.build();
    style(&mut table);
    table.to_string()
}

fn style(table: &mut Table) {
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::CellValue;

    #[derive(Debug, Tabled)]
    struct TestRow {
        #[tabled(rename = "NAME")]
        name: String,
        #[tabled(rename = "ROWS")]
        rows: i64,
    }

    fn cell(v: &str) -> CellValue {
        CellValue {
            value: v.to_string(),
        }
    }

    #[test]
    fn test_format_table_empty() {
        let items: Vec<TestRow> = vec![];
        assert_eq!(format_table(&items), "No results found.");
    }

    #[test]
    fn test_format_table_uses_rounded_style() {
        let items = vec![TestRow {
            name: "weekly".to_string(),
            rows: 12,
        }];

        let result = format_table(&items);
        assert!(result.contains("NAME"));
        assert!(result.contains("weekly"));
        assert!(result.contains("╭"));
        assert!(result.contains("╰"));
    }

    #[test]
    fn test_format_report_columns_and_cells() {
        let columns = vec!["sessionSource".to_string(), "sessions".to_string()];
        let rows = vec![
            Row {
                dimension_values: vec![cell("google")],
                metric_values: vec![cell("1200")],
            },
            Row {
                dimension_values: vec![cell("(direct)")],
                metric_values: vec![cell("845")],
            },
        ];

        let result = format_report(&columns, &rows);
        assert!(result.contains("sessionSource"));
        assert!(result.contains("google"));
        assert!(result.contains("1200"));
        assert!(result.contains("(direct)"));

        let google = result.lines().position(|l| l.contains("google"));
        let direct = result.lines().position(|l| l.contains("(direct)"));
        assert!(google < direct);
    }

    #[test]
    fn test_format_report_empty() {
        assert_eq!(format_report(&["x".to_string()], &[]), "No rows returned.");
    }
}
