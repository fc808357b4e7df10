//! Output formatting for CLI results

use colored::Colorize;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::query::QueryResult;

pub mod formatters;
pub mod json;
pub mod table;

/// Trait for types that can be formatted for output
pub trait Formattable {
    /// Format the data according to the specified format
    fn format(&self, format: OutputFormat) -> Result<String>;
}

/// Format and print data to stdout
pub fn print<T: Formattable>(data: &T, format: OutputFormat) -> Result<()> {
    let output = data.format(format)?;
    println!("{}", output);
    Ok(())
}

impl Formattable for QueryResult {
    fn format(&self, format: OutputFormat) -> Result<String> {
        let columns = self.column_names();
        match format {
            OutputFormat::Json => Ok(json::format_json(self)?),
            OutputFormat::Table => Ok(table::format_report(&columns, &self.rows)),
            OutputFormat::Pretty => {
                let source = if self.from_cache {
                    "cache".green()
                } else {
                    "api".yellow()
                };
                let mut out = format!(
                    "{} property {} · {} of {} rows · {} ms · {}\n",
                    "Report".bold(),
                    self.property_id,
                    self.rows.len(),
                    self.row_count,
                    self.execution_time_ms,
                    source,
                );
                out.push_str(&format!(
                    "{} {} → {}\n\n",
                    "Dates".bold(),
                    self.query.start_date,
                    self.query.end_date
                ));
                out.push_str(&table::format_report(&columns, &self.rows));
                if !self.totals.is_empty() {
                    out.push_str(&format!("\n\n{}\n", "Totals".bold()));
                    out.push_str(&table::format_report(&columns, &self.totals));
                }
                out.push_str(&format!("\n{} {}", "Hash".dimmed(), self.query_hash.dimmed()));
                Ok(out)
            }
        }
    }
}
