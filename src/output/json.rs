//! JSON output formatting
//!
//! Every JSON document printed by the CLI is wrapped as
//! `{"data": ..., "meta": {"tool", "version", "generated_at"}}`.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Envelope around JSON output
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub data: T,
    pub meta: Meta,
}

/// Provenance of a JSON document
#[derive(Debug, Serialize)]
pub struct Meta {
    pub tool: &'static str,
    pub version: &'static str,
    pub generated_at: DateTime<Utc>,
}

impl<T> JsonOutput<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: Meta {
                tool: env!("CARGO_PKG_NAME"),
                version: env!("CARGO_PKG_VERSION"),
                generated_at: Utc::now(),
            },
        }
    }
}

/// Serialize `data` inside the envelope, pretty-printed
pub fn format_json<T: Serialize + ?Sized>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonOutput::new(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Clone)]
    struct TestItem {
        name: String,
        row_count: i64,
    }

    #[test]
    fn test_json_output_new() {
        let output = JsonOutput::new(vec!["a", "b"]);

        assert_eq!(output.data, vec!["a", "b"]);
        assert_eq!(output.meta.tool, "ga4cache");
        assert_eq!(output.meta.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_format_json_wraps_data() {
        let items = vec![TestItem {
            name: "weekly".to_string(),
            row_count: 3,
        }];

        let result = format_json(&items).unwrap();

        assert!(result.contains("\"data\""));
        assert!(result.contains("\"meta\""));
        assert!(result.contains("\"name\": \"weekly\""));
        assert!(result.contains("\"row_count\": 3"));
        assert!(result.contains("\"generated_at\""));
    }

    #[test]
    fn test_format_json_empty_vec() {
        let items: Vec<TestItem> = vec![];
        let result = format_json(&items).unwrap();

        assert!(result.contains("\"data\": []"));
    }
}
