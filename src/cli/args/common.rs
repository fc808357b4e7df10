//! Common CLI types shared across commands

use clap::ValueEnum;
use log::warn;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty format - summary header plus the report table
    Pretty,
    /// Table format - report rows only (global default)
    #[default]
    Table,
    /// JSON format - full result envelope for scripts
    Json,
}

impl OutputFormat {
    /// Parse a format name from the config file, ignoring unknown values
    pub fn from_config(value: Option<&str>) -> Option<Self> {
        let value = value?;
        match Self::from_str(value, true) {
            Ok(format) => Some(format),
            Err(_) => {
                warn!("Ignoring unknown output format in config: {}", value);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        assert_eq!(OutputFormat::from_config(Some("json")), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_config(Some("PRETTY")), Some(OutputFormat::Pretty));
        assert_eq!(OutputFormat::from_config(Some("xml")), None);
        assert_eq!(OutputFormat::from_config(None), None);
    }
}
