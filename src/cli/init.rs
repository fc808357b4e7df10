//! Init command implementation

use colored::Colorize;
use dialoguer::{Input, Password, theme::ColorfulTheme};

use crate::cli::GlobalOptions;
use crate::config::Config;
use crate::error::{Error, Result};

/// Write the config file, prompting for anything not given as a flag.
///
/// Existing preferences are kept.
pub fn run(
    opts: &GlobalOptions,
    access_token: Option<String>,
    property: Option<String>,
) -> Result<()> {
    let mut config = Config::load_or_default(opts.config_ref())?;

    println!("{}", "Welcome to ga4cache!".bold().green());

    let access_token = match access_token {
        Some(token) => token,
        None => Password::with_theme(&ColorfulTheme::default())
            .with_prompt("GA4 Data API access token")
            .interact()
            .map_err(|e| Error::Other(e.to_string()))?,
    };

    let property = match property {
        Some(p) => p,
        None => Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Default property ID (blank for none)")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| Error::Other(e.to_string()))?,
    };

    config.access_token = Some(access_token.trim().to_string());
    config.validate_auth()?;
    let property = property.trim();
    if !property.is_empty() {
        config.default_property = Some(property.to_string());
    }

    config.save_at(opts.config_ref())?;

    let path = Config::resolve_path(opts.config_ref())?;
    println!("{} Configuration saved to {}", "✓".green(), path.display());
    Ok(())
}
