use std::{fs, path::Path};

use anyhow::{Context, Result};
use portal_shared::config::PortalConfig;

/// Render the resolved configuration as `format` (yaml, json, or toml),
/// printing it or writing it to `output`.
///
/// # Errors
/// Returns an error if the format is unsupported or if writing the file fails.
pub fn generate_config(config: &PortalConfig, format: &str, output: Option<&Path>) -> Result<()> {
    let serialized = config
        .to_format(format)
        .context("failed to render configuration")?;

    match output {
        Some(path) => {
            fs::write(path, serialized.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Configuration file '{}' generated successfully.", path.display());
        }
        None => println!("{}", serialized.trim_end()),
    }
    Ok(())
}
