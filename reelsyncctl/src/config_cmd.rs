use std::io::Write;

use anyhow::Context;
use reelsync_config::ConfigLoad;
use serde_json::json;

/// Print the effective configuration, where it came from and any warnings.
pub fn print_check<W: Write>(load: &ConfigLoad, as_json: bool, out: &mut W) -> anyhow::Result<()> {
    if as_json {
        let warnings: Vec<_> = load
            .warnings
            .iter()
            .map(|warning| json!({ "message": warning.message, "hint": warning.hint }))
            .collect();
        let report = json!({
            "source": load.source.to_string(),
            "env_file_loaded": load.env_file_loaded,
            "overrides": load.overrides,
            "warnings": warnings,
            "config": load.config,
        });
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "# source: {}", load.source)?;
    if load.env_file_loaded {
        writeln!(out, "# .env file loaded")?;
    }
    for key in &load.overrides {
        writeln!(out, "# overridden by {key}")?;
    }
    let rendered =
        toml::to_string_pretty(&load.config).context("failed to render configuration")?;
    write!(out, "{rendered}")?;

    for warning in load.warnings.iter() {
        match &warning.hint {
            Some(hint) => writeln!(out, "warning: {} (hint: {hint})", warning.message)?,
            None => writeln!(out, "warning: {}", warning.message)?,
        }
    }
    writeln!(out, "configuration ok")?;
    Ok(())
}
