//! Check command implementation.
//!
//! Runs the pre-flight gates (size limits, import policy, entry shape)
//! without bundling.

use crate::cli::CheckArgs;
use crate::commands::utils;
use crate::config;
use crate::error::Result;
use crate::ui;
use fob_preview::PreviewBuilder;

/// Pre-flight never starts the engine, so this runs without the runtime.
pub fn execute(args: CheckArgs) -> Result<()> {
    let config = config::load(&args.payload)?;
    let payload = utils::read_payload(&args.payload.payload)?;
    let entry = config::resolve_entry(args.payload.entry.as_deref(), payload.entry_path(), &config)
        .to_string();

    let report = PreviewBuilder::new(config).preflight(payload.files(), Some(&entry))?;

    ui::success(&format!(
        "{}: {} files pass the import policy",
        report.entry, report.modules
    ));
    ui::success(&format!("Entry exports component {}", report.export.name));
    Ok(())
}
