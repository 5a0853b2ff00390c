//! Build command implementation.

use crate::cli::BuildArgs;
use crate::commands::utils;
use crate::config;
use crate::error::Result;
use crate::ui;
use fob_preview::{PreviewBuilder, RolldownEngine};
use std::time::Instant;

/// Execute the build command.
///
/// 1. Load configuration and the payload
/// 2. Run the preview pipeline with the Rolldown engine
/// 3. Write the document (and optionally the bundle)
///
/// With `--error-document`, a failed build still writes a document showing
/// the error, then returns the error so the process exits non-zero.
pub async fn execute(args: BuildArgs) -> Result<()> {
    let config = config::load(&args.payload)?;
    let payload = utils::read_payload(&args.payload.payload)?;
    let entry =
        config::resolve_entry(args.payload.entry.as_deref(), payload.entry_path(), &config)
            .to_string();

    let builder = PreviewBuilder::new(config);
    let start = Instant::now();
    let spinner = ui::Spinner::new(&format!("Bundling {}", entry));
    let result = builder
        .build(payload.files(), Some(&entry), &RolldownEngine::new())
        .await;
    spinner.finish();

    let build = match result {
        Ok(build) => build,
        Err(err) => {
            if args.error_document {
                let document = builder.assembler().error_document(&err.to_string());
                utils::write_output(args.out.as_deref(), document.as_str())?;
                ui::warning("Wrote error document");
            }
            return Err(err.into());
        }
    };

    utils::write_output(args.out.as_deref(), build.document.as_str())?;
    if let Some(path) = &args.bundle_out {
        utils::write_output(Some(path), &build.bundle.code)?;
        tracing::debug!(path = %path.display(), "Wrote bundle");
    }

    ui::success(&format!(
        "Built {} ({} modules, {} document) in {:.0?}",
        build.component,
        build.modules,
        ui::format_size(build.document.len()),
        start.elapsed()
    ));
    if let Some(path) = &args.out {
        ui::info(&format!("Wrote {}", path.display()));
    }

    Ok(())
}
