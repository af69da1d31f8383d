use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{cli::ApplyArgs, data::Row, engine, io_utils, profile::Profile, rows};

pub fn execute(args: &ApplyArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let input_encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let output_delimiter = io_utils::resolve_output_delimiter(
        args.output.as_deref(),
        args.output_delimiter,
        delimiter,
    );
    let output_encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
    let catalog = crate::load_catalog(args.rules.as_deref())?;

    info!(
        "Correcting '{}' -> {} (delimiter '{}')",
        args.input.display(),
        args.output
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdout".into()),
        crate::printable_delimiter(delimiter)
    );

    let (headers, mut source_rows) = rows::read_rows(&args.input, delimiter, input_encoding)?;
    if let Some(limit) = args.limit {
        source_rows.truncate(limit);
    }

    let profile = resolve_profile(args.profile.as_deref(), &source_rows)?;
    if !profile.has_rules() {
        debug!(
            "Profile '{}' binds no rules; output will match input",
            profile.name
        );
    }

    let corrected = engine::apply_rules_to_rows(&source_rows, &profile, &catalog)
        .context("Applying correction rules")?;

    rows::write_rows(
        args.output.as_deref(),
        output_delimiter,
        output_encoding,
        &headers,
        &corrected,
    )?;
    info!(
        "Corrected {} row(s) across {} column(s) using profile '{}'",
        corrected.len(),
        headers.len(),
        profile.name
    );
    Ok(())
}

pub(crate) fn resolve_profile(path: Option<&Path>, source_rows: &[Row]) -> Result<Profile> {
    match path {
        Some(path) => Profile::load(path),
        None => Ok(Profile::from_rows(source_rows, None)),
    }
}
