use anyhow::{Context, Result};
use log::info;
use serde_json::json;

use crate::{apply::resolve_profile, cli::PreviewArgs, engine, io_utils, rows, table};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let catalog = crate::load_catalog(args.rules.as_deref())?;

    let (_, mut source_rows) = rows::read_rows(&args.input, delimiter, encoding)?;
    if let Some(limit) = args.limit {
        source_rows.truncate(limit);
    }

    let profile = resolve_profile(args.profile.as_deref(), &source_rows)?;
    let previews = engine::apply_rules_preview(&source_rows, &profile, &catalog)
        .context("Previewing correction rules")?;

    let changed_rows = previews
        .iter()
        .filter(|preview| !preview.changes.is_empty())
        .count();
    let total_changes: usize = previews.iter().map(|preview| preview.changes.len()).sum();

    if args.json {
        let records: Vec<serde_json::Value> = previews
            .iter()
            .enumerate()
            .flat_map(|(idx, preview)| {
                preview.changes.iter().map(move |change| {
                    json!({
                        "row": idx + 1,
                        "column": &change.column,
                        "old": &change.old,
                        "new": &change.new,
                    })
                })
            })
            .collect();
        let stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(stdout, &records).context("Writing JSON preview")?;
        println!();
    } else {
        let headers = vec![
            "row".to_string(),
            "column".to_string(),
            "old".to_string(),
            "new".to_string(),
        ];
        let table_rows: Vec<Vec<String>> = previews
            .iter()
            .enumerate()
            .flat_map(|(idx, preview)| {
                preview.changes.iter().map(move |change| {
                    vec![
                        (idx + 1).to_string(),
                        change.column.clone(),
                        change.old.as_display(),
                        change.new.as_display(),
                    ]
                })
            })
            .collect();
        table::print_table(&headers, &table_rows);
    }

    info!(
        "{} change(s) across {} of {} row(s) using profile '{}'",
        total_changes,
        changed_rows,
        previews.len(),
        profile.name
    );
    Ok(())
}
