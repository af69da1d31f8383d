use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use itertools::Itertools;
use log::{info, warn};

use crate::{
    cli::ProfileArgs,
    data::{Row, Value},
    io_utils,
    profile::Profile,
    table,
    transform::string_ops,
};

pub fn execute(args: &ProfileArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let catalog = crate::load_catalog(args.rules.as_deref())?;

    let mut profile = if args.profile.exists() {
        Profile::load(&args.profile)?
    } else {
        let seed_rows = read_seed_rows(args, delimiter, encoding)?;
        if seed_rows.is_empty() {
            warn!(
                "'{}' has no data rows; the generated profile will have no columns",
                args.input.display()
            );
        }
        let generated = default_name(&args.input);
        Profile::from_rows(&seed_rows, args.name.as_deref().or(generated.as_deref()))
    };

    for spec in &args.add_rules {
        let (column, rule_id) = parse_binding(spec)?;
        if catalog.find(rule_id).is_none() {
            warn!("Rule {rule_id} is not in the active catalog; the binding will be skipped when applied");
        }
        if profile.column(&column).is_none() {
            warn!("Column '{column}' is not in the profile; --add-rule '{spec}' has no effect");
        }
        profile.add_rule(&column, rule_id);
    }
    for spec in &args.remove_rules {
        let (column, rule_id) = parse_binding(spec)?;
        profile.remove_rule(&column, rule_id);
    }

    profile.save(&args.profile)?;

    let headers = vec![
        "column".to_string(),
        "type".to_string(),
        "rules".to_string(),
    ];
    let summary: Vec<Vec<String>> = profile
        .columns
        .iter()
        .map(|column| {
            let pipeline = column
                .rules
                .iter()
                .sorted_by_key(|binding| binding.order)
                .map(|binding| binding.rule_id.to_string())
                .join(", ");
            vec![
                column.key.clone(),
                format!("{:?}", column.column_type).to_ascii_lowercase(),
                pipeline,
            ]
        })
        .collect();
    table::print_table(&headers, &summary);

    info!(
        "Profile '{}' with {} column(s) written to {:?}",
        profile.name,
        profile.columns.len(),
        args.profile
    );
    Ok(())
}

/// Reads the header row plus the first data row: enough for
/// `Profile::from_rows` without scanning the whole file.
fn read_seed_rows(
    args: &ProfileArgs,
    delimiter: u8,
    encoding: &'static encoding_rs::Encoding,
) -> Result<Vec<Row>> {
    let mut reader = io_utils::open_csv_reader_from_path(&args.input, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)?;
    let mut rows = Vec::new();
    if let Some(record) = reader.byte_records().next() {
        let record = record.context("Reading first data row")?;
        let fields = io_utils::decode_record(&record, encoding)?;
        let row: Row = headers
            .iter()
            .cloned()
            .zip(fields.iter().map(|field| Value::from_field(field)))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn default_name(input: &Path) -> Option<String> {
    input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| {
            format!(
                "{}_{}",
                string_ops::snake_case(stem),
                Local::now().format("%Y%m%d")
            )
        })
}

fn parse_binding(spec: &str) -> Result<(String, u32)> {
    let mut parts = spec.splitn(2, '=');
    let column = parts
        .next()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("Rule binding is missing a column"))?;
    let raw_id = parts
        .next()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("Rule binding '{column}' is missing a rule id"))?;
    let rule_id: u32 = raw_id
        .parse()
        .with_context(|| format!("Parsing rule id '{raw_id}'"))?;
    Ok((column.to_string(), rule_id))
}
