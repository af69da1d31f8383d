//! Loading a CSV into row records and writing corrected rows back out.
//!
//! The reader keys every cell by its header, so the first row's key
//! enumeration order is header order. Fields arrive as text (empty fields
//! become `Value::Empty`); typing is left to correction rules.

use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::Encoding;

use crate::{
    data::{Row, Value},
    io_utils,
};

pub fn read_rows(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<(Vec<String>, Vec<Row>)> {
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)?;
    let mut rows = Vec::new();
    for (idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", idx + 2))?;
        let fields = io_utils::decode_record(&record, encoding)?;
        let row: Row = headers
            .iter()
            .cloned()
            .zip(fields.iter().map(|field| Value::from_field(field)))
            .collect();
        rows.push(row);
    }
    Ok((headers, rows))
}

/// Writes rows in header order; cells the engine added for columns outside
/// the header set are not part of the output shape.
pub fn write_rows(
    path: Option<&Path>,
    delimiter: u8,
    encoding: &'static Encoding,
    headers: &[String],
    rows: &[Row],
) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(path, delimiter)?;
    let header_record =
        io_utils::encode_record(headers.iter().map(String::as_str), encoding)?;
    writer
        .write_byte_record(&header_record)
        .context("Writing output headers")?;

    for (idx, row) in rows.iter().enumerate() {
        let fields: Vec<String> = headers
            .iter()
            .map(|header| row.get(header).map(Value::as_display).unwrap_or_default())
            .collect();
        let record = io_utils::encode_record(fields.iter().map(String::as_str), encoding)?;
        writer
            .write_byte_record(&record)
            .with_context(|| format!("Writing output row {}", idx + 2))?;
    }
    writer.flush().context("Flushing output")?;
    Ok(())
}
