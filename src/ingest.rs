use std::io::Cursor;
use std::path::Path;

use polars::prelude::*;
use tracing::{debug, warn};

use crate::error::{Malformed, PrepError, Result};

/// Read a delimited event log with all columns as String dtype.
///
/// Header names and order are kept verbatim; a repeated name is a parse error.
/// Any structural problem aborts the whole read; there is no partial table.
pub fn read_event_log(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PrepError::NotFound(path.to_path_buf()));
    }

    let bytes = std::fs::read(path).map_err(|err| unreadable(path, err))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(PrepError::MalformedInput(Malformed::Empty));
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(classify_read_error)?;

    if df.width() == 0 {
        return Err(PrepError::MalformedInput(Malformed::Empty));
    }
    reject_duplicate_headers(&df)?;

    debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "read event log"
    );
    Ok(df)
}

/// Fail with `MissingColumn` naming the first absent column, in the given order.
pub fn require_columns(df: &DataFrame, required: &[&str]) -> Result<()> {
    let schema = df.schema();
    for &col_name in required {
        if !schema.contains(col_name) {
            return Err(PrepError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}

/// An existing file that cannot be opened is reported as not found.
fn unreadable(path: &Path, err: std::io::Error) -> PrepError {
    warn!(path = %path.display(), error = %err, "event log is not readable");
    PrepError::NotFound(path.to_path_buf())
}

// The CSV reader renames a repeated header `x` to `x_duplicated_<n>`.
fn reject_duplicate_headers(df: &DataFrame) -> Result<()> {
    let schema = df.schema();
    for name in df.get_column_names_str() {
        let Some((base, n)) = name.rsplit_once("_duplicated_") else {
            continue;
        };
        if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) && schema.contains(base) {
            return Err(PrepError::MalformedInput(Malformed::Parse(format!(
                "duplicate column name '{base}'"
            ))));
        }
    }
    Ok(())
}

fn classify_read_error(err: PolarsError) -> PrepError {
    match err {
        PolarsError::NoData(_) => PrepError::MalformedInput(Malformed::Empty),
        other => PrepError::MalformedInput(Malformed::Parse(other.to_string())),
    }
}
