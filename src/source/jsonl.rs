use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value;

use super::{Row, RowSource};
use crate::error::{Result, SieveError};

/// Rows read from newline-delimited JSON objects.
///
/// Scalars become their plain text form, `null` becomes an empty string
/// and arrays are joined with commas, which is the multi-value syntax.
pub struct JsonLinesSource<R> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            SieveError::Source(format!("cannot open {}: {}", path.display(), e))
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

impl<R: BufRead> RowSource for JsonLinesSource<R> {
    fn next_row(&mut self) -> Result<Option<Row>> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }

            let value: Value = serde_json::from_str(line)?;
            let Value::Object(map) = value else {
                return Err(SieveError::Source(format!(
                    "line {}: expected a JSON object",
                    self.line_no
                )));
            };

            let mut row = Row::new();
            for (name, value) in &map {
                row.push(name.as_str(), value_text(value));
            }
            return Ok(Some(row));
        }
    }
}
