//! Reading simulation results from CSV.
//!
//! The simulation appends one row per run, `nSinks,throughput,delay,pdr,drop`,
//! without a header. Only the first field (used as a category label) and the
//! third field (the value being plotted) are read.

use std::{fs::File, io, path::Path};

use polars::prelude::*;
use tracing::debug;

use crate::{Error, Result};

const LABEL_FIELD: usize = 0;
const VALUE_FIELD: usize = 2;

/// Two index-aligned columns: `labels` (strings) and `values` (`f64`).
#[derive(Debug)]
pub struct Dataset {
  labels: Column,
  values: Column,
}

/// Reads the CSV file at `path`.
pub fn read_csv(path: impl AsRef<Path>) -> Result<Dataset> {
  let path = path.as_ref();
  let file = File::open(path).map_err(|e| Error::io(path, e))?;
  let data = Dataset::from_reader(file)?;
  debug!("read {} rows from {}", data.len(), path.display());
  Ok(data)
}

impl Dataset {
  /// Parses every row of `reader`, stopping at the first malformed one. A
  /// blank line is a row without fields.
  pub fn from_reader(mut reader: impl io::Read) -> Result<Dataset> {
    let mut input = vec![];
    reader.read_to_end(&mut input).map_err(csv::Error::from)?;

    let mut records =
      csv::ReaderBuilder::new().has_headers(false).flexible(true).from_reader(input.as_slice());
    let mut lines = LineCounter::new(&input);

    let mut labels = vec![];
    let mut values = vec![];
    let mut record = csv::StringRecord::new();
    let mut end = 0;
    while records.read_record(&mut record)? {
      // The csv reader skips blank lines, so find them between records.
      let (start, blank) = skip_line_breaks(&input, end);
      let line = lines.at(start);
      if blank > 0 {
        return Err(Error::ShortRow { line: line - blank, fields: 0 });
      }
      end = records.position().byte() as usize;

      let (Some(label), Some(value)) = (record.get(LABEL_FIELD), record.get(VALUE_FIELD)) else {
        return Err(Error::ShortRow { line, fields: record.len() });
      };

      let value = value
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::InvalidNumber { line, value: value.to_string() })?;

      labels.push(label.to_string());
      values.push(value);
    }

    let (start, blank) = skip_line_breaks(&input, end);
    if blank > 0 {
      return Err(Error::ShortRow { line: lines.at(start) - blank, fields: 0 });
    }

    Dataset::new(labels, values)
  }

  pub fn new(labels: Vec<String>, values: Vec<f64>) -> Result<Dataset> {
    if labels.len() != values.len() {
      return Err(Error::LengthMismatch { labels: labels.len(), values: values.len() });
    }
    Ok(Dataset {
      labels: Column::new("labels".into(), labels),
      values: Column::new("values".into(), values),
    })
  }

  pub fn labels(&self) -> &Column { &self.labels }
  pub fn values(&self) -> &Column { &self.values }

  pub fn len(&self) -> usize { self.labels.len() }
  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Skips the line breaks starting at `offset`, returning where the next row
/// starts and how many empty lines were passed. `\r\n`, `\r` and `\n` each
/// end one line.
fn skip_line_breaks(input: &[u8], mut offset: usize) -> (usize, u64) {
  let mut blank = 0;
  let mut after_cr = offset > 0 && input[offset - 1] == b'\r';
  while let Some(&byte) = input.get(offset) {
    match byte {
      b'\n' if after_cr => after_cr = false,
      b'\n' => blank += 1,
      b'\r' => {
        blank += 1;
        after_cr = true;
      }
      _ => break,
    }
    offset += 1;
  }
  (offset, blank)
}

/// Physical line numbers of byte offsets, counted forward from the last query.
struct LineCounter<'a> {
  input:  &'a [u8],
  offset: usize,
  line:   u64,
}

impl<'a> LineCounter<'a> {
  fn new(input: &'a [u8]) -> Self { LineCounter { input, offset: 0, line: 1 } }

  /// The 1-based line `offset` is on. Offsets must not decrease.
  fn at(&mut self, offset: usize) -> u64 {
    for i in self.offset..offset {
      let byte = self.input[i];
      if byte == b'\n' || (byte == b'\r' && self.input.get(i + 1) != Some(&b'\n')) {
        self.line += 1;
      }
    }
    self.offset = self.offset.max(offset);
    self.line
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn labels(data: &Dataset) -> Vec<String> {
    data.labels().str().unwrap().into_no_null_iter().map(str::to_string).collect()
  }

  fn values(data: &Dataset) -> Vec<f64> {
    data.values().f64().unwrap().into_no_null_iter().collect()
  }

  #[test]
  fn reads_first_and_third_fields() {
    let data = Dataset::from_reader("1,x,0.5\n2,y,1.5\n".as_bytes()).unwrap();

    assert_eq!(labels(&data), ["1", "2"]);
    assert_eq!(values(&data), [0.5, 1.5]);
  }

  #[test]
  fn columns_stay_aligned() {
    let csv = "10,4.1,0.012,98,2\n20,8.3,0.015,97,3\n10,4.0,0.011,99,1\n40,15.9,0.2,80,20\n";
    let data = Dataset::from_reader(csv.as_bytes()).unwrap();

    assert_eq!(data.len(), 4);
    assert_eq!(data.labels().len(), data.values().len());
    assert_eq!(labels(&data), ["10", "20", "10", "40"]);
    assert_eq!(values(&data), [0.012, 0.015, 0.011, 0.2]);
  }

  #[test]
  fn labels_are_kept_verbatim() {
    let data = Dataset::from_reader("007 ,_, 2.5 \n".as_bytes()).unwrap();

    assert_eq!(labels(&data), ["007 "]);
    assert_eq!(values(&data), [2.5]);
  }

  #[test]
  fn first_row_is_not_a_header() {
    let data = Dataset::from_reader("a,b,3\n".as_bytes()).unwrap();
    assert_eq!(labels(&data), ["a"]);
  }

  #[test]
  fn empty_input_is_empty() {
    let data = Dataset::from_reader("".as_bytes()).unwrap();
    assert!(data.is_empty());
  }

  #[test]
  fn non_numeric_value_fails() {
    let err = Dataset::from_reader("1,_,0.5\n2,_,fast\n".as_bytes()).unwrap_err();
    match err {
      Error::InvalidNumber { line, value } => {
        assert_eq!(line, 2);
        assert_eq!(value, "fast");
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn short_row_fails() {
    let err = Dataset::from_reader("1,_,0.5\n2,3\n".as_bytes()).unwrap_err();
    assert!(matches!(err, Error::ShortRow { line: 2, fields: 2 }), "unexpected error: {err}");
  }

  #[test]
  fn blank_line_fails() {
    let err = Dataset::from_reader("1,_,0.5\n\n2,_,1.5\n".as_bytes()).unwrap_err();
    assert!(matches!(err, Error::ShortRow { line: 2, fields: 0 }), "unexpected error: {err}");

    let err = Dataset::from_reader("1,_,0.5\n2,_,1.5\n\n".as_bytes()).unwrap_err();
    assert!(matches!(err, Error::ShortRow { line: 3, fields: 0 }), "unexpected error: {err}");

    let err = Dataset::from_reader("\n1,_,0.5\n".as_bytes()).unwrap_err();
    assert!(matches!(err, Error::ShortRow { line: 1, fields: 0 }), "unexpected error: {err}");
  }

  #[test]
  fn crlf_rows_are_not_blank_lines() {
    let data = Dataset::from_reader("1,_,0.5\r\n2,_,1.5\r\n".as_bytes()).unwrap();
    assert_eq!(values(&data), [0.5, 1.5]);

    let err = Dataset::from_reader("1,_,0.5\r\n2,_,x\r\n".as_bytes()).unwrap_err();
    assert!(matches!(err, Error::InvalidNumber { line: 2, .. }), "unexpected error: {err}");

    let err = Dataset::from_reader("1,_,0.5\r\n\r\n2,_,1.5\r\n".as_bytes()).unwrap_err();
    assert!(matches!(err, Error::ShortRow { line: 2, fields: 0 }), "unexpected error: {err}");
  }

  #[test]
  fn quoted_line_breaks_count_towards_line_numbers() {
    let err = Dataset::from_reader("\"a\nb\",_,0.5\n2,_,x\n".as_bytes()).unwrap_err();
    assert!(matches!(err, Error::InvalidNumber { line: 3, .. }), "unexpected error: {err}");
  }

  #[test]
  fn mismatched_columns_are_rejected() {
    let err = Dataset::new(vec!["a".into()], vec![]).unwrap_err();
    assert!(matches!(err, Error::LengthMismatch { labels: 1, values: 0 }), "unexpected error: {err}");
  }

  #[test]
  fn missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_csv(dir.path().join("taskA_1.csv")).unwrap_err();
    assert!(matches!(err, Error::Io { .. }), "unexpected error: {err}");
  }

  #[test]
  fn reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskA_1.csv");
    std::fs::write(&path, "5,1,0.25\n").unwrap();

    let data = read_csv(&path).unwrap();
    assert_eq!(values(&data), [0.25]);
  }
}
