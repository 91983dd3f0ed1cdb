use std::path::PathBuf;

use polars::error::PolarsError;
use thiserror::Error;
use tracing::warn;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong between reading the CSV and writing the figure.
#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to access {}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("malformed CSV: {0}")]
  Csv(#[from] csv::Error),

  /// A row without a label and a value column.
  #[error("line {line}: expected at least 3 fields, found {fields}")]
  ShortRow { line: u64, fields: usize },

  #[error("line {line}: `{value}` is not a number")]
  InvalidNumber { line: u64, value: String },

  #[error("{labels} labels but {values} values")]
  LengthMismatch { labels: usize, values: usize },

  #[error(transparent)]
  Polars(#[from] PolarsError),

  #[error("cannot infer an output format from {}", .0.display())]
  UnsupportedFormat(PathBuf),

  #[error("failed to encode image: {0}")]
  Image(#[from] image::ImageError),

  #[error("GPU rendering failed: {0}")]
  Gpu(String),

  #[error("cannot open a window: {0}")]
  Window(String),
}

impl Error {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Error::Io { path: path.into(), source }
  }

  pub(crate) fn gpu(err: impl std::fmt::Display) -> Self { Error::Gpu(err.to_string()) }

  pub(crate) fn window(err: impl std::fmt::Display) -> Self { Error::Window(err.to_string()) }
}

pub trait ResultExt<T> {
  /// Logs the error and discards it.
  fn log_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
  fn log_err(self) -> Option<T> {
    match self {
      Ok(v) => Some(v),
      Err(e) => {
        warn!("{e}");
        None
      }
    }
  }
}
