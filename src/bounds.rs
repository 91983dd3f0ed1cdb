use std::collections::HashSet;

use kurbo::Affine;
use polars::prelude::*;
use tracing::warn;

/// Fraction of the data range added on each side of an axis.
const MARGIN: f64 = 0.05;

/// Slack for float noise when snapping tick steps.
const EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
  pub x: Range,
  pub y: Range,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Range {
  pub min: f64,
  pub max: f64,
}

/// The values one axis has to show.
#[derive(Clone, Debug, PartialEq)]
pub enum DataRange {
  /// Finite extent of numeric data, `None` when there is none.
  Continuous(Option<Range>),
  /// Distinct strings in first-seen order. Each one sits at its index.
  Categorical(Vec<String>),
}

impl Bounds {
  pub const fn new(x: Range, y: Range) -> Self { Bounds { x, y } }

  pub(crate) fn transform_to(&self, viewport: Bounds) -> Affine {
    let scale_x = viewport.x.size() / self.x.size();
    let scale_y = viewport.y.size() / self.y.size();
    let translate_x = viewport.x.min - self.x.min * scale_x;
    let translate_y = viewport.y.min - self.y.min * scale_y;

    Affine::new([scale_x, 0.0, 0.0, scale_y, translate_x, translate_y])
  }
}

impl Range {
  pub const fn new(min: f64, max: f64) -> Self { Range { min, max } }
  pub const fn size(&self) -> f64 { self.max - self.min }

  pub const fn expand(self, amount: f64) -> Self {
    Range {
      min: self.min - amount * self.size().signum(),
      max: self.max + amount * self.size().signum(),
    }
  }
  pub const fn expand_by(self, fract: f64) -> Self { self.expand(self.size() * fract) }

  /// Linear interpolation, `0.0` is `min` and `1.0` is `max`.
  pub const fn lerp(&self, t: f64) -> f64 { self.min + self.size() * t }

  pub const fn contains(&self, value: &f64) -> bool {
    (*value >= self.min && *value <= self.max) || (*value <= self.min && *value >= self.max)
  }

  pub fn include(&self, value: f64) -> Range {
    Range { min: self.min.min(value), max: self.max.max(value) }
  }

  pub fn union(&self, other: Range) -> Range {
    Range { min: self.min.min(other.min), max: self.max.max(other.max) }
  }

  /// Widens a zero-sized range so it can be mapped onto a viewport.
  pub fn nonsingular(self) -> Range {
    if self.size() != 0.0 {
      return self;
    }
    let pad = if self.min == 0.0 { 1.0 } else { self.min.abs() * MARGIN };
    Range { min: self.min - pad, max: self.max + pad }
  }

  pub fn nice_ticks(&self, count: u32) -> NiceTicksIter {
    let step = (self.max - self.min) / f64::from(count);
    if !(step.is_finite() && step > 0.0) {
      return NiceTicksIter::new(self.min, self.min, 1.0, 0);
    }

    let k = (step.log10() + EPSILON).floor();
    let base = step / 10f64.powf(k);

    let nice_base = match base {
      b if b <= 1.0 + EPSILON => 1.0,
      b if b <= 2.0 + EPSILON => 2.0,
      b if b <= 2.5 + EPSILON => 2.5,
      b if b <= 5.0 + EPSILON => 5.0,
      _ => 10.0,
    };

    let step = nice_base * 10f64.powf(k);
    let lo = (self.min / step).floor() * step;
    let hi = (self.max / step).ceil() * step;

    let mut decimals = -(k as i32);
    if nice_base == 10.0 {
      decimals -= 1;
    } else if nice_base == 2.5 {
      decimals += 1;
    }
    let decimals = decimals.max(0) as usize;
    NiceTicksIter::new(lo, hi, step, decimals)
  }
}

impl DataRange {
  pub(crate) fn from_column(column: &Column) -> PolarsResult<DataRange> {
    if column.dtype() == &DataType::String {
      let mut seen = HashSet::new();
      let categories = column
        .str()?
        .into_iter()
        .flatten()
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect();
      return Ok(DataRange::Categorical(categories));
    }

    let values = column.cast(&DataType::Float64)?;
    let range = values
      .f64()?
      .into_iter()
      .flatten()
      .filter(|v| v.is_finite())
      .fold(None, |acc: Option<Range>, v| Some(acc.map_or(Range::new(v, v), |r| r.include(v))));
    Ok(DataRange::Continuous(range))
  }

  pub fn union(self, other: DataRange) -> DataRange {
    match (self, other) {
      (DataRange::Continuous(a), DataRange::Continuous(b)) => DataRange::Continuous(match (a, b) {
        (Some(a), Some(b)) => Some(a.union(b)),
        (a, b) => a.or(b),
      }),
      (DataRange::Categorical(mut a), DataRange::Categorical(b)) => {
        for category in b {
          if !a.contains(&category) {
            a.push(category);
          }
        }
        DataRange::Categorical(a)
      }
      (a, _) => {
        warn!("cannot share an axis between categorical and numeric data, keeping the first");
        a
      }
    }
  }

  /// The visible range: the data extent plus margins.
  pub fn limits(&self) -> Range {
    let range = match self {
      DataRange::Continuous(Some(range)) => *range,
      DataRange::Categorical(categories) if !categories.is_empty() => {
        Range::new(0.0, (categories.len() - 1) as f64)
      }
      _ => return Range::new(0.0, 1.0),
    };
    range.nonsingular().expand_by(MARGIN)
  }

  /// Axis positions of every row of `column`. Missing values are `None`.
  pub(crate) fn positions(&self, column: &Column) -> PolarsResult<Vec<Option<f64>>> {
    match self {
      DataRange::Continuous(_) => {
        let values = column.cast(&DataType::Float64)?;
        Ok(values.f64()?.into_iter().map(|v| v.filter(|v| !v.is_nan())).collect())
      }
      DataRange::Categorical(categories) => {
        let values = column.cast(&DataType::String)?;
        Ok(
          values
            .str()?
            .into_iter()
            .map(|v| v.and_then(|v| categories.iter().position(|c| c == v)).map(|i| i as f64))
            .collect(),
        )
      }
    }
  }

  /// Tick positions and their labels within `limits`.
  pub fn ticks(&self, limits: Range, count: u32) -> Vec<(f64, String)> {
    match self {
      DataRange::Categorical(categories) => {
        categories.iter().enumerate().map(|(i, c)| (i as f64, c.clone())).collect()
      }
      DataRange::Continuous(_) => {
        let iter = limits.nice_ticks(count);
        let decimals = iter.decimals();
        iter
          .filter(|v| limits.contains(v))
          .map(|v| (v, format!("{:.*}", decimals, if v == 0.0 { 0.0 } else { v })))
          .collect()
      }
    }
  }
}

pub struct NiceTicksIter {
  lo:       f64,
  step:     f64,
  index:    usize,
  count:    usize,
  last:     Option<f64>,
  decimals: usize,
}

impl NiceTicksIter {
  fn new(lo: f64, hi: f64, step: f64, decimals: usize) -> Self {
    // Counted up front: at large magnitudes `step` can vanish next to `lo`.
    let count = ((hi - lo) / step).round() as usize + 1;
    NiceTicksIter { lo, step, index: 0, count, last: None, decimals }
  }

  /// Digits after the decimal point needed to tell the ticks apart.
  pub fn decimals(&self) -> usize { self.decimals }
}

impl Iterator for NiceTicksIter {
  type Item = f64;
  fn next(&mut self) -> Option<Self::Item> {
    while self.index < self.count {
      let value = self.lo + self.step * self.index as f64;
      self.index += 1;

      let p = 10f64.powi(self.decimals as i32 + 3);
      let rounded = (value * p).round() / p;
      let value = if rounded.is_finite() { rounded } else { value };

      // Neighbors that round to the same float are one tick.
      if self.last == Some(value) {
        continue;
      }
      self.last = Some(value);
      return Some(value);
    }
    None
  }
}
