mod line;

pub use line::{LineAxes, LineOptions, LineStyle, MarkerOptions};

use crate::Plot;
use polars::prelude::*;

pub enum Axes<'a> {
  Line(LineAxes<'a>),
}

impl<'a> Plot<'a> {
  pub fn line(&mut self, x: &'a Column, y: &'a Column) -> &mut LineAxes<'a> {
    self.axes.push(Axes::Line(LineAxes::new(x, y)));
    match self.axes.last_mut() {
      Some(Axes::Line(la)) => la,
      _ => unreachable!(),
    }
  }
}
