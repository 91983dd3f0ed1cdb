use kurbo::{Affine, BezPath, Point, Stroke};
use peniko::Brush;
use polars::prelude::*;
use tracing::warn;

use crate::{Marker, bounds::DataRange, render::Render, theme};

pub struct LineAxes<'a> {
  x:                  &'a Column,
  y:                  &'a Column,
  pub(crate) options: LineOptions,
}

pub struct LineOptions {
  pub width:  f64,
  pub color:  Brush,
  pub style:  LineStyle,
  pub marker: Option<MarkerOptions>,
  pub label:  Option<String>,
}

pub struct MarkerOptions {
  pub marker: Marker,
  /// Diameter in points.
  pub size:   f64,
  /// Defaults to the line color.
  pub color:  Option<Brush>,
}

/// Dash patterns are in multiples of the line width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineStyle {
  #[default]
  Solid,
  Dashed,
  DashDot,
  Dotted,
  /// Markers only.
  None,
}

impl Default for LineOptions {
  fn default() -> Self {
    LineOptions {
      width:  1.5,
      color:  Brush::Solid(theme::BLUE),
      style:  LineStyle::Solid,
      marker: None,
      label:  None,
    }
  }
}

impl LineStyle {
  fn dashes(&self) -> Option<&'static [f64]> {
    match self {
      LineStyle::Solid | LineStyle::None => None,
      LineStyle::Dashed => Some(&[3.7, 1.6]),
      LineStyle::DashDot => Some(&[6.4, 1.6, 1.0, 1.6]),
      LineStyle::Dotted => Some(&[1.0, 1.65]),
    }
  }

  pub(crate) fn stroke(&self, width: f64) -> Stroke {
    let stroke = Stroke::new(width);
    match self.dashes() {
      Some(dashes) => stroke.with_dashes(0.0, dashes.iter().map(|d| d * width)),
      None => stroke,
    }
  }
}

impl<'a> LineAxes<'a> {
  pub(crate) fn new(x: &'a Column, y: &'a Column) -> Self {
    if x.len() != y.len() {
      warn!("x has {} values but y has {}, extra values are ignored", x.len(), y.len());
    }
    LineAxes { x, y, options: LineOptions::default() }
  }

  pub fn color(&mut self, color: impl Into<Brush>) -> &mut Self {
    self.options.color = color.into();
    self
  }

  pub fn width(&mut self, width: f64) -> &mut Self {
    self.options.width = width;
    self
  }

  pub fn style(&mut self, style: LineStyle) -> &mut Self {
    self.options.style = style;
    self
  }

  pub fn marker(&mut self, marker: Marker) -> &mut Self {
    self.options.marker = Some(MarkerOptions { marker, size: 6.0, color: None });
    self
  }

  pub fn marker_size(&mut self, size: f64) -> &mut Self {
    if let Some(marker) = &mut self.options.marker {
      marker.size = size;
    }
    self
  }

  /// Names the series in the legend. Empty labels, and labels starting with
  /// `_`, are left out of it.
  pub fn label(&mut self, label: &str) -> &mut Self {
    self.options.label = Some(label.to_string());
    self
  }

  pub(crate) fn data_ranges(&self) -> PolarsResult<(DataRange, DataRange)> {
    Ok((DataRange::from_column(self.x)?, DataRange::from_column(self.y)?))
  }

  pub(crate) fn marker_brush(&self) -> Option<(&MarkerOptions, &Brush)> {
    let marker = self.options.marker.as_ref()?;
    Some((marker, marker.color.as_ref().unwrap_or(&self.options.color)))
  }

  /// Canvas positions of every row, `None` where either coordinate is missing.
  fn points(
    &self,
    transform: Affine,
    x_range: &DataRange,
    y_range: &DataRange,
  ) -> PolarsResult<Vec<Option<Point>>> {
    let xs = x_range.positions(self.x)?;
    let ys = y_range.positions(self.y)?;

    Ok(xs.into_iter().zip(ys).map(|(x, y)| Some(transform * Point::new(x?, y?))).collect())
  }

  pub(crate) fn draw(
    &self,
    render: &mut Render,
    transform: Affine,
    x_range: &DataRange,
    y_range: &DataRange,
  ) -> PolarsResult<()> {
    let points = self.points(transform, x_range, y_range)?;

    if self.options.style != LineStyle::None {
      let mut shape = BezPath::new();
      let mut pen_down = false;
      for point in &points {
        match point {
          Some(p) if pen_down => shape.line_to(*p),
          Some(p) => {
            shape.move_to(*p);
            pen_down = true;
          }
          None => pen_down = false,
        }
      }

      if !shape.elements().is_empty() {
        let stroke = self.options.style.stroke(self.options.width);
        render.stroke(&shape, Affine::IDENTITY, &self.options.color, &stroke);
      }
    }

    if let Some((marker, brush)) = self.marker_brush() {
      let path = marker.marker.to_path(0.1 / marker.size);
      for point in points.into_iter().flatten() {
        render.fill(&path, Affine::translate(point.to_vec2()) * Affine::scale(marker.size), brush);
      }
    }

    Ok(())
  }
}
