use std::f64::consts::FRAC_PI_2;

use kurbo::{Affine, Line, Point, Rect, Stroke};
use peniko::Brush;
use tracing::debug;

use crate::render::{DrawText, Render, metrics};

mod axes;
mod bounds;
mod error;
pub mod figure;
pub mod ingest;
mod legend;
mod marker;
mod render;
pub mod theme;

pub use axes::{Axes, LineAxes, LineOptions, LineStyle, MarkerOptions};
pub use bounds::{Bounds, DataRange, NiceTicksIter, Range};
pub use error::{Error, Result, ResultExt};
pub use ingest::{Dataset, read_csv};
pub use marker::Marker;
pub use render::{Align, CANVAS_HEIGHT, CANVAS_WIDTH, DPI, Weight};

const TITLE_SIZE: f64 = 12.0;
const LABEL_SIZE: f64 = 10.0;
const TICK_SIZE: f64 = 10.0;
const TICK_LENGTH: f64 = 3.5;
const TICK_PAD: f64 = 3.5;
const LABEL_PAD: f64 = 4.0;
const TITLE_PAD: f64 = 6.0;
const TICK_COUNT: u32 = 10;
const LINE_WIDTH: f64 = 0.8;

/// Plot area edges as fractions of the canvas, measured from the bottom left.
const LEFT: f64 = 0.125;
const RIGHT: f64 = 0.9;
const BOTTOM: f64 = 0.13;
const TOP: f64 = 0.88;

#[derive(Default)]
pub struct Plot<'a> {
  title:        Option<String>,
  title_size:   Option<f64>,
  title_weight: Weight,
  pub x:        Axis,
  pub y:        Axis,
  grid:         bool,
  legend:       bool,

  axes: Vec<Axes<'a>>,
}

#[derive(Default)]
pub struct Axis {
  title:         Option<String>,
  min:           Option<f64>,
  max:           Option<f64>,
  tick_rotation: f64,
}

impl<'a> Plot<'a> {
  pub fn new() -> Plot<'a> { Plot::default() }

  pub fn title(&mut self, title: &str) -> &mut Self {
    self.title = Some(title.to_string());
    self
  }

  /// Font size of the title, in points.
  pub fn title_size(&mut self, size: f64) -> &mut Self {
    self.title_size = Some(size);
    self
  }

  pub fn title_weight(&mut self, weight: Weight) -> &mut Self {
    self.title_weight = weight;
    self
  }

  /// Draws grid lines at every tick of both axes.
  pub fn grid(&mut self, grid: bool) -> &mut Self {
    self.grid = grid;
    self
  }

  pub fn legend(&mut self, legend: bool) -> &mut Self {
    self.legend = legend;
    self
  }
}

impl Axis {
  pub fn title(&mut self, title: &str) -> &mut Self {
    self.title = Some(title.to_string());
    self
  }

  pub fn min(&mut self, min: f64) -> &mut Self {
    self.min = Some(min);
    self
  }

  pub fn max(&mut self, max: f64) -> &mut Self {
    self.max = Some(max);
    self
  }

  /// Rotates tick labels counterclockwise, in degrees.
  pub fn tick_rotation(&mut self, degrees: f64) -> &mut Self {
    self.tick_rotation = degrees;
    self
  }

  fn limits(&self, data: &DataRange) -> Range {
    let auto = data.limits();
    Range::new(self.min.unwrap_or(auto.min), self.max.unwrap_or(auto.max))
  }

  /// Size of a tick label's rotated bounding box, across and along the axis.
  fn tick_label_box(&self, label: &str) -> (f64, f64) {
    let width = metrics::text_width(label, TICK_SIZE, Weight::Normal);
    let height = metrics::line_height(TICK_SIZE);
    let (sin, cos) = self.tick_rotation.to_radians().sin_cos();
    (width * sin.abs() + height * cos.abs(), width * cos.abs() + height * sin.abs())
  }
}

impl Plot<'_> {
  fn data_ranges(&self) -> Result<(DataRange, DataRange)> {
    let mut ranges: Option<(DataRange, DataRange)> = None;
    for ax in &self.axes {
      let (x, y) = match ax {
        Axes::Line(line) => line.data_ranges()?,
      };
      ranges = Some(match ranges {
        Some((rx, ry)) => (rx.union(x), ry.union(y)),
        None => (x, y),
      });
    }
    Ok(ranges.unwrap_or((DataRange::Continuous(None), DataRange::Continuous(None))))
  }

  pub(crate) fn draw(&self, render: &mut Render) -> Result<()> {
    let text_brush = Brush::Solid(theme::TEXT);
    let frame_brush = Brush::Solid(theme::FRAME);
    let thin = Stroke::new(LINE_WIDTH);

    render.fill(
      &Rect::new(0.0, 0.0, CANVAS_WIDTH, CANVAS_HEIGHT),
      Affine::IDENTITY,
      &Brush::Solid(theme::BACKGROUND),
    );

    let viewport = Bounds::new(
      Range::new(CANVAS_WIDTH * LEFT, CANVAS_WIDTH * RIGHT),
      Range::new(CANVAS_HEIGHT * (1.0 - BOTTOM), CANVAS_HEIGHT * (1.0 - TOP)),
    );

    let (x_range, y_range) = self.data_ranges()?;
    let data_bounds = Bounds::new(self.x.limits(&x_range), self.y.limits(&y_range));
    debug!("x limits {:?}, y limits {:?}", data_bounds.x, data_bounds.y);

    let transform = data_bounds.transform_to(viewport);

    let x_ticks: Vec<(f64, String)> = x_range
      .ticks(data_bounds.x, TICK_COUNT)
      .into_iter()
      .map(|(v, label)| ((transform * Point::new(v, 0.0)).x, label))
      .collect();
    let y_ticks: Vec<(f64, String)> = y_range
      .ticks(data_bounds.y, TICK_COUNT)
      .into_iter()
      .map(|(v, label)| ((transform * Point::new(0.0, v)).y, label))
      .collect();

    if self.grid {
      let grid_brush = Brush::Solid(theme::GRID);
      for (vx, _) in &x_ticks {
        render.stroke(
          &Line::new((*vx, viewport.y.min), (*vx, viewport.y.max)),
          Affine::IDENTITY,
          &grid_brush,
          &thin,
        );
      }
      for (vy, _) in &y_ticks {
        render.stroke(
          &Line::new((viewport.x.min, *vy), (viewport.x.max, *vy)),
          Affine::IDENTITY,
          &grid_brush,
          &thin,
        );
      }
    }

    for ax in &self.axes {
      match ax {
        Axes::Line(line) => line.draw(render, transform, &x_range, &y_range)?,
      }
    }

    render.stroke(
      &Rect::new(viewport.x.min, viewport.y.max, viewport.x.max, viewport.y.min),
      Affine::IDENTITY,
      &frame_brush,
      &thin,
    );

    let bottom = viewport.y.min;
    let mut x_extent = 0.0_f64;
    for (vx, label) in &x_ticks {
      render.stroke(
        &Line::new((*vx, bottom), (*vx, bottom + TICK_LENGTH)),
        Affine::IDENTITY,
        &frame_brush,
        &thin,
      );

      let (across, _) = self.x.tick_label_box(label);
      x_extent = x_extent.max(across);
      render.draw_text(DrawText {
        text: label,
        size: TICK_SIZE,
        brush: text_brush.clone(),
        position: Point::new(*vx, bottom + TICK_LENGTH + TICK_PAD + across / 2.0),
        transform: Affine::rotate(-self.x.tick_rotation.to_radians()),
        horizontal_align: Align::Center,
        vertical_align: Align::Center,
        ..Default::default()
      });
    }

    let left = viewport.x.min;
    let mut y_extent = 0.0_f64;
    for (vy, label) in &y_ticks {
      render.stroke(
        &Line::new((left, *vy), (left - TICK_LENGTH, *vy)),
        Affine::IDENTITY,
        &frame_brush,
        &thin,
      );

      let (_, along) = self.y.tick_label_box(label);
      y_extent = y_extent.max(along);
      render.draw_text(DrawText {
        text: label,
        size: TICK_SIZE,
        brush: text_brush.clone(),
        position: Point::new(left - TICK_LENGTH - TICK_PAD - along / 2.0, *vy),
        transform: Affine::rotate(-self.y.tick_rotation.to_radians()),
        horizontal_align: Align::Center,
        vertical_align: Align::Center,
        ..Default::default()
      });
    }

    if let Some(x_label) = &self.x.title {
      render.draw_text(DrawText {
        text: x_label,
        size: LABEL_SIZE,
        brush: text_brush.clone(),
        position: Point::new(
          viewport.x.lerp(0.5),
          bottom + TICK_LENGTH + TICK_PAD + x_extent + LABEL_PAD,
        ),
        horizontal_align: Align::Center,
        vertical_align: Align::Start,
        ..Default::default()
      });
    }

    if let Some(y_label) = &self.y.title {
      render.draw_text(DrawText {
        text: y_label,
        size: LABEL_SIZE,
        brush: text_brush.clone(),
        position: Point::new(
          left - TICK_LENGTH - TICK_PAD - y_extent - LABEL_PAD,
          viewport.y.lerp(0.5),
        ),
        transform: Affine::rotate(-FRAC_PI_2),
        horizontal_align: Align::Center,
        vertical_align: Align::End,
        ..Default::default()
      });
    }

    if let Some(title) = &self.title {
      render.draw_text(DrawText {
        text: title,
        size: self.title_size.unwrap_or(TITLE_SIZE),
        weight: self.title_weight,
        brush: text_brush,
        position: Point::new(viewport.x.lerp(0.5), viewport.y.max - TITLE_PAD),
        horizontal_align: Align::Center,
        vertical_align: Align::End,
        ..Default::default()
      });
    }

    if self.legend {
      self.draw_legend(render, viewport);
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use polars::prelude::*;

  use super::*;
  use crate::render::{Command, Text};

  fn texts(render: &Render) -> Vec<&Text> {
    render
      .commands()
      .iter()
      .filter_map(|c| match c {
        Command::Text(text) => Some(text),
        _ => None,
      })
      .collect()
  }

  #[test]
  fn draws_titles_and_ticks() {
    let x = Column::new("x".into(), vec!["1", "2", "3"]);
    let y = Column::new("y".into(), vec![0.5, 1.5, 1.0]);

    let mut plot = Plot::new();
    plot.title("Title").title_size(20.0);
    plot.x.title("X");
    plot.y.title("Y");
    plot.line(&x, &y);

    let render = plot.render().unwrap();
    let texts = texts(&render);

    let title = texts.iter().find(|t| t.text == "Title").unwrap();
    assert_eq!(title.size, 20.0);
    assert_eq!(title.weight, Weight::Normal);
    assert!(texts.iter().any(|t| t.text == "X"));
    assert!(texts.iter().any(|t| t.text == "Y"));
    for category in ["1", "2", "3"] {
      assert!(texts.iter().any(|t| t.text == category), "missing tick {category}");
    }
    assert!(texts.iter().any(|t| t.text == "1.0"));
  }

  #[test]
  fn bold_titles() {
    let mut plot = Plot::new();
    plot.title("Bold").title_weight(Weight::Bold);

    let render = plot.render().unwrap();
    let title = texts(&render).into_iter().find(|t| t.text == "Bold").unwrap();
    assert_eq!(title.weight, Weight::Bold);
  }

  #[test]
  fn one_marker_per_point() {
    let x = Column::new("x".into(), vec!["a", "b", "c"]);
    let y = Column::new("y".into(), vec![1.0, 2.0, 3.0]);

    let mut plot = Plot::new();
    plot.line(&x, &y).style(LineStyle::Dashed).marker(Marker::Circle);

    let render = plot.render().unwrap();
    let fills = render.commands().iter().filter(|c| matches!(c, Command::Fill { .. })).count();
    // The background, then one per marker.
    assert_eq!(fills, 4);

    let dashed = render.commands().iter().any(|c| match c {
      Command::Stroke { stroke, .. } => !stroke.dash_pattern.is_empty(),
      _ => false,
    });
    assert!(dashed);
  }

  #[test]
  fn points_land_inside_the_plot_area() {
    let x = Column::new("x".into(), vec![0.0, 10.0]);
    let y = Column::new("y".into(), vec![0.0, 1.0]);

    let mut plot = Plot::new();
    plot.line(&x, &y).marker(Marker::Square);

    let render = plot.render().unwrap();
    for command in &render.commands()[1..] {
      if let Command::Fill { path, .. } = command {
        let center = kurbo::Shape::bounding_box(path).center();
        assert!(center.x > CANVAS_WIDTH * LEFT && center.x < CANVAS_WIDTH * RIGHT);
        assert!(center.y > CANVAS_HEIGHT * (1.0 - TOP) && center.y < CANVAS_HEIGHT * (1.0 - BOTTOM));
      }
    }
  }

  #[test]
  fn axis_limits_can_be_fixed() {
    let x = Column::new("x".into(), vec![1.0, 2.0]);
    let y = Column::new("y".into(), vec![1.0, 2.0]);

    let mut plot = Plot::new();
    plot.y.min(0.0).max(10.0);
    plot.line(&x, &y);

    let render = plot.render().unwrap();
    let texts = texts(&render);
    assert!(texts.iter().any(|t| t.text == "0"));
    assert!(texts.iter().any(|t| t.text == "10"));
  }

  #[test]
  fn empty_plot_still_draws() {
    let mut plot = Plot::new();
    plot.title("Nothing").grid(true).legend(true);

    let render = plot.render().unwrap();
    assert!(texts(&render).iter().any(|t| t.text == "Nothing"));
  }

  #[test]
  fn labeled_series_get_a_legend() {
    let x = Column::new("x".into(), vec![1.0, 2.0]);
    let y = Column::new("y".into(), vec![1.0, 2.0]);

    let mut plot = Plot::new();
    plot.legend(true);
    plot.line(&x, &y).label("delay");
    plot.line(&x, &y).label("");
    plot.line(&x, &y).label("_hidden");

    assert_eq!(plot.legend_items().len(), 1);
    let render = plot.render().unwrap();
    assert!(texts(&render).iter().any(|t| t.text == "delay"));
  }

  #[test]
  fn rotated_tick_labels_are_pushed_clear_of_the_axis() {
    let mut plot = Plot::new();
    plot.x.tick_rotation(25.0);

    let (across, _) = plot.x.tick_label_box("100");
    let (flat, _) = Axis::default().tick_label_box("100");
    assert!(across > flat);
  }
}
