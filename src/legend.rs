use kurbo::{Affine, BezPath, Line, Point, Rect, RoundedRect, Stroke};
use peniko::Brush;
use tracing::warn;

use crate::{
  Axes, Bounds, Plot,
  render::{Align, DrawText, Render, metrics},
  theme,
};

pub(crate) struct LegendItem {
  label:  String,
  line:   Option<(Brush, Stroke)>,
  marker: Option<(BezPath, f64, Brush)>,
}

impl Plot<'_> {
  pub(crate) fn legend_items(&self) -> Vec<LegendItem> {
    let mut items = vec![];
    for ax in &self.axes {
      match ax {
        Axes::Line(line) => {
          let Some(label) = &line.options.label else { continue };
          if label.is_empty() || label.starts_with('_') {
            continue;
          }

          items.push(LegendItem {
            label:  label.clone(),
            line:   (line.options.style != crate::LineStyle::None).then(|| {
              (line.options.color.clone(), line.options.style.stroke(line.options.width))
            }),
            marker: line
              .marker_brush()
              .map(|(m, brush)| (m.marker.to_path(0.1 / m.size), m.size, brush.clone())),
          });
        }
      }
    }
    items
  }

  pub(crate) fn draw_legend(&self, render: &mut Render, viewport: Bounds) {
    let items = self.legend_items();
    if items.is_empty() {
      warn!("no labeled series to put in legend");
      return;
    }

    const MARGIN: f64 = 7.0;
    const PADDING: f64 = 4.0;
    const FONT_SIZE: f64 = 10.0;
    const LINE_HEIGHT: f64 = 14.0;
    const MARKER_WIDTH: f64 = 28.0;

    let inner_width = items
      .iter()
      .map(|item| metrics::text_width(&item.label, FONT_SIZE, Default::default()))
      .fold(0.0_f64, f64::max)
      + MARKER_WIDTH;
    let inner_height = items.len() as f64 * LINE_HEIGHT;

    // Upper right corner. The viewport's y range runs bottom to top.
    let rect = Rect::new(
      viewport.x.max - inner_width - MARGIN - PADDING * 2.0,
      viewport.y.max + MARGIN,
      viewport.x.max - MARGIN,
      viewport.y.max + MARGIN + inner_height + PADDING * 2.0,
    );
    let background = RoundedRect::from_rect(rect, 3.0);
    render.fill(
      &background,
      Affine::IDENTITY,
      &Brush::Solid(theme::BACKGROUND.with_alpha(0.8)),
    );
    render.stroke(
      &background,
      Affine::IDENTITY,
      &Brush::Solid(theme::LEGEND_FRAME),
      &Stroke::new(1.0),
    );

    for (i, item) in items.iter().enumerate() {
      let y = rect.y0 + PADDING + (i as f64 + 0.5) * LINE_HEIGHT;
      let start = Point::new(rect.x0 + PADDING, y);
      let end = Point::new(rect.x0 + PADDING + MARKER_WIDTH - 8.0, y);

      if let Some((brush, stroke)) = &item.line {
        render.stroke(&Line::new(start, end), Affine::IDENTITY, brush, stroke);
      }
      if let Some((path, size, brush)) = &item.marker {
        let center = start.midpoint(end);
        render.fill(path, Affine::translate(center.to_vec2()) * Affine::scale(*size), brush);
      }

      render.draw_text(DrawText {
        text: &item.label,
        size: FONT_SIZE,
        brush: Brush::Solid(theme::TEXT),
        position: Point::new(rect.x0 + PADDING + MARKER_WIDTH, y),
        horizontal_align: Align::Start,
        vertical_align: Align::Center,
        ..Default::default()
      });
    }
  }
}
