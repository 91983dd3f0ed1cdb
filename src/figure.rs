//! The delay figure for the wireless high-rate static scenario.

use crate::{Dataset, LineStyle, Marker, Plot, theme};

/// Simulation results, read from the working directory.
pub const INPUT: &str = "taskA_1.csv";
/// Where the figure is written, replacing any previous run.
pub const OUTPUT: &str = "All_Graph.pdf";

/// Drawn above the plot area at 20 points.
pub const TITLE: &str = "Wireless high-rate (static)";
/// Label of the x axis, which holds the first CSV field.
pub const X_TITLE: &str = "Packets per second";
/// Label of the y axis, which holds the third CSV field.
pub const Y_TITLE: &str = "End-to-end Delay (s)";

/// Plots delay against the label column: a dashed green line with circle
/// markers, x tick labels tilted by 25 degrees, and a grid.
pub fn delay_plot(data: &Dataset) -> Plot<'_> {
  let mut plot = Plot::new();
  plot.title(TITLE).title_size(20.0).grid(true).legend(true);
  plot.x.title(X_TITLE).tick_rotation(25.0);
  plot.y.title(Y_TITLE);

  plot
    .line(data.labels(), data.values())
    .color(theme::GREEN)
    .style(LineStyle::Dashed)
    .marker(Marker::Circle)
    .label("");

  plot
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::render::Command;

  fn sample() -> Dataset {
    Dataset::new(
      vec!["100".into(), "200".into(), "300".into(), "400".into()],
      vec![0.012, 0.015, 0.031, 0.094],
    )
    .unwrap()
  }

  /// Centers of the series' markers, in drawing order.
  fn marker_centers(render: &crate::render::Render) -> Vec<kurbo::Point> {
    let green = peniko::Brush::Solid(theme::GREEN);
    render
      .commands()
      .iter()
      .filter_map(|c| match c {
        Command::Fill { path, brush } if *brush == green => {
          Some(kurbo::Shape::bounding_box(path).center())
        }
        _ => None,
      })
      .collect()
  }

  #[test]
  fn figure_has_every_text() {
    let data = sample();
    let render = delay_plot(&data).render().unwrap();

    let texts: Vec<_> = render
      .commands()
      .iter()
      .filter_map(|c| match c {
        Command::Text(text) => Some(text),
        _ => None,
      })
      .collect();

    let title = texts.iter().find(|t| t.text == TITLE).unwrap();
    assert_eq!(title.size, 20.0);
    assert!(texts.iter().any(|t| t.text == X_TITLE));
    assert!(texts.iter().any(|t| t.text == Y_TITLE));

    let tick = texts.iter().find(|t| t.text == "300").unwrap();
    assert_ne!(tick.transform, kurbo::Affine::IDENTITY);

    // The only series has an empty label, so no legend entry is drawn.
    assert!(!texts.iter().any(|t| t.text.is_empty()));
  }

  #[test]
  fn figure_has_a_marker_per_row() {
    let data = sample();
    let render = delay_plot(&data).render().unwrap();

    let green = peniko::Brush::Solid(theme::GREEN);
    let markers = render
      .commands()
      .iter()
      .filter(|c| matches!(c, Command::Fill { brush, .. } if *brush == green))
      .count();
    assert_eq!(markers, data.len());
  }

  #[test]
  fn pdf_is_a_single_page() {
    let data = sample();
    let pdf = delay_plot(&data).to_pdf().unwrap();

    assert!(pdf.starts_with(b"%PDF-"));
    let text = String::from_utf8_lossy(&pdf);
    assert_eq!(text.matches("/MediaBox").count(), 1);
    assert!(text.contains("/Count 1"));
  }

  #[test]
  fn single_row_is_drawn_inside_the_canvas() {
    let data = Dataset::from_reader("100,95.2,0.05\n".as_bytes()).unwrap();
    let plot = delay_plot(&data);

    let centers = marker_centers(&plot.render().unwrap());
    assert_eq!(centers.len(), 1);
    let center = centers[0];
    assert!(center.x.is_finite() && center.y.is_finite());
    assert!(center.x > 0.0 && center.x < crate::CANVAS_WIDTH);
    assert!(center.y > 0.0 && center.y < crate::CANVAS_HEIGHT);

    assert!(plot.to_pdf().unwrap().starts_with(b"%PDF-"));
  }

  #[test]
  fn all_nan_values_draw_an_empty_series() {
    let data = Dataset::from_reader("100,_,nan\n200,_,NaN\n".as_bytes()).unwrap();
    let plot = delay_plot(&data);
    let render = plot.render().unwrap();

    assert!(marker_centers(&render).is_empty());
    let green = peniko::Brush::Solid(theme::GREEN);
    assert!(!render.commands().iter().any(|c| matches!(c, Command::Stroke { brush, .. } if *brush == green)));
    assert!(plot.to_pdf().unwrap().starts_with(b"%PDF-"));
  }

  #[test]
  fn duplicate_labels_share_a_position() {
    let data = Dataset::new(
      vec!["10".into(), "20".into(), "10".into()],
      vec![1.0, 2.0, 3.0],
    )
    .unwrap();
    let render = delay_plot(&data).render().unwrap();

    let centers = marker_centers(&render);
    assert_eq!(centers.len(), 3);
    assert!((centers[0].x - centers[2].x).abs() < 1e-9);
    assert!(centers[1].x > centers[0].x);
    // The line goes back to the first position, above where it started.
    assert!(centers[2].y < centers[0].y);

    let ticks = render
      .commands()
      .iter()
      .filter(|c| matches!(c, Command::Text(text) if text.text == "10"))
      .count();
    assert_eq!(ticks, 1);
  }

  #[test]
  fn huge_close_values_still_render() {
    let data =
      Dataset::from_reader("1,_,10000000000000000\n2,_,10000000000000002\n".as_bytes()).unwrap();
    let plot = delay_plot(&data);

    assert_eq!(marker_centers(&plot.render().unwrap()).len(), 2);
    assert!(plot.to_pdf().unwrap().starts_with(b"%PDF-"));
  }

  #[test]
  fn save_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(OUTPUT);
    std::fs::write(&path, vec![b'x'; 1 << 20]).unwrap();

    let data = sample();
    delay_plot(&data).save(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    assert!(bytes.len() < 1 << 20);
  }

  #[test]
  fn unknown_extensions_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("All_Graph.svg");

    let data = sample();
    let err = delay_plot(&data).save(&path).unwrap_err();
    assert!(matches!(err, crate::Error::UnsupportedFormat(_)));
    assert!(!path.exists());
  }
}
