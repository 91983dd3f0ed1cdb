//! Vector output with the standard Helvetica fonts, so nothing is embedded.

use kurbo::{Affine, BezPath, Cap, Join, PathEl, Point, Stroke};
use pdf_writer::{
  Content, Finish, Name, Pdf, Rect, Ref, Str,
  types::{LineCapStyle, LineJoinStyle},
};
use peniko::Brush;
use tracing::warn;

use super::{CANVAS_HEIGHT, CANVAS_WIDTH, Command, Render, Text, Weight, metrics};

const REGULAR: Name = Name(b"F1");
const BOLD: Name = Name(b"F2");
const WIN_ANSI: Name = Name(b"WinAnsiEncoding");

pub(crate) fn write(render: &Render) -> Vec<u8> {
  let catalog_id = Ref::new(1);
  let page_tree_id = Ref::new(2);
  let page_id = Ref::new(3);
  let content_id = Ref::new(4);
  let regular_id = Ref::new(5);
  let bold_id = Ref::new(6);

  let mut pdf = Pdf::new();
  pdf.catalog(catalog_id).pages(page_tree_id);
  pdf.pages(page_tree_id).kids([page_id]).count(1);

  let mut page = pdf.page(page_id);
  page.media_box(Rect::new(0.0, 0.0, CANVAS_WIDTH as f32, CANVAS_HEIGHT as f32));
  page.parent(page_tree_id);
  page.contents(content_id);
  page.resources().fonts().pair(REGULAR, regular_id).pair(BOLD, bold_id);
  page.finish();

  pdf.type1_font(regular_id).base_font(Name(b"Helvetica")).encoding_predefined(WIN_ANSI);
  pdf.type1_font(bold_id).base_font(Name(b"Helvetica-Bold")).encoding_predefined(WIN_ANSI);

  // PDF user space has y pointing up.
  let page = Affine::new([1.0, 0.0, 0.0, -1.0, 0.0, CANVAS_HEIGHT]);

  let mut content = Content::new();
  for command in render.commands() {
    match command {
      Command::Fill { path, brush } => {
        let [r, g, b] = rgb(brush);
        content.set_fill_rgb(r, g, b);
        draw_path(&mut content, path, page);
        content.fill_nonzero();
      }
      Command::Stroke { path, brush, stroke } => {
        content.save_state();
        let [r, g, b] = rgb(brush);
        content.set_stroke_rgb(r, g, b);
        set_stroke(&mut content, stroke);
        draw_path(&mut content, path, page);
        content.stroke();
        content.restore_state();
      }
      Command::Text(text) => draw_text(&mut content, text, page),
    }
  }

  pdf.stream(content_id, &content.finish());
  pdf.finish()
}

fn rgb(brush: &Brush) -> [f32; 3] {
  match brush {
    Brush::Solid(color) => {
      let [r, g, b, _] = color.components;
      [r, g, b]
    }
    _ => {
      warn!("gradients are not supported in PDF output, using black");
      [0.0, 0.0, 0.0]
    }
  }
}

fn set_stroke(content: &mut Content, stroke: &Stroke) {
  content.set_line_width(stroke.width as f32);
  content.set_line_cap(match stroke.start_cap {
    Cap::Butt => LineCapStyle::ButtCap,
    Cap::Round => LineCapStyle::RoundCap,
    Cap::Square => LineCapStyle::ProjectingSquareCap,
  });
  content.set_line_join(match stroke.join {
    Join::Bevel => LineJoinStyle::BevelJoin,
    Join::Miter => LineJoinStyle::MiterJoin,
    Join::Round => LineJoinStyle::RoundJoin,
  });
  if !stroke.dash_pattern.is_empty() {
    content.set_dash_pattern(stroke.dash_pattern.iter().map(|d| *d as f32), stroke.dash_offset as f32);
  }
}

fn draw_path(content: &mut Content, path: &BezPath, transform: Affine) {
  let mut current = Point::ORIGIN;
  for el in path.elements() {
    match *el {
      PathEl::MoveTo(p) => {
        let p = transform * p;
        content.move_to(p.x as f32, p.y as f32);
        current = p;
      }
      PathEl::LineTo(p) => {
        let p = transform * p;
        content.line_to(p.x as f32, p.y as f32);
        current = p;
      }
      PathEl::QuadTo(p1, p2) => {
        let (p1, p2) = (transform * p1, transform * p2);
        let c1 = current + (p1 - current) * (2.0 / 3.0);
        let c2 = p2 + (p1 - p2) * (2.0 / 3.0);
        content.cubic_to(c1.x as f32, c1.y as f32, c2.x as f32, c2.y as f32, p2.x as f32, p2.y as f32);
        current = p2;
      }
      PathEl::CurveTo(p1, p2, p3) => {
        let (p1, p2, p3) = (transform * p1, transform * p2, transform * p3);
        content.cubic_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32, p3.x as f32, p3.y as f32);
        current = p3;
      }
      PathEl::ClosePath => {
        content.close_path();
      }
    }
  }
}

fn draw_text(content: &mut Content, text: &Text, page: Affine) {
  let width = metrics::text_width(&text.text, text.size, text.weight);
  let height = metrics::line_height(text.size);
  let baseline =
    text.box_transform(width, height) * Affine::translate((0.0, metrics::ASCENT * text.size));
  // Glyphs are drawn y-up, so undo the page flip for them.
  let matrix = page * baseline * Affine::FLIP_Y;

  let [r, g, b] = rgb(&text.brush);
  content.set_fill_rgb(r, g, b);
  content.begin_text();
  content.set_font(
    match text.weight {
      Weight::Normal => REGULAR,
      Weight::Bold => BOLD,
    },
    text.size as f32,
  );
  content.set_text_matrix(matrix.as_coeffs().map(|c| c as f32));
  content.show(Str(&encode(&text.text)));
  content.end_text();
}

/// WinAnsi bytes of `text`. Characters outside the encoding are replaced.
fn encode(text: &str) -> Vec<u8> {
  let mut missing = vec![];
  let bytes = text
    .chars()
    .map(|c| {
      metrics::win_ansi(c).unwrap_or_else(|| {
        missing.push(c);
        metrics::REPLACEMENT
      })
    })
    .collect();

  if !missing.is_empty() {
    warn!("{missing:?} in {text:?} cannot be drawn with the standard PDF fonts");
  }
  bytes
}
