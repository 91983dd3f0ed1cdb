use kurbo::Affine;
use parley::{Alignment, FontWeight, PositionedLayoutItem, StyleProperty};
use peniko::{Brush, Fill};
use vello::Scene;

use super::{Command, Render, Text, Weight};

/// Replays a [`Render`] into a vello scene, laying text out with parley.
pub(crate) struct SceneBuilder {
  font:   parley::FontContext,
  layout: parley::LayoutContext<Brush>,
}

impl SceneBuilder {
  pub fn new() -> Self {
    SceneBuilder { font: parley::FontContext::new(), layout: parley::LayoutContext::new() }
  }

  pub fn build(&mut self, render: &Render, transform: Affine) -> Scene {
    let mut scene = Scene::new();

    for command in render.commands() {
      match command {
        Command::Fill { path, brush } => scene.fill(Fill::NonZero, transform, brush, None, path),
        Command::Stroke { path, brush, stroke } => {
          scene.stroke(stroke, transform, brush, None, path)
        }
        Command::Text(text) => self.draw_text(&mut scene, text, transform),
      }
    }

    scene
  }

  fn draw_text(&mut self, scene: &mut Scene, text: &Text, transform: Affine) {
    let mut builder = self.layout.ranged_builder(&mut self.font, &text.text, 1.0, true);

    builder.push_default(StyleProperty::FontSize(text.size as f32));
    builder.push_default(StyleProperty::Brush(text.brush.clone()));
    builder.push_default(StyleProperty::FontWeight(match text.weight {
      Weight::Normal => FontWeight::NORMAL,
      Weight::Bold => FontWeight::BOLD,
    }));

    let mut layout = builder.build(&text.text);
    layout.break_all_lines(None);
    layout.align(None, Alignment::Start, Default::default());

    let placement = transform
      * text.box_transform(f64::from(layout.width()), f64::from(layout.height()));

    for line in layout.lines() {
      for item in line.items() {
        let PositionedLayoutItem::GlyphRun(glyph_run) = item else { continue };

        let run = glyph_run.run();
        let mut x = glyph_run.offset();
        let baseline = glyph_run.baseline();

        scene
          .draw_glyphs(run.font())
          .brush(&glyph_run.style().brush)
          .hint(false)
          .transform(placement)
          .glyph_transform(
            run.synthesis().skew().map(|angle| Affine::skew(angle.to_radians().tan() as f64, 0.0)),
          )
          .font_size(run.font_size())
          .normalized_coords(run.normalized_coords())
          .draw(
            Fill::NonZero,
            glyph_run.glyphs().map(|glyph| {
              let gx = x + glyph.x;
              let gy = baseline + glyph.y;
              x += glyph.advance;
              vello::Glyph { id: glyph.id.into(), x: gx, y: gy }
            }),
          );
      }
    }
  }
}
