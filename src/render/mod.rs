use std::path::Path;

use kurbo::{Affine, BezPath, Point, Shape, Stroke, Vec2};
use peniko::{Brush, Color};
use tracing::info;
use vello::wgpu::{self, TextureDescriptor};

use crate::{Error, Plot, Result};

pub(crate) mod metrics;
mod pdf;
mod scene;
mod texture;
mod window;

/// Figure size in points, 6.4 by 4.8 inches.
pub const CANVAS_WIDTH: f64 = 460.8;
pub const CANVAS_HEIGHT: f64 = 345.6;

/// Resolution of raster output.
pub const DPI: f64 = 100.0;

const TOLERANCE: f64 = 0.01;

/// Drawing commands in canvas coordinates (points, y pointing down), replayed
/// by every output target.
pub(crate) struct Render {
  commands: Vec<Command>,
}

#[derive(Clone, Debug)]
pub(crate) enum Command {
  Fill { path: BezPath, brush: Brush },
  Stroke { path: BezPath, brush: Brush, stroke: Stroke },
  Text(Text),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
  #[default]
  Start,
  Center,
  End,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Weight {
  #[default]
  Normal,
  Bold,
}

pub(crate) struct DrawText<'a> {
  pub text:             &'a str,
  pub size:             f64,
  pub weight:           Weight,
  pub brush:            Brush,
  pub position:         Point,
  /// Applied around `position`, after alignment.
  pub transform:        Affine,
  pub horizontal_align: Align,
  pub vertical_align:   Align,
}

#[derive(Clone, Debug)]
pub(crate) struct Text {
  pub text:             String,
  pub size:             f64,
  pub weight:           Weight,
  pub brush:            Brush,
  pub position:         Point,
  pub transform:        Affine,
  pub horizontal_align: Align,
  pub vertical_align:   Align,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RenderConfig {
  pub width:  u32,
  pub height: u32,
}

pub(crate) struct GpuHandle {
  pub device:  wgpu::Device,
  pub queue:   wgpu::Queue,
  pub texture: wgpu::Texture,
  pub view:    wgpu::TextureView,
}

enum Target<'a> {
  Pdf(&'a Path),
  Image(&'a Path),
}

impl Default for DrawText<'_> {
  fn default() -> Self {
    DrawText {
      text:             "",
      size:             10.0,
      weight:           Weight::Normal,
      brush:            Brush::Solid(Color::BLACK),
      position:         Point::ORIGIN,
      transform:        Affine::IDENTITY,
      horizontal_align: Align::Start,
      vertical_align:   Align::Start,
    }
  }
}

impl Plot<'_> {
  /// Writes the figure to `path`, replacing any existing file. The extension
  /// picks the format: `pdf`, or a raster format `image` can encode.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let target = Target::from_path(path)?;
    let render = self.render()?;

    match target {
      Target::Pdf(path) => {
        let bytes = pdf::write(&render);
        std::fs::write(path, &bytes).map_err(|e| Error::io(path, e))?;
        info!("wrote {} ({} bytes)", path.display(), bytes.len());
      }
      Target::Image(path) => {
        let config = RenderConfig::from_dpi(DPI);
        texture::save(&render, config, path)?;
        info!("wrote {} ({}x{})", path.display(), config.width, config.height);
      }
    }

    Ok(())
  }

  /// Renders the figure as a single page PDF document.
  pub fn to_pdf(&self) -> Result<Vec<u8>> { Ok(pdf::write(&self.render()?)) }

  /// Opens a window showing the figure, and blocks until it is closed.
  pub fn show(&self) -> Result<()> { window::show(&self.render()?) }

  pub(crate) fn render(&self) -> Result<Render> {
    let mut render = Render::new();
    self.draw(&mut render)?;
    Ok(render)
  }
}

impl Target<'_> {
  fn from_path(path: &Path) -> Result<Target<'_>> {
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    match extension.as_deref() {
      Some("pdf") => Ok(Target::Pdf(path)),
      Some("png" | "jpg" | "jpeg" | "bmp" | "tif" | "tiff") => Ok(Target::Image(path)),
      _ => Err(Error::UnsupportedFormat(path.to_path_buf())),
    }
  }
}

impl Render {
  pub fn new() -> Self { Render { commands: vec![] } }

  pub fn commands(&self) -> &[Command] { &self.commands }

  pub fn fill(&mut self, shape: &impl Shape, transform: Affine, brush: &Brush) {
    self.commands.push(Command::Fill { path: transform * shape.to_path(TOLERANCE), brush: brush.clone() });
  }

  /// Strokes `shape` after transforming it, so the stroke width is in canvas units.
  pub fn stroke(&mut self, shape: &impl Shape, transform: Affine, brush: &Brush, stroke: &Stroke) {
    self.commands.push(Command::Stroke {
      path:   transform * shape.to_path(TOLERANCE),
      brush:  brush.clone(),
      stroke: stroke.clone(),
    });
  }

  pub fn draw_text(&mut self, text: DrawText) {
    self.commands.push(Command::Text(Text {
      text:             text.text.to_string(),
      size:             text.size,
      weight:           text.weight,
      brush:            text.brush,
      position:         text.position,
      transform:        text.transform,
      horizontal_align: text.horizontal_align,
      vertical_align:   text.vertical_align,
    }));
  }
}

impl Text {
  /// Maps a `width` by `height` text box (origin top left) onto the canvas.
  pub fn box_transform(&self, width: f64, height: f64) -> Affine {
    let offset = Vec2::new(
      match self.horizontal_align {
        Align::Start => 0.0,
        Align::Center => -width / 2.0,
        Align::End => -width,
      },
      match self.vertical_align {
        Align::Start => 0.0,
        Align::Center => -height / 2.0,
        Align::End => -height,
      },
    );

    Affine::translate(self.position.to_vec2()) * self.transform * Affine::translate(offset)
  }
}

impl RenderConfig {
  pub fn from_dpi(dpi: f64) -> Self {
    RenderConfig {
      width:  (CANVAS_WIDTH / 72.0 * dpi).round() as u32,
      height: (CANVAS_HEIGHT / 72.0 * dpi).round() as u32,
    }
  }

  /// Fits the canvas into the target, centered.
  pub fn transform(&self) -> Affine {
    let (width, height) = (f64::from(self.width), f64::from(self.height));
    let scale = (width / CANVAS_WIDTH).min(height / CANVAS_HEIGHT);
    let offset = Vec2::new(width - CANVAS_WIDTH * scale, height - CANVAS_HEIGHT * scale) / 2.0;
    Affine::translate(offset) * Affine::scale(scale)
  }

  fn extent_3d(&self) -> wgpu::Extent3d {
    wgpu::Extent3d {
      width:                 self.width,
      height:                self.height,
      depth_or_array_layers: 1,
    }
  }
}

impl GpuHandle {
  pub fn new(config: &RenderConfig, adapter: Option<wgpu::Adapter>) -> Result<Self> {
    let adapter = match adapter {
      Some(adapter) => adapter,
      None => {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
          .map_err(Error::gpu)?
      }
    };

    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
      label:             None,
      required_features: wgpu::Features::empty(),
      required_limits:   wgpu::Limits::defaults(),
      memory_hints:      wgpu::MemoryHints::MemoryUsage,
      trace:             wgpu::Trace::Off,
    }))
    .map_err(Error::gpu)?;

    let texture = create_texture(&device, config);
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    Ok(GpuHandle { device, queue, texture, view })
  }

  pub fn resize(&mut self, config: &RenderConfig) {
    self.texture = create_texture(&self.device, config);
    self.view = self.texture.create_view(&wgpu::TextureViewDescriptor::default());
  }
}

fn create_texture(device: &wgpu::Device, config: &RenderConfig) -> wgpu::Texture {
  device.create_texture(&TextureDescriptor {
    label:           Some("Render Texture"),
    size:            config.extent_3d(),
    mip_level_count: 1,
    sample_count:    1,
    dimension:       wgpu::TextureDimension::D2,
    format:          wgpu::TextureFormat::Rgba8Unorm,
    usage:           wgpu::TextureUsages::STORAGE_BINDING
      | wgpu::TextureUsages::TEXTURE_BINDING
      | wgpu::TextureUsages::COPY_SRC,
    view_formats:    &[],
  })
}
