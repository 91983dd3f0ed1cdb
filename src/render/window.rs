use std::sync::Arc;

use peniko::Color;
use tracing::warn;
use vello::wgpu;
use winit::{
  application::ApplicationHandler,
  dpi::LogicalSize,
  event::{KeyEvent, WindowEvent},
  event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
  keyboard::Key,
  window::{Window, WindowId},
};

use super::{CANVAS_HEIGHT, CANVAS_WIDTH, GpuHandle, Render, RenderConfig, scene::SceneBuilder};
use crate::{Error, Result};

pub(crate) fn show(render: &Render) -> Result<()> {
  let event_loop = EventLoop::new().map_err(Error::window)?;
  event_loop.set_control_flow(ControlFlow::Wait);

  let mut app = App { render, scenes: SceneBuilder::new(), stale: true, init: None, error: None };
  event_loop.run_app(&mut app).map_err(Error::window)?;
  let error = app.error.take();

  // FIXME: Ideally, we'd drop this. But dropping it segfaults.
  std::mem::forget(app);

  error.map_or(Ok(()), Err)
}

struct App<'a> {
  render: &'a Render,
  scenes: SceneBuilder,
  stale:  bool,

  init:  Option<Init>,
  error: Option<Error>,
}

struct Init {
  window:  Arc<Window>,
  surface: wgpu::Surface<'static>,
  config:  wgpu::SurfaceConfiguration,
  handle:  GpuHandle,

  blit:  wgpu::util::TextureBlitter,
  vello: vello::Renderer,
}

impl ApplicationHandler for App<'_> {
  fn resumed(&mut self, event_loop: &ActiveEventLoop) {
    if self.init.is_some() {
      return;
    }

    match Init::new(event_loop) {
      Ok(init) => {
        init.window.request_redraw();
        self.init = Some(init);
      }
      Err(e) => {
        self.error = Some(e);
        event_loop.exit();
      }
    }
  }

  fn window_event(&mut self, event_loop: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
    match event {
      WindowEvent::CloseRequested => {
        event_loop.exit();
      }

      WindowEvent::KeyboardInput {
        event: KeyEvent { logical_key: Key::Character(c), .. }, ..
      } if c == "q" => {
        event_loop.exit();
      }

      WindowEvent::Resized(new_size) => {
        if let Some(init) = &mut self.init {
          if new_size.width > 0 && new_size.height > 0 {
            init.config.width = new_size.width;
            init.config.height = new_size.height;
            let config = init.render_config();
            init.handle.resize(&config);
            init.surface.configure(&init.handle.device, &init.config);

            self.stale = true;
            init.window.request_redraw();
          }
        }
      }

      WindowEvent::RedrawRequested => {
        if let Some(init) = &mut self.init {
          if self.stale {
            self.stale = false;

            let config = init.render_config();
            let scene = self.scenes.build(self.render, config.transform());
            let result = init.vello.render_to_texture(
              &init.handle.device,
              &init.handle.queue,
              &scene,
              &init.handle.view,
              &vello::RenderParams {
                base_color:          Color::WHITE,
                width:               config.width,
                height:              config.height,
                antialiasing_method: vello::AaConfig::Msaa16,
              },
            );
            if let Err(e) = result {
              self.error = Some(Error::gpu(e));
              event_loop.exit();
              return;
            }
          }
          init.redraw();
        }
      }

      _ => (),
    }
  }
}

impl Init {
  fn new(event_loop: &ActiveEventLoop) -> Result<Self> {
    let window = Arc::new(
      event_loop
        .create_window(
          Window::default_attributes()
            .with_title("delayplot")
            .with_inner_size(LogicalSize::new(CANVAS_WIDTH * 2.0, CANVAS_HEIGHT * 2.0))
            .with_min_inner_size(LogicalSize::new(100, 100)),
        )
        .map_err(Error::window)?,
    );
    let size = window.inner_size();

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let surface = instance.create_surface(window.clone()).map_err(Error::window)?;

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
      compatible_surface: Some(&surface),
      ..Default::default()
    }))
    .map_err(Error::gpu)?;

    let surface_caps = surface.get_capabilities(&adapter);
    // The blit copies unorm values as-is, so an sRGB target would encode them twice.
    let surface_format = surface_caps
      .formats
      .iter()
      .copied()
      .find(|f| !f.is_srgb())
      .or_else(|| surface_caps.formats.first().copied())
      .ok_or_else(|| Error::Window("surface supports no texture formats".into()))?;

    let render_config = RenderConfig { width: size.width.max(1), height: size.height.max(1) };
    let handle = GpuHandle::new(&render_config, Some(adapter))?;

    let config = wgpu::SurfaceConfiguration {
      usage:                         wgpu::TextureUsages::RENDER_ATTACHMENT
        | wgpu::TextureUsages::COPY_DST,
      format:                        surface_format,
      width:                         render_config.width,
      height:                        render_config.height,
      present_mode:                  wgpu::PresentMode::AutoNoVsync,
      alpha_mode:                    surface_caps.alpha_modes[0],
      view_formats:                  vec![],
      desired_maximum_frame_latency: 2,
    };
    surface.configure(&handle.device, &config);

    let vello = vello::Renderer::new(&handle.device, vello::RendererOptions::default())
      .map_err(Error::gpu)?;

    let blit = wgpu::util::TextureBlitter::new(&handle.device, config.format);

    Ok(Init { window, surface, config, handle, blit, vello })
  }

  fn render_config(&self) -> RenderConfig {
    RenderConfig { width: self.config.width, height: self.config.height }
  }

  fn redraw(&mut self) {
    let frame = match self.surface.get_current_texture() {
      Ok(frame) => frame,
      Err(wgpu::SurfaceError::Lost) => {
        self.surface.configure(&self.handle.device, &self.config);
        return;
      }
      Err(e) => {
        warn!("dropped frame: {e:?}");
        return;
      }
    };

    let surface_view = &frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = self
      .handle
      .device
      .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Render Encoder") });

    self.blit.copy(&self.handle.device, &mut encoder, &self.handle.view, surface_view);

    self.handle.queue.submit(std::iter::once(encoder.finish()));

    frame.present();
  }
}
