use std::{path::Path, sync::mpsc};

use image::{DynamicImage, RgbaImage};
use peniko::Color;
use vello::wgpu;

use super::{GpuHandle, Render, RenderConfig, scene::SceneBuilder};
use crate::{Error, Result};

/// Renders off-screen and encodes the pixels with `image`.
pub(crate) fn save(render: &Render, config: RenderConfig, path: &Path) -> Result<()> {
  let handle = GpuHandle::new(&config, None)?;
  let scene = SceneBuilder::new().build(render, config.transform());

  let mut renderer = vello::Renderer::new(&handle.device, vello::RendererOptions::default())
    .map_err(Error::gpu)?;
  renderer
    .render_to_texture(
      &handle.device,
      &handle.queue,
      &scene,
      &handle.view,
      &vello::RenderParams {
        base_color:          Color::WHITE,
        width:               config.width,
        height:              config.height,
        antialiasing_method: vello::AaConfig::Msaa16,
      },
    )
    .map_err(Error::gpu)?;

  let pixels = read_back(&handle, config)?;
  let image = RgbaImage::from_raw(config.width, config.height, pixels)
    .ok_or_else(|| Error::Gpu("texture readback has the wrong size".into()))?;

  // Flattened to RGB, which every target format can encode.
  DynamicImage::ImageRgba8(image).to_rgb8().save(path)?;
  Ok(())
}

fn read_back(handle: &GpuHandle, config: RenderConfig) -> Result<Vec<u8>> {
  let row_bytes = 4 * config.width;
  let padded_row_bytes = row_bytes.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
    * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

  let buffer = handle.device.create_buffer(&wgpu::BufferDescriptor {
    label:              Some("Output Buffer"),
    size:               u64::from(padded_row_bytes) * u64::from(config.height),
    usage:              wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
    mapped_at_creation: false,
  });

  let mut encoder = handle.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
    label: Some("texture_buffer_copy_encoder"),
  });

  encoder.copy_texture_to_buffer(
    wgpu::TexelCopyTextureInfo {
      texture:   &handle.texture,
      mip_level: 0,
      origin:    wgpu::Origin3d::ZERO,
      aspect:    wgpu::TextureAspect::All,
    },
    wgpu::TexelCopyBufferInfo {
      buffer: &buffer,
      layout: wgpu::TexelCopyBufferLayout {
        offset:         0,
        bytes_per_row:  Some(padded_row_bytes),
        rows_per_image: Some(config.height),
      },
    },
    config.extent_3d(),
  );

  handle.queue.submit(std::iter::once(encoder.finish()));

  let slice = buffer.slice(..);
  let (tx, rx) = mpsc::channel();
  slice.map_async(wgpu::MapMode::Read, move |result| {
    let _ = tx.send(result);
  });
  handle.device.poll(wgpu::PollType::Wait).map_err(Error::gpu)?;
  rx.recv().map_err(Error::gpu)?.map_err(Error::gpu)?;

  let data = slice.get_mapped_range();
  let mut pixels = Vec::with_capacity(row_bytes as usize * config.height as usize);
  for row in data.chunks(padded_row_bytes as usize) {
    pixels.extend_from_slice(&row[..row_bytes as usize]);
  }
  drop(data);
  buffer.unmap();

  Ok(pixels)
}
