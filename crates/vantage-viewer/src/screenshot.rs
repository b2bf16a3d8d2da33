use std::path::Path;

use anyhow::Context;
use vantage_engine::wgpu;
use vantage_engine::{Engine, EngineOptions, SceneData};

/// Renders one frame without a window and writes it out as a PNG.
pub fn render_to_file(scene: SceneData, options: &EngineOptions, path: &Path) -> anyhow::Result<()> {
    let instance = wgpu::Instance::new(wgpu::Backends::all());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .context("no graphics adapter found")?;
    let (device, queue) = pollster::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            features: wgpu::Features::empty(),
            limits: wgpu::Limits::default(),
            label: None,
        },
        None,
    ))?;

    let mut engine = Engine::new(&device, scene, options);
    engine.update(&queue);
    queue.submit(std::iter::once(engine.render(&device)));

    let pixels = engine.read_color_target(&device, &queue)?;
    let (width, height) = engine.target_size();
    let image = image::RgbaImage::from_raw(width, height, pixels)
        .context("frame readback returned too few bytes")?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write {}", path.display()))?;

    log::info!("wrote {}x{} frame to {}", width, height, path.display());
    Ok(())
}
