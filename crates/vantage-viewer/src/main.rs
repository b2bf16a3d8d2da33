mod app;
mod config;
mod screenshot;

use anyhow::Context;
use clap::Parser;
use vantage_engine::{EngineOptions, SceneData};

use crate::config::Config;

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let config = Config::parse();

    let options = EngineOptions {
        width: config.width,
        height: config.height,
        camera_pose: config.lookat,
        vertex_shader: read_shader(&config, config.vertex_shader.as_deref())?,
        fragment_shader: read_shader(&config, config.fragment_shader.as_deref())?,
    };

    // Loading before the window opens turns a bad file into a plain error
    // message instead of a dead window.
    let scene = SceneData::load(&config.scene)
        .with_context(|| format!("failed to load {}", config.scene.display()))?;

    match &config.output {
        Some(path) => screenshot::render_to_file(scene, &options, path),
        None => app::run(scene, options),
    }
}

fn read_shader(config: &Config, name: Option<&str>) -> anyhow::Result<Option<String>> {
    let Some(name) = name else { return Ok(None) };
    let path = config.shaders_dir.join(name);
    let source = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read shader {}", path.display()))?;
    Ok(Some(source))
}
