use std::path::PathBuf;

use clap::Parser;
use vantage_engine::cgmath::{Point3, Vector3};
use vantage_engine::LookAt;

/// Minimal glTF 2.0 scene viewer.
#[derive(Parser, Debug)]
#[command(name = "vantage", version, about)]
pub struct Config {
    /// Path of the .gltf or .glb scene to open.
    pub scene: PathBuf,

    /// Window width in logical pixels.
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Window height in logical pixels.
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Starting camera pose as nine comma separated floats:
    /// eye x,y,z, center x,y,z, up x,y,z. The Diagnostics window
    /// copies the current pose in this format.
    #[arg(long, value_parser = parse_look_at)]
    pub lookat: Option<LookAt>,

    /// Vertex shader file inside the shader directory. Must export `vs_main`.
    #[arg(long)]
    pub vertex_shader: Option<String>,

    /// Fragment shader file inside the shader directory. Must export `fs_main`.
    #[arg(long)]
    pub fragment_shader: Option<String>,

    /// Directory searched for shader overrides.
    #[arg(long, default_value = "shaders")]
    pub shaders_dir: PathBuf,

    /// Render one frame to this PNG file and exit instead of opening a window.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

fn parse_look_at(value: &str) -> Result<LookAt, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("expected a float: {e}"))?;
    if parts.len() != 9 {
        return Err(format!(
            "expected 9 comma separated floats (eye, center, up), got {}",
            parts.len()
        ));
    }
    Ok(LookAt {
        eye: Point3::new(parts[0], parts[1], parts[2]),
        center: Point3::new(parts[3], parts[4], parts[5]),
        up: Vector3::new(parts[6], parts[7], parts[8]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_command_line() {
        let config = Config::try_parse_from(["vantage", "scene.gltf"]).unwrap();
        assert_eq!(config.scene, PathBuf::from("scene.gltf"));
        assert_eq!(config.width, 1280);
        assert_eq!(config.height, 720);
        assert!(config.lookat.is_none());
        assert!(config.vertex_shader.is_none());
        assert!(config.output.is_none());
        assert_eq!(config.shaders_dir, PathBuf::from("shaders"));
    }

    #[test]
    fn test_look_at_pose_parses() {
        let config = Config::try_parse_from([
            "vantage",
            "scene.glb",
            "--lookat",
            "1,2,3, 0,0,0, 0,1,0",
        ])
        .unwrap();
        let pose = config.lookat.unwrap();
        assert_eq!(pose.eye, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(pose.center, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(pose.up, Vector3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_look_at_rejects_wrong_arity() {
        let result = Config::try_parse_from(["vantage", "scene.gltf", "--lookat", "1,2,3"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_look_at_rejects_non_numbers() {
        let result =
            Config::try_parse_from(["vantage", "scene.gltf", "--lookat", "a,b,c,d,e,f,g,h,i"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_scene_path_is_required() {
        assert!(Config::try_parse_from(["vantage"]).is_err());
    }
}
