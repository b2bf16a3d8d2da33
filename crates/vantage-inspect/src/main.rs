use std::env;

use anyhow::Context;
use vantage_engine::{build_bindings, import_scenes, SceneData, SceneModel, VERTEX_SLOTS};

/// Prints a scene the way the renderer sees it: uploaded buffers, the flat
/// binding table with resolved offsets and strides, and the node hierarchy.
fn main() -> anyhow::Result<()> {
    let path = env::args()
        .nth(1)
        .context("usage: vantage-inspect <scene.gltf|scene.glb>")?;
    let scene = SceneData::load(&path).with_context(|| format!("failed to load {path}"))?;
    let document = &scene.document;

    println!("extensions used:");
    for ext in document.extensions_used() {
        println!("- {ext}");
    }
    println!("extensions required:");
    for ext in document.extensions_required() {
        println!("- {ext}");
    }

    println!("buffers:");
    for (buffer, data) in document.buffers().zip(&scene.buffers) {
        println!(
            "- buffer {}: {} bytes ({} declared)",
            buffer.index(),
            data.len(),
            buffer.length()
        );
    }

    let model = import_scenes(document);
    let (table, ranges) = build_bindings(document);

    for (mesh, range) in document.meshes().zip(&ranges) {
        println!(
            "mesh {} ({}): table rows {}..{}",
            mesh.index(),
            mesh.name().unwrap_or("unnamed"),
            range.first,
            range.first + range.count
        );
        if let Some(bounds) = &model.mesh_bounds[mesh.index()] {
            println!("  bounds {:?} .. {:?}", bounds.min, bounds.max);
        }
        for (row, binding) in range.range().zip(&table[range.range()]) {
            let drawable = if binding.is_drawable() {
                ""
            } else {
                " (not drawable)"
            };
            println!(
                "  row {row}: {:?}, {} elements{drawable}",
                binding.topology,
                binding.draw_count()
            );
            for ((semantic, slot), attribute) in VERTEX_SLOTS.iter().zip(&binding.attributes) {
                match attribute {
                    Some(a) => println!(
                        "    slot {slot} {semantic:?}: buffer {} offset {} stride {} {:?}",
                        a.buffer, a.offset, a.stride, a.format
                    ),
                    None => println!("    slot {slot} {semantic:?}: disabled"),
                }
            }
            if let Some(indices) = &binding.indices {
                println!(
                    "    indices: buffer {} offset {} {:?} count {}",
                    indices.buffer, indices.offset, indices.format, indices.count
                );
            }
            if let Some(material) = binding.material {
                println!("    material {material} (ignored by the renderer)");
            }
        }
    }

    for (index, scene) in model.scenes.iter().enumerate() {
        let default = if model.default_scene == Some(index) {
            " (default)"
        } else {
            ""
        };
        println!(
            "scene {index}{default}: {}",
            scene.name.as_deref().unwrap_or("unnamed")
        );
        for &node in &scene.nodes {
            print_node(&model, node, 1);
        }
    }

    Ok(())
}

fn print_node(model: &SceneModel, index: usize, level: usize) {
    let indent = "  ".repeat(level);
    let node = &model.nodes[index];
    let name = node.name.as_deref().unwrap_or("unnamed");
    match node.mesh {
        Some(mesh) => println!("{indent}node {index} ({name}), mesh {mesh}"),
        None => println!("{indent}node {index} ({name})"),
    }
    for &child in &node.children {
        print_node(model, child, level + 1);
    }
}
