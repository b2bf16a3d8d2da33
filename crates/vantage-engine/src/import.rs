use crate::error::LoadError;
use crate::mesh::{
    index_format, topology, vertex_format, AttributeBinding, IndexBinding, MeshRange,
    PrimitiveBinding, SLOT_COUNT, VERTEX_SLOTS,
};
use crate::scene::{Aabb, Node, NodeTransform, Scene, SceneModel};
use crate::validate;
use cgmath::{InnerSpace, Matrix3, Point3, SquareMatrix, Vector3};
use std::borrow::Cow;
use std::path::Path;
use wgpu::util::DeviceExt;

/// A parsed document plus its raw buffer payloads, validated so that every
/// byte range the renderer binds is known to exist.
#[derive(Debug)]
pub struct SceneData {
    pub document: gltf::Document,
    pub buffers: Vec<gltf::buffer::Data>,
}

impl SceneData {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let (document, buffers, images) = gltf::import(path)?;
        Self::from_parts(document, buffers, images)
    }

    /// Loads from bytes already in memory; accepts both GLB and JSON with
    /// embedded (data URI) buffers.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        let (document, buffers, images) = gltf::import_slice(bytes)?;
        Self::from_parts(document, buffers, images)
    }

    fn from_parts(
        document: gltf::Document,
        buffers: Vec<gltf::buffer::Data>,
        images: Vec<gltf::image::Data>,
    ) -> Result<Self, LoadError> {
        if !images.is_empty() {
            log::debug!("ignoring {} image(s); shading does not sample them", images.len());
        }
        validate::check_document(&document, &buffers)?;
        Ok(Self { document, buffers })
    }
}

/// Trailing zero bytes a buffer needs before upload. Draw-time bounds divide
/// the bound slice size by the stride, so the last element of a strided view
/// that ends flush with its buffer would count as incomplete; padding by the
/// largest declared stride keeps every whole element drawable.
pub fn stride_padding(document: &gltf::Document, buffer: usize) -> usize {
    document
        .views()
        .filter(|view| view.buffer().index() == buffer)
        .filter_map(|view| view.stride())
        .max()
        .unwrap_or(0)
}

/// Uploads each raw buffer to the device once, immutably, padded per
/// [`stride_padding`]. The returned table is index-aligned with the
/// document's buffers, so resolved bindings can address it directly.
pub fn upload_buffers(
    device: &wgpu::Device,
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Vec<wgpu::Buffer> {
    buffers
        .iter()
        .enumerate()
        .map(|(index, data)| {
            let padding = stride_padding(document, index);
            let mut contents = Cow::Borrowed(&data[..]);
            if padding > 0 {
                contents.to_mut().resize(data.len() + padding, 0);
            }
            let label = format!("scene buffer {}", index);
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&label),
                contents: &contents,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::INDEX,
            })
        })
        .collect()
}

/// Resolves one semantic of a primitive down to a buffer region. A missing
/// semantic resolves to `None`, which disables the slot for this primitive.
pub fn resolve_attribute(
    primitive: &gltf::Primitive,
    semantic: &gltf::Semantic,
) -> Option<AttributeBinding> {
    let accessor = primitive.get(semantic)?;
    let view = accessor.view()?;
    let format = vertex_format(
        accessor.data_type(),
        accessor.dimensions(),
        accessor.normalized(),
    )?;
    Some(AttributeBinding {
        buffer: view.buffer().index(),
        offset: (view.offset() + accessor.offset()) as u64,
        stride: view.stride().unwrap_or_else(|| accessor.size()) as u64,
        format,
    })
}

pub fn resolve_indices(primitive: &gltf::Primitive) -> Option<IndexBinding> {
    let accessor = primitive.indices()?;
    let view = accessor.view()?;
    let format = index_format(accessor.data_type())?;
    Some(IndexBinding {
        buffer: view.buffer().index(),
        offset: (view.offset() + accessor.offset()) as u64,
        format,
        count: accessor.count() as u32,
    })
}

fn build_primitive(primitive: &gltf::Primitive) -> PrimitiveBinding {
    let mut attributes: [Option<AttributeBinding>; SLOT_COUNT] = [None; SLOT_COUNT];
    for (semantic, slot) in VERTEX_SLOTS.iter() {
        attributes[*slot as usize] = resolve_attribute(primitive, semantic);
    }
    let vertex_count = primitive
        .get(&gltf::Semantic::Positions)
        .map(|accessor| accessor.count() as u32)
        .unwrap_or(0);
    PrimitiveBinding {
        attributes,
        indices: resolve_indices(primitive),
        vertex_count,
        // Unsupported modes were rejected by validation.
        topology: topology(primitive.mode()).unwrap_or(wgpu::PrimitiveTopology::TriangleList),
        material: primitive.material().index(),
    }
}

/// Builds one binding per primitive into a flat table, meshes in ascending
/// order, and the per-mesh ranges that partition it.
pub fn build_bindings(document: &gltf::Document) -> (Vec<PrimitiveBinding>, Vec<MeshRange>) {
    let mut table = Vec::new();
    let mut ranges = Vec::with_capacity(document.meshes().len());
    for mesh in document.meshes() {
        let first = table.len();
        for primitive in mesh.primitives() {
            let binding = build_primitive(&primitive);
            if !binding.is_drawable() {
                log::warn!(
                    "mesh {}, primitive {}: no position data, nothing will be drawn",
                    mesh.index(),
                    primitive.index()
                );
            }
            table.push(binding);
        }
        ranges.push(MeshRange {
            first,
            count: table.len() - first,
        });
    }
    (table, ranges)
}

fn import_scene(scene: gltf::Scene) -> Scene {
    Scene {
        name: scene.name().map(str::to_owned),
        nodes: scene.nodes().map(|node| node.index()).collect(),
    }
}

fn import_node(node: gltf::Node) -> Node {
    Node {
        name: node.name().map(str::to_owned),
        transform: import_transform(node.transform()),
        children: node.children().map(|child| child.index()).collect(),
        mesh: node.mesh().map(|mesh| mesh.index()),
    }
}

fn import_transform(transform: gltf::scene::Transform) -> NodeTransform {
    use gltf::scene::Transform as G;
    match transform {
        G::Matrix { matrix } => {
            let mat4 = cgmath::Matrix4::from(matrix);
            let position = Vector3::new(mat4.w.x, mat4.w.y, mat4.w.z);

            let mut mat3 =
                Matrix3::from_cols(mat4.x.truncate(), mat4.y.truncate(), mat4.z.truncate());
            let mut scale =
                Vector3::new(mat3.x.magnitude(), mat3.y.magnitude(), mat3.z.magnitude());

            mat3.x /= scale.x;
            mat3.y /= scale.y;
            mat3.z /= scale.z;

            if mat3.determinant() < 0.0 {
                mat3 = -mat3;
                scale = -scale;
            }

            let rotation = cgmath::Quaternion::from(mat3);

            NodeTransform {
                position,
                rotation,
                scale,
            }
        }
        G::Decomposed {
            translation,
            rotation,
            scale,
        } => NodeTransform {
            position: translation.into(),
            rotation: rotation.into(),
            scale: scale.into(),
        },
    }
}

fn json_point(value: gltf::json::Value) -> Option<Point3<f32>> {
    gltf::json::deserialize::from_value::<[f32; 3]>(value)
        .ok()
        .map(Point3::from)
}

/// Object-space box of a mesh, from the min/max the document declares on its
/// position accessors. Documents are required to carry these.
fn mesh_bounds(mesh: &gltf::Mesh) -> Option<Aabb> {
    let mut bounds: Option<Aabb> = None;
    for primitive in mesh.primitives() {
        let accessor = match primitive.get(&gltf::Semantic::Positions) {
            Some(accessor) => accessor,
            None => continue,
        };
        let (min, max) = match (
            accessor.min().and_then(json_point),
            accessor.max().and_then(json_point),
        ) {
            (Some(min), Some(max)) => (min, max),
            _ => continue,
        };
        let primitive_bounds = Aabb { min, max };
        match bounds.as_mut() {
            Some(bounds) => bounds.union(&primitive_bounds),
            None => bounds = Some(primitive_bounds),
        }
    }
    bounds
}

/// Mirrors the document's scenes and node hierarchy by index.
pub fn import_scenes(document: &gltf::Document) -> SceneModel {
    if document.scenes().len() == 0 {
        log::warn!("document has no scenes; nothing will be drawn");
    } else if document.default_scene().is_none() {
        log::warn!("document marks no scene as default; nothing will be drawn");
    }
    SceneModel {
        default_scene: document.default_scene().map(|scene| scene.index()),
        scenes: document.scenes().map(import_scene).collect(),
        nodes: document.nodes().map(import_node).collect(),
        mesh_bounds: document.meshes().map(|mesh| mesh_bounds(&mesh)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Matrix4, Rotation3};

    fn assert_vec_close(actual: Vector3<f32>, expected: [f32; 3]) {
        let delta = actual - Vector3::from(expected);
        assert!(
            delta.magnitude() < 1e-4,
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    #[test]
    fn test_matrix_transform_decomposes_to_trs() {
        let source = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0))
            * Matrix4::from(cgmath::Quaternion::from_angle_y(Deg(90.0)))
            * Matrix4::from_nonuniform_scale(2.0, 3.0, 4.0);
        let cols: [[f32; 4]; 4] = source.into();
        let transform = import_transform(gltf::scene::Transform::Matrix { matrix: cols });

        assert_vec_close(transform.position, [1.0, 2.0, 3.0]);
        assert_vec_close(transform.scale, [2.0, 3.0, 4.0]);
        // Recomposing must reproduce the source matrix.
        let recomposed: [[f32; 4]; 4] = transform.matrix().into();
        for (a, b) in cols.iter().flatten().zip(recomposed.iter().flatten()) {
            assert!((a - b).abs() < 1e-4, "expected {:?}, got {:?}", cols, recomposed);
        }
    }

    #[test]
    fn test_decomposed_transform_is_taken_verbatim() {
        let transform = import_transform(gltf::scene::Transform::Decomposed {
            translation: [5.0, 0.0, -1.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0, 1.0, 1.0],
        });
        assert_vec_close(transform.position, [5.0, 0.0, -1.0]);
        assert_vec_close(transform.scale, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_json_point_parses_three_components() {
        let parse = |text: &str| {
            gltf::json::deserialize::from_str::<gltf::json::Value>(text).unwrap()
        };
        assert_eq!(
            json_point(parse("[1.0, -2.5, 3.0]")),
            Some(Point3::new(1.0, -2.5, 3.0))
        );
        assert_eq!(json_point(parse("[1.0]")), None);
    }
}
