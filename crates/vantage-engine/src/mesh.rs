use std::ops::Range;

use gltf::accessor::{DataType, Dimensions};
use gltf::Semantic;

/// Vertex shader input slots, in shader-location order. Attributes whose
/// semantic is not listed here are ignored by the renderer; extending the
/// table (and the shader inputs) is all it takes to feed another semantic.
pub const VERTEX_SLOTS: [(Semantic, u32); 3] = [
    (Semantic::Positions, 0),
    (Semantic::Normals, 1),
    (Semantic::TexCoords(0), 2),
];

pub const SLOT_COUNT: usize = VERTEX_SLOTS.len();
pub const POSITION_SLOT: usize = 0;

/// One vertex attribute resolved down to a device buffer region. `offset` is
/// absolute within the buffer: view offset plus accessor offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeBinding {
    /// Index into the uploaded buffer table, same index as the raw buffer.
    pub buffer: usize,
    pub offset: u64,
    /// Distance between consecutive elements. Views without a declared stride
    /// are tightly packed, so this falls back to the element size.
    pub stride: u64,
    pub format: wgpu::VertexFormat,
}

/// An index accessor resolved the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBinding {
    pub buffer: usize,
    pub offset: u64,
    pub format: wgpu::IndexFormat,
    pub count: u32,
}

impl IndexBinding {
    pub fn byte_len(&self) -> u64 {
        let element = match self.format {
            wgpu::IndexFormat::Uint16 => 2,
            wgpu::IndexFormat::Uint32 => 4,
        };
        self.count as u64 * element
    }
}

/// Everything needed to draw one primitive, resolved once at load time. A
/// slot holding `None` is disabled for this primitive and reads the shared
/// zero buffer instead.
#[derive(Debug, Clone)]
pub struct PrimitiveBinding {
    pub attributes: [Option<AttributeBinding>; SLOT_COUNT],
    pub indices: Option<IndexBinding>,
    /// Element count of the position accessor, used for non-indexed draws.
    pub vertex_count: u32,
    pub topology: wgpu::PrimitiveTopology,
    pub material: Option<usize>,
}

impl PrimitiveBinding {
    pub fn position(&self) -> Option<&AttributeBinding> {
        self.attributes[POSITION_SLOT].as_ref()
    }

    /// Number of elements a draw of this primitive submits.
    pub fn draw_count(&self) -> u32 {
        match &self.indices {
            Some(indices) => indices.count,
            None => self.vertex_count,
        }
    }

    /// Primitives without positions have nothing to rasterize and are skipped.
    pub fn is_drawable(&self) -> bool {
        self.position().is_some() && self.draw_count() > 0
    }

    pub fn layout_key(&self) -> LayoutKey {
        let mut slots = SLOT_FALLBACKS;
        for (slot, attribute) in self.attributes.iter().enumerate() {
            if let Some(attribute) = attribute {
                slots[slot] = SlotLayout {
                    format: attribute.format,
                    stride: attribute.stride,
                };
            }
        }
        let strip_indices = match self.topology {
            wgpu::PrimitiveTopology::LineStrip | wgpu::PrimitiveTopology::TriangleStrip => {
                self.indices.map(|indices| indices.format)
            }
            _ => None,
        };
        LayoutKey {
            slots,
            topology: self.topology,
            strip_indices,
        }
    }
}

/// The contiguous span of one mesh's primitives inside the flat binding
/// table. Ranges partition the table in mesh order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshRange {
    pub first: usize,
    pub count: usize,
}

impl MeshRange {
    pub fn range(&self) -> Range<usize> {
        self.first..self.first + self.count
    }
}

/// Vertex buffer layout of one slot as the pipeline sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotLayout {
    pub format: wgpu::VertexFormat,
    pub stride: u64,
}

/// Layouts presented to slots that a primitive leaves disabled. They read the
/// shared zero buffer, so normals come out flat and texture coordinates zero.
pub const SLOT_FALLBACKS: [SlotLayout; SLOT_COUNT] = [
    SlotLayout {
        format: wgpu::VertexFormat::Float32x3,
        stride: 12,
    },
    SlotLayout {
        format: wgpu::VertexFormat::Float32x3,
        stride: 12,
    },
    SlotLayout {
        format: wgpu::VertexFormat::Float32x2,
        stride: 8,
    },
];

/// Render pipelines are shared between primitives with the same vertex
/// layout and topology; this is the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayoutKey {
    pub slots: [SlotLayout; SLOT_COUNT],
    pub topology: wgpu::PrimitiveTopology,
    /// Set only for strip topologies with an index buffer, as the device
    /// requires.
    pub strip_indices: Option<wgpu::IndexFormat>,
}

/// Maps an accessor's element type onto the device vertex format that fetches
/// it as shader-visible floats. Integer data must be declared normalized;
/// there is no `None` fallback fetch for raw integers in the float slots.
pub fn vertex_format(
    data_type: DataType,
    dimensions: Dimensions,
    normalized: bool,
) -> Option<wgpu::VertexFormat> {
    use wgpu::VertexFormat as F;
    Some(match (data_type, dimensions, normalized) {
        (DataType::F32, Dimensions::Scalar, false) => F::Float32,
        (DataType::F32, Dimensions::Vec2, false) => F::Float32x2,
        (DataType::F32, Dimensions::Vec3, false) => F::Float32x3,
        (DataType::F32, Dimensions::Vec4, false) => F::Float32x4,
        (DataType::U8, Dimensions::Vec2, true) => F::Unorm8x2,
        (DataType::U8, Dimensions::Vec4, true) => F::Unorm8x4,
        (DataType::I8, Dimensions::Vec2, true) => F::Snorm8x2,
        (DataType::I8, Dimensions::Vec4, true) => F::Snorm8x4,
        (DataType::U16, Dimensions::Vec2, true) => F::Unorm16x2,
        (DataType::U16, Dimensions::Vec4, true) => F::Unorm16x4,
        (DataType::I16, Dimensions::Vec2, true) => F::Snorm16x2,
        (DataType::I16, Dimensions::Vec4, true) => F::Snorm16x4,
        _ => return None,
    })
}

/// Index accessors must be u16 or u32; u8 indices exist in documents but no
/// device format fetches them.
pub fn index_format(data_type: DataType) -> Option<wgpu::IndexFormat> {
    match data_type {
        DataType::U16 => Some(wgpu::IndexFormat::Uint16),
        DataType::U32 => Some(wgpu::IndexFormat::Uint32),
        _ => None,
    }
}

/// Fans and loops have no device topology and are rejected at load time.
pub fn topology(mode: gltf::mesh::Mode) -> Option<wgpu::PrimitiveTopology> {
    use gltf::mesh::Mode;
    Some(match mode {
        Mode::Points => wgpu::PrimitiveTopology::PointList,
        Mode::Lines => wgpu::PrimitiveTopology::LineList,
        Mode::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        Mode::Triangles => wgpu::PrimitiveTopology::TriangleList,
        Mode::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        Mode::LineLoop | Mode::TriangleFan => return None,
    })
}
