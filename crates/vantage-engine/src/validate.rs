//! Load-time validation of the byte ranges the renderer will read. Everything
//! here is checked once, before any device buffer is created, so the draw
//! path can bind regions without further bounds checks.

use crate::error::LoadError;
use crate::mesh::{index_format, topology, vertex_format, VERTEX_SLOTS};

/// Bytes covered by `count` strided elements starting at `offset`.
fn extent(offset: usize, stride: usize, element: usize, count: usize) -> usize {
    if count == 0 {
        offset
    } else {
        offset + stride * (count - 1) + element
    }
}

fn check_vertex_accessor(accessor: &gltf::Accessor) -> Result<(), LoadError> {
    let index = accessor.index();
    let view = accessor
        .view()
        .ok_or(LoadError::MissingView { index })?;
    vertex_format(
        accessor.data_type(),
        accessor.dimensions(),
        accessor.normalized(),
    )
    .ok_or(LoadError::UnsupportedAttribute {
        index,
        data_type: accessor.data_type(),
        dimensions: accessor.dimensions(),
        normalized: accessor.normalized(),
    })?;

    let offset = view.offset() + accessor.offset();
    if offset % 4 != 0 {
        return Err(LoadError::MisalignedAttribute { index, offset });
    }
    let stride = view.stride().unwrap_or_else(|| accessor.size());
    if stride % 4 != 0 {
        return Err(LoadError::MisalignedStride { index, stride });
    }

    let end = extent(accessor.offset(), stride, accessor.size(), accessor.count());
    if end > view.length() {
        return Err(LoadError::AccessorOutOfBounds {
            index,
            offset: accessor.offset(),
            end,
            view: view.index(),
            available: view.length(),
        });
    }
    Ok(())
}

fn check_index_accessor(accessor: &gltf::Accessor) -> Result<(), LoadError> {
    let index = accessor.index();
    let view = accessor
        .view()
        .ok_or(LoadError::MissingView { index })?;
    index_format(accessor.data_type()).ok_or(LoadError::UnsupportedIndexType {
        index,
        data_type: accessor.data_type(),
    })?;

    // Index views carry no stride; elements are tight.
    let end = extent(
        accessor.offset(),
        accessor.size(),
        accessor.size(),
        accessor.count(),
    );
    if end > view.length() {
        return Err(LoadError::AccessorOutOfBounds {
            index,
            offset: accessor.offset(),
            end,
            view: view.index(),
            available: view.length(),
        });
    }
    let offset = view.offset() + accessor.offset();
    if offset % accessor.size() != 0 {
        return Err(LoadError::MisalignedAttribute { index, offset });
    }
    Ok(())
}

/// Checks every byte range the draw path will bind: buffer data against
/// declared lengths, views against buffers, and the accessors each primitive
/// actually uses against their views. Unused accessors are left alone.
pub fn check_document(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Result<(), LoadError> {
    for buffer in document.buffers() {
        let actual = buffers.get(buffer.index()).map(|data| data.len()).unwrap_or(0);
        if actual < buffer.length() {
            return Err(LoadError::BufferTooShort {
                index: buffer.index(),
                declared: buffer.length(),
                actual,
            });
        }
    }

    for view in document.views() {
        let available = buffers[view.buffer().index()].len();
        let end = view.offset() + view.length();
        if end > available {
            return Err(LoadError::ViewOutOfBounds {
                index: view.index(),
                offset: view.offset(),
                end,
                buffer: view.buffer().index(),
                available,
            });
        }
    }

    for mesh in document.meshes() {
        for primitive in mesh.primitives() {
            if topology(primitive.mode()).is_none() {
                return Err(LoadError::UnsupportedMode {
                    mesh: mesh.index(),
                    primitive: primitive.index(),
                    mode: primitive.mode(),
                });
            }
            for (semantic, _) in VERTEX_SLOTS.iter() {
                if let Some(accessor) = primitive.get(semantic) {
                    check_vertex_accessor(&accessor)?;
                }
            }
            if let Some(accessor) = primitive.indices() {
                check_index_accessor(&accessor)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_of_tight_elements() {
        // Three vec3<f32> elements, tightly packed.
        assert_eq!(extent(0, 12, 12, 3), 36);
    }

    #[test]
    fn test_extent_of_strided_elements() {
        // Interleaved: last element only contributes its own size.
        assert_eq!(extent(12, 24, 12, 3), 72);
    }

    #[test]
    fn test_extent_of_empty_accessor() {
        assert_eq!(extent(8, 12, 12, 0), 8);
    }
}
