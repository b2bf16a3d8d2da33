use thiserror::Error;

/// Failures raised while loading and validating a scene document, before any
/// device resource is created.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Gltf(#[from] gltf::Error),
    #[error("buffer {index} declares {declared} bytes but only {actual} are present")]
    BufferTooShort {
        index: usize,
        declared: usize,
        actual: usize,
    },
    #[error(
        "buffer view {index} spans bytes {offset}..{end} of buffer {buffer}, \
         which holds {available} bytes"
    )]
    ViewOutOfBounds {
        index: usize,
        offset: usize,
        end: usize,
        buffer: usize,
        available: usize,
    },
    #[error(
        "accessor {index} needs bytes {offset}..{end} of buffer view {view}, \
         which holds {available} bytes"
    )]
    AccessorOutOfBounds {
        index: usize,
        offset: usize,
        end: usize,
        view: usize,
        available: usize,
    },
    #[error("accessor {index} has no buffer view (sparse accessors are not supported)")]
    MissingView { index: usize },
    #[error(
        "accessor {index}: {data_type:?} {dimensions:?} (normalized: {normalized}) \
         has no device vertex format"
    )]
    UnsupportedAttribute {
        index: usize,
        data_type: gltf::accessor::DataType,
        dimensions: gltf::accessor::Dimensions,
        normalized: bool,
    },
    #[error("accessor {index}: {data_type:?} is not a supported index type (use u16 or u32)")]
    UnsupportedIndexType {
        index: usize,
        data_type: gltf::accessor::DataType,
    },
    #[error("mesh {mesh}, primitive {primitive}: mode {mode:?} is not supported by the device")]
    UnsupportedMode {
        mesh: usize,
        primitive: usize,
        mode: gltf::mesh::Mode,
    },
    #[error("accessor {index}: byte offset {offset} is not 4-byte aligned as the device requires")]
    MisalignedAttribute { index: usize, offset: usize },
    #[error("accessor {index}: stride {stride} is not a multiple of 4 as the device requires")]
    MisalignedStride { index: usize, stride: usize },
}

/// Failures raised while copying the rendered frame back to the host.
#[derive(Error, Debug)]
pub enum ReadbackError {
    #[error("mapping the readback buffer failed: {0}")]
    Map(#[from] wgpu::BufferAsyncError),
    #[error("the device was lost before the readback completed")]
    DeviceLost,
}
