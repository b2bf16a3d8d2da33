mod camera;
mod error;
mod import;
mod mesh;
mod scene;
mod target;
mod validate;

use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;

use cgmath::*;
use wgpu::util::DeviceExt;

pub use camera::{Camera, CameraController, LookAt, Projection, OPENGL_TO_WGPU_MATRIX};
pub use error::{LoadError, ReadbackError};
pub use import::{
    build_bindings, import_scenes, resolve_attribute, resolve_indices, stride_padding,
    upload_buffers, SceneData,
};
pub use mesh::{
    index_format, topology, vertex_format, AttributeBinding, IndexBinding, MeshRange,
    PrimitiveBinding, SLOT_COUNT, VERTEX_SLOTS,
};
pub use scene::{scene_bounds, visit_scene, Aabb, Node, NodeTransform, Scene, SceneModel};
pub use cgmath;
pub use wgpu;

use mesh::LayoutKey;
use target::RenderTarget;

const ENGINE_COLOR_LABEL: &str = "engine color target";
const ENGINE_DEPTH_LABEL: &str = "engine depth target";

const DEFAULT_SHADER: &str = include_str!("shader.wgsl");

enum AnimationState {
    Idle,
    Animating(AnimationSession),
}

impl AnimationState {
    fn must_be_idle(&self) -> bool {
        if let AnimationState::Animating(session) = self {
            if session.pressing_mouse_buttons.is_empty() && session.pressing_keys.is_empty() {
                return true;
            }
        }
        false
    }

    fn animation_session(&self) -> Option<&AnimationSession> {
        match self {
            AnimationState::Idle => None,
            AnimationState::Animating(session) => Some(session),
        }
    }
}

struct AnimationSession {
    pressing_keys: HashSet<AbstractKey>,
    pressing_mouse_buttons: HashSet<AbstractMouseButton>,
    prev_time: Option<instant::Instant>,
    now: instant::Instant,
}

impl AnimationSession {
    fn is_rotating_with_mouse(&self) -> bool {
        self.pressing_mouse_buttons
            .contains(&AbstractMouseButton::Primary)
    }
}

impl Default for AnimationSession {
    fn default() -> Self {
        Self {
            pressing_keys: HashSet::new(),
            pressing_mouse_buttons: HashSet::new(),
            prev_time: None,
            now: instant::Instant::now(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct NodeUniform {
    model_mat: [[f32; 4]; 4],
    normal_mat: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniform {
    view_position: [f32; 4],
    view_front: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    fn new() -> Self {
        Self {
            view_position: cgmath::Vector4::zero().into(),
            view_front: cgmath::Vector4::unit_x().into(),
            view_proj: cgmath::Matrix4::identity().into(),
        }
    }

    fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        let f = camera.front();
        self.view_front = Vector4::new(f.x, f.y, f.z, 0.0).into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

/// How the engine is set up. `camera_pose` overrides scene framing; shader
/// sources replace the built-in module per stage and must export `vs_main`
/// or `fs_main` respectively.
pub struct EngineOptions {
    pub width: u32,
    pub height: u32,
    pub camera_pose: Option<LookAt>,
    pub vertex_shader: Option<String>,
    pub fragment_shader: Option<String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            camera_pose: None,
            vertex_shader: None,
            fragment_shader: None,
        }
    }
}

/// Per-frame counters for the diagnostics overlay. The static counts are
/// filled once at load, the visit counts on every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    pub nodes_visited: usize,
    pub draw_calls: usize,
    pub buffers: usize,
    pub meshes: usize,
    pub primitives: usize,
    pub pipelines: usize,
}

struct NodeUniformGpu {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Every device resource derived from one scene document. Dropping this
/// releases them all; the engine owns exactly one, so teardown happens when
/// the engine goes away, not at process exit.
struct SceneGpu {
    buffers: Vec<wgpu::Buffer>,
    table: Vec<PrimitiveBinding>,
    ranges: Vec<MeshRange>,
    /// Zero-filled vertex data read by disabled slots.
    fallback: wgpu::Buffer,
    /// Index-aligned with the model's nodes; `None` for nodes without meshes.
    node_uniforms: Vec<Option<NodeUniformGpu>>,
}

impl Drop for SceneGpu {
    fn drop(&mut self) {
        log::debug!(
            "releasing scene resources: {} buffers, {} primitives",
            self.buffers.len(),
            self.table.len()
        );
    }
}

pub struct Engine {
    animation_state: AnimationState,

    target_width: u32,
    target_height: u32,

    // pipeline resources
    pipelines: HashMap<LayoutKey, wgpu::RenderPipeline>,
    color_target: RenderTarget,
    depth_target: RenderTarget,

    model: SceneModel,
    scene_gpu: SceneGpu,

    // camera state
    camera: Camera,
    projection: Projection,
    camera_controller: CameraController,

    // camera resources
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,

    /// (node, mesh) pairs collected by the last scene walk, in visit order.
    pending_draws: Vec<(usize, usize)>,
    stats: FrameStats,
}

impl Engine {
    pub fn new(device: &wgpu::Device, scene: SceneData, options: &EngineOptions) -> Self {
        let SceneData { document, buffers } = scene;

        let model = import::import_scenes(&document);
        let (table, ranges) = import::build_bindings(&document);
        let device_buffers = import::upload_buffers(device, &document, &buffers);
        let fallback = create_fallback_buffer(device, &table);

        let node_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("node_bind_group_layout"),
            });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("camera_bind_group_layout"),
            });

        let node_uniforms = model
            .nodes
            .iter()
            .map(|node| {
                node.mesh?;
                Some(create_node_uniforms(device, &node_bind_group_layout))
            })
            .collect();

        let bounds = model
            .default_scene()
            .and_then(|scene| scene_bounds(&model, scene));
        let extent = bounds
            .map(|bounds| bounds.diagonal().magnitude())
            .filter(|length| *length > 0.0)
            .unwrap_or(100.0);

        let camera = match (&options.camera_pose, bounds) {
            (Some(pose), _) => Camera::from_look_at(pose),
            (None, Some(bounds)) => Camera::from_look_at(&LookAt {
                eye: bounds.center() + bounds.diagonal(),
                center: bounds.center(),
                up: Vector3::unit_y(),
            }),
            (None, None) => Camera::new((0.0, 0.0, 0.0), Deg(-90.0), Deg(0.0)),
        };
        let width = options.width.max(1);
        let height = options.height.max(1);
        let projection = Projection::new(width, height, Deg(45.0), 0.001 * extent, 1.5 * extent);
        let camera_controller = CameraController::new(0.5 * extent, 0.4);

        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj(&camera, &projection);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let vertex_shader = create_shader(
            device,
            "vertex shader",
            options.vertex_shader.as_deref().unwrap_or(DEFAULT_SHADER),
        );
        // `None` means both stages come from the vertex module.
        let fragment_shader = match options.fragment_shader.as_deref() {
            Some(source) if options.vertex_shader.as_deref() == Some(source) => None,
            Some(source) => Some(create_shader(device, "fragment shader", source)),
            None if options.vertex_shader.is_some() => {
                Some(create_shader(device, "fragment shader", DEFAULT_SHADER))
            }
            None => None,
        };

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout, &node_bind_group_layout],
            push_constant_ranges: &[],
        });

        // One pipeline per distinct vertex layout; the shader is shared.
        let mut pipelines = HashMap::new();
        for binding in table.iter().filter(|binding| binding.is_drawable()) {
            let key = binding.layout_key();
            pipelines.entry(key).or_insert_with(|| {
                create_pipeline(
                    device,
                    &pipeline_layout,
                    &vertex_shader,
                    fragment_shader.as_ref().unwrap_or(&vertex_shader),
                    &key,
                )
            });
        }

        let color_target = RenderTarget::color(device, width, height, ENGINE_COLOR_LABEL);
        let depth_target = RenderTarget::depth(device, width, height, ENGINE_DEPTH_LABEL);

        let stats = FrameStats {
            nodes_visited: 0,
            draw_calls: 0,
            buffers: device_buffers.len(),
            meshes: ranges.len(),
            primitives: table.len(),
            pipelines: pipelines.len(),
        };
        log::info!(
            "scene ready: {} buffers, {} meshes, {} primitives, {} pipelines",
            stats.buffers,
            stats.meshes,
            stats.primitives,
            stats.pipelines
        );

        Self {
            animation_state: AnimationState::Idle,
            target_width: width,
            target_height: height,
            pipelines,
            color_target,
            depth_target,
            model,
            scene_gpu: SceneGpu {
                buffers: device_buffers,
                table,
                ranges,
                fallback,
                node_uniforms,
            },
            camera,
            projection,
            camera_controller,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            pending_draws: Vec::new(),
            stats,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32, device: &wgpu::Device) -> bool {
        let changed =
            width > 0 && height > 0 && (self.target_width != width || self.target_height != height);
        if changed {
            self.projection.resize(width, height);
            self.color_target = RenderTarget::color(device, width, height, ENGINE_COLOR_LABEL);
            self.depth_target = RenderTarget::depth(device, width, height, ENGINE_DEPTH_LABEL);
            self.target_width = width;
            self.target_height = height;
        }
        changed
    }

    pub fn input(&mut self, event: &InputEvent) -> bool {
        match (event, &mut self.animation_state) {
            (InputEvent::MouseLeftDown, AnimationState::Idle) => {
                let mut session = AnimationSession::default();
                session
                    .pressing_mouse_buttons
                    .insert(AbstractMouseButton::Primary);
                self.animation_state = AnimationState::Animating(session);
            }
            (InputEvent::MouseLeftDown, AnimationState::Animating(session)) => {
                session
                    .pressing_mouse_buttons
                    .insert(AbstractMouseButton::Primary);
            }
            (InputEvent::MouseLeftUp, AnimationState::Animating(session)) => {
                session
                    .pressing_mouse_buttons
                    .remove(&AbstractMouseButton::Primary);
            }
            (InputEvent::KeyPressing(key), AnimationState::Idle) => {
                let mut session = AnimationSession::default();
                session.pressing_keys.insert(*key);
                self.animation_state = AnimationState::Animating(session);
            }
            (InputEvent::KeyPressing(key), AnimationState::Animating(session)) => {
                session.pressing_keys.insert(*key);
            }
            (InputEvent::KeyUp(key), AnimationState::Animating(session)) => {
                session.pressing_keys.remove(key);
            }
            _ => {}
        }

        if self.animation_state.must_be_idle() {
            self.animation_state = AnimationState::Idle;
        }

        match event {
            InputEvent::KeyPressing(key) => self.camera_controller.process_keyboard(*key, true),
            InputEvent::KeyUp(key) => self.camera_controller.process_keyboard(*key, false),
            InputEvent::MouseWheel { delta_y, .. } => {
                self.camera_controller.process_scroll(*delta_y);
                true
            }
            InputEvent::MouseLeftDown | InputEvent::MouseLeftUp => true,
            InputEvent::MouseMove { delta_x, delta_y } => {
                let rotating = self
                    .animation_state
                    .animation_session()
                    .map(|session| session.is_rotating_with_mouse())
                    .unwrap_or(false);
                if rotating {
                    self.camera_controller.process_mouse(*delta_x, *delta_y);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Drops every held key. The shell calls this when a widget steals
    /// keyboard focus and the release events stop arriving.
    pub fn reset_movement(&mut self) {
        self.camera_controller.reset_move_amount();
        if let AnimationState::Animating(session) = &mut self.animation_state {
            session.pressing_keys.clear();
        }
        if self.animation_state.must_be_idle() {
            self.animation_state = AnimationState::Idle;
        }
    }

    pub fn update(&mut self, queue: &wgpu::Queue) {
        if let AnimationState::Animating(session) = &mut self.animation_state {
            session.prev_time = Some(session.now);
            session.now = instant::Instant::now();
        }

        let dt = match &self.animation_state {
            AnimationState::Idle
            | AnimationState::Animating(AnimationSession {
                prev_time: None, ..
            }) => instant::Duration::ZERO,
            AnimationState::Animating(AnimationSession {
                prev_time: Some(prev_time),
                now,
                ..
            }) => *now - *prev_time,
        };

        self.camera_controller.update_camera(&mut self.camera, dt);
        self.camera_uniform
            .update_view_proj(&self.camera, &self.projection);
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera_uniform]),
        );

        self.pending_draws.clear();
        let mut nodes_visited = 0;
        let mut draw_calls = 0;
        {
            let model = &self.model;
            let gpu = &self.scene_gpu;
            let pending = &mut self.pending_draws;
            if let Some(scene) = model.default_scene() {
                scene::visit_scene(model, scene, |index, world| {
                    nodes_visited += 1;
                    let mesh = match model.nodes[index].mesh {
                        Some(mesh) => mesh,
                        None => return,
                    };
                    let uniforms = match &gpu.node_uniforms[index] {
                        Some(uniforms) => uniforms,
                        None => return,
                    };

                    let rs = Matrix3::from_cols(
                        world.x.truncate(),
                        world.y.truncate(),
                        world.z.truncate(),
                    );
                    let normal_mat = rs
                        .invert()
                        .map(|inverse| inverse.transpose())
                        .unwrap_or_else(Matrix3::identity);
                    let node_uniform = NodeUniform {
                        model_mat: world.into(),
                        normal_mat: Matrix4::from(normal_mat).into(),
                    };
                    queue.write_buffer(&uniforms.buffer, 0, bytemuck::cast_slice(&[node_uniform]));

                    draw_calls += gpu.table[gpu.ranges[mesh].range()]
                        .iter()
                        .filter(|binding| binding.is_drawable())
                        .count();
                    pending.push((index, mesh));
                });
            }
        }
        self.stats.nodes_visited = nodes_visited;
        self.stats.draw_calls = draw_calls;
    }

    pub fn render(&self, device: &wgpu::Device) -> wgpu::CommandBuffer {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.08,
                            g: 0.08,
                            b: 0.1,
                            a: 1.0,
                        }),
                        store: true,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_target.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: true,
                    }),
                    stencil_ops: None,
                }),
            });
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

            let gpu = &self.scene_gpu;
            for &(node, mesh) in &self.pending_draws {
                let uniforms = match &gpu.node_uniforms[node] {
                    Some(uniforms) => uniforms,
                    None => continue,
                };
                render_pass.set_bind_group(1, &uniforms.bind_group, &[]);

                for binding in &gpu.table[gpu.ranges[mesh].range()] {
                    if !binding.is_drawable() {
                        continue;
                    }
                    let pipeline = match self.pipelines.get(&binding.layout_key()) {
                        Some(pipeline) => pipeline,
                        None => continue,
                    };
                    render_pass.set_pipeline(pipeline);

                    for (slot, attribute) in binding.attributes.iter().enumerate() {
                        match attribute {
                            Some(attribute) => render_pass.set_vertex_buffer(
                                slot as u32,
                                gpu.buffers[attribute.buffer].slice(attribute.offset..),
                            ),
                            None => {
                                render_pass.set_vertex_buffer(slot as u32, gpu.fallback.slice(..))
                            }
                        }
                    }

                    match &binding.indices {
                        Some(indices) => {
                            let end = indices.offset + indices.byte_len();
                            render_pass.set_index_buffer(
                                gpu.buffers[indices.buffer].slice(indices.offset..end),
                                indices.format,
                            );
                            render_pass.draw_indexed(0..indices.count, 0, 0..1);
                        }
                        None => render_pass.draw(0..binding.vertex_count, 0..1),
                    }
                }
            }
        }
        encoder.finish()
    }

    /// Copies the color target back to the host as tightly packed RGBA rows.
    pub fn read_color_target(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Vec<u8>, ReadbackError> {
        let width = self.target_width;
        let height = self.target_height;
        let unpadded_bytes_per_row = width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = (unpadded_bytes_per_row + align - 1) / align * align;

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame readback"),
            size: padded_bytes_per_row as u64 * height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            self.color_target.texture.as_image_copy(),
            wgpu::ImageCopyBuffer {
                buffer: &staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: NonZeroU32::new(padded_bytes_per_row),
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        device.poll(wgpu::Maintain::Wait);
        receiver.recv().map_err(|_| ReadbackError::DeviceLost)??;

        let mut pixels = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
        {
            let mapped = slice.get_mapped_range();
            for row in mapped.chunks(padded_bytes_per_row as usize) {
                pixels.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
            }
        }
        staging.unmap();
        Ok(pixels)
    }

    pub fn color_texture_view(&self) -> &wgpu::TextureView {
        &self.color_target.view
    }

    pub fn target_size(&self) -> (u32, u32) {
        (self.target_width, self.target_height)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn model(&self) -> &SceneModel {
        &self.model
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}

fn create_shader(device: &wgpu::Device, label: &str, source: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}

fn create_node_uniforms(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
) -> NodeUniformGpu {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Node Uniform Buffer"),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        size: std::mem::size_of::<NodeUniform>() as wgpu::BufferAddress,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
        label: Some("node_bind_group"),
    });
    NodeUniformGpu { buffer, bind_group }
}

/// Shared buffer behind disabled slots, zero-filled and sized for the widest
/// fallback layout at the largest vertex count in the table.
fn create_fallback_buffer(device: &wgpu::Device, table: &[PrimitiveBinding]) -> wgpu::Buffer {
    let max_vertices = table
        .iter()
        .map(|binding| binding.vertex_count as u64)
        .max()
        .unwrap_or(0)
        .max(1);
    let widest_stride = mesh::SLOT_FALLBACKS
        .iter()
        .map(|slot| slot.stride)
        .max()
        .unwrap_or(12);
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("disabled slot fallback"),
        contents: &vec![0u8; (max_vertices * widest_stride) as usize],
        usage: wgpu::BufferUsages::VERTEX,
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    vertex_shader: &wgpu::ShaderModule,
    fragment_shader: &wgpu::ShaderModule,
    key: &LayoutKey,
) -> wgpu::RenderPipeline {
    let attributes: Vec<[wgpu::VertexAttribute; 1]> = key
        .slots
        .iter()
        .enumerate()
        .map(|(slot, slot_layout)| {
            [wgpu::VertexAttribute {
                offset: 0,
                shader_location: slot as u32,
                format: slot_layout.format,
            }]
        })
        .collect();
    let buffers: Vec<wgpu::VertexBufferLayout> = key
        .slots
        .iter()
        .zip(&attributes)
        .map(|(slot_layout, attributes)| wgpu::VertexBufferLayout {
            array_stride: slot_layout.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        })
        .collect();

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Render Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: vertex_shader,
            entry_point: "vs_main",
            buffers: &buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment_shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: target::COLOR_FORMAT,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: key.topology,
            strip_index_format: key.strip_indices,
            front_face: wgpu::FrontFace::Ccw,
            // Scenes routinely mix winding orders and mirrored transforms, so
            // show both faces like a viewer should.
            cull_mode: None,

            polygon_mode: wgpu::PolygonMode::Fill,

            unclipped_depth: false,

            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: target::DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

#[derive(Debug)]
pub enum InputEvent {
    KeyPressing(AbstractKey),
    KeyUp(AbstractKey),
    MouseWheel { delta_x: f32, delta_y: f32 },
    MouseLeftDown,
    MouseLeftUp,
    MouseMove { delta_x: f32, delta_y: f32 },
}

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum AbstractKey {
    CameraMoveForward,
    CameraMoveBackward,
    CameraMoveLeft,
    CameraMoveRight,
    CameraMoveDown,
    CameraMoveUp,
}

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum AbstractMouseButton {
    Primary,
    Secondary,
    Middle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_animation_session_tracks_pressed_state() {
        let mut state = AnimationState::Idle;
        assert!(state.animation_session().is_none());

        let mut session = AnimationSession::default();
        session.pressing_keys.insert(AbstractKey::CameraMoveForward);
        state = AnimationState::Animating(session);
        assert!(!state.must_be_idle());

        if let AnimationState::Animating(session) = &mut state {
            session.pressing_keys.clear();
        }
        assert!(state.must_be_idle());
    }

    #[test]
    fn test_camera_uniform_composes_projection_and_view() {
        let camera = Camera::new(Point3::new(0.0, 0.0, 5.0), Rad(-std::f32::consts::FRAC_PI_2), Rad(0.0));
        let projection = Projection::new(640, 480, Deg(45.0), 0.1, 100.0);
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, &projection);

        assert_eq!(uniform.view_position, [0.0, 0.0, 5.0, 1.0]);
        let expected: [[f32; 4]; 4] = (projection.calc_matrix() * camera.calc_matrix()).into();
        assert_eq!(uniform.view_proj, expected);
        assert!((uniform.view_front[2] + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_default_options() {
        let options = EngineOptions::default();
        assert_eq!((options.width, options.height), (1280, 720));
        assert!(options.camera_pose.is_none());
        assert!(options.vertex_shader.is_none() && options.fragment_shader.is_none());
    }
}
