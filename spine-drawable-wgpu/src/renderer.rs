use crate::texture::{GpuTexture, create_texture_bind_group};
use glam::{Mat4, Vec3};
use spine2d::BlendMode;
use spine_drawable::{DrawCommand, DrawSink, Primitive, Vertex};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Globals {
    clip_from_world: [[f32; 4]; 4],
}

/// A draw call recorded by [`FrameRecorder`], with indices into the frame-wide buffers.
#[derive(Clone, Debug)]
pub struct RecordedDraw {
    pub texture: Option<GpuTexture>,
    pub blend: BlendMode,
    pub premultiplied_alpha: bool,
    pub primitive: Primitive,
    pub first_index: u32,
    pub index_count: u32,
}

/// Collects the geometry of every drawable drawn during a frame into one vertex and index
/// buffer.
///
/// Model transforms and tints are baked into the vertices, so drawables with different
/// transforms share the same buffers and camera uniform.
#[derive(Debug, Default)]
pub struct FrameRecorder {
    vertices: Vec<GpuVertex>,
    indices: Vec<u32>,
    draws: Vec<RecordedDraw>,
    mesh_vertices: Vec<Vertex>,
    mesh_indices: Vec<u16>,
    placed: Option<Placement>,
}

#[derive(Copy, Clone, Debug)]
struct Placement {
    transform: Mat4,
    color: [f32; 4],
    base_vertex: u32,
    base_index: u32,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new frame.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.draws.clear();
        self.mesh_vertices.clear();
        self.mesh_indices.clear();
        self.placed = None;
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn vertices(&self) -> &[GpuVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    fn place(&mut self, transform: Mat4, color: [f32; 4]) -> Placement {
        let placement = Placement {
            transform,
            color,
            base_vertex: self.vertices.len() as u32,
            base_index: self.indices.len() as u32,
        };

        self.vertices.extend(self.mesh_vertices.iter().map(|v| {
            let p = transform.transform_point3(Vec3::new(v.position[0], v.position[1], 0.0));
            let mut rgba = [0.0f32; 4];
            for (i, channel) in rgba.iter_mut().enumerate() {
                *channel = f32::from(v.color[i]) / 255.0 * color[i];
            }
            GpuVertex {
                position: [p.x, p.y],
                uv: v.uv,
                color: rgba,
            }
        }));
        self.indices.extend(
            self.mesh_indices
                .iter()
                .map(|&i| placement.base_vertex + u32::from(i)),
        );

        self.placed = Some(placement);
        placement
    }

    /// Premultiplied pages need the tint alpha folded into RGB as well.
    fn premultiply_tint(&mut self, first_index: u32, index_count: u32, alpha: f32) {
        let range = first_index as usize..(first_index + index_count) as usize;
        let Some(indices) = self.indices.get(range) else {
            return;
        };
        let (Some(&lo), Some(&hi)) = (indices.iter().min(), indices.iter().max()) else {
            return;
        };
        if let Some(vertices) = self.vertices.get_mut(lo as usize..=hi as usize) {
            for v in vertices {
                v.color[0] *= alpha;
                v.color[1] *= alpha;
                v.color[2] *= alpha;
            }
        }
    }
}

impl DrawSink<GpuTexture> for FrameRecorder {
    fn upload_mesh(&mut self, vertices: &[Vertex], indices: &[u16]) {
        self.mesh_vertices.clear();
        self.mesh_vertices.extend_from_slice(vertices);
        self.mesh_indices.clear();
        self.mesh_indices.extend_from_slice(indices);
        self.placed = None;
    }

    fn add_draw_command(&mut self, command: DrawCommand<'_, GpuTexture>) {
        let end = command.first_index + command.index_count;
        if command.index_count == 0 || end > self.mesh_indices.len() {
            log::warn!(
                "ignoring draw command for indices {}..{} of a {}-index mesh",
                command.first_index,
                end,
                self.mesh_indices.len()
            );
            return;
        }

        let placement = match self.placed {
            Some(p) if p.transform == command.transform && p.color == command.color => p,
            _ => self.place(command.transform, command.color),
        };

        let first_index = placement.base_index + command.first_index as u32;
        let index_count = command.index_count as u32;
        if command.premultiplied_alpha && command.color[3] != 1.0 {
            self.premultiply_tint(first_index, index_count, command.color[3]);
        }

        self.draws.push(RecordedDraw {
            texture: command.texture.cloned(),
            blend: command.blend,
            premultiplied_alpha: command.premultiplied_alpha,
            primitive: command.primitive,
            first_index,
            index_count,
        });
    }
}

/// Renders [`FrameRecorder`] contents with one pipeline per blend mode and alpha convention,
/// plus a line-list pipeline for wireframes.
pub struct SpineRenderer {
    pipelines: Pipelines,
    pipelines_pma: Pipelines,
    wireframe: wgpu::RenderPipeline,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    white: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    index_capacity: usize,
}

struct Pipelines {
    normal: wgpu::RenderPipeline,
    additive: wgpu::RenderPipeline,
    multiply: wgpu::RenderPipeline,
    screen: wgpu::RenderPipeline,
}

impl Pipelines {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        color_format: wgpu::TextureFormat,
        premultiplied_alpha: bool,
    ) -> Self {
        let create = |blend| {
            create_pipeline(
                device,
                layout,
                shader,
                color_format,
                blend,
                premultiplied_alpha,
                wgpu::PrimitiveTopology::TriangleList,
            )
        };
        Self {
            normal: create(BlendMode::Normal),
            additive: create(BlendMode::Additive),
            multiply: create(BlendMode::Multiply),
            screen: create(BlendMode::Screen),
        }
    }

    fn get(&self, blend: BlendMode) -> &wgpu::RenderPipeline {
        match blend {
            BlendMode::Normal => &self.normal,
            BlendMode::Additive => &self.additive,
            BlendMode::Multiply => &self.multiply,
            BlendMode::Screen => &self.screen,
        }
    }
}

impl SpineRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("spine-drawable shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let globals_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("spine globals layout"),
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
            });

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("spine page layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("spine-drawable pipeline layout"),
            bind_group_layouts: &[&globals_bind_group_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipelines = Pipelines::new(device, &pipeline_layout, &shader, color_format, false);
        let pipelines_pma = Pipelines::new(device, &pipeline_layout, &shader, color_format, true);
        let wireframe = create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            color_format,
            BlendMode::Normal,
            false,
            wgpu::PrimitiveTopology::LineList,
        );

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("spine globals"),
            contents: bytemuck::bytes_of(&Globals {
                clip_from_world: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("spine globals bind group"),
            layout: &globals_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let white = create_white_bind_group(device, queue, &texture_bind_group_layout);

        let vertex_capacity = 1024;
        let index_capacity = 2048;
        let vertex_buffer = create_vertex_buffer(device, vertex_capacity);
        let index_buffer = create_index_buffer(device, index_capacity);

        Self {
            pipelines,
            pipelines_pma,
            wireframe,
            globals_buffer,
            globals_bind_group,
            texture_bind_group_layout,
            white,
            vertex_buffer,
            index_buffer,
            vertex_capacity,
            index_capacity,
        }
    }

    pub fn texture_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.texture_bind_group_layout
    }

    /// Maps world units to pixels with the origin at the centre of a `width` x `height` target.
    pub fn update_globals_ortho_centered(&self, queue: &wgpu::Queue, width: f32, height: f32) {
        let half_w = width.max(1.0) * 0.5;
        let half_h = height.max(1.0) * 0.5;
        let clip_from_world = Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, -1.0, 1.0);
        self.update_globals_matrix(queue, clip_from_world);
    }

    pub fn update_globals_matrix(&self, queue: &wgpu::Queue, clip_from_world: Mat4) {
        let globals = Globals {
            clip_from_world: clip_from_world.to_cols_array_2d(),
        };
        queue.write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));
    }

    /// Uploads the recorded frame. Call before beginning the render pass.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, frame: &FrameRecorder) {
        if frame.is_empty() {
            return;
        }
        self.ensure_buffers(device, frame.vertices.len(), frame.indices.len());
        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&frame.vertices));
        queue.write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&frame.indices));
    }

    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>, frame: &FrameRecorder) {
        if frame.is_empty() {
            return;
        }

        pass.set_bind_group(0, &self.globals_bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

        for draw in &frame.draws {
            let pipeline = match (draw.primitive, draw.premultiplied_alpha) {
                (Primitive::Lines, _) => &self.wireframe,
                (Primitive::Triangles, true) => self.pipelines_pma.get(draw.blend),
                (Primitive::Triangles, false) => self.pipelines.get(draw.blend),
            };
            pass.set_pipeline(pipeline);
            let bind_group = match &draw.texture {
                Some(texture) => texture.bind_group(),
                None => &self.white,
            };
            pass.set_bind_group(1, bind_group, &[]);
            pass.draw_indexed(draw.first_index..draw.first_index + draw.index_count, 0, 0..1);
        }
    }

    fn ensure_buffers(&mut self, device: &wgpu::Device, vertices: usize, indices: usize) {
        if vertices > self.vertex_capacity {
            self.vertex_capacity = grown_capacity(self.vertex_capacity, vertices);
            self.vertex_buffer = create_vertex_buffer(device, self.vertex_capacity);
        }
        if indices > self.index_capacity {
            self.index_capacity = grown_capacity(self.index_capacity, indices);
            self.index_buffer = create_index_buffer(device, self.index_capacity);
        }
    }
}

pub(crate) fn grown_capacity(mut capacity: usize, required: usize) -> usize {
    capacity = capacity.max(1);
    while capacity < required {
        capacity *= 2;
    }
    capacity
}

fn create_vertex_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("spine vertices"),
        size: (capacity * std::mem::size_of::<GpuVertex>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("spine indices"),
        size: (capacity * std::mem::size_of::<u32>()) as u64,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_white_bind_group(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> wgpu::BindGroup {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("spine white pixel"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &[255, 255, 255, 255],
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("spine white sampler"),
        ..Default::default()
    });
    create_texture_bind_group(device, layout, &view, &sampler)
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    color_format: wgpu::TextureFormat,
    blend: BlendMode,
    premultiplied_alpha: bool,
    topology: wgpu::PrimitiveTopology,
) -> wgpu::RenderPipeline {
    let label =
        format!("spine-drawable {blend:?} {topology:?} pipeline (pma: {premultiplied_alpha})");

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<GpuVertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![
                    0 => Float32x2,
                    1 => Float32x2,
                    2 => Float32x4
                ],
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(blend_state(blend, premultiplied_alpha)),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Colour factors follow the Spine blend mode table; alpha always uses `One` as the source
/// factor.
pub(crate) fn blend_state(blend: BlendMode, premultiplied_alpha: bool) -> wgpu::BlendState {
    use wgpu::{BlendComponent, BlendFactor, BlendOperation};

    let src_alpha_or_one = if premultiplied_alpha {
        BlendFactor::One
    } else {
        BlendFactor::SrcAlpha
    };
    let (src_color, dst) = match blend {
        BlendMode::Normal => (src_alpha_or_one, BlendFactor::OneMinusSrcAlpha),
        BlendMode::Additive => (src_alpha_or_one, BlendFactor::One),
        BlendMode::Multiply => (BlendFactor::Dst, BlendFactor::OneMinusSrcAlpha),
        BlendMode::Screen => (BlendFactor::One, BlendFactor::OneMinusSrc),
    };

    wgpu::BlendState {
        color: BlendComponent {
            src_factor: src_color,
            dst_factor: dst,
            operation: BlendOperation::Add,
        },
        alpha: BlendComponent {
            src_factor: BlendFactor::One,
            dst_factor: dst,
            operation: BlendOperation::Add,
        },
    }
}

const SHADER: &str = r#"
struct Globals {
  clip_from_world: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

struct VsIn {
  @location(0) position: vec2<f32>,
  @location(1) uv: vec2<f32>,
  @location(2) color: vec4<f32>,
};

struct VsOut {
  @builtin(position) position: vec4<f32>,
  @location(0) uv: vec2<f32>,
  @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(in: VsIn) -> VsOut {
  var out: VsOut;
  out.position = globals.clip_from_world * vec4<f32>(in.position, 0.0, 1.0);
  out.uv = in.uv;
  out.color = in.color;
  return out;
}

@group(1) @binding(0)
var tex: texture_2d<f32>;

@group(1) @binding(1)
var samp: sampler;

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
  return textureSample(tex, samp, in.uv) * in.color;
}
"#;
