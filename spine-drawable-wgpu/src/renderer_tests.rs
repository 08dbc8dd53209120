use crate::FrameRecorder;
use crate::renderer::{blend_state, grown_capacity};
use glam::{Mat4, Vec3};
use spine2d::BlendMode;
use spine_drawable::{DrawCommand, DrawSink, Primitive, Vertex};

fn quad() -> (Vec<Vertex>, Vec<u16>) {
    let vertex = |x: f32, y: f32| Vertex {
        position: [x, y],
        uv: [0.0, 0.0],
        color: [255, 255, 255, 128],
    };
    (
        vec![
            vertex(1.0, -1.0),
            vertex(-1.0, -1.0),
            vertex(-1.0, 1.0),
            vertex(1.0, 1.0),
        ],
        vec![0, 1, 2, 2, 3, 0],
    )
}

fn command<'a>(
    first_index: usize,
    index_count: usize,
    transform: Mat4,
    color: [f32; 4],
    premultiplied_alpha: bool,
) -> DrawCommand<'a, crate::GpuTexture> {
    DrawCommand {
        texture: None,
        blend: BlendMode::Normal,
        premultiplied_alpha,
        primitive: Primitive::Triangles,
        first_index,
        index_count,
        transform,
        color,
    }
}

#[test]
fn recorder_bakes_transform_and_tint() {
    let (vertices, indices) = quad();
    let mut frame = FrameRecorder::new();
    let transform = Mat4::from_translation(Vec3::new(10.0, 20.0, 0.0));

    frame.upload_mesh(&vertices, &indices);
    frame.add_draw_command(command(0, 6, transform, [1.0, 0.5, 1.0, 1.0], false));

    let v = frame.vertices()[0];
    assert_eq!(v.position, [11.0, 19.0]);
    assert!((v.color[1] - 0.5).abs() < 1.0e-6);
    assert!((v.color[3] - 128.0 / 255.0).abs() < 1.0e-6);
    assert_eq!(frame.draws().len(), 1);
    assert!(frame.draws()[0].texture.is_none());
}

#[test]
fn recorder_rebases_indices_across_meshes() {
    let (vertices, indices) = quad();
    let mut frame = FrameRecorder::new();

    frame.upload_mesh(&vertices, &indices);
    frame.add_draw_command(command(0, 6, Mat4::IDENTITY, [1.0; 4], false));
    frame.upload_mesh(&vertices, &indices);
    frame.add_draw_command(command(0, 3, Mat4::IDENTITY, [1.0; 4], false));
    frame.add_draw_command(command(3, 3, Mat4::IDENTITY, [1.0; 4], false));

    assert_eq!(frame.vertices().len(), 8);
    assert_eq!(&frame.indices()[6..], &[4, 5, 6, 6, 7, 4]);

    let draws = frame.draws();
    assert_eq!(draws.len(), 3);
    assert_eq!((draws[1].first_index, draws[1].index_count), (6, 3));
    assert_eq!((draws[2].first_index, draws[2].index_count), (9, 3));
}

#[test]
fn recorder_premultiplies_tint_alpha_for_pma_batches() {
    let (vertices, indices) = quad();
    let mut frame = FrameRecorder::new();

    frame.upload_mesh(&vertices, &indices);
    frame.add_draw_command(command(0, 6, Mat4::IDENTITY, [1.0, 1.0, 1.0, 0.5], true));

    let v = frame.vertices()[2];
    assert!((v.color[0] - 0.5).abs() < 1.0e-6);
    assert!((v.color[3] - 0.5 * 128.0 / 255.0).abs() < 1.0e-6);
}

#[test]
fn recorder_ignores_out_of_range_commands_and_clears() {
    let (vertices, indices) = quad();
    let mut frame = FrameRecorder::new();

    frame.upload_mesh(&vertices, &indices);
    frame.add_draw_command(command(3, 6, Mat4::IDENTITY, [1.0; 4], false));
    assert!(frame.is_empty());
    assert!(frame.vertices().is_empty());

    frame.add_draw_command(command(0, 6, Mat4::IDENTITY, [1.0; 4], false));
    assert!(!frame.is_empty());

    frame.clear();
    assert!(frame.is_empty());
    assert!(frame.indices().is_empty());
}

#[test]
fn recorder_keeps_line_primitives_for_wireframes() {
    let (vertices, _) = quad();
    let lines = [0, 1, 1, 2, 2, 0, 2, 3, 3, 0, 0, 2];
    let mut frame = FrameRecorder::new();

    frame.upload_mesh(&vertices, &lines);
    frame.add_draw_command(DrawCommand {
        primitive: Primitive::Lines,
        ..command(0, lines.len(), Mat4::IDENTITY, [0.0, 1.0, 0.0, 1.0], false)
    });

    let draws = frame.draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].primitive, Primitive::Lines);
    assert_eq!(draws[0].index_count, 12);
    assert_eq!(frame.indices(), &lines.map(u32::from));
    assert_eq!(frame.vertices()[0].color[0], 0.0);
    assert_eq!(frame.vertices()[0].color[1], 1.0);
}

#[test]
fn blend_states_follow_spine_blend_modes() {
    use wgpu::BlendFactor;

    let normal = blend_state(BlendMode::Normal, false);
    assert_eq!(normal.color.src_factor, BlendFactor::SrcAlpha);
    assert_eq!(normal.color.dst_factor, BlendFactor::OneMinusSrcAlpha);
    assert_eq!(normal.alpha.src_factor, BlendFactor::One);

    let normal_pma = blend_state(BlendMode::Normal, true);
    assert_eq!(normal_pma.color.src_factor, BlendFactor::One);

    let additive = blend_state(BlendMode::Additive, false);
    assert_eq!(additive.color.dst_factor, BlendFactor::One);

    let multiply = blend_state(BlendMode::Multiply, true);
    assert_eq!(multiply.color.src_factor, BlendFactor::Dst);

    let screen = blend_state(BlendMode::Screen, false);
    assert_eq!(screen.color.src_factor, BlendFactor::One);
    assert_eq!(screen.color.dst_factor, BlendFactor::OneMinusSrc);
}

#[test]
fn buffer_capacity_doubles_until_it_fits() {
    assert_eq!(grown_capacity(1024, 1000), 1024);
    assert_eq!(grown_capacity(1024, 1025), 2048);
    assert_eq!(grown_capacity(1024, 5000), 8192);
}
