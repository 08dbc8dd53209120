use crate::Aabb;
use spine2d::{Atlas, BlendMode, DrawList, Skeleton};

/// Largest vertex count addressable by the 16-bit index buffer.
pub const MAX_MESH_VERTICES: usize = u16::MAX as usize + 1;

/// Position, texture coordinate and 8-bit RGBA colour.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [u8; 4],
}

/// Render state shared by a run of triangles. `page: None` means no atlas page backs the
/// geometry and the host should bind a white texture.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Material {
    pub page: Option<usize>,
    pub blend: BlendMode,
    pub premultiplied_alpha: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MeshBatch {
    pub material: Material,
    pub first_index: usize,
    pub index_count: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpineMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
    pub batches: Vec<MeshBatch>,
}

impl SpineMesh {
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.batches.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices.iter().map(|v| v.position))
    }

    /// Replaces `out` with a line list holding the three edges of every triangle.
    pub fn wireframe_indices(&self, out: &mut Vec<u16>) {
        out.clear();
        out.reserve(self.indices.len() * 2);
        for triangle in self.indices.chunks_exact(3) {
            let (a, b, c) = (triangle[0], triangle[1], triangle[2]);
            out.extend_from_slice(&[a, b, b, c, c, a]);
        }
    }
}

/// Converts the runtime's draw list for a posed skeleton into a [`SpineMesh`].
///
/// World positions, page UVs, tint and clipping come from `spine2d`. The builder narrows them to
/// 16-bit indices and 8-bit colour, keys batches by atlas page, and enforces the vertex budget.
/// Scratch storage is kept between frames so steady-state builds do not allocate.
#[derive(Clone, Debug)]
pub struct MeshBuilder {
    max_vertices: usize,
    draws: DrawList,
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self::new(MAX_MESH_VERTICES)
    }
}

impl MeshBuilder {
    pub fn new(max_vertices: usize) -> Self {
        Self {
            max_vertices: max_vertices.clamp(4, MAX_MESH_VERTICES),
            draws: DrawList::default(),
        }
    }

    pub fn max_vertices(&self) -> usize {
        self.max_vertices
    }

    /// Clears `out` and fills it with the skeleton's visible geometry in draw order.
    pub fn build(&mut self, out: &mut SpineMesh, skeleton: &Skeleton, atlas: &Atlas) {
        out.clear();
        if skeleton.color[3] <= 0.0 {
            return;
        }

        self.draws.clear();
        spine2d::append_draw_list_with_atlas(&mut self.draws, skeleton, atlas);

        for draw in &self.draws.draws {
            let material = Material {
                page: page_index(atlas, &draw.texture_path),
                blend: draw.blend,
                premultiplied_alpha: draw.premultiplied_alpha,
            };
            let range = draw.first_index..draw.first_index + draw.index_count;
            let Some(indices) = self.draws.indices.get(range) else {
                log::warn!(
                    "skipping draw for '{}': index range out of bounds",
                    draw.texture_path
                );
                continue;
            };
            append_draw(out, material, &self.draws.vertices, indices, self.max_vertices);
        }
    }
}

pub fn build_mesh(skeleton: &Skeleton, atlas: &Atlas) -> SpineMesh {
    let mut out = SpineMesh::default();
    MeshBuilder::default().build(&mut out, skeleton, atlas);
    out
}

/// Missing regions are drawn under the attachment path, which names no page.
fn page_index(atlas: &Atlas, texture_path: &str) -> Option<usize> {
    atlas.pages.iter().position(|page| page.name == texture_path)
}

/// Splits one runtime draw into the runs of triangles each attachment produced and appends
/// them. Attachments append their vertices contiguously, so a triangle that only references
/// vertices past the current run starts the next one.
fn append_draw(
    out: &mut SpineMesh,
    material: Material,
    vertices: &[spine2d::Vertex],
    indices: &[u32],
    max_vertices: usize,
) {
    let mut start = 0;
    let mut lo = u32::MAX;
    let mut hi = 0;

    for (t, triangle) in indices.chunks(3).enumerate() {
        let (t_lo, t_hi) = triangle
            .iter()
            .fold((u32::MAX, 0), |(lo, hi), &i| (lo.min(i), hi.max(i)));
        let at = t * 3;
        if at > start && t_lo > hi {
            append_run(out, material, vertices, &indices[start..at], (lo, hi), max_vertices);
            start = at;
            lo = t_lo;
            hi = t_hi;
        } else {
            lo = lo.min(t_lo);
            hi = hi.max(t_hi);
        }
    }

    if start < indices.len() {
        append_run(out, material, vertices, &indices[start..], (lo, hi), max_vertices);
    }
}

fn append_run(
    out: &mut SpineMesh,
    material: Material,
    vertices: &[spine2d::Vertex],
    indices: &[u32],
    (lo, hi): (u32, u32),
    max_vertices: usize,
) {
    let (lo, hi) = (lo as usize, hi as usize);
    let Some(run) = vertices.get(lo..=hi) else {
        log::warn!(
            "skipping geometry: vertex {hi} out of range for {} vertices",
            vertices.len()
        );
        return;
    };

    let base = out.vertices.len();
    if base + run.len() > max_vertices {
        log::warn!(
            "skipping {} vertices: mesh budget of {} exceeded",
            run.len(),
            max_vertices
        );
        return;
    }

    out.vertices.extend(run.iter().map(|v| Vertex {
        position: v.position,
        uv: v.uv,
        color: quantize(v.color),
    }));
    push_triangles(
        out,
        material,
        indices.iter().map(|&i| (base + (i as usize - lo)) as u16),
    );
}

fn quantize(color: [f32; 4]) -> [u8; 4] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn push_triangles(out: &mut SpineMesh, material: Material, indices: impl Iterator<Item = u16>) {
    let first_index = out.indices.len();
    out.indices.extend(indices);
    let index_count = out.indices.len() - first_index;
    if index_count == 0 {
        return;
    }

    if let Some(last) = out.batches.last_mut() {
        if last.material == material && last.first_index + last.index_count == first_index {
            last.index_count += index_count;
            return;
        }
    }

    out.batches.push(MeshBatch {
        material,
        first_index,
        index_count,
    });
}
