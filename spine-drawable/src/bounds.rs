use glam::Vec2;
use spine2d::{AttachmentData, Skeleton};

/// Axis-aligned bounding box in skeleton world space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = [f32; 2]>) -> Option<Self> {
        let mut points = points.into_iter().map(Vec2::from);
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Bounds of every bounding-box attachment currently shown by the skeleton.
///
/// Returns `None` when no slot displays a bounding-box attachment.
pub fn skeleton_bounds(skeleton: &Skeleton) -> Option<Aabb> {
    let mut out: Option<Aabb> = None;

    for (slot_index, slot) in skeleton.slots.iter().enumerate() {
        if !matches!(
            skeleton.slot_attachment_data(slot_index),
            Some(AttachmentData::BoundingBox(_))
        ) {
            continue;
        }
        if !skeleton.bones.get(slot.bone).is_some_and(|b| b.active) {
            continue;
        }

        let Some(world) = skeleton.slot_vertex_attachment_world_vertices(slot_index) else {
            continue;
        };
        let points = world.chunks_exact(2).map(|p| [p[0], p[1]]);
        if let Some(polygon) = Aabb::from_points(points) {
            out = Some(match out {
                Some(acc) => acc.union(&polygon),
                None => polygon,
            });
        }
    }

    out
}

/// Bounds of all active bone origins; the fallback when nothing is visible.
pub fn bone_bounds(skeleton: &Skeleton) -> Option<Aabb> {
    Aabb::from_points(
        skeleton
            .bones
            .iter()
            .filter(|b| b.active)
            .map(|b| [b.world_x, b.world_y]),
    )
}
