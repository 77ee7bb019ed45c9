//! Skeleton visualization as line segments.

use crate::skeleton::Skeleton;
use crate::{Mat4, Vec3};

/// Color of bone wireframes.
pub const BONE_COLOR: [f32; 3] = [1.0, 1.0, 0.0];

const SEGMENTS_PER_BONE: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSegment {
    pub start: Vec3,
    pub end: Vec3,
}

impl LineSegment {
    #[inline]
    pub const fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }
}

/// Diamond wireframe from a child joint to its parent, widened along the
/// parent's Y and Z axes by a tenth of the bone length.
pub fn bone_wireframe(model: &Mat4, parent_model: &Mat4) -> [LineSegment; SEGMENTS_PER_BONE] {
    let p0 = model.w_axis.truncate();
    let p1 = parent_model.w_axis.truncate();
    let ny = parent_model.y_axis.truncate();
    let nz = parent_model.z_axis.truncate();

    let len = (p1 - p0).length() * 0.1;
    let mid = p0 + (p1 - p0) * 0.66;
    let p2 = mid + ny * len;
    let p3 = mid + nz * len;
    let p4 = mid - ny * len;
    let p5 = mid - nz * len;

    let l = LineSegment::new;
    [
        l(p0, p2),
        l(p0, p3),
        l(p0, p4),
        l(p0, p5),
        l(p1, p2),
        l(p1, p3),
        l(p1, p4),
        l(p1, p5),
        l(p2, p3),
        l(p3, p4),
        l(p4, p5),
        l(p5, p2),
    ]
}

/// Append one wireframe per non-root joint to `out` (cleared first).
pub fn skeleton_lines(skeleton: &Skeleton, models: &[Mat4], out: &mut Vec<LineSegment>) {
    out.clear();
    for (joint, model) in models.iter().enumerate().take(skeleton.num_joints()) {
        let Some(parent) = skeleton.parent(joint) else {
            continue;
        };
        if let Some(parent_model) = models.get(parent) {
            out.extend_from_slice(&bone_wireframe(model, parent_model));
        }
    }
}
