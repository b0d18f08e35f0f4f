use std::cmp::Ordering;
use std::f64::consts::{PI, TAU};

use crate::math::Vector3;
use crate::topology::EdgeId;

/// Angles closer than this are taken as coincident faces.
pub const ANGLE_TOLERANCE: f64 = 1e-9;

/// Radial position of one half-edge around a shared (non-manifold) edge.
///
/// The angle is that of the face's inward direction, measured about the
/// canonical axis of the shared edge (from its smaller vertex key to its
/// larger one).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeOrderData {
    /// The half-edge.
    pub edge: EdgeId,
    /// Dense index of the owning face within the stitching call.
    pub face_index: usize,
    /// Shell group of the owning face when the ordering was taken.
    ///
    /// Only a tie-break between coincident faces running the same way;
    /// pairing itself looks at `face_index`, so faces already in one shell
    /// may still be paired across another wedge.
    pub group: usize,
    /// Angle of the face around the axis, in `(-pi, pi]`.
    pub angle: f64,
    /// `true` if the half-edge runs against the canonical axis.
    pub is_reversed: bool,
}

impl EdgeOrderData {
    /// Total order used to sort half-edges around their shared edge.
    ///
    /// Angle first. At equal angles forward edges come before reversed
    /// ones: two coincident faces with opposite normals face each other, so
    /// the zero-width wedge between them is empty and each face stays next
    /// to the material it bounds. Group and edge key make the order total.
    #[must_use]
    pub fn radial_cmp(&self, other: &Self) -> Ordering {
        self.angle
            .total_cmp(&other.angle)
            .then_with(|| self.is_reversed.cmp(&other.is_reversed))
            .then_with(|| self.group.cmp(&other.group))
            .then_with(|| self.edge.cmp(&other.edge))
    }
}

/// Orthonormal frame `(u, v)` perpendicular to the unit `axis`, with
/// `u x v == axis`.
#[must_use]
pub fn radial_frame(axis: &Vector3) -> (Vector3, Vector3) {
    let reference = if axis.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = reference.cross(axis).normalize();
    let v = axis.cross(&u);
    (u, v)
}

/// Angle of a face around the shared edge.
///
/// `direction` is the unit direction of the half-edge and `normal` the face
/// normal; the face lies on the side `normal x direction` of the edge.
#[must_use]
pub fn radial_angle(normal: &Vector3, direction: &Vector3, frame: &(Vector3, Vector3)) -> f64 {
    let inward = normal.cross(direction);
    inward.dot(&frame.1).atan2(inward.dot(&frame.0))
}

/// Sorts half-edges around their shared edge.
///
/// Angles within [`ANGLE_TOLERANCE`] of each other, including across the
/// `-pi` / `pi` seam, are snapped together first so coincident faces tie
/// exactly and fall back to [`EdgeOrderData::radial_cmp`]'s tie-breaks.
pub fn sort_radially(order: &mut [EdgeOrderData]) {
    for entry in order.iter_mut() {
        if entry.angle < -PI + ANGLE_TOLERANCE {
            entry.angle += TAU;
        }
    }
    order.sort_by(EdgeOrderData::radial_cmp);

    let mut run_start = f64::NEG_INFINITY;
    for entry in order.iter_mut() {
        if entry.angle - run_start <= ANGLE_TOLERANCE {
            entry.angle = run_start;
        } else {
            run_start = entry.angle;
        }
    }
    order.sort_by(EdgeOrderData::radial_cmp);
}

/// Pairs half-edges that are radial neighbours across a wedge.
///
/// `sorted` must be in [`sort_radially`] order. A forward face
/// faces towards increasing angle and a reversed face towards decreasing
/// angle, so the wedge between entries `i` and `i + 1` lies behind both
/// faces (material) when `i` is reversed and `i + 1` forward, and in front
/// of both (empty) in the opposite case. Material wedges are paired unless
/// `avoid_cavities` is set, in which case empty wedges are.
///
/// The scan is cyclic from position zero; every entry is used at most once
/// and never with an entry of the same face. Returns index pairs into
/// `sorted`.
#[must_use]
pub fn pair_radially(sorted: &[EdgeOrderData], avoid_cavities: bool) -> Vec<(usize, usize)> {
    let n = sorted.len();
    let mut used = vec![false; n];
    let mut pairs = Vec::new();
    if n < 2 {
        return pairs;
    }

    for i in 0..n {
        let j = (i + 1) % n;
        if used[i] || used[j] || i == j {
            continue;
        }
        let (a, b) = (&sorted[i], &sorted[j]);
        let across = if avoid_cavities {
            !a.is_reversed && b.is_reversed
        } else {
            a.is_reversed && !b.is_reversed
        };
        if across && a.face_index != b.face_index {
            used[i] = true;
            used[j] = true;
            pairs.push((i, j));
        }
    }
    pairs
}
