use super::{Point2, Point3, Vector3, TOLERANCE};

/// Coordinate plane used to flatten a 3D polygon into 2D.
///
/// The dropped axis is the dominant component of the polygon normal, which
/// keeps the projected polygon as large (and as well conditioned) as possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Projection {
    /// Drops X, keeps `(y, z)`.
    Yz,
    /// Drops Y, keeps `(x, z)`.
    Xz,
    /// Drops Z, keeps `(x, y)`.
    Xy,
}

impl Projection {
    /// Picks the projection that drops the largest component of `normal`.
    #[must_use]
    pub fn from_normal(normal: &Vector3) -> Self {
        let ax = normal.x.abs();
        let ay = normal.y.abs();
        let az = normal.z.abs();
        if ax >= ay && ax >= az {
            Self::Yz
        } else if ay >= az {
            Self::Xz
        } else {
            Self::Xy
        }
    }
}

/// Flattens `point` onto the coordinate plane selected by `projection`.
#[must_use]
pub fn project(projection: Projection, point: &Point3) -> Point2 {
    match projection {
        Projection::Yz => Point2::new(point.y, point.z),
        Projection::Xz => Point2::new(point.x, point.z),
        Projection::Xy => Point2::new(point.x, point.y),
    }
}

/// Lifts a projected point back onto the plane `normal . p + d = 0`.
///
/// The dropped coordinate is solved from the plane equation. `projection`
/// must be the one chosen for `normal`, so the divisor is never near zero.
#[must_use]
pub fn unproject(projection: Projection, point: &Point2, normal: &Vector3, d: f64) -> Point3 {
    match projection {
        Projection::Yz => {
            let x = -(normal.y * point.x + normal.z * point.y + d) / normal.x;
            Point3::new(x, point.x, point.y)
        }
        Projection::Xz => {
            let y = -(normal.x * point.x + normal.z * point.y + d) / normal.y;
            Point3::new(point.x, y, point.y)
        }
        Projection::Xy => {
            let z = -(normal.x * point.x + normal.y * point.y + d) / normal.z;
            Point3::new(point.x, point.y, z)
        }
    }
}

/// Polygon normal by Newell's method.
///
/// The result is not normalized; its length is twice the polygon area.
/// Robust for non-convex and slightly non-planar loops.
#[must_use]
pub fn newell_normal(points: &[Point3]) -> Vector3 {
    let n = points.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
}

/// Unit normal and plane offset `d` (with `normal . p + d = 0`) of a polygon.
///
/// Returns `None` when the polygon is collinear or otherwise has no area.
/// The area is measured against the square of the longest edge, so the
/// test does not depend on the polygon's scale.
#[must_use]
pub fn polygon_plane(points: &[Point3]) -> Option<(Vector3, f64)> {
    if points.len() < 3 {
        return None;
    }
    let longest_sq = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| (b - a).norm_squared())
        .fold(0.0, f64::max);
    let normal = newell_normal(points);
    let len = normal.norm();
    if longest_sq == 0.0 || len <= TOLERANCE * longest_sq {
        return None;
    }
    let normal = normal / len;

    #[allow(clippy::cast_precision_loss)]
    let inv = 1.0 / points.len() as f64;
    let centroid = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords)
        * inv;
    Some((normal, -normal.dot(&centroid)))
}

/// Compute the area of a 3D polygon (coplanar points).
///
/// Uses the cross-product summation method projected along the polygon normal.
#[must_use]
pub fn polygon_area_3d(points: &[Point3], normal: &Vector3) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = Vector3::zeros();
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].coords.cross(&points[j].coords);
    }
    (sum.dot(normal) * 0.5).abs()
}

/// Point-in-polygon test for a point coplanar with the polygon.
///
/// Flattens both with `projection` and uses the winding number. Points on
/// the boundary may fall either way.
#[must_use]
pub fn point_in_polygon_3d(point: &Point3, polygon: &[Point3], projection: Projection) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let p = project(projection, point);
    let flat: Vec<Point2> = polygon.iter().map(|v| project(projection, v)).collect();

    winding_number_2d(&p, &flat) != 0
}

/// Winding number of `p` with respect to polygon `verts`.
///
/// Non-zero => inside, zero => outside.
fn winding_number_2d(p: &Point2, verts: &[Point2]) -> i32 {
    let n = verts.len();
    let mut winding = 0i32;
    for i in 0..n {
        let a = verts[i];
        let b = verts[(i + 1) % n];

        if a.y <= p.y {
            if b.y > p.y && cross_2d(b.x - a.x, b.y - a.y, p.x - a.x, p.y - a.y) > 0.0 {
                winding += 1;
            }
        } else if b.y <= p.y && cross_2d(b.x - a.x, b.y - a.y, p.x - a.x, p.y - a.y) < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// 2D cross product: `(ax * by - ay * bx)`.
#[inline]
fn cross_2d(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ax * by - ay * bx
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn v(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3::new(x, y, z)
    }

    fn unit_square() -> Vec<Point3> {
        vec![
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(0.0, 1.0, 0.0),
        ]
    }

    // ── newell_normal / polygon_plane ──

    #[test]
    fn ccw_square_normal_points_up() {
        let (normal, d) = polygon_plane(&unit_square()).unwrap();
        assert_relative_eq!(normal, v(0.0, 0.0, 1.0));
        assert_relative_eq!(d, 0.0);
    }

    #[test]
    fn newell_length_is_twice_area() {
        let tri = vec![p(0.0, 0.0, 0.0), p(4.0, 0.0, 0.0), p(0.0, 3.0, 0.0)];
        assert_relative_eq!(newell_normal(&tri).norm(), 12.0);
    }

    #[test]
    fn offset_plane_has_nonzero_d() {
        let sq: Vec<Point3> = unit_square().iter().map(|q| p(q.x, q.y, 2.0)).collect();
        let (normal, d) = polygon_plane(&sq).unwrap();
        assert_relative_eq!(normal.z, 1.0);
        assert_relative_eq!(d, -2.0);
    }

    #[test]
    fn tiny_polygon_still_has_plane() {
        let tri = vec![p(0.0, 0.0, 0.0), p(1e-7, 0.0, 0.0), p(0.0, 1e-7, 0.0)];
        let (normal, _) = polygon_plane(&tri).unwrap();
        assert_relative_eq!(normal, v(0.0, 0.0, 1.0));
    }

    #[test]
    fn huge_sliver_has_no_plane() {
        let sliver = vec![p(0.0, 0.0, 0.0), p(1e6, 0.0, 0.0), p(2e6, 1e-9, 0.0)];
        assert!(polygon_plane(&sliver).is_none());
    }

    #[test]
    fn collinear_points_have_no_plane() {
        let line = vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)];
        assert!(polygon_plane(&line).is_none());
    }

    // ── projection ──

    #[test]
    fn dominant_axis_is_dropped() {
        assert_eq!(Projection::from_normal(&v(0.9, 0.1, 0.1)), Projection::Yz);
        assert_eq!(Projection::from_normal(&v(0.1, -0.9, 0.1)), Projection::Xz);
        assert_eq!(Projection::from_normal(&v(0.0, 0.0, -1.0)), Projection::Xy);
    }

    #[test]
    fn unproject_inverts_project_on_plane() {
        let pts = vec![p(0.0, 0.0, 1.0), p(1.0, 0.0, 2.0), p(0.0, 1.0, 1.5)];
        let (normal, d) = polygon_plane(&pts).unwrap();
        let proj = Projection::from_normal(&normal);
        for q in &pts {
            let back = unproject(proj, &project(proj, q), &normal, d);
            assert_relative_eq!(back, *q, epsilon = 1e-9);
        }
    }

    // ── point_in_polygon_3d ──

    #[test]
    fn point_inside_square() {
        assert!(point_in_polygon_3d(
            &p(0.5, 0.5, 0.0),
            &unit_square(),
            Projection::Xy
        ));
    }

    #[test]
    fn point_outside_square() {
        assert!(!point_in_polygon_3d(
            &p(2.0, 0.5, 0.0),
            &unit_square(),
            Projection::Xy
        ));
    }

    // ── polygon_area_3d ──

    #[test]
    fn unit_square_area() {
        let area = polygon_area_3d(&unit_square(), &v(0.0, 0.0, 1.0));
        assert!((area - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn triangle_area() {
        let tri = vec![p(0.0, 0.0, 0.0), p(4.0, 0.0, 0.0), p(0.0, 3.0, 0.0)];
        let area = polygon_area_3d(&tri, &v(0.0, 0.0, 1.0));
        assert!((area - 6.0).abs() < TOLERANCE);
    }
}
